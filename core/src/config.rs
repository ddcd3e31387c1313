use crate::{
    explain::ExplainerStrategy,
    offer::{default_catalog, Campaign},
    roi::RoiSimulator,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Artifact directory, relative to the data directory unless absolute.
    pub model_dir: String,
    #[serde(default)]
    pub explainer: ExplainerStrategy,
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_high_risk_limit")]
    pub high_risk_limit: usize,
    #[serde(default = "default_seed")]
    pub default_seed: u64,
    /// Written into every audit record.
    #[serde(default)]
    pub model_name_override: Option<String>,
}

fn default_page_size() -> usize { 20 }
fn default_high_risk_limit() -> usize { 50 }
fn default_seed() -> u64 { 42 }

#[derive(Debug, Clone, Deserialize)]
struct CampaignCatalogFile {
    campaigns: Vec<Campaign>,
}

#[derive(Debug, Clone)]
pub struct ChurnConfig {
    pub scoring:   ScoringConfig,
    /// Resolved artifact directory.
    pub model_dir: String,
    pub campaigns: Vec<Campaign>,
    pub roi:       RoiSimulator,
}

impl ChurnConfig {
    /// Load from the data/ directory.
    /// In tests, use ChurnConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let scoring_path = format!("{data_dir}/scoring/scoring_config.json");
        let scoring_content = std::fs::read_to_string(&scoring_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {scoring_path}: {e}"))?;
        let scoring: ScoringConfig = serde_json::from_str(&scoring_content)?;

        let model_dir = if std::path::Path::new(&scoring.model_dir).is_absolute() {
            scoring.model_dir.clone()
        } else {
            format!("{data_dir}/{}", scoring.model_dir)
        };

        let catalog_path = format!("{data_dir}/offers/campaign_catalog.json");
        let catalog_content = std::fs::read_to_string(&catalog_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {catalog_path}: {e}"))?;
        let catalog: CampaignCatalogFile = serde_json::from_str(&catalog_content)?;
        if catalog.campaigns.is_empty() {
            anyhow::bail!("{catalog_path} lists no campaigns");
        }

        let roi_path = format!("{data_dir}/simulation/roi_config.json");
        let roi_content = std::fs::read_to_string(&roi_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {roi_path}: {e}"))?;
        let roi: RoiSimulator = serde_json::from_str(&roi_content)?;
        roi.validate()?;

        log::info!(
            "config: model_dir={model_dir} campaigns={} explainer={:?}",
            catalog.campaigns.len(),
            scoring.explainer
        );

        Ok(Self {
            scoring,
            model_dir,
            campaigns: catalog.campaigns,
            roi,
        })
    }

    pub fn default_test() -> Self {
        let model_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/model").to_string();
        Self {
            scoring: ScoringConfig {
                model_dir:           model_dir.clone(),
                explainer:           ExplainerStrategy::Heuristic,
                default_page_size:   default_page_size(),
                high_risk_limit:     default_high_risk_limit(),
                default_seed:        default_seed(),
                model_name_override: None,
            },
            model_dir,
            campaigns: default_catalog(),
            roi: RoiSimulator::default(),
        }
    }
}
