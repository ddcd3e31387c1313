//! The process-wide scoring context.
//!
//! Built once at startup and passed by reference to whatever serves
//! requests. Everything it owns is read-only after construction, so one
//! context can be shared across threads. The store is passed per call and
//! is the only mutable collaborator.

use crate::{
    config::{ChurnConfig, ScoringConfig},
    encoder::{FeatureEncoder, FeatureScaler},
    error::{ChurnError, ChurnResult},
    explain::{build_explainer, AttributionItem, Explainer},
    insight::{build_insights, Insight},
    model::{Classifier, ModelArtifacts, ModelMetadata},
    offer::{Campaign, OfferDecision, OfferInputs, OfferRecommender},
    profile::{CustomerProfile, CustomerRecord, UsageSignals},
    rng::ChurnRng,
    roi::{RoiSimulator, SimulationResult},
    scorer::{RiskAssessment, RiskDistribution, RiskScorer},
    store::{ChurnStore, PredictionRecord},
    types::{BatchId, CustomerId},
};
use chrono::Utc;
use serde::Serialize;
use std::{path::Path, sync::Arc};

// ── Public types ─────────────────────────────────────────────────────────────

/// Everything the core says about one customer.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerAssessment {
    pub customer_id:    CustomerId,
    #[serde(flatten)]
    pub assessment:     RiskAssessment,
    pub attributions:   Vec<AttributionItem>,
    pub offer:          Option<OfferDecision>,
    pub insights:       Vec<Insight>,
    /// Fields whose label was outside the training domain and fell back.
    pub unknown_fields: Vec<String>,
}

/// A stored customer with a fresh, recorded assessment.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetail {
    pub customer:      CustomerRecord,
    pub result:        CustomerAssessment,
    pub prediction_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Scored { result: CustomerAssessment },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub customer_id: CustomerId,
    #[serde(flatten)]
    pub outcome:     BatchOutcome,
}

/// Per-item batch results. The distribution counts successes only.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id:     BatchId,
    pub items:        Vec<BatchItem>,
    pub distribution: RiskDistribution,
    pub succeeded:    usize,
    pub failed:       usize,
}

impl BatchReport {
    pub fn scored(&self) -> impl Iterator<Item = &CustomerAssessment> {
        self.items.iter().filter_map(|i| match &i.outcome {
            BatchOutcome::Scored { result } => Some(result),
            BatchOutcome::Failed { .. } => None,
        })
    }
}

// ── Context ──────────────────────────────────────────────────────────────────

pub struct ChurnContext {
    encoder:     FeatureEncoder,
    scorer:      RiskScorer,
    explainer:   Box<dyn Explainer>,
    recommender: OfferRecommender,
    simulator:   RoiSimulator,
    metadata:    ModelMetadata,
    scoring:     ScoringConfig,
}

impl ChurnContext {
    /// Load model artifacts and build every component. Any failure here is
    /// fatal: there is no degraded mode.
    pub fn from_config(config: &ChurnConfig) -> ChurnResult<Self> {
        let artifacts = ModelArtifacts::load(Path::new(&config.model_dir))?;
        Self::from_parts(
            artifacts.classifier,
            artifacts.scaler,
            artifacts.metadata,
            config.campaigns.clone(),
            config.roi,
            config.scoring.clone(),
        )
    }

    pub fn from_parts(
        classifier: Arc<dyn Classifier>,
        scaler: FeatureScaler,
        metadata: ModelMetadata,
        campaigns: Vec<Campaign>,
        simulator: RoiSimulator,
        scoring: ScoringConfig,
    ) -> ChurnResult<Self> {
        let encoder = FeatureEncoder::new(scaler)?;
        let explainer = build_explainer(scoring.explainer, &encoder, &classifier)?;
        let recommender = OfferRecommender::new(campaigns)?;
        simulator.validate()?;

        log::info!(
            "context: ready model={} explainer={} campaigns={}",
            metadata.model_name,
            explainer.name(),
            recommender.catalog().len()
        );

        Ok(Self {
            encoder,
            scorer: RiskScorer::new(classifier),
            explainer,
            recommender,
            simulator,
            metadata,
            scoring,
        })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn recommender(&self) -> &OfferRecommender {
        &self.recommender
    }

    pub fn simulator(&self) -> &RoiSimulator {
        &self.simulator
    }

    pub fn explainer_name(&self) -> &'static str {
        self.explainer.name()
    }

    /// Name written into audit records.
    pub fn model_name(&self) -> &str {
        self.scoring
            .model_name_override
            .as_deref()
            .unwrap_or(&self.metadata.model_name)
    }

    // ── Scoring ────────────────────────────────────────────────

    pub fn assess(
        &self,
        customer_id: &str,
        profile: &CustomerProfile,
        usage: &UsageSignals,
    ) -> ChurnResult<CustomerAssessment> {
        let vector = self.encoder.encode(profile);
        let assessment = self.scorer.predict(&vector)?;
        Ok(self.complete(customer_id, profile, usage, assessment))
    }

    /// Validate a raw record at the boundary, then assess it.
    pub fn assess_record(&self, record: &CustomerRecord) -> ChurnResult<CustomerAssessment> {
        let profile = CustomerProfile::from_record(record)?;
        let usage = UsageSignals::from_record(record)?;
        self.assess(&record.customer_id, &profile, &usage)
    }

    fn complete(
        &self,
        customer_id: &str,
        profile: &CustomerProfile,
        usage: &UsageSignals,
        assessment: RiskAssessment,
    ) -> CustomerAssessment {
        let unknown_fields: Vec<String> =
            profile.unknown_fields().into_iter().map(String::from).collect();
        if !unknown_fields.is_empty() {
            log::warn!("context: {customer_id} has out-of-domain labels {unknown_fields:?}, using fallback codes");
        }

        let attributions = self.explainer.explain(profile, &assessment);
        let offer = self.recommender.recommend(&OfferInputs::from_profile(
            assessment.churn_probability,
            profile,
            usage,
        ));
        let insights = build_insights(profile, &assessment, &attributions);

        log::debug!(
            "context: {customer_id} p={:.3} level={} offer={}",
            assessment.churn_probability,
            assessment.risk_level,
            offer.as_ref().map_or("none", |o| o.campaign.campaign_id.as_str())
        );

        CustomerAssessment {
            customer_id: customer_id.to_string(),
            assessment,
            attributions,
            offer,
            insights,
            unknown_fields,
        }
    }

    /// Assess every record independently. Invalid records and classifier
    /// failures are reported per item and never abort the batch.
    pub fn assess_batch(&self, records: &[CustomerRecord]) -> BatchReport {
        let batch_id = uuid::Uuid::new_v4().to_string();

        let prepared: Vec<ChurnResult<(CustomerProfile, UsageSignals)>> = records
            .iter()
            .map(|r| -> ChurnResult<(CustomerProfile, UsageSignals)> {
                Ok((CustomerProfile::from_record(r)?, UsageSignals::from_record(r)?))
            })
            .collect();

        let vectors: Vec<_> = prepared
            .iter()
            .filter_map(|p| p.as_ref().ok())
            .map(|(profile, _)| self.encoder.encode(profile))
            .collect();
        let mut predictions = self.scorer.predict_batch(&vectors).into_iter();

        let mut distribution = RiskDistribution::default();
        let mut items = Vec::with_capacity(records.len());
        for (record, prep) in records.iter().zip(prepared) {
            let outcome = match prep {
                Err(e) => Err(e),
                Ok((profile, usage)) => match predictions.next() {
                    Some(Ok(assessment)) => Ok(self.complete(&record.customer_id, &profile, &usage, assessment)),
                    Some(Err(e)) => Err(e),
                    None => Err(ChurnError::Other(anyhow::anyhow!("missing batch prediction"))),
                },
            };
            let outcome = match outcome {
                Ok(result) => {
                    distribution.add(result.assessment.risk_level);
                    BatchOutcome::Scored { result }
                }
                Err(e) => {
                    log::warn!("context: batch {batch_id} item {} failed: {e}", record.customer_id);
                    BatchOutcome::Failed { error: e.to_string() }
                }
            };
            items.push(BatchItem { customer_id: record.customer_id.clone(), outcome });
        }

        let succeeded = distribution.total() as usize;
        let failed = items.len() - succeeded;
        log::info!("context: batch {batch_id} scored={succeeded} failed={failed}");
        BatchReport { batch_id, items, distribution, succeeded, failed }
    }

    // ── Audit ──────────────────────────────────────────────────

    pub fn record(
        &self,
        store: &ChurnStore,
        result: &CustomerAssessment,
        user_id: Option<&str>,
        batch_id: Option<&str>,
    ) -> ChurnResult<PredictionRecord> {
        let mut record = PredictionRecord {
            id:                None,
            customer_id:       result.customer_id.clone(),
            churn_probability: result.assessment.churn_probability,
            risk_score:        result.assessment.churn_probability,
            risk_level:        result.assessment.risk_level,
            predicted_churn:   result.assessment.predicted_churn,
            model_name:        self.model_name().to_string(),
            timestamp:         Utc::now(),
            user_id:           user_id.map(String::from),
            batch_id:          batch_id.map(String::from),
        };
        record.id = Some(store.save_prediction(&record)?);
        Ok(record)
    }

    fn detail_for(
        &self,
        store: &ChurnStore,
        customer: CustomerRecord,
        user_id: Option<&str>,
    ) -> ChurnResult<CustomerDetail> {
        let result = self.assess_record(&customer)?;
        let saved = self.record(store, &result, user_id, None)?;
        Ok(CustomerDetail {
            customer,
            result,
            prediction_id: saved.id.unwrap_or_default(),
        })
    }

    /// Assess a stored customer and record the prediction.
    pub fn customer_detail(
        &self,
        store: &ChurnStore,
        customer_id: &str,
        user_id: Option<&str>,
    ) -> ChurnResult<CustomerDetail> {
        let customer = store
            .get_customer(customer_id)?
            .ok_or_else(|| ChurnError::CustomerNotFound { customer_id: customer_id.to_string() })?;
        self.detail_for(store, customer, user_id)
    }

    pub fn random_customer_detail(
        &self,
        store: &ChurnStore,
        rng: &mut ChurnRng,
    ) -> ChurnResult<CustomerDetail> {
        let customer = store.random_customer(rng)?.ok_or(ChurnError::EmptyStore)?;
        self.detail_for(store, customer, None)
    }

    /// Score every stored customer as one batch and record the successes.
    pub fn score_all(&self, store: &ChurnStore) -> ChurnResult<BatchReport> {
        let ids = store.customer_ids()?;
        let mut records = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(r) = store.get_customer(id)? {
                records.push(r);
            }
        }

        let report = self.assess_batch(&records);
        for result in report.scored() {
            self.record(store, result, None, Some(&report.batch_id))?;
        }
        Ok(report)
    }

    // ── Simulation ─────────────────────────────────────────────

    /// ROI projection over the store's current risk distribution.
    pub fn simulate_roi(
        &self,
        store: &ChurnStore,
        threshold: f64,
        budget: f64,
    ) -> ChurnResult<SimulationResult> {
        let stats = store.summary_stats()?;
        self.simulator
            .simulate(threshold, budget, stats.total_customers, &stats.risk_distribution)
    }

    pub fn optimal_budget(
        &self,
        store: &ChurnStore,
        target_roi: f64,
        threshold: f64,
    ) -> ChurnResult<f64> {
        let stats = store.summary_stats()?;
        self.simulator
            .calculate_optimal_budget(target_roi, &stats.risk_distribution, threshold)
    }
}
