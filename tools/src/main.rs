//! churn-runner: headless command-line front end for churn-core.
//!
//! Usage:
//!   churn-runner [--db churn.db] [--data-dir ./data] [--seed 42] <command> [options]
//!
//! Commands:
//!   seed [--count 500]                 generate and store demo customers
//!   score-all                          score every stored customer as one batch
//!   customer <id> [--user <user_id>]   assess and record one customer
//!   high-risk [--limit N]              customers whose latest prediction is High
//!   random                             assess a random stored customer
//!   list [--page 1] [--page-size N]    paginated customers with latest prediction
//!   stats                              summary statistics
//!   assess --profile <json>            assess a hypothetical profile
//!   simulate --threshold T --budget B  ROI projection over stored risk counts
//!   optimal-budget --target-roi R [--threshold 0.7]
//!   demo-score --profile <json>        demo-mode heuristic score
//!
//! All output is JSON on stdout.

mod format;

use anyhow::{bail, Context, Result};
use churn_core::{
    config::ChurnConfig,
    context::{ChurnContext, CustomerDetail},
    demo::{DemoProfile, DemoScorer},
    profile::CustomerRecord,
    rng::{ChurnRng, RngStream},
    seed::CustomerSeeder,
    store::ChurnStore,
};
use serde::Serialize;
use std::env;

// Flags that take a value; everything else is positional.
const VALUE_FLAGS: &[&str] = &[
    "--db", "--data-dir", "--seed", "--count", "--user", "--limit", "--page",
    "--page-size", "--profile", "--threshold", "--budget", "--target-roi",
];

#[derive(Serialize)]
struct DetailOutput<'a> {
    #[serde(flatten)]
    detail:       &'a CustomerDetail,
    insight_text: String,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed: Option<u64> = args
        .windows(2)
        .find(|w| w[0] == "--seed")
        .and_then(|w| w[1].parse().ok());
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or("churn.db");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    let positional = positional_args(&args);
    let Some(command) = positional.first().copied() else {
        bail!("missing command; see the usage at the top of tools/src/main.rs");
    };

    // Demo mode needs neither the model nor the store.
    if command == "demo-score" {
        let profile: DemoProfile = serde_json::from_str(require_str(&args, "--profile")?)
            .context("--profile is not a valid demo profile")?;
        return print_json(&DemoScorer.score(&profile)?);
    }

    let config = ChurnConfig::load(data_dir)?;
    let seed = seed.unwrap_or(config.scoring.default_seed);
    let store = ChurnStore::open(db)?;
    store.migrate()?;
    log::info!("runner: db={db} data_dir={data_dir} seed={seed}");

    if command == "seed" {
        let count = parse_arg(&args, "--count", 500usize);
        let customers = CustomerSeeder::new(seed).generate(count);
        let inserted = store.upsert_customers(&customers)?;
        return print_json(&serde_json::json!({ "inserted": inserted, "seed": seed }));
    }

    let ctx = ChurnContext::from_config(&config)?;

    match command {
        "score-all" => {
            let report = ctx.score_all(&store)?;
            print_json(&serde_json::json!({
                "batch_id":     report.batch_id,
                "succeeded":    report.succeeded,
                "failed":       report.failed,
                "distribution": report.distribution,
            }))
        }
        "customer" => {
            let Some(id) = positional.get(1) else {
                bail!("usage: customer <id>");
            };
            let user = args.windows(2).find(|w| w[0] == "--user").map(|w| w[1].as_str());
            let detail = ctx.customer_detail(&store, id, user)?;
            print_detail(&detail)
        }
        "random" => {
            let mut rng = ChurnRng::new(seed, RngStream::RandomCustomer);
            let detail = ctx.random_customer_detail(&store, &mut rng)?;
            print_detail(&detail)
        }
        "high-risk" => {
            let limit = parse_arg(&args, "--limit", config.scoring.high_risk_limit);
            let rows: Vec<_> = store
                .high_risk_customers(limit)?
                .into_iter()
                .map(|(customer, prediction)| serde_json::json!({
                    "customer":   customer,
                    "prediction": prediction,
                }))
                .collect();
            print_json(&serde_json::json!({ "total": rows.len(), "customers": rows }))
        }
        "list" => {
            let page = parse_arg(&args, "--page", 1usize);
            let page_size = parse_arg(&args, "--page-size", config.scoring.default_page_size);
            let customers = store.list_customers(page, page_size)?;
            print_json(&serde_json::json!({
                "total":     store.count_customers()?,
                "page":      page,
                "page_size": page_size,
                "customers": customers,
            }))
        }
        "stats" => print_json(&store.summary_stats()?),
        "assess" => {
            let record: CustomerRecord = serde_json::from_str(require_str(&args, "--profile")?)
                .context("--profile is not a valid customer record")?;
            let result = ctx.assess_record(&record)?;
            print_json(&serde_json::json!({
                "result":       result,
                "insight_text": format::render_insights(&result.insights),
            }))
        }
        "simulate" => {
            let threshold: f64 = require_arg(&args, "--threshold")?;
            let budget: f64 = require_arg(&args, "--budget")?;
            print_json(&ctx.simulate_roi(&store, threshold, budget)?)
        }
        "optimal-budget" => {
            let target_roi: f64 = require_arg(&args, "--target-roi")?;
            let threshold = parse_arg(&args, "--threshold", 0.7f64);
            let budget = ctx.optimal_budget(&store, target_roi, threshold)?;
            print_json(&serde_json::json!({
                "target_roi": target_roi,
                "threshold":  threshold,
                "budget":     budget,
            }))
        }
        other => bail!("unknown command {other:?}"),
    }
}

fn print_detail(detail: &CustomerDetail) -> Result<()> {
    print_json(&DetailOutput {
        detail,
        insight_text: format::render_insights(&detail.result.insights),
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn positional_args(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter().skip(1);
    while let Some(a) = iter.next() {
        if VALUE_FLAGS.contains(&a.as_str()) {
            iter.next();
        } else if !a.starts_with("--") {
            out.push(a.as_str());
        }
    }
    out
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn require_str<'a>(args: &'a [String], flag: &str) -> Result<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
        .with_context(|| format!("missing {flag}"))
}

fn require_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<T> {
    let raw = require_str(args, flag)?;
    raw.parse().map_err(|_| anyhow::anyhow!("{flag}: cannot parse {raw:?}"))
}
