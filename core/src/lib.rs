//! churn-core: customer churn risk scoring and retention decision support.
//!
//! Pipeline: profile → encoder → scorer → explainer / offer recommender,
//! with the ROI simulator working off aggregate risk counts.

pub mod config;
pub mod context;
pub mod demo;
pub mod encoder;
pub mod error;
pub mod explain;
pub mod insight;
pub mod model;
pub mod offer;
pub mod profile;
pub mod rng;
pub mod roi;
pub mod scorer;
pub mod seed;
pub mod store;
pub mod types;
