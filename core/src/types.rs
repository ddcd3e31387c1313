//! Shared primitive types used across the scoring pipeline.

/// A stable, unique customer identifier (e.g. `7590-VHVEG`).
pub type CustomerId = String;

/// Identifier grouping the predictions written by one scoring run.
pub type BatchId = String;

/// Number of slots in the encoded feature vector.
pub const FEATURE_COUNT: usize = 19;
