//! Feature engineering
//!
//! Joins, per-player aggregates, latest valuations, ages and model
//! preprocessing.

pub mod age;
pub mod aggregate;
pub mod merge;
pub mod preprocess;
pub mod valuation;

pub use age::{age_in_completed_years, compute_age};
pub use aggregate::{aggregate, AggFn, Aggregation};
pub use merge::{join, merge_sequence, JoinMode};
pub use preprocess::{fill_null_and_scale, one_hot, StandardScaler};
pub use valuation::{latest_by_key, latest_for_key, LatestSelection};
