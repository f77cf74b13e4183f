/// Core library for the furniture recommendation backend: catalog
/// normalization, recommendation ranking, Claude prompt/response plumbing,
/// and query-vector arithmetic.
pub mod catalog;
pub mod error;
pub mod llm;
pub mod model;
pub mod prompt;
pub mod ranking;
pub mod vectors;
