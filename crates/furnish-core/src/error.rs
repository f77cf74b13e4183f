#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog input is not a JSON array")]
    NotAnArray,

    #[error("record {index} is not a valid product object: {message}")]
    InvalidRecord { index: usize, message: String },
}
