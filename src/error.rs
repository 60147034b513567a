use thiserror::Error;

#[derive(Debug, Error)]
pub enum TablesError {
    #[error("invalid hex identifier: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("identifier must not be empty")]
    EmptyId,
}
