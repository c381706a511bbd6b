//! Search error codes

use hog_logic::HogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid grid specification: {0}")]
    InvalidGridSpec(String),

    #[error("Invalid search configuration: {0}")]
    InvalidConfig(String),

    #[error("Game aborted: {0}")]
    Game(#[from] HogError),

    #[error("Malformed configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;
