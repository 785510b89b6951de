use crate::model::FavoriteState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CityCareError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Remote rejected the record: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response shape: {0}")]
    ShapeMismatch(String),

    #[error("Favorite not saved (still {previous}): {source}")]
    FavoriteNotSaved {
        previous: FavoriteState,
        #[source]
        source: Box<CityCareError>,
    },

    #[error("Api Error: {0}")]
    Api(String),
}

impl CityCareError {
    /// True when the local durable store could not be read or written.
    pub fn is_storage_failure(&self) -> bool {
        match self {
            CityCareError::StoreUnavailable(_)
            | CityCareError::Io(_)
            | CityCareError::Serialization(_) => true,
            CityCareError::FavoriteNotSaved { source, .. } => source.is_storage_failure(),
            _ => false,
        }
    }

    /// True for failures the outbox retries on the next pass.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            CityCareError::Rejected(_)
                | CityCareError::Transport(_)
                | CityCareError::ShapeMismatch(_)
        )
    }
}

impl From<reqwest::Error> for CityCareError {
    fn from(e: reqwest::Error) -> Self {
        CityCareError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CityCareError>;
