use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Already exists: {entity_type} {id}")]
    AlreadyExists { entity_type: String, id: String },
}

impl LibraryError {
    pub fn playlist_not_found(name: &str) -> Self {
        Self::NotFound {
            entity_type: "Playlist".to_string(),
            id: name.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
