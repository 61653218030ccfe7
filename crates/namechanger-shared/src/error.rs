use thiserror::Error;

#[derive(Error, Debug)]
pub enum EntityError {
    #[error("Profile metadata has no avatars")]
    MissingAvatar,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Name {0} is not owned by this address")]
    NameNotOwned(String),

    #[error("Content hash error: {0}")]
    Multihash(#[from] multihash::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EntityError>;
