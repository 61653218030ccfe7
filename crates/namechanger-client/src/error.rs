use thiserror::Error;

use namechanger_shared::error::EntityError;
use namechanger_shared::types::{Address, EntityId};

/// Errors surfaced by the client pipeline.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The peer network has no profile for an address that should have one.
    #[error("No profile found for address {0}")]
    NotFound(Address),

    /// The index answered and the address owns no names.
    #[error("Address {0} has no claimed names")]
    NoOwnedNames(Address),

    /// Every name index attempt failed.
    #[error("Name lookup failed after {attempts} attempts: {last_error}")]
    LookupExhausted { attempts: usize, last_error: String },

    /// No wallet capability, or the wallet exposed no account.
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// The user declined or dismissed the signature request.
    #[error("Signature request rejected: {0}")]
    SigningRejected(String),

    #[error("Wallet RPC error {code}: {message}")]
    WalletRpc { code: i64, message: String },

    /// The peer refused the signed deployment.
    #[error("Deployment rejected ({status}): {}", reasons.join("; "))]
    DeploymentRejected { status: u16, reasons: Vec<String> },

    /// The auth chain does not cover the entity about to be deployed.
    #[error("Auth chain does not authorize entity {0}")]
    ChainMismatch(EntityId),

    /// Deploy requested while the selected name is already published.
    #[error("Nothing to deploy: {0} is already the current name")]
    NothingToDeploy(String),

    #[error("Name {0} is not owned by this address")]
    NameNotOwned(String),

    #[error("Entity error: {0}")]
    Entity(EntityError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<EntityError> for ClientError {
    fn from(err: EntityError) -> Self {
        match err {
            EntityError::NameNotOwned(name) => Self::NameNotOwned(name),
            other => Self::Entity(other),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
