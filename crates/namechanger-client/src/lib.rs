//! Rename a wallet's avatar profile to one of its claimed names.
//!
//! The pipeline: look up owned names, fetch the current profile, rename the
//! primary avatar, build a content-addressed entity, have the wallet sign
//! its id, and deploy it to a peer.

pub mod catalyst;
pub mod config;
pub mod error;
pub mod flow;
pub mod index;
pub mod session;
pub mod signer;
pub mod wallet;

pub use crate::catalyst::{CatalystClient, DeploymentReceipt, PeerNetwork};
pub use crate::config::ClientConfig;
pub use crate::error::{ClientError, Result};
pub use crate::index::{NameIndex, NameIndexClient, NameLookup};
pub use crate::session::Session;
pub use crate::wallet::{JsonRpcWallet, Wallet};
