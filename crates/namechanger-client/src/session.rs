//! Explicit session context.
//!
//! Built once at startup from a wallet and the two remote services, then
//! passed by reference to every flow operation.

use std::sync::Arc;

use tracing::info;

use namechanger_shared::types::Address;

use crate::catalyst::{CatalystClient, PeerNetwork};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::index::{NameIndex, NameIndexClient};
use crate::wallet::{JsonRpcWallet, Wallet};

pub struct Session {
    address: Address,
    wallet: Arc<dyn Wallet>,
    index: Arc<dyn NameIndex>,
    peer: Arc<dyn PeerNetwork>,
}

impl Session {
    /// Connect to the configured wallet and services. The wallet must be
    /// reachable and expose an account before anything touches the network.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let wallet = Arc::new(JsonRpcWallet::new(config.wallet_rpc_url.clone())?);
        let index = Arc::new(NameIndexClient::new(config)?);
        let peer = Arc::new(CatalystClient::new(config)?);
        Self::establish(wallet, index, peer).await
    }

    /// Enable `wallet` and bind the session to its first account.
    pub async fn establish(
        wallet: Arc<dyn Wallet>,
        index: Arc<dyn NameIndex>,
        peer: Arc<dyn PeerNetwork>,
    ) -> Result<Self> {
        let address = wallet
            .enable()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::WalletUnavailable("wallet exposed no accounts".into()))?;

        info!(address = %address, "Session established");

        Ok(Self {
            address,
            wallet,
            index,
            peer,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn wallet(&self) -> &dyn Wallet {
        self.wallet.as_ref()
    }

    pub fn index(&self) -> &dyn NameIndex {
        self.index.as_ref()
    }

    pub fn peer(&self) -> &dyn PeerNetwork {
        self.peer.as_ref()
    }
}
