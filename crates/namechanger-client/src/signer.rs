use tracing::info;

use namechanger_shared::auth::AuthChain;
use namechanger_shared::types::{Address, EntityId};

use crate::error::Result;
use crate::wallet::Wallet;

/// Ask `wallet` to sign `entity_id` as `address` and wrap the signature in
/// a simple auth chain. No local verification: the peer recovers the signer.
pub async fn authorize(
    entity_id: &EntityId,
    address: &Address,
    wallet: &dyn Wallet,
) -> Result<AuthChain> {
    info!(entity_id = %entity_id, signer = %address, "Requesting signature");
    let signature = wallet.personal_sign(entity_id.as_str(), address).await?;
    Ok(AuthChain::simple(entity_id, address, signature))
}
