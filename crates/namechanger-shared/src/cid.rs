//! Content identifiers for entity files.
//!
//! Peers address every entity by the CIDv1 of its file bytes: a raw-codec,
//! sha2-256 multihash rendered in lowercase base32 with the `b` multibase
//! prefix. Files larger than one IPFS chunk are never produced here, so the
//! single-block form is the only one needed.

use ::cid::Cid;
use multihash::Multihash;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::types::EntityId;

const RAW_CODEC: u64 = 0x55;
const SHA2_256: u64 = 0x12;

/// Compute the CIDv1 string for `bytes`.
pub fn hash_v1(bytes: &[u8]) -> Result<String> {
    let digest = Multihash::<64>::wrap(SHA2_256, &Sha256::digest(bytes))?;
    Ok(Cid::new_v1(RAW_CODEC, digest).to_string())
}

/// Entity identifier for an entity file.
pub fn entity_id_for(bytes: &[u8]) -> Result<EntityId> {
    hash_v1(bytes).map(EntityId)
}
