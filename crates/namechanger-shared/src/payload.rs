//! Building unsigned deployments.
//!
//! The entity file is the exact byte sequence peers hash to derive the
//! entity id, so it is serialized once and reused for both the id and the
//! upload.

use serde::Serialize;

use crate::cid;
use crate::constants::ENTITY_VERSION;
use crate::entity::{ContentMap, ProfileMetadata};
use crate::error::Result;
use crate::types::{Address, EntityId, EntityType};

/// Entity as written to the entity file. Field order is part of the wire
/// contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDescriptor {
    pub version: &'static str,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub pointers: Vec<String>,
    pub timestamp: i64,
    pub content: ContentMap,
    pub metadata: ProfileMetadata,
}

/// A blob that must be uploaded alongside the entity file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub hash: String,
    pub bytes: Vec<u8>,
}

/// Everything needed to deploy except the authorization chain.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentPayload {
    pub entity_id: EntityId,
    /// Serialized [`EntityDescriptor`]; uploaded under `entity_id`.
    pub entity_file: Vec<u8>,
    /// New content blobs. Always empty here: content is carried forward by
    /// hash from the previous profile.
    pub files_to_upload: Vec<UploadFile>,
    pub entity: EntityDescriptor,
}

/// Build the entity descriptor, serialize it and derive its id.
pub fn build_unsigned_payload(
    entity_type: EntityType,
    pointers: &[Address],
    content: &ContentMap,
    metadata: &ProfileMetadata,
    timestamp: i64,
) -> Result<DeploymentPayload> {
    let entity = EntityDescriptor {
        version: ENTITY_VERSION,
        entity_type,
        pointers: pointers.iter().map(|p| p.to_string()).collect(),
        timestamp,
        content: content.clone(),
        metadata: metadata.clone(),
    };

    let entity_file = serde_json::to_vec(&entity)?;
    let entity_id = cid::entity_id_for(&entity_file)?;

    Ok(DeploymentPayload {
        entity_id,
        entity_file,
        files_to_upload: Vec::new(),
        entity,
    })
}

/// Milliseconds since the Unix epoch, the timestamp unit peers expect.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
