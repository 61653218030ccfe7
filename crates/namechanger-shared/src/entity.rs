//! Published profile entities as returned by peers.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{EntityError, Result};
use crate::types::{EntityId, EntityType};

/// A logical file attached to an entity and the hash of its uploaded bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub file: String,
    pub hash: String,
}

/// Filename -> content hash map. Keeps the order the peer reported so that
/// carried-forward content serializes the same way it was published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentMap(Vec<ContentEntry>);

impl ContentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the hash for `file`, keeping its original position.
    pub fn insert(&mut self, file: impl Into<String>, hash: impl Into<String>) {
        let file = file.into();
        let hash = hash.into();
        match self.0.iter_mut().find(|entry| entry.file == file) {
            Some(entry) => entry.hash = hash,
            None => self.0.push(ContentEntry { file, hash }),
        }
    }

    pub fn get(&self, file: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|entry| entry.file == file)
            .map(|entry| entry.hash.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentEntry> {
        self.0.iter()
    }
}

impl<F: Into<String>, H: Into<String>> FromIterator<(F, H)> for ContentMap {
    fn from_iter<I: IntoIterator<Item = (F, H)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (file, hash) in iter {
            map.insert(file, hash);
        }
        map
    }
}

/// One avatar inside a profile. Only the fields this crate touches are
/// typed; everything else rides along in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Avatar {
    #[serde(default)]
    pub name: String,

    #[serde(
        rename = "hasClaimedName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub has_claimed_name: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    /// First element is the primary avatar.
    #[serde(default)]
    pub avatars: Vec<Avatar>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProfileMetadata {
    pub fn primary_avatar(&self) -> Result<&Avatar> {
        self.avatars.first().ok_or(EntityError::MissingAvatar)
    }

    pub fn primary_avatar_mut(&mut self) -> Result<&mut Avatar> {
        self.avatars.first_mut().ok_or(EntityError::MissingAvatar)
    }
}

/// The latest published profile for an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntity {
    pub id: EntityId,

    #[serde(rename = "type")]
    pub entity_type: EntityType,

    pub pointers: Vec<String>,

    #[serde(default)]
    pub timestamp: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub content: ContentMap,

    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: ProfileMetadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ProfileEntity {
    /// Display name of the primary avatar.
    pub fn current_name(&self) -> Result<&str> {
        Ok(self.metadata.primary_avatar()?.name.as_str())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
