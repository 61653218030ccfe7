//! Authorization chains attached to deployments.
//!
//! A chain starts with a `SIGNER` link naming the address, followed by the
//! link that carries that address's signature over the entity id. Peers
//! recover the signer from the signature and compare it with the first link.

use serde::{Deserialize, Serialize};

use crate::types::{Address, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthLinkType {
    Signer,
    EcdsaSignedEntity,
}

impl AuthLinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signer => "SIGNER",
            Self::EcdsaSignedEntity => "ECDSA_SIGNED_ENTITY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthLink {
    #[serde(rename = "type")]
    pub link_type: AuthLinkType,
    pub payload: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthChain(Vec<AuthLink>);

impl AuthChain {
    /// Chain asserting that `signer` signed `entity_id` directly with its own key.
    pub fn simple(entity_id: &EntityId, signer: &Address, signature: impl Into<String>) -> Self {
        Self(vec![
            AuthLink {
                link_type: AuthLinkType::Signer,
                payload: signer.to_string(),
                signature: String::new(),
            },
            AuthLink {
                link_type: AuthLinkType::EcdsaSignedEntity,
                payload: entity_id.to_string(),
                signature: signature.into(),
            },
        ])
    }

    pub fn links(&self) -> &[AuthLink] {
        &self.0
    }

    /// Address named by the root link.
    pub fn signer(&self) -> Option<&str> {
        self.0
            .first()
            .filter(|link| link.link_type == AuthLinkType::Signer)
            .map(|link| link.payload.as_str())
    }

    /// Payload covered by the final signed link.
    pub fn signed_entity(&self) -> Option<&str> {
        self.0
            .last()
            .filter(|link| link.link_type == AuthLinkType::EcdsaSignedEntity)
            .map(|link| link.payload.as_str())
    }

    /// Structural check only: root names `signer` and the last link signs
    /// `entity_id`. Signature recovery is the peer's job.
    pub fn authorizes(&self, entity_id: &EntityId, signer: &Address) -> bool {
        self.signer() == Some(signer.as_str())
            && self.signed_entity() == Some(entity_id.as_str())
            && self.0.last().is_some_and(|link| !link.signature.is_empty())
    }
}
