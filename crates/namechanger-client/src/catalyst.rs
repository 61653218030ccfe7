//! Peer (catalyst) access: profile reads and signed deployments.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info, warn};

use namechanger_shared::auth::AuthChain;
use namechanger_shared::cid;
use namechanger_shared::entity::ProfileEntity;
use namechanger_shared::payload::DeploymentPayload;
use namechanger_shared::types::{Address, EntityId, EntityType};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Returned by a peer that accepted a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReceipt {
    pub entity_id: EntityId,
    pub creation_timestamp: Option<i64>,
}

#[async_trait]
pub trait PeerNetwork: Send + Sync {
    /// Latest profile pointed to by `address`. Fails with
    /// [`ClientError::NotFound`] when the peer knows none.
    async fn fetch_profile(&self, address: &Address) -> Result<ProfileEntity>;

    /// Submit a signed entity. A rejection is final for this payload.
    async fn deploy(
        &self,
        payload: &DeploymentPayload,
        chain: &AuthChain,
    ) -> Result<DeploymentReceipt>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeployResponse {
    #[serde(default)]
    creation_timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RejectionBody {
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Turn a non-success deploy response into [`ClientError::DeploymentRejected`].
fn rejection(status: u16, body: &str) -> ClientError {
    let mut reasons = match serde_json::from_str::<RejectionBody>(body) {
        Ok(parsed) => {
            let mut reasons = parsed.errors;
            reasons.extend(parsed.error);
            reasons.extend(parsed.message);
            reasons
        }
        Err(_) => Vec::new(),
    };

    if reasons.is_empty() {
        let text = body.trim();
        reasons.push(if text.is_empty() {
            format!("peer returned status {status}")
        } else {
            text.to_string()
        });
    }

    ClientError::DeploymentRejected { status, reasons }
}

/// Build the multipart body for a deployment.
fn deployment_form(payload: &DeploymentPayload, chain: &AuthChain) -> Form {
    let entity_id = payload.entity_id.to_string();
    let mut form = Form::new().text("entityId", entity_id.clone());

    for (i, link) in chain.links().iter().enumerate() {
        form = form
            .text(format!("authChain[{i}][type]"), link.link_type.as_str())
            .text(format!("authChain[{i}][payload]"), link.payload.clone())
            .text(format!("authChain[{i}][signature]"), link.signature.clone());
    }

    form = form.part(
        entity_id.clone(),
        Part::bytes(payload.entity_file.clone()).file_name(entity_id),
    );

    for file in &payload.files_to_upload {
        form = form.part(
            file.hash.clone(),
            Part::bytes(file.bytes.clone()).file_name(file.hash.clone()),
        );
    }

    form
}

/// HTTP client for a single peer node.
#[derive(Clone)]
pub struct CatalystClient {
    base_url: String,
    client: reqwest::Client,
}

impl CatalystClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.origin.clone())
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            base_url: config.peer_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Entities of `entity_type` indexed by `pointer`.
    pub async fn fetch_entities_by_pointer(
        &self,
        entity_type: EntityType,
        pointer: &str,
    ) -> Result<Vec<ProfileEntity>> {
        let entities = self
            .client
            .get(self.url(&format!("/content/entities/{}", entity_type)))
            .query(&[("pointer", pointer)])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<ProfileEntity>>()
            .await?;
        Ok(entities)
    }
}

#[async_trait]
impl PeerNetwork for CatalystClient {
    async fn fetch_profile(&self, address: &Address) -> Result<ProfileEntity> {
        let entities = self
            .fetch_entities_by_pointer(EntityType::Profile, address.as_str())
            .await?;

        debug!(address = %address, found = entities.len(), "Fetched profile entities");

        entities
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::NotFound(address.clone()))
    }

    async fn deploy(
        &self,
        payload: &DeploymentPayload,
        chain: &AuthChain,
    ) -> Result<DeploymentReceipt> {
        if chain.signed_entity() != Some(payload.entity_id.as_str())
            || cid::entity_id_for(&payload.entity_file)? != payload.entity_id
        {
            return Err(ClientError::ChainMismatch(payload.entity_id.clone()));
        }

        let resp = self
            .client
            .post(self.url("/content/entities"))
            .multipart(deployment_form(payload, chain))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let err = rejection(status.as_u16(), &body);
            warn!(entity_id = %payload.entity_id, error = %err, "Deployment rejected");
            return Err(err);
        }

        let creation_timestamp = serde_json::from_str::<DeployResponse>(&body)
            .ok()
            .and_then(|r| r.creation_timestamp);

        info!(
            entity_id = %payload.entity_id,
            peer = %self.base_url,
            "Entity deployed"
        );

        Ok(DeploymentReceipt {
            entity_id: payload.entity_id.clone(),
            creation_timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use namechanger_shared::entity::ContentMap;
    use namechanger_shared::payload::build_unsigned_payload;

    fn addr() -> Address {
        Address::parse("0x3a49309413793b32f6a308769220147fedbffa5f").unwrap()
    }

    fn payload() -> DeploymentPayload {
        build_unsigned_payload(
            EntityType::Profile,
            &[addr()],
            &ContentMap::new(),
            &Default::default(),
            1000,
        )
        .unwrap()
    }

    #[test]
    fn test_rejection_collects_error_list() {
        let err = rejection(400, r#"{"errors":["The signature is invalid","Stale timestamp"]}"#);
        match err {
            ClientError::DeploymentRejected { status, reasons } => {
                assert_eq!(status, 400);
                assert_eq!(reasons, vec!["The signature is invalid", "Stale timestamp"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejection_falls_back_to_text() {
        match rejection(500, "upstream exploded") {
            ClientError::DeploymentRejected { reasons, .. } => {
                assert_eq!(reasons, vec!["upstream exploded"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        match rejection(403, "") {
            ClientError::DeploymentRejected { reasons, .. } => {
                assert_eq!(reasons, vec!["peer returned status 403"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_deploy_refuses_chain_for_other_entity() {
        let client = CatalystClient::new(&ClientConfig::default()).unwrap();
        let chain = AuthChain::simple(&EntityId("bafkreiother".into()), &addr(), "0xsig");

        let result = client.deploy(&payload(), &chain).await;
        assert!(matches!(result, Err(ClientError::ChainMismatch(_))));
    }

    #[tokio::test]
    async fn test_deploy_refuses_tampered_entity_file() {
        let client = CatalystClient::new(&ClientConfig::default()).unwrap();
        let mut payload = payload();
        let chain = AuthChain::simple(&payload.entity_id, &addr(), "0xsig");
        payload.entity_file.push(b' ');

        let result = client.deploy(&payload, &chain).await;
        assert!(matches!(result, Err(ClientError::ChainMismatch(_))));
    }
}
