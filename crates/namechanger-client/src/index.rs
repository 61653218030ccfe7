//! Name ownership lookups against the marketplace subgraph.
//!
//! Lookups are retried a bounded number of times, strictly one after the
//! other. Failures are logged and folded into [`NameLookup::Exhausted`] so
//! that callers can tell "owns nothing" apart from "could not ask".

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use namechanger_shared::constants::NAME_INDEX_PAGE_SIZE;
use namechanger_shared::types::{Address, OwnedName};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// A single failed attempt. Never escapes the index client except inside
/// [`NameLookup::Exhausted`].
#[derive(Error, Debug)]
pub enum LookupFailure {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Outcome of a name lookup after retries.
#[derive(Debug)]
pub enum NameLookup {
    Found(Vec<OwnedName>),
    Exhausted {
        attempts: usize,
        last_failure: LookupFailure,
    },
}

impl NameLookup {
    /// Collapse to a name list; exhaustion reads as "no names found".
    pub fn into_names(self) -> Vec<OwnedName> {
        match self {
            Self::Found(names) => names,
            Self::Exhausted { .. } => Vec::new(),
        }
    }

    pub fn into_result(self) -> Result<Vec<OwnedName>> {
        match self {
            Self::Found(names) => Ok(names),
            Self::Exhausted {
                attempts,
                last_failure,
            } => Err(ClientError::LookupExhausted {
                attempts,
                last_error: last_failure.to_string(),
            }),
        }
    }
}

#[async_trait]
pub trait NameIndex: Send + Sync {
    async fn lookup_owned_names(&self, address: &Address) -> NameLookup;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GraphRequest<'a> {
    query: &'a str,
    variables: GraphVariables<'a>,
}

#[derive(Debug, Serialize)]
struct GraphVariables<'a> {
    beneficiary: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphResponse {
    data: GraphData,
}

#[derive(Debug, Deserialize)]
struct GraphData {
    nfts: Vec<GraphNft>,
}

#[derive(Debug, Deserialize)]
struct GraphNft {
    ens: Option<GraphEns>,
}

#[derive(Debug, Deserialize)]
struct GraphEns {
    subdomain: String,
}

fn names_query() -> String {
    format!(
        "query GetNameByBeneficiary($beneficiary: String) {{\n  \
           nfts(first:{NAME_INDEX_PAGE_SIZE}, where: {{ owner: $beneficiary, category: ens }}) {{\n    \
             ens {{\n      labelHash\n      beneficiary\n      caller\n      subdomain\n      createdAt\n    }}\n  \
           }}\n\
         }}"
    )
}

fn parse_names(body: &[u8]) -> std::result::Result<Vec<OwnedName>, LookupFailure> {
    let response: GraphResponse =
        serde_json::from_slice(body).map_err(|e| LookupFailure::Malformed(e.to_string()))?;
    Ok(response
        .data
        .nfts
        .into_iter()
        .filter_map(|nft| nft.ens)
        .map(|ens| OwnedName(ens.subdomain))
        .collect())
}

// ---------------------------------------------------------------------------
// Retry loop
// ---------------------------------------------------------------------------

/// Run `attempt` up to `attempts` times, sequentially, stopping at the
/// first success.
pub(crate) async fn retry_lookup<F, Fut>(
    address: &Address,
    attempts: usize,
    delay: Duration,
    mut attempt: F,
) -> NameLookup
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = std::result::Result<Vec<OwnedName>, LookupFailure>>,
{
    let attempts = attempts.max(1);
    let mut last_failure = None;

    for n in 1..=attempts {
        match attempt(n).await {
            Ok(names) => {
                debug!(address = %address, attempt = n, count = names.len(), "Resolved owned names");
                return NameLookup::Found(names);
            }
            Err(e) => {
                warn!(
                    address = %address,
                    attempt = n,
                    total = attempts,
                    error = %e,
                    "Could not retrieve names"
                );
                last_failure = Some(e);
                if n < attempts && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    NameLookup::Exhausted {
        attempts,
        last_failure: last_failure
            .unwrap_or_else(|| LookupFailure::Malformed("no attempt made".into())),
    }
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Queries the name index over HTTP.
#[derive(Clone)]
pub struct NameIndexClient {
    url: String,
    attempts: usize,
    retry_delay: Duration,
    client: reqwest::Client,
}

impl NameIndexClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.origin.clone())
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            url: config.name_index_url.clone(),
            attempts: config.index_attempts,
            retry_delay: config.index_retry_delay,
            client,
        })
    }

    /// Owned names, or an empty list when every attempt failed. Use
    /// [`NameIndex::lookup_owned_names`] to tell the two apart.
    pub async fn resolve_owned_names(&self, address: &Address) -> Vec<OwnedName> {
        self.lookup_owned_names(address).await.into_names()
    }

    async fn query_once(
        &self,
        address: &Address,
    ) -> std::result::Result<Vec<OwnedName>, LookupFailure> {
        let query = names_query();
        let request = GraphRequest {
            query: &query,
            variables: GraphVariables {
                beneficiary: address.as_str(),
            },
        };

        let resp = self.client.post(&self.url).json(&request).send().await?;
        if !resp.status().is_success() {
            return Err(LookupFailure::Status(resp.status().as_u16()));
        }

        let body = resp.bytes().await?;
        parse_names(&body)
    }
}

#[async_trait]
impl NameIndex for NameIndexClient {
    async fn lookup_owned_names(&self, address: &Address) -> NameLookup {
        retry_lookup(address, self.attempts, self.retry_delay, |_| {
            self.query_once(address)
        })
        .await
    }
}
