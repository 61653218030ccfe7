//! Wallet capability.
//!
//! The pipeline only needs two things from a wallet: the connected account
//! and a `personal_sign` over a text message. [`JsonRpcWallet`] provides
//! both through a standard Ethereum JSON-RPC endpoint; tests substitute
//! their own implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use namechanger_shared::types::Address;

use crate::error::{ClientError, Result};

/// EIP-1193 "user rejected request".
pub const USER_REJECTED_CODE: i64 = 4001;

/// JSON-RPC "method not found".
const METHOD_NOT_FOUND_CODE: i64 = -32601;

#[async_trait]
pub trait Wallet: Send + Sync {
    /// Ask the wallet to expose its accounts. Must succeed before any
    /// address is known.
    async fn enable(&self) -> Result<Vec<Address>>;

    /// Sign `message` with the key behind `address`. Waits for the user
    /// with no timeout of its own.
    async fn personal_sign(&self, message: &str, address: &Address) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    #[serde(default)]
    message: String,
}

/// Wallet reached over HTTP JSON-RPC.
pub struct JsonRpcWallet {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcWallet {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        // Connect timeout only: a signature request blocks on the user.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        debug!(method, url = %self.url, "Wallet RPC call");

        let resp = self.client.post(&self.url).json(&request).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        // Some providers send JSON-RPC errors with a non-2xx status; the
        // error object wins over the status line.
        match serde_json::from_str::<RpcResponse>(&body) {
            Ok(RpcResponse {
                error: Some(err), ..
            }) => Err(ClientError::WalletRpc {
                code: err.code,
                message: err.message,
            }),
            Ok(response) if status.is_success() => Ok(response.result.unwrap_or(Value::Null)),
            Err(e) if status.is_success() => Err(e.into()),
            _ => Err(ClientError::WalletRpc {
                code: i64::from(status.as_u16()),
                message: format!("wallet endpoint returned status {status}"),
            }),
        }
    }

    async fn accounts(&self) -> Result<Value> {
        match self.call("eth_requestAccounts", Value::Array(Vec::new())).await {
            Err(ClientError::WalletRpc { code, .. }) if code == METHOD_NOT_FOUND_CODE => {
                self.call("eth_accounts", Value::Array(Vec::new())).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl Wallet for JsonRpcWallet {
    async fn enable(&self) -> Result<Vec<Address>> {
        let result = self.accounts().await.map_err(|e| match e {
            ClientError::WalletRpc { code, message } if code == USER_REJECTED_CODE => {
                ClientError::WalletUnavailable(format!("connection refused by user: {message}"))
            }
            other => ClientError::WalletUnavailable(other.to_string()),
        })?;

        let raw: Vec<String> = serde_json::from_value(result)
            .map_err(|e| ClientError::WalletUnavailable(format!("bad account list: {e}")))?;
        let accounts = raw
            .iter()
            .map(|a| Address::parse(a))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ClientError::WalletUnavailable(format!("bad account: {e}")))?;

        if accounts.is_empty() {
            return Err(ClientError::WalletUnavailable(
                "wallet exposed no accounts".into(),
            ));
        }

        info!(accounts = accounts.len(), "Wallet enabled");
        Ok(accounts)
    }

    async fn personal_sign(&self, message: &str, address: &Address) -> Result<String> {
        let params = serde_json::json!([encode_message(message), address.as_str(), ""]);
        let result = self
            .call("personal_sign", params)
            .await
            .map_err(|e| match e {
                ClientError::WalletRpc { code, message } if code == USER_REJECTED_CODE => {
                    ClientError::SigningRejected(message)
                }
                other => other,
            })?;

        match result {
            Value::String(sig) if !sig.is_empty() => Ok(sig),
            other => Err(ClientError::WalletRpc {
                code: 0,
                message: format!("unexpected signature result: {other}"),
            }),
        }
    }
}

/// Hex-encode a UTF-8 message the way web3 clients pass text to
/// `personal_sign`.
pub fn encode_message(message: &str) -> String {
    format!("0x{}", hex::encode(message.as_bytes()))
}
