//! Drives the HTTP clients against in-process fakes of the name index, the
//! peer node and the wallet JSON-RPC endpoint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use namechanger_client::flow::{deploy_selection, load_selection};
use namechanger_client::{
    CatalystClient, ClientConfig, ClientError, JsonRpcWallet, NameIndex, NameIndexClient,
    NameLookup, PeerNetwork, Session, Wallet,
};
use namechanger_shared::cid;
use namechanger_shared::selection::SelectionState;
use namechanger_shared::types::{Address, OwnedName};

const ADDRESS: &str = "0x3A49309413793b32F6A308769220147feDbFfa5f";

fn addr() -> Address {
    Address::parse(ADDRESS).unwrap()
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// Fake name index
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct IndexState {
    calls: Arc<AtomicUsize>,
    fail_first: usize,
    malformed: bool,
    names: Vec<&'static str>,
    beneficiaries: Arc<Mutex<Vec<String>>>,
}

async fn index_query(State(state): State<IndexState>, Json(body): Json<Value>) -> (StatusCode, String) {
    let n = state.calls.fetch_add(1, Ordering::SeqCst) + 1;
    if let Some(b) = body["variables"]["beneficiary"].as_str() {
        state.beneficiaries.lock().unwrap().push(b.to_string());
    }

    if n <= state.fail_first {
        return (StatusCode::SERVICE_UNAVAILABLE, "busy".into());
    }
    if state.malformed {
        return (StatusCode::OK, "{\"data\":".into());
    }

    let nfts: Vec<Value> = state
        .names
        .iter()
        .map(|n| json!({ "ens": { "subdomain": n, "labelHash": "0x00" } }))
        .collect();
    (StatusCode::OK, json!({ "data": { "nfts": nfts } }).to_string())
}

async fn spawn_index(state: IndexState) -> String {
    serve(Router::new().route("/", post(index_query)).with_state(state)).await
}

// ---------------------------------------------------------------------------
// Fake peer
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct PeerState {
    entities: Arc<Mutex<Vec<Value>>>,
    reject_with: Option<&'static str>,
}

async fn peer_entities(
    State(state): State<PeerState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    let pointer = params.get("pointer").cloned().unwrap_or_default();
    let entities = state.entities.lock().unwrap();
    Json(
        entities
            .iter()
            .filter(|e| e["pointers"].as_array().is_some_and(|p| p.contains(&Value::from(pointer.as_str()))))
            .cloned()
            .collect(),
    )
}

async fn peer_deploy(State(state): State<PeerState>, mut multipart: Multipart) -> (StatusCode, Json<Value>) {
    if let Some(reason) = state.reject_with {
        return (StatusCode::BAD_REQUEST, Json(json!({ "errors": [reason] })));
    }

    let mut fields: HashMap<String, Vec<u8>> = HashMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let data = field.bytes().await.unwrap();
        fields.insert(name, data.to_vec());
    }

    let text = |key: &str| String::from_utf8(fields.get(key).cloned().unwrap_or_default()).unwrap();
    let entity_id = text("entityId");
    let Some(file) = fields.get(&entity_id) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "errors": ["missing entity file"] })));
    };

    let mut errors = Vec::new();
    if cid::hash_v1(file).ok().as_deref() != Some(entity_id.as_str()) {
        errors.push("entity id does not match file".to_string());
    }
    if text("authChain[0][type]") != "SIGNER" || text("authChain[1][type]") != "ECDSA_SIGNED_ENTITY" {
        errors.push("unexpected auth chain shape".to_string());
    }
    if text("authChain[1][payload]") != entity_id {
        errors.push("auth chain signs another entity".to_string());
    }
    if text("authChain[1][signature]") != format!("0xsig-{entity_id}") {
        errors.push("The signature is invalid".to_string());
    }
    if !errors.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors })));
    }

    let signer = text("authChain[0][payload]");
    let mut entity: Value = serde_json::from_slice(file).unwrap();
    if entity["pointers"] != json!([signer]) {
        return (StatusCode::BAD_REQUEST, Json(json!({ "errors": ["signer does not own pointer"] })));
    }
    entity["id"] = Value::from(entity_id);

    let mut entities = state.entities.lock().unwrap();
    entities.retain(|e| e["pointers"] != entity["pointers"]);
    entities.push(entity);

    (StatusCode::OK, Json(json!({ "creationTimestamp": 1_700_000_000_000i64 })))
}

async fn spawn_peer(state: PeerState) -> String {
    serve(
        Router::new()
            .route("/content/entities/profile", get(peer_entities))
            .route("/content/entities", post(peer_deploy))
            .with_state(state),
    )
    .await
}

fn stored_profile(name: &str) -> Value {
    json!({
        "id": "bafkreiprevious",
        "type": "profile",
        "pointers": [addr().as_str()],
        "timestamp": 1_600_000_000_000i64,
        "content": [
            { "file": "face256.png", "hash": "bafkreiface" },
            { "file": "body.png", "hash": "bafkreibody" }
        ],
        "metadata": {
            "avatars": [{
                "name": name,
                "hasClaimedName": true,
                "description": "",
                "avatar": { "bodyShape": "urn:decentraland:off-chain:base-avatars:BaseMale" }
            }]
        },
        "version": "v3"
    })
}

// ---------------------------------------------------------------------------
// Fake wallet
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct WalletState {
    reject_signing: bool,
    /// HTTP status sent along with JSON-RPC errors.
    error_status: Option<StatusCode>,
    accounts: Option<Vec<&'static str>>,
}

async fn wallet_rpc(
    State(state): State<WalletState>,
    Json(req): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let id = req["id"].clone();
    let error_status = state.error_status.unwrap_or(StatusCode::OK);
    let result = match req["method"].as_str() {
        Some("eth_requestAccounts") => json!(state.accounts.clone().unwrap_or_else(|| vec![ADDRESS])),
        Some("personal_sign") if state.reject_signing => {
            return (
                error_status,
                Json(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": 4001, "message": "User denied message signature" }
                })),
            );
        }
        Some("personal_sign") => {
            let hex_msg = req["params"][0].as_str().unwrap().trim_start_matches("0x");
            let message = String::from_utf8(hex::decode(hex_msg).unwrap()).unwrap();
            Value::from(format!("0xsig-{message}"))
        }
        _ => {
            return (
                error_status,
                Json(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": -32601, "message": "method not found" }
                })),
            );
        }
    };
    (StatusCode::OK, Json(json!({ "jsonrpc": "2.0", "id": id, "result": result })))
}

async fn spawn_wallet(state: WalletState) -> String {
    serve(Router::new().route("/", post(wallet_rpc)).with_state(state)).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config(index_url: &str, peer_url: &str, wallet_url: &str) -> ClientConfig {
    ClientConfig {
        name_index_url: format!("{index_url}/"),
        wallet_rpc_url: format!("{wallet_url}/"),
        ..ClientConfig::default()
    }
    .with_peer_url(peer_url)
}

// ---------------------------------------------------------------------------
// Name index
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_index_retries_until_success() {
    let state = IndexState {
        fail_first: 2,
        names: vec!["alice", "alice2"],
        ..Default::default()
    };
    let url = spawn_index(state.clone()).await;
    let client = NameIndexClient::new(&config(&url, "http://unused", "http://unused")).unwrap();

    let names = client.resolve_owned_names(&addr()).await;

    assert_eq!(names, vec![OwnedName::new("alice"), OwnedName::new("alice2")]);
    assert_eq!(state.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_index_gives_up_after_five_attempts() {
    let state = IndexState {
        fail_first: usize::MAX,
        ..Default::default()
    };
    let url = spawn_index(state.clone()).await;
    let client = NameIndexClient::new(&config(&url, "http://unused", "http://unused")).unwrap();

    let lookup = client.lookup_owned_names(&addr()).await;

    assert_eq!(state.calls.load(Ordering::SeqCst), 5);
    assert!(matches!(lookup, NameLookup::Exhausted { attempts: 5, .. }));
    assert!(lookup.into_names().is_empty());
}

#[tokio::test]
async fn test_index_gives_up_on_unreachable_host() {
    let client =
        NameIndexClient::new(&config("http://127.0.0.1:1", "http://unused", "http://unused"))
            .unwrap();

    let lookup = client.lookup_owned_names(&addr()).await;
    assert!(matches!(lookup, NameLookup::Exhausted { attempts: 5, .. }));
    assert!(client.resolve_owned_names(&addr()).await.is_empty());
}

#[tokio::test]
async fn test_index_retries_malformed_bodies() {
    let state = IndexState {
        malformed: true,
        ..Default::default()
    };
    let url = spawn_index(state.clone()).await;
    let client = NameIndexClient::new(&config(&url, "http://unused", "http://unused")).unwrap();

    assert!(client.resolve_owned_names(&addr()).await.is_empty());
    assert_eq!(state.calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_index_queries_lowercase_owner() {
    let state = IndexState {
        names: vec!["alice"],
        ..Default::default()
    };
    let url = spawn_index(state.clone()).await;
    let client = NameIndexClient::new(&config(&url, "http://unused", "http://unused")).unwrap();

    client.resolve_owned_names(&addr()).await;

    assert_eq!(
        state.beneficiaries.lock().unwrap().as_slice(),
        &[ADDRESS.to_lowercase()]
    );
}

// ---------------------------------------------------------------------------
// Peer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_fetch_profile_not_found() {
    let url = spawn_peer(PeerState::default()).await;
    let client = CatalystClient::new(&config("http://unused", &url, "http://unused")).unwrap();

    let result = client.fetch_profile(&addr()).await;
    assert!(matches!(result, Err(ClientError::NotFound(_))));
}

#[tokio::test]
async fn test_fetch_profile_uses_lowercase_pointer() {
    let state = PeerState::default();
    state.entities.lock().unwrap().push(stored_profile("alice"));
    let url = spawn_peer(state).await;
    let client = CatalystClient::new(&config("http://unused", &url, "http://unused")).unwrap();

    let profile = client.fetch_profile(&addr()).await.unwrap();
    assert_eq!(profile.current_name().unwrap(), "alice");
    assert_eq!(profile.content.get("body.png"), Some("bafkreibody"));
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

struct Services {
    config: ClientConfig,
    peer: PeerState,
}

async fn services(reject_deploy: Option<&'static str>, reject_signing: bool) -> Services {
    let index_url = spawn_index(IndexState {
        names: vec!["alice", "alice2"],
        ..Default::default()
    })
    .await;

    let peer = PeerState {
        reject_with: reject_deploy,
        ..Default::default()
    };
    peer.entities.lock().unwrap().push(stored_profile("alice"));
    let peer_url = spawn_peer(peer.clone()).await;

    let wallet_url = spawn_wallet(WalletState {
        reject_signing,
        ..Default::default()
    })
    .await;

    Services {
        config: config(&index_url, &peer_url, &wallet_url),
        peer,
    }
}

#[tokio::test]
async fn test_rename_over_http() {
    let svc = services(None, false).await;
    let session = Session::connect(&svc.config).await.unwrap();
    assert_eq!(session.address(), &addr());

    let mut controller = load_selection(&session).await.unwrap();
    assert_eq!(controller.current().as_str(), "alice");

    controller.select("alice2").unwrap();
    let receipt = deploy_selection(&session, &mut controller).await.unwrap();

    assert_eq!(receipt.creation_timestamp, Some(1_700_000_000_000));
    assert_eq!(controller.state(), SelectionState::Clean);
    assert_eq!(controller.current().as_str(), "alice2");

    let profile = session.peer().fetch_profile(&addr()).await.unwrap();
    assert_eq!(profile.id, receipt.entity_id);
    assert_eq!(profile.current_name().unwrap(), "alice2");
    assert_eq!(profile.metadata.avatars[0].has_claimed_name, Some(true));
    assert_eq!(
        serde_json::to_value(&profile.content).unwrap(),
        stored_profile("alice")["content"]
    );
    assert_eq!(svc.peer.entities.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_rejected_deployment_keeps_selection_dirty() {
    let svc = services(Some("Stale timestamp"), false).await;
    let session = Session::connect(&svc.config).await.unwrap();
    let mut controller = load_selection(&session).await.unwrap();
    controller.select("alice2").unwrap();

    let result = deploy_selection(&session, &mut controller).await;

    match result {
        Err(ClientError::DeploymentRejected { status, reasons }) => {
            assert_eq!(status, 400);
            assert_eq!(reasons, vec!["Stale timestamp"]);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(controller.state(), SelectionState::Dirty);
    assert_eq!(controller.current().as_str(), "alice");
}

#[tokio::test]
async fn test_user_rejecting_signature() {
    let svc = services(None, true).await;
    let session = Session::connect(&svc.config).await.unwrap();
    let mut controller = load_selection(&session).await.unwrap();
    controller.select("alice2").unwrap();

    let result = deploy_selection(&session, &mut controller).await;

    assert!(matches!(result, Err(ClientError::SigningRejected(_))));
    assert_eq!(controller.state(), SelectionState::Dirty);
    assert_eq!(
        svc.peer.entities.lock().unwrap()[0]["id"],
        Value::from("bafkreiprevious")
    );
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_rejection_with_error_status_is_still_a_rejection() {
    let url = spawn_wallet(WalletState {
        reject_signing: true,
        error_status: Some(StatusCode::BAD_REQUEST),
        ..Default::default()
    })
    .await;
    let wallet = JsonRpcWallet::new(url).unwrap();

    let result = wallet.personal_sign("bafkrei", &addr()).await;

    assert!(matches!(result, Err(ClientError::SigningRejected(_))));
}

#[tokio::test]
async fn test_malformed_account_means_wallet_unavailable() {
    let url = spawn_wallet(WalletState {
        accounts: Some(vec!["not-an-address"]),
        ..Default::default()
    })
    .await;
    let wallet = JsonRpcWallet::new(url).unwrap();

    assert!(matches!(
        wallet.enable().await,
        Err(ClientError::WalletUnavailable(_))
    ));
}
