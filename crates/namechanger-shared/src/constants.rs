/// Application name
pub const APP_NAME: &str = "namechanger";

/// Origin tag sent to remote services
pub const CLIENT_ORIGIN: &str = "name-changer";

/// Peer (catalyst) node used for profile reads and deployments
pub const DEFAULT_PEER_URL: &str = "https://peer.decentraland.org";

/// Subgraph that indexes name ownership
pub const DEFAULT_NAME_INDEX_URL: &str =
    "https://api.thegraph.com/subgraphs/name/decentraland/marketplace";

/// Wallet JSON-RPC endpoint
pub const DEFAULT_WALLET_RPC_URL: &str = "http://localhost:8545";

/// Maximum number of names fetched from the index in one query
pub const NAME_INDEX_PAGE_SIZE: usize = 1000;

/// Total name index attempts before giving up
pub const NAME_INDEX_ATTEMPTS: usize = 5;

/// Entity schema version written into every deployed entity file
pub const ENTITY_VERSION: &str = "v3";

/// Default timeout for index and peer requests in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
