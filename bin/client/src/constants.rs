/// Local data directory holding the client's receipt -> root-hash store.
pub const CLIENT_DATA_DIR: &str = "client_data";

/// Default upstream server host, used to build the `ws://` URL.
pub const DEFAULT_SERVER_HOST: &str = "localhost";

/// Default upstream server port.
pub const DEFAULT_SERVER_PORT: &str = "3000";

/// Default façade listen address.
pub const DEFAULT_FACADE_ADDRESS: &str = "127.0.0.1:8080";

/// Deadline for a single upload/download round trip (§4.4).
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Writer idle ping interval (§4.3).
pub const PING_INTERVAL_SECS: u64 = 2;

/// Reconnect backoff bounds (§4.3).
pub const INITIAL_BACKOFF_SECS: u64 = 1;
pub const MAX_BACKOFF_SECS: u64 = 10;
pub const GIVE_UP_AFTER_SECS: u64 = 300;

/// Bound on frames queued for the writer before backpressure kicks in.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 100;
