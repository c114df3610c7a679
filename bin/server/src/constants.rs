/// Default data directory holding both the blob store and the tree store.
pub const DEFAULT_DATA_DIR: &str = "server_data";

/// Default server listen host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server listen port; also the spec's default wire port (3000).
pub const DEFAULT_PORT: &str = "3000";

/// Bounded outbound frame queue size per connection (§5 backpressure).
pub const OUTBOUND_QUEUE_CAPACITY: usize = 100;
