pub mod file_utils;

use serde::{Deserialize, Serialize};

/// Body of the `GET /health` façade endpoint.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
}
