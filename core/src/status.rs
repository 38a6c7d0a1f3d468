//! Read-only status projection over every registered client.

use serde::{Deserialize, Serialize};

use crate::types::{ClientId, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientStatus {
    pub id: u64,
    pub name: String,
    pub client: ClientId,
    /// Rendered weekly plan, e.g. `Mon 9:00-9:45; Wed 8:00-10:45`.
    pub plan: String,
    pub cursor: u64,
    /// Pending draws, next first.
    pub pending: Vec<Value>,
    /// Encoded weight vector.
    pub weights: String,
}
