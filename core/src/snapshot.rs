//! Persisted draw state: everything needed to resume a client's
//! sequence after a restart without re-issuing or losing a value.

use serde::{Deserialize, Serialize};

use crate::types::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawState {
    /// Number of values consumed so far, discards included.
    pub cursor: u64,
    /// Pending draws, head first.
    pub buffer: Vec<Value>,
}
