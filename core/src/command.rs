use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    sequence::DrawMode,
    types::{ClientId, Value},
};

/// A caller asking for the next value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRequest {
    pub client: ClientId,
    /// Encoded allow-list. `None` allows every value.
    #[serde(default)]
    pub allow: Option<String>,
    #[serde(default)]
    pub mode: DrawMode,
}

impl DrawRequest {
    pub fn new(client: impl Into<ClientId>) -> Self {
        Self {
            client: client.into(),
            allow: None,
            mode: DrawMode::Continuing,
        }
    }

    pub fn with_allow(mut self, allow: impl Into<String>) -> Self {
        self.allow = Some(allow.into());
        self
    }

    pub fn starting(mut self) -> Self {
        self.mode = DrawMode::Starting;
        self
    }
}

/// A successful draw: the value plus the client's encoded weight vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawReply {
    pub value: Value,
    pub weights: String,
}

/// Wire form: `<value> <weights>`.
impl fmt::Display for DrawReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.weights)
    }
}
