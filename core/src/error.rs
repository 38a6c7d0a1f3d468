use thiserror::Error;

/// Fatal problems found while parsing or replaying a transaction ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Malformed transaction {line:?}: {reason}")]
    Malformed { line: String, reason: String },

    #[error("Transaction {line:?} refers to value {index}, expected 1..={len}")]
    IndexOutOfRange { line: String, index: usize, len: usize },

    #[error("Transaction {line:?} drives weight of value {index} to {weight}, allowed range is (0, 64)")]
    WeightOutOfBounds { line: String, index: usize, weight: i64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Value {value} cannot be encoded, alphabet holds {len} symbols")]
    OutOfRange { value: usize, len: usize },

    #[error("Character {0:?} is not part of the alphabet")]
    UnknownCharacter(char),
}

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Ledger error for client '{client}': {source}")]
    Ledger { client: String, source: LedgerError },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Invalid plan for client '{client}': {reason}")]
    InvalidPlan { client: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Persisted state references unknown client '{client}'")]
    UnknownPersistedClient { client: String },

    #[error("Persisted state for client '{client}' is corrupt: {reason}")]
    CorruptState { client: String, reason: String },

    #[error("Invalid authentication")]
    InvalidAuthentication,

    #[error("Client '{client}' is not registered")]
    InvalidClient { client: String },

    #[error("Client '{client}' is outside its lesson plan")]
    ClientNotActive { client: String },

    #[error("Invalid allow-list: {reason}")]
    InvalidAllowList { reason: String },

    #[error("Could not persist draw state for client '{client}': {source}")]
    Persistence {
        client: String,
        #[source]
        source: Box<DeskError>,
    },

    #[error("Lock for client '{client}' was poisoned")]
    LockPoisoned { client: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DeskError {
    /// Stable tag reported to callers of the request interface.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::InvalidAuthentication => "invalid-authentication",
            Self::InvalidClient { .. } => "invalid-client",
            Self::ClientNotActive { .. } => "client-not-active",
            Self::InvalidAllowList { .. } => "invalid-allow-list",
            _ => "error",
        }
    }

    /// True for errors caused by the request itself rather than by the service.
    pub fn is_request_error(&self) -> bool {
        self.tag() != "error"
    }
}

pub type DeskResult<T> = Result<T, DeskError>;
