use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::{
    clock::LocalTime,
    error::{DeskError, DeskResult},
    schedule::{parse_start_time, SlotEntry},
    types::{ClientId, DEFAULT_RESERVATION_SIZE, DEFAULT_TIMEZONE, DEFAULT_VALUE_COUNT},
};

/// One registered client, as written in the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: u64,
    pub name: String,
    /// Identifier the client presents on requests.
    pub client: ClientId,
    /// Ledger lines, applied in order.
    #[serde(default)]
    pub transactions: Vec<String>,
    /// Per-weekday slot table, Monday first.
    #[serde(default)]
    pub plan: Vec<Vec<Option<SlotEntry>>>,
}

#[derive(Debug, Clone, Deserialize)]
struct RosterFile {
    lesson_start_times: Vec<String>,
    clients: Vec<ClientRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceSettings {
    /// Token callers must present. Empty rejects every request.
    pub auth_token: String,
    /// IANA zone name lesson plans and ledger dates are written in.
    pub timezone: String,
    pub value_count: usize,
    pub reservation_size: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            auth_token: String::new(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            value_count: DEFAULT_VALUE_COUNT,
            reservation_size: DEFAULT_RESERVATION_SIZE,
        }
    }
}

impl ServiceSettings {
    pub fn authenticates(&self, token: Option<&str>) -> bool {
        !self.auth_token.is_empty() && token == Some(self.auth_token.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct DeskConfig {
    /// Slot start times shared by every client and weekday.
    pub lesson_start_times: Vec<NaiveTime>,
    pub clients: Vec<ClientRecord>,
    pub settings: ServiceSettings,
}

impl DeskConfig {
    /// Load from the data/ directory.
    /// In tests, use DeskConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let roster_path = format!("{data_dir}/roster.json");
        let roster = std::fs::read_to_string(&roster_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {roster_path}: {e}"))?;

        // service.json is optional; every field has a default.
        let settings_path = format!("{data_dir}/service.json");
        let settings = match std::fs::read_to_string(&settings_path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => anyhow::bail!("Cannot read {settings_path}: {e}"),
        };

        Self::from_json(&roster, settings.as_deref())
    }

    pub fn from_json(roster: &str, settings: Option<&str>) -> anyhow::Result<Self> {
        let file: RosterFile = serde_json::from_str(roster)?;
        let lesson_start_times = file
            .lesson_start_times
            .iter()
            .map(|t| parse_start_time(t))
            .collect::<Result<Vec<_>, _>>()
            .map_err(anyhow::Error::msg)?;
        let settings = match settings {
            Some(content) => serde_json::from_str(content)?,
            None => ServiceSettings::default(),
        };
        Ok(Self {
            lesson_start_times,
            clients: file.clients,
            settings,
        })
    }

    pub fn local_time(&self) -> DeskResult<LocalTime> {
        LocalTime::named(&self.settings.timezone).ok_or_else(|| {
            DeskError::InvalidConfig(format!("unknown time zone {:?}", self.settings.timezone))
        })
    }

    /// Config with hardcoded defaults for use in tests.
    ///
    /// Lessons start on the hour from 08:00 to 14:00, local time is UTC.
    ///   - "xyzzy" (3B): Monday 9:00-9:45, Wednesday 8:00-10:45,
    ///     value 1 weakened to 5, 3 moved from value 2 to value 4.
    ///   - "plugh" (2A): weekdays 8:00-14:45, no ledger.
    pub fn default_test() -> Self {
        let on = || Some(SlotEntry::Flag(true));
        let label = |s: &str| Some(SlotEntry::Label(s.to_string()));

        let lesson_start_times = (8..=14)
            .filter_map(|h| NaiveTime::from_hms_opt(h, 0, 0))
            .collect();

        let xyzzy = ClientRecord {
            id: 1,
            name: "3B".into(),
            client: "xyzzy".into(),
            transactions: vec![
                "delete 5 from 1, 2099-01-01".into(),
                "move 3 from 2 to 4, 2099-01-01".into(),
            ],
            plan: vec![
                vec![None, label("math")],
                vec![],
                vec![on(), on(), label("physics")],
            ],
        };

        let plugh = ClientRecord {
            id: 2,
            name: "2A".into(),
            client: "plugh".into(),
            transactions: vec![],
            plan: vec![vec![on(); 7]; 5],
        };

        Self {
            lesson_start_times,
            clients: vec![xyzzy, plugh],
            settings: ServiceSettings {
                auth_token: "12345".into(),
                timezone: "UTC".into(),
                ..ServiceSettings::default()
            },
        }
    }
}
