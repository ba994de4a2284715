use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use crate::client::ClientFactory;
use crate::journal::JournalMode;
use crate::{Error, Result};

pub const DOMAIN: &str = "pentairthermalwifi";
pub const DEFAULT_NAME: &str = "Pentair Thermal WiFi";
pub const MANUFACTURER: &str = "Pentair Thermal";
pub const MODEL: &str = "Senz WiFi";

pub const CONF_EMAIL: &str = "email";
pub const CONF_PASSWORD: &str = "password";

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Validate user input against the entry schema: both fields are
    /// required non-empty strings.
    pub fn from_value(input: &Value) -> Result<Self> {
        let field = |key: &str| -> Result<String> {
            match input.get(key).and_then(|v| v.as_str()) {
                Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
                Some(_) => Err(Error::InvalidConfig(format!("{key} must not be empty"))),
                None => Err(Error::InvalidConfig(format!("missing required field: {key}"))),
            }
        };
        Ok(Self {
            email: field(CONF_EMAIL)?,
            password: field(CONF_PASSWORD)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"**REDACTED**")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryOptions {
    /// Seconds between scheduled refreshes.
    pub scan_interval: u64,
    pub message_log: Option<PathBuf>,
    pub message_log_mode: JournalMode,
}

impl Default for EntryOptions {
    fn default() -> Self {
        Self {
            scan_interval: DEFAULT_SCAN_INTERVAL.as_secs(),
            message_log: None,
            message_log_mode: JournalMode::Full,
        }
    }
}

impl EntryOptions {
    /// Refresh cadence. A zero `scan_interval` is rejected.
    pub fn update_interval(&self) -> Result<Duration> {
        if self.scan_interval == 0 {
            return Err(Error::InvalidConfig(
                "scan_interval must be at least 1 second".to_string(),
            ));
        }
        Ok(Duration::from_secs(self.scan_interval))
    }
}

/// A configured account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub entry_id: String,
    pub title: String,
    pub unique_id: String,
    pub data: Credentials,
    #[serde(default)]
    pub options: EntryOptions,
}

impl ConfigEntry {
    pub fn new(data: Credentials) -> Self {
        Self {
            entry_id: Uuid::new_v4().simple().to_string(),
            title: format!("Pentair Thermal ({})", data.email),
            unique_id: data.email.clone(),
            data,
            options: EntryOptions::default(),
        }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[derive(Debug)]
pub enum FlowResult {
    Form { errors: BTreeMap<String, String> },
    CreateEntry(ConfigEntry),
    Abort { reason: String },
}

/// Interactive account setup: validates credentials before creating an entry.
pub struct ConfigFlow {
    configured: HashSet<String>,
}

impl ConfigFlow {
    pub fn new(configured: impl IntoIterator<Item = String>) -> Self {
        Self {
            configured: configured.into_iter().collect(),
        }
    }

    pub async fn step_user(&mut self, input: Option<&Value>, factory: &ClientFactory) -> FlowResult {
        let mut errors = BTreeMap::new();

        let Some(input) = input else {
            return FlowResult::Form { errors };
        };

        let credentials = match Credentials::from_value(input) {
            Ok(c) => c,
            Err(e) => {
                debug!("rejecting config input: {e}");
                errors.insert("base".to_string(), "invalid_input".to_string());
                return FlowResult::Form { errors };
            }
        };

        let client = factory(&credentials);
        let outcome = client.authenticate().await;
        if let Err(e) = client.close().await {
            debug!("closing validation client failed: {e}");
        }

        match outcome {
            Ok(()) => {
                if !self.configured.insert(credentials.email.clone()) {
                    return FlowResult::Abort {
                        reason: "already_configured".to_string(),
                    };
                }
                FlowResult::CreateEntry(ConfigEntry::new(credentials))
            }
            Err(e) if e.is_auth() => {
                error!("authentication failed with provided credentials");
                errors.insert("base".to_string(), "invalid_auth".to_string());
                FlowResult::Form { errors }
            }
            Err(e) => {
                error!("unexpected error during authentication: {e}");
                errors.insert("base".to_string(), "cannot_connect".to_string());
                FlowResult::Form { errors }
            }
        }
    }
}
