//! Club configuration.
//!
//! Everything the server needs is read from one TOML file:
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [schedule]
//! opening_hour = 8
//! closing_hour = 22
//! utc_offset_minutes = 180
//! prime_windows = [{ start_hour = 8, end_hour = 12 }, { start_hour = 15, end_hour = 18 }]
//!
//! [policy]
//! enforce_advance_notice = true
//! advance_notice_hours = 24
//!
//! [assistant.club]
//! currency = "UGX"
//! phones = ["+256 772 675 050"]
//!
//! [[assistant.club.playing_rates]]
//! label = "Club Members"
//! amount = 10000
//! per = "hour"
//!
//! [[courts]]
//! id = 1
//! name = "Court 1"
//! surface = "clay"
//! ```
//!
//! Every field has a default, so an empty file (or no file) gives the club's
//! standard setup. Selected values can be overridden from the environment; see
//! [`ClubConfig::apply_overrides`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::Court;
use crate::db::{PostgresSettings, RepositoryConfig, RepositorySettings};
use crate::models::{default_courts, ClubTimezone, PrimeWindow, SlotGrid};
use crate::services::{AssistantSettings, AuthSettings, AvailabilityResolver, BookingPolicy};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "CLUB_CONFIG";

/// Upper bound for policy lead times and token lifetime: one year.
pub const MAX_LEAD_HOURS: i64 = 24 * 366;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Operating hours, prime windows and the club's clock offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    #[serde(default = "default_opening_hour")]
    pub opening_hour: u32,
    #[serde(default = "default_closing_hour")]
    pub closing_hour: u32,
    #[serde(default = "default_prime_windows")]
    pub prime_windows: Vec<PrimeWindow>,
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

fn default_opening_hour() -> u32 {
    SlotGrid::default().opening_hour
}

fn default_closing_hour() -> u32 {
    SlotGrid::default().closing_hour
}

fn default_prime_windows() -> Vec<PrimeWindow> {
    SlotGrid::default().prime_windows
}

fn default_utc_offset_minutes() -> i32 {
    ClubTimezone::default().utc_offset_minutes
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            opening_hour: default_opening_hour(),
            closing_hour: default_closing_hour(),
            prime_windows: default_prime_windows(),
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

impl ScheduleSettings {
    pub fn grid(&self) -> SlotGrid {
        SlotGrid {
            opening_hour: self.opening_hour,
            closing_hour: self.closing_hour,
            prime_windows: self.prime_windows.clone(),
        }
    }

    pub fn timezone(&self) -> ClubTimezone {
        ClubTimezone::new(self.utc_offset_minutes)
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub policy: BookingPolicy,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub assistant: AssistantSettings,
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub postgres: PostgresSettings,
    #[serde(default = "default_courts")]
    pub courts: Vec<Court>,
}

impl Default for ClubConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            schedule: ScheduleSettings::default(),
            policy: BookingPolicy::default(),
            auth: AuthSettings::default(),
            assistant: AssistantSettings::default(),
            repository: RepositorySettings::default(),
            postgres: PostgresSettings::default(),
            courts: default_courts(),
        }
    }
}

impl ClubConfig {
    /// Parse configuration from TOML text and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClubConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ClubConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Locate the configuration file.
    ///
    /// `CLUB_CONFIG` wins when set; otherwise `club.toml` is searched in the
    /// current directory, `backend/` and the parent directory.
    pub fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }

        [
            PathBuf::from("club.toml"),
            PathBuf::from("backend/club.toml"),
            PathBuf::from("../club.toml"),
        ]
        .into_iter()
        .find(|p| p.exists())
    }

    /// Load from the located file (or defaults when there is none), then apply
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::locate() {
            Some(path) => {
                log::info!("loading club configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                log::info!("no club.toml found, using built-in defaults");
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Recognized keys: `HOST`, `PORT`, `JWT_SECRET`, `ASSISTANT_API_KEY`,
    /// `DATABASE_URL` and `REPOSITORY_TYPE`. A `DATABASE_URL` without an
    /// explicit `REPOSITORY_TYPE` selects the Postgres backend.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => log::warn!("ignoring invalid PORT value '{}'", port),
            }
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(key) = lookup("ASSISTANT_API_KEY") {
            self.assistant.api_key = Some(key);
        }
        let database_url = lookup("DATABASE_URL");
        if let Some(url) = database_url.clone() {
            self.postgres.database_url = url;
        }
        match lookup("REPOSITORY_TYPE") {
            Some(repo_type) => self.repository.repo_type = repo_type,
            None if database_url.is_some() => self.repository.repo_type = "postgres".to_string(),
            None => {}
        }
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.schedule;
        if s.opening_hour >= s.closing_hour || s.closing_hour > 24 {
            return Err(ConfigError::Invalid(format!(
                "schedule hours must satisfy opening_hour < closing_hour <= 24 (got {}..{})",
                s.opening_hour, s.closing_hour
            )));
        }
        if let Some(w) = s
            .prime_windows
            .iter()
            .find(|w| w.start_hour >= w.end_hour || w.end_hour > 24)
        {
            return Err(ConfigError::Invalid(format!(
                "prime window {}..{} is empty or out of range",
                w.start_hour, w.end_hour
            )));
        }
        if s.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_minutes {} is out of range",
                s.utc_offset_minutes
            )));
        }
        if self.courts.is_empty() {
            return Err(ConfigError::Invalid("at least one court is required".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.courts.iter().find(|c| !seen.insert(c.id)) {
            return Err(ConfigError::Invalid(format!("duplicate court id {}", dup.id)));
        }
        let p = &self.policy;
        for (name, hours) in [
            ("advance_notice_hours", p.advance_notice_hours),
            ("cancellation_window_hours", p.cancellation_window_hours),
        ] {
            if !(0..=MAX_LEAD_HOURS).contains(&hours) {
                return Err(ConfigError::Invalid(format!(
                    "policy.{} must be between 0 and {} (got {})",
                    name, MAX_LEAD_HOURS, hours
                )));
            }
        }
        if !(1..=MAX_LEAD_HOURS).contains(&self.auth.token_ttl_hours) {
            return Err(ConfigError::Invalid(format!(
                "auth.token_ttl_hours must be between 1 and {} (got {})",
                MAX_LEAD_HOURS, self.auth.token_ttl_hours
            )));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret must not be empty".into()));
        }
        Ok(())
    }

    pub fn resolver(&self) -> AvailabilityResolver {
        AvailabilityResolver::new(self.schedule.grid(), self.policy.clone())
    }

    pub fn repository_config(&self) -> RepositoryConfig {
        RepositoryConfig {
            repository: self.repository.clone(),
            postgres: self.postgres.clone(),
        }
    }
}
