use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::CourtId;

/// Operational status of a court.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourtStatus {
    #[default]
    Active,
    Maintenance,
    Closed,
}

impl CourtStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourtStatus::Active => "active",
            CourtStatus::Maintenance => "maintenance",
            CourtStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for CourtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourtStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "maintenance" => Ok(Self::Maintenance),
            "closed" => Ok(Self::Closed),
            _ => Err(format!("Unknown court status: {}", s)),
        }
    }
}

/// A bookable court.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Court {
    pub id: CourtId,
    pub name: String,
    #[serde(default)]
    pub surface: Option<String>,
    #[serde(default)]
    pub status: CourtStatus,
}

impl Court {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: CourtId::new(id),
            name: name.into(),
            surface: None,
            status: CourtStatus::Active,
        }
    }

    pub fn with_surface(mut self, surface: impl Into<String>) -> Self {
        self.surface = Some(surface.into());
        self
    }

    pub fn with_status(mut self, status: CourtStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_bookable(&self) -> bool {
        self.status == CourtStatus::Active
    }
}

/// The two clay courts the club operates.
pub fn default_courts() -> Vec<Court> {
    vec![
        Court::new(1, "Court 1").with_surface("clay"),
        Court::new(2, "Court 2").with_surface("clay"),
    ]
}
