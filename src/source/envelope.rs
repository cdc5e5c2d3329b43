//! Response envelopes of the progression endpoints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::constants::{
    PATH_PROGRESSION_DATA, PATH_PROGRESSION_DATA_LEGACY, PATH_SYNC_PROGRESSION,
};
use crate::core::{ConfigError, SourceError};
use crate::progression::ProgressionSnapshot;

/// Progression endpoint to poll.
///
/// The backend grew three endpoints serving the same snapshot under two
/// envelope field names. New deployments should use
/// [`Endpoint::ProgressionData`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// `GET /api/progression/data` → `{ success, progression }`.
    #[default]
    ProgressionData,
    /// `GET /api/sync-progression` → `{ success, player_data }`.
    SyncProgression,
    /// `GET /api/progression-data` → `{ success, progression }`.
    ProgressionDataLegacy,
}

impl Endpoint {
    /// Request path.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::ProgressionData => PATH_PROGRESSION_DATA,
            Endpoint::SyncProgression => PATH_SYNC_PROGRESSION,
            Endpoint::ProgressionDataLegacy => PATH_PROGRESSION_DATA_LEGACY,
        }
    }

    /// Envelope field carrying the snapshot.
    pub fn payload_field(self) -> &'static str {
        match self {
            Endpoint::SyncProgression => "player_data",
            Endpoint::ProgressionData | Endpoint::ProgressionDataLegacy => "progression",
        }
    }

    /// Decode a response body into a snapshot.
    ///
    /// `success: false`, a missing payload or an invalid payload are all
    /// [`SourceError::Malformed`]. The endpoint's own payload field is
    /// preferred; the other spelling is accepted as a fallback.
    pub fn decode(self, body: &[u8]) -> Result<ProgressionSnapshot, SourceError> {
        let envelope: Envelope =
            serde_json::from_slice(body).map_err(|e| SourceError::Malformed(e.to_string()))?;

        if !envelope.success {
            let reason = envelope
                .error
                .or(envelope.message)
                .unwrap_or_else(|| "success=false".to_string());
            return Err(SourceError::Malformed(reason));
        }

        let (primary, fallback) = match self {
            Endpoint::SyncProgression => (envelope.player_data, envelope.progression),
            Endpoint::ProgressionData | Endpoint::ProgressionDataLegacy => {
                (envelope.progression, envelope.player_data)
            }
        };

        primary.or(fallback).ok_or_else(|| {
            SourceError::Malformed(format!("missing `{}` field", self.payload_field()))
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Endpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "progression_data" | "/api/progression/data" => Ok(Endpoint::ProgressionData),
            "sync_progression" | "/api/sync-progression" => Ok(Endpoint::SyncProgression),
            "progression_data_legacy" | "/api/progression-data" => {
                Ok(Endpoint::ProgressionDataLegacy)
            }
            other => Err(ConfigError::Invalid(format!("unknown endpoint {other:?}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    progression: Option<ProgressionSnapshot>,
    #[serde(default)]
    player_data: Option<ProgressionSnapshot>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}
