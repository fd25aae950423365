use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{ClientId, CoachId};

/// One client as seen on a coach's roster.
///
/// Owned by the roster collaborator; the aggregation engine only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRosterEntry {
    pub client_id: ClientId,
    pub name: String,
    pub coach_id: CoachId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub streak_days: u32,
}

/// A tracked goal for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub target: f64,
    pub current: f64,
}

/// Per-client progress document: metric histories and goals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProgress {
    pub client_id: ClientId,
    #[serde(default)]
    pub metrics: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub goals: BTreeMap<String, Goal>,
    pub last_updated: DateTime<Utc>,
}
