use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::{CheckInId, ClientId, CoachId, QuestionId, Response};

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CheckInError {
    #[error("overall progress {0} is outside 0..=100")]
    ProgressOutOfRange(f64),

    #[error("duplicate response for question {0}")]
    DuplicateResponse(QuestionId),
}

/// Lifecycle status of a check-in document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
    Completed,
    Missed,
    Upcoming,
    Pending,
    NeedsAttention,
}

/// Numeric measurements captured alongside a submission.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl Measurements {
    #[must_use]
    pub fn with_weight(weight: f64) -> Self {
        Self { weight: Some(weight) }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weight.is_none()
    }
}

/// One client's dated, immutable submission against a template.
///
/// History accumulates as new documents; a completed check-in is never
/// edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CheckInDoc")]
pub struct CheckIn {
    id: CheckInId,
    client_id: ClientId,
    coach_id: CoachId,
    date: DateTime<Utc>,
    status: CheckInStatus,
    overall_progress: f64,
    responses: Vec<Response>,
    #[serde(default, skip_serializing_if = "Measurements::is_empty")]
    measurements: Measurements,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckInDoc {
    id: CheckInId,
    client_id: ClientId,
    coach_id: CoachId,
    date: DateTime<Utc>,
    status: CheckInStatus,
    overall_progress: f64,
    responses: Vec<Response>,
    #[serde(default)]
    measurements: Measurements,
}

impl TryFrom<CheckInDoc> for CheckIn {
    type Error = CheckInError;

    fn try_from(doc: CheckInDoc) -> Result<Self, CheckInError> {
        CheckIn::from_persisted(
            doc.id,
            doc.client_id,
            doc.coach_id,
            doc.date,
            doc.status,
            doc.overall_progress,
            doc.responses,
            doc.measurements,
        )
    }
}

impl CheckIn {
    /// Rehydrate a check-in from persisted storage, revalidating invariants.
    ///
    /// # Errors
    ///
    /// Returns `CheckInError::ProgressOutOfRange` or `DuplicateResponse`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: CheckInId,
        client_id: ClientId,
        coach_id: CoachId,
        date: DateTime<Utc>,
        status: CheckInStatus,
        overall_progress: f64,
        responses: Vec<Response>,
        measurements: Measurements,
    ) -> Result<Self, CheckInError> {
        if !(0.0..=100.0).contains(&overall_progress) {
            return Err(CheckInError::ProgressOutOfRange(overall_progress));
        }
        let mut seen = HashSet::new();
        for r in &responses {
            if !seen.insert(r.question_id.clone()) {
                return Err(CheckInError::DuplicateResponse(r.question_id.clone()));
            }
        }

        Ok(Self {
            id,
            client_id,
            coach_id,
            date,
            status,
            overall_progress,
            responses,
            measurements,
        })
    }

    #[must_use]
    pub fn id(&self) -> &CheckInId {
        &self.id
    }

    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    #[must_use]
    pub fn coach_id(&self) -> &CoachId {
        &self.coach_id
    }

    #[must_use]
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    #[must_use]
    pub fn status(&self) -> CheckInStatus {
        self.status
    }

    #[must_use]
    pub fn overall_progress(&self) -> f64 {
        self.overall_progress
    }

    #[must_use]
    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    #[must_use]
    pub fn measurements(&self) -> Measurements {
        self.measurements
    }

    /// Recorded body weight, if this submission captured one.
    #[must_use]
    pub fn weight(&self) -> Option<f64> {
        self.measurements.weight
    }
}
