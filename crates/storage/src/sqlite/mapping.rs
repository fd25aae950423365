//! Row-to-domain mapping helpers shared by the `SQLite` repositories.

use checkin_core::model::{
    CheckIn, CheckInId, CheckInStatus, ClientId, ClientProgress, CoachId, Measurements, Question,
    Response, Template, TemplateId, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(super) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(super) fn conn(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => StorageError::Unavailable(e.to_string()),
    }
}

pub(super) fn status_to_str(status: CheckInStatus) -> &'static str {
    match status {
        CheckInStatus::Completed => "completed",
        CheckInStatus::Missed => "missed",
        CheckInStatus::Upcoming => "upcoming",
        CheckInStatus::Pending => "pending",
        CheckInStatus::NeedsAttention => "needs_attention",
    }
}

pub(super) fn status_from_str(s: &str) -> Result<CheckInStatus, StorageError> {
    match s {
        "completed" => Ok(CheckInStatus::Completed),
        "missed" => Ok(CheckInStatus::Missed),
        "upcoming" => Ok(CheckInStatus::Upcoming),
        "pending" => Ok(CheckInStatus::Pending),
        "needs_attention" => Ok(CheckInStatus::NeedsAttention),
        other => Err(StorageError::Serialization(format!(
            "unknown check-in status: {other}"
        ))),
    }
}

pub(super) fn map_template_row(row: &SqliteRow) -> Result<Template, StorageError> {
    let questions: Vec<Question> =
        serde_json::from_str(row.try_get::<String, _>("questions").map_err(ser)?.as_str())
            .map_err(ser)?;
    Template::from_persisted(
        TemplateId::new(row.try_get::<String, _>("id").map_err(ser)?),
        row.try_get("name").map_err(ser)?,
        questions,
        UserId::new(row.try_get::<String, _>("created_by").map_err(ser)?),
        row.try_get::<bool, _>("is_default").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(super) fn map_check_in_row(row: &SqliteRow) -> Result<CheckIn, StorageError> {
    let responses: Vec<Response> =
        serde_json::from_str(row.try_get::<String, _>("responses").map_err(ser)?.as_str())
            .map_err(ser)?;
    let status = status_from_str(row.try_get::<String, _>("status").map_err(ser)?.as_str())?;
    let weight: Option<f64> = row.try_get("weight").map_err(ser)?;

    CheckIn::from_persisted(
        CheckInId::new(row.try_get::<String, _>("id").map_err(ser)?),
        ClientId::new(row.try_get::<String, _>("client_id").map_err(ser)?),
        CoachId::new(row.try_get::<String, _>("coach_id").map_err(ser)?),
        row.try_get("date").map_err(ser)?,
        status,
        row.try_get("overall_progress").map_err(ser)?,
        responses,
        weight.map_or_else(Measurements::default, Measurements::with_weight),
    )
    .map_err(ser)
}

pub(super) fn map_progress_row(row: &SqliteRow) -> Result<ClientProgress, StorageError> {
    Ok(ClientProgress {
        client_id: ClientId::new(row.try_get::<String, _>("client_id").map_err(ser)?),
        metrics: serde_json::from_str(row.try_get::<String, _>("metrics").map_err(ser)?.as_str())
            .map_err(ser)?,
        goals: serde_json::from_str(row.try_get::<String, _>("goals").map_err(ser)?.as_str())
            .map_err(ser)?,
        last_updated: row.try_get("last_updated").map_err(ser)?,
    })
}
