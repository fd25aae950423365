use checkin_core::model::{ClientId, ClientProgress, ClientRosterEntry, CoachId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_progress_row, ser};
use crate::repository::{RosterRepository, StorageError};

#[async_trait::async_trait]
impl RosterRepository for SqliteRepository {
    async fn upsert_entry(&self, entry: &ClientRosterEntry) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO roster (client_id, name, coach_id, last_check_in_at, streak_days)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(client_id) DO UPDATE SET
                    name = excluded.name,
                    coach_id = excluded.coach_id,
                    last_check_in_at = excluded.last_check_in_at,
                    streak_days = excluded.streak_days
            ",
        )
        .bind(entry.client_id.as_str())
        .bind(&entry.name)
        .bind(entry.coach_id.as_str())
        .bind(entry.last_check_in_at)
        .bind(i64::from(entry.streak_days))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn list_roster(
        &self,
        coach_id: &CoachId,
    ) -> Result<Vec<ClientRosterEntry>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT client_id, name, coach_id, last_check_in_at, streak_days
                FROM roster
                WHERE coach_id = ?1
                ORDER BY client_id
            ",
        )
        .bind(coach_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| {
                let streak: i64 = row.try_get("streak_days").map_err(ser)?;
                Ok(ClientRosterEntry {
                    client_id: ClientId::new(row.try_get::<String, _>("client_id").map_err(ser)?),
                    name: row.try_get("name").map_err(ser)?,
                    coach_id: CoachId::new(row.try_get::<String, _>("coach_id").map_err(ser)?),
                    last_check_in_at: row.try_get("last_check_in_at").map_err(ser)?,
                    streak_days: u32::try_from(streak)
                        .map_err(|_| StorageError::Serialization(format!("invalid streak: {streak}")))?,
                })
            })
            .collect()
    }

    async fn get_client_progress(
        &self,
        client_id: &ClientId,
    ) -> Result<ClientProgress, StorageError> {
        let row = sqlx::query(
            r"
                SELECT client_id, metrics, goals, last_updated
                FROM client_progress
                WHERE client_id = ?1
            ",
        )
        .bind(client_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_progress_row(&row)
    }

    async fn upsert_client_progress(&self, progress: &ClientProgress) -> Result<(), StorageError> {
        let metrics = serde_json::to_string(&progress.metrics).map_err(ser)?;
        let goals = serde_json::to_string(&progress.goals).map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO client_progress (client_id, metrics, goals, last_updated)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(client_id) DO UPDATE SET
                    metrics = excluded.metrics,
                    goals = excluded.goals,
                    last_updated = excluded.last_updated
            ",
        )
        .bind(progress.client_id.as_str())
        .bind(metrics)
        .bind(goals)
        .bind(progress.last_updated)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
