use checkin_core::model::{CheckIn, CheckInId, ClientId, CoachId};

use super::SqliteRepository;
use super::mapping::{conn, map_check_in_row, ser, status_to_str};
use crate::repository::{CheckInRepository, StorageError};

#[async_trait::async_trait]
impl CheckInRepository for SqliteRepository {
    async fn create_check_in(&self, check_in: &CheckIn) -> Result<CheckInId, StorageError> {
        let responses = serde_json::to_string(check_in.responses()).map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO check_ins (
                    id, client_id, coach_id, date, status,
                    overall_progress, responses, weight
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(check_in.id().as_str())
        .bind(check_in.client_id().as_str())
        .bind(check_in.coach_id().as_str())
        .bind(check_in.date())
        .bind(status_to_str(check_in.status()))
        .bind(check_in.overall_progress())
        .bind(responses)
        .bind(check_in.weight())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(check_in.id().clone())
    }

    async fn list_for_client(
        &self,
        client_id: &ClientId,
        limit: u32,
    ) -> Result<Vec<CheckIn>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, client_id, coach_id, date, status,
                       overall_progress, responses, weight
                FROM check_ins
                WHERE client_id = ?1
                ORDER BY date DESC
                LIMIT ?2
            ",
        )
        .bind(client_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_check_in_row).collect()
    }

    async fn list_recent_for_coach(
        &self,
        coach_id: &CoachId,
        limit: u32,
    ) -> Result<Vec<CheckIn>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, client_id, coach_id, date, status,
                       overall_progress, responses, weight
                FROM check_ins
                WHERE coach_id = ?1
                ORDER BY date DESC
                LIMIT ?2
            ",
        )
        .bind(coach_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_check_in_row).collect()
    }
}
