use checkin_core::model::{Template, TemplateId};

use super::SqliteRepository;
use super::mapping::{conn, map_template_row, ser};
use crate::repository::{StorageError, TemplateFilter, TemplateRepository};

#[async_trait::async_trait]
impl TemplateRepository for SqliteRepository {
    async fn upsert_template(&self, template: &Template) -> Result<(), StorageError> {
        let questions = serde_json::to_string(template.questions()).map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO templates (
                    id, name, questions, created_by, is_default, created_at, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    questions = excluded.questions,
                    is_default = excluded.is_default,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(template.id().as_str())
        .bind(template.name())
        .bind(questions)
        .bind(template.created_by().as_str())
        .bind(template.is_default())
        .bind(template.created_at())
        .bind(template.updated_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_template(&self, id: &TemplateId) -> Result<Template, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, name, questions, created_by, is_default, created_at, updated_at
                FROM templates
                WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_template_row(&row)
    }

    async fn list_templates(
        &self,
        filter: &TemplateFilter,
    ) -> Result<Vec<Template>, StorageError> {
        let created_by = filter.created_by.as_ref().map(|u| u.as_str().to_owned());
        let rows = sqlx::query(
            r"
                SELECT id, name, questions, created_by, is_default, created_at, updated_at
                FROM templates
                WHERE (?1 IS NULL OR created_by = ?1)
                  AND (?2 = 0 OR is_default = 1)
                ORDER BY created_at DESC
            ",
        )
        .bind(created_by)
        .bind(i64::from(filter.default_only))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_template_row).collect()
    }
}
