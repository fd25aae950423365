use async_trait::async_trait;
use checkin_core::model::{
    CheckIn, CheckInId, ClientId, ClientProgress, ClientRosterEntry, CoachId, Template,
    TemplateId, UserId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::feed::CheckInFeed;
use crate::sqlite::{SqliteInitError, SqliteRepository};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied")]
    PermissionDenied,

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Query filter for template listings.
#[derive(Debug, Clone, Default)]
pub struct TemplateFilter {
    pub created_by: Option<UserId>,
    pub default_only: bool,
}

impl TemplateFilter {
    /// Templates owned by one coach.
    #[must_use]
    pub fn by_creator(created_by: UserId) -> Self {
        Self {
            created_by: Some(created_by),
            default_only: false,
        }
    }

    /// Only templates marked as default.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            created_by: None,
            default_only: true,
        }
    }

    /// Default templates owned by one coach.
    #[must_use]
    pub fn defaults_by(created_by: UserId) -> Self {
        Self {
            created_by: Some(created_by),
            default_only: true,
        }
    }

    fn matches(&self, template: &Template) -> bool {
        if self.default_only && !template.is_default() {
            return false;
        }
        match &self.created_by {
            Some(creator) => template.created_by() == creator,
            None => true,
        }
    }
}

/// Repository contract for check-in templates.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Persist or update a template.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the template cannot be stored.
    async fn upsert_template(&self, template: &Template) -> Result<(), StorageError>;

    /// Fetch a template by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_template(&self, id: &TemplateId) -> Result<Template, StorageError>;

    /// List templates matching the filter.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_templates(&self, filter: &TemplateFilter) -> Result<Vec<Template>, StorageError>;
}

/// Repository contract for check-in documents.
///
/// Check-ins are append-only: one atomic create per submission, never an
/// in-place edit.
#[async_trait]
pub trait CheckInRepository: Send + Sync {
    /// Create a check-in as a single atomic write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a check-in with the same id
    /// already exists, which makes caller-side retries safe.
    async fn create_check_in(&self, check_in: &CheckIn) -> Result<CheckInId, StorageError>;

    /// A client's check-ins, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_for_client(
        &self,
        client_id: &ClientId,
        limit: u32,
    ) -> Result<Vec<CheckIn>, StorageError>;

    /// The aggregation window: a coach's check-ins, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_recent_for_coach(
        &self,
        coach_id: &CoachId,
        limit: u32,
    ) -> Result<Vec<CheckIn>, StorageError>;
}

/// Repository contract for the client roster and per-client progress docs.
#[async_trait]
pub trait RosterRepository: Send + Sync {
    /// Persist or update a roster entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn upsert_entry(&self, entry: &ClientRosterEntry) -> Result<(), StorageError>;

    /// All roster entries belonging to one coach.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_roster(&self, coach_id: &CoachId)
    -> Result<Vec<ClientRosterEntry>, StorageError>;

    /// Fetch a client's progress document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the client has no progress doc.
    async fn get_client_progress(
        &self,
        client_id: &ClientId,
    ) -> Result<ClientProgress, StorageError>;

    /// Persist or update a client's progress document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be stored.
    async fn upsert_client_progress(&self, progress: &ClientProgress) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    templates: Arc<Mutex<HashMap<TemplateId, Template>>>,
    check_ins: Arc<Mutex<HashMap<CheckInId, CheckIn>>>,
    roster: Arc<Mutex<HashMap<ClientId, ClientRosterEntry>>>,
    progress: Arc<Mutex<HashMap<ClientId, ClientProgress>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_err<T>(e: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Unavailable(e.to_string())
}

#[async_trait]
impl TemplateRepository for InMemoryRepository {
    async fn upsert_template(&self, template: &Template) -> Result<(), StorageError> {
        let mut guard = self.templates.lock().map_err(lock_err)?;
        guard.insert(template.id().clone(), template.clone());
        Ok(())
    }

    async fn get_template(&self, id: &TemplateId) -> Result<Template, StorageError> {
        let guard = self.templates.lock().map_err(lock_err)?;
        guard.get(id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_templates(&self, filter: &TemplateFilter) -> Result<Vec<Template>, StorageError> {
        let guard = self.templates.lock().map_err(lock_err)?;
        let mut found: Vec<Template> = guard.values().filter(|t| filter.matches(t)).cloned().collect();
        found.sort_by_key(|t| std::cmp::Reverse(t.created_at()));
        Ok(found)
    }
}

#[async_trait]
impl CheckInRepository for InMemoryRepository {
    async fn create_check_in(&self, check_in: &CheckIn) -> Result<CheckInId, StorageError> {
        let mut guard = self.check_ins.lock().map_err(lock_err)?;
        if guard.contains_key(check_in.id()) {
            return Err(StorageError::Conflict);
        }
        guard.insert(check_in.id().clone(), check_in.clone());
        Ok(check_in.id().clone())
    }

    async fn list_for_client(
        &self,
        client_id: &ClientId,
        limit: u32,
    ) -> Result<Vec<CheckIn>, StorageError> {
        let guard = self.check_ins.lock().map_err(lock_err)?;
        let mut found: Vec<CheckIn> = guard
            .values()
            .filter(|ci| ci.client_id() == client_id)
            .cloned()
            .collect();
        found.sort_by_key(|ci| std::cmp::Reverse(ci.date()));
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn list_recent_for_coach(
        &self,
        coach_id: &CoachId,
        limit: u32,
    ) -> Result<Vec<CheckIn>, StorageError> {
        let guard = self.check_ins.lock().map_err(lock_err)?;
        let mut found: Vec<CheckIn> = guard
            .values()
            .filter(|ci| ci.coach_id() == coach_id)
            .cloned()
            .collect();
        found.sort_by_key(|ci| std::cmp::Reverse(ci.date()));
        found.truncate(limit as usize);
        Ok(found)
    }
}

#[async_trait]
impl RosterRepository for InMemoryRepository {
    async fn upsert_entry(&self, entry: &ClientRosterEntry) -> Result<(), StorageError> {
        let mut guard = self.roster.lock().map_err(lock_err)?;
        guard.insert(entry.client_id.clone(), entry.clone());
        Ok(())
    }

    async fn list_roster(
        &self,
        coach_id: &CoachId,
    ) -> Result<Vec<ClientRosterEntry>, StorageError> {
        let guard = self.roster.lock().map_err(lock_err)?;
        let mut found: Vec<ClientRosterEntry> = guard
            .values()
            .filter(|c| &c.coach_id == coach_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.client_id.cmp(&b.client_id));
        Ok(found)
    }

    async fn get_client_progress(
        &self,
        client_id: &ClientId,
    ) -> Result<ClientProgress, StorageError> {
        let guard = self.progress.lock().map_err(lock_err)?;
        guard.get(client_id).cloned().ok_or(StorageError::NotFound)
    }

    async fn upsert_client_progress(&self, progress: &ClientProgress) -> Result<(), StorageError> {
        let mut guard = self.progress.lock().map_err(lock_err)?;
        guard.insert(progress.client_id.clone(), progress.clone());
        Ok(())
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates repositories and the change feed behind trait objects so
/// backends can be swapped without touching the services layer.
#[derive(Clone)]
pub struct Storage {
    pub templates: Arc<dyn TemplateRepository>,
    pub check_ins: Arc<dyn CheckInRepository>,
    pub roster: Arc<dyn RosterRepository>,
    pub feed: Arc<CheckInFeed>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let templates: Arc<dyn TemplateRepository> = Arc::new(repo.clone());
        let check_ins: Arc<dyn CheckInRepository> = Arc::new(repo.clone());
        let roster: Arc<dyn RosterRepository> = Arc::new(repo);
        let feed = Arc::new(CheckInFeed::new(Arc::clone(&check_ins), Arc::clone(&roster)));
        Self {
            templates,
            check_ins,
            roster,
            feed,
        }
    }

    /// Build storage backed by `SQLite`, running migrations first.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection or migration fails.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        crate::sqlite::run_migrations(repo.pool()).await?;
        let templates: Arc<dyn TemplateRepository> = Arc::new(repo.clone());
        let check_ins: Arc<dyn CheckInRepository> = Arc::new(repo.clone());
        let roster: Arc<dyn RosterRepository> = Arc::new(repo);
        let feed = Arc::new(CheckInFeed::new(Arc::clone(&check_ins), Arc::clone(&roster)));
        Ok(Self {
            templates,
            check_ins,
            roster,
            feed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkin_core::model::{
        AnswerValue, CheckInStatus, Measurements, Question, QuestionId, QuestionKind, Response,
    };
    use checkin_core::time::fixed_now;
    use chrono::Duration;

    fn build_template(id: &str, is_default: bool) -> Template {
        Template::new(
            TemplateId::new(id),
            format!("Template {id}"),
            vec![
                Question::new(QuestionId::new("q1"), QuestionKind::Text, "Notes", true).unwrap(),
            ],
            UserId::new("coach-1"),
            is_default,
            fixed_now(),
        )
        .unwrap()
    }

    fn build_check_in(id: &str, client: &str, days_ago: i64) -> CheckIn {
        CheckIn::from_persisted(
            CheckInId::new(id),
            ClientId::new(client),
            CoachId::new("coach-1"),
            fixed_now() - Duration::days(days_ago),
            CheckInStatus::Completed,
            100.0,
            vec![Response::new(
                QuestionId::new("q1"),
                AnswerValue::Text("fine".into()),
            )],
            Measurements::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let repo = InMemoryRepository::new();
        let ci = build_check_in("c1", "client-1", 0);
        repo.create_check_in(&ci).await.unwrap();
        let err = repo.create_check_in(&ci).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn coach_window_is_date_descending_and_capped() {
        let repo = InMemoryRepository::new();
        for (id, days) in [("c1", 3), ("c2", 1), ("c3", 2)] {
            repo.create_check_in(&build_check_in(id, "client-1", days))
                .await
                .unwrap();
        }

        let window = repo
            .list_recent_for_coach(&CoachId::new("coach-1"), 2)
            .await
            .unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].id(), &CheckInId::new("c2"));
        assert_eq!(window[1].id(), &CheckInId::new("c3"));
    }

    #[tokio::test]
    async fn template_filter_scopes_by_creator_and_default() {
        let repo = InMemoryRepository::new();
        repo.upsert_template(&build_template("t1", true)).await.unwrap();
        repo.upsert_template(&build_template("t2", false)).await.unwrap();

        let defaults = repo.list_templates(&TemplateFilter::defaults()).await.unwrap();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id(), &TemplateId::new("t1"));

        let none = repo
            .list_templates(&TemplateFilter::by_creator(UserId::new("coach-9")))
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
