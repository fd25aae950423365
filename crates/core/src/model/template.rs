use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::{Question, QuestionId, TemplateId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateError {
    #[error("template name cannot be empty")]
    EmptyName,

    #[error("template has no questions")]
    NoQuestions,

    #[error("duplicate question id {0} in template")]
    DuplicateQuestionId(QuestionId),

    #[error("no default template available")]
    NoDefault,
}

/// An ordered, reusable set of questions defining one check-in form.
///
/// Question ids are unique within a template. Templates are immutable once
/// built; editing a form means publishing a new template so historical
/// responses keep their meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TemplateDoc")]
pub struct Template {
    id: TemplateId,
    name: String,
    questions: Vec<Question>,
    created_by: UserId,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Raw persisted shape, validated into a `Template` on deserialization.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateDoc {
    id: TemplateId,
    name: String,
    questions: Vec<Question>,
    created_by: UserId,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TemplateDoc> for Template {
    type Error = TemplateError;

    fn try_from(doc: TemplateDoc) -> Result<Self, TemplateError> {
        Template::from_persisted(
            doc.id,
            doc.name,
            doc.questions,
            doc.created_by,
            doc.is_default,
            doc.created_at,
            doc.updated_at,
        )
    }
}

impl Template {
    /// Build a new template, validating name and question-id uniqueness.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::EmptyName`, `NoQuestions`, or
    /// `DuplicateQuestionId` on invariant violations.
    pub fn new(
        id: TemplateId,
        name: impl Into<String>,
        questions: Vec<Question>,
        created_by: UserId,
        is_default: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TemplateError> {
        Self::from_persisted(id, name.into(), questions, created_by, is_default, created_at, created_at)
    }

    /// Rehydrate a template from persisted storage.
    ///
    /// # Errors
    ///
    /// Same invariants as [`Template::new`].
    pub fn from_persisted(
        id: TemplateId,
        name: String,
        questions: Vec<Question>,
        created_by: UserId,
        is_default: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, TemplateError> {
        if name.trim().is_empty() {
            return Err(TemplateError::EmptyName);
        }
        if questions.is_empty() {
            return Err(TemplateError::NoQuestions);
        }
        let mut seen = HashSet::new();
        for q in &questions {
            if !seen.insert(q.id().clone()) {
                return Err(TemplateError::DuplicateQuestionId(q.id().clone()));
            }
        }

        Ok(Self {
            id,
            name,
            questions,
            created_by,
            is_default,
            created_at,
            updated_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> &TemplateId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Look up a question by id.
    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Select the effective default template from an already-fetched candidate set.
///
/// Filters to `is_default` templates and picks the most recently created,
/// so at most one default is ever resolved for a client context.
///
/// # Errors
///
/// Returns `TemplateError::NoDefault` if no candidate is marked default.
pub fn resolve_default_template(candidates: &[Template]) -> Result<&Template, TemplateError> {
    candidates
        .iter()
        .filter(|t| t.is_default())
        .max_by_key(|t| t.created_at())
        .ok_or(TemplateError::NoDefault)
}
