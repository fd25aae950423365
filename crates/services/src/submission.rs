//! Check-in submission pipeline.
//!
//! Resolve the effective template, validate the answers, then persist a
//! completed check-in with one atomic create. A rejected submission writes
//! nothing.

use std::sync::Arc;

use checkin_core::model::{
    AnswerValue, Answers, CheckIn, CheckInId, CheckInStatus, CoachId, Measurements, QuestionId,
    Response, Template, TemplateId, UserId, resolve_default_template,
};
use checkin_core::validate::{ValidationOutcome, validate};
use storage::feed::CheckInFeed;
use storage::repository::{StorageError, TemplateFilter, TemplateRepository};
use uuid::Uuid;

use crate::error::SubmitError;
use crate::session::{Role, Session};
use crate::Clock;

/// Answers to the question with this id feed `measurements.weight`.
pub const WEIGHT_QUESTION_ID: &str = "weight";

/// Orchestrates one client submission end to end.
#[derive(Clone)]
pub struct SubmissionService {
    clock: Clock,
    templates: Arc<dyn TemplateRepository>,
    feed: Arc<CheckInFeed>,
}

impl SubmissionService {
    #[must_use]
    pub fn new(clock: Clock, templates: Arc<dyn TemplateRepository>, feed: Arc<CheckInFeed>) -> Self {
        Self {
            clock,
            templates,
            feed,
        }
    }

    /// Submit a check-in for the client behind `session`.
    ///
    /// `assigned_template` is the client's explicitly assigned form, if any;
    /// otherwise the coach's most recent default template applies.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::Incomplete` with the offending question ids if
    /// validation fails (nothing persisted), `NoTemplate` if no template can
    /// be resolved, and storage errors from the single create.
    pub async fn submit(
        &self,
        session: &Session,
        assigned_template: Option<&TemplateId>,
        answers: &Answers,
    ) -> Result<CheckIn, SubmitError> {
        if session.role != Role::Client {
            return Err(SubmitError::NotAClient);
        }
        let coach_id = session.coach_id.clone().ok_or(SubmitError::NoCoach)?;

        let template = self.resolve_template(&coach_id, assigned_template).await?;

        let progress = match validate(&template, answers) {
            ValidationOutcome::Valid { progress } => progress,
            ValidationOutcome::Invalid {
                missing,
                type_errors,
            } => {
                return Err(SubmitError::Incomplete {
                    missing,
                    type_errors,
                });
            }
        };

        let check_in = build_check_in(session, &coach_id, &template, answers, progress, &self.clock)?;
        self.create_with_retry(&check_in).await?;

        tracing::debug!(
            check_in = %check_in.id(),
            client = %check_in.client_id(),
            progress,
            "check-in submitted"
        );
        Ok(check_in)
    }

    /// The assigned template wins; a dangling assignment falls back to the
    /// default resolution rather than failing the whole submission. Default
    /// candidates are scoped to the client's coach.
    async fn resolve_template(
        &self,
        coach_id: &CoachId,
        assigned: Option<&TemplateId>,
    ) -> Result<Template, SubmitError> {
        if let Some(id) = assigned {
            match self.templates.get_template(id).await {
                Ok(template) => return Ok(template),
                Err(StorageError::NotFound) => {
                    tracing::warn!(template = %id, "assigned template missing, using default");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let filter = TemplateFilter::defaults_by(UserId::new(coach_id.as_str()));
        let candidates = self.templates.list_templates(&filter).await?;
        resolve_default_template(&candidates)
            .cloned()
            .map_err(|_| SubmitError::NoTemplate)
    }

    /// Single create, retried at most once on transient unavailability.
    ///
    /// The retry reuses the same check-in id, so if the first write actually
    /// landed the backend reports `Conflict` and the submission still counts
    /// exactly once.
    async fn create_with_retry(&self, check_in: &CheckIn) -> Result<(), SubmitError> {
        match self.feed.create_check_in(check_in).await {
            Ok(_) => Ok(()),
            Err(StorageError::Unavailable(reason)) => {
                tracing::warn!(%reason, "check-in create failed, retrying once");
                match self.feed.create_check_in(check_in).await {
                    Ok(_) | Err(StorageError::Conflict) => Ok(()),
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn build_check_in(
    session: &Session,
    coach_id: &CoachId,
    template: &Template,
    answers: &Answers,
    progress: f64,
    clock: &Clock,
) -> Result<CheckIn, SubmitError> {
    // One response per answered question, in template order.
    let responses: Vec<Response> = template
        .questions()
        .iter()
        .filter_map(|q| {
            answers
                .get(q.id())
                .filter(|v| !v.is_empty())
                .map(|v| Response::new(q.id().clone(), v.clone()))
        })
        .collect();

    let weight = answers.get(&QuestionId::new(WEIGHT_QUESTION_ID));
    let measurements = match weight {
        Some(AnswerValue::Number(n)) => Measurements::with_weight(*n),
        _ => Measurements::default(),
    };

    Ok(CheckIn::from_persisted(
        CheckInId::new(Uuid::new_v4().to_string()),
        session.user_id.as_client_id(),
        coach_id.clone(),
        clock.now(),
        CheckInStatus::Completed,
        progress,
        responses,
        measurements,
    )?)
}
