use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::QuestionId;

/// Default slider range used when a slider question leaves `min`/`max` unset.
pub const DEFAULT_SLIDER_MIN: f64 = 0.0;
pub const DEFAULT_SLIDER_MAX: f64 = 10.0;

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// The closed set of question kinds a template may use.
///
/// Validation and rendering dispatch exhaustively on this enum, so adding a
/// kind is a compile-time-checked extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Text,
    Number,
    Slider,
    Radio,
    Checkbox,
    File,
}

impl QuestionKind {
    /// Returns true for kinds that carry an `options` list.
    #[must_use]
    pub fn has_options(self) -> bool {
        matches!(self, QuestionKind::Radio)
    }

    /// Returns true for kinds that carry numeric bounds.
    #[must_use]
    pub fn has_bounds(self) -> bool {
        matches!(self, QuestionKind::Slider)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question label cannot be empty")]
    EmptyLabel,

    #[error("radio question {0} requires at least one option")]
    MissingOptions(QuestionId),

    #[error("question {0} carries options but is not a radio question")]
    UnexpectedOptions(QuestionId),

    #[error("question {0} carries min/max bounds but is not a slider question")]
    UnexpectedBounds(QuestionId),

    #[error("slider question {id} has min {min} >= max {max}")]
    InvalidBounds { id: QuestionId, min: f64, max: f64 },
}

/// One question of a check-in template.
///
/// Immutable once constructed; a question referenced by any submitted
/// response must never change meaning, so edits produce new questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "QuestionDoc")]
pub struct Question {
    id: QuestionId,
    #[serde(rename = "type")]
    kind: QuestionKind,
    label: String,
    required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<f64>,
}

/// Raw persisted shape, validated into a `Question` on deserialization.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionDoc {
    id: QuestionId,
    #[serde(rename = "type")]
    kind: QuestionKind,
    label: String,
    required: bool,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
}

impl TryFrom<QuestionDoc> for Question {
    type Error = QuestionError;

    fn try_from(doc: QuestionDoc) -> Result<Self, QuestionError> {
        Question::from_persisted(
            doc.id, doc.kind, doc.label, doc.required, doc.options, doc.min, doc.max,
        )
    }
}

impl Question {
    /// Build a question without options or bounds (text, number, checkbox, file).
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyLabel` if the label is blank.
    pub fn new(
        id: QuestionId,
        kind: QuestionKind,
        label: impl Into<String>,
        required: bool,
    ) -> Result<Self, QuestionError> {
        Self::from_parts(id, kind, label.into(), required, Vec::new(), None, None)
    }

    /// Build a radio question with its choices.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::MissingOptions` if `options` is empty.
    pub fn radio(
        id: QuestionId,
        label: impl Into<String>,
        required: bool,
        options: Vec<String>,
    ) -> Result<Self, QuestionError> {
        Self::from_parts(id, QuestionKind::Radio, label.into(), required, options, None, None)
    }

    /// Build a slider question with optional bounds (defaults 0..10).
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidBounds` if `min >= max`.
    pub fn slider(
        id: QuestionId,
        label: impl Into<String>,
        required: bool,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<Self, QuestionError> {
        Self::from_parts(id, QuestionKind::Slider, label.into(), required, Vec::new(), min, max)
    }

    /// Rehydrate a question from persisted storage, revalidating invariants.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the stored shape violates the kind's rules.
    pub fn from_persisted(
        id: QuestionId,
        kind: QuestionKind,
        label: String,
        required: bool,
        options: Vec<String>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<Self, QuestionError> {
        Self::from_parts(id, kind, label, required, options, min, max)
    }

    fn from_parts(
        id: QuestionId,
        kind: QuestionKind,
        label: String,
        required: bool,
        options: Vec<String>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<Self, QuestionError> {
        if label.trim().is_empty() {
            return Err(QuestionError::EmptyLabel);
        }
        if kind.has_options() {
            if options.is_empty() {
                return Err(QuestionError::MissingOptions(id));
            }
        } else if !options.is_empty() {
            return Err(QuestionError::UnexpectedOptions(id));
        }
        if kind.has_bounds() {
            let lo = min.unwrap_or(DEFAULT_SLIDER_MIN);
            let hi = max.unwrap_or(DEFAULT_SLIDER_MAX);
            if lo >= hi {
                return Err(QuestionError::InvalidBounds { id, min: lo, max: hi });
            }
        } else if min.is_some() || max.is_some() {
            return Err(QuestionError::UnexpectedBounds(id));
        }

        Ok(Self {
            id,
            kind,
            label,
            required,
            options,
            min,
            max,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Effective slider bounds, applying the 0..10 default.
    #[must_use]
    pub fn slider_bounds(&self) -> (f64, f64) {
        (
            self.min.unwrap_or(DEFAULT_SLIDER_MIN),
            self.max.unwrap_or(DEFAULT_SLIDER_MAX),
        )
    }

    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radio_requires_options() {
        let err = Question::radio(QuestionId::new("q1"), "Mood", true, Vec::new()).unwrap_err();
        assert_eq!(err, QuestionError::MissingOptions(QuestionId::new("q1")));
    }

    #[test]
    fn slider_defaults_to_zero_ten() {
        let q = Question::slider(QuestionId::new("q2"), "Energy", true, None, None).unwrap();
        assert_eq!(q.slider_bounds(), (0.0, 10.0));
    }

    #[test]
    fn slider_rejects_inverted_bounds() {
        let err = Question::slider(QuestionId::new("q2"), "Energy", true, Some(5.0), Some(5.0))
            .unwrap_err();
        assert!(matches!(err, QuestionError::InvalidBounds { .. }));
    }

    #[test]
    fn text_rejects_stray_options() {
        let err = Question::from_persisted(
            QuestionId::new("q3"),
            QuestionKind::Text,
            "Notes".into(),
            false,
            vec!["a".into()],
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::UnexpectedOptions(QuestionId::new("q3")));
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&QuestionKind::Checkbox).unwrap();
        assert_eq!(json, "\"checkbox\"");
    }
}
