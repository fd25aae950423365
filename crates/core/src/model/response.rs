use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::QuestionId;

/// A single answer value, shaped by the referenced question's kind.
///
/// Untagged on the wire: the document store holds plain strings, numbers,
/// booleans, and string arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Selection(Vec<String>),
}

impl AnswerValue {
    /// True when the value is the kind's "nothing entered" sentinel.
    ///
    /// `Bool(false)` is *not* empty: a checkbox answered "no" is an explicit
    /// answer, distinct from a checkbox never touched (which is simply absent
    /// from the answer set).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(s) => s.trim().is_empty(),
            AnswerValue::Selection(items) => items.is_empty(),
            AnswerValue::Number(_) | AnswerValue::Bool(_) => false,
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        AnswerValue::Text(s.to_owned())
    }
}

impl From<f64> for AnswerValue {
    fn from(n: f64) -> Self {
        AnswerValue::Number(n)
    }
}

impl From<bool> for AnswerValue {
    fn from(b: bool) -> Self {
        AnswerValue::Bool(b)
    }
}

/// A candidate answer set keyed by question id.
///
/// Absence of a key means "unanswered"; presence of `Bool(false)` means
/// "answered no". Ordered map so iteration (and error reporting) follows a
/// stable order.
pub type Answers = BTreeMap<QuestionId, AnswerValue>;

/// One persisted answer inside a submitted check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub question_id: QuestionId,
    pub value: AnswerValue,
}

impl Response {
    #[must_use]
    pub fn new(question_id: QuestionId, value: AnswerValue) -> Self {
        Self { question_id, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_empty() {
        assert!(AnswerValue::Text("   ".into()).is_empty());
        assert!(!AnswerValue::Text("ok".into()).is_empty());
    }

    #[test]
    fn answered_false_is_not_empty() {
        assert!(!AnswerValue::Bool(false).is_empty());
    }

    #[test]
    fn untagged_wire_shapes() {
        let v: AnswerValue = serde_json::from_str("7.5").unwrap();
        assert_eq!(v, AnswerValue::Number(7.5));
        let v: AnswerValue = serde_json::from_str("false").unwrap();
        assert_eq!(v, AnswerValue::Bool(false));
        let v: AnswerValue = serde_json::from_str("[\"a\",\"b\"]").unwrap();
        assert_eq!(v, AnswerValue::Selection(vec!["a".into(), "b".into()]));
    }
}
