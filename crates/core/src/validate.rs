//! Response validation against a template.
//!
//! Validation never fails fatally for user input: every expected problem is
//! reported inside [`ValidationOutcome::Invalid`]. Malformed templates are
//! unrepresentable by construction, so there is no error path for them here.

use thiserror::Error;

use crate::model::{AnswerValue, Answers, Question, QuestionId, QuestionKind, Template};

//
// ─── TYPE ERRORS ───────────────────────────────────────────────────────────────
//

/// Why a present answer failed its question's type check.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum TypeErrorKind {
    #[error("value shape does not match a {expected:?} question")]
    WrongShape { expected: QuestionKind },

    #[error("slider value {value} is outside {min}..={max}")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("{value:?} is not one of the radio options")]
    UnknownOption { value: String },

    #[error("no such question in the template")]
    UnknownQuestion,
}

/// A type-check failure for one answered question.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeError {
    pub question_id: QuestionId,
    pub kind: TypeErrorKind,
}

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Result of validating a candidate answer set.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Every required question is answered and every present answer
    /// type-checks. `progress` is the completion percentage in `[0, 100]`,
    /// rounded to one decimal.
    Valid { progress: f64 },

    /// Required questions left unanswered and/or present answers of the
    /// wrong shape. Nothing about the submission should be persisted.
    Invalid {
        missing: Vec<QuestionId>,
        type_errors: Vec<TypeError>,
    },
}

impl ValidationOutcome {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid { .. })
    }
}

//
// ─── VALIDATION ────────────────────────────────────────────────────────────────
//

/// Validate an answer set against a template and compute its progress.
///
/// A question is "answered" when a non-empty value for it is present in
/// `answers`; `Bool(false)` counts as answered (an explicitly unchecked
/// checkbox), while absence from the map means unanswered. Progress is
/// monotonic in the answer set: adding a valid answer never lowers it.
#[must_use]
pub fn validate(template: &Template, answers: &Answers) -> ValidationOutcome {
    let mut missing = Vec::new();
    let mut type_errors = Vec::new();
    let mut answered_valid = 0_usize;

    for question in template.questions() {
        match answers.get(question.id()) {
            None => {
                if question.required() {
                    missing.push(question.id().clone());
                }
            }
            Some(value) if value.is_empty() => {
                if question.required() {
                    missing.push(question.id().clone());
                }
            }
            Some(value) => match check_value(question, value) {
                Ok(()) => answered_valid += 1,
                Err(kind) => type_errors.push(TypeError {
                    question_id: question.id().clone(),
                    kind,
                }),
            },
        }
    }

    // Answers aimed at questions the template does not define.
    for question_id in answers.keys() {
        if template.question(question_id).is_none() {
            type_errors.push(TypeError {
                question_id: question_id.clone(),
                kind: TypeErrorKind::UnknownQuestion,
            });
        }
    }

    if missing.is_empty() && type_errors.is_empty() {
        ValidationOutcome::Valid {
            progress: progress_pct(answered_valid, template.questions().len()),
        }
    } else {
        ValidationOutcome::Invalid { missing, type_errors }
    }
}

/// Type-check one present, non-empty value against its question.
fn check_value(question: &Question, value: &AnswerValue) -> Result<(), TypeErrorKind> {
    let wrong = || TypeErrorKind::WrongShape {
        expected: question.kind(),
    };

    match question.kind() {
        QuestionKind::Text | QuestionKind::File => match value {
            AnswerValue::Text(_) => Ok(()),
            _ => Err(wrong()),
        },
        QuestionKind::Number => match value {
            AnswerValue::Number(_) => Ok(()),
            _ => Err(wrong()),
        },
        QuestionKind::Slider => match value {
            AnswerValue::Number(n) => {
                let (min, max) = question.slider_bounds();
                if (min..=max).contains(n) {
                    Ok(())
                } else {
                    Err(TypeErrorKind::OutOfRange {
                        value: *n,
                        min,
                        max,
                    })
                }
            }
            _ => Err(wrong()),
        },
        QuestionKind::Radio => match value {
            AnswerValue::Text(choice) => {
                if question.options().iter().any(|o| o == choice) {
                    Ok(())
                } else {
                    Err(TypeErrorKind::UnknownOption {
                        value: choice.clone(),
                    })
                }
            }
            _ => Err(wrong()),
        },
        QuestionKind::Checkbox => match value {
            AnswerValue::Bool(_) => Ok(()),
            _ => Err(wrong()),
        },
    }
}

fn progress_pct(answered: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = 100.0 * answered as f64 / total as f64;
    (pct * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionId, TemplateId, UserId};
    use crate::time::fixed_now;

    fn three_question_template() -> Template {
        Template::new(
            TemplateId::new("t1"),
            "Daily",
            vec![
                Question::new(QuestionId::new("q1"), QuestionKind::Text, "How was today?", true)
                    .unwrap(),
                Question::slider(QuestionId::new("q2"), "Energy", true, Some(1.0), Some(10.0))
                    .unwrap(),
                Question::new(QuestionId::new("q3"), QuestionKind::Checkbox, "Trained?", true)
                    .unwrap(),
            ],
            UserId::new("coach-1"),
            true,
            fixed_now(),
        )
        .unwrap()
    }

    fn full_answers() -> Answers {
        let mut answers = Answers::new();
        answers.insert(QuestionId::new("q1"), AnswerValue::from("ok"));
        answers.insert(QuestionId::new("q2"), AnswerValue::from(7.0));
        answers.insert(QuestionId::new("q3"), AnswerValue::from(false));
        answers
    }

    #[test]
    fn complete_answers_reach_full_progress() {
        let outcome = validate(&three_question_template(), &full_answers());
        assert_eq!(outcome, ValidationOutcome::Valid { progress: 100.0 });
    }

    #[test]
    fn empty_text_counts_as_missing() {
        let mut answers = full_answers();
        answers.insert(QuestionId::new("q1"), AnswerValue::from(""));
        let outcome = validate(&three_question_template(), &answers);
        assert_eq!(
            outcome,
            ValidationOutcome::Invalid {
                missing: vec![QuestionId::new("q1")],
                type_errors: Vec::new(),
            }
        );
    }

    #[test]
    fn unchecked_checkbox_is_distinct_from_unanswered() {
        let mut answers = full_answers();
        answers.remove(&QuestionId::new("q3"));
        let outcome = validate(&three_question_template(), &answers);
        assert_eq!(
            outcome,
            ValidationOutcome::Invalid {
                missing: vec![QuestionId::new("q3")],
                type_errors: Vec::new(),
            }
        );
    }

    #[test]
    fn slider_out_of_bounds_is_a_type_error() {
        let mut answers = full_answers();
        answers.insert(QuestionId::new("q2"), AnswerValue::from(11.0));
        let ValidationOutcome::Invalid { missing, type_errors } =
            validate(&three_question_template(), &answers)
        else {
            panic!("expected invalid outcome");
        };
        assert!(missing.is_empty());
        assert_eq!(type_errors.len(), 1);
        assert_eq!(
            type_errors[0].kind,
            TypeErrorKind::OutOfRange {
                value: 11.0,
                min: 1.0,
                max: 10.0
            }
        );
    }

    #[test]
    fn radio_must_pick_a_known_option() {
        let template = Template::new(
            TemplateId::new("t2"),
            "Mood",
            vec![
                Question::radio(
                    QuestionId::new("q1"),
                    "Mood",
                    true,
                    vec!["good".into(), "bad".into()],
                )
                .unwrap(),
            ],
            UserId::new("coach-1"),
            false,
            fixed_now(),
        )
        .unwrap();

        let mut answers = Answers::new();
        answers.insert(QuestionId::new("q1"), AnswerValue::from("great"));
        let ValidationOutcome::Invalid { type_errors, .. } = validate(&template, &answers) else {
            panic!("expected invalid outcome");
        };
        assert_eq!(
            type_errors[0].kind,
            TypeErrorKind::UnknownOption {
                value: "great".into()
            }
        );
    }

    #[test]
    fn unknown_question_id_is_reported() {
        let mut answers = full_answers();
        answers.insert(QuestionId::new("q9"), AnswerValue::from("stray"));
        let ValidationOutcome::Invalid { type_errors, .. } =
            validate(&three_question_template(), &answers)
        else {
            panic!("expected invalid outcome");
        };
        assert_eq!(type_errors[0].question_id, QuestionId::new("q9"));
        assert_eq!(type_errors[0].kind, TypeErrorKind::UnknownQuestion);
    }

    #[test]
    fn progress_is_monotonic_in_answers() {
        let template = three_question_template();
        let mut answers = Answers::new();
        let mut last = -1.0;
        for (id, value) in [
            (QuestionId::new("q1"), AnswerValue::from("ok")),
            (QuestionId::new("q2"), AnswerValue::from(7.0)),
            (QuestionId::new("q3"), AnswerValue::from(true)),
        ] {
            answers.insert(id, value);
            let progress = match validate(&template, &answers) {
                ValidationOutcome::Valid { progress } => progress,
                ValidationOutcome::Invalid { .. } => {
                    // Partially answered but nothing invalid: recount by hand.
                    let answered = answers.len() as f64;
                    100.0 * answered / 3.0
                }
            };
            assert!(progress >= last);
            assert!((0.0..=100.0).contains(&progress));
            last = progress;
        }
        assert!((last - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn progress_rounds_to_one_decimal() {
        // 1 of 3 answered: 33.333... -> 33.3
        let template = three_question_template();
        let template = Template::new(
            TemplateId::new("t3"),
            "Optional",
            template
                .questions()
                .iter()
                .map(|q| {
                    Question::from_persisted(
                        q.id().clone(),
                        q.kind(),
                        q.label().to_owned(),
                        false,
                        q.options().to_vec(),
                        q.min(),
                        q.max(),
                    )
                    .unwrap()
                })
                .collect(),
            UserId::new("coach-1"),
            false,
            fixed_now(),
        )
        .unwrap();

        let mut answers = Answers::new();
        answers.insert(QuestionId::new("q1"), AnswerValue::from("ok"));
        let outcome = validate(&template, &answers);
        assert_eq!(outcome, ValidationOutcome::Valid { progress: 33.3 });
    }
}
