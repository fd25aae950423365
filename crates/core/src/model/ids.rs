use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a Question within a Template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

/// Unique identifier for a check-in Template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

/// Unique identifier for a CheckIn document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckInId(String);

/// Unique identifier for a client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

/// Unique identifier for a coach.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoachId(String);

/// Unique identifier for any authenticated user (coach or client).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

macro_rules! string_id_impls {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl $ty {
                /// Creates a new id from any string-like value.
                #[must_use]
                pub fn new(id: impl Into<String>) -> Self {
                    Self(id.into())
                }

                /// Returns the underlying string value.
                #[must_use]
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<&str> for $ty {
                fn from(s: &str) -> Self {
                    Self::new(s)
                }
            }

            impl From<String> for $ty {
                fn from(s: String) -> Self {
                    Self(s)
                }
            }
        )+
    };
}

string_id_impls!(QuestionId, TemplateId, CheckInId, ClientId, CoachId, UserId);

impl UserId {
    /// Reinterpret this user id as a client id.
    ///
    /// Client documents share their id with the owning user account.
    #[must_use]
    pub fn as_client_id(&self) -> ClientId {
        ClientId::new(self.0.clone())
    }

    /// Reinterpret this user id as a coach id.
    #[must_use]
    pub fn as_coach_id(&self) -> CoachId {
        CoachId::new(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips() {
        let id = ClientId::new("client-42");
        assert_eq!(id.to_string(), "client-42");
        assert_eq!(id.as_str(), "client-42");
    }

    #[test]
    fn ids_hash_and_compare_by_value() {
        let a = QuestionId::new("q1");
        let b = QuestionId::from("q1");
        assert_eq!(a, b);
    }

    #[test]
    fn user_id_converts_to_scoped_ids() {
        let user = UserId::new("u-7");
        assert_eq!(user.as_client_id(), ClientId::new("u-7"));
        assert_eq!(user.as_coach_id(), CoachId::new("u-7"));
    }
}
