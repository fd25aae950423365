mod checkin;
mod ids;
mod question;
mod response;
mod roster;
mod stats;
mod template;

pub use ids::{CheckInId, ClientId, CoachId, QuestionId, TemplateId, UserId};

pub use checkin::{CheckIn, CheckInError, CheckInStatus, Measurements};
pub use question::{
    DEFAULT_SLIDER_MAX, DEFAULT_SLIDER_MIN, Question, QuestionError, QuestionKind,
};
pub use response::{AnswerValue, Answers, Response};
pub use roster::{ClientProgress, ClientRosterEntry, Goal};
pub use stats::{
    ACTIVE_WINDOW_DAYS, BestProgress, INTERVENTION_GRACE_DAYS, ProgressStats, WeightLossStats,
};
pub use template::{Template, TemplateError, resolve_default_template};
