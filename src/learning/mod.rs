//! Learning rules: CEFR levels, scoring, XP, streaks, lesson unlocking and
//! placement test grading. Nothing in here touches the database.

mod activity;
pub use activity::ActivityType;

mod cefr;
pub use cefr::CefrLevel;

pub mod evaluation;

mod scoring;
pub use scoring::{
    activity_xp, lesson_xp, percentage, stars_for, total_percentage, xp_gain, xp_level, xp_to_next_level,
};

mod streak;
pub use streak::{Streak, next_streak};

mod unlock;
pub use unlock::{Unlockable, mark_unlocked};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("unknown CEFR level `{0}`")]
    UnknownLevel(String),
    #[error("unknown activity type `{0}`")]
    UnknownActivityType(String),
    #[error("invalid evaluation test: {0}")]
    InvalidTest(String),
}
