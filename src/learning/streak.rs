use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, utoipa::ToSchema)]
pub struct Streak {
    pub current: i32,
    pub longest: i32,
    pub last_activity: Option<NaiveDate>,
}

/// Streak after some learning happened on `today`.
///
/// Same day keeps the count, the following day extends it, any gap starts
/// over at 1. A last activity date in the future (clock skew between
/// servers) counts as today.
pub fn next_streak(prev: Streak, today: NaiveDate) -> Streak {
    let current = match prev.last_activity {
        None => 1,
        Some(last) if last >= today => prev.current.max(1),
        Some(last) if last.succ_opt() == Some(today) => prev.current + 1,
        Some(_) => 1,
    };

    Streak {
        current,
        longest: prev.longest.max(current),
        last_activity: Some(today.max(prev.last_activity.unwrap_or(today))),
    }
}
