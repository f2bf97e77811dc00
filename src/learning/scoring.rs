pub const XP_PER_LEVEL: i32 = 100;
const LESSON_BASE_XP: i32 = 20;
const XP_PER_STAR: i32 = 10;

/// Integer percentage of `score` out of `max`, rounded half up and clamped
/// to `0..=100`. A zero `max` yields 0.
pub fn percentage(score: i32, max: i32) -> i32 {
    total_percentage(i64::from(score), i64::from(max))
}

/// [`percentage`] over summed scores, which may not fit in an `i32`.
pub fn total_percentage(score: i64, max: i64) -> i32 {
    if max <= 0 {
        return 0;
    }
    let score = i128::from(score.clamp(0, max));
    let max = i128::from(max);
    ((score * 200 + max) / (2 * max)) as i32
}

pub fn stars_for(percentage: i32) -> i32 {
    match percentage {
        p if p >= 90 => 3,
        p if p >= 70 => 2,
        p if p >= 50 => 1,
        _ => 0,
    }
}

pub fn lesson_xp(stars: i32) -> i32 {
    LESSON_BASE_XP + XP_PER_STAR * stars.clamp(0, 3)
}

/// XP earned by finishing a lesson with `new_stars`, given the best stars
/// of earlier completions. Only improvements pay out.
pub fn xp_gain(previous_stars: Option<i32>, new_stars: i32) -> i32 {
    match previous_stars {
        None => lesson_xp(new_stars),
        Some(prev) => (lesson_xp(new_stars) - lesson_xp(prev)).max(0),
    }
}

/// XP for the first submission of an activity.
pub fn activity_xp(score: i32, max: i32) -> i32 {
    percentage(score, max) / 10
}

pub fn xp_level(xp: i32) -> i32 {
    xp.max(0) / XP_PER_LEVEL + 1
}

pub fn xp_to_next_level(xp: i32) -> i32 {
    XP_PER_LEVEL - xp.max(0) % XP_PER_LEVEL
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13); // 12.5
        assert_eq!(percentage(10, 10), 100);
        assert_eq!(percentage(0, 10), 0);
    }

    #[test]
    fn totals_are_not_saturated() {
        let max = i64::from(i32::MAX);
        assert_eq!(total_percentage(max, 2 * max), 50);
        assert_eq!(total_percentage(i64::MAX, i64::MAX), 100);
        assert_eq!(total_percentage(1, i64::MAX), 0);
    }

    #[test]
    fn percentage_guards_bad_input() {
        assert_eq!(percentage(5, 0), 0);
        assert_eq!(percentage(15, 10), 100);
        assert_eq!(percentage(-3, 10), 0);
    }

    #[test]
    fn star_thresholds() {
        assert_eq!(stars_for(49), 0);
        assert_eq!(stars_for(50), 1);
        assert_eq!(stars_for(69), 1);
        assert_eq!(stars_for(70), 2);
        assert_eq!(stars_for(89), 2);
        assert_eq!(stars_for(90), 3);
        assert_eq!(stars_for(100), 3);
    }

    #[test]
    fn first_completion_pays_full_lesson_xp() {
        assert_eq!(xp_gain(None, 0), 20);
        assert_eq!(xp_gain(None, 3), 50);
    }

    #[test]
    fn repeat_completion_pays_only_improvement() {
        assert_eq!(xp_gain(Some(1), 3), 20);
        assert_eq!(xp_gain(Some(3), 3), 0);
        assert_eq!(xp_gain(Some(3), 1), 0);
    }

    #[test]
    fn activity_xp_is_a_tenth_of_percentage() {
        assert_eq!(activity_xp(10, 10), 10);
        assert_eq!(activity_xp(7, 10), 7);
        assert_eq!(activity_xp(0, 10), 0);
    }

    #[test]
    fn levels_every_hundred_xp() {
        assert_eq!(xp_level(0), 1);
        assert_eq!(xp_level(99), 1);
        assert_eq!(xp_level(100), 2);
        assert_eq!(xp_level(250), 3);
        assert_eq!(xp_to_next_level(0), 100);
        assert_eq!(xp_to_next_level(250), 50);
        assert_eq!(xp_to_next_level(300), 100);
    }
}
