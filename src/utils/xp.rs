//! XP and level arithmetic for the quiz leveling system.

/// Base XP awarded per correct answer before any multiplier.
const BASE_XP_PER_CORRECT: f64 = 10.0;

/// XP needed to go from level 1 to level 2.
const BASE_XP_REQUIREMENT: i64 = 50;
/// Additional XP required per subsequent level.
const XP_SCALING_FACTOR: i64 = 50;
pub const MAX_LEVEL: i64 = 100;

const PERFECT_QUIZ_BONUS: f64 = 0.25;
const FIRST_QUIZ_OF_DAY_BONUS: f64 = 0.15;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Easy => 1.0,
            Self::Medium => 1.5,
            Self::Hard => 2.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Unrecognized difficulty strings fall back to medium.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "easy" => Self::Easy,
            "hard" => Self::Hard,
            _ => Self::Medium,
        }
    }
}

/// Itemized XP award for one completed quiz.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XpBreakdown {
    pub base_xp: i64,
    pub accuracy_bonus: i64,
    pub perfect_bonus: i64,
    pub streak_bonus: i64,
    pub first_today_bonus: i64,
    pub total_xp: i64,
    pub accuracy_percentage: f64,
}

pub fn base_xp(correct_answers: u32, difficulty: Difficulty) -> i64 {
    (correct_answers as f64 * BASE_XP_PER_CORRECT * difficulty.multiplier()) as i64
}

/// Accuracy bonus as a percentage of base XP: 80% accuracy earns +10%,
/// 90% earns +20%, a perfect run earns +50%.
pub fn accuracy_bonus_percent(correct: u32, total: u32) -> (i64, f64) {
    if total == 0 {
        return (0, 0.0);
    }

    let accuracy = (correct as f64 / total as f64) * 100.0;
    let bonus = if accuracy >= 100.0 {
        50
    } else if accuracy >= 90.0 {
        20
    } else if accuracy >= 80.0 {
        10
    } else {
        0
    };

    (bonus, accuracy)
}

/// Multiplier earned by consecutive-day quiz streaks.
pub fn streak_multiplier(current_streak: u32) -> f64 {
    match current_streak {
        30.. => 1.5,
        14.. => 1.3,
        7.. => 1.2,
        3.. => 1.1,
        _ => 1.0,
    }
}

/// Compute the full XP award with every bonus applied. The streak
/// multiplier applies last, over the subtotal of all other bonuses.
pub fn calculate_total_xp(
    correct: u32,
    total: u32,
    difficulty: Difficulty,
    current_streak: u32,
    is_first_today: bool,
) -> XpBreakdown {
    let base = base_xp(correct, difficulty);
    let (accuracy_pct, accuracy) = accuracy_bonus_percent(correct, total);
    let accuracy_bonus = base * accuracy_pct / 100;

    let perfect_bonus = if total > 0 && correct == total {
        (base as f64 * PERFECT_QUIZ_BONUS) as i64
    } else {
        0
    };

    let first_today_bonus = if is_first_today {
        (base as f64 * FIRST_QUIZ_OF_DAY_BONUS) as i64
    } else {
        0
    };

    let subtotal = base + accuracy_bonus + perfect_bonus + first_today_bonus;
    let streak_bonus = (subtotal as f64 * (streak_multiplier(current_streak) - 1.0)) as i64;

    XpBreakdown {
        base_xp: base,
        accuracy_bonus,
        perfect_bonus,
        streak_bonus,
        first_today_bonus,
        total_xp: subtotal + streak_bonus,
        accuracy_percentage: (accuracy * 10.0).round() / 10.0,
    }
}

/// Total XP required to reach a level. Each level costs 50 XP more than the
/// previous one: level 2 costs 50, level 3 another 100, and so on.
pub fn xp_for_level(target_level: i64) -> i64 {
    if target_level <= 1 {
        return 0;
    }

    let mut total = 0;
    for level in 2..=target_level.min(MAX_LEVEL) {
        total += BASE_XP_REQUIREMENT + (level - 2) * XP_SCALING_FACTOR;
    }
    total
}

pub fn level_from_xp(total_xp: i64) -> i64 {
    if total_xp < 0 {
        return 1;
    }

    let mut level = 1;
    let mut accumulated = 0;
    for next in 2..=MAX_LEVEL {
        let requirement = BASE_XP_REQUIREMENT + (next - 2) * XP_SCALING_FACTOR;
        if accumulated + requirement <= total_xp {
            accumulated += requirement;
            level = next;
        } else {
            break;
        }
    }
    level
}

/// The new level if the XP gain crossed a level boundary.
pub fn detect_level_up(old_total_xp: i64, new_total_xp: i64) -> Option<i64> {
    let old_level = level_from_xp(old_total_xp);
    let new_level = level_from_xp(new_total_xp);
    (new_level > old_level).then_some(new_level)
}

/// Human-readable XP breakdown lines for the quiz completion embed.
pub fn breakdown_message(breakdown: &XpBreakdown, difficulty: Difficulty) -> String {
    let mut lines = vec![format!(
        "📚 Base XP ({}): **{}**",
        difficulty.as_str(),
        breakdown.base_xp
    )];

    if breakdown.accuracy_bonus > 0 {
        lines.push(format!(
            "🎯 Accuracy Bonus ({}%): **+{}**",
            breakdown.accuracy_percentage, breakdown.accuracy_bonus
        ));
    }
    if breakdown.perfect_bonus > 0 {
        lines.push(format!("💯 Perfect Quiz Bonus: **+{}**", breakdown.perfect_bonus));
    }
    if breakdown.first_today_bonus > 0 {
        lines.push(format!("🌅 First Quiz Today: **+{}**", breakdown.first_today_bonus));
    }
    if breakdown.streak_bonus > 0 {
        lines.push(format!("🔥 Streak Bonus: **+{}**", breakdown.streak_bonus));
    }

    lines.push(format!("\n**Total XP Earned: {}**", breakdown.total_xp));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_xp_scales_with_difficulty() {
        assert_eq!(base_xp(4, Difficulty::Easy), 40);
        assert_eq!(base_xp(4, Difficulty::Medium), 60);
        assert_eq!(base_xp(4, Difficulty::Hard), 80);
    }

    #[test]
    fn test_accuracy_bonus_thresholds() {
        assert_eq!(accuracy_bonus_percent(10, 10).0, 50);
        assert_eq!(accuracy_bonus_percent(9, 10).0, 20);
        assert_eq!(accuracy_bonus_percent(8, 10).0, 10);
        assert_eq!(accuracy_bonus_percent(7, 10).0, 0);
        assert_eq!(accuracy_bonus_percent(0, 0), (0, 0.0));
    }

    #[test]
    fn test_streak_multiplier_tiers() {
        assert_eq!(streak_multiplier(0), 1.0);
        assert_eq!(streak_multiplier(3), 1.1);
        assert_eq!(streak_multiplier(7), 1.2);
        assert_eq!(streak_multiplier(14), 1.3);
        assert_eq!(streak_multiplier(30), 1.5);
        assert_eq!(streak_multiplier(99), 1.5);
    }

    #[test]
    fn test_perfect_quiz_full_breakdown() {
        let breakdown = calculate_total_xp(5, 5, Difficulty::Medium, 0, false);
        assert_eq!(breakdown.base_xp, 75);
        assert_eq!(breakdown.accuracy_bonus, 37);
        assert_eq!(breakdown.perfect_bonus, 18);
        assert_eq!(breakdown.streak_bonus, 0);
        assert_eq!(breakdown.total_xp, 130);
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(xp_for_level(1), 0);
        assert_eq!(xp_for_level(2), 50);
        assert_eq!(xp_for_level(3), 150);
        assert_eq!(xp_for_level(4), 300);

        assert_eq!(level_from_xp(0), 1);
        assert_eq!(level_from_xp(49), 1);
        assert_eq!(level_from_xp(50), 2);
        assert_eq!(level_from_xp(150), 3);
        assert_eq!(level_from_xp(-5), 1);
    }

    #[test]
    fn test_level_cap() {
        assert_eq!(level_from_xp(i64::MAX / 2), MAX_LEVEL);
    }

    #[test]
    fn test_detect_level_up() {
        assert_eq!(detect_level_up(40, 60), Some(2));
        assert_eq!(detect_level_up(60, 80), None);
        assert_eq!(detect_level_up(60, 40), None);
    }
}
