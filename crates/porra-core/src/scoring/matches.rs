// Match scoring: sign, exact-score bonus and goal-difference points.

use crate::model::{Match, MatchRule, Participant};
use crate::scalar::Score;

/// Points one prediction earns against the resolved result.
///
/// Missing input (no result yet, no prediction) scores zero. Sign and exact
/// bonus add up; the goal-difference award only applies to non-exact hits.
pub fn match_points(rule: &MatchRule, actual: Option<Score>, prediction: Option<Score>) -> u32 {
    let (Some(actual), Some(prediction)) = (actual, prediction) else {
        return 0;
    };

    let mut points: u32 = 0;
    if actual.sign() == prediction.sign() {
        points = points.saturating_add(rule.sign_points);
    }

    let exact = actual == prediction;
    if exact {
        points = points.saturating_add(rule.exact_bonus_points);
    } else if rule.diff_points > 0 && actual.goal_difference() == prediction.goal_difference() {
        points = points.saturating_add(rule.diff_points);
    }
    points
}

/// How the pool did on one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSummary {
    /// No resolved result yet.
    Pending,
    Played {
        max_points: u32,
        /// Names of everyone who reached `max_points`, in dataset order.
        leaders: Vec<String>,
        exact_count: usize,
    },
}

pub fn summarize_match(
    m: &Match,
    actual: Option<Score>,
    rule: &MatchRule,
    participants: &[Participant],
) -> MatchSummary {
    let Some(result) = actual else {
        return MatchSummary::Pending;
    };

    let mut max_points = 0;
    let mut leaders: Vec<String> = Vec::new();
    let mut exact_count = 0;

    for p in participants {
        let prediction = m.prediction(&p.id);
        let points = match_points(rule, actual, prediction);
        if leaders.is_empty() || points > max_points {
            max_points = points;
            leaders = vec![p.name.clone()];
        } else if points == max_points {
            leaders.push(p.name.clone());
        }
        if prediction == Some(result) {
            exact_count += 1;
        }
    }

    MatchSummary::Played {
        max_points,
        leaders,
        exact_count,
    }
}
