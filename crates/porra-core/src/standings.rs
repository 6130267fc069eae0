// League-phase table built from resolved league results.

use std::collections::HashMap;

use serde::Serialize;

use crate::collate;
use crate::model::{Match, Stage};
use crate::scalar::Score;

const POINTS_FOR_WIN: u32 = 3;
const POINTS_FOR_DRAW: u32 = 1;

/// One team's line in the league table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingRow {
    /// 1-based position after sorting.
    pub position: usize,
    pub team: String,
    pub points: u32,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u64,
    pub goals_against: u64,
    pub goal_difference: i64,
}

impl StandingRow {
    fn new(team: &str) -> Self {
        StandingRow {
            position: 0,
            team: team.to_string(),
            points: 0,
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
        }
    }

    fn record(&mut self, scored: u32, conceded: u32) {
        self.played = self.played.saturating_add(1);
        self.goals_for = self.goals_for.saturating_add(u64::from(scored));
        self.goals_against = self.goals_against.saturating_add(u64::from(conceded));
        match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => {
                self.won = self.won.saturating_add(1);
                self.points = self.points.saturating_add(POINTS_FOR_WIN);
            }
            std::cmp::Ordering::Less => self.lost = self.lost.saturating_add(1),
            std::cmp::Ordering::Equal => {
                self.drawn = self.drawn.saturating_add(1);
                self.points = self.points.saturating_add(POINTS_FOR_DRAW);
            }
        }
    }
}

/// Fold resolved league matches into a sorted table.
///
/// Each item pairs a match with its resolved result. Non-league matches and
/// unresolved results are skipped, so teams without a played league match do
/// not appear. Order: points, goal difference, goals for (all descending),
/// then team name in Spanish collation order.
pub fn compute_standings<'a, I>(results: I) -> Vec<StandingRow>
where
    I: IntoIterator<Item = (&'a Match, Option<Score>)>,
{
    let mut teams: HashMap<String, StandingRow> = HashMap::new();

    for (m, result) in results {
        if m.stage != Stage::League {
            continue;
        }
        let Some(score) = result else {
            continue;
        };

        teams
            .entry(m.home.clone())
            .or_insert_with(|| StandingRow::new(&m.home))
            .record(score.home, score.away);
        teams
            .entry(m.away.clone())
            .or_insert_with(|| StandingRow::new(&m.away))
            .record(score.away, score.home);
    }

    let mut table: Vec<StandingRow> = teams
        .into_values()
        .map(|mut row| {
            let scored = i64::try_from(row.goals_for).unwrap_or(i64::MAX);
            let conceded = i64::try_from(row.goals_against).unwrap_or(i64::MAX);
            row.goal_difference = scored.saturating_sub(conceded);
            row
        })
        .collect();

    table.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.goal_difference.cmp(&a.goal_difference))
            .then_with(|| b.goals_for.cmp(&a.goals_for))
            .then_with(|| collate::compare(&a.team, &b.team))
    });

    for (idx, row) in table.iter_mut().enumerate() {
        row.position = idx + 1;
    }
    table
}
