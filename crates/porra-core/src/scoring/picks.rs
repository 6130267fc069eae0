// Pick scoring: flat points per correctly picked position or bracket slot.

use serde::Serialize;

use crate::model::{PickCategory, PickRow, PickRules, PicksData};

/// Pick points for one participant, split by category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PickPoints {
    pub position_points: u32,
    pub bracket_from_league_points: u32,
    pub bracket_team_points: u32,
    pub total: u32,
}

impl PickPoints {
    pub fn category(&self, category: PickCategory) -> u32 {
        match category {
            PickCategory::Positions => self.position_points,
            PickCategory::OctavosFromLeague => self.bracket_from_league_points,
            PickCategory::PlayoffsTeams => self.bracket_team_points,
        }
    }

    fn add(&mut self, category: PickCategory, points: u32) {
        let slot = match category {
            PickCategory::Positions => &mut self.position_points,
            PickCategory::OctavosFromLeague => &mut self.bracket_from_league_points,
            PickCategory::PlayoffsTeams => &mut self.bracket_team_points,
        };
        *slot = slot.saturating_add(points);
        self.total = self.total.saturating_add(points);
    }
}

/// One pick row as seen by one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickRowDetail {
    pub category: PickCategory,
    pub key: String,
    pub pick: Option<String>,
    pub actual: Option<String>,
    pub points: u32,
}

/// Every pick row of every category for `participant_id`, in dataset order.
///
/// `resolve` yields the effective actual team for a row. A row scores only
/// when both sides are known and the names are identical.
pub fn pick_breakdown<F>(
    picks: &PicksData,
    rules: &PickRules,
    participant_id: &str,
    resolve: F,
) -> Vec<PickRowDetail>
where
    F: Fn(PickCategory, &PickRow) -> Option<String>,
{
    let mut details = Vec::new();
    for category in PickCategory::ALL {
        let value = rules.points_for(category);
        for row in picks.rows(category) {
            let actual = resolve(category, row);
            let pick = row.pick(participant_id).map(str::to_string);
            let points = match (&actual, &pick) {
                (Some(actual), Some(pick)) if actual == pick => value,
                _ => 0,
            };
            details.push(PickRowDetail {
                category,
                key: row.key.clone(),
                pick,
                actual,
                points,
            });
        }
    }
    details
}

pub fn pick_points<F>(
    picks: &PicksData,
    rules: &PickRules,
    participant_id: &str,
    resolve: F,
) -> PickPoints
where
    F: Fn(PickCategory, &PickRow) -> Option<String>,
{
    let mut totals = PickPoints::default();
    for detail in pick_breakdown(picks, rules, participant_id, resolve) {
        totals.add(detail.category, detail.points);
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn picks() -> PicksData {
        serde_json::from_value(json!({
            "positions": [
                {"position": 1, "actual": "PSG", "picks": {"1": "PSG", "2": "Arsenal"}},
                {"position": 2, "picks": {"1": "Arsenal", "2": "Arsenal"}}
            ],
            "octavosFromLeague": [
                {"slot": "1A", "actual": "Inter", "picks": {"1": "Inter", "2": "inter"}},
                {"slot": "1B", "actual": "Barcelona", "picks": {"1": "Barcelona"}}
            ],
            "playoffsTeams": [
                {"slot": "P1", "actual": "Celtic", "picks": {"2": "Celtic"}}
            ]
        }))
        .unwrap()
    }

    fn rules() -> PickRules {
        PickRules {
            position_exact_points: 5,
            octavos_from_league_team_points: 2,
            playoffs_team_points: 1,
        }
    }

    fn baseline(_: PickCategory, row: &PickRow) -> Option<String> {
        row.actual.clone()
    }

    #[test]
    fn categories_sum_independently() {
        let p1 = pick_points(&picks(), &rules(), "1", baseline);
        assert_eq!(
            p1,
            PickPoints {
                position_points: 5,
                bracket_from_league_points: 4,
                bracket_team_points: 0,
                total: 9,
            }
        );

        let p2 = pick_points(&picks(), &rules(), "2", baseline);
        assert_eq!(p2.position_points, 0);
        assert_eq!(p2.bracket_from_league_points, 0, "matching is case-sensitive");
        assert_eq!(p2.bracket_team_points, 1);
        assert_eq!(p2.total, 1);
    }

    #[test]
    fn huge_pick_values_saturate() {
        let rules = PickRules {
            position_exact_points: u32::MAX,
            octavos_from_league_team_points: u32::MAX,
            playoffs_team_points: u32::MAX,
        };
        let p1 = pick_points(&picks(), &rules, "1", baseline);
        assert_eq!(p1.bracket_from_league_points, u32::MAX);
        assert_eq!(p1.total, u32::MAX);
    }

    #[test]
    fn unresolved_rows_score_zero() {
        let p = pick_points(&picks(), &rules(), "1", |_, _| None);
        assert_eq!(p, PickPoints::default());
    }

    #[test]
    fn unknown_participant_scores_zero() {
        let p = pick_points(&picks(), &rules(), "99", baseline);
        assert_eq!(p.total, 0);
    }

    #[test]
    fn resolver_overrides_baseline() {
        let p = pick_points(&picks(), &rules(), "2", |category, row| {
            if category == PickCategory::Positions && row.key == "2" {
                Some("Arsenal".to_string())
            } else {
                row.actual.clone()
            }
        });
        assert_eq!(p.position_points, 5);
    }

    #[test]
    fn breakdown_lists_every_row_in_order() {
        let rows = pick_breakdown(&picks(), &rules(), "1", baseline);
        let keys: Vec<(PickCategory, &str)> =
            rows.iter().map(|r| (r.category, r.key.as_str())).collect();
        assert_eq!(
            keys,
            vec![
                (PickCategory::Positions, "1"),
                (PickCategory::Positions, "2"),
                (PickCategory::OctavosFromLeague, "1A"),
                (PickCategory::OctavosFromLeague, "1B"),
                (PickCategory::PlayoffsTeams, "P1"),
            ]
        );
        assert_eq!(rows[1].actual, None);
        assert_eq!(rows[1].pick.as_deref(), Some("Arsenal"));
        assert_eq!(rows[1].points, 0);
        assert_eq!(rows[4].pick, None);
    }
}
