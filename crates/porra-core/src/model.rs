// Base dataset: participants, matches with predictions, pick rows and rules.
//
// The dataset is loaded once at startup and never mutated. Everything that
// can change during a session lives in the override store instead.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scalar::{de_key, de_opt_u32, de_points, Score};

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Competition phase a match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "league")]
    League,
    #[serde(rename = "playoffs")]
    Playoffs,
    #[serde(rename = "round_of_16")]
    RoundOf16,
    #[serde(rename = "quarterfinals")]
    Quarterfinals,
    #[serde(rename = "semifinals")]
    Semifinals,
    #[serde(rename = "final")]
    Final,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::League,
        Stage::Playoffs,
        Stage::RoundOf16,
        Stage::Quarterfinals,
        Stage::Semifinals,
        Stage::Final,
    ];

    /// Position of this stage in [`Stage::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Stage::League => 0,
            Stage::Playoffs => 1,
            Stage::RoundOf16 => 2,
            Stage::Quarterfinals => 3,
            Stage::Semifinals => 4,
            Stage::Final => 5,
        }
    }

    /// Key used by `rules.matchScoring` in the dataset.
    pub fn scoring_label(&self) -> &'static str {
        match self {
            Stage::League => "FASE DE LIGA",
            Stage::Playoffs => "PLAYOFFS",
            Stage::RoundOf16 => "OCTAVOS",
            Stage::Quarterfinals => "CUARTOS",
            Stage::Semifinals => "SEMIFINALES",
            Stage::Final => "FINAL",
        }
    }

    pub fn from_scoring_label(label: &str) -> Option<Self> {
        Stage::ALL.into_iter().find(|s| s.scoring_label() == label)
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            Stage::League => "Fase de liga",
            Stage::Playoffs => "Playoffs",
            Stage::RoundOf16 => "Octavos",
            Stage::Quarterfinals => "Cuartos",
            Stage::Semifinals => "Semifinales",
            Stage::Final => "Final",
        }
    }

    /// Serialized name (`league`, `round_of_16`, ...).
    pub fn key(&self) -> &'static str {
        match self {
            Stage::League => "league",
            Stage::Playoffs => "playoffs",
            Stage::RoundOf16 => "round_of_16",
            Stage::Quarterfinals => "quarterfinals",
            Stage::Semifinals => "semifinals",
            Stage::Final => "final",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_label())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|st| st.key() == s)
            .ok_or_else(|| format!("unknown stage `{s}`"))
    }
}

// ---------------------------------------------------------------------------
// Participants and matches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(deserialize_with = "de_key")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    #[serde(deserialize_with = "de_key")]
    pub id: String,
    pub stage: Stage,
    pub home: String,
    pub away: String,
    /// Scheduled kickoff as written in the dataset (ISO-8601).
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default, deserialize_with = "de_opt_u32")]
    pub matchday: Option<u32>,
    /// Baseline result shipped with the dataset; `None` means not played.
    #[serde(default)]
    pub actual: Option<Score>,
    /// Participant id -> predicted score.
    #[serde(default)]
    pub predictions: HashMap<String, Option<Score>>,
}

impl Match {
    pub fn prediction(&self, participant_id: &str) -> Option<Score> {
        self.predictions.get(participant_id).copied().flatten()
    }

    /// Kickoff parsed as UTC. Timestamps without an offset are read as UTC.
    pub fn kickoff(&self) -> Option<DateTime<Utc>> {
        let raw = self.datetime.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                    .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
                    .map(|naive| naive.and_utc())
                    .ok()
            })
    }
}

// ---------------------------------------------------------------------------
// Picks
// ---------------------------------------------------------------------------

/// The three families of bracket/position picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PickCategory {
    Positions,
    OctavosFromLeague,
    PlayoffsTeams,
}

impl PickCategory {
    pub const ALL: [PickCategory; 3] = [
        PickCategory::Positions,
        PickCategory::OctavosFromLeague,
        PickCategory::PlayoffsTeams,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            PickCategory::Positions => "positions",
            PickCategory::OctavosFromLeague => "octavosFromLeague",
            PickCategory::PlayoffsTeams => "playoffsTeams",
        }
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            PickCategory::Positions => "Posiciones",
            PickCategory::OctavosFromLeague => "Octavos desde la liga",
            PickCategory::PlayoffsTeams => "Equipos de playoffs",
        }
    }
}

impl fmt::Display for PickCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PickCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PickCategory::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown pick category `{s}`"))
    }
}

/// One pick slot: a final position or a bracket slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickRow {
    /// Ordinal position (`position` in the dataset) or bracket slot (`slot`).
    #[serde(rename = "slot", alias = "position", deserialize_with = "de_key")]
    pub key: String,
    #[serde(default)]
    pub actual: Option<String>,
    /// Participant id -> picked team.
    #[serde(default)]
    pub picks: HashMap<String, Option<String>>,
}

impl PickRow {
    pub fn pick(&self, participant_id: &str) -> Option<&str> {
        self.picks
            .get(participant_id)
            .and_then(|p| p.as_deref())
            .filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PicksData {
    #[serde(default)]
    pub positions: Vec<PickRow>,
    #[serde(default)]
    pub octavos_from_league: Vec<PickRow>,
    #[serde(default)]
    pub playoffs_teams: Vec<PickRow>,
}

impl PicksData {
    pub fn rows(&self, category: PickCategory) -> &[PickRow] {
        match category {
            PickCategory::Positions => &self.positions,
            PickCategory::OctavosFromLeague => &self.octavos_from_league,
            PickCategory::PlayoffsTeams => &self.playoffs_teams,
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Points for one stage's score predictions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRule {
    #[serde(default, deserialize_with = "de_points")]
    pub sign_points: u32,
    #[serde(default, deserialize_with = "de_points")]
    pub exact_bonus_points: u32,
    #[serde(default, deserialize_with = "de_points")]
    pub diff_points: u32,
}

/// Per-stage match rules indexed by [`Stage::index`].
///
/// Stages without their own entry use the league rule; with no league rule
/// either, every contribution is zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, MatchRule>",
    into = "BTreeMap<String, MatchRule>"
)]
pub struct MatchScoring {
    by_stage: [Option<MatchRule>; 6],
}

impl MatchScoring {
    pub fn with_rule(mut self, stage: Stage, rule: MatchRule) -> Self {
        self.by_stage[stage.index()] = Some(rule);
        self
    }

    pub fn rule_for(&self, stage: Stage) -> MatchRule {
        self.by_stage[stage.index()]
            .or(self.by_stage[Stage::League.index()])
            .unwrap_or_default()
    }
}

impl From<BTreeMap<String, MatchRule>> for MatchScoring {
    fn from(raw: BTreeMap<String, MatchRule>) -> Self {
        let mut scoring = MatchScoring::default();
        for (label, rule) in raw {
            match Stage::from_scoring_label(&label) {
                Some(stage) => scoring.by_stage[stage.index()] = Some(rule),
                None => debug!("Ignoring match rules for unknown stage label '{}'", label),
            }
        }
        scoring
    }
}

impl From<MatchScoring> for BTreeMap<String, MatchRule> {
    fn from(scoring: MatchScoring) -> Self {
        Stage::ALL
            .into_iter()
            .filter_map(|s| {
                scoring.by_stage[s.index()].map(|r| (s.scoring_label().to_string(), r))
            })
            .collect()
    }
}

/// Flat points per correct pick, one value per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickRules {
    #[serde(default, deserialize_with = "de_points")]
    pub position_exact_points: u32,
    #[serde(default, deserialize_with = "de_points")]
    pub octavos_from_league_team_points: u32,
    #[serde(default, deserialize_with = "de_points")]
    pub playoffs_team_points: u32,
}

impl PickRules {
    pub fn points_for(&self, category: PickCategory) -> u32 {
        match category {
            PickCategory::Positions => self.position_exact_points,
            PickCategory::OctavosFromLeague => self.octavos_from_league_team_points,
            PickCategory::PlayoffsTeams => self.playoffs_team_points,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rules {
    #[serde(default)]
    pub match_scoring: MatchScoring,
    #[serde(default)]
    pub pick_scoring: PickRules,
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default)]
    pub source_file: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
}

/// The read-only base dataset (`data.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub participants: Vec<Participant>,
    pub matches: Vec<Match>,
    pub picks: PicksData,
    pub rules: Rules,
    #[serde(default)]
    pub meta: Meta,
}

impl Dataset {
    pub fn match_by_id(&self, match_id: &str) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    pub fn participant(&self, participant_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }

    pub fn pick_row(&self, category: PickCategory, key: &str) -> Option<&PickRow> {
        self.picks.rows(category).iter().find(|r| r.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stage_serde_names() {
        let s: Stage = serde_json::from_value(json!("round_of_16")).unwrap();
        assert_eq!(s, Stage::RoundOf16);
        assert_eq!(serde_json::to_value(Stage::Final).unwrap(), json!("final"));
        assert_eq!("quarterfinals".parse::<Stage>(), Ok(Stage::Quarterfinals));
        assert!("groups".parse::<Stage>().is_err());
    }

    #[test]
    fn match_rules_fall_back_to_league() {
        let scoring: MatchScoring = serde_json::from_value(json!({
            "FASE DE LIGA": {"signPoints": 1, "exactBonusPoints": 2, "diffPoints": 1},
            "FINAL": {"signPoints": "3", "exactBonusPoints": 4}
        }))
        .unwrap();

        let final_rule = scoring.rule_for(Stage::Final);
        assert_eq!(final_rule.sign_points, 3);
        assert_eq!(final_rule.exact_bonus_points, 4);
        assert_eq!(final_rule.diff_points, 0);

        let cuartos = scoring.rule_for(Stage::Quarterfinals);
        assert_eq!(cuartos, scoring.rule_for(Stage::League));
        assert_eq!(cuartos.sign_points, 1);
    }

    #[test]
    fn empty_match_rules_score_nothing() {
        let scoring = MatchScoring::default();
        assert_eq!(scoring.rule_for(Stage::Semifinals), MatchRule::default());
    }

    #[test]
    fn pick_row_accepts_position_or_slot() {
        let by_position: PickRow = serde_json::from_value(json!({
            "position": 1,
            "picks": {"1": "Arsenal", "2": null}
        }))
        .unwrap();
        assert_eq!(by_position.key, "1");
        assert_eq!(by_position.pick("1"), Some("Arsenal"));
        assert_eq!(by_position.pick("2"), None);
        assert_eq!(by_position.pick("3"), None);

        let by_slot: PickRow = serde_json::from_value(json!({
            "slot": "1A",
            "actual": "Inter",
            "picks": {}
        }))
        .unwrap();
        assert_eq!(by_slot.key, "1A");
        assert_eq!(by_slot.actual.as_deref(), Some("Inter"));
    }

    #[test]
    fn match_numeric_ids_become_strings() {
        let m: Match = serde_json::from_value(json!({
            "id": 17,
            "stage": "league",
            "home": "PSG",
            "away": "Benfica",
            "datetime": "2025-09-17T21:00:00",
            "predictions": {"1": {"home": 2, "away": 0}, "2": null}
        }))
        .unwrap();
        assert_eq!(m.id, "17");
        assert_eq!(m.prediction("1"), Some(Score::new(2, 0)));
        assert_eq!(m.prediction("2"), None);
        assert!(m.actual.is_none());
        assert!(m.kickoff().is_some());
    }

    #[test]
    fn kickoff_accepts_offsets() {
        let m: Match = serde_json::from_value(json!({
            "id": "m1", "stage": "final", "home": "A", "away": "B",
            "datetime": "2026-05-30T18:00:00+02:00"
        }))
        .unwrap();
        assert_eq!(m.kickoff().unwrap().to_rfc3339(), "2026-05-30T16:00:00+00:00");
    }

    #[test]
    fn pick_category_parsing() {
        assert_eq!(
            "octavosfromleague".parse::<PickCategory>(),
            Ok(PickCategory::OctavosFromLeague)
        );
        assert_eq!(PickCategory::PlayoffsTeams.to_string(), "playoffsTeams");
    }
}
