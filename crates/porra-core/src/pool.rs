// Pool session: the base dataset plus the override store.
//
// Every derived view (standings, leaderboard, per-participant detail) is
// computed on request from the current resolved facts. Nothing is cached, so
// a mutation is visible to the very next read.

use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::Value;

use crate::leaderboard::{self, LeaderboardEntry, LeaderboardOrder};
use crate::model::{Dataset, Match, PickCategory, Stage};
use crate::overrides::{ExportDocument, ImportError, OverrideStore};
use crate::scalar::Score;
use crate::scoring::{self, MatchSummary, PickPoints, PickRowDetail};
use crate::standings::{self, StandingRow};

/// Which matches to list by played state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayedFilter {
    #[default]
    All,
    Played,
    Upcoming,
}

/// Criteria for listing matches.
#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    pub stage: Option<Stage>,
    pub played: PlayedFilter,
    /// Case-insensitive substring over teams, stage label and matchday.
    pub query: Option<String>,
}

/// One match from one participant's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantMatchRow {
    pub match_id: String,
    pub stage: Stage,
    pub home: String,
    pub away: String,
    pub actual: Option<Score>,
    pub prediction: Option<Score>,
    pub points: u32,
}

/// Standings and leaderboard computed at one store revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedViews {
    pub revision: u64,
    pub standings: Vec<StandingRow>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

pub struct Pool {
    dataset: Dataset,
    store: OverrideStore,
}

impl Pool {
    pub fn new(dataset: Dataset, store: OverrideStore) -> Self {
        Pool { dataset, store }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn store(&self) -> &OverrideStore {
        &self.store
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Effective result of a match. Unknown ids resolve to `None` unless an
    /// override layer names them.
    pub fn resolve_match(&self, match_id: &str) -> Option<Score> {
        let baseline = self.dataset.match_by_id(match_id).and_then(|m| m.actual);
        self.store.resolve_match(match_id, baseline)
    }

    fn resolve(&self, m: &Match) -> Option<Score> {
        self.store.resolve_match(&m.id, m.actual)
    }

    pub fn resolve_pick(&self, category: PickCategory, key: &str) -> Option<String> {
        let baseline = self
            .dataset
            .pick_row(category, key)
            .and_then(|row| row.actual.as_deref());
        self.store.resolve_pick(category, key, baseline)
    }

    // ------------------------------------------------------------------
    // Scoring
    // ------------------------------------------------------------------

    /// Points `participant_id` earns on `m` under its stage's rules.
    pub fn match_points(&self, m: &Match, participant_id: &str) -> u32 {
        let rule = self.dataset.rules.match_scoring.rule_for(m.stage);
        scoring::match_points(&rule, self.resolve(m), m.prediction(participant_id))
    }

    /// Same as [`Pool::match_points`] by match id; unknown matches score zero.
    pub fn match_points_by_id(&self, match_id: &str, participant_id: &str) -> u32 {
        self.dataset
            .match_by_id(match_id)
            .map_or(0, |m| self.match_points(m, participant_id))
    }

    pub fn total_match_points(&self, participant_id: &str) -> u32 {
        self.dataset
            .matches
            .iter()
            .map(|m| self.match_points(m, participant_id))
            .fold(0u32, u32::saturating_add)
    }

    pub fn pick_points(&self, participant_id: &str) -> PickPoints {
        scoring::pick_points(
            &self.dataset.picks,
            &self.dataset.rules.pick_scoring,
            participant_id,
            |category, row| self.store.resolve_pick(category, &row.key, row.actual.as_deref()),
        )
    }

    pub fn pick_breakdown(&self, participant_id: &str) -> Vec<PickRowDetail> {
        scoring::pick_breakdown(
            &self.dataset.picks,
            &self.dataset.rules.pick_scoring,
            participant_id,
            |category, row| self.store.resolve_pick(category, &row.key, row.actual.as_deref()),
        )
    }

    pub fn match_summary(&self, m: &Match) -> MatchSummary {
        let rule = self.dataset.rules.match_scoring.rule_for(m.stage);
        scoring::summarize_match(m, self.resolve(m), &rule, &self.dataset.participants)
    }

    pub fn participant_matches(&self, participant_id: &str) -> Vec<ParticipantMatchRow> {
        self.dataset
            .matches
            .iter()
            .map(|m| ParticipantMatchRow {
                match_id: m.id.clone(),
                stage: m.stage,
                home: m.home.clone(),
                away: m.away.clone(),
                actual: self.resolve(m),
                prediction: m.prediction(participant_id),
                points: self.match_points(m, participant_id),
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------

    pub fn standings(&self) -> Vec<StandingRow> {
        standings::compute_standings(self.dataset.matches.iter().map(|m| (m, self.resolve(m))))
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        leaderboard::compute_leaderboard(
            &self.dataset.participants,
            |p| self.total_match_points(&p.id),
            |p| self.pick_points(&p.id),
        )
    }

    pub fn leaderboard_ordered(&self, order: LeaderboardOrder) -> Vec<LeaderboardEntry> {
        leaderboard::reorder(self.leaderboard(), order)
    }

    pub fn views(&self) -> DerivedViews {
        DerivedViews {
            revision: self.store.revision(),
            standings: self.standings(),
            leaderboard: self.leaderboard(),
        }
    }

    pub fn filter_matches(&self, filter: &MatchFilter) -> Vec<&Match> {
        let query = filter
            .query
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        self.dataset
            .matches
            .iter()
            .filter(|m| filter.stage.map_or(true, |s| m.stage == s))
            .filter(|m| match filter.played {
                PlayedFilter::All => true,
                PlayedFilter::Played => self.resolve(m).is_some(),
                PlayedFilter::Upcoming => self.resolve(m).is_none(),
            })
            .filter(|m| {
                query.as_deref().map_or(true, |q| {
                    let haystack = format!(
                        "{} {} {} {}",
                        m.home,
                        m.away,
                        m.stage.display_label(),
                        m.matchday.map(|d| d.to_string()).unwrap_or_default()
                    );
                    haystack.to_lowercase().contains(q)
                })
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    pub fn set_match_outcome(&mut self, match_id: &str, outcome: Option<Score>) -> Result<()> {
        if self.dataset.match_by_id(match_id).is_none() {
            bail!("no match with id `{match_id}`");
        }
        self.store.set_match_outcome(match_id, outcome)
    }

    pub fn revert_match(&mut self, match_id: &str) -> Result<bool> {
        self.store.revert_match(match_id)
    }

    pub fn set_pick_outcome(
        &mut self,
        category: PickCategory,
        key: &str,
        team: Option<String>,
    ) -> Result<()> {
        if self.dataset.pick_row(category, key).is_none() {
            bail!("no {category} pick row with key `{key}`");
        }
        self.store.set_pick_outcome(category, key, team)
    }

    pub fn revert_pick(&mut self, category: PickCategory, key: &str) -> Result<bool> {
        self.store.revert_pick(category, key)
    }

    pub fn reset_local(&mut self) -> Result<()> {
        self.store.reset_local()
    }

    pub fn import_local(&mut self, doc: &Value) -> Result<(), ImportError> {
        self.store.import_local(doc)
    }

    pub fn import_local_str(&mut self, text: &str) -> Result<(), ImportError> {
        self.store.import_local_str(text)
    }

    pub fn export_local(&self) -> ExportDocument {
        self.store.export_local()
    }
}
