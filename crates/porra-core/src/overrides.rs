// Override store: shared and local layers on top of the base dataset.
//
// Resolution order for every overridable fact is local -> shared -> baseline.
// A key that is present with a `null` value is an explicit entry and stops
// the search; only an absent key falls through to the next layer.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::db::Database;
use crate::model::PickCategory;
use crate::scalar::Score;

// ---------------------------------------------------------------------------
// Override sets
// ---------------------------------------------------------------------------

/// Explicit pick-actual entries, one map per category. `None` values are
/// explicit "unknown" entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PicksActual {
    pub positions: BTreeMap<String, Option<String>>,
    pub octavos_from_league: BTreeMap<String, Option<String>>,
    pub playoffs_teams: BTreeMap<String, Option<String>>,
}

impl PicksActual {
    pub fn get(&self, category: PickCategory) -> &BTreeMap<String, Option<String>> {
        match category {
            PickCategory::Positions => &self.positions,
            PickCategory::OctavosFromLeague => &self.octavos_from_league,
            PickCategory::PlayoffsTeams => &self.playoffs_teams,
        }
    }

    pub fn get_mut(&mut self, category: PickCategory) -> &mut BTreeMap<String, Option<String>> {
        match category {
            PickCategory::Positions => &mut self.positions,
            PickCategory::OctavosFromLeague => &mut self.octavos_from_league,
            PickCategory::PlayoffsTeams => &mut self.playoffs_teams,
        }
    }
}

/// One override layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideSet {
    pub matches_actual: BTreeMap<String, Option<Score>>,
    pub picks_actual: PicksActual,
}

impl OverrideSet {
    /// `Some(entry)` if this layer has an explicit entry for the match, where
    /// `entry` itself may be `None` (explicitly cleared).
    pub fn match_entry(&self, match_id: &str) -> Option<Option<Score>> {
        self.matches_actual.get(match_id).copied()
    }

    pub fn pick_entry(&self, category: PickCategory, key: &str) -> Option<Option<String>> {
        self.picks_actual.get(category).get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.matches_actual.len()
            + PickCategory::ALL
                .iter()
                .map(|c| self.picks_actual.get(*c).len())
                .sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalise an override document.
    ///
    /// Accepts either `{ "overrides": {...} }` (the export shape) or a bare
    /// override set. The chosen object is merged onto a freshly built empty
    /// skeleton, so missing sub-maps default to empty rather than failing.
    pub fn from_document(doc: &Value) -> Result<Self, ImportError> {
        let Value::Object(outer) = doc else {
            return Err(ImportError::NotAnObject);
        };
        let body = match outer.get("overrides") {
            Some(inner @ Value::Object(_)) => inner,
            None | Some(Value::Null) => doc,
            Some(_) => return Err(ImportError::NotAnObject),
        };

        let mut merged = skeleton();
        deep_merge(&mut merged, body);
        serde_json::from_value(merged).map_err(ImportError::InvalidShape)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ImportError> {
        let doc: Value = serde_json::from_str(text).map_err(ImportError::Parse)?;
        Self::from_document(&doc)
    }
}

/// The empty override document every import is merged onto.
fn skeleton() -> Value {
    let mut picks = Map::new();
    for category in PickCategory::ALL {
        picks.insert(category.key().to_string(), Value::Object(Map::new()));
    }
    let mut root = Map::new();
    root.insert("matchesActual".to_string(), Value::Object(Map::new()));
    root.insert("picksActual".to_string(), Value::Object(picks));
    Value::Object(root)
}

/// Recursively copy `source` onto `target`. Nested objects merge key by key;
/// every other value (including `null`) replaces what was there.
fn deep_merge(target: &mut Value, source: &Value) {
    let (Value::Object(dst), Value::Object(src)) = (target, source) else {
        return;
    };
    for (key, value) in src {
        if value.is_object() {
            let slot = dst
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            deep_merge(slot, value);
        } else {
            dst.insert(key.clone(), value.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Errors and export shape
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("import is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("import must be a JSON object (an exported state file or a bare override set)")]
    NotAnObject,

    #[error("import does not have the shape of an override set: {0}")]
    InvalidShape(#[source] serde_json::Error),

    #[error("failed to persist imported overrides: {0:#}")]
    Persist(anyhow::Error),
}

/// Document produced by [`OverrideStore::export_local`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub storage_key: String,
    pub overrides: OverrideSet,
}

impl ExportDocument {
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize export document")
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Shared and local override layers plus the database backing the local one.
pub struct OverrideStore {
    db: Database,
    storage_key: String,
    shared: OverrideSet,
    local: OverrideSet,
    /// Bumped on every successful mutation; derived views built at an older
    /// revision are stale.
    revision: u64,
}

impl OverrideStore {
    /// Build the store and read the local layer from `db`.
    ///
    /// Unreadable or malformed persisted state is logged and treated as an
    /// empty local layer.
    pub fn open(db: Database, storage_key: impl Into<String>, shared: OverrideSet) -> Self {
        let storage_key = storage_key.into();
        let local = load_local(&db, &storage_key);
        info!(
            "Override store ready: {} shared entries, {} local entries",
            shared.len(),
            local.len()
        );
        OverrideStore {
            db,
            storage_key,
            shared,
            local,
            revision: 0,
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn shared(&self) -> &OverrideSet {
        &self.shared
    }

    pub fn local(&self) -> &OverrideSet {
        &self.local
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn layers(&self) -> [&OverrideSet; 2] {
        [&self.local, &self.shared]
    }

    /// Effective result for a match; `None` means unresolved.
    pub fn resolve_match(&self, match_id: &str, baseline: Option<Score>) -> Option<Score> {
        self.layers()
            .into_iter()
            .find_map(|layer| layer.match_entry(match_id))
            .unwrap_or(baseline)
    }

    /// Effective team for a pick slot; `None` (or an empty name) means
    /// unresolved.
    pub fn resolve_pick(
        &self,
        category: PickCategory,
        key: &str,
        baseline: Option<&str>,
    ) -> Option<String> {
        self.layers()
            .into_iter()
            .find_map(|layer| layer.pick_entry(category, key))
            .unwrap_or_else(|| baseline.map(str::to_string))
            .filter(|team| !team.is_empty())
    }

    /// Record a result (or an explicit "unknown" with `None`) in the local
    /// layer.
    pub fn set_match_outcome(&mut self, match_id: &str, outcome: Option<Score>) -> Result<()> {
        let mut next = self.local.clone();
        next.matches_actual.insert(match_id.to_string(), outcome);
        self.commit(next)?;
        match outcome {
            Some(score) => info!("Local result for match {}: {}", match_id, score),
            None => info!("Local result for match {} cleared", match_id),
        }
        Ok(())
    }

    /// Drop the local entry for a match. Returns `false` if there was none.
    pub fn revert_match(&mut self, match_id: &str) -> Result<bool> {
        if !self.local.matches_actual.contains_key(match_id) {
            return Ok(false);
        }
        let mut next = self.local.clone();
        next.matches_actual.remove(match_id);
        self.commit(next)?;
        info!("Local result for match {} reverted", match_id);
        Ok(true)
    }

    pub fn set_pick_outcome(
        &mut self,
        category: PickCategory,
        key: &str,
        team: Option<String>,
    ) -> Result<()> {
        let mut next = self.local.clone();
        next.picks_actual
            .get_mut(category)
            .insert(key.to_string(), team.clone());
        self.commit(next)?;
        info!(
            "Local pick actual {}[{}] = {}",
            category,
            key,
            team.as_deref().unwrap_or("<unknown>")
        );
        Ok(())
    }

    pub fn revert_pick(&mut self, category: PickCategory, key: &str) -> Result<bool> {
        if !self.local.picks_actual.get(category).contains_key(key) {
            return Ok(false);
        }
        let mut next = self.local.clone();
        next.picks_actual.get_mut(category).remove(key);
        self.commit(next)?;
        info!("Local pick actual {}[{}] reverted", category, key);
        Ok(true)
    }

    /// Forget every local override, in storage and in memory. The shared
    /// layer is untouched.
    pub fn reset_local(&mut self) -> Result<()> {
        self.db
            .remove_state(&self.storage_key)
            .context("failed to clear local overrides")?;
        self.local = OverrideSet::default();
        self.revision += 1;
        info!("Local overrides reset");
        Ok(())
    }

    /// Replace the local layer wholesale with the overrides in `doc`.
    ///
    /// On any error the current local layer is left as it was.
    pub fn import_local(&mut self, doc: &Value) -> Result<(), ImportError> {
        let next = OverrideSet::from_document(doc)?;
        let entries = next.len();
        self.commit(next).map_err(ImportError::Persist)?;
        info!("Imported {} local override entries", entries);
        Ok(())
    }

    pub fn import_local_str(&mut self, text: &str) -> Result<(), ImportError> {
        let doc: Value = serde_json::from_str(text).map_err(ImportError::Parse)?;
        self.import_local(&doc)
    }

    /// Snapshot of the local layer with an export timestamp.
    pub fn export_local(&self) -> ExportDocument {
        ExportDocument {
            exported_at: Utc::now(),
            storage_key: self.storage_key.clone(),
            overrides: self.local.clone(),
        }
    }

    /// Persist `next` in full, then make it the live local layer.
    fn commit(&mut self, next: OverrideSet) -> Result<()> {
        let value = serde_json::to_value(&next).context("failed to serialize overrides")?;
        self.db
            .save_state(&self.storage_key, &value)
            .context("failed to persist local overrides")?;
        self.local = next;
        self.revision += 1;
        Ok(())
    }
}

fn load_local(db: &Database, storage_key: &str) -> OverrideSet {
    let raw = match db.load_raw_state(storage_key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return OverrideSet::default(),
        Err(e) => {
            warn!("Could not read local overrides, starting empty: {:#}", e);
            return OverrideSet::default();
        }
    };
    match OverrideSet::from_json_str(&raw) {
        Ok(set) => set,
        Err(e) => {
            warn!("Ignoring malformed local overrides under '{}': {}", storage_key, e);
            OverrideSet::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
