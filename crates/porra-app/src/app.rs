// Application state and command dispatch.
//
// Startup wires config, loaders and the local database into a `Pool`; each
// CLI command then reads or mutates that pool and renders a report.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use porra_core::db::Database;
use porra_core::leaderboard::LeaderboardOrder;
use porra_core::overrides::OverrideStore;
use porra_core::pool::{MatchFilter, PlayedFilter, Pool};
use porra_core::scalar::parse_score_input;

use crate::cli::Command;
use crate::config::Config;
use crate::loader;
use crate::report::{self, Format};

/// The complete application state for one invocation.
pub struct AppState {
    pub config: Config,
    pub pool: Pool,
    /// Whether a shared override document was found at startup.
    pub shared_loaded: bool,
}

impl AppState {
    pub fn new(config: Config, pool: Pool, shared_loaded: bool) -> Self {
        AppState {
            config,
            pool,
            shared_loaded,
        }
    }

    /// Load the dataset and shared overrides, open the local database and
    /// build the pool. A dataset failure aborts startup.
    pub async fn start(config: Config) -> Result<Self> {
        let client = reqwest::Client::new();

        let dataset = loader::load_dataset(&client, &config.dataset_source())
            .await
            .context("failed to load dataset")?;

        let shared =
            loader::load_shared_overrides(&client, config.shared_overrides_source().as_ref())
                .await;

        let db = open_database(&config.db_path)?;
        info!("Database opened at {}", config.db_path.display());

        let store = OverrideStore::open(db, config.pool.storage_key.clone(), shared.set);
        let pool = Pool::new(dataset, store);
        Ok(AppState::new(config, pool, shared.loaded))
    }

    /// Run one command, writing its report to `out`.
    pub fn handle(&mut self, command: &Command, format: Format, out: &mut dyn Write) -> Result<()> {
        match command {
            Command::Matches {
                stage,
                played,
                upcoming,
                query,
            } => {
                let filter = MatchFilter {
                    stage: *stage,
                    played: match (played, upcoming) {
                        (true, _) => PlayedFilter::Played,
                        (_, true) => PlayedFilter::Upcoming,
                        _ => PlayedFilter::All,
                    },
                    query: query.clone(),
                };
                let matches = self.pool.filter_matches(&filter);
                report::write_matches(out, &self.pool, &matches, format)
            }

            Command::Standings => report::write_standings(out, &self.pool.standings(), format),

            Command::Leaderboard { by_name } => {
                let order = if *by_name {
                    LeaderboardOrder::Name
                } else {
                    LeaderboardOrder::Points
                };
                report::write_leaderboard(out, &self.pool.leaderboard_ordered(order), format)
            }

            Command::Participant { id } => {
                let Some(participant) = self.pool.dataset().participant(id) else {
                    bail!("no participant with id `{id}`");
                };
                report::write_participant(out, &self.pool, participant, format)
            }

            Command::SetResult {
                match_id,
                home,
                away,
            } => {
                let outcome = parse_score_input(home, away)
                    .with_context(|| format!("invalid result for match `{match_id}`"))?;
                self.pool.set_match_outcome(match_id, outcome)?;
                match outcome {
                    Some(score) => writeln!(out, "{match_id}: {score} ({})", score.sign())?,
                    None => writeln!(out, "{match_id}: sin resultado")?,
                }
                Ok(())
            }

            Command::RevertResult { match_id } => {
                if self.pool.revert_match(match_id)? {
                    let shown = self
                        .pool
                        .resolve_match(match_id)
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "sin resultado".into());
                    writeln!(out, "{match_id}: override local eliminado ({shown})")?;
                } else {
                    writeln!(out, "{match_id}: no había override local")?;
                }
                Ok(())
            }

            Command::SetPick {
                category,
                key,
                team,
            } => {
                let team = team
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string);
                self.pool.set_pick_outcome(*category, key, team.clone())?;
                writeln!(
                    out,
                    "{category} {key}: {}",
                    team.as_deref().unwrap_or("sin definir")
                )?;
                Ok(())
            }

            Command::RevertPick { category, key } => {
                if self.pool.revert_pick(*category, key)? {
                    writeln!(out, "{category} {key}: override local eliminado")?;
                } else {
                    writeln!(out, "{category} {key}: no había override local")?;
                }
                Ok(())
            }

            Command::Export { out: target } => {
                let json = self.pool.export_local().to_json_pretty()?;
                match target {
                    Some(path) => {
                        std::fs::write(path, format!("{json}\n"))
                            .with_context(|| format!("failed to write {}", path.display()))?;
                        info!("Exported local overrides to {}", path.display());
                        writeln!(out, "Exportado a {}", path.display())?;
                    }
                    None => writeln!(out, "{json}")?,
                }
                Ok(())
            }

            Command::Import { file } => {
                let text = std::fs::read_to_string(file)
                    .with_context(|| format!("failed to read {}", file.display()))?;
                self.pool
                    .import_local_str(&text)
                    .with_context(|| format!("failed to import {}", file.display()))?;
                writeln!(
                    out,
                    "Importados {} overrides locales",
                    self.pool.store().local().len()
                )?;
                Ok(())
            }

            Command::Reset => {
                self.pool.reset_local()?;
                writeln!(out, "Overrides locales eliminados")?;
                Ok(())
            }

            Command::Info => self.write_info(out),
        }
    }

    fn write_info(&self, out: &mut dyn Write) -> Result<()> {
        let dataset = self.pool.dataset();
        let store = self.pool.store();
        let played = dataset
            .matches
            .iter()
            .filter(|m| self.pool.resolve_match(&m.id).is_some())
            .count();

        writeln!(out, "{}", self.config.pool.name)?;
        writeln!(out, "{}", report::meta_line(&self.pool, self.shared_loaded))?;
        writeln!(out, "Participantes: {}", dataset.participants.len())?;
        writeln!(out, "Partidos: {} ({} jugados)", dataset.matches.len(), played)?;
        writeln!(out, "Overrides compartidos: {}", store.shared().len())?;
        writeln!(out, "Overrides locales: {}", store.local().len())?;
        writeln!(out, "Clave de almacenamiento: {}", store.storage_key())?;
        writeln!(out, "Base de datos: {}", self.config.db_path.display())?;
        Ok(())
    }
}

fn open_database(path: &Path) -> Result<Database> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Database::open(&path.to_string_lossy()).context("failed to open database")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DataConfig, PoolConfig};
    use porra_core::model::{Dataset, PickCategory, Stage};
    use porra_core::overrides::OverrideSet;
    use porra_core::scalar::Score;
    use serde_json::json;
    use std::path::PathBuf;

    fn state() -> AppState {
        let dataset: Dataset = serde_json::from_value(json!({
            "participants": [{"id": 1, "name": "Ana"}, {"id": 2, "name": "Bruno"}],
            "matches": [
                {"id": "L1", "stage": "league", "matchday": 1, "home": "Arsenal", "away": "Inter",
                 "actual": {"home": 2, "away": 1},
                 "predictions": {"1": {"home": 2, "away": 1}}},
                {"id": "F", "stage": "final", "home": "Arsenal", "away": "PSG",
                 "predictions": {"2": {"home": 0, "away": 1}}}
            ],
            "picks": {
                "positions": [{"position": 1, "picks": {"1": "Arsenal", "2": "PSG"}}],
                "octavosFromLeague": [],
                "playoffsTeams": []
            },
            "rules": {
                "matchScoring": {"FASE DE LIGA": {"signPoints": 1, "exactBonusPoints": 2}},
                "pickScoring": {"positionExactPoints": 5}
            }
        }))
        .unwrap();
        let db = Database::open(":memory:").unwrap();
        let pool = Pool::new(dataset, OverrideStore::open(db, "app_test", OverrideSet::default()));
        let config = Config {
            pool: PoolConfig {
                name: "Porra Test".into(),
                storage_key: "app_test".into(),
            },
            data: DataConfig {
                dataset: "data.json".into(),
                shared_overrides: None,
            },
            db_path: PathBuf::from(":memory:"),
            base_dir: PathBuf::from("."),
        };
        AppState::new(config, pool, false)
    }

    fn run(app: &mut AppState, command: Command) -> Result<String> {
        let mut buf: Vec<u8> = Vec::new();
        app.handle(&command, Format::Text, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap())
    }

    #[test]
    fn set_result_then_revert() {
        let mut app = state();
        let text = run(
            &mut app,
            Command::SetResult {
                match_id: "F".into(),
                home: "0".into(),
                away: " 1 ".into(),
            },
        )
        .unwrap();
        assert_eq!(text, "F: 0-1 (2)\n");
        assert_eq!(app.pool.resolve_match("F"), Some(Score::new(0, 1)));

        let text = run(&mut app, Command::RevertResult { match_id: "F".into() }).unwrap();
        assert_eq!(text, "F: override local eliminado (sin resultado)\n");
        let text = run(&mut app, Command::RevertResult { match_id: "F".into() }).unwrap();
        assert_eq!(text, "F: no había override local\n");
    }

    #[test]
    fn empty_result_clears_and_half_result_is_rejected() {
        let mut app = state();
        run(
            &mut app,
            Command::SetResult {
                match_id: "L1".into(),
                home: "".into(),
                away: "".into(),
            },
        )
        .unwrap();
        assert_eq!(app.pool.resolve_match("L1"), None);

        let err = run(
            &mut app,
            Command::SetResult {
                match_id: "L1".into(),
                home: "3".into(),
                away: "".into(),
            },
        );
        assert!(err.is_err());
        assert_eq!(app.pool.resolve_match("L1"), None, "rejected input changes nothing");
    }

    #[test]
    fn set_pick_with_blank_team_means_unknown() {
        let mut app = state();
        run(
            &mut app,
            Command::SetPick {
                category: PickCategory::Positions,
                key: "1".into(),
                team: Some("Arsenal".into()),
            },
        )
        .unwrap();
        assert_eq!(app.pool.pick_points("1").total, 5);

        let text = run(
            &mut app,
            Command::SetPick {
                category: PickCategory::Positions,
                key: "1".into(),
                team: Some("  ".into()),
            },
        )
        .unwrap();
        assert_eq!(text, "positions 1: sin definir\n");
        assert_eq!(app.pool.resolve_pick(PickCategory::Positions, "1"), None);
        assert_eq!(
            app.pool.store().local().pick_entry(PickCategory::Positions, "1"),
            Some(None)
        );
    }

    #[test]
    fn unknown_participant_is_an_error() {
        let mut app = state();
        assert!(run(&mut app, Command::Participant { id: "9".into() }).is_err());
        assert!(run(&mut app, Command::Participant { id: "1".into() }).is_ok());
    }

    #[test]
    fn export_import_reset_cycle() {
        let mut app = state();
        run(
            &mut app,
            Command::SetResult {
                match_id: "F".into(),
                home: "0".into(),
                away: "1".into(),
            },
        )
        .unwrap();

        let path = std::env::temp_dir().join("porra_app_test_export.json");
        let _ = std::fs::remove_file(&path);
        run(&mut app, Command::Export { out: Some(path.clone()) }).unwrap();

        run(&mut app, Command::Reset).unwrap();
        assert_eq!(app.pool.resolve_match("F"), None);

        let text = run(&mut app, Command::Import { file: path.clone() }).unwrap();
        assert_eq!(text, "Importados 1 overrides locales\n");
        assert_eq!(app.pool.resolve_match("F"), Some(Score::new(0, 1)));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn matches_filter_flags() {
        let mut app = state();
        let text = run(
            &mut app,
            Command::Matches {
                stage: Some(Stage::Final),
                played: false,
                upcoming: true,
                query: None,
            },
        )
        .unwrap();
        assert!(text.contains("PSG"));
        assert!(!text.contains("Inter"));
    }

    #[test]
    fn info_reports_counts() {
        let mut app = state();
        let text = run(&mut app, Command::Info).unwrap();
        assert!(text.starts_with("Porra Test\n"));
        assert!(text.contains("Datos cargados · Overrides compartidos: no"));
        assert!(text.contains("Partidos: 2 (1 jugados)"));
        assert!(text.contains("Overrides locales: 0"));
    }
}
