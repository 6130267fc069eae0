// Scoring and override-resolution engine for a football prediction pool.
//
// The base dataset is read-only; results and pick actuals can be overridden
// by a shared layer and by a locally persisted layer. Every score, table and
// ranking is derived from the resolved view on demand.

pub mod collate;
pub mod db;
pub mod leaderboard;
pub mod model;
pub mod overrides;
pub mod pool;
pub mod scalar;
pub mod scoring;
pub mod standings;

pub use leaderboard::{LeaderboardEntry, LeaderboardOrder};
pub use model::{Dataset, Match, Participant, PickCategory, PickRow, Rules, Stage};
pub use overrides::{ExportDocument, ImportError, OverrideSet, OverrideStore};
pub use pool::{DerivedViews, MatchFilter, PlayedFilter, Pool};
pub use scalar::{Score, Sign};
pub use standings::StandingRow;
