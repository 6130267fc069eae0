// Points for score predictions and bracket/position picks.

pub mod matches;
pub mod picks;

pub use matches::{match_points, summarize_match, MatchSummary};
pub use picks::{pick_breakdown, pick_points, PickPoints, PickRowDetail};
