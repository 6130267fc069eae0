// Participant ranking: match points plus pick points.

use serde::Serialize;

use crate::collate;
use crate::model::Participant;
use crate::scoring::PickPoints;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    /// 1-based rank in the current ordering.
    pub rank: usize,
    pub participant_id: String,
    pub name: String,
    pub match_points: u32,
    pub picks: PickPoints,
    pub total: u32,
}

/// How a computed leaderboard is ordered for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LeaderboardOrder {
    /// Total descending, ties by name.
    #[default]
    Points,
    /// Name only; totals are kept as computed.
    Name,
}

/// Score every participant and rank them by total.
///
/// `match_points` must return the participant's sum over all matches of
/// every stage, `pick_points` their pick totals.
pub fn compute_leaderboard<M, P>(
    participants: &[Participant],
    match_points: M,
    pick_points: P,
) -> Vec<LeaderboardEntry>
where
    M: Fn(&Participant) -> u32,
    P: Fn(&Participant) -> PickPoints,
{
    let entries = participants
        .iter()
        .map(|p| {
            let matches = match_points(p);
            let picks = pick_points(p);
            LeaderboardEntry {
                rank: 0,
                participant_id: p.id.clone(),
                name: p.name.clone(),
                match_points: matches,
                picks,
                total: matches.saturating_add(picks.total),
            }
        })
        .collect();
    reorder(entries, LeaderboardOrder::Points)
}

/// Sort already-scored entries and reassign ranks. Never recomputes points.
pub fn reorder(mut entries: Vec<LeaderboardEntry>, order: LeaderboardOrder) -> Vec<LeaderboardEntry> {
    match order {
        LeaderboardOrder::Points => entries.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| collate::compare(&a.name, &b.name))
        }),
        LeaderboardOrder::Name => entries.sort_by(|a, b| collate::compare(&a.name, &b.name)),
    }
    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.rank = idx + 1;
    }
    entries
}
