// Plain-text and CSV rendering of pool views.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

use porra_core::leaderboard::LeaderboardEntry;
use porra_core::model::{Match, Participant};
use porra_core::pool::Pool;
use porra_core::scalar::Score;
use porra_core::scoring::MatchSummary;
use porra_core::standings::StandingRow;

/// Output format for every report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Csv,
}

// ---------------------------------------------------------------------------
// Text tables
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

/// Fixed-width table with per-column alignment.
struct TextTable {
    headers: Vec<&'static str>,
    align: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    fn new(columns: &[(&'static str, Align)]) -> Self {
        TextTable {
            headers: columns.iter().map(|(h, _)| *h).collect(),
            align: columns.iter().map(|(_, a)| *a).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn write_to(&self, out: &mut dyn Write) -> Result<()> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (idx, cell) in row.iter().enumerate() {
                widths[idx] = widths[idx].max(cell.chars().count());
            }
        }

        let header: Vec<String> = self.headers.iter().map(|h| h.to_string()).collect();
        self.write_line(out, &header, &widths)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        self.write_line(out, &rule, &widths)?;
        for row in &self.rows {
            self.write_line(out, row, &widths)?;
        }
        Ok(())
    }

    fn write_line(&self, out: &mut dyn Write, cells: &[String], widths: &[usize]) -> Result<()> {
        let mut line = String::new();
        for (idx, cell) in cells.iter().enumerate() {
            if idx > 0 {
                line.push_str("  ");
            }
            let pad = widths[idx].saturating_sub(cell.chars().count());
            match self.align[idx] {
                Align::Left => {
                    line.push_str(cell);
                    line.push_str(&" ".repeat(pad));
                }
                Align::Right => {
                    line.push_str(&" ".repeat(pad));
                    line.push_str(cell);
                }
            }
        }
        writeln!(out, "{}", line.trim_end()).context("failed to write report")
    }
}

fn score_cell(score: Option<Score>) -> String {
    score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())
}

fn signed(value: i64) -> String {
    if value > 0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

fn write_csv<T: Serialize>(out: &mut dyn Write, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row).context("failed to write CSV row")?;
    }
    writer.flush().context("failed to flush CSV output")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

pub fn write_standings(out: &mut dyn Write, rows: &[StandingRow], format: Format) -> Result<()> {
    if format == Format::Csv {
        return write_csv(out, rows);
    }

    let mut table = TextTable::new(&[
        ("#", Align::Right),
        ("Equipo", Align::Left),
        ("Pts", Align::Right),
        ("PJ", Align::Right),
        ("G", Align::Right),
        ("E", Align::Right),
        ("P", Align::Right),
        ("GF", Align::Right),
        ("GC", Align::Right),
        ("DG", Align::Right),
    ]);
    for r in rows {
        table.push(vec![
            r.position.to_string(),
            r.team.clone(),
            r.points.to_string(),
            r.played.to_string(),
            r.won.to_string(),
            r.drawn.to_string(),
            r.lost.to_string(),
            r.goals_for.to_string(),
            r.goals_against.to_string(),
            signed(r.goal_difference),
        ]);
    }
    table.write_to(out)
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

/// Flat CSV shape of a leaderboard entry.
#[derive(Serialize)]
struct LeaderboardCsvRow<'a> {
    rank: usize,
    participant_id: &'a str,
    name: &'a str,
    match_points: u32,
    position_points: u32,
    bracket_from_league_points: u32,
    bracket_team_points: u32,
    pick_points: u32,
    total: u32,
}

pub fn write_leaderboard(
    out: &mut dyn Write,
    entries: &[LeaderboardEntry],
    format: Format,
) -> Result<()> {
    if format == Format::Csv {
        let rows: Vec<LeaderboardCsvRow> = entries
            .iter()
            .map(|e| LeaderboardCsvRow {
                rank: e.rank,
                participant_id: &e.participant_id,
                name: &e.name,
                match_points: e.match_points,
                position_points: e.picks.position_points,
                bracket_from_league_points: e.picks.bracket_from_league_points,
                bracket_team_points: e.picks.bracket_team_points,
                pick_points: e.picks.total,
                total: e.total,
            })
            .collect();
        return write_csv(out, &rows);
    }

    let mut table = TextTable::new(&[
        ("#", Align::Right),
        ("Participante", Align::Left),
        ("Partidos", Align::Right),
        ("Posiciones", Align::Right),
        ("Octavos", Align::Right),
        ("Playoffs", Align::Right),
        ("Total", Align::Right),
    ]);
    for e in entries {
        table.push(vec![
            e.rank.to_string(),
            e.name.clone(),
            e.match_points.to_string(),
            e.picks.position_points.to_string(),
            e.picks.bracket_from_league_points.to_string(),
            e.picks.bracket_team_points.to_string(),
            e.total.to_string(),
        ]);
    }
    table.write_to(out)
}

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct MatchCsvRow {
    id: String,
    stage: &'static str,
    matchday: Option<u32>,
    kickoff: String,
    home: String,
    away: String,
    result: String,
    sign: String,
    summary: String,
}

fn kickoff_cell(m: &Match) -> String {
    match m.kickoff() {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%d/%m/%Y %H:%M")
            .to_string(),
        None => m.datetime.clone().unwrap_or_default(),
    }
}

fn summary_cell(summary: &MatchSummary) -> String {
    match summary {
        MatchSummary::Pending => "Pendiente".to_string(),
        MatchSummary::Played {
            max_points,
            leaders,
            exact_count,
        } => format!(
            "Máx: {} ({}) · Exactos: {}",
            max_points,
            leaders.join(", "),
            exact_count
        ),
    }
}

/// List `matches` with their resolved result and per-match summary.
pub fn write_matches(
    out: &mut dyn Write,
    pool: &Pool,
    matches: &[&Match],
    format: Format,
) -> Result<()> {
    let rows: Vec<MatchCsvRow> = matches
        .iter()
        .map(|m| {
            let actual = pool.resolve_match(&m.id);
            MatchCsvRow {
                id: m.id.clone(),
                stage: m.stage.display_label(),
                matchday: m.matchday,
                kickoff: kickoff_cell(m),
                home: m.home.clone(),
                away: m.away.clone(),
                result: score_cell(actual),
                sign: actual.map(|s| s.sign().symbol().to_string()).unwrap_or_default(),
                summary: summary_cell(&pool.match_summary(m)),
            }
        })
        .collect();

    if format == Format::Csv {
        return write_csv(out, &rows);
    }

    let mut table = TextTable::new(&[
        ("Id", Align::Left),
        ("Fase", Align::Left),
        ("J", Align::Right),
        ("Fecha", Align::Left),
        ("Local", Align::Left),
        ("Visitante", Align::Left),
        ("Res", Align::Right),
        ("1X2", Align::Right),
        ("Resumen", Align::Left),
    ]);
    for r in rows {
        table.push(vec![
            r.id,
            r.stage.to_string(),
            r.matchday.map(|d| d.to_string()).unwrap_or_default(),
            r.kickoff,
            r.home,
            r.away,
            r.result,
            r.sign,
            r.summary,
        ]);
    }
    table.write_to(out)
}

// ---------------------------------------------------------------------------
// Participant detail
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ParticipantCsvRow {
    kind: &'static str,
    group: String,
    key: String,
    detail: String,
    actual: String,
    pick: String,
    points: u32,
}

/// Per-match and per-pick breakdown for one participant.
pub fn write_participant(
    out: &mut dyn Write,
    pool: &Pool,
    participant: &Participant,
    format: Format,
) -> Result<()> {
    let matches = pool.participant_matches(&participant.id);
    let picks = pool.pick_breakdown(&participant.id);

    if format == Format::Csv {
        let mut rows: Vec<ParticipantCsvRow> = matches
            .iter()
            .map(|r| ParticipantCsvRow {
                kind: "match",
                group: r.stage.key().to_string(),
                key: r.match_id.clone(),
                detail: format!("{} - {}", r.home, r.away),
                actual: r.actual.map(|s| s.to_string()).unwrap_or_default(),
                pick: r.prediction.map(|s| s.to_string()).unwrap_or_default(),
                points: r.points,
            })
            .collect();
        rows.extend(picks.iter().map(|p| ParticipantCsvRow {
            kind: "pick",
            group: p.category.key().to_string(),
            key: p.key.clone(),
            detail: String::new(),
            actual: p.actual.clone().unwrap_or_default(),
            pick: p.pick.clone().unwrap_or_default(),
            points: p.points,
        }));
        return write_csv(out, &rows);
    }

    let match_total = matches.iter().map(|r| r.points).fold(0u32, u32::saturating_add);
    let pick_total = picks.iter().map(|p| p.points).fold(0u32, u32::saturating_add);
    writeln!(out, "{} (id {})", participant.name, participant.id)?;
    writeln!(out)?;

    let mut table = TextTable::new(&[
        ("Id", Align::Left),
        ("Fase", Align::Left),
        ("Partido", Align::Left),
        ("Res", Align::Right),
        ("Pron", Align::Right),
        ("Pts", Align::Right),
    ]);
    for r in &matches {
        table.push(vec![
            r.match_id.clone(),
            r.stage.display_label().to_string(),
            format!("{} - {}", r.home, r.away),
            score_cell(r.actual),
            score_cell(r.prediction),
            r.points.to_string(),
        ]);
    }
    table.write_to(out)?;
    writeln!(out)?;

    let mut table = TextTable::new(&[
        ("Categoría", Align::Left),
        ("Clave", Align::Left),
        ("Real", Align::Left),
        ("Pick", Align::Left),
        ("Pts", Align::Right),
    ]);
    for p in &picks {
        table.push(vec![
            p.category.display_label().to_string(),
            p.key.clone(),
            p.actual.clone().unwrap_or_else(|| "-".into()),
            p.pick.clone().unwrap_or_else(|| "-".into()),
            p.points.to_string(),
        ]);
    }
    table.write_to(out)?;
    writeln!(out)?;
    writeln!(
        out,
        "Partidos: {}  Picks: {}  Total: {}",
        match_total,
        pick_total,
        match_total.saturating_add(pick_total)
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Meta line
// ---------------------------------------------------------------------------

/// One-line description of where the data came from.
pub fn meta_line(pool: &Pool, shared_loaded: bool) -> String {
    let meta = &pool.dataset().meta;
    let source = match meta.source_file.as_deref() {
        Some(file) if !file.is_empty() => format!("Datos: {file}"),
        _ => "Datos cargados".to_string(),
    };
    let generated = meta.generated_at.as_deref().filter(|g| !g.is_empty()).map(|raw| {
        let shown = DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Local).format("%d/%m/%Y %H:%M:%S").to_string())
            .unwrap_or_else(|_| raw.to_string());
        format!("Generado: {shown}")
    });
    let shared = if shared_loaded {
        "Overrides compartidos: sí"
    } else {
        "Overrides compartidos: no"
    };

    let mut parts = vec![source];
    parts.extend(generated);
    parts.push(shared.to_string());
    parts.join(" · ")
}
