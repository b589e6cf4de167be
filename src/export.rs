use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use tracing::info;

use crate::model::Event;
use crate::reporter::PlayerStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub singles: usize,
    pub doubles: usize,
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create report dir {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("serialize report")?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "json report written");
    Ok(())
}

/// Writes one worksheet per event. Players without games in an event are
/// left off that event's sheet.
pub fn export_stats_xlsx(path: &Path, stats: &[PlayerStats]) -> Result<ExportReport> {
    let singles_rows = stats_rows(stats, Event::Singles);
    let doubles_rows = stats_rows(stats, Event::Doubles);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Singles")?;
        write_rows(sheet, &singles_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Doubles")?;
        write_rows(sheet, &doubles_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    let report = ExportReport {
        singles: singles_rows.len().saturating_sub(1),
        doubles: doubles_rows.len().saturating_sub(1),
    };
    info!(path = %path.display(), ?report, "workbook written");
    Ok(report)
}

fn stats_rows(stats: &[PlayerStats], event: Event) -> Vec<Vec<String>> {
    let mut rows = vec![
        [
            "rank",
            "name",
            "team",
            "section",
            "type",
            "competition",
            "played",
            "won",
            "lost",
            "score_for",
            "score_against",
            "percentage",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>(),
    ];
    rows.extend(
        stats
            .iter()
            .filter(|s| s.event(event).games_played > 0)
            .map(|s| player_row(s, event)),
    );
    rows
}

fn player_row(stats: &PlayerStats, event: Event) -> Vec<String> {
    let summary = stats.event(event);
    vec![
        opt_to_string(stats.rank),
        stats.profile.name.clone(),
        stats.profile.team.clone(),
        stats.profile.section.clone(),
        stats.profile.comp_type.clone(),
        stats.profile.comp_string.clone(),
        summary.games_played.to_string(),
        summary.games_won.to_string(),
        summary.games_lost.to_string(),
        summary.score_for.to_string(),
        summary.score_against.to_string(),
        format!("{:.2}", summary.percentage),
    ]
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
