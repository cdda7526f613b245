use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::stats::MergedUserSummary;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to read or write report file: {0}")]
    File(#[from] std::io::Error),

    #[error("Failed to encode or decode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write any pipeline result as pretty JSON, to stdout by default or to a
/// file when a path is given. Logging goes to stderr, so stdout stays a
/// clean JSON document either way.
#[instrument(skip(value))]
pub fn output<T: Serialize>(value: &T, output_path: Option<&Path>) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(value)?;
    match output_path {
        None => {
            println!("{json}");
        }
        Some(path) => {
            debug!(path = %path.display(), "writing JSON output");
            std::fs::write(path, json)?;
        }
    }
    Ok(())
}

/// Load a previously captured summary from a JSON file, bypassing the
/// network entirely. The offline counterpart of `build_summary`.
pub fn load_summary(path: &Path) -> Result<Vec<MergedUserSummary>, ReportError> {
    let contents = std::fs::read_to_string(path)?;
    let summary = serde_json::from_str(&contents)?;
    Ok(summary)
}

/// Render the summary as a colored per-developer leaderboard.
pub fn print_leaderboard(summary: &[MergedUserSummary]) {
    println!();
    println!("═══ Team activity: {} developers ═══", summary.len());
    println!();
    for record in summary {
        println!("{}", record.user.bold());
        println!(
            "  PRs: {} merged | {} closed unmerged | {} open",
            record.closed_prs.total_merged_prs.to_string().green(),
            record.closed_prs.total_closed_not_merged_prs.to_string().red(),
            record.open_prs.total_open_prs.to_string().yellow(),
        );
        println!(
            "  Avg time to merge: {} | avg open for: {}",
            format_duration_ms(record.closed_prs.average_time_to_merge),
            format_duration_ms(record.open_prs.average_open_pr_duration),
        );
        println!(
            "  Commits: {} (+{} / -{}) over {} weeks",
            record.commits.totals.commits,
            record.commits.totals.additions,
            record.commits.totals.deletions,
            record.commits.weeks.len(),
        );
        println!();
    }
}

/// Render a millisecond duration as the largest sensible unit.
fn format_duration_ms(ms: f64) -> String {
    const HOUR: f64 = 3_600_000.0;
    const DAY: f64 = 24.0 * HOUR;
    if ms <= 0.0 {
        "n/a".to_string()
    } else if ms >= DAY {
        format!("{:.1}d", ms / DAY)
    } else if ms >= HOUR {
        format!("{:.1}h", ms / HOUR)
    } else {
        format!("{:.0}m", ms / 60_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::types::{
        ClosedPrSummary, CommitSummary, CommitTotals, ContributorWeekStat, OpenPrSummary,
    };

    fn sample_summary() -> Vec<MergedUserSummary> {
        vec![MergedUserSummary {
            user: "alice".to_string(),
            closed_prs: ClosedPrSummary {
                total_merged_prs: 2,
                total_closed_not_merged_prs: 1,
                average_time_to_merge: 3_600_000.0,
                average_time_to_close_not_merged: 7_200_000.0,
            },
            open_prs: OpenPrSummary {
                total_open_prs: 1,
                average_open_pr_duration: 90_000_000.0,
            },
            commits: CommitSummary {
                weeks: vec![ContributorWeekStat {
                    week_epoch_seconds: 1_000_000,
                    additions: 10,
                    deletions: 2,
                    commits: 3,
                }],
                totals: CommitTotals {
                    additions: 10,
                    deletions: 2,
                    commits: 3,
                },
            },
        }]
    }

    #[test]
    fn test_output_then_load_round_trips() {
        let summary = sample_summary();
        let path = std::env::temp_dir().join("team_pulse_test_summary.json");
        output(&summary, Some(&path)).unwrap();

        let loaded = load_summary(&path).unwrap();
        assert_eq!(loaded, summary);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_summary_rejects_non_summary_json() {
        let path = std::env::temp_dir().join("team_pulse_test_bad.json");
        std::fs::write(&path, r#"{"not": "a summary"}"#).unwrap();
        assert!(matches!(load_summary(&path), Err(ReportError::Json(_))));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_format_duration_units() {
        assert_eq!(format_duration_ms(0.0), "n/a");
        assert_eq!(format_duration_ms(120_000.0), "2m");
        assert_eq!(format_duration_ms(5_400_000.0), "1.5h");
        assert_eq!(format_duration_ms(129_600_000.0), "1.5d");
    }

    #[test]
    fn test_leaderboard_does_not_panic() {
        print_leaderboard(&sample_summary());
        print_leaderboard(&[]);
    }

    #[test]
    fn test_output_to_stdout() {
        output(&sample_summary(), None).unwrap();
    }
}
