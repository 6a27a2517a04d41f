//! Health score computation

use crate::types::{AuditIssue, ScanStats, Severity};

/// Score ceiling, reached when no check raised an issue
pub const MAX_SCORE: u32 = 100;

/// Stats and score derived from an issue list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreCard {
    pub stats: ScanStats,
    pub score: u8,
}

/// Tally `issues` by severity and deduct their weights from 100.
///
/// Info issues are counted but cost nothing and don't fail a check.
pub fn score_issues(issues: &[AuditIssue], total_checks: usize) -> ScoreCard {
    let mut stats = ScanStats {
        total_checks,
        ..ScanStats::default()
    };
    let mut deductions: u32 = 0;

    for issue in issues {
        match issue.severity {
            Severity::Critical => stats.critical += 1,
            Severity::High => stats.high += 1,
            Severity::Medium => stats.medium += 1,
            Severity::Low => stats.low += 1,
            Severity::Info => stats.info += 1,
        }
        deductions = deductions.saturating_add(issue.severity.weight());
    }

    stats.passed_checks = total_checks.saturating_sub(stats.failures());
    let score = MAX_SCORE.saturating_sub(deductions);

    ScoreCard {
        stats,
        score: u8::try_from(score).unwrap_or(0),
    }
}
