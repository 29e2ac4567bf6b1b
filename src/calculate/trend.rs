//! Year-over-year total progression.

use std::collections::BTreeMap;

use chrono::Datelike;

use crate::models::{CompetitionResult, TrendSummary};

/// Career and recent year-over-year trends plus improvement streaks.
///
/// A year only enters the progression when at least one of its meets has a
/// complete scoresheet (total plus both lift bests); partial rows would
/// understate the year. Within a counted year the best total wins, with a
/// federation-supplied year-to-date best taking precedence over the row's
/// own total when present. Deltas are percentage changes between
/// consecutive counted years.
pub fn trend_summary(results: &[CompetitionResult]) -> TrendSummary {
    let yearly = yearly_bests(results);
    if yearly.len() < 2 {
        return TrendSummary::default();
    }

    let bests: Vec<f64> = yearly.values().map(|&b| f64::from(b)).collect();
    let deltas: Vec<f64> = bests
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0] * 100.0)
        .collect();

    let recent: &[f64] = if deltas.len() >= 2 {
        &deltas[deltas.len() - 2..]
    } else {
        &deltas
    };

    TrendSummary {
        career_trend: crate::mean(&deltas),
        recent_trend: crate::mean(recent),
        improvement_streak: trailing_positive(&deltas),
        best_streak: longest_positive_run(&deltas),
    }
}

fn yearly_bests(results: &[CompetitionResult]) -> BTreeMap<i32, u32> {
    let mut yearly = BTreeMap::new();
    for result in results {
        // Year-to-date fields stand in for the row's own values, so a
        // row carrying only YTD bests still counts.
        let total = result.best_total_ytd.or(result.total);
        let snatch = result.best_snatch_ytd.or(result.best_snatch);
        let cj = result.best_cj_ytd.or(result.best_cj);
        let (Some(best), Some(_), Some(_)) = (total, snatch, cj) else {
            continue;
        };
        yearly
            .entry(result.date.year())
            .and_modify(|b: &mut u32| *b = (*b).max(best))
            .or_insert(best);
    }
    yearly
}

/// Consecutive positive deltas ending at the most recent year.
fn trailing_positive(deltas: &[f64]) -> u32 {
    deltas.iter().rev().take_while(|&&d| d > 0.0).count() as u32
}

/// Longest run of positive deltas anywhere in the series.
fn longest_positive_run(deltas: &[f64]) -> u32 {
    let mut best = 0u32;
    let mut current = 0u32;
    for &delta in deltas {
        if delta > 0.0 {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}
