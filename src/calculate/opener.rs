//! Opener selection relative to proven ability.

use crate::models::{CompetitionResult, LiftAttempts, OpenerStrategy, OpenerSummary};

/// How aggressively the athlete opens, measured against the best lift they
/// made at their previous meet.
///
/// For each meet after the first, the opener ratio is the first-attempt
/// weight as a percentage of the prior meet's best in the same lift. Meets
/// without an opener, or following a meet with no made lift, contribute
/// nothing.
pub fn opener_summary(results: &[CompetitionResult]) -> OpenerSummary {
    let mut ordered: Vec<&CompetitionResult> = results.iter().collect();
    ordered.sort_by_key(|r| r.date);

    let mut snatch_ratios = Vec::new();
    let mut cj_ratios = Vec::new();

    for pair in ordered.windows(2) {
        let (previous, current) = (pair[0], pair[1]);
        if let Some(ratio) = opener_ratio(&current.snatch, previous.best_snatch) {
            snatch_ratios.push(ratio);
        }
        if let Some(ratio) = opener_ratio(&current.clean_jerk, previous.best_cj) {
            cj_ratios.push(ratio);
        }
    }

    let all: Vec<f64> = snatch_ratios.iter().chain(cj_ratios.iter()).copied().collect();
    let overall = crate::mean(&all);

    OpenerSummary {
        strategy: OpenerStrategy::from_average(overall),
        snatch_average: crate::mean(&snatch_ratios),
        clean_jerk_average: crate::mean(&cj_ratios),
        overall_average: overall,
    }
}

fn opener_ratio(lift: &LiftAttempts, previous_best: Option<u32>) -> Option<f64> {
    let opener = lift.first?.weight();
    let best = previous_best?;
    (best > 0).then(|| opener as f64 / best as f64 * 100.0)
}
