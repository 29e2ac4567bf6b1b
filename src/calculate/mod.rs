//! Metrics extraction engine.
//!
//! Computes an [`AthleteMetrics`] profile from one athlete's competition
//! results: success rates, consistency, clutch and bounce-back rates,
//! attempt jumps, career trends, and opener strategy. Pure computation over
//! already-fetched rows; no I/O, no failure modes beyond "no data".

pub mod opener;
pub mod trend;

use chrono::Datelike;

use crate::models::{
    Attempt, AthleteMetrics, AttemptJumps, AttemptRates, BounceBackRates, CompetitionResult,
    ConsistencyScore, JumpAverages, LiftAttempts, QScoreSummary, QScoreVariant, SuccessRates,
};

fn is_good(attempt: Option<Attempt>) -> bool {
    attempt.is_some_and(|a| a.is_good())
}

/// Success rate over a set of attempts, as a percentage.
///
/// Only attempts actually taken count toward the denominator; `None` when
/// nothing was taken at all (no data, not 0%).
pub fn success_rate(attempts: &[Option<Attempt>]) -> Option<f64> {
    let valid: Vec<Attempt> = attempts.iter().copied().flatten().collect();
    if valid.is_empty() {
        return None;
    }
    let good = valid.iter().filter(|a| a.is_good()).count();
    Some(good as f64 / valid.len() as f64 * 100.0)
}

/// Overall, per-lift, and per-attempt-number success rates.
pub fn success_rates(results: &[CompetitionResult]) -> SuccessRates {
    let snatch: Vec<Option<Attempt>> = results
        .iter()
        .flat_map(|r| r.snatch.as_array())
        .collect();
    let clean_jerk: Vec<Option<Attempt>> = results
        .iter()
        .flat_map(|r| r.clean_jerk.as_array())
        .collect();
    let all: Vec<Option<Attempt>> = snatch.iter().chain(clean_jerk.iter()).copied().collect();

    SuccessRates {
        overall: success_rate(&all),
        snatch: success_rate(&snatch),
        clean_jerk: success_rate(&clean_jerk),
        snatch_by_attempt: attempt_rates(results, |r| &r.snatch),
        clean_jerk_by_attempt: attempt_rates(results, |r| &r.clean_jerk),
    }
}

fn attempt_rates<F>(results: &[CompetitionResult], lift: F) -> AttemptRates
where
    F: Fn(&CompetitionResult) -> &LiftAttempts,
{
    let column = |pick: fn(&LiftAttempts) -> Option<Attempt>| -> Option<f64> {
        let attempts: Vec<Option<Attempt>> = results.iter().map(|r| pick(lift(r))).collect();
        success_rate(&attempts)
    };

    AttemptRates {
        first: column(|l| l.first),
        second: column(|l| l.second),
        third: column(|l| l.third),
    }
}

/// Consistency from total-lift values across meets: `100 - CoV`, floored
/// at 0, where CoV is the population coefficient of variation. Defined as
/// 100 with fewer than two values.
pub fn consistency(totals: &[f64]) -> ConsistencyScore {
    if totals.len() < 2 {
        return ConsistencyScore {
            score: 100.0,
            coefficient_of_variation: 0.0,
        };
    }

    let n = totals.len() as f64;
    let mean = totals.iter().sum::<f64>() / n;
    let variance = totals.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n;
    let cov = variance.sqrt() / mean * 100.0;

    ConsistencyScore {
        score: (100.0 - cov).max(0.0),
        coefficient_of_variation: cov,
    }
}

/// Success rate on must-make third attempts taken after neither of the
/// first two succeeded, across both lifts. `None` when the situation never
/// arose.
pub fn clutch_rate(results: &[CompetitionResult]) -> Option<f64> {
    let mut situations = 0u32;
    let mut successes = 0u32;

    for result in results {
        for lift in [&result.snatch, &result.clean_jerk] {
            if !is_good(lift.first) && !is_good(lift.second) && lift.third.is_some() {
                situations += 1;
                if is_good(lift.third) {
                    successes += 1;
                }
            }
        }
    }

    (situations > 0).then(|| successes as f64 / situations as f64 * 100.0)
}

/// Recovery rate on second attempts taken after a failed opener, per lift.
pub fn bounce_back_rates(results: &[CompetitionResult]) -> BounceBackRates {
    BounceBackRates {
        snatch: lift_bounce_back(results.iter().map(|r| &r.snatch)),
        clean_jerk: lift_bounce_back(results.iter().map(|r| &r.clean_jerk)),
    }
}

/// Bounce-back rate with both lifts pooled into one denominator.
pub fn overall_bounce_back(results: &[CompetitionResult]) -> Option<f64> {
    lift_bounce_back(results.iter().flat_map(|r| [&r.snatch, &r.clean_jerk]))
}

fn lift_bounce_back<'a>(lifts: impl Iterator<Item = &'a LiftAttempts>) -> Option<f64> {
    let mut situations = 0u32;
    let mut successes = 0u32;

    for lift in lifts {
        if !is_good(lift.first) && lift.second.is_some() {
            situations += 1;
            if is_good(lift.second) {
                successes += 1;
            }
        }
    }

    (situations > 0).then(|| successes as f64 / situations as f64 * 100.0)
}

/// Average weight deltas between consecutive attempts, per lift. Uses bar
/// weight magnitudes only; make/miss is irrelevant to the jump size.
pub fn attempt_jumps(results: &[CompetitionResult]) -> AttemptJumps {
    AttemptJumps {
        snatch: lift_jumps(results.iter().map(|r| &r.snatch)),
        clean_jerk: lift_jumps(results.iter().map(|r| &r.clean_jerk)),
    }
}

fn lift_jumps<'a>(lifts: impl Iterator<Item = &'a LiftAttempts>) -> JumpAverages {
    let mut first_to_second = Vec::new();
    let mut second_to_third = Vec::new();
    let mut ranges = Vec::new();

    for lift in lifts {
        let delta = |a: Option<Attempt>, b: Option<Attempt>| -> Option<f64> {
            Some(b?.weight() as f64 - a?.weight() as f64)
        };
        if let Some(d) = delta(lift.first, lift.second) {
            first_to_second.push(d);
        }
        if let Some(d) = delta(lift.second, lift.third) {
            second_to_third.push(d);
        }
        if let Some(d) = delta(lift.first, lift.third) {
            ranges.push(d);
        }
    }

    JumpAverages {
        first_to_second: crate::mean(&first_to_second),
        second_to_third: crate::mean(&second_to_third),
        full_range: crate::mean(&ranges),
    }
}

fn q_score_summary(results: &[CompetitionResult]) -> QScoreSummary {
    let scores: Vec<f64> = results.iter().flat_map(|r| r.q_scores()).collect();
    let best = scores.iter().copied().fold(None, |acc: Option<f64>, q| {
        Some(acc.map_or(q, |b| b.max(q)))
    });

    let best_variant = best.and_then(|best| {
        results.iter().find_map(|r| {
            if r.q_youth == Some(best) {
                Some(QScoreVariant::QYouth)
            } else if r.q_masters == Some(best) {
                Some(QScoreVariant::QMasters)
            } else if r.qpoints == Some(best) {
                Some(QScoreVariant::Qpoints)
            } else {
                None
            }
        })
    });

    QScoreSummary {
        best,
        average: crate::mean(&scores),
        best_variant,
    }
}

/// Compute the full profile for one athlete.
///
/// Input order is irrelevant. Returns `None` for an empty result list;
/// individual metrics degrade to `None`/defaults on their own when the
/// data they need is absent.
pub fn extract_metrics(results: &[CompetitionResult]) -> Option<AthleteMetrics> {
    if results.is_empty() {
        return None;
    }

    let totals: Vec<f64> = results.iter().filter_map(|r| r.total).map(f64::from).collect();

    let years: Vec<i32> = results.iter().map(|r| r.date.year()).collect();
    let min_year = *years.iter().min().expect("non-empty");
    let max_year = *years.iter().max().expect("non-empty");
    let years_active = (max_year - min_year + 1) as u32;
    let competition_frequency = results.len() as f64 / years_active as f64;

    Some(AthleteMetrics {
        success: success_rates(results),
        consistency: consistency(&totals),
        clutch_rate: clutch_rate(results),
        bounce_back: bounce_back_rates(results),
        jumps: attempt_jumps(results),
        total_competitions: results.len() as u32,
        years_active,
        competition_frequency,
        trend: trend::trend_summary(results),
        opener: opener::opener_summary(results),
        q_score: q_score_summary(results),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{Attempt, CompetitionResult, LiftAttempts, ParseReport, RawResultRow};

    /// Build a typed result from signed attempt triples, the way rows look
    /// on the wire: positive = make, negative = miss, 0 = not taken.
    pub fn result(
        lifter: &str,
        date: &str,
        snatch: [i32; 3],
        clean_jerk: [i32; 3],
    ) -> CompetitionResult {
        let raw = RawResultRow {
            lifter_id: Some(lifter.to_string()),
            date: Some(date.to_string()),
            ..Default::default()
        };
        let mut report = ParseReport::default();
        let mut parsed = CompetitionResult::from_raw(&raw, &mut report).unwrap();

        parsed.snatch = triple(snatch);
        parsed.clean_jerk = triple(clean_jerk);
        parsed.best_snatch = parsed.snatch.best();
        parsed.best_cj = parsed.clean_jerk.best();
        parsed.total = match (parsed.best_snatch, parsed.best_cj) {
            (Some(s), Some(c)) => Some(s + c),
            _ => None,
        };
        parsed
    }

    fn triple(values: [i32; 3]) -> LiftAttempts {
        let attempt = |v: i32| match v {
            0 => None,
            v if v > 0 => Some(Attempt::Good(v as u32)),
            v => Some(Attempt::Miss(v.unsigned_abs() as u32)),
        };
        LiftAttempts::new(attempt(values[0]), attempt(values[1]), attempt(values[2]))
    }
}
