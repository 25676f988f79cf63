//! Score normalization onto the 0 to 10 display scale.

use crate::models::Parallel;

/// Upper bound of the display scale, and the floor applied to reported maxima
pub const SCORE_CEILING: f64 = 10.0;

/// Reported maximum, floored at 10
pub fn effective_max(reported_max: Option<f64>) -> f64 {
    match reported_max {
        Some(max) if max.is_finite() && max >= SCORE_CEILING => max,
        _ => SCORE_CEILING,
    }
}

/// Map one raw score onto `[0, 10]`, rounding half up
pub fn normalize_score(raw: f64, effective_max: f64) -> f64 {
    if !raw.is_finite() || effective_max <= 0.0 {
        return 0.0;
    }
    let scaled = ((raw * SCORE_CEILING) / effective_max + 0.5).floor();
    scaled.clamp(0.0, SCORE_CEILING)
}

/// New records with `score` normalized; every other field is copied unchanged
pub fn normalize_scores(parallels: &[Parallel], reported_max: Option<f64>) -> Vec<Parallel> {
    let max = effective_max(reported_max);
    parallels
        .iter()
        .map(|parallel| Parallel {
            score: normalize_score(parallel.score, max),
            ..parallel.clone()
        })
        .collect()
}
