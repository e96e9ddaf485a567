//! Synthetic course catalogue for offline use (`--demo`).
//!
//! Sales arrive as noisy daily counts whose rate climbs as the start date gets
//! closer. Completed courses are observed up to their start; upcoming ones up
//! to today and get a projected forecast.

use chrono::Utc;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::{FetchedTimeline, TimelineSource};
use crate::domain::{PaceRating, ProductMeta, ProductSeries, SeriesPoint};
use crate::error::AppError;
use crate::forecast::{PROJECTION_HORIZON, project_forecast};
use crate::io::ingest::normalize_products;

/// Observations are recorded every few days (plus the final day).
const OBS_STEP: i64 = 3;
const FORECAST_STEP: i64 = 5;
const FORECAST_WINDOW: usize = 5;

struct CourseTemplate {
    id: &'static str,
    name: &'static str,
    price_cents: i64,
    /// First day sales open, in days before start.
    window: i64,
    /// `Some` for upcoming courses.
    days_until_start: Option<i64>,
    target: u64,
    /// Mean daily sales on the first day of the window.
    base_rate: f64,
}

const CATALOGUE: &[CourseTemplate] = &[
    CourseTemplate {
        id: "ccfb1",
        name: "Claude Code for Builders (Cohort 1)",
        price_cents: 71_200,
        window: 60,
        days_until_start: None,
        target: 40,
        base_rate: 0.3,
    },
    CourseTemplate {
        id: "ccfb2",
        name: "Claude Code for Builders (Cohort 2)",
        price_cents: 71_200,
        window: 75,
        days_until_start: None,
        target: 45,
        base_rate: 0.35,
    },
    CourseTemplate {
        id: "agents1",
        name: "Agents in Production",
        price_cents: 99_500,
        window: 50,
        days_until_start: None,
        target: 30,
        base_rate: 0.25,
    },
    CourseTemplate {
        id: "ccfb3",
        name: "Claude Code for Builders (Cohort 3)",
        price_cents: 74_900,
        window: 60,
        days_until_start: Some(12),
        target: 50,
        base_rate: 0.4,
    },
    CourseTemplate {
        id: "evals1",
        name: "Evals Bootcamp",
        price_cents: 45_000,
        window: 45,
        days_until_start: Some(25),
        target: 35,
        base_rate: 0.45,
    },
];

/// Seeded demo source.
#[derive(Debug, Clone, Copy)]
pub struct DemoSource {
    seed: u64,
}

impl DemoSource {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl TimelineSource for DemoSource {
    fn label(&self) -> String {
        format!("demo (seed {})", self.seed)
    }

    fn fetch(&self) -> Result<FetchedTimeline, AppError> {
        Ok(FetchedTimeline {
            source: self.label(),
            fetched_at: Utc::now(),
            ingest: normalize_products(generate_demo(self.seed)?),
        })
    }
}

/// Generate the demo catalogue. Same seed, same output.
pub fn generate_demo(seed: u64) -> Result<Vec<ProductSeries>, AppError> {
    let mut rng = StdRng::seed_from_u64(seed);
    CATALOGUE.iter().map(|t| generate_course(&mut rng, t)).collect()
}

fn generate_course(rng: &mut StdRng, t: &CourseTemplate) -> Result<ProductSeries, AppError> {
    let last_day = t.days_until_start.unwrap_or(0);

    // Daily sales, furthest day first.
    let mut daily: Vec<(i64, u64)> = Vec::with_capacity((t.window - last_day + 1).max(0) as usize);
    for d in (last_day..=t.window).rev() {
        let progress = 1.0 - d as f64 / t.window as f64;
        // Buying accelerates toward the start.
        let mean = t.base_rate * (1.0 + 2.5 * progress * progress);
        let noise = Normal::new(mean, (mean * 0.8).max(0.1))
            .map_err(|e| AppError::runtime(format!("Demo noise distribution error: {e}")))?;
        let sold = noise.sample(rng).round().max(0.0) as u64;
        daily.push((d, sold));
    }

    let mut actual = Vec::new();
    let mut cumulative = 0u64;
    for &(d, sold) in &daily {
        cumulative += sold;
        if (t.window - d) % OBS_STEP == 0 || d == last_day {
            actual.push(SeriesPoint::new(d, cumulative));
        }
    }

    let is_upcoming = t.days_until_start.is_some();
    let forecast = if is_upcoming {
        project_forecast(&actual, PROJECTION_HORIZON, FORECAST_STEP, FORECAST_WINDOW)
    } else {
        Vec::new()
    };

    let expected_final = forecast.last().map(|p| p.cumulative).unwrap_or(cumulative);
    let meta = ProductMeta {
        total_sales: cumulative,
        total_revenue_cents: cumulative as i64 * t.price_cents,
        sales_target: Some(t.target),
        is_upcoming,
        rating: Some(pace_rating(expected_final, t.target)),
        avg_price_cents: t.price_cents,
        days_until_start: t.days_until_start,
        median_days_before: if is_upcoming { None } else { median_lead_days(&daily) },
    };

    Ok(ProductSeries {
        product_id: t.id.to_string(),
        product_name: t.name.to_string(),
        actual_series: actual,
        forecast_series: forecast,
        meta,
    })
}

/// Rate the expected final count against target.
pub fn pace_rating(expected: u64, target: u64) -> PaceRating {
    if target == 0 {
        return PaceRating::Ahead;
    }
    let ratio = expected as f64 / target as f64;
    if ratio >= 1.1 {
        PaceRating::Ahead
    } else if ratio >= 0.9 {
        PaceRating::OnTrack
    } else {
        PaceRating::Behind
    }
}

/// Median purchase lead time from daily `(days_before, sold)` counts.
pub fn median_lead_days(daily: &[(i64, u64)]) -> Option<f64> {
    let total: u64 = daily.iter().map(|&(_, n)| n).sum();
    if total == 0 {
        return None;
    }
    let mut days: Vec<(i64, u64)> = daily.iter().copied().filter(|&(_, n)| n > 0).collect();
    days.sort_by_key(|&(d, _)| d);

    // Value at 1-based rank k of the expanded, ascending sale list.
    let at_rank = |k: u64| -> i64 {
        let mut seen = 0;
        for &(d, n) in &days {
            seen += n;
            if seen >= k {
                return d;
            }
        }
        days.last().map(|&(d, _)| d).unwrap_or(0)
    };

    if total % 2 == 1 {
        Some(at_rank(total / 2 + 1) as f64)
    } else {
        Some((at_rank(total / 2) + at_rank(total / 2 + 1)) as f64 / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::is_chronological;

    #[test]
    fn demo_is_deterministic_per_seed() {
        let a = generate_demo(7).unwrap();
        let b = generate_demo(7).unwrap();
        let c = generate_demo(8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn demo_series_are_well_formed() {
        for p in generate_demo(42).unwrap() {
            assert!(is_chronological(&p.actual_series), "{}", p.product_id);
            assert!(
                p.actual_series.windows(2).all(|w| w[1].cumulative >= w[0].cumulative),
                "{} actual decreases",
                p.product_id
            );
            if p.meta.is_upcoming {
                let last = p.actual_series.last().copied().unwrap();
                assert_eq!(p.forecast_series.first(), Some(&last));
                assert_eq!(p.forecast_series.last().map(|f| f.days_before), Some(0));
            } else {
                assert!(p.forecast_series.is_empty());
                assert_eq!(p.actual_series.last().map(|a| a.days_before), Some(0));
            }
        }
    }

    #[test]
    fn median_lead_days_expands_counts() {
        assert_eq!(median_lead_days(&[]), None);
        assert_eq!(median_lead_days(&[(10, 0)]), None);
        // Sales at days 1,1,5 -> median 1.
        assert_eq!(median_lead_days(&[(5, 1), (1, 2)]), Some(1.0));
        // Sales at days 2,8 -> median 5.
        assert_eq!(median_lead_days(&[(8, 1), (2, 1)]), Some(5.0));
    }

    #[test]
    fn pace_rating_thresholds() {
        assert_eq!(pace_rating(55, 50), PaceRating::Ahead);
        assert_eq!(pace_rating(45, 50), PaceRating::OnTrack);
        assert_eq!(pace_rating(20, 50), PaceRating::Behind);
        assert_eq!(pace_rating(0, 0), PaceRating::Ahead);
    }
}
