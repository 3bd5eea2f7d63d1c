//! The feature engine. One pure derivation serves both the synthetic
//! (training) and live (scoring) paths; the training-only noise pass is a
//! separate step so the two paths cannot drift apart.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Duration;
use statrs::statistics::Statistics;

use crate::models::{FeatureVector, ProjectContext, RecordSet};
use crate::sampling::Sampler;

/// Actual cost of work performed: counted timesheet cost plus counted
/// expenses plus counted vendor bills. Shared by both paths; the
/// synthesizer layers its reporting-noise factor on top of this.
pub fn counted_actual_cost(records: &RecordSet) -> f64 {
    let timesheet_cost: f64 = records.timesheets.iter().map(|t| t.cost()).sum();
    let expense_cost: f64 = records
        .expenses
        .iter()
        .filter(|e| e.is_counted())
        .map(|e| e.amount)
        .sum();
    let bill_cost: f64 = records
        .vendor_bills
        .iter()
        .filter(|b| b.is_counted())
        .map(|b| b.grand_total)
        .sum();
    timesheet_cost + expense_cost + bill_cost
}

/// Derive the 14-feature vector. Deterministic: identical inputs produce
/// bit-identical outputs, which is the train/serve parity contract.
pub fn derive(ctx: &ProjectContext, records: &RecordSet, actual_cost: f64) -> FeatureVector {
    let total_days = (ctx.end_date - ctx.start_date).num_days();
    let days_elapsed = (ctx.snapshot_date - ctx.start_date).num_days();

    let days_elapsed_pct = if total_days > 0 {
        days_elapsed as f64 / total_days as f64 * 100.0
    } else {
        0.0
    };

    let earned_value = ctx.progress_pct / 100.0 * ctx.budget;
    let planned_value = if total_days > 0 {
        days_elapsed as f64 / total_days as f64 * ctx.budget
    } else {
        0.0
    };

    let cpi = if actual_cost > 0.0 {
        earned_value / actual_cost
    } else {
        1.0
    };
    let spi = if planned_value > 0.0 {
        earned_value / planned_value
    } else {
        1.0
    };

    let estimate_at_completion = if cpi > 0.0 {
        actual_cost + (ctx.budget - earned_value) / cpi
    } else {
        ctx.budget
    };
    let vac_pct = if ctx.budget > 0.0 {
        (ctx.budget - estimate_at_completion) / ctx.budget * 100.0
    } else {
        0.0
    };

    let burn_rate_ratio = if days_elapsed > 0 {
        actual_cost / days_elapsed as f64
    } else {
        0.0
    };

    let task_count = records.tasks.len();
    let overdue_pct = if task_count > 0 {
        let overdue = records
            .tasks
            .iter()
            .filter(|t| t.due_date < ctx.snapshot_date && t.state != "done")
            .count();
        overdue as f64 / task_count as f64 * 100.0
    } else {
        0.0
    };

    let blocker_density = if task_count > 0 {
        let active = records
            .blockers
            .iter()
            .filter(|b| b.resolved_at.is_none())
            .count();
        active as f64 / task_count as f64
    } else {
        0.0
    };

    let scope_creep_proxy = if task_count > 0 {
        let added_later = records
            .tasks
            .iter()
            .filter(|t| t.created_at > ctx.start_date)
            .count();
        added_later as f64 / task_count as f64
    } else {
        0.0
    };

    let committed: f64 = records
        .purchase_orders
        .iter()
        .filter(|po| po.status == "confirmed")
        .map(|po| po.grand_total)
        .sum();
    let billed: f64 = records
        .vendor_bills
        .iter()
        .filter(|b| b.is_counted())
        .map(|b| b.grand_total)
        .sum();
    let finance_gaps = (committed - billed).max(0.0);

    let settled_lags: Vec<f64> = records
        .invoices
        .iter()
        .filter_map(|inv| inv.paid_at.map(|paid| (paid - inv.invoice_date).num_days() as f64))
        .collect();
    let invoice_lag_days = if settled_lags.is_empty() {
        0.0
    } else {
        settled_lags.iter().sum::<f64>() / settled_lags.len() as f64
    };

    let timesheet_volatility = trailing_hours_volatility(ctx, records);
    let people_active_7d = active_work_dates_7d(ctx, records) as f64;

    let avg_team_rate = if records.staff_rates.is_empty() {
        0.0
    } else {
        records.staff_rates.iter().map(|r| r.bill_rate).sum::<f64>()
            / records.staff_rates.len() as f64
    };

    let mut features = FeatureVector {
        cpi,
        spi,
        vac_pct,
        burn_rate_ratio,
        overdue_pct,
        blocker_density,
        progress_pct: ctx.progress_pct,
        days_elapsed_pct,
        scope_creep_proxy,
        finance_gaps,
        invoice_lag_days,
        timesheet_volatility,
        avg_team_rate,
        people_active_7d,
    };
    features.clamp_domains();
    features
}

/// Sample standard deviation of per-day summed hours over the trailing
/// 14 days ending at the snapshot. Needs at least two distinct days.
fn trailing_hours_volatility(ctx: &ProjectContext, records: &RecordSet) -> f64 {
    let window_start = ctx.snapshot_date - Duration::days(14);
    let mut daily_hours: BTreeMap<chrono::NaiveDate, f64> = BTreeMap::new();
    for entry in &records.timesheets {
        if entry.worked_on >= window_start && entry.worked_on <= ctx.snapshot_date {
            *daily_hours.entry(entry.worked_on).or_insert(0.0) += entry.hours;
        }
    }
    if daily_hours.len() < 2 {
        return 0.0;
    }
    let hours: Vec<f64> = daily_hours.into_values().collect();
    (&hours).std_dev()
}

fn active_work_dates_7d(ctx: &ProjectContext, records: &RecordSet) -> usize {
    let window_start = ctx.snapshot_date - Duration::days(7);
    let active: BTreeSet<chrono::NaiveDate> = records
        .timesheets
        .iter()
        .filter(|t| t.worked_on >= window_start && t.worked_on <= ctx.snapshot_date)
        .map(|t| t.worked_on)
        .collect();
    active.len()
}

/// Knobs for the training-only perturbation. Both sigmas at zero make the
/// pass an exact identity.
#[derive(Debug, Clone)]
pub struct NoiseConfig {
    /// Multiplicative sigma applied to every feature but the headcount.
    pub feature_sigma: f64,
    /// Additive sigma for the active-work-dates count.
    pub headcount_sigma: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        NoiseConfig {
            feature_sigma: 0.05,
            headcount_sigma: 0.5,
        }
    }
}

/// Training-only perturbation: keeps corpus features from being exact
/// functions of the label. The live path never calls this.
pub fn apply_training_noise(
    features: &mut FeatureVector,
    config: &NoiseConfig,
    sampler: &mut Sampler,
) {
    let mut jitter = |value: &mut f64| {
        *value *= 1.0 + sampler.normal(0.0, config.feature_sigma);
    };
    jitter(&mut features.cpi);
    jitter(&mut features.spi);
    jitter(&mut features.vac_pct);
    jitter(&mut features.burn_rate_ratio);
    jitter(&mut features.overdue_pct);
    jitter(&mut features.blocker_density);
    jitter(&mut features.progress_pct);
    jitter(&mut features.days_elapsed_pct);
    jitter(&mut features.scope_creep_proxy);
    jitter(&mut features.finance_gaps);
    jitter(&mut features.invoice_lag_days);
    jitter(&mut features.timesheet_volatility);
    jitter(&mut features.avg_team_rate);

    features.people_active_7d =
        (features.people_active_7d + sampler.normal(0.0, config.headcount_sigma)).round();

    features.clamp_domains();
}
