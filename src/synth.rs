//! Project synthesizer: draws one internally consistent project, runs the
//! record generators, derives the feature row and assigns the overrun
//! label. Corpus builds fan out across workers with one sampler stream per
//! project, so a fixed seed replays the exact corpus.

use anyhow::bail;
use chrono::{Duration, NaiveDate};
use rayon::prelude::*;

use crate::archetype::{outlier, ARCHETYPES, ARCHETYPE_WEIGHTS};
use crate::features::{self, NoiseConfig};
use crate::generate::{generate_records, GenContext};
use crate::models::{ProjectContext, ProjectRow};
use crate::sampling::Sampler;

pub const OUTLIER_PROBABILITY: f64 = 0.05;

/// Labeling near the budget line is stochastic: real projects close to
/// budget tip either way on scope creep and hidden costs. Outside the gray
/// band the label is deterministic.
#[derive(Debug, Clone)]
pub struct LabelPolicy {
    pub gray_low: f64,
    pub gray_high: f64,
    /// Overrun probability for gray-zone ratios above the budget line.
    pub over_line_prob: f64,
    /// Overrun probability for gray-zone ratios at or below the line.
    pub under_line_prob: f64,
}

impl Default for LabelPolicy {
    fn default() -> Self {
        LabelPolicy {
            gray_low: 0.9,
            gray_high: 1.1,
            over_line_prob: 0.75,
            under_line_prob: 0.25,
        }
    }
}

pub fn assign_label(cost_ratio: f64, policy: &LabelPolicy, sampler: &mut Sampler) -> i32 {
    if cost_ratio > policy.gray_high {
        1
    } else if cost_ratio < policy.gray_low {
        0
    } else if cost_ratio > 1.0 {
        i32::from(sampler.chance(policy.over_line_prob))
    } else {
        i32::from(sampler.chance(policy.under_line_prob))
    }
}

#[derive(Debug, Clone)]
pub struct CorpusConfig {
    pub projects: usize,
    pub seed: u64,
    /// Captured once per run; every project's snapshot derives from it so
    /// a batch is reproducible even while the wall clock advances.
    pub today: NaiveDate,
    pub labels: LabelPolicy,
    pub noise: NoiseConfig,
}

impl CorpusConfig {
    pub fn new(projects: usize, seed: u64, today: NaiveDate) -> Self {
        CorpusConfig {
            projects,
            seed,
            today,
            labels: LabelPolicy::default(),
            noise: NoiseConfig::default(),
        }
    }
}

/// Build the training corpus. Projects are independent, so the batch runs
/// across worker threads; per-project sampler streams keep the output
/// identical regardless of scheduling.
pub fn build_corpus(config: &CorpusConfig) -> anyhow::Result<Vec<ProjectRow>> {
    if config.projects == 0 {
        bail!("corpus size must be at least 1 project");
    }

    let rows = (0..config.projects)
        .into_par_iter()
        .map(|index| {
            let mut sampler = Sampler::for_project(config.seed, index as u64);
            synthesize_project(config, &mut sampler)
        })
        .collect();

    Ok(rows)
}

pub fn label_split(rows: &[ProjectRow]) -> (usize, usize) {
    let overruns = rows.iter().filter(|r| r.label == 1).count();
    (overruns, rows.len() - overruns)
}

/// One complete synthetic project: context draw, record generation, noised
/// actual cost, reported progress, features and label.
pub fn synthesize_project(config: &CorpusConfig, sampler: &mut Sampler) -> ProjectRow {
    let is_outlier = sampler.chance(OUTLIER_PROBABILITY);
    let archetype = ARCHETYPES[sampler.weighted(&ARCHETYPE_WEIGHTS)];
    let params = archetype.params();

    let duration_days = if is_outlier {
        let pool: &[i64] = if sampler.chance(0.5) {
            &outlier::DURATIONS_SHORT
        } else {
            &outlier::DURATIONS_LONG
        };
        pool[sampler.int_between(0, pool.len() as i64) as usize]
    } else {
        let weights: Vec<f64> = params.durations.iter().map(|(_, w)| *w).collect();
        params.durations[sampler.weighted(&weights)].0
    };

    let start_date = config.today - Duration::days(sampler.int_between(100, 1500));
    let end_date = start_date + Duration::days(duration_days);

    let schedule_variance = if is_outlier {
        let pool = outlier::SCHEDULE_VARIANCES;
        pool[sampler.int_between(0, pool.len() as i64) as usize]
    } else {
        sampler.int_between(-10, 30)
    };
    let actual_end_date = end_date + Duration::days(schedule_variance);

    let budget = if is_outlier {
        let (low, high) = if sampler.chance(0.5) {
            outlier::BUDGET_SMALL
        } else {
            outlier::BUDGET_LARGE
        };
        sampler.uniform(low, high)
    } else {
        sampler
            .lognormal(params.budget_location, params.budget_scale)
            .max(1_000.0)
    };

    let gen_ctx = GenContext {
        start_date,
        actual_end_date,
        budget,
        archetype,
        outlier: is_outlier,
    };
    let records = generate_records(&gen_ctx, sampler);

    // Reported cost drifts from the ledger sum: measurement error,
    // unrecorded work, estimation slack. The noised figure is the only
    // actual cost used downstream.
    let base_cost = features::counted_actual_cost(&records);
    let actual_cost = base_cost * sampler.uniform(0.95, 1.15);

    let progress_pct = if actual_end_date <= config.today {
        (sampler.beta(2.0, 1.0) * 100.0).min(100.0)
    } else {
        (sampler.beta(1.5, 2.0) * 100.0).min(100.0)
    };

    let ctx = ProjectContext::new(
        start_date,
        end_date,
        actual_end_date,
        budget,
        progress_pct,
        config.today,
    );

    let mut feature_vector = features::derive(&ctx, &records, actual_cost);
    features::apply_training_noise(&mut feature_vector, &config.noise, sampler);

    let cost_ratio = if budget > 0.0 {
        actual_cost / budget
    } else {
        1.0
    };
    let label = assign_label(cost_ratio, &config.labels, sampler);

    ProjectRow::new(
        sampler.uuid(),
        label,
        budget,
        actual_cost,
        &ctx,
        &feature_vector,
    )
}
