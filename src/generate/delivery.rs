//! Delivery-side generators: timesheets, tasks, task blockers, and the
//! staff rate roster.

use chrono::{Datelike, Duration, Weekday};

use crate::generate::GenContext;
use crate::models::{Blocker, StaffRate, Task, Timesheet};
use crate::sampling::Sampler;

const TASK_STATES: [&str; 4] = ["new", "in_progress", "done", "blocked"];
const TASK_STATE_WEIGHTS: [f64; 4] = [0.1, 0.2, 0.6, 0.1];

/// Daily timesheet entries across the project window. Weekend coverage,
/// headcount and hours all come from the archetype; outliers either
/// under-report (sparse days, skeleton crew) or over-report (every day,
/// oversized crew on long shifts).
pub fn timesheets(ctx: &GenContext, sampler: &mut Sampler) -> Vec<Timesheet> {
    let params = ctx.archetype.params();
    let mut avg_people = params.avg_people_per_day;
    let mut avg_hours = params.avg_hours;
    let (rate_low, rate_high) = params.timesheet_rate_range;

    let mut skip_prob = 0.0;
    if ctx.outlier {
        if sampler.chance(0.5) {
            skip_prob = 0.7;
            avg_people = 0.5;
        } else {
            avg_people = 8.0;
            avg_hours = 12.0;
        }
    }

    let mut entries = Vec::new();
    let mut day = ctx.start_date;
    while day <= ctx.actual_end_date {
        let is_weekend = matches!(day.weekday(), Weekday::Sat | Weekday::Sun);
        let mut work_today = if is_weekend {
            sampler.chance(params.weekend_work_prob)
        } else {
            true
        };
        if sampler.chance(skip_prob) {
            work_today = false;
        }

        if work_today {
            let drawn = sampler.poisson(avg_people);
            let headcount = if ctx.outlier && avg_people > 5.0 {
                drawn.max(1)
            } else {
                drawn.clamp(1, 10)
            };

            for _ in 0..headcount {
                let hours = if ctx.outlier && avg_hours > 8.0 {
                    sampler.normal(avg_hours, 2.0).clamp(8.0, 16.0)
                } else {
                    sampler.normal(avg_hours, 1.5).clamp(2.0, 10.0)
                };

                let mut cost_rate = sampler.uniform(rate_low, rate_high);
                if ctx.outlier && sampler.chance(0.1) {
                    cost_rate *= sampler.uniform(2.0, 4.0);
                }

                entries.push(Timesheet {
                    worked_on: day,
                    hours,
                    cost_rate,
                });
            }
        }

        day += Duration::days(1);
    }

    entries
}

/// Task backlog. A fifth of tasks predate the start (imported backlog);
/// the rest spread over the window, which is what the scope-creep feature
/// keys off. Tasks created after the project ended stay `new`.
pub fn tasks(ctx: &GenContext, sampler: &mut Sampler) -> Vec<Task> {
    let params = ctx.archetype.params();

    let count = if ctx.outlier {
        if sampler.chance(0.5) {
            sampler.int_between(1, 5) as u64
        } else {
            sampler.int_between(500, 1000) as u64
        }
    } else {
        sampler.poisson(params.avg_tasks).clamp(3, params.max_tasks)
    };

    let duration = ctx.duration_days();
    let mut tasks = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let created_at = if sampler.chance(0.2) {
            ctx.start_date - Duration::days(sampler.int_between(1, 30))
        } else {
            ctx.start_date + Duration::days(sampler.int_between(0, duration))
        };
        let due_date = created_at + Duration::days(sampler.int_between(5, 60));

        let state = if created_at > ctx.actual_end_date {
            "new".to_string()
        } else {
            TASK_STATES[sampler.weighted(&TASK_STATE_WEIGHTS)].to_string()
        };

        tasks.push(Task {
            created_at,
            due_date,
            state,
        });
    }

    tasks
}

/// Blockers attach to distinct sampled tasks; 70% resolve within three
/// weeks, the rest stay open and feed the blocker-density feature.
pub fn blockers(ctx: &GenContext, tasks: &[Task], sampler: &mut Sampler) -> Vec<Blocker> {
    let params = ctx.archetype.params();

    let count = if ctx.outlier {
        if sampler.chance(0.5) {
            0
        } else {
            sampler.int_between(50, 200) as u64
        }
    } else {
        sampler.poisson(params.avg_blockers).min(20)
    };

    if tasks.is_empty() || count == 0 {
        return Vec::new();
    }

    let picks = sampler.distinct_indices(tasks.len(), count as usize);
    let mut blockers = Vec::with_capacity(picks.len());
    for index in picks {
        let created_at = tasks[index].created_at + Duration::days(sampler.int_between(0, 30));
        let resolved_at = if sampler.chance(0.7) {
            Some(created_at + Duration::days(sampler.int_between(1, 20)))
        } else {
            None
        };
        blockers.push(Blocker {
            created_at,
            resolved_at,
        });
    }

    blockers
}

/// Roster of billable staff. Cost rate runs at 40-70% of the bill rate;
/// outlier projects occasionally carry premium-rate rosters.
pub fn staff_rates(ctx: &GenContext, sampler: &mut Sampler) -> Vec<StaffRate> {
    let params = ctx.archetype.params();
    let (mut rate_low, mut rate_high) = params.staff_rate_range;

    let count = if ctx.outlier {
        let n = if sampler.chance(0.5) {
            1
        } else {
            sampler.int_between(50, 200)
        };
        if sampler.chance(0.3) {
            (rate_low, rate_high) = crate::archetype::outlier::STAFF_RATE_SPIKE;
        }
        n
    } else {
        let (low, high) = params.team_size;
        sampler.int_between(low as i64, high as i64 + 1)
    };

    let mut rates = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let bill_rate = sampler.uniform(rate_low, rate_high);
        let cost_rate = bill_rate * sampler.uniform(0.4, 0.7);
        rates.push(StaffRate {
            bill_rate,
            cost_rate,
        });
    }

    rates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::Archetype;
    use crate::generate::test_context;

    #[test]
    fn timesheet_hours_and_rates_stay_in_envelope() {
        let ctx = test_context(Archetype::Medium, false);
        let params = ctx.archetype.params();
        let mut sampler = Sampler::from_seed(1);
        let entries = timesheets(&ctx, &mut sampler);

        assert!(!entries.is_empty());
        for entry in &entries {
            assert!(entry.hours >= 2.0 && entry.hours <= 10.0);
            assert!(entry.cost_rate >= params.timesheet_rate_range.0);
            assert!(entry.cost_rate <= params.timesheet_rate_range.1);
            assert!(entry.worked_on >= ctx.start_date);
            assert!(entry.worked_on <= ctx.actual_end_date);
        }
    }

    #[test]
    fn weekday_coverage_is_dense_for_low_weekend_archetypes() {
        let ctx = test_context(Archetype::Enterprise, false);
        let mut sampler = Sampler::from_seed(2);
        let entries = timesheets(&ctx, &mut sampler);

        let weekdays: std::collections::HashSet<_> = entries
            .iter()
            .filter(|t| !matches!(t.worked_on.weekday(), Weekday::Sat | Weekday::Sun))
            .map(|t| t.worked_on)
            .collect();
        // Every business day in the window gets at least one entry.
        let mut expected = 0;
        let mut day = ctx.start_date;
        while day <= ctx.actual_end_date {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                expected += 1;
            }
            day += Duration::days(1);
        }
        assert_eq!(weekdays.len(), expected);
    }

    #[test]
    fn task_counts_and_states_stay_in_taxonomy() {
        let ctx = test_context(Archetype::Government, false);
        let params = ctx.archetype.params();
        let mut sampler = Sampler::from_seed(3);
        let generated = tasks(&ctx, &mut sampler);

        assert!(generated.len() >= 3);
        assert!(generated.len() as u64 <= params.max_tasks);
        for task in &generated {
            assert!(TASK_STATES.contains(&task.state.as_str()));
            assert!(task.due_date > task.created_at);
            if task.created_at > ctx.actual_end_date {
                assert_eq!(task.state, "new");
            }
        }
    }

    #[test]
    fn blockers_bind_to_tasks_and_resolve_forward() {
        let ctx = test_context(Archetype::Enterprise, false);
        let mut sampler = Sampler::from_seed(4);
        let generated_tasks = tasks(&ctx, &mut sampler);
        let generated = blockers(&ctx, &generated_tasks, &mut sampler);

        assert!(generated.len() <= 20);
        assert!(generated.len() <= generated_tasks.len());
        for blocker in &generated {
            if let Some(resolved) = blocker.resolved_at {
                assert!(resolved > blocker.created_at);
            }
        }
    }

    #[test]
    fn no_tasks_means_no_blockers() {
        let ctx = test_context(Archetype::Medium, false);
        let mut sampler = Sampler::from_seed(5);
        assert!(blockers(&ctx, &[], &mut sampler).is_empty());
    }

    #[test]
    fn staff_cost_rates_track_bill_rates() {
        let ctx = test_context(Archetype::Large, false);
        let params = ctx.archetype.params();
        let mut sampler = Sampler::from_seed(6);
        let rates = staff_rates(&ctx, &mut sampler);

        assert!(rates.len() as u64 >= params.team_size.0);
        assert!(rates.len() as u64 <= params.team_size.1);
        for rate in &rates {
            assert!(rate.bill_rate >= params.staff_rate_range.0);
            assert!(rate.bill_rate <= params.staff_rate_range.1);
            let share = rate.cost_rate / rate.bill_rate;
            assert!(share >= 0.4 && share <= 0.7);
        }
    }

    #[test]
    fn outlier_projects_escape_the_task_envelope() {
        let ctx = test_context(Archetype::Small, true);
        let mut hit_extreme = false;
        for seed in 0..20 {
            let mut sampler = Sampler::from_seed(seed);
            let generated = tasks(&ctx, &mut sampler);
            if generated.len() < 3 || generated.len() > ctx.archetype.params().max_tasks as usize {
                hit_extreme = true;
                break;
            }
        }
        assert!(hit_extreme);
    }
}
