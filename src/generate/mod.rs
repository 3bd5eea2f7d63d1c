//! Record generators. Each sub-domain generator consumes the shared
//! project context plus the sampling primitives and emits one collection;
//! counting/status semantics are left to the feature engine.

pub mod delivery;
pub mod finance;

use chrono::NaiveDate;

use crate::archetype::Archetype;
use crate::models::RecordSet;
use crate::sampling::Sampler;

/// Project-level inputs every generator shares. The window runs from the
/// start date through the actual end date; records never land outside it
/// except deliberately backdated task creation.
#[derive(Debug, Clone)]
pub struct GenContext {
    pub start_date: NaiveDate,
    pub actual_end_date: NaiveDate,
    pub budget: f64,
    pub archetype: Archetype,
    pub outlier: bool,
}

impl GenContext {
    pub fn duration_days(&self) -> i64 {
        (self.actual_end_date - self.start_date).num_days().max(1)
    }
}

/// Run all generators for one project. Vendor bills couple to purchase
/// orders and blockers couple to tasks, so ordering here matters.
pub fn generate_records(ctx: &GenContext, sampler: &mut Sampler) -> RecordSet {
    let timesheets = delivery::timesheets(ctx, sampler);
    let tasks = delivery::tasks(ctx, sampler);
    let blockers = delivery::blockers(ctx, &tasks, sampler);
    let staff_rates = delivery::staff_rates(ctx, sampler);
    let expenses = finance::expenses(ctx, sampler);
    let purchase_orders = finance::purchase_orders(ctx, sampler);
    let vendor_bills = finance::vendor_bills(&purchase_orders, sampler);
    let invoices = finance::invoices(ctx, sampler);

    RecordSet {
        timesheets,
        tasks,
        blockers,
        expenses,
        purchase_orders,
        vendor_bills,
        invoices,
        staff_rates,
    }
}

#[cfg(test)]
pub(crate) fn test_context(archetype: Archetype, outlier: bool) -> GenContext {
    GenContext {
        start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        actual_end_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        budget: 120_000.0,
        archetype,
        outlier,
    }
}
