use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of one project as the feature engine sees it, whether the
/// records were synthesized or fetched from the operational store.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub actual_end_date: NaiveDate,
    pub budget: f64,
    pub progress_pct: f64,
    pub snapshot_date: NaiveDate,
}

impl ProjectContext {
    /// The snapshot anchors every time-windowed aggregation; it never
    /// extends past the actual end of the project or past `today`.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        actual_end_date: NaiveDate,
        budget: f64,
        progress_pct: f64,
        today: NaiveDate,
    ) -> Self {
        ProjectContext {
            start_date,
            end_date,
            actual_end_date,
            budget,
            progress_pct: progress_pct.clamp(0.0, 100.0),
            snapshot_date: actual_end_date.min(today),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Timesheet {
    pub worked_on: NaiveDate,
    pub hours: f64,
    pub cost_rate: f64,
}

impl Timesheet {
    pub fn cost(&self) -> f64 {
        self.hours * self.cost_rate
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    pub created_at: NaiveDate,
    pub due_date: NaiveDate,
    pub state: String,
}

#[derive(Debug, Clone)]
pub struct Blocker {
    pub created_at: NaiveDate,
    pub resolved_at: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct Expense {
    pub spent_on: NaiveDate,
    pub amount: f64,
    pub status: String,
}

impl Expense {
    pub fn is_counted(&self) -> bool {
        matches!(self.status.as_str(), "approved" | "reimbursed" | "paid")
    }
}

#[derive(Debug, Clone)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub order_date: NaiveDate,
    pub grand_total: f64,
    pub status: String,
}

impl PurchaseOrder {
    /// Committed orders are the ones vendors may bill against.
    pub fn is_committed(&self) -> bool {
        matches!(self.status.as_str(), "confirmed" | "fulfilled" | "closed")
    }
}

#[derive(Debug, Clone)]
pub struct VendorBill {
    pub purchase_order_id: Uuid,
    pub bill_date: NaiveDate,
    pub grand_total: f64,
    pub status: String,
}

impl VendorBill {
    pub fn is_counted(&self) -> bool {
        matches!(self.status.as_str(), "posted" | "partially_paid" | "paid")
    }
}

#[derive(Debug, Clone)]
pub struct CustomerInvoice {
    pub invoice_date: NaiveDate,
    pub grand_total: f64,
    pub status: String,
    pub paid_at: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct StaffRate {
    pub bill_rate: f64,
    pub cost_rate: f64,
}

/// The transactional history of one project. Collections are unordered;
/// statuses outside each collection's counted subset simply do not
/// participate in cost aggregation.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub timesheets: Vec<Timesheet>,
    pub tasks: Vec<Task>,
    pub blockers: Vec<Blocker>,
    pub expenses: Vec<Expense>,
    pub purchase_orders: Vec<PurchaseOrder>,
    pub vendor_bills: Vec<VendorBill>,
    pub invoices: Vec<CustomerInvoice>,
    pub staff_rates: Vec<StaffRate>,
}

/// The fixed vector consumed by the overrun classifier. Field order here
/// is the canonical column order of the training corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub cpi: f64,
    pub spi: f64,
    pub vac_pct: f64,
    pub burn_rate_ratio: f64,
    pub overdue_pct: f64,
    pub blocker_density: f64,
    pub progress_pct: f64,
    pub days_elapsed_pct: f64,
    pub scope_creep_proxy: f64,
    pub finance_gaps: f64,
    pub invoice_lag_days: f64,
    pub timesheet_volatility: f64,
    pub avg_team_rate: f64,
    pub people_active_7d: f64,
}

pub const FEATURE_NAMES: [&str; 14] = [
    "cpi",
    "spi",
    "vac_pct",
    "burn_rate_ratio",
    "overdue_pct",
    "blocker_density",
    "progress_pct",
    "days_elapsed_pct",
    "scope_creep_proxy",
    "finance_gaps",
    "invoice_lag_days",
    "timesheet_volatility",
    "avg_team_rate",
    "people_active_7d",
];

impl FeatureVector {
    pub fn value(&self, name: &str) -> Option<f64> {
        let value = match name {
            "cpi" => self.cpi,
            "spi" => self.spi,
            "vac_pct" => self.vac_pct,
            "burn_rate_ratio" => self.burn_rate_ratio,
            "overdue_pct" => self.overdue_pct,
            "blocker_density" => self.blocker_density,
            "progress_pct" => self.progress_pct,
            "days_elapsed_pct" => self.days_elapsed_pct,
            "scope_creep_proxy" => self.scope_creep_proxy,
            "finance_gaps" => self.finance_gaps,
            "invoice_lag_days" => self.invoice_lag_days,
            "timesheet_volatility" => self.timesheet_volatility,
            "avg_team_rate" => self.avg_team_rate,
            "people_active_7d" => self.people_active_7d,
            _ => return None,
        };
        Some(value)
    }

    pub fn values(&self) -> [f64; 14] {
        [
            self.cpi,
            self.spi,
            self.vac_pct,
            self.burn_rate_ratio,
            self.overdue_pct,
            self.blocker_density,
            self.progress_pct,
            self.days_elapsed_pct,
            self.scope_creep_proxy,
            self.finance_gaps,
            self.invoice_lag_days,
            self.timesheet_volatility,
            self.avg_team_rate,
            self.people_active_7d,
        ]
    }

    /// Clamp every field to its valid domain. Applied once at derivation
    /// and again after training noise, so both paths share one clamp table.
    pub fn clamp_domains(&mut self) {
        self.cpi = self.cpi.max(0.0);
        self.spi = self.spi.max(0.0);
        self.burn_rate_ratio = self.burn_rate_ratio.max(0.0);
        self.overdue_pct = self.overdue_pct.clamp(0.0, 100.0);
        self.blocker_density = self.blocker_density.max(0.0);
        self.progress_pct = self.progress_pct.clamp(0.0, 100.0);
        self.days_elapsed_pct = self.days_elapsed_pct.clamp(0.0, 100.0);
        self.scope_creep_proxy = self.scope_creep_proxy.clamp(0.0, 1.0);
        self.finance_gaps = self.finance_gaps.max(0.0);
        self.invoice_lag_days = self.invoice_lag_days.max(0.0);
        self.timesheet_volatility = self.timesheet_volatility.max(0.0);
        self.avg_team_rate = self.avg_team_rate.max(0.0);
        self.people_active_7d = self.people_active_7d.max(0.0);
    }
}

/// One row of the training corpus. Kept flat so the CSV serializer can
/// handle it without flattening tricks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRow {
    pub project_id: Uuid,
    pub label: i32,
    pub budget_amount: f64,
    pub actual_cost: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub actual_end_date: NaiveDate,
    pub cpi: f64,
    pub spi: f64,
    pub vac_pct: f64,
    pub burn_rate_ratio: f64,
    pub overdue_pct: f64,
    pub blocker_density: f64,
    pub progress_pct: f64,
    pub days_elapsed_pct: f64,
    pub scope_creep_proxy: f64,
    pub finance_gaps: f64,
    pub invoice_lag_days: f64,
    pub timesheet_volatility: f64,
    pub avg_team_rate: f64,
    pub people_active_7d: f64,
}

impl ProjectRow {
    pub fn new(
        project_id: Uuid,
        label: i32,
        budget_amount: f64,
        actual_cost: f64,
        ctx: &ProjectContext,
        features: &FeatureVector,
    ) -> Self {
        ProjectRow {
            project_id,
            label,
            budget_amount,
            actual_cost,
            start_date: ctx.start_date,
            end_date: ctx.end_date,
            actual_end_date: ctx.actual_end_date,
            cpi: features.cpi,
            spi: features.spi,
            vac_pct: features.vac_pct,
            burn_rate_ratio: features.burn_rate_ratio,
            overdue_pct: features.overdue_pct,
            blocker_density: features.blocker_density,
            progress_pct: features.progress_pct,
            days_elapsed_pct: features.days_elapsed_pct,
            scope_creep_proxy: features.scope_creep_proxy,
            finance_gaps: features.finance_gaps,
            invoice_lag_days: features.invoice_lag_days,
            timesheet_volatility: features.timesheet_volatility,
            avg_team_rate: features.avg_team_rate,
            people_active_7d: features.people_active_7d,
        }
    }

    pub fn features(&self) -> FeatureVector {
        FeatureVector {
            cpi: self.cpi,
            spi: self.spi,
            vac_pct: self.vac_pct,
            burn_rate_ratio: self.burn_rate_ratio,
            overdue_pct: self.overdue_pct,
            blocker_density: self.blocker_density,
            progress_pct: self.progress_pct,
            days_elapsed_pct: self.days_elapsed_pct,
            scope_creep_proxy: self.scope_creep_proxy,
            finance_gaps: self.finance_gaps,
            invoice_lag_days: self.invoice_lag_days,
            timesheet_volatility: self.timesheet_volatility,
            avg_team_rate: self.avg_team_rate,
            people_active_7d: self.people_active_7d,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_never_passes_actual_end() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let actual_end = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        let ctx = ProjectContext::new(start, end, actual_end, 1000.0, 50.0, today);
        assert_eq!(ctx.snapshot_date, actual_end);

        let earlier_today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let ctx = ProjectContext::new(start, end, actual_end, 1000.0, 50.0, earlier_today);
        assert_eq!(ctx.snapshot_date, earlier_today);
    }

    #[test]
    fn unknown_statuses_are_not_counted() {
        let expense = Expense {
            spent_on: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            amount: 100.0,
            status: "mystery".to_string(),
        };
        assert!(!expense.is_counted());

        let bill = VendorBill {
            purchase_order_id: Uuid::new_v4(),
            bill_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            grand_total: 100.0,
            status: "void".to_string(),
        };
        assert!(!bill.is_counted());
    }

    #[test]
    fn clamp_pins_every_domain() {
        let mut features = FeatureVector {
            cpi: -0.5,
            spi: -1.0,
            vac_pct: -250.0,
            burn_rate_ratio: -3.0,
            overdue_pct: 140.0,
            blocker_density: -0.2,
            progress_pct: 101.0,
            days_elapsed_pct: -5.0,
            scope_creep_proxy: 1.4,
            finance_gaps: -10.0,
            invoice_lag_days: -1.0,
            timesheet_volatility: -0.1,
            avg_team_rate: -80.0,
            people_active_7d: -2.0,
        };
        features.clamp_domains();
        assert_eq!(features.cpi, 0.0);
        assert_eq!(features.spi, 0.0);
        assert_eq!(features.vac_pct, -250.0);
        assert_eq!(features.burn_rate_ratio, 0.0);
        assert_eq!(features.overdue_pct, 100.0);
        assert_eq!(features.progress_pct, 100.0);
        assert_eq!(features.days_elapsed_pct, 0.0);
        assert_eq!(features.scope_creep_proxy, 1.0);
        assert_eq!(features.people_active_7d, 0.0);
    }

    #[test]
    fn feature_names_round_trip_through_value() {
        let features = FeatureVector {
            cpi: 1.0,
            spi: 2.0,
            vac_pct: 3.0,
            burn_rate_ratio: 4.0,
            overdue_pct: 5.0,
            blocker_density: 6.0,
            progress_pct: 7.0,
            days_elapsed_pct: 8.0,
            scope_creep_proxy: 0.9,
            finance_gaps: 10.0,
            invoice_lag_days: 11.0,
            timesheet_volatility: 12.0,
            avg_team_rate: 13.0,
            people_active_7d: 14.0,
        };
        let values = features.values();
        for (name, expected) in FEATURE_NAMES.iter().zip(values.iter()) {
            assert_eq!(features.value(name), Some(*expected));
        }
        assert_eq!(features.value("not_a_feature"), None);
    }
}
