//! Archetype parameter tables. Every distribution the record generators
//! draw from is keyed off one `ArchetypeParams` lookup so a new archetype
//! is a new table row, not another branch.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Archetype {
    Small,
    Medium,
    Large,
    Enterprise,
    Startup,
    Government,
    Nonprofit,
}

pub const ARCHETYPES: [Archetype; 7] = [
    Archetype::Small,
    Archetype::Medium,
    Archetype::Large,
    Archetype::Enterprise,
    Archetype::Startup,
    Archetype::Government,
    Archetype::Nonprofit,
];

/// Draw weights for the archetype mix of a corpus.
pub const ARCHETYPE_WEIGHTS: [f64; 7] = [0.15, 0.25, 0.20, 0.15, 0.10, 0.10, 0.05];

#[derive(Debug, Clone)]
pub struct ArchetypeParams {
    /// Planned duration choices in days, with draw weights.
    pub durations: &'static [(i64, f64)],
    /// Log-normal location/scale for the budget draw.
    pub budget_location: f64,
    pub budget_scale: f64,
    /// Timesheet texture.
    pub weekend_work_prob: f64,
    pub avg_people_per_day: f64,
    pub avg_hours: f64,
    pub timesheet_rate_range: (f64, f64),
    /// Task volume.
    pub avg_tasks: f64,
    pub max_tasks: u64,
    /// Poisson means for the remaining collections.
    pub avg_blockers: f64,
    pub avg_expenses: f64,
    pub avg_purchase_orders: f64,
    pub avg_invoices: f64,
    /// Team roster size (inclusive) and bill-rate range.
    pub team_size: (u64, u64),
    pub staff_rate_range: (f64, f64),
}

const SMALL: ArchetypeParams = ArchetypeParams {
    durations: &[(15, 0.1), (30, 0.3), (45, 0.3), (60, 0.2), (90, 0.1)],
    budget_location: 8.5,
    budget_scale: 0.8,
    weekend_work_prob: 0.3,
    avg_people_per_day: 2.5,
    avg_hours: 6.0,
    timesheet_rate_range: (50.0, 200.0),
    avg_tasks: 10.0,
    max_tasks: 30,
    avg_blockers: 3.0,
    avg_expenses: 2.0,
    avg_purchase_orders: 1.0,
    avg_invoices: 2.0,
    team_size: (1, 4),
    staff_rate_range: (40.0, 150.0),
};

const MEDIUM: ArchetypeParams = ArchetypeParams {
    durations: &[(60, 0.2), (90, 0.3), (120, 0.3), (180, 0.2)],
    budget_location: 10.0,
    budget_scale: 1.0,
    weekend_work_prob: 0.3,
    avg_people_per_day: 2.5,
    avg_hours: 6.0,
    timesheet_rate_range: (50.0, 200.0),
    avg_tasks: 25.0,
    max_tasks: 75,
    avg_blockers: 3.0,
    avg_expenses: 5.0,
    avg_purchase_orders: 3.0,
    avg_invoices: 4.0,
    team_size: (5, 15),
    staff_rate_range: (75.0, 250.0),
};

const LARGE: ArchetypeParams = ArchetypeParams {
    durations: &[(180, 0.2), (270, 0.3), (365, 0.3), (540, 0.2)],
    budget_location: 11.5,
    budget_scale: 1.2,
    weekend_work_prob: 0.3,
    avg_people_per_day: 2.5,
    avg_hours: 6.0,
    timesheet_rate_range: (50.0, 200.0),
    avg_tasks: 50.0,
    max_tasks: 200,
    avg_blockers: 3.0,
    avg_expenses: 5.0,
    avg_purchase_orders: 3.0,
    avg_invoices: 4.0,
    team_size: (5, 15),
    staff_rate_range: (75.0, 250.0),
};

const ENTERPRISE: ArchetypeParams = ArchetypeParams {
    durations: &[(180, 0.2), (270, 0.3), (365, 0.3), (540, 0.2)],
    budget_location: 12.5,
    budget_scale: 1.3,
    weekend_work_prob: 0.1,
    avg_people_per_day: 4.0,
    avg_hours: 7.0,
    timesheet_rate_range: (100.0, 300.0),
    avg_tasks: 50.0,
    max_tasks: 200,
    avg_blockers: 5.0,
    avg_expenses: 10.0,
    avg_purchase_orders: 8.0,
    avg_invoices: 6.0,
    team_size: (10, 29),
    staff_rate_range: (150.0, 400.0),
};

const STARTUP: ArchetypeParams = ArchetypeParams {
    durations: &[(15, 0.1), (30, 0.3), (45, 0.3), (60, 0.2), (90, 0.1)],
    budget_location: 8.5,
    budget_scale: 0.8,
    weekend_work_prob: 0.6,
    avg_people_per_day: 1.5,
    avg_hours: 8.0,
    timesheet_rate_range: (40.0, 120.0),
    avg_tasks: 10.0,
    max_tasks: 30,
    avg_blockers: 2.0,
    avg_expenses: 2.0,
    avg_purchase_orders: 1.0,
    avg_invoices: 2.0,
    team_size: (1, 4),
    staff_rate_range: (40.0, 150.0),
};

const GOVERNMENT: ArchetypeParams = ArchetypeParams {
    durations: &[(180, 0.3), (365, 0.5), (730, 0.2)],
    budget_location: 13.0,
    budget_scale: 1.5,
    weekend_work_prob: 0.1,
    avg_people_per_day: 4.0,
    avg_hours: 7.0,
    timesheet_rate_range: (100.0, 300.0),
    avg_tasks: 75.0,
    max_tasks: 300,
    avg_blockers: 8.0,
    avg_expenses: 15.0,
    avg_purchase_orders: 8.0,
    avg_invoices: 10.0,
    team_size: (10, 29),
    staff_rate_range: (150.0, 400.0),
};

const NONPROFIT: ArchetypeParams = ArchetypeParams {
    durations: &[(180, 0.3), (365, 0.5), (730, 0.2)],
    budget_location: 9.5,
    budget_scale: 1.0,
    weekend_work_prob: 0.4,
    avg_people_per_day: 2.0,
    avg_hours: 6.0,
    timesheet_rate_range: (30.0, 100.0),
    avg_tasks: 25.0,
    max_tasks: 100,
    avg_blockers: 3.0,
    avg_expenses: 5.0,
    avg_purchase_orders: 3.0,
    avg_invoices: 4.0,
    team_size: (2, 7),
    staff_rate_range: (30.0, 100.0),
};

impl Archetype {
    pub fn params(&self) -> &'static ArchetypeParams {
        match self {
            Archetype::Small => &SMALL,
            Archetype::Medium => &MEDIUM,
            Archetype::Large => &LARGE,
            Archetype::Enterprise => &ENTERPRISE,
            Archetype::Startup => &STARTUP,
            Archetype::Government => &GOVERNMENT,
            Archetype::Nonprofit => &NONPROFIT,
        }
    }

}

/// Overrides applied to outlier projects, which deliberately escape the
/// archetype envelopes so the corpus covers tail behavior.
pub mod outlier {
    pub const DURATIONS_SHORT: [i64; 3] = [7, 14, 21];
    pub const DURATIONS_LONG: [i64; 3] = [730, 1095, 1460];
    pub const BUDGET_SMALL: (f64, f64) = (1_000.0, 5_000.0);
    pub const BUDGET_LARGE: (f64, f64) = (5_000_000.0, 50_000_000.0);
    pub const SCHEDULE_VARIANCES: [i64; 4] = [-60, -30, 90, 180];
    pub const STAFF_RATE_SPIKE: (f64, f64) = (500.0, 1_000.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_archetype_has_params() {
        for archetype in ARCHETYPES {
            let params = archetype.params();
            assert!(!params.durations.is_empty());
            assert!(params.budget_scale > 0.0);
            assert!(params.team_size.0 <= params.team_size.1);
            assert!(params.timesheet_rate_range.0 < params.timesheet_rate_range.1);
            assert!(params.staff_rate_range.0 < params.staff_rate_range.1);
        }
    }

    #[test]
    fn duration_weights_sum_to_one() {
        for archetype in ARCHETYPES {
            let total: f64 = archetype.params().durations.iter().map(|(_, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-9, "{:?} weights {total}", archetype);
        }
    }

    #[test]
    fn archetype_weights_cover_the_mix() {
        assert_eq!(ARCHETYPES.len(), ARCHETYPE_WEIGHTS.len());
        let total: f64 = ARCHETYPE_WEIGHTS.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
