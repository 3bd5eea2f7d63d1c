use anyhow::Context;
use chrono::{Duration, NaiveDate};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::archetype::Archetype;
use crate::generate::{generate_records, GenContext};
use crate::models::RecordSet;
use crate::sampling::Sampler;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Live project as stored in the operational schema. Open projects have no
/// actual end date yet; the planned end stands in for it when anchoring
/// the feature snapshot.
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub budget_amount: f64,
    pub progress_pct: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub async fn fetch_open_projects(
    pool: &PgPool,
    project: Option<Uuid>,
) -> anyhow::Result<Vec<ProjectRecord>> {
    let mut query = String::from(
        "SELECT id, name, code, budget_amount, progress_pct, start_date, end_date \
         FROM overrun_radar.projects \
         WHERE status IN ('planned', 'in_progress')",
    );
    if project.is_some() {
        query.push_str(" AND id = $1");
    }
    query.push_str(" ORDER BY created_at DESC");

    let mut rows = sqlx::query(&query);
    if let Some(id) = project {
        rows = rows.bind(id);
    }

    let records = rows.fetch_all(pool).await?;
    let mut projects = Vec::new();
    for row in records {
        projects.push(ProjectRecord {
            id: row.get("id"),
            name: row.get("name"),
            code: row.get("code"),
            budget_amount: row.get("budget_amount"),
            progress_pct: row.get("progress_pct"),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
        });
    }

    Ok(projects)
}

/// Fetch all seven record collections for one project, shaped exactly as
/// the feature engine expects them. Status filtering stays on the engine
/// side so both paths share the counted semantics.
pub async fn fetch_records(pool: &PgPool, project_id: Uuid) -> anyhow::Result<RecordSet> {
    let mut records = RecordSet::default();

    let rows = sqlx::query(
        "SELECT worked_on, hours, cost_rate FROM overrun_radar.timesheets WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    for row in rows {
        records.timesheets.push(crate::models::Timesheet {
            worked_on: row.get("worked_on"),
            hours: row.get("hours"),
            cost_rate: row.get("cost_rate"),
        });
    }

    let rows = sqlx::query(
        "SELECT created_at, due_date, state FROM overrun_radar.tasks WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    for row in rows {
        records.tasks.push(crate::models::Task {
            created_at: row.get("created_at"),
            due_date: row.get("due_date"),
            state: row.get("state"),
        });
    }

    let rows = sqlx::query(
        "SELECT b.created_at, b.resolved_at \
         FROM overrun_radar.task_blockers b \
         JOIN overrun_radar.tasks t ON t.id = b.task_id \
         WHERE t.project_id = $1",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    for row in rows {
        records.blockers.push(crate::models::Blocker {
            created_at: row.get("created_at"),
            resolved_at: row.get("resolved_at"),
        });
    }

    let rows = sqlx::query(
        "SELECT spent_on, amount, status FROM overrun_radar.expenses WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    for row in rows {
        records.expenses.push(crate::models::Expense {
            spent_on: row.get("spent_on"),
            amount: row.get("amount"),
            status: row.get("status"),
        });
    }

    let rows = sqlx::query(
        "SELECT id, order_date, grand_total, status \
         FROM overrun_radar.purchase_orders WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    for row in rows {
        records.purchase_orders.push(crate::models::PurchaseOrder {
            id: row.get("id"),
            order_date: row.get("order_date"),
            grand_total: row.get("grand_total"),
            status: row.get("status"),
        });
    }

    let rows = sqlx::query(
        "SELECT purchase_order_id, bill_date, grand_total, status \
         FROM overrun_radar.vendor_bills WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    for row in rows {
        records.vendor_bills.push(crate::models::VendorBill {
            purchase_order_id: row.get("purchase_order_id"),
            bill_date: row.get("bill_date"),
            grand_total: row.get("grand_total"),
            status: row.get("status"),
        });
    }

    let rows = sqlx::query(
        "SELECT invoice_date, grand_total, status, paid_at \
         FROM overrun_radar.customer_invoices WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    for row in rows {
        records.invoices.push(crate::models::CustomerInvoice {
            invoice_date: row.get("invoice_date"),
            grand_total: row.get("grand_total"),
            status: row.get("status"),
            paid_at: row.get("paid_at"),
        });
    }

    let rows = sqlx::query(
        "SELECT bill_rate, cost_rate FROM overrun_radar.staff_rates WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    for row in rows {
        records.staff_rates.push(crate::models::StaffRate {
            bill_rate: row.get("bill_rate"),
            cost_rate: row.get("cost_rate"),
        });
    }

    Ok(records)
}

/// Seed a handful of in-flight demo projects, generated with the same
/// record generators the corpus uses.
pub async fn seed_demo(pool: &PgPool, seed: u64, today: NaiveDate) -> anyhow::Result<usize> {
    let demos = [
        ("Website Redesign", "PROJ-001", Archetype::Medium),
        ("Warehouse Rollout", "PROJ-002", Archetype::Enterprise),
        ("Mobile App Buildout", "PROJ-003", Archetype::Startup),
    ];

    let mut sampler = Sampler::from_seed(seed);
    let mut inserted = 0usize;

    for (name, code, archetype) in demos.iter() {
        let params = archetype.params();
        let weights: Vec<f64> = params.durations.iter().map(|(_, w)| *w).collect();
        let duration = params.durations[sampler.weighted(&weights)].0;
        let elapsed = sampler.int_between(duration / 3, duration.max(2));
        let start_date = today - Duration::days(elapsed);
        let end_date = start_date + Duration::days(duration);
        let budget = sampler
            .lognormal(params.budget_location, params.budget_scale)
            .max(1_000.0);
        let progress_pct = (sampler.beta(1.5, 2.0) * 100.0).min(100.0);

        let ctx = GenContext {
            start_date,
            actual_end_date: end_date,
            budget,
            archetype: *archetype,
            outlier: false,
        };
        let records = generate_records(&ctx, &mut sampler);

        let project_id =
            insert_project(pool, name, code, budget, progress_pct, start_date, end_date)
                .await
                .with_context(|| format!("failed to seed project {code}"))?;
        insert_records(pool, project_id, &records).await?;
        inserted += 1;
    }

    Ok(inserted)
}

async fn insert_project(
    pool: &PgPool,
    name: &str,
    code: &str,
    budget: f64,
    progress_pct: f64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO overrun_radar.projects
        (id, name, code, status, budget_amount, progress_pct, start_date, end_date)
        VALUES ($1, $2, $3, 'in_progress', $4, $5, $6, $7)
        ON CONFLICT (code) DO UPDATE
        SET name = EXCLUDED.name, budget_amount = EXCLUDED.budget_amount,
            progress_pct = EXCLUDED.progress_pct,
            start_date = EXCLUDED.start_date, end_date = EXCLUDED.end_date
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(code)
    .bind(budget)
    .bind(progress_pct)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(pool)
    .await?
    .get("id");

    // Re-seeding replaces the project's history wholesale.
    for table in [
        "timesheets",
        "expenses",
        "vendor_bills",
        "purchase_orders",
        "customer_invoices",
        "staff_rates",
        "tasks",
    ] {
        let statement = format!(
            "DELETE FROM overrun_radar.{table} WHERE project_id = $1"
        );
        sqlx::query(&statement).bind(id).execute(pool).await?;
    }

    Ok(id)
}

async fn insert_records(
    pool: &PgPool,
    project_id: Uuid,
    records: &RecordSet,
) -> anyhow::Result<()> {
    for entry in &records.timesheets {
        sqlx::query(
            "INSERT INTO overrun_radar.timesheets (id, project_id, worked_on, hours, cost_rate) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(entry.worked_on)
        .bind(entry.hours)
        .bind(entry.cost_rate)
        .execute(pool)
        .await?;
    }

    let mut task_ids = Vec::with_capacity(records.tasks.len());
    for task in &records.tasks {
        let task_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO overrun_radar.tasks (id, project_id, created_at, due_date, state) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(task_id)
        .bind(project_id)
        .bind(task.created_at)
        .bind(task.due_date)
        .bind(&task.state)
        .execute(pool)
        .await?;
        task_ids.push(task_id);
    }

    for (blocker, task_id) in records.blockers.iter().zip(task_ids.iter().cycle()) {
        sqlx::query(
            "INSERT INTO overrun_radar.task_blockers (id, task_id, created_at, resolved_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(task_id)
        .bind(blocker.created_at)
        .bind(blocker.resolved_at)
        .execute(pool)
        .await?;
    }

    for expense in &records.expenses {
        sqlx::query(
            "INSERT INTO overrun_radar.expenses (id, project_id, spent_on, amount, status) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(expense.spent_on)
        .bind(expense.amount)
        .bind(&expense.status)
        .execute(pool)
        .await?;
    }

    for order in &records.purchase_orders {
        sqlx::query(
            "INSERT INTO overrun_radar.purchase_orders \
             (id, project_id, order_date, grand_total, status) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order.id)
        .bind(project_id)
        .bind(order.order_date)
        .bind(order.grand_total)
        .bind(&order.status)
        .execute(pool)
        .await?;
    }

    for bill in &records.vendor_bills {
        sqlx::query(
            "INSERT INTO overrun_radar.vendor_bills \
             (id, project_id, purchase_order_id, bill_date, grand_total, status) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(bill.purchase_order_id)
        .bind(bill.bill_date)
        .bind(bill.grand_total)
        .bind(&bill.status)
        .execute(pool)
        .await?;
    }

    for invoice in &records.invoices {
        sqlx::query(
            "INSERT INTO overrun_radar.customer_invoices \
             (id, project_id, invoice_date, grand_total, status, paid_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(invoice.invoice_date)
        .bind(invoice.grand_total)
        .bind(&invoice.status)
        .bind(invoice.paid_at)
        .execute(pool)
        .await?;
    }

    for rate in &records.staff_rates {
        sqlx::query(
            "INSERT INTO overrun_radar.staff_rates (id, project_id, bill_rate, cost_rate) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(rate.bill_rate)
        .bind(rate.cost_rate)
        .execute(pool)
        .await?;
    }

    Ok(())
}
