//! Finance-side generators: expenses, purchase orders, vendor bills and
//! customer invoices. Monetary magnitudes are log-normal, capped as a
//! fraction of budget so no single record dwarfs the project.

use chrono::Duration;

use crate::generate::GenContext;
use crate::models::{CustomerInvoice, Expense, PurchaseOrder, VendorBill};
use crate::sampling::Sampler;

const EXPENSE_STATUSES: [&str; 4] = ["submitted", "approved", "reimbursed", "paid"];
const EXPENSE_STATUS_WEIGHTS: [f64; 4] = [0.1, 0.2, 0.3, 0.4];

const PO_STATUSES: [&str; 4] = ["draft", "confirmed", "fulfilled", "closed"];
const PO_STATUS_WEIGHTS: [f64; 4] = [0.1, 0.3, 0.4, 0.2];

const BILLING_STATUSES: [&str; 4] = ["draft", "posted", "partially_paid", "paid"];
const BILLING_STATUS_WEIGHTS: [f64; 4] = [0.1, 0.2, 0.2, 0.5];

pub fn expenses(ctx: &GenContext, sampler: &mut Sampler) -> Vec<Expense> {
    let params = ctx.archetype.params();

    let count = if ctx.outlier {
        if sampler.chance(0.5) {
            0
        } else {
            sampler.int_between(50, 200) as u64
        }
    } else {
        sampler.poisson(params.avg_expenses).min(30)
    };

    let duration = ctx.duration_days();
    let mut expenses = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let spent_on = ctx.start_date + Duration::days(sampler.int_between(0, duration));
        let amount = sampler.lognormal(6.0, 1.0).min(ctx.budget * 0.1);
        let status = EXPENSE_STATUSES[sampler.weighted(&EXPENSE_STATUS_WEIGHTS)].to_string();
        expenses.push(Expense {
            spent_on,
            amount,
            status,
        });
    }

    expenses
}

/// Purchase orders land in the first half of the window, which leaves room
/// for their vendor bills to trail them.
pub fn purchase_orders(ctx: &GenContext, sampler: &mut Sampler) -> Vec<PurchaseOrder> {
    let params = ctx.archetype.params();

    let count = if ctx.outlier {
        if sampler.chance(0.5) {
            0
        } else {
            sampler.int_between(30, 100) as u64
        }
    } else {
        sampler.poisson(params.avg_purchase_orders).min(20)
    };

    let half_window = (ctx.duration_days() / 2).max(1);
    let mut orders = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let order_date = ctx.start_date + Duration::days(sampler.int_between(0, half_window));
        let grand_total = sampler.lognormal(7.0, 1.0).min(ctx.budget * 0.3);
        let status = PO_STATUSES[sampler.weighted(&PO_STATUS_WEIGHTS)].to_string();
        orders.push(PurchaseOrder {
            id: sampler.uuid(),
            order_date,
            grand_total,
            status,
        });
    }

    orders
}

/// Vendor bills exist only against committed purchase orders: 80% of those
/// get billed 5-30 days after ordering, at the PO total nudged by the usual
/// reconciliation drift.
pub fn vendor_bills(purchase_orders: &[PurchaseOrder], sampler: &mut Sampler) -> Vec<VendorBill> {
    let mut bills = Vec::new();
    for order in purchase_orders.iter().filter(|po| po.is_committed()) {
        if !sampler.chance(0.8) {
            continue;
        }
        let bill_date = order.order_date + Duration::days(sampler.int_between(5, 30));
        let grand_total = order.grand_total * sampler.uniform(0.95, 1.05);
        let status = BILLING_STATUSES[sampler.weighted(&BILLING_STATUS_WEIGHTS)].to_string();
        bills.push(VendorBill {
            purchase_order_id: order.id,
            bill_date,
            grand_total,
            status,
        });
    }

    bills
}

/// Customer invoices. Projects longer than a month do not invoice inside
/// their first 30 days; paid invoices settle 5-60 days after issue, the
/// spread behind the invoice-lag feature.
pub fn invoices(ctx: &GenContext, sampler: &mut Sampler) -> Vec<CustomerInvoice> {
    let params = ctx.archetype.params();

    let count = if ctx.outlier {
        if sampler.chance(0.5) {
            1
        } else {
            sampler.int_between(50, 200) as u64
        }
    } else {
        sampler.poisson(params.avg_invoices).clamp(1, 25)
    };

    let duration = ctx.duration_days();
    let mut invoices = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let offset = if duration > 30 {
            sampler.int_between(30, duration)
        } else {
            sampler.int_between(0, duration.max(1))
        };
        let invoice_date = ctx.start_date + Duration::days(offset);
        let grand_total = sampler.lognormal(8.0, 1.0).min(ctx.budget * 0.4);
        let status = BILLING_STATUSES[sampler.weighted(&BILLING_STATUS_WEIGHTS)].to_string();
        let paid_at = if matches!(status.as_str(), "partially_paid" | "paid") {
            Some(invoice_date + Duration::days(sampler.int_between(5, 60)))
        } else {
            None
        };
        invoices.push(CustomerInvoice {
            invoice_date,
            grand_total,
            status,
            paid_at,
        });
    }

    invoices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::Archetype;
    use crate::generate::test_context;

    #[test]
    fn expense_amounts_cap_at_a_tenth_of_budget() {
        let ctx = test_context(Archetype::Government, false);
        let mut sampler = Sampler::from_seed(10);
        let generated = expenses(&ctx, &mut sampler);

        assert!(generated.len() <= 30);
        for expense in &generated {
            assert!(expense.amount <= ctx.budget * 0.1);
            assert!(expense.spent_on >= ctx.start_date);
            assert!(expense.spent_on <= ctx.actual_end_date);
            assert!(EXPENSE_STATUSES.contains(&expense.status.as_str()));
        }
    }

    #[test]
    fn purchase_orders_front_load_the_window() {
        let ctx = test_context(Archetype::Enterprise, false);
        let mut sampler = Sampler::from_seed(11);
        let orders = purchase_orders(&ctx, &mut sampler);

        assert!(orders.len() <= 20);
        let half_window =
            ctx.start_date + Duration::days((ctx.duration_days() / 2).max(1));
        for order in &orders {
            assert!(order.order_date >= ctx.start_date);
            assert!(order.order_date <= half_window);
            assert!(order.grand_total <= ctx.budget * 0.3);
            assert!(PO_STATUSES.contains(&order.status.as_str()));
        }
    }

    #[test]
    fn bills_only_trail_committed_orders() {
        let ctx = test_context(Archetype::Government, false);
        let mut sampler = Sampler::from_seed(12);
        let orders = purchase_orders(&ctx, &mut sampler);
        let bills = vendor_bills(&orders, &mut sampler);

        for bill in &bills {
            let order = orders
                .iter()
                .find(|po| po.id == bill.purchase_order_id)
                .expect("bill references a generated order");
            assert!(order.is_committed());

            let lag = (bill.bill_date - order.order_date).num_days();
            assert!((5..30).contains(&lag));

            let drift = bill.grand_total / order.grand_total;
            assert!(drift >= 0.95 - 1e-9 && drift <= 1.05 + 1e-9);
            assert!(BILLING_STATUSES.contains(&bill.status.as_str()));
        }
    }

    #[test]
    fn draft_orders_never_get_billed() {
        let mut sampler = Sampler::from_seed(13);
        let orders = vec![PurchaseOrder {
            id: sampler.uuid(),
            order_date: chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            grand_total: 5_000.0,
            status: "draft".to_string(),
        }];
        assert!(vendor_bills(&orders, &mut sampler).is_empty());
    }

    #[test]
    fn invoices_respect_the_opening_quiet_period() {
        let ctx = test_context(Archetype::Medium, false);
        let mut sampler = Sampler::from_seed(14);
        let generated = invoices(&ctx, &mut sampler);

        assert!(!generated.is_empty());
        assert!(generated.len() <= 25);
        let earliest = ctx.start_date + Duration::days(30);
        for invoice in &generated {
            assert!(invoice.invoice_date >= earliest);
            assert!(invoice.grand_total <= ctx.budget * 0.4);
            match invoice.status.as_str() {
                "partially_paid" | "paid" => {
                    let paid = invoice.paid_at.expect("settled invoices carry a paid date");
                    let lag = (paid - invoice.invoice_date).num_days();
                    assert!((5..60).contains(&lag));
                }
                _ => assert!(invoice.paid_at.is_none()),
            }
        }
    }
}
