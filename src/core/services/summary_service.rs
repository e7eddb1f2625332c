//! Pure aggregation over inventory and ledger snapshots.

use std::collections::HashMap;

use chrono::{Datelike, FixedOffset, NaiveDate};
use uuid::Uuid;

use crate::core::calendar;
use crate::domain::{
    DailyPoint, DashboardSummary, EnrichedSale, InventoryItem, MonthlyPoint, Sale, SalesTotals,
    SalesWindow,
};

pub struct SummaryService;

impl SummaryService {
    /// Joins each sale with its item. Sales whose item no longer exists are
    /// dropped; the result keeps ledger order.
    pub fn enrich(
        items: &[InventoryItem],
        sales: &[Sale],
        offset: FixedOffset,
    ) -> Vec<EnrichedSale> {
        let lookup: HashMap<Uuid, &InventoryItem> =
            items.iter().map(|item| (item.id, item)).collect();
        sales
            .iter()
            .filter_map(|sale| {
                let item = lookup.get(&sale.inventory_item_id)?;
                Some(EnrichedSale {
                    sale_id: sale.id,
                    item: (*item).clone(),
                    quantity: sale.quantity,
                    selling_price: sale.selling_price,
                    date: calendar::to_calendar_date(sale.transaction_date, offset),
                    recorded_at: sale.transaction_date,
                })
            })
            .collect()
    }

    pub fn filter(sales: &[EnrichedSale], window: SalesWindow) -> Vec<EnrichedSale> {
        sales
            .iter()
            .filter(|sale| calendar::in_window(sale.date, window))
            .cloned()
            .collect()
    }

    pub fn totals(sales: &[EnrichedSale]) -> SalesTotals {
        let mut totals = sales
            .iter()
            .fold(SalesTotals::default(), |mut acc, sale| {
                acc.revenue += sale.revenue();
                acc.profit += sale.profit();
                acc.items_sold += u64::from(sale.quantity);
                acc.transactions += 1;
                acc
            });
        totals.capital = totals.revenue - totals.profit;
        totals
    }

    pub fn totals_for(sales: &[EnrichedSale], window: SalesWindow) -> SalesTotals {
        Self::totals(&Self::filter(sales, window))
    }

    /// Twelve Jan..Dec slots holding sales from one year before `today`
    /// through `today`, inclusive.
    pub fn monthly_series(sales: &[EnrichedSale], today: NaiveDate) -> Vec<MonthlyPoint> {
        let mut series: Vec<MonthlyPoint> = (1..=12)
            .map(|month| MonthlyPoint {
                month,
                label: calendar::month_label(month),
                revenue: 0.0,
                profit: 0.0,
            })
            .collect();
        let start = calendar::one_year_before(today);
        for sale in sales
            .iter()
            .filter(|sale| sale.date >= start && sale.date <= today)
        {
            let slot = &mut series[sale.date.month0() as usize];
            slot.revenue += sale.revenue();
            slot.profit += sale.profit();
        }
        series
    }

    /// One zero-filled slot per day of the reference month.
    pub fn daily_series(sales: &[EnrichedSale], reference: NaiveDate) -> Vec<DailyPoint> {
        let days = calendar::days_in_month(reference.year(), reference.month());
        let mut series: Vec<DailyPoint> = (1..=days)
            .filter_map(|day| reference.with_day(day))
            .map(|date| DailyPoint {
                date,
                revenue: 0.0,
                profit: 0.0,
            })
            .collect();
        for sale in sales
            .iter()
            .filter(|sale| calendar::same_month(sale.date, reference))
        {
            if let Some(slot) = series.get_mut(sale.date.day0() as usize) {
                slot.revenue += sale.revenue();
                slot.profit += sale.profit();
            }
        }
        series
    }

    /// Newest sales first, capped at `limit`.
    pub fn recent(sales: &[EnrichedSale], limit: usize) -> Vec<EnrichedSale> {
        let mut ordered = sales.to_vec();
        ordered.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        ordered.truncate(limit);
        ordered
    }

    pub fn dashboard(
        sales: &[EnrichedSale],
        reference: NaiveDate,
        recent_limit: usize,
    ) -> DashboardSummary {
        DashboardSummary {
            reference,
            today: Self::totals_for(sales, SalesWindow::Today(reference)),
            this_month: Self::totals_for(sales, SalesWindow::ThisMonth(reference)),
            all_time: Self::totals(sales),
            recent: Self::recent(sales, recent_limit),
        }
    }
}
