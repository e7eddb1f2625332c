mod common;

use chrono::NaiveDate;
use inventory_core::{
    config::Config,
    core::services::{DeletePolicy, SummaryService},
    domain::{RankingMetric, SalesWindow},
};

use common::{open_at, setup_test_env, stock, temp_base};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn totals_match_worked_example() {
    let (manager, _base) = setup_test_env();
    let mug = stock(&manager, "Mug", 10.0, 5);
    manager.record_sale(mug.id, 2, 15.0, None).unwrap();

    let totals = manager.totals(SalesWindow::AllTime).unwrap();
    assert_eq!(totals.revenue, 30.0);
    assert_eq!(totals.profit, 10.0);
    assert_eq!(totals.capital, 20.0);
    assert_eq!(totals.items_sold, 2);
    assert_eq!(totals.transactions, 1);
}

#[test]
fn capital_is_revenue_minus_profit_in_every_window() {
    let (manager, _base) = setup_test_env();
    let mug = stock(&manager, "Mug", 4.5, 50);
    let pen = stock(&manager, "Pen", 1.25, 50);
    manager.record_sale(mug.id, 3, 9.0, None).unwrap();
    manager.record_sale(pen.id, 7, 2.0, Some(date(2024, 4, 2))).unwrap();
    manager.record_sale(mug.id, 1, 3.0, Some(date(2023, 12, 24))).unwrap();

    let today = manager.today();
    for window in [
        SalesWindow::Today(today),
        SalesWindow::ThisMonth(today),
        SalesWindow::AllTime,
        SalesWindow::Day(date(2023, 12, 24)),
    ] {
        let totals = manager.totals(window).unwrap();
        assert!((totals.capital - (totals.revenue - totals.profit)).abs() < 1e-9);
    }
}

#[test]
fn windows_partition_by_calendar_day() {
    let (manager, _base) = setup_test_env();
    let mug = stock(&manager, "Mug", 10.0, 20);
    manager.record_sale(mug.id, 1, 12.0, None).unwrap();
    manager.record_sale(mug.id, 2, 12.0, Some(date(2024, 4, 1))).unwrap();
    manager.record_sale(mug.id, 4, 12.0, Some(date(2024, 3, 31))).unwrap();

    let today = manager.today();
    assert_eq!(manager.totals(SalesWindow::Today(today)).unwrap().items_sold, 1);
    assert_eq!(
        manager.totals(SalesWindow::ThisMonth(today)).unwrap().items_sold,
        3
    );
    assert_eq!(manager.totals(SalesWindow::AllTime).unwrap().items_sold, 7);
    assert_eq!(
        manager
            .totals(SalesWindow::Day(date(2024, 3, 31)))
            .unwrap()
            .items_sold,
        4
    );
}

#[test]
fn monthly_series_has_twelve_slots_and_skips_old_sales() {
    let (manager, _base) = setup_test_env();
    let mug = stock(&manager, "Mug", 10.0, 20);
    manager.record_sale(mug.id, 1, 20.0, None).unwrap();
    manager.record_sale(mug.id, 1, 20.0, Some(date(2023, 6, 10))).unwrap();
    // Older than one year: excluded.
    manager.record_sale(mug.id, 1, 20.0, Some(date(2023, 4, 1))).unwrap();

    let series = manager.monthly_series().unwrap();
    assert_eq!(series.len(), 12);
    assert_eq!(series[3].label, "Apr");
    assert_eq!(series[3].revenue, 20.0);
    assert_eq!(series[5].revenue, 20.0);
    assert_eq!(series[5].profit, 10.0);
    let total: f64 = series.iter().map(|point| point.revenue).sum();
    assert_eq!(total, 40.0);
}

#[test]
fn daily_series_covers_month_of_reference() {
    let (manager, _base) = setup_test_env();
    let mug = stock(&manager, "Mug", 10.0, 20);
    manager.record_sale(mug.id, 2, 15.0, Some(date(2024, 2, 29))).unwrap();

    let feb = manager.daily_series(Some(date(2024, 2, 10))).unwrap();
    assert_eq!(feb.len(), 29);
    assert_eq!(feb[28].date, date(2024, 2, 29));
    assert_eq!(feb[28].revenue, 30.0);
    assert_eq!(feb[28].profit, 10.0);

    let april = manager.daily_series(None).unwrap();
    assert_eq!(april.len(), 30);
    assert!(april.iter().all(|point| point.revenue == 0.0));
}

#[test]
fn ranking_orders_by_metric() {
    let (manager, _base) = setup_test_env();
    let mug = stock(&manager, "Mug", 10.0, 50);
    let pen = stock(&manager, "Pen", 1.0, 50);
    manager.record_sale(mug.id, 1, 30.0, None).unwrap();
    manager.record_sale(pen.id, 5, 2.0, None).unwrap();

    let by_quantity = manager.ranking(RankingMetric::Quantity).unwrap();
    assert_eq!(by_quantity[0].item.name, "Pen");
    assert_eq!(by_quantity[0].quantity_sold, 5);

    let by_profit = manager.ranking(RankingMetric::Profit).unwrap();
    assert_eq!(by_profit[0].item.name, "Mug");
    assert_eq!(by_profit[0].total_profit, 20.0);
    assert_eq!(by_profit[1].total_profit, 5.0);
}

#[test]
fn orphaned_sales_drop_out_of_reports() {
    let base = temp_base();
    let config = Config {
        delete_policy: DeletePolicy::Orphan,
        ..Config::default()
    };
    let manager = open_at(&base, config);
    let mug = stock(&manager, "Mug", 10.0, 5);
    let pen = stock(&manager, "Pen", 1.0, 5);
    manager.record_sale(mug.id, 1, 15.0, None).unwrap();
    manager.record_sale(pen.id, 1, 3.0, None).unwrap();

    manager.delete_item(mug.id).unwrap();

    assert_eq!(manager.list_sales().unwrap().len(), 2);
    let enriched = manager.enriched_sales().unwrap();
    assert_eq!(enriched.len(), 1);
    let totals = SummaryService::totals(&enriched);
    assert_eq!(totals.revenue, 3.0);
    assert_eq!(manager.ranking(RankingMetric::Quantity).unwrap().len(), 1);
}

#[test]
fn dashboard_lists_recent_sales_newest_first() {
    let (manager, _base) = setup_test_env();
    let mug = stock(&manager, "Mug", 10.0, 20);
    manager.record_sale(mug.id, 1, 12.0, Some(date(2024, 4, 1))).unwrap();
    manager.record_sale(mug.id, 2, 12.0, None).unwrap();
    manager.record_sale(mug.id, 3, 12.0, Some(date(2024, 4, 10))).unwrap();

    let summary = manager.dashboard().unwrap();
    assert_eq!(summary.reference, date(2024, 4, 15));
    assert_eq!(summary.today.items_sold, 2);
    assert_eq!(summary.this_month.items_sold, 6);
    let quantities: Vec<u32> = summary.recent.iter().map(|sale| sale.quantity).collect();
    assert_eq!(quantities, vec![2, 3, 1]);
}
