use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use inventory_core::{
    core::{
        calendar::offset_from_minutes,
        services::{RankingService, SummaryService},
    },
    domain::{InventoryItem, RankingMetric, Sale, SalesWindow},
};

fn ledger(items: usize, sales: usize) -> (Vec<InventoryItem>, Vec<Sale>) {
    let stock: Vec<InventoryItem> = (0..items)
        .map(|idx| InventoryItem::new(format!("Item {idx}"), 5.0 + idx as f64, 1_000).unwrap())
        .collect();
    let start = Utc.with_ymd_and_hms(2023, 1, 1, 9, 0, 0).unwrap();
    let ledger = (0..sales)
        .map(|idx| {
            let item = &stock[idx % items];
            Sale::new(
                item.id,
                (idx % 4 + 1) as u32,
                item.original_value * 1.4,
                start + Duration::hours((idx * 7) as i64),
            )
            .unwrap()
        })
        .collect();
    (stock, ledger)
}

fn bench_aggregation(c: &mut Criterion) {
    let (items, sales) = ledger(200, 10_000);
    let offset = offset_from_minutes(-180);
    let today = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();

    c.bench_function("enrich_10k_sales", |b| {
        b.iter(|| SummaryService::enrich(black_box(&items), black_box(&sales), offset))
    });

    let enriched = SummaryService::enrich(&items, &sales, offset);
    c.bench_function("dashboard_10k_sales", |b| {
        b.iter(|| SummaryService::dashboard(black_box(&enriched), today, 10))
    });
    c.bench_function("monthly_series_10k_sales", |b| {
        b.iter(|| SummaryService::monthly_series(black_box(&enriched), today))
    });
    c.bench_function("totals_this_month_10k_sales", |b| {
        b.iter(|| SummaryService::totals_for(black_box(&enriched), SalesWindow::ThisMonth(today)))
    });
    c.bench_function("rank_by_profit_10k_sales", |b| {
        b.iter(|| RankingService::rank(black_box(&enriched), RankingMetric::Profit))
    });
}

criterion_group!(benches, bench_aggregation);
criterion_main!(benches);
