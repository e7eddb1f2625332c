use std::cmp::Ordering;
use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::{EnrichedSale, RankedItem, RankingMetric};

pub struct RankingService;

impl RankingService {
    /// Groups sales per item and orders the groups by `metric`, highest first.
    /// Ties keep the order in which each item first appears in `sales`.
    pub fn rank(sales: &[EnrichedSale], metric: RankingMetric) -> Vec<RankedItem> {
        let mut positions: HashMap<Uuid, usize> = HashMap::new();
        let mut ranked: Vec<RankedItem> = Vec::new();

        for sale in sales {
            let slot = *positions.entry(sale.item.id).or_insert_with(|| {
                ranked.push(RankedItem {
                    item_id: sale.item.id,
                    item: sale.item.clone(),
                    quantity_sold: 0,
                    total_revenue: 0.0,
                    total_profit: 0.0,
                });
                ranked.len() - 1
            });
            let entry = &mut ranked[slot];
            entry.quantity_sold += u64::from(sale.quantity);
            entry.total_revenue += sale.revenue();
            entry.total_profit += sale.profit();
        }

        // `sort_by` is stable, so equal keys stay in first-seen order.
        match metric {
            RankingMetric::Quantity => {
                ranked.sort_by(|a, b| b.quantity_sold.cmp(&a.quantity_sold))
            }
            RankingMetric::Profit => ranked.sort_by(|a, b| {
                b.total_profit
                    .partial_cmp(&a.total_profit)
                    .unwrap_or(Ordering::Equal)
            }),
        }
        ranked
    }
}
