//! Dashboard kept current from store subscriptions instead of re-reading
//! both collections on every render.

use chrono::{FixedOffset, NaiveDate};

use crate::core::services::{RankingService, SummaryService};
use crate::domain::{
    DashboardSummary, Document, EnrichedSale, InventoryItem, RankedItem, RankingMetric, Sale,
};
use crate::storage::{self, DocumentStore, Subscription};

pub struct LiveDashboard {
    items_feed: Subscription,
    sales_feed: Subscription,
    items: Vec<InventoryItem>,
    sales: Vec<Sale>,
    offset: FixedOffset,
    recent_limit: usize,
}

impl LiveDashboard {
    pub fn new(
        store: &dyn DocumentStore,
        offset: FixedOffset,
        recent_limit: usize,
    ) -> storage::Result<Self> {
        let mut live = Self {
            items_feed: store.subscribe(InventoryItem::COLLECTION)?,
            sales_feed: store.subscribe(Sale::COLLECTION)?,
            items: Vec::new(),
            sales: Vec::new(),
            offset,
            recent_limit,
        };
        live.refresh()?;
        Ok(live)
    }

    /// Applies any snapshots delivered since the last call. Returns whether
    /// either collection changed.
    pub fn refresh(&mut self) -> storage::Result<bool> {
        let mut changed = false;
        if let Some(snapshot) = self.items_feed.latest() {
            self.items = snapshot.decode_all()?;
            changed = true;
        }
        if let Some(snapshot) = self.sales_feed.latest() {
            self.sales = snapshot.decode_all()?;
            changed = true;
        }
        if changed {
            tracing::trace!(
                items = self.items.len(),
                sales = self.sales.len(),
                "live dashboard refreshed"
            );
        }
        Ok(changed)
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    pub fn enriched(&self) -> Vec<EnrichedSale> {
        SummaryService::enrich(&self.items, &self.sales, self.offset)
    }

    pub fn dashboard(&self, reference: NaiveDate) -> DashboardSummary {
        SummaryService::dashboard(&self.enriched(), reference, self.recent_limit)
    }

    pub fn ranking(&self, metric: RankingMetric) -> Vec<RankedItem> {
        RankingService::rank(&self.enriched(), metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calendar::offset_from_minutes;
    use crate::core::services::SalesService;
    use crate::domain::NewSale;
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};

    #[test]
    fn follows_commits_without_rereading() {
        let store = MemoryStore::new();
        let mut live = LiveDashboard::new(&store, offset_from_minutes(0), 5).unwrap();
        assert!(live.items().is_empty());
        assert!(!live.refresh().unwrap());

        let item = InventoryItem::new("Mug", 4.0, 3).unwrap();
        storage::create(&store, &item).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();
        let draft = NewSale {
            inventory_item_id: item.id,
            quantity: 2,
            selling_price: 6.0,
            transaction_date: at,
        };
        SalesService::record_sale(&store, &draft, 3).unwrap();

        assert!(live.refresh().unwrap());
        assert_eq!(live.items()[0].quantity, 1);
        let summary = live.dashboard(at.date_naive());
        assert_eq!(summary.today.revenue, 12.0);
        assert_eq!(summary.today.profit, 4.0);
        assert_eq!(summary.recent.len(), 1);
        assert_eq!(live.ranking(RankingMetric::Quantity)[0].quantity_sold, 2);
    }
}
