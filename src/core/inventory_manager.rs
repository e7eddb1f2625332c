use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use crate::config::Config;
use crate::core::calendar;
use crate::core::clock::Clock;
use crate::core::live::LiveDashboard;
use crate::core::services::{
    InventoryService, RankingService, SalesService, ServiceError, ServiceResult, SummaryService,
};
use crate::domain::{
    Category, DailyPoint, DashboardSummary, EnrichedSale, InventoryItem, ItemPatch, MonthlyPoint,
    NewSale, RankedItem, RankingMetric, Sale, SalesTotals, SalesWindow,
};
use crate::errors::StoreError;
use crate::storage::{BackupInfo, DocumentStore, JsonFileStore};
use crate::utils::paths;

/// Snapshot backups offered by file-backed stores.
pub trait BackupBackend: Send + Sync {
    fn backup(&self, note: Option<&str>) -> Result<BackupInfo, StoreError>;
    fn list_backups(&self) -> Result<Vec<BackupInfo>, StoreError>;
    fn restore_backup(&self, name: &str) -> Result<(), StoreError>;
}

impl BackupBackend for JsonFileStore {
    fn backup(&self, note: Option<&str>) -> Result<BackupInfo, StoreError> {
        JsonFileStore::backup(self, note)
    }

    fn list_backups(&self) -> Result<Vec<BackupInfo>, StoreError> {
        JsonFileStore::list_backups(self)
    }

    fn restore_backup(&self, name: &str) -> Result<(), StoreError> {
        JsonFileStore::restore_backup(self, name)
    }
}

/// Facade tying the store, configuration and clock to the services.
pub struct InventoryManager {
    store: Arc<dyn DocumentStore>,
    backups: Option<Arc<dyn BackupBackend>>,
    config: Config,
    clock: Box<dyn Clock>,
}

impl InventoryManager {
    pub fn new(store: Arc<dyn DocumentStore>, config: Config, clock: Box<dyn Clock>) -> Self {
        Self {
            store,
            backups: None,
            config,
            clock,
        }
    }

    /// Opens (or creates) the JSON store under `base`.
    pub fn open(base: &Path, config: Config, clock: Box<dyn Clock>) -> Result<Self, StoreError> {
        let store = Arc::new(JsonFileStore::with_retention(
            paths::store_file_in(base),
            paths::backups_dir_in(base),
            config.backup_retention,
        )?);
        tracing::info!(path = %store.path().display(), "inventory store opened");
        Ok(Self {
            store: store.clone(),
            backups: Some(store),
            config,
            clock,
        })
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn shared_store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn offset(&self) -> FixedOffset {
        calendar::offset_from_minutes(self.config.utc_offset_minutes)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today(self.offset())
    }

    fn attempts(&self) -> u32 {
        self.config.transaction_attempts.max(1)
    }

    // Inventory ------------------------------------------------------------

    pub fn create_item(&self, item: InventoryItem) -> ServiceResult<Uuid> {
        InventoryService::create_item(self.store(), item)
    }

    pub fn get_item(&self, id: Uuid) -> ServiceResult<InventoryItem> {
        InventoryService::get_item(self.store(), id)
    }

    pub fn list_items(&self) -> ServiceResult<Vec<InventoryItem>> {
        InventoryService::list_items(self.store())
    }

    pub fn update_item(&self, id: Uuid, patch: ItemPatch) -> ServiceResult<InventoryItem> {
        InventoryService::update_item(self.store(), id, patch, self.attempts())
    }

    pub fn delete_item(&self, id: Uuid) -> ServiceResult<InventoryItem> {
        InventoryService::delete_item(self.store(), id, self.config.delete_policy, self.attempts())
    }

    pub fn add_category(&self, name: &str) -> ServiceResult<Category> {
        InventoryService::add_category(self.store(), name)
    }

    pub fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        InventoryService::list_categories(self.store())
    }

    // Sales ----------------------------------------------------------------

    /// Records a sale dated `date` (today when `None`).
    pub fn record_sale(
        &self,
        item_id: Uuid,
        quantity: u32,
        selling_price: f64,
        date: Option<NaiveDate>,
    ) -> ServiceResult<Sale> {
        let draft = NewSale {
            inventory_item_id: item_id,
            quantity,
            selling_price,
            transaction_date: self.sale_timestamp(date),
        };
        SalesService::record_sale(self.store(), &draft, self.attempts())
    }

    pub fn delete_sale(&self, sale_id: Uuid) -> ServiceResult<Sale> {
        SalesService::delete_sale(self.store(), sale_id, self.attempts())
    }

    pub fn get_sale(&self, sale_id: Uuid) -> ServiceResult<Sale> {
        SalesService::get_sale(self.store(), sale_id)
    }

    pub fn list_sales(&self) -> ServiceResult<Vec<Sale>> {
        SalesService::list_sales(self.store())
    }

    /// Today keeps the current instant so recency ordering holds; other days
    /// are pinned to local noon.
    fn sale_timestamp(&self, date: Option<NaiveDate>) -> DateTime<Utc> {
        let now = self.now();
        match date {
            Some(day) if day != self.today() => {
                let noon = day.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN));
                self.offset()
                    .from_local_datetime(&noon)
                    .single()
                    .map(|local| local.with_timezone(&Utc))
                    .unwrap_or(now)
            }
            _ => now,
        }
    }

    // Reports --------------------------------------------------------------

    pub fn enriched_sales(&self) -> ServiceResult<Vec<EnrichedSale>> {
        let items = InventoryService::list_items(self.store())?;
        let sales = SalesService::list_sales(self.store())?;
        Ok(SummaryService::enrich(&items, &sales, self.offset()))
    }

    pub fn sales_in(&self, window: SalesWindow) -> ServiceResult<Vec<EnrichedSale>> {
        Ok(SummaryService::filter(&self.enriched_sales()?, window))
    }

    pub fn totals(&self, window: SalesWindow) -> ServiceResult<SalesTotals> {
        Ok(SummaryService::totals_for(&self.enriched_sales()?, window))
    }

    pub fn dashboard(&self) -> ServiceResult<DashboardSummary> {
        Ok(SummaryService::dashboard(
            &self.enriched_sales()?,
            self.today(),
            self.config.recent_sales_limit,
        ))
    }

    pub fn monthly_series(&self) -> ServiceResult<Vec<MonthlyPoint>> {
        Ok(SummaryService::monthly_series(
            &self.enriched_sales()?,
            self.today(),
        ))
    }

    pub fn daily_series(&self, reference: Option<NaiveDate>) -> ServiceResult<Vec<DailyPoint>> {
        let reference = reference.unwrap_or_else(|| self.today());
        Ok(SummaryService::daily_series(&self.enriched_sales()?, reference))
    }

    pub fn ranking(&self, metric: RankingMetric) -> ServiceResult<Vec<RankedItem>> {
        Ok(RankingService::rank(&self.enriched_sales()?, metric))
    }

    pub fn live_dashboard(&self) -> ServiceResult<LiveDashboard> {
        Ok(LiveDashboard::new(
            self.store(),
            self.offset(),
            self.config.recent_sales_limit,
        )?)
    }

    // Backups --------------------------------------------------------------

    fn backups(&self) -> ServiceResult<&dyn BackupBackend> {
        self.backups
            .as_deref()
            .ok_or_else(|| ServiceError::Invalid("This store does not support backups.".into()))
    }

    pub fn backup(&self, note: Option<&str>) -> ServiceResult<BackupInfo> {
        Ok(self.backups()?.backup(note)?)
    }

    pub fn list_backups(&self) -> ServiceResult<Vec<BackupInfo>> {
        Ok(self.backups()?.list_backups()?)
    }

    pub fn restore_backup(&self, name: &str) -> ServiceResult<()> {
        Ok(self.backups()?.restore_backup(name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::core::services::DeletePolicy;
    use crate::storage::MemoryStore;
    use tempfile::tempdir;

    fn manager_at(now: DateTime<Utc>, config: Config) -> InventoryManager {
        InventoryManager::new(Arc::new(MemoryStore::new()), config, Box::new(FixedClock(now)))
    }

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn backdated_sale_lands_on_chosen_day() {
        let manager = manager_at(noon(2024, 3, 20), Config::default());
        let id = manager
            .create_item(InventoryItem::new("Mug", 2.0, 5).unwrap())
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        manager.record_sale(id, 1, 3.0, Some(day)).unwrap();
        manager.record_sale(id, 2, 3.0, None).unwrap();

        let picked = manager.totals(SalesWindow::Day(day)).unwrap();
        assert_eq!(picked.items_sold, 1);
        let today = manager.totals(SalesWindow::Today(manager.today())).unwrap();
        assert_eq!(today.items_sold, 2);
        assert_eq!(manager.get_item(id).unwrap().quantity, 2);
    }

    #[test]
    fn offset_moves_calendar_day() {
        let late = Utc.with_ymd_and_hms(2024, 3, 31, 23, 30, 0).unwrap();
        let config = Config {
            utc_offset_minutes: 120,
            ..Config::default()
        };
        let manager = manager_at(late, config);
        assert_eq!(manager.today(), NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        let id = manager
            .create_item(InventoryItem::new("Mug", 1.0, 5).unwrap())
            .unwrap();
        manager.record_sale(id, 1, 2.0, None).unwrap();
        let april = manager.daily_series(None).unwrap();
        assert_eq!(april.len(), 30);
        assert_eq!(april[0].revenue, 2.0);
    }

    #[test]
    fn delete_uses_configured_policy() {
        let config = Config {
            delete_policy: DeletePolicy::Orphan,
            ..Config::default()
        };
        let manager = manager_at(noon(2024, 1, 1), config);
        let id = manager
            .create_item(InventoryItem::new("Mug", 1.0, 5).unwrap())
            .unwrap();
        manager.record_sale(id, 1, 2.0, None).unwrap();
        manager.delete_item(id).unwrap();
        assert!(manager.enriched_sales().unwrap().is_empty());
        assert_eq!(manager.list_sales().unwrap().len(), 1);
    }

    #[test]
    fn memory_store_has_no_backups() {
        let manager = manager_at(noon(2024, 1, 1), Config::default());
        assert!(matches!(
            manager.list_backups(),
            Err(ServiceError::Invalid(_))
        ));
    }

    #[test]
    fn json_store_backup_and_restore() {
        let dir = tempdir().unwrap();
        let manager = InventoryManager::open(
            dir.path(),
            Config::default(),
            Box::new(FixedClock(noon(2024, 1, 1))),
        )
        .unwrap();
        let id = manager
            .create_item(InventoryItem::new("Mug", 1.0, 5).unwrap())
            .unwrap();
        let info = manager.backup(Some("before sale")).unwrap();
        manager.record_sale(id, 5, 2.0, None).unwrap();
        assert_eq!(manager.get_item(id).unwrap().quantity, 0);

        manager.restore_backup(&info.name).unwrap();
        assert_eq!(manager.get_item(id).unwrap().quantity, 5);
        assert!(manager.list_sales().unwrap().is_empty());
        assert_eq!(manager.list_backups().unwrap().len(), 1);
    }
}
