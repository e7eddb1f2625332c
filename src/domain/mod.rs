pub mod category;
pub mod common;
pub mod item;
pub mod report;
pub mod sale;

pub use category::Category;
pub use common::{Displayable, Document, DomainError, Identifiable, NamedEntity};
pub use item::{InventoryItem, ItemPatch};
pub use report::{
    DailyPoint, DashboardSummary, MonthlyPoint, RankedItem, RankingMetric, SalesTotals,
    SalesWindow,
};
pub use sale::{EnrichedSale, NewSale, Sale};
