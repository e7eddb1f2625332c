//! Derived reporting shapes consumed by the presentation layer.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::item::InventoryItem;
use super::sale::EnrichedSale;

/// Calendar bucket used to select sales for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesWindow {
    /// Same calendar day as the reference date.
    Today(NaiveDate),
    /// Same calendar month and year as the reference date.
    ThisMonth(NaiveDate),
    AllTime,
    /// A specific calendar day picked by the user.
    Day(NaiveDate),
}

impl fmt::Display for SalesWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SalesWindow::Today(date) => write!(f, "Today ({})", date),
            SalesWindow::ThisMonth(date) => write!(f, "Month of {}", date.format("%B %Y")),
            SalesWindow::AllTime => f.write_str("All time"),
            SalesWindow::Day(date) => write!(f, "Day {}", date),
        }
    }
}

/// Revenue, profit and volume over a set of sales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SalesTotals {
    pub revenue: f64,
    pub profit: f64,
    /// Cost basis of units sold (`revenue - profit`).
    pub capital: f64,
    pub items_sold: u64,
    pub transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    /// 1-based calendar month.
    pub month: u32,
    pub label: &'static str,
    pub revenue: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub revenue: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RankingMetric {
    #[default]
    Quantity,
    Profit,
}

impl FromStr for RankingMetric {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quantity" | "qty" => Ok(RankingMetric::Quantity),
            "profit" => Ok(RankingMetric::Profit),
            other => Err(format!(
                "unknown ranking metric `{}` (use quantity or profit)",
                other
            )),
        }
    }
}

/// Per-item totals used by the ranking view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem {
    pub item_id: Uuid,
    pub item: InventoryItem,
    pub quantity_sold: u64,
    pub total_revenue: f64,
    pub total_profit: f64,
}

/// Everything the landing page needs in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub reference: NaiveDate,
    pub today: SalesTotals,
    pub this_month: SalesTotals,
    pub all_time: SalesTotals,
    pub recent: Vec<EnrichedSale>,
}
