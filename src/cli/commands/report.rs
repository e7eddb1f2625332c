use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::core::services::SummaryService;
use crate::domain::{RankingMetric, SalesTotals, SalesWindow};

use super::sale::print_sales;
use super::{parse_date, subcommand, usage_error};

const REPORT_USAGE: &str = "report today|month|all
report day <YYYY-MM-DD>";
const SERIES_USAGE: &str = "series monthly
series daily [YYYY-MM-DD]";
const RANKING_USAGE: &str = "ranking [quantity|profit]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "dashboard",
            "Show today, this month and all-time totals with recent sales",
            "dashboard",
            cmd_dashboard,
        ),
        CommandEntry::new(
            "report",
            "Revenue, profit and capital for a period",
            REPORT_USAGE,
            cmd_report,
        ),
        CommandEntry::new(
            "series",
            "Monthly or daily revenue and profit",
            SERIES_USAGE,
            cmd_series,
        ),
        CommandEntry::new(
            "ranking",
            "Best-selling items by quantity or profit",
            RANKING_USAGE,
            cmd_ranking,
        ),
    ]
}

fn print_totals(context: &ShellContext, totals: &SalesTotals) {
    io::print_info(format!("  Revenue     : {}", context.money(totals.revenue)));
    io::print_info(format!("  Profit      : {}", context.money(totals.profit)));
    io::print_info(format!("  Capital     : {}", context.money(totals.capital)));
    io::print_info(format!("  Items sold  : {}", totals.items_sold));
    io::print_info(format!("  Transactions: {}", totals.transactions));
}

fn cmd_dashboard(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let summary = context.manager.dashboard()?;
    output::section(format!("Dashboard for {}", summary.reference));
    for (label, totals) in [
        ("Today", &summary.today),
        ("This month", &summary.this_month),
        ("All time", &summary.all_time),
    ] {
        io::print_info(format!("{}:", label));
        print_totals(context, totals);
    }
    output::section("Recent sales");
    print_sales(context, &summary.recent);
    Ok(())
}

fn cmd_report(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (period, rest) = subcommand(args, REPORT_USAGE)?;
    let today = context.manager.today();
    let window = match (period.as_str(), rest) {
        ("today", []) => SalesWindow::Today(today),
        ("month", []) => SalesWindow::ThisMonth(today),
        ("all", []) => SalesWindow::AllTime,
        ("day", [date]) => SalesWindow::Day(parse_date(date)?),
        _ => return Err(usage_error(REPORT_USAGE)),
    };
    let sales = context.manager.sales_in(window)?;
    let totals = SummaryService::totals(&sales);
    output::section(format!("Report: {}", window));
    print_totals(context, &totals);
    print_sales(context, &sales);
    Ok(())
}

fn cmd_series(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (kind, rest) = subcommand(args, SERIES_USAGE)?;
    match (kind.as_str(), rest) {
        ("monthly", []) => {
            let series = context.manager.monthly_series()?;
            output::section(format!("Trailing year to {}", context.manager.today()));
            let rows: Vec<Vec<String>> = series
                .iter()
                .map(|point| {
                    vec![
                        point.label.to_string(),
                        context.money(point.revenue),
                        context.money(point.profit),
                    ]
                })
                .collect();
            output::table(&["Month", "Revenue", "Profit"], &rows);
            Ok(())
        }
        ("daily", rest) if rest.len() <= 1 => {
            let reference = rest.first().map(|raw| parse_date(raw)).transpose()?;
            let series = context.manager.daily_series(reference)?;
            if let Some(first) = series.first() {
                output::section(format!("Daily totals for {}", first.date.format("%B %Y")));
            }
            let rows: Vec<Vec<String>> = series
                .iter()
                .map(|point| {
                    vec![
                        point.date.to_string(),
                        context.money(point.revenue),
                        context.money(point.profit),
                    ]
                })
                .collect();
            output::table(&["Date", "Revenue", "Profit"], &rows);
            Ok(())
        }
        _ => Err(usage_error(SERIES_USAGE)),
    }
}

fn cmd_ranking(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let metric = match args {
        [] => RankingMetric::default(),
        [raw] => raw
            .parse::<RankingMetric>()
            .map_err(CommandError::InvalidArguments)?,
        _ => return Err(usage_error(RANKING_USAGE)),
    };
    let ranked = context.manager.ranking(metric)?;
    output::section(match metric {
        RankingMetric::Quantity => "Top items by quantity sold",
        RankingMetric::Profit => "Top items by profit",
    });
    if ranked.is_empty() {
        io::print_info("No sales recorded yet.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = ranked
        .iter()
        .enumerate()
        .map(|(index, row)| {
            vec![
                format!("{}", index + 1),
                row.item.name.clone(),
                row.quantity_sold.to_string(),
                context.money(row.total_revenue),
                context.money(row.total_profit),
            ]
        })
        .collect();
    output::table(&["#", "Item", "Sold", "Revenue", "Profit"], &rows);
    Ok(())
}
