use crate::cli::core::{short_id, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::core::services::SalesService;
use crate::domain::{EnrichedSale, SalesWindow};

use super::{parse_amount, parse_date, parse_quantity, subcommand, usage_error};

const SALE_USAGE: &str = "sale record <item> <quantity> <price> [YYYY-MM-DD]
sale delete <sale>
sale list [today|month|all|YYYY-MM-DD]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "sale",
        "Record, list and reverse sales",
        SALE_USAGE,
        cmd_sale,
    )]
}

fn cmd_sale(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = subcommand(args, SALE_USAGE)?;
    match action.as_str() {
        "record" | "add" => record_sale(context, rest),
        "delete" | "remove" => delete_sale(context, rest),
        "list" => list_sales(context, rest),
        _ => Err(usage_error(SALE_USAGE)),
    }
}

fn record_sale(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (target, quantity, price, date) = match args {
        [target, quantity, price] => (*target, *quantity, *price, None),
        [target, quantity, price, date] => (*target, *quantity, *price, Some(parse_date(date)?)),
        _ => return Err(usage_error(SALE_USAGE)),
    };
    let item = context.resolve_item(target)?;
    let quantity = parse_quantity("Quantity", quantity)?;
    let price = parse_amount("Price", price)?;

    // Catch obvious shortages early; the transaction re-checks on commit.
    SalesService::precheck(&item, quantity)?;
    let sale = context.manager.record_sale(item.id, quantity, price, date)?;
    // Another writer may have moved stock since `item` was resolved.
    let remaining = context
        .manager
        .get_item(item.id)
        .map(|current| current.quantity)
        .unwrap_or_else(|_| item.quantity.saturating_sub(quantity));
    io::print_success(format!(
        "Sold {} x `{}` for {} ({}). {} left in stock.",
        sale.quantity,
        item.name,
        context.money(sale.revenue()),
        short_id(sale.id),
        remaining
    ));
    Ok(())
}

fn delete_sale(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [target] = args[..] else {
        return Err(usage_error(SALE_USAGE));
    };
    let sale = context.resolve_sale(target)?;
    if !context.confirm(&format!(
        "Delete sale {} and return {} unit(s) to stock?",
        short_id(sale.id),
        sale.quantity
    ))? {
        io::print_info("Deletion cancelled.");
        return Ok(());
    }
    let removed = context.manager.delete_sale(sale.id)?;
    io::print_success(format!(
        "Sale {} deleted; {} unit(s) returned to stock.",
        short_id(removed.id),
        removed.quantity
    ));
    Ok(())
}

fn list_sales(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let today = context.manager.today();
    let window = match args.first().map(|value| value.to_lowercase()).as_deref() {
        None | Some("all") => SalesWindow::AllTime,
        Some("today") => SalesWindow::Today(today),
        Some("month") => SalesWindow::ThisMonth(today),
        Some(raw) => SalesWindow::Day(parse_date(raw)?),
    };
    let sales = context.manager.sales_in(window)?;
    output::section(format!("Sales: {}", window));
    print_sales(context, &sales);
    Ok(())
}

pub(crate) fn print_sales(context: &ShellContext, sales: &[EnrichedSale]) {
    if sales.is_empty() {
        io::print_info("No sales in this period.");
        return;
    }
    let rows: Vec<Vec<String>> = sales
        .iter()
        .map(|sale| {
            vec![
                short_id(sale.sale_id),
                sale.date.to_string(),
                sale.item.name.clone(),
                sale.quantity.to_string(),
                context.money(sale.selling_price),
                context.money(sale.revenue()),
                context.money(sale.profit()),
            ]
        })
        .collect();
    output::table(
        &["Id", "Date", "Item", "Qty", "Price", "Revenue", "Profit"],
        &rows,
    );
}
