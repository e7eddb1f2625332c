use crate::cli::core::{short_id, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::domain::{InventoryItem, ItemPatch};

use super::{optional_value, parse_amount, parse_quantity, subcommand, usage_error, ParsedArgs};

const ITEM_USAGE: &str = "item add <name> <cost> <quantity> [--category <name>] [--image <url>] [--hint <text>]
item edit <item> [--name <name>] [--cost <n>] [--quantity <n>] [--category <name|none>] [--image <url|none>] [--hint <text>]
item delete <item>
item list
item show <item>";

const CATEGORY_USAGE: &str = "category add <name>
category list";

const ITEM_FLAGS: &[&str] = &["name", "cost", "quantity", "category", "image", "hint"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("item", "Manage inventory items", ITEM_USAGE, cmd_item),
        CommandEntry::new(
            "category",
            "Manage item categories",
            CATEGORY_USAGE,
            cmd_category,
        ),
    ]
}

fn cmd_item(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = subcommand(args, ITEM_USAGE)?;
    match action.as_str() {
        "add" => add_item(context, rest),
        "edit" => edit_item(context, rest),
        "delete" | "remove" => delete_item(context, rest),
        "list" => list_items(context),
        "show" => show_item(context, rest),
        _ => Err(usage_error(ITEM_USAGE)),
    }
}

fn add_item(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, ITEM_FLAGS)?;
    let [name, cost, quantity] = parsed.positional[..] else {
        return Err(usage_error(ITEM_USAGE));
    };
    let mut item = InventoryItem::new(
        name,
        parse_amount("Cost", cost)?,
        parse_quantity("Quantity", quantity)?,
    )
    .map_err(|err| CommandError::InvalidArguments(err.to_string()))?;
    if let Some(category) = parsed.flag("category").and_then(optional_value) {
        item = item.with_category(category);
    }
    if let Some(url) = parsed.flag("image").and_then(optional_value) {
        item = item.with_image(url, parsed.flag("hint").and_then(optional_value));
    }

    let id = context.manager.create_item(item)?;
    io::print_success(format!("Item `{}` added ({}).", name.trim(), short_id(id)));
    Ok(())
}

fn edit_item(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, ITEM_FLAGS)?;
    let [target] = parsed.positional[..] else {
        return Err(usage_error(ITEM_USAGE));
    };
    let item = context.resolve_item(target)?;

    let image = match (parsed.flag("image"), parsed.flag("hint")) {
        (Some(url), hint) => Some(optional_value(url).map(|url| {
            let hint = hint
                .and_then(optional_value)
                .or_else(|| item.image_hint.clone());
            (url, hint)
        })),
        (None, Some(hint)) => match &item.image_url {
            Some(url) => Some(Some((url.clone(), optional_value(hint)))),
            None => {
                return Err(CommandError::InvalidArguments(
                    "Set an image with --image before giving it a hint.".into(),
                ))
            }
        },
        (None, None) => None,
    };
    let patch = ItemPatch {
        name: parsed.flag("name").map(str::to_string),
        original_value: parsed
            .flag("cost")
            .map(|raw| parse_amount("Cost", raw))
            .transpose()?,
        quantity: parsed
            .flag("quantity")
            .map(|raw| parse_quantity("Quantity", raw))
            .transpose()?,
        category: parsed.flag("category").map(optional_value),
        image,
    };

    let updated = context.manager.update_item(item.id, patch)?;
    io::print_success(format!("Item `{}` updated.", updated.name));
    Ok(())
}

fn delete_item(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [target] = args[..] else {
        return Err(usage_error(ITEM_USAGE));
    };
    let item = context.resolve_item(target)?;
    if !context.confirm(&format!("Delete `{}`?", item.name))? {
        io::print_info("Deletion cancelled.");
        return Ok(());
    }
    let removed = context.manager.delete_item(item.id)?;
    io::print_success(format!("Item `{}` deleted.", removed.name));
    Ok(())
}

fn list_items(context: &mut ShellContext) -> CommandResult {
    let items = context.manager.list_items()?;
    output::section("Inventory");
    if items.is_empty() {
        io::print_info("No items yet. Add one with `item add`.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            vec![
                short_id(item.id),
                item.name.clone(),
                item.category.clone().unwrap_or_else(|| "-".into()),
                context.money(item.original_value),
                item.quantity.to_string(),
                context.money(item.stock_value()),
            ]
        })
        .collect();
    output::table(&["Id", "Name", "Category", "Cost", "Qty", "Stock value"], &rows);
    Ok(())
}

fn show_item(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [target] = args[..] else {
        return Err(usage_error(ITEM_USAGE));
    };
    let item = context.resolve_item(target)?;
    output::section(&item.name);
    io::print_info(format!("  Id        : {}", item.id));
    io::print_info(format!("  Cost      : {}", context.money(item.original_value)));
    io::print_info(format!("  Quantity  : {}", item.quantity));
    io::print_info(format!(
        "  Category  : {}",
        item.category.as_deref().unwrap_or("-")
    ));
    if let Some(url) = &item.image_url {
        io::print_info(format!("  Image     : {}", url));
    }
    if let Some(hint) = &item.image_hint {
        io::print_info(format!("  Image hint: {}", hint));
    }
    io::print_info(format!(
        "  Created   : {}",
        item.created_at.format("%Y-%m-%d %H:%M")
    ));
    Ok(())
}

fn cmd_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = subcommand(args, CATEGORY_USAGE)?;
    match action.as_str() {
        "add" => {
            let name = rest.join(" ");
            if name.trim().is_empty() {
                return Err(usage_error(CATEGORY_USAGE));
            }
            let category = context.manager.add_category(&name)?;
            io::print_success(format!("Category `{}` added.", category.name));
            Ok(())
        }
        "list" => {
            let categories = context.manager.list_categories()?;
            output::section("Categories");
            if categories.is_empty() {
                io::print_info("No categories yet.");
            }
            for category in categories {
                io::print_info(format!("  {}", category.name));
            }
            Ok(())
        }
        _ => Err(usage_error(CATEGORY_USAGE)),
    }
}
