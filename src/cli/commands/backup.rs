use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;

use super::{subcommand, usage_error};

const BACKUP_USAGE: &str = "backup create [note]
backup list
backup restore <name>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "backup",
        "Snapshot and restore the inventory store",
        BACKUP_USAGE,
        cmd_backup,
    )]
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = subcommand(args, BACKUP_USAGE)?;
    match action.as_str() {
        "create" => {
            let note = rest.join(" ");
            let info = context
                .manager
                .backup(Some(note.as_str()).filter(|note| !note.trim().is_empty()))?;
            io::print_success(format!("Backup `{}` created.", info.name));
            Ok(())
        }
        "list" => {
            let backups = context.manager.list_backups()?;
            output::section("Backups");
            if backups.is_empty() {
                io::print_info("No backups yet. Create one with `backup create`.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = backups
                .iter()
                .map(|info| {
                    vec![
                        info.name.clone(),
                        info.created_at
                            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                            .unwrap_or_else(|| "-".into()),
                        format!("{} B", info.size_bytes),
                    ]
                })
                .collect();
            output::table(&["Name", "Created (UTC)", "Size"], &rows);
            Ok(())
        }
        "restore" => {
            let [name] = rest[..] else {
                return Err(usage_error(BACKUP_USAGE));
            };
            if !context.confirm(&format!(
                "Replace all items and sales with backup `{}`?",
                name
            ))? {
                io::print_info("Restore cancelled.");
                return Ok(());
            }
            context.manager.restore_backup(name)?;
            io::print_success(format!("Restored backup `{}`.", name));
            Ok(())
        }
        _ => Err(usage_error(BACKUP_USAGE)),
    }
}
