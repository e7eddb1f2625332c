use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;

use super::{subcommand, usage_error};

const CONFIG_USAGE: &str = "config show
config set <key> <value>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "Show or change settings",
        CONFIG_USAGE,
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = subcommand(args, CONFIG_USAGE)?;
    match (action.as_str(), rest) {
        ("show", []) => {
            output::section("Configuration");
            for (key, value) in context.config().entries() {
                io::print_info(format!("  {:<22}{}", key, value));
            }
            io::print_info(format!(
                "  (stored in {})",
                context.config_manager.path().display()
            ));
            Ok(())
        }
        ("set", [key, value @ ..]) if !value.is_empty() => {
            context.update_config(key, &value.join(" "))?;
            io::print_success(format!("Configuration updated: {} = {}", key, value.join(" ")));
            Ok(())
        }
        _ => Err(usage_error(CONFIG_USAGE)),
    }
}
