//! Core CLI loop, dispatch, and shell context helpers.

use std::io;

use dialoguer::theme::ColorfulTheme;
use strsim::levenshtein;
use uuid::Uuid;

use crate::{
    config::{Config, ConfigError, ConfigManager},
    core::{
        clock::SystemClock,
        services::{FailureKind, ServiceError},
        InventoryManager,
    },
    currency::{format_currency_in, CurrencyCode, LocaleConfig},
    domain::{InventoryItem, Sale},
    errors::StoreError,
    utils::paths,
};

use super::commands;
use super::io as cli_io;
use super::output::{self, OutputPreferences};
use super::registry::{CommandEntry, CommandRegistry};
pub use super::shell_context::{CliMode, ShellContext};

/// Shortest id prefix accepted in place of a full UUID.
const MIN_ID_PREFIX: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Readline(#[from] rustyline::error::ReadlineError),
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        output::set_preferences(OutputPreferences {
            plain: mode == CliMode::Script,
            quiet_mode: false,
        });

        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let base = paths::app_data_dir();
        let config_manager = ConfigManager::with_base_dir(base.clone())?;
        let config = config_manager.load()?;
        let manager = InventoryManager::open(&base, config, Box::new(SystemClock))?;

        Ok(ShellContext {
            mode,
            registry,
            manager,
            config_manager,
            theme: ColorfulTheme::default(),
            last_command: None,
            running: true,
        })
    }

    pub(crate) fn prompt(&self) -> String {
        "inventory> ".to_string()
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|key| (levenshtein(key, &needle), key))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = best {
            if distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(cli_io::confirm_action(&self.theme, "Exit shell?", true)?)
    }

    /// Asks before destructive changes. Scripts are never prompted.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, prompt, false)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(message);
                cli_io::print_hint("Use `help <command>` for usage details.");
            }
            CommandError::Service(err) => {
                cli_io::print_error(&err);
                match err.kind() {
                    FailureKind::Validation => {}
                    FailureKind::Referential => cli_io::print_hint(
                        "The referenced record no longer exists; nothing was changed.",
                    ),
                    FailureKind::Transport => {
                        cli_io::print_hint("Nothing was changed. Retry the command.")
                    }
                }
            }
            other => cli_io::print_error(other),
        }
        Ok(())
    }

    pub(crate) fn config(&self) -> &Config {
        self.manager.config()
    }

    /// Validates, persists, then applies a configuration change.
    pub(crate) fn update_config(&mut self, key: &str, value: &str) -> CommandResult {
        let mut config = self.config().clone();
        config.set(&key.to_lowercase(), value)?;
        self.config_manager.save(&config)?;
        self.manager.set_config(config);
        Ok(())
    }

    pub(crate) fn money(&self, amount: f64) -> String {
        let config = self.config();
        format_currency_in(
            amount,
            &CurrencyCode::new(config.currency.as_str()),
            &LocaleConfig::from_tag(&config.locale),
        )
    }

    /// Finds an item by full id, unique id prefix, or case-insensitive name.
    pub(crate) fn resolve_item(&self, token: &str) -> Result<InventoryItem, CommandError> {
        if let Ok(id) = Uuid::parse_str(token) {
            return Ok(self.manager.get_item(id)?);
        }
        let items = self.manager.list_items()?;
        let by_name = items
            .iter()
            .find(|item| item.name.eq_ignore_ascii_case(token.trim()));
        if let Some(item) = by_name {
            return Ok(item.clone());
        }
        unique_prefix(items, token, |item| item.id, "item")
    }

    pub(crate) fn resolve_sale(&self, token: &str) -> Result<Sale, CommandError> {
        if let Ok(id) = Uuid::parse_str(token) {
            return Ok(self.manager.get_sale(id)?);
        }
        unique_prefix(self.manager.list_sales()?, token, |sale| sale.id, "sale")
    }
}

fn unique_prefix<T>(
    candidates: Vec<T>,
    token: &str,
    id_of: impl Fn(&T) -> Uuid,
    what: &str,
) -> Result<T, CommandError> {
    let needle = token.trim().to_ascii_lowercase();
    if needle.len() < MIN_ID_PREFIX {
        return Err(CommandError::InvalidArguments(format!(
            "No {} matches `{}`.",
            what, token
        )));
    }
    let mut matches: Vec<T> = candidates
        .into_iter()
        .filter(|candidate| id_of(candidate).to_string().starts_with(&needle))
        .collect();
    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(CommandError::InvalidArguments(format!(
            "No {} matches `{}`.",
            what, token
        ))),
        count => Err(CommandError::InvalidArguments(format!(
            "`{}` matches {} {}s; use a longer id.",
            token, count, what
        ))),
    }
}

/// Short form of an id for tables.
pub(crate) fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_lookup_requires_unique_match() {
        let ids = vec![
            Uuid::parse_str("aaaa1111-0000-4000-8000-000000000000").unwrap(),
            Uuid::parse_str("aaaa2222-0000-4000-8000-000000000000").unwrap(),
        ];
        let found = unique_prefix(ids.clone(), "AAAA1", |id| *id, "item").unwrap();
        assert_eq!(found, ids[0]);
        assert!(unique_prefix(ids.clone(), "aaaa", |id| *id, "item").is_err());
        assert!(unique_prefix(ids, "aa", |id| *id, "item").is_err());
    }

    #[test]
    fn short_id_is_first_segment() {
        let id = Uuid::parse_str("1234abcd-0000-4000-8000-000000000000").unwrap();
        assert_eq!(short_id(id), "1234abcd");
    }
}
