pub mod backup;
pub mod config;
pub mod item;
pub mod report;
pub mod sale;
pub mod system;

use chrono::NaiveDate;

use crate::cli::core::CommandError;
use crate::cli::registry::CommandRegistry;

pub fn register_all(registry: &mut CommandRegistry) {
    for entry in item::definitions()
        .into_iter()
        .chain(sale::definitions())
        .chain(report::definitions())
        .chain(backup::definitions())
        .chain(config::definitions())
        .chain(system::definitions())
    {
        registry.register(entry);
    }
}

pub(crate) fn usage_error(usage: &str) -> CommandError {
    CommandError::InvalidArguments(format!("Usage: {}", usage))
}

/// Splits `args` into its subcommand (lowercased) and the remaining arguments.
pub(crate) fn subcommand<'a>(
    args: &'a [&'a str],
    usage: &str,
) -> Result<(String, &'a [&'a str]), CommandError> {
    match args.split_first() {
        Some((first, rest)) => Ok((first.to_lowercase(), rest)),
        None => Err(usage_error(usage)),
    }
}

pub(crate) fn parse_amount(label: &str, raw: &str) -> Result<f64, CommandError> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != '$').collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CommandError::InvalidArguments(format!("{} must be a number, got `{}`", label, raw)))
}

pub(crate) fn parse_quantity(label: &str, raw: &str) -> Result<u32, CommandError> {
    raw.parse::<u32>().map_err(|_| {
        CommandError::InvalidArguments(format!(
            "{} must be a whole number, got `{}`",
            label, raw
        ))
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("Expected a date as YYYY-MM-DD, got `{}`", raw))
    })
}

/// Positional arguments plus `--flag value` pairs, in order of appearance.
pub(crate) struct ParsedArgs<'a> {
    pub positional: Vec<&'a str>,
    pub flags: Vec<(&'a str, &'a str)>,
}

impl<'a> ParsedArgs<'a> {
    pub fn parse(args: &[&'a str], known: &[&str]) -> Result<Self, CommandError> {
        let mut positional = Vec::new();
        let mut flags = Vec::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if let Some(name) = arg.strip_prefix("--") {
                if !known.contains(&name) {
                    return Err(CommandError::InvalidArguments(format!(
                        "Unknown option `{}`",
                        arg
                    )));
                }
                let value = iter.next().ok_or_else(|| {
                    CommandError::InvalidArguments(format!("Option `{}` needs a value", arg))
                })?;
                flags.push((name, *value));
            } else {
                positional.push(*arg);
            }
        }
        Ok(Self { positional, flags })
    }

    pub fn flag(&self, name: &str) -> Option<&'a str> {
        self.flags
            .iter()
            .rev()
            .find(|(flag, _)| *flag == name)
            .map(|(_, value)| *value)
    }
}

/// `none` (any case) clears an optional field.
pub(crate) fn optional_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_and_positionals_are_separated() {
        let args = ["Mug", "--category", "Kitchen", "4.5", "--image", "http://x"];
        let parsed = ParsedArgs::parse(&args, &["category", "image"]).unwrap();
        assert_eq!(parsed.positional, vec!["Mug", "4.5"]);
        assert_eq!(parsed.flag("category"), Some("Kitchen"));
        assert_eq!(parsed.flag("hint"), None);
    }

    #[test]
    fn unknown_or_dangling_flags_fail() {
        assert!(ParsedArgs::parse(&["--colour", "red"], &["category"]).is_err());
        assert!(ParsedArgs::parse(&["--category"], &["category"]).is_err());
    }

    #[test]
    fn amounts_accept_grouping() {
        assert_eq!(parse_amount("Price", "1,250.50").unwrap(), 1250.5);
        assert!(parse_amount("Price", "abc").is_err());
        assert!(parse_amount("Price", "NaN").is_err());
    }

    #[test]
    fn none_clears_optional_values() {
        assert_eq!(optional_value("None"), None);
        assert_eq!(optional_value(" Kitchen "), Some("Kitchen".into()));
    }
}
