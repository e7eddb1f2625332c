//! Money rendering for reports and listings.

use serde::{Deserialize, Serialize};

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("USD")
    }
}

/// Separators derived from a BCP 47 language tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleConfig {
    pub decimal_separator: char,
    pub grouping_separator: char,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            grouping_separator: ',',
        }
    }
}

impl LocaleConfig {
    /// Only the language subtag matters; unknown tags use `1,234.56`.
    pub fn from_tag(tag: &str) -> Self {
        let language = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "de" | "es" | "it" | "nl" | "pt" | "id" | "tr" => Self {
                decimal_separator: ',',
                grouping_separator: '.',
            },
            "fr" | "sv" | "nb" | "fi" | "pl" | "cs" => Self {
                decimal_separator: ',',
                grouping_separator: ' ',
            },
            _ => Self::default(),
        }
    }
}

pub fn symbol_for(code: &str) -> String {
    match code {
        "USD" => "$".into(),
        "EUR" => "€".into(),
        "GBP" => "£".into(),
        "INR" => "₹".into(),
        "JPY" => "¥".into(),
        "AUD" => "A$".into(),
        _ => format!("{} ", code),
    }
}

pub fn minor_units_for(code: &str) -> u8 {
    match code {
        "JPY" => 0,
        "KWD" | "BHD" => 3,
        _ => 2,
    }
}

/// Formats a non-negative magnitude with grouping and a fixed precision.
pub fn format_number(locale: &LocaleConfig, value: f64, precision: u8) -> String {
    let body = format!("{:.*}", precision as usize, value.abs());
    let (int_part, fraction) = match body.split_once('.') {
        Some((int_part, fraction)) => (int_part, Some(fraction)),
        None => (body.as_str(), None),
    };
    let mut rendered = group_digits(int_part, locale.grouping_separator);
    if let Some(fraction) = fraction {
        rendered.push(locale.decimal_separator);
        rendered.push_str(fraction);
    }
    rendered
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index != 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

/// Renders `amount` in `code` with the default locale, e.g. `$1,234.50`.
pub fn format_currency(amount: f64, code: &str) -> String {
    format_currency_in(amount, &CurrencyCode::new(code), &LocaleConfig::default())
}

pub fn format_currency_in(amount: f64, code: &CurrencyCode, locale: &LocaleConfig) -> String {
    let body = format_number(locale, amount, minor_units_for(code.as_str()));
    let symbol = symbol_for(code.as_str());
    // `-0.00` renders unsigned.
    let negative = amount < 0.0 && body.chars().any(|c| c.is_ascii_digit() && c != '0');
    if negative {
        format!("-{}{}", symbol, body)
    } else {
        format!("{}{}", symbol, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_known_symbols_with_grouping() {
        assert_eq!(format_currency(1234.5, "USD"), "$1,234.50");
        assert_eq!(format_currency(0.0, "EUR"), "€0.00");
        assert_eq!(format_currency(1_000_000.0, "gbp"), "£1,000,000.00");
        assert_eq!(format_currency(99.999, "INR"), "₹100.00");
    }

    #[test]
    fn negative_amounts_carry_a_sign() {
        assert_eq!(format_currency(-20.0, "USD"), "-$20.00");
        assert_eq!(format_currency(-0.001, "USD"), "$0.00");
    }

    #[test]
    fn unknown_codes_fall_back_to_code_prefix() {
        assert_eq!(format_currency(12.0, "CHF"), "CHF 12.00");
        assert_eq!(format_currency(1500.0, "JPY"), "¥1,500");
    }

    #[test]
    fn locale_tag_switches_separators() {
        let german = LocaleConfig::from_tag("de-DE");
        assert_eq!(format_number(&german, 1234.5, 2), "1.234,50");
        let french = LocaleConfig::from_tag("fr_FR");
        assert_eq!(format_number(&french, 1234567.0, 2), "1 234 567,00");
        assert_eq!(LocaleConfig::from_tag("en-US"), LocaleConfig::default());
    }

    #[test]
    fn grouping_handles_short_numbers() {
        assert_eq!(group_digits("1", ','), "1");
        assert_eq!(group_digits("123", ','), "123");
        assert_eq!(group_digits("1234", ','), "1,234");
    }
}
