//! Shared traits and validation helpers for inventory records.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Exposes a stable identifier for entities stored in the document store.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// A record persisted as a document inside a named collection.
pub trait Document: Identifiable + Serialize + DeserializeOwned {
    const COLLECTION: &'static str;

    /// Re-applies construction invariants to a decoded document.
    fn validate(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Invariant violations raised while building or editing records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{field} must be zero or greater (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
    #[error("{0} must be at least 1")]
    ZeroQuantity(&'static str),
}

pub(crate) fn require_name(field: &'static str, raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn require_amount(field: &'static str, value: f64) -> Result<f64, DomainError> {
    if !value.is_finite() {
        return Err(DomainError::NotFinite(field));
    }
    if value < 0.0 {
        return Err(DomainError::Negative { field, value });
    }
    Ok(value)
}

pub(crate) fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_amount_rejects_negative_and_nan() {
        assert!(matches!(
            require_amount("cost", -0.5),
            Err(DomainError::Negative { field: "cost", .. })
        ));
        assert_eq!(
            require_amount("cost", f64::NAN),
            Err(DomainError::NotFinite("cost"))
        );
        assert_eq!(require_amount("cost", 0.0), Ok(0.0));
    }

    #[test]
    fn optional_text_drops_blank_values() {
        assert_eq!(optional_text(Some("  ".into())), None);
        assert_eq!(optional_text(Some(" Mugs ".into())), Some("Mugs".into()));
    }
}
