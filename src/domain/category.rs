use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::{require_name, Document, DomainError, Identifiable, NamedEntity};

/// Label used to group inventory items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

impl Category {
    pub fn new(name: impl AsRef<str>) -> Result<Self, DomainError> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: require_name("category name", name.as_ref())?,
        })
    }
}

impl Identifiable for Category {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Category {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Document for Category {
    const COLLECTION: &'static str = "categories";

    fn validate(&self) -> Result<(), DomainError> {
        require_name("category name", &self.name).map(|_| ())
    }
}
