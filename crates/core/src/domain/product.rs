use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// Tenant or store identifier partitioning catalog and Q&A records.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerScope(pub String);

/// Full catalog record as stored by the catalog collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    /// Smallest currency unit.
    pub price: i64,
    pub description: String,
    pub category: String,
    pub active: bool,
    pub owner_scope: Option<OwnerScope>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            slug: self.slug.clone(),
            price: self.price,
            description: self.description.clone(),
        }
    }

    /// Whether the record is visible to `owner`. An unscoped lookup sees every record.
    pub fn visible_to(&self, owner: Option<&OwnerScope>) -> bool {
        match owner {
            Some(owner) => self.owner_scope.as_ref() == Some(owner),
            None => true,
        }
    }
}

/// Read-only projection of a product handed to the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: i64,
    pub description: String,
}

impl ProductSummary {
    /// Price rendered the way Vietnamese shops print it: `150.000đ`.
    pub fn formatted_price(&self) -> String {
        format_price(self.price)
    }
}

pub fn format_price(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}{grouped}đ")
}
