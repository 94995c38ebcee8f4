// src/dtos/product.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct IdParams {
    pub id: Option<String>,
}

impl IdParams {
    /// The identifier, treating `?id=` the same as no identifier at all.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: String,
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedResponse {
    pub message: String,
    pub modified_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub message: String,
    pub deleted_count: u64,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub total_products: usize,
    pub inventory_value: f64,
    pub low_stock: usize,
}

impl FromIterator<crate::models::product::Product> for InventorySummary {
    fn from_iter<I: IntoIterator<Item = crate::models::product::Product>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), |mut summary, product| {
            summary.total_products += 1;
            summary.inventory_value += product.stock_value();
            if product.is_low_stock() {
                summary.low_stock += 1;
            }
            summary
        })
    }
}
