use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored record: a loosely-typed JSON object. Unknown fields pass through untouched.
pub type Document = Map<String, Value>;

/// Field name under which the store-assigned identifier is exposed.
pub const ID_FIELD: &str = "_id";

/// Typed view over a product document. Every field is optional because the
/// store never validates what callers send.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "codigo", skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(rename = "marca", skip_serializing_if = "Option::is_none")]
    pub brand: Option<Value>,
    #[serde(rename = "categoria", skip_serializing_if = "Option::is_none")]
    pub category: Option<Value>,
    #[serde(rename = "unidad", skip_serializing_if = "Option::is_none")]
    pub unit: Option<Value>,
    #[serde(rename = "proveedor", skip_serializing_if = "Option::is_none")]
    pub supplier: Option<Value>,
    #[serde(rename = "costo", skip_serializing_if = "Option::is_none")]
    pub cost: Option<Value>,
    #[serde(rename = "precio", skip_serializing_if = "Option::is_none")]
    pub price: Option<Value>,
    #[serde(rename = "ganancia", skip_serializing_if = "Option::is_none")]
    pub margin: Option<Value>,
    #[serde(rename = "cantidad", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Value>,
    #[serde(rename = "minimo", skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Value>,
    #[serde(rename = "caducidad", skip_serializing_if = "Option::is_none")]
    pub expiration: Option<Value>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(flatten)]
    pub extra: Document,
}

impl Product {
    pub fn from_document(doc: Document) -> Self {
        // Every field is an optional Value, so any JSON object deserializes.
        serde_json::from_value(Value::Object(doc)).unwrap_or_default()
    }

    pub fn price(&self) -> Option<f64> {
        number(&self.price)
    }

    pub fn quantity(&self) -> Option<f64> {
        number(&self.quantity)
    }

    pub fn minimum(&self) -> Option<f64> {
        number(&self.minimum)
    }

    /// Stock value of this line: price × quantity, missing parts count as zero.
    pub fn stock_value(&self) -> f64 {
        self.price().unwrap_or(0.0) * self.quantity().unwrap_or(0.0)
    }

    pub fn is_low_stock(&self) -> bool {
        match (self.quantity(), self.minimum()) {
            (Some(quantity), Some(minimum)) => quantity <= minimum,
            _ => false,
        }
    }
}

fn number(value: &Option<Value>) -> Option<f64> {
    value.as_ref().and_then(Value::as_f64)
}
