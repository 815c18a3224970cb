use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

// Struct simplificado para Part. El stock solo se muta junto con una línea
// de ordem de serviço, nunca de forma independiente en este núcleo.
#[derive(Debug, Clone, FromRow)]
pub struct Part {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub stock: i32,
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
}
