use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

// Struct simplificado para Service. `price` en unidades mayores (NUMERIC),
// el snapshot en centavos se calcula al agregarlo a una ordem.
#[derive(Debug, Clone, FromRow)]
pub struct Service {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}
