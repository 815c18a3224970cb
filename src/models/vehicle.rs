use chrono::{DateTime, Utc};
use sqlx::FromRow;

// Struct simplificado para Vehicle
#[derive(Debug, Clone, FromRow)]
pub struct Vehicle {
    pub id: i32,
    pub customer_id: i32,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub created_at: DateTime<Utc>,
}
