use chrono::{DateTime, Utc};
use sqlx::FromRow;

// Struct simplificado para Customer (consumido como lookup, sin CRUD propio)
#[derive(Debug, Clone, FromRow)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub document_number: String,
    pub phone: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
