use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::work_order::WorkOrderStatus;

// Item de servicio solicitado en una ordem (create/update)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WorkOrderServiceItem {
    pub service_id: i32,
    #[validate(range(min = 1, message = "Quantidade deve ser no mínimo 1"))]
    pub quantity: i32,
}

// Item de peça solicitado en una ordem (create/update)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WorkOrderPartItem {
    pub part_id: i32,
    #[validate(range(min = 1, message = "Quantidade deve ser no mínimo 1"))]
    pub quantity: i32,
}

// Request para crear una ordem de serviço
#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkOrderRequest {
    pub customer_id: i32,
    pub vehicle_id: i32,
    #[validate]
    pub services: Option<Vec<WorkOrderServiceItem>>,
    #[validate]
    pub parts: Option<Vec<WorkOrderPartItem>>,
}

// Request para editar una ordem (solo con status RECEIVED).
// `None` deja la colección como está; `Some` la reemplaza completa.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateWorkOrderRequest {
    #[validate]
    pub services: Option<Vec<WorkOrderServiceItem>>,
    #[validate]
    pub parts: Option<Vec<WorkOrderPartItem>>,
}

// Request para avanzar el status
#[derive(Debug, Deserialize)]
pub struct UpdateWorkOrderStatusRequest {
    pub status: WorkOrderStatus,
}

// Filtros opcionales del listado; se combinan con AND
#[derive(Debug, Default, Clone, Deserialize)]
pub struct WorkOrderFilter {
    pub id: Option<i32>,
    pub status: Option<WorkOrderStatus>,
    pub customer_id: Option<i32>,
    pub vehicle_id: Option<i32>,
    // match parcial sobre el CPF/CNPJ del cliente
    pub customer_document: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkOrderCustomerResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkOrderVehicleResponse {
    pub id: i32,
    pub plate: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkOrderUserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
}

// Línea de servicio con nombre resuelto; precios en unidades mayores
#[derive(Debug, Clone, Serialize)]
pub struct WorkOrderServiceLineResponse {
    pub id: i32,
    pub service_id: i32,
    pub service_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

// Línea de peça con nombre resuelto; precios en unidades mayores
#[derive(Debug, Clone, Serialize)]
pub struct WorkOrderPartLineResponse {
    pub id: i32,
    pub part_id: i32,
    pub part_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

// Representación completa de la ordem (cliente, vehículo, usuario y líneas)
#[derive(Debug, Clone, Serialize)]
pub struct WorkOrderResponse {
    pub id: i32,
    pub customer_id: i32,
    pub vehicle_id: i32,
    pub status: WorkOrderStatus,
    pub total_amount: Decimal,
    pub hash_view: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer: WorkOrderCustomerResponse,
    pub vehicle: WorkOrderVehicleResponse,
    pub user: WorkOrderUserResponse,
    pub services: Vec<WorkOrderServiceLineResponse>,
    pub parts: Vec<WorkOrderPartLineResponse>,
}

// Vista derivada de progreso; sin efectos colaterales
#[derive(Debug, Serialize)]
pub struct WorkOrderProgressResponse {
    pub id: i32,
    pub status: WorkOrderStatus,
    pub status_description: String,
    pub progress: u8,
}
