use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, patch, post, put},
    Json, Router,
};

use crate::controllers::work_order_controller::WorkOrderController;
use crate::dto::common::ApiResponse;
use crate::dto::work_order_dto::{
    CreateWorkOrderRequest, UpdateWorkOrderRequest, UpdateWorkOrderStatusRequest, WorkOrderFilter,
    WorkOrderProgressResponse, WorkOrderResponse,
};
use crate::models::work_order::WorkOrderStatus;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_work_order_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_work_order))
        .route("/", get(list_work_orders))
        .route("/test", get(test_endpoint))
        // rutas públicas por hash, sin autenticación
        .route("/view/:hash_view", get(get_by_hash_view))
        .route("/approve/:hash_view", get(approve_by_hash_view))
        .route("/customer/:document", get(list_by_customer_document))
        .route("/by-customer/:customer_id", get(list_by_customer))
        .route("/by-vehicle/:vehicle_id", get(list_by_vehicle))
        .route("/by-status/:status", get(list_by_status))
        .route("/:id", get(get_work_order))
        .route("/:id", put(update_work_order))
        .route("/:id", delete(delete_work_order))
        .route("/:id/status", patch(update_work_order_status))
        .route("/:id/progress", get(get_work_order_progress))
}

// TODO: Extraer user_id del JWT cuando implementemos middleware de auth
// Por ahora usamos un usuario fijo de ejemplo
async fn get_user_id_from_jwt() -> i32 {
    1
}

async fn create_work_order(
    State(state): State<AppState>,
    Json(request): Json<CreateWorkOrderRequest>,
) -> Result<Json<ApiResponse<WorkOrderResponse>>, AppError> {
    let user_id = get_user_id_from_jwt().await; // TODO: Extraer del JWT
    let controller = WorkOrderController::new(&state);
    let response = controller.create(user_id, request).await?;
    Ok(Json(response))
}

async fn list_work_orders(
    State(state): State<AppState>,
    Query(filter): Query<WorkOrderFilter>,
) -> Result<Json<Vec<WorkOrderResponse>>, AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.list(filter).await?;
    Ok(Json(response))
}

async fn get_work_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<WorkOrderResponse>, AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn get_work_order_progress(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<WorkOrderProgressResponse>, AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.get_progress(id).await?;
    Ok(Json(response))
}

async fn update_work_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateWorkOrderRequest>,
) -> Result<Json<ApiResponse<WorkOrderResponse>>, AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn update_work_order_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateWorkOrderStatusRequest>,
) -> Result<Json<ApiResponse<WorkOrderResponse>>, AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.update_status(id, request.status).await?;
    Ok(Json(response))
}

async fn delete_work_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = WorkOrderController::new(&state);
    controller.delete(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Ordem de serviço excluída com sucesso"
    })))
}

async fn list_by_customer_document(
    State(state): State<AppState>,
    Path(document): Path<String>,
) -> Result<Json<Vec<WorkOrderResponse>>, AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.list_by_customer_document(&document).await?;
    Ok(Json(response))
}

async fn list_by_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i32>,
) -> Result<Json<Vec<WorkOrderResponse>>, AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.list_by_customer(customer_id).await?;
    Ok(Json(response))
}

async fn list_by_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<i32>,
) -> Result<Json<Vec<WorkOrderResponse>>, AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.list_by_vehicle(vehicle_id).await?;
    Ok(Json(response))
}

async fn list_by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> Result<Json<Vec<WorkOrderResponse>>, AppError> {
    let status: WorkOrderStatus = status.parse().map_err(AppError::BadRequest)?;
    let controller = WorkOrderController::new(&state);
    let response = controller.list_by_status(status).await?;
    Ok(Json(response))
}

async fn get_by_hash_view(
    State(state): State<AppState>,
    Path(hash_view): Path<String>,
) -> Result<Json<WorkOrderResponse>, AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.get_by_hash_view(&hash_view).await?;
    Ok(Json(response))
}

async fn approve_by_hash_view(
    State(state): State<AppState>,
    Path(hash_view): Path<String>,
) -> Result<Json<ApiResponse<WorkOrderResponse>>, AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.approve_hash_view(&hash_view).await?;
    Ok(Json(response))
}

async fn test_endpoint() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Rotas de ordens de serviço funcionando!"
    }))
}
