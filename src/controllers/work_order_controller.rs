use crate::dto::common::ApiResponse;
use crate::dto::work_order_dto::{
    CreateWorkOrderRequest, UpdateWorkOrderRequest, WorkOrderFilter, WorkOrderProgressResponse,
    WorkOrderResponse,
};
use crate::models::work_order::WorkOrderStatus;
use crate::services::work_order_service::WorkOrderService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use validator::Validate;

pub struct WorkOrderController {
    service: WorkOrderService,
}

impl WorkOrderController {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: WorkOrderService::new(
                state.pool.clone(),
                state.email_queue.clone(),
                state.config.public_app_url.clone(),
            ),
        }
    }

    pub async fn create(
        &self,
        user_id: i32,
        request: CreateWorkOrderRequest,
    ) -> Result<ApiResponse<WorkOrderResponse>, AppError> {
        // Validar campos
        request.validate()?;

        let work_order = self.service.create(request, user_id).await?;

        Ok(ApiResponse::success_with_message(
            work_order,
            "Ordem de serviço criada com sucesso".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<WorkOrderResponse, AppError> {
        self.service.find_by_id(id).await
    }

    pub async fn list(
        &self,
        filter: WorkOrderFilter,
    ) -> Result<Vec<WorkOrderResponse>, AppError> {
        self.service.find_all(filter).await
    }

    pub async fn list_by_customer(
        &self,
        customer_id: i32,
    ) -> Result<Vec<WorkOrderResponse>, AppError> {
        self.service.find_by_customer_id(customer_id).await
    }

    pub async fn list_by_customer_document(
        &self,
        document: &str,
    ) -> Result<Vec<WorkOrderResponse>, AppError> {
        self.service.find_by_customer_document(document).await
    }

    pub async fn list_by_vehicle(
        &self,
        vehicle_id: i32,
    ) -> Result<Vec<WorkOrderResponse>, AppError> {
        self.service.find_by_vehicle_id(vehicle_id).await
    }

    pub async fn list_by_status(
        &self,
        status: WorkOrderStatus,
    ) -> Result<Vec<WorkOrderResponse>, AppError> {
        self.service.find_by_status(status).await
    }

    pub async fn update(
        &self,
        id: i32,
        request: UpdateWorkOrderRequest,
    ) -> Result<ApiResponse<WorkOrderResponse>, AppError> {
        request.validate()?;

        let work_order = self.service.update(id, request).await?;

        Ok(ApiResponse::success_with_message(
            work_order,
            "Ordem de serviço atualizada com sucesso".to_string(),
        ))
    }

    pub async fn update_status(
        &self,
        id: i32,
        status: WorkOrderStatus,
    ) -> Result<ApiResponse<WorkOrderResponse>, AppError> {
        let work_order = self.service.update_status(id, status).await?;

        Ok(ApiResponse::success_with_message(
            work_order,
            "Status atualizado com sucesso".to_string(),
        ))
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        self.service.delete(id).await
    }

    // Vista pública por hash, sin autenticación
    pub async fn get_by_hash_view(&self, hash_view: &str) -> Result<WorkOrderResponse, AppError> {
        self.service.find_by_hash_view(hash_view).await
    }

    // Aprobación pública por hash, sin autenticación
    pub async fn approve_hash_view(
        &self,
        hash_view: &str,
    ) -> Result<ApiResponse<WorkOrderResponse>, AppError> {
        let work_order = self.service.approve_hash_view(hash_view).await?;

        Ok(ApiResponse::success_with_message(
            work_order,
            "Ordem de serviço aprovada com sucesso".to_string(),
        ))
    }

    pub async fn get_progress(&self, id: i32) -> Result<WorkOrderProgressResponse, AppError> {
        self.service.get_work_order_progress(id).await
    }
}
