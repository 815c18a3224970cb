//! Motor de ciclo de vida de las ordens de serviço
//!
//! Orquesta creación, transiciones de status, edición y progreso. Es el único
//! dueño de la máquina de estados y de los invariantes de stock/total.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;

use crate::dto::work_order_dto::{
    CreateWorkOrderRequest, UpdateWorkOrderRequest, WorkOrderFilter, WorkOrderPartItem,
    WorkOrderPartLineResponse, WorkOrderProgressResponse, WorkOrderResponse,
};
use crate::models::work_order::WorkOrderStatus;
use crate::repositories::customer_repository::CustomerRepository;
use crate::repositories::part_repository::PartRepository;
use crate::repositories::service_repository::ServiceRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::repositories::work_order_repository::{
    CreateWorkOrderData, NewPartLine, NewServiceLine, WorkOrderRepository,
};
use crate::services::email_queue::{EmailQueue, SendEmailDto};
use crate::utils::errors::{insufficient_stock_needed, work_order_not_found, AppError};
use crate::utils::money::to_cents;

pub struct WorkOrderService {
    work_orders: WorkOrderRepository,
    customers: CustomerRepository,
    vehicles: VehicleRepository,
    services: ServiceRepository,
    parts: PartRepository,
    email_queue: Arc<dyn EmailQueue>,
    public_app_url: String,
}

impl WorkOrderService {
    pub fn new(pool: PgPool, email_queue: Arc<dyn EmailQueue>, public_app_url: String) -> Self {
        Self {
            work_orders: WorkOrderRepository::new(pool.clone()),
            customers: CustomerRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            services: ServiceRepository::new(pool.clone()),
            parts: PartRepository::new(pool),
            email_queue,
            public_app_url,
        }
    }

    /// Crear una ordem: valida cliente/vehículo, snapshotea precios de
    /// catálogo en centavos y persiste todo en una transacción (el stock se
    /// verifica y debita adentro). Sin servicios ni peças es válido, total 0.
    pub async fn create(
        &self,
        request: CreateWorkOrderRequest,
        user_id: i32,
    ) -> Result<WorkOrderResponse, AppError> {
        self.validate_customer_and_vehicle(request.customer_id, request.vehicle_id)
            .await?;

        let mut total_amount: i64 = 0;

        let mut service_lines = Vec::new();
        for item in request.services.unwrap_or_default() {
            let service = self
                .services
                .find_by_id(item.service_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Serviço com ID {} não encontrado", item.service_id))
                })?;

            let unit_cents = to_cents(service.price).ok_or_else(|| {
                AppError::Internal(format!("Preço inválido para o serviço {}", service.id))
            })?;
            let total_price = unit_cents * i64::from(item.quantity);
            total_amount += total_price;

            service_lines.push(NewServiceLine {
                service_id: item.service_id,
                quantity: item.quantity,
                total_price,
            });
        }

        let mut part_lines = Vec::new();
        for item in request.parts.unwrap_or_default() {
            let part = self.parts.find_by_id(item.part_id).await?.ok_or_else(|| {
                AppError::NotFound(format!("Peça com ID {} não encontrada", item.part_id))
            })?;

            let unit_cents = to_cents(part.unit_price).ok_or_else(|| {
                AppError::Internal(format!("Preço inválido para a peça {}", part.id))
            })?;
            let total_price = unit_cents * i64::from(item.quantity);
            total_amount += total_price;

            part_lines.push(NewPartLine {
                part_id: item.part_id,
                quantity: item.quantity,
                total_price,
            });
        }

        let id = self
            .work_orders
            .create(CreateWorkOrderData {
                customer_id: request.customer_id,
                vehicle_id: request.vehicle_id,
                user_id,
                services: service_lines,
                parts: part_lines,
                total_amount,
            })
            .await?;

        self.find_by_id(id).await
    }

    pub async fn find_by_id(&self, id: i32) -> Result<WorkOrderResponse, AppError> {
        self.work_orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| work_order_not_found(id))
    }

    pub async fn find_all(
        &self,
        filter: WorkOrderFilter,
    ) -> Result<Vec<WorkOrderResponse>, AppError> {
        self.work_orders.find_all(&filter).await
    }

    pub async fn find_by_customer_id(
        &self,
        customer_id: i32,
    ) -> Result<Vec<WorkOrderResponse>, AppError> {
        self.work_orders
            .find_all(&WorkOrderFilter {
                customer_id: Some(customer_id),
                ..Default::default()
            })
            .await
    }

    pub async fn find_by_customer_document(
        &self,
        document: &str,
    ) -> Result<Vec<WorkOrderResponse>, AppError> {
        self.work_orders
            .find_all(&WorkOrderFilter {
                customer_document: Some(document.to_string()),
                ..Default::default()
            })
            .await
    }

    pub async fn find_by_vehicle_id(
        &self,
        vehicle_id: i32,
    ) -> Result<Vec<WorkOrderResponse>, AppError> {
        self.work_orders
            .find_all(&WorkOrderFilter {
                vehicle_id: Some(vehicle_id),
                ..Default::default()
            })
            .await
    }

    pub async fn find_by_status(
        &self,
        status: WorkOrderStatus,
    ) -> Result<Vec<WorkOrderResponse>, AppError> {
        self.work_orders
            .find_all(&WorkOrderFilter {
                status: Some(status),
                ..Default::default()
            })
            .await
    }

    pub async fn find_by_hash_view(&self, hash_view: &str) -> Result<WorkOrderResponse, AppError> {
        self.work_orders
            .find_by_hash_view(hash_view)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(
                    "Ordem de serviço não encontrada, verifique se o hash de visualização está correto"
                        .to_string(),
                )
            })
    }

    /// Editar líneas de una ordem, solo con status RECEIVED.
    ///
    /// La reconciliación de stock corre sobre el delta por peça ANTES de
    /// borrar cualquier línea; los precios se re-snapshotean del catálogo
    /// actual y el total se recalcula de las líneas finales.
    pub async fn update(
        &self,
        id: i32,
        request: UpdateWorkOrderRequest,
    ) -> Result<WorkOrderResponse, AppError> {
        let current = self.find_by_id(id).await?;

        if current.status != WorkOrderStatus::Received {
            return Err(AppError::BadRequest(
                "Apenas ordens com status RECEIVED podem ser editadas".to_string(),
            ));
        }

        let mut stock_deltas = Vec::new();
        if let Some(requested_parts) = &request.parts {
            stock_deltas = part_quantity_deltas(&current.parts, requested_parts);

            // verificar stock para los deltas positivos antes de tocar nada
            for (part_id, delta) in &stock_deltas {
                if *delta <= 0 {
                    continue;
                }
                let part = self.parts.find_by_id(*part_id).await?.ok_or_else(|| {
                    AppError::NotFound(format!("Peça com ID {} não encontrada", part_id))
                })?;
                if part.stock < *delta {
                    return Err(insufficient_stock_needed(&part.name, part.stock, *delta));
                }
            }
        }

        let service_lines = match &request.services {
            Some(items) => {
                let mut lines = Vec::new();
                for item in items {
                    let service = self
                        .services
                        .find_by_id(item.service_id)
                        .await?
                        .ok_or_else(|| {
                            AppError::NotFound(format!(
                                "Serviço com ID {} não encontrado",
                                item.service_id
                            ))
                        })?;
                    let unit_cents = to_cents(service.price).ok_or_else(|| {
                        AppError::Internal(format!("Preço inválido para o serviço {}", service.id))
                    })?;
                    lines.push(NewServiceLine {
                        service_id: item.service_id,
                        quantity: item.quantity,
                        total_price: unit_cents * i64::from(item.quantity),
                    });
                }
                Some(lines)
            }
            None => None,
        };

        let part_lines = match &request.parts {
            Some(items) => {
                let mut lines = Vec::new();
                for item in items {
                    let part = self.parts.find_by_id(item.part_id).await?.ok_or_else(|| {
                        AppError::NotFound(format!("Peça com ID {} não encontrada", item.part_id))
                    })?;
                    let unit_cents = to_cents(part.unit_price).ok_or_else(|| {
                        AppError::Internal(format!("Preço inválido para a peça {}", part.id))
                    })?;
                    lines.push(NewPartLine {
                        part_id: item.part_id,
                        quantity: item.quantity,
                        total_price: unit_cents * i64::from(item.quantity),
                    });
                }
                Some(lines)
            }
            None => None,
        };

        self.work_orders
            .replace_line_items(
                id,
                service_lines.as_deref(),
                part_lines.as_deref(),
                &stock_deltas,
            )
            .await?;

        self.find_by_id(id).await
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        self.find_by_id(id).await?;
        self.work_orders.delete(id).await
    }

    /// Avanzar el status. Los efectos colaterales (emails) se disparan antes
    /// de persistir, según el status destino; las fallas de encolado se
    /// loguean y nunca bloquean la transición.
    pub async fn update_status(
        &self,
        id: i32,
        new_status: WorkOrderStatus,
    ) -> Result<WorkOrderResponse, AppError> {
        let work_order = self.find_by_id(id).await?;

        if !work_order.status.can_transition_to(new_status) {
            return Err(AppError::BadRequest(format!(
                "Transição de status inválida: {} -> {}",
                work_order.status, new_status
            )));
        }

        let now = Utc::now();

        for email in build_status_emails(&work_order, new_status, &self.public_app_url, now) {
            if let Err(e) = self.email_queue.enqueue(email).await {
                warn!("⚠️ Falha ao enfileirar email da ordem {}: {}", id, e);
            }
        }

        let finished_at = (new_status == WorkOrderStatus::Delivered).then_some(now);

        self.work_orders
            .update_status(id, new_status, finished_at)
            .await?;

        self.find_by_id(id).await
    }

    /// Aprobación pública vía link del email: AWAITING_APPROVAL -> IN_PROGRESS.
    pub async fn approve_hash_view(&self, hash_view: &str) -> Result<WorkOrderResponse, AppError> {
        let work_order = self.find_by_hash_view(hash_view).await?;

        match self
            .update_status(work_order.id, WorkOrderStatus::InProgress)
            .await
        {
            Err(AppError::BadRequest(_)) => Err(AppError::BadRequest(
                "Ordem de serviço já aprovada ou não está aguardando aprovação".to_string(),
            )),
            result => result,
        }
    }

    /// Vista derivada de progreso; tablas estáticas, sin efectos colaterales.
    pub async fn get_work_order_progress(
        &self,
        id: i32,
    ) -> Result<WorkOrderProgressResponse, AppError> {
        let work_order = self.find_by_id(id).await?;

        Ok(WorkOrderProgressResponse {
            id: work_order.id,
            status: work_order.status,
            status_description: work_order.status.description().to_string(),
            progress: work_order.status.progress(),
        })
    }

    async fn validate_customer_and_vehicle(
        &self,
        customer_id: i32,
        vehicle_id: i32,
    ) -> Result<(), AppError> {
        let customer = self.customers.find_by_id(customer_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Cliente com ID {} não encontrado", customer_id))
        })?;

        let vehicle = self.vehicles.find_by_id(vehicle_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Veículo com ID {} não encontrado", vehicle_id))
        })?;

        if vehicle.customer_id != customer.id {
            return Err(AppError::BadRequest(
                "Cliente e veículo não correspondem".to_string(),
            ));
        }

        Ok(())
    }
}

/// Delta de stock por peça entre las líneas actuales y las solicitadas.
///
/// Positivo consume stock, negativo lo devuelve. Peças presentes hoy y
/// ausentes en la nueva lista devuelven su cantidad completa. Deltas cero
/// se omiten.
fn part_quantity_deltas(
    current: &[WorkOrderPartLineResponse],
    requested: &[WorkOrderPartItem],
) -> Vec<(i32, i32)> {
    use std::collections::HashMap;

    let current_by_part: HashMap<i32, i32> = current
        .iter()
        .map(|line| (line.part_id, line.quantity))
        .collect();

    let mut requested_by_part: HashMap<i32, i32> = HashMap::new();
    for item in requested {
        requested_by_part.insert(item.part_id, item.quantity);
    }

    let mut deltas = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for item in requested {
        if !seen.insert(item.part_id) {
            continue;
        }
        let new_quantity = requested_by_part[&item.part_id];
        let current_quantity = current_by_part.get(&item.part_id).copied().unwrap_or(0);
        let delta = new_quantity - current_quantity;
        if delta != 0 {
            deltas.push((item.part_id, delta));
        }
    }

    for line in current {
        if !requested_by_part.contains_key(&line.part_id) {
            deltas.push((line.part_id, -line.quantity));
        }
    }

    deltas
}

/// Construir las notificaciones de una transición. Puro: solo arma los
/// emails, el encolado queda en manos del que llama.
///
/// El caso AWAITING_APPROVAL es el único que además mira el status ACTUAL
/// (solo notifica viniendo de DIAGNOSING).
fn build_status_emails(
    work_order: &WorkOrderResponse,
    new_status: WorkOrderStatus,
    public_app_url: &str,
    now: DateTime<Utc>,
) -> Vec<SendEmailDto> {
    match new_status {
        WorkOrderStatus::Finished => vec![SendEmailDto {
            recipient: work_order.customer.email.clone(),
            subject: format!("Ordem de serviço {} - Finalizada", work_order.id),
            body: format!(
                "A ordem de serviço {} foi finalizada com sucesso, você pode retirar seu veículo no local!",
                work_order.id
            ),
        }],

        WorkOrderStatus::InProgress => vec![
            SendEmailDto {
                recipient: work_order.customer.email.clone(),
                subject: format!("Ordem de serviço {} - Em andamento", work_order.id),
                body: format!(
                    "A ordem de serviço {} foi iniciada com sucesso, você pode retirar seu veículo no local!",
                    work_order.id
                ),
            },
            SendEmailDto {
                recipient: work_order.user.email.clone(),
                subject: format!("Ordem de serviço {}", work_order.id),
                body: format!(
                    "A ordem de serviço {} foi confirmada e está em andamento",
                    work_order.id
                ),
            },
        ],

        WorkOrderStatus::AwaitingApproval if work_order.status == WorkOrderStatus::Diagnosing => {
            vec![SendEmailDto {
                recipient: work_order.customer.email.clone(),
                subject: format!("Ordem de serviço {} - Aguardando aprovação", work_order.id),
                body: build_approval_body(work_order, public_app_url),
            }]
        }

        WorkOrderStatus::Delivered => vec![SendEmailDto {
            recipient: work_order.customer.email.clone(),
            subject: format!("Ordem de serviço {} - Entregue", work_order.id),
            body: format!(
                "A ordem de serviço {} foi entregue em {}. Obrigado pela confiança!",
                work_order.id,
                now.format("%d/%m/%Y %H:%M")
            ),
        }],

        _ => Vec::new(),
    }
}

// Cuerpo del email de aprobación: desglose completo, total y link público
fn build_approval_body(work_order: &WorkOrderResponse, public_app_url: &str) -> String {
    let mut body = format!(
        "Olá {},\n\nA ordem de serviço {} do veículo {} aguarda sua aprovação.\n",
        work_order.customer.name, work_order.id, work_order.vehicle.plate
    );

    if !work_order.services.is_empty() {
        body.push_str("\nServiços:\n");
        for line in &work_order.services {
            body.push_str(&format!(
                "- {} (x{}): R$ {}\n",
                line.service_name, line.quantity, line.total_price
            ));
        }
    }

    if !work_order.parts.is_empty() {
        body.push_str("\nPeças:\n");
        for line in &work_order.parts {
            body.push_str(&format!(
                "- {} (x{}): R$ {}\n",
                line.part_name, line.quantity, line.total_price
            ));
        }
    }

    body.push_str(&format!("\nValor total: R$ {}\n", work_order.total_amount));
    body.push_str(&format!(
        "\nPara aprovar, acesse: {}/work-orders/approve/{}\n",
        public_app_url, work_order.hash_view
    ));

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::work_order_dto::{
        WorkOrderCustomerResponse, WorkOrderServiceLineResponse, WorkOrderUserResponse,
        WorkOrderVehicleResponse,
    };
    use crate::utils::money::to_money;
    use chrono::TimeZone;

    fn part_line(part_id: i32, quantity: i32) -> WorkOrderPartLineResponse {
        WorkOrderPartLineResponse {
            id: part_id * 10,
            part_id,
            part_name: format!("Peça {}", part_id),
            quantity,
            unit_price: to_money(5000),
            total_price: to_money(5000 * i64::from(quantity)),
        }
    }

    fn part_item(part_id: i32, quantity: i32) -> WorkOrderPartItem {
        WorkOrderPartItem { part_id, quantity }
    }

    fn sample_order(status: WorkOrderStatus) -> WorkOrderResponse {
        WorkOrderResponse {
            id: 42,
            customer_id: 1,
            vehicle_id: 2,
            status,
            total_amount: to_money(25000),
            hash_view: "a1B2c3D4e5F6g7H8i9J0".to_string(),
            started_at: Utc::now(),
            finished_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            customer: WorkOrderCustomerResponse {
                id: 1,
                name: "Maria Silva".to_string(),
                email: "maria@example.com".to_string(),
            },
            vehicle: WorkOrderVehicleResponse {
                id: 2,
                plate: "ABC1D23".to_string(),
            },
            user: WorkOrderUserResponse {
                id: 3,
                name: "João Mecânico".to_string(),
                email: "joao@oficina.com".to_string(),
            },
            services: vec![WorkOrderServiceLineResponse {
                id: 1,
                service_id: 7,
                service_name: "Troca de óleo".to_string(),
                quantity: 1,
                unit_price: to_money(15000),
                total_price: to_money(15000),
            }],
            parts: vec![part_line(9, 2)],
        }
    }

    #[test]
    fn delta_increases_when_quantity_grows() {
        let deltas = part_quantity_deltas(&[part_line(1, 2)], &[part_item(1, 5)]);
        assert_eq!(deltas, vec![(1, 3)]);
    }

    #[test]
    fn delta_returns_stock_when_quantity_shrinks() {
        let deltas = part_quantity_deltas(&[part_line(1, 3)], &[part_item(1, 1)]);
        assert_eq!(deltas, vec![(1, -2)]);
    }

    #[test]
    fn removed_part_returns_full_quantity() {
        let deltas = part_quantity_deltas(&[part_line(1, 3), part_line(2, 1)], &[part_item(2, 1)]);
        assert_eq!(deltas, vec![(1, -3)]);
    }

    #[test]
    fn new_part_consumes_full_quantity() {
        let deltas = part_quantity_deltas(&[], &[part_item(4, 2)]);
        assert_eq!(deltas, vec![(4, 2)]);
    }

    #[test]
    fn unchanged_quantity_produces_no_delta() {
        let deltas = part_quantity_deltas(&[part_line(1, 2)], &[part_item(1, 2)]);
        assert!(deltas.is_empty());
    }

    #[test]
    fn mixed_update_produces_one_delta_per_part() {
        let current = [part_line(1, 2), part_line(2, 1), part_line(3, 4)];
        let requested = [part_item(1, 3), part_item(3, 2), part_item(5, 1)];
        let deltas = part_quantity_deltas(&current, &requested);
        assert_eq!(deltas, vec![(1, 1), (3, -2), (5, 1), (2, -1)]);
    }

    #[test]
    fn finished_notifies_customer_once() {
        let order = sample_order(WorkOrderStatus::InProgress);
        let emails = build_status_emails(
            &order,
            WorkOrderStatus::Finished,
            "http://localhost:3000",
            Utc::now(),
        );

        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].recipient, "maria@example.com");
        assert_eq!(emails[0].subject, "Ordem de serviço 42 - Finalizada");
    }

    #[test]
    fn in_progress_notifies_customer_and_technician() {
        let order = sample_order(WorkOrderStatus::AwaitingApproval);
        let emails = build_status_emails(
            &order,
            WorkOrderStatus::InProgress,
            "http://localhost:3000",
            Utc::now(),
        );

        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].recipient, "maria@example.com");
        assert_eq!(emails[0].subject, "Ordem de serviço 42 - Em andamento");
        assert_eq!(emails[1].recipient, "joao@oficina.com");
        assert_eq!(
            emails[1].body,
            "A ordem de serviço 42 foi confirmada e está em andamento"
        );
    }

    #[test]
    fn awaiting_approval_from_diagnosing_sends_breakdown_and_link() {
        let order = sample_order(WorkOrderStatus::Diagnosing);
        let emails = build_status_emails(
            &order,
            WorkOrderStatus::AwaitingApproval,
            "http://localhost:3000",
            Utc::now(),
        );

        assert_eq!(emails.len(), 1);
        let body = &emails[0].body;
        assert!(body.contains("Troca de óleo (x1): R$ 150.00"));
        assert!(body.contains("Peça 9 (x2): R$ 100.00"));
        assert!(body.contains("Valor total: R$ 250.00"));
        assert!(body.contains(
            "http://localhost:3000/work-orders/approve/a1B2c3D4e5F6g7H8i9J0"
        ));
    }

    #[test]
    fn awaiting_approval_from_other_status_sends_nothing() {
        let order = sample_order(WorkOrderStatus::Received);
        let emails = build_status_emails(
            &order,
            WorkOrderStatus::AwaitingApproval,
            "http://localhost:3000",
            Utc::now(),
        );

        assert!(emails.is_empty());
    }

    #[test]
    fn delivered_includes_formatted_date() {
        let order = sample_order(WorkOrderStatus::Finished);
        let delivered_at = Utc.with_ymd_and_hms(2025, 3, 14, 15, 30, 0).unwrap();
        let emails = build_status_emails(
            &order,
            WorkOrderStatus::Delivered,
            "http://localhost:3000",
            delivered_at,
        );

        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].subject, "Ordem de serviço 42 - Entregue");
        assert!(emails[0].body.contains("14/03/2025 15:30"));
    }

    #[test]
    fn diagnosing_target_sends_nothing() {
        let order = sample_order(WorkOrderStatus::Received);
        let emails = build_status_emails(
            &order,
            WorkOrderStatus::Diagnosing,
            "http://localhost:3000",
            Utc::now(),
        );

        assert!(emails.is_empty());
    }
}
