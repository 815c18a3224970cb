//! Repositorio de ordens de serviço
//!
//! Todas las escrituras multi-fila (header + líneas + stock) corren dentro
//! de una única transacción: o se confirma todo, o no queda nada.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::dto::work_order_dto::{
    WorkOrderCustomerResponse, WorkOrderFilter, WorkOrderPartLineResponse, WorkOrderResponse,
    WorkOrderServiceLineResponse, WorkOrderUserResponse, WorkOrderVehicleResponse,
};
use crate::models::work_order::WorkOrderStatus;
use crate::utils::errors::{insufficient_stock_requested, work_order_not_found, AppError};
use crate::utils::hash::{generate_unique_hash, HASH_VIEW_LENGTH};

/// Línea de servicio lista para insertar (precio ya snapshoteado en centavos)
#[derive(Debug, Clone)]
pub struct NewServiceLine {
    pub service_id: i32,
    pub quantity: i32,
    pub total_price: i64,
}

/// Línea de peça lista para insertar (precio ya snapshoteado en centavos)
#[derive(Debug, Clone)]
pub struct NewPartLine {
    pub part_id: i32,
    pub quantity: i32,
    pub total_price: i64,
}

/// Datos ya validados/priceados para crear una ordem
#[derive(Debug)]
pub struct CreateWorkOrderData {
    pub customer_id: i32,
    pub vehicle_id: i32,
    pub user_id: i32,
    pub services: Vec<NewServiceLine>,
    pub parts: Vec<NewPartLine>,
    pub total_amount: i64,
}

// Header + relaciones resueltas en una sola consulta
#[derive(Debug, sqlx::FromRow)]
struct WorkOrderJoinedRow {
    id: i32,
    customer_id: i32,
    vehicle_id: i32,
    user_id: i32,
    status: String,
    total_amount: i64,
    hash_view: String,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    customer_name: String,
    customer_email: String,
    vehicle_plate: String,
    user_name: String,
    user_email: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ServiceLineJoinedRow {
    id: i32,
    work_order_id: i32,
    service_id: i32,
    service_name: String,
    quantity: i32,
    unit_price: Decimal,
    total_price: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct PartLineJoinedRow {
    id: i32,
    work_order_id: i32,
    part_id: i32,
    part_name: String,
    quantity: i32,
    unit_price: Decimal,
    total_price: i64,
}

const BASE_SELECT: &str = "SELECT wo.id, wo.customer_id, wo.vehicle_id, wo.user_id, wo.status, \
     wo.total_amount, wo.hash_view, wo.started_at, wo.finished_at, wo.created_at, wo.updated_at, \
     c.name AS customer_name, c.email AS customer_email, \
     v.plate AS vehicle_plate, \
     u.name AS user_name, u.email AS user_email \
     FROM work_orders wo \
     JOIN customers c ON c.id = wo.customer_id \
     JOIN vehicles v ON v.id = wo.vehicle_id \
     JOIN users u ON u.id = wo.user_id \
     WHERE 1=1";

pub struct WorkOrderRepository {
    pool: PgPool,
}

impl WorkOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Crear la ordem completa: header, líneas y débito de stock, todo o nada.
    ///
    /// El hash de visualización se genera acá, una única vez. El stock se
    /// verifica dentro de la transacción; si falta stock para cualquier peça
    /// la transacción entera se revierte sin filas ni débitos parciales.
    pub async fn create(&self, data: CreateWorkOrderData) -> Result<i32, AppError> {
        let mut tx = self.pool.begin().await?;

        let (work_order_id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO work_orders (customer_id, vehicle_id, user_id, status, total_amount, hash_view)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(data.customer_id)
        .bind(data.vehicle_id)
        .bind(data.user_id)
        .bind(WorkOrderStatus::Received.as_str())
        .bind(data.total_amount)
        .bind(generate_unique_hash(HASH_VIEW_LENGTH))
        .fetch_one(&mut *tx)
        .await?;

        for line in &data.services {
            sqlx::query(
                r#"
                INSERT INTO work_order_services (work_order_id, service_id, quantity, total_price)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(work_order_id)
            .bind(line.service_id)
            .bind(line.quantity)
            .bind(line.total_price)
            .execute(&mut *tx)
            .await?;
        }

        for line in &data.parts {
            let part: Option<(String, i32)> =
                sqlx::query_as("SELECT name, stock FROM parts WHERE id = $1")
                    .bind(line.part_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            let (part_name, stock) = part.ok_or_else(|| {
                AppError::NotFound(format!("Peça com ID {} não encontrada", line.part_id))
            })?;

            if stock < line.quantity {
                // el drop de la transacción revierte header y líneas ya insertadas
                return Err(insufficient_stock_requested(&part_name, stock, line.quantity));
            }

            sqlx::query(
                r#"
                INSERT INTO work_order_parts (work_order_id, part_id, quantity, total_price)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(work_order_id)
            .bind(line.part_id)
            .bind(line.quantity)
            .bind(line.total_price)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE parts SET stock = stock - $2 WHERE id = $1")
                .bind(line.part_id)
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(work_order_id)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<WorkOrderResponse>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(BASE_SELECT);
        qb.push(" AND wo.id = ").push_bind(id);
        let mut results = self.fetch_assembled(qb).await?;
        Ok(results.pop())
    }

    pub async fn find_by_hash_view(
        &self,
        hash_view: &str,
    ) -> Result<Option<WorkOrderResponse>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(BASE_SELECT);
        qb.push(" AND wo.hash_view = ").push_bind(hash_view.to_string());
        let mut results = self.fetch_assembled(qb).await?;
        Ok(results.pop())
    }

    /// Listado con filtros opcionales combinados por AND; sin filtros trae todo.
    pub async fn find_all(
        &self,
        filter: &WorkOrderFilter,
    ) -> Result<Vec<WorkOrderResponse>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(BASE_SELECT);

        if let Some(id) = filter.id {
            qb.push(" AND wo.id = ").push_bind(id);
        }

        if let Some(status) = filter.status {
            qb.push(" AND wo.status = ").push_bind(status.as_str());
        }

        if let Some(customer_id) = filter.customer_id {
            qb.push(" AND wo.customer_id = ").push_bind(customer_id);
        }

        if let Some(vehicle_id) = filter.vehicle_id {
            qb.push(" AND wo.vehicle_id = ").push_bind(vehicle_id);
        }

        if let Some(document) = &filter.customer_document {
            if !document.trim().is_empty() {
                qb.push(" AND c.document_number LIKE ")
                    .push_bind(format!("%{}%", document));
            }
        }

        qb.push(" ORDER BY wo.created_at DESC");

        self.fetch_assembled(qb).await
    }

    /// Reemplazo atómico de líneas: deltas de stock, delete+insert de las
    /// colecciones provistas y recálculo del total desde las líneas finales.
    pub async fn replace_line_items(
        &self,
        work_order_id: i32,
        services: Option<&[NewServiceLine]>,
        parts: Option<&[NewPartLine]>,
        stock_deltas: &[(i32, i32)],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // delta positivo consume stock, negativo lo devuelve
        for (part_id, delta) in stock_deltas {
            sqlx::query("UPDATE parts SET stock = stock - $2 WHERE id = $1")
                .bind(part_id)
                .bind(delta)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(services) = services {
            sqlx::query("DELETE FROM work_order_services WHERE work_order_id = $1")
                .bind(work_order_id)
                .execute(&mut *tx)
                .await?;

            for line in services {
                sqlx::query(
                    r#"
                    INSERT INTO work_order_services (work_order_id, service_id, quantity, total_price)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(work_order_id)
                .bind(line.service_id)
                .bind(line.quantity)
                .bind(line.total_price)
                .execute(&mut *tx)
                .await?;
            }
        }

        if let Some(parts) = parts {
            sqlx::query("DELETE FROM work_order_parts WHERE work_order_id = $1")
                .bind(work_order_id)
                .execute(&mut *tx)
                .await?;

            for line in parts {
                sqlx::query(
                    r#"
                    INSERT INTO work_order_parts (work_order_id, part_id, quantity, total_price)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(work_order_id)
                .bind(line.part_id)
                .bind(line.quantity)
                .bind(line.total_price)
                .execute(&mut *tx)
                .await?;
            }
        }

        // invariante: total_amount == suma de las líneas persistidas
        sqlx::query(
            r#"
            UPDATE work_orders
            SET total_amount =
                COALESCE((SELECT SUM(total_price) FROM work_order_services WHERE work_order_id = $1), 0)
              + COALESCE((SELECT SUM(total_price) FROM work_order_parts WHERE work_order_id = $1), 0),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(work_order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    pub async fn update_status(
        &self,
        id: i32,
        status: WorkOrderStatus,
        finished_at: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE work_orders
            SET status = $2, finished_at = COALESCE($3, finished_at), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(finished_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(work_order_not_found(id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        // las líneas caen por ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM work_orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(work_order_not_found(id));
        }

        Ok(())
    }

    /// Ejecutar la consulta de headers y armar las respuestas con sus líneas.
    async fn fetch_assembled(
        &self,
        mut qb: QueryBuilder<'_, Postgres>,
    ) -> Result<Vec<WorkOrderResponse>, AppError> {
        let headers: Vec<WorkOrderJoinedRow> =
            qb.build_query_as().fetch_all(&self.pool).await?;

        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = headers.iter().map(|h| h.id).collect();

        let service_lines: Vec<ServiceLineJoinedRow> = sqlx::query_as(
            r#"
            SELECT wos.id, wos.work_order_id, wos.service_id, s.name AS service_name,
                   wos.quantity, s.price AS unit_price, wos.total_price
            FROM work_order_services wos
            JOIN services s ON s.id = wos.service_id
            WHERE wos.work_order_id = ANY($1)
            ORDER BY wos.id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let part_lines: Vec<PartLineJoinedRow> = sqlx::query_as(
            r#"
            SELECT wop.id, wop.work_order_id, wop.part_id, p.name AS part_name,
                   wop.quantity, p.unit_price AS unit_price, wop.total_price
            FROM work_order_parts wop
            JOIN parts p ON p.id = wop.part_id
            WHERE wop.work_order_id = ANY($1)
            ORDER BY wop.id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut services_by_order: HashMap<i32, Vec<WorkOrderServiceLineResponse>> = HashMap::new();
        for line in service_lines {
            services_by_order
                .entry(line.work_order_id)
                .or_default()
                .push(WorkOrderServiceLineResponse {
                    id: line.id,
                    service_id: line.service_id,
                    service_name: line.service_name,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    total_price: crate::utils::money::to_money(line.total_price),
                });
        }

        let mut parts_by_order: HashMap<i32, Vec<WorkOrderPartLineResponse>> = HashMap::new();
        for line in part_lines {
            parts_by_order
                .entry(line.work_order_id)
                .or_default()
                .push(WorkOrderPartLineResponse {
                    id: line.id,
                    part_id: line.part_id,
                    part_name: line.part_name,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    total_price: crate::utils::money::to_money(line.total_price),
                });
        }

        headers
            .into_iter()
            .map(|row| {
                let status: WorkOrderStatus = row
                    .status
                    .parse()
                    .map_err(AppError::Internal)?;

                Ok(WorkOrderResponse {
                    id: row.id,
                    customer_id: row.customer_id,
                    vehicle_id: row.vehicle_id,
                    status,
                    total_amount: crate::utils::money::to_money(row.total_amount),
                    hash_view: row.hash_view,
                    started_at: row.started_at,
                    finished_at: row.finished_at,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                    customer: WorkOrderCustomerResponse {
                        id: row.customer_id,
                        name: row.customer_name,
                        email: row.customer_email,
                    },
                    vehicle: WorkOrderVehicleResponse {
                        id: row.vehicle_id,
                        plate: row.vehicle_plate,
                    },
                    user: WorkOrderUserResponse {
                        id: row.user_id,
                        name: row.user_name,
                        email: row.user_email,
                    },
                    services: services_by_order.remove(&row.id).unwrap_or_default(),
                    parts: parts_by_order.remove(&row.id).unwrap_or_default(),
                })
            })
            .collect()
    }
}
