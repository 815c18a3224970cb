use sqlx::PgPool;

use oficina_api::models::work_order::WorkOrderStatus;
use oficina_api::repositories::work_order_repository::{
    CreateWorkOrderData, NewPartLine, NewServiceLine, WorkOrderRepository,
};
use oficina_api::utils::errors::AppError;
use oficina_api::utils::money::to_money;

async fn seed_order_context(pool: &PgPool) -> (i32, i32, i32) {
    let (customer_id,): (i32,) = sqlx::query_as(
        "INSERT INTO customers (name, document_number, email) \
         VALUES ('Maria Silva', '12345678900', 'maria@example.com') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();

    let (vehicle_id,): (i32,) = sqlx::query_as(
        "INSERT INTO vehicles (customer_id, plate, brand, model, year) \
         VALUES ($1, 'ABC1D23', 'Fiat', 'Uno', 2015) RETURNING id",
    )
    .bind(customer_id)
    .fetch_one(pool)
    .await
    .unwrap();

    let (user_id,): (i32,) = sqlx::query_as(
        "INSERT INTO users (name, email) \
         VALUES ('João Mecânico', 'joao@oficina.com') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();

    (customer_id, vehicle_id, user_id)
}

async fn seed_part(pool: &PgPool, name: &str, stock: i32, unit_price: &str) -> i32 {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO parts (name, stock, unit_price) VALUES ($1, $2, $3::numeric) RETURNING id",
    )
    .bind(name)
    .bind(stock)
    .bind(unit_price)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

async fn seed_service(pool: &PgPool, name: &str, price: &str) -> i32 {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO services (name, price) VALUES ($1, $2::numeric) RETURNING id",
    )
    .bind(name)
    .bind(price)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap();
    count
}

async fn part_stock(pool: &PgPool, part_id: i32) -> i32 {
    let (stock,): (i32,) = sqlx::query_as("SELECT stock FROM parts WHERE id = $1")
        .bind(part_id)
        .fetch_one(pool)
        .await
        .unwrap();
    stock
}

#[sqlx::test(migrations = "./migrations")]
async fn create_persists_header_lines_and_debits_stock(pool: PgPool) {
    let (customer_id, vehicle_id, user_id) = seed_order_context(&pool).await;
    let service_id = seed_service(&pool, "Troca de óleo", "150.00").await;
    let part_id = seed_part(&pool, "Filtro de óleo", 10, "25.00").await;

    let repo = WorkOrderRepository::new(pool.clone());
    let id = repo
        .create(CreateWorkOrderData {
            customer_id,
            vehicle_id,
            user_id,
            services: vec![NewServiceLine {
                service_id,
                quantity: 1,
                total_price: 15000,
            }],
            parts: vec![NewPartLine {
                part_id,
                quantity: 2,
                total_price: 5000,
            }],
            total_amount: 20000,
        })
        .await
        .unwrap();

    let order = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(order.status, WorkOrderStatus::Received);
    assert_eq!(order.total_amount, to_money(20000));
    assert_eq!(order.hash_view.len(), 20);
    assert_eq!(order.services.len(), 1);
    assert_eq!(order.parts.len(), 1);
    assert_eq!(order.parts[0].quantity, 2);

    assert_eq!(part_stock(&pool, part_id).await, 8);
}

#[sqlx::test(migrations = "./migrations")]
async fn create_rolls_back_everything_on_insufficient_stock(pool: PgPool) {
    let (customer_id, vehicle_id, user_id) = seed_order_context(&pool).await;
    let part_ok = seed_part(&pool, "Filtro de óleo", 10, "25.00").await;
    let part_low = seed_part(&pool, "Pastilha de freio", 3, "80.00").await;

    let repo = WorkOrderRepository::new(pool.clone());
    let err = repo
        .create(CreateWorkOrderData {
            customer_id,
            vehicle_id,
            user_id,
            services: vec![],
            parts: vec![
                NewPartLine {
                    part_id: part_ok,
                    quantity: 2,
                    total_price: 5000,
                },
                NewPartLine {
                    part_id: part_low,
                    quantity: 5,
                    total_price: 40000,
                },
            ],
            total_amount: 45000,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientStock(_)));
    assert!(err
        .to_string()
        .contains("Pastilha de freio. Disponível: 3, Solicitado: 5"));

    // nada persistido, nada debitado: ni para la peça válida
    assert_eq!(count(&pool, "work_orders").await, 0);
    assert_eq!(count(&pool, "work_order_parts").await, 0);
    assert_eq!(part_stock(&pool, part_ok).await, 10);
    assert_eq!(part_stock(&pool, part_low).await, 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn create_rolls_back_on_unknown_part(pool: PgPool) {
    let (customer_id, vehicle_id, user_id) = seed_order_context(&pool).await;
    let part_ok = seed_part(&pool, "Filtro de óleo", 10, "25.00").await;

    let repo = WorkOrderRepository::new(pool.clone());
    let err = repo
        .create(CreateWorkOrderData {
            customer_id,
            vehicle_id,
            user_id,
            services: vec![],
            parts: vec![
                NewPartLine {
                    part_id: part_ok,
                    quantity: 1,
                    total_price: 2500,
                },
                NewPartLine {
                    part_id: 9999,
                    quantity: 1,
                    total_price: 100,
                },
            ],
            total_amount: 2600,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(count(&pool, "work_orders").await, 0);
    assert_eq!(part_stock(&pool, part_ok).await, 10);
}

#[sqlx::test(migrations = "./migrations")]
async fn replace_line_items_applies_deltas_and_recomputes_total(pool: PgPool) {
    let (customer_id, vehicle_id, user_id) = seed_order_context(&pool).await;
    let part_id = seed_part(&pool, "Filtro de óleo", 10, "25.00").await;

    let repo = WorkOrderRepository::new(pool.clone());
    let id = repo
        .create(CreateWorkOrderData {
            customer_id,
            vehicle_id,
            user_id,
            services: vec![],
            parts: vec![NewPartLine {
                part_id,
                quantity: 4,
                total_price: 10000,
            }],
            total_amount: 10000,
        })
        .await
        .unwrap();
    assert_eq!(part_stock(&pool, part_id).await, 6);

    // bajar la cantidad de 4 a 1: delta -3 vuelve al stock
    repo.replace_line_items(
        id,
        None,
        Some(&[NewPartLine {
            part_id,
            quantity: 1,
            total_price: 2500,
        }]),
        &[(part_id, -3)],
    )
    .await
    .unwrap();

    assert_eq!(part_stock(&pool, part_id).await, 9);

    let order = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(order.total_amount, to_money(2500));
    assert_eq!(order.parts.len(), 1);
    assert_eq!(order.parts[0].quantity, 1);
}
