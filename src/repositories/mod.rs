pub mod customer_repository;
pub mod part_repository;
pub mod service_repository;
pub mod vehicle_repository;
pub mod work_order_repository;
