pub mod common;
pub mod work_order_dto;
