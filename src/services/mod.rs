pub mod email_queue;
pub mod work_order_service;
