pub mod customer;
pub mod part;
pub mod service;
pub mod vehicle;
pub mod work_order;
