pub mod work_order_controller;
