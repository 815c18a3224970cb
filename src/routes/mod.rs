pub mod work_order_routes;
