//! API de ordens de serviço de oficina mecánica
//!
//! Creación con snapshot de precios y reconciliación de stock, máquina de
//! estados lineal con notificaciones por email, edición solo en RECEIVED y
//! superficie pública por hash de visualización.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
