//! Generación del hash de visualización
//!
//! Token opaco usado en los links públicos de consulta/aprobación de una
//! ordem de serviço. Se genera una única vez en la creación.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Longitud estándar del hash de visualización.
pub const HASH_VIEW_LENGTH: usize = 20;

/// Generar un token alfanumérico aleatorio de `length` caracteres.
pub fn generate_unique_hash(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
