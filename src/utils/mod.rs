pub mod errors;
pub mod hash;
pub mod money;
