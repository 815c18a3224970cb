//! Conversión de valores monetarios
//!
//! Los montos persistidos son siempre enteros en centavos; el catálogo
//! expone precios en unidades mayores (`Decimal`). Nunca float en montos.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Convertir un valor en unidades mayores (ej: 150.00) a centavos enteros.
///
/// Retorna `None` si el valor no cabe en `i64` después del redondeo.
pub fn to_cents(value: Decimal) -> Option<i64> {
    (value * Decimal::ONE_HUNDRED).round().to_i64()
}

/// Convertir centavos enteros de vuelta a unidades mayores con 2 decimales.
pub fn to_money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn converts_major_units_to_cents() {
        assert_eq!(to_cents(Decimal::from_str("150.00").unwrap()), Some(15000));
        assert_eq!(to_cents(Decimal::from_str("99.99").unwrap()), Some(9999));
        assert_eq!(to_cents(Decimal::ZERO), Some(0));
    }

    #[test]
    fn rounds_sub_cent_values() {
        // banker's rounding del Decimal: 10.005 -> 10.00, 10.015 -> 10.02
        assert_eq!(to_cents(Decimal::from_str("10.005").unwrap()), Some(1000));
        assert_eq!(to_cents(Decimal::from_str("10.015").unwrap()), Some(1002));
    }

    #[test]
    fn converts_cents_back_to_money() {
        assert_eq!(to_money(15000), Decimal::from_str("150.00").unwrap());
        assert_eq!(to_money(1), Decimal::from_str("0.01").unwrap());
        assert_eq!(to_money(0), Decimal::from_str("0.00").unwrap());
    }

    #[test]
    fn round_trip_is_stable() {
        for cents in [0i64, 1, 99, 100, 12345, 9_999_999] {
            assert_eq!(to_cents(to_money(cents)), Some(cents));
        }
    }
}
