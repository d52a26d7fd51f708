use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;

pub trait BigDecimalHelpers {
    fn to_f64_or_zero(&self) -> f64;
}

impl BigDecimalHelpers for BigDecimal {
    fn to_f64_or_zero(&self) -> f64 {
        self.to_f64().unwrap_or(0.0)
    }
}

/// Converts a request amount to a two-decimal money value. NaN and infinities yield `None`.
pub fn to_money(amount: f64) -> Option<BigDecimal> {
    BigDecimal::try_from(amount)
        .ok()
        .map(|value| value.with_scale_round(2, bigdecimal::RoundingMode::HalfUp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_is_rounded_to_cents() {
        let value = to_money(199.999).unwrap();
        assert_eq!(value, BigDecimal::from(200));
        assert!(to_money(f64::NAN).is_none());
    }

    #[test]
    fn totals_convert_to_f64() {
        assert_eq!(BigDecimal::from(12).to_f64_or_zero(), 12.0);
        assert_eq!(to_money(1250.5).unwrap().to_f64_or_zero(), 1250.5);
    }
}
