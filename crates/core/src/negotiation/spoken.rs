use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const SPOKEN_AMOUNTS: &[(u64, &str)] = &[
    (500, "five hundred"),
    (750, "seven fifty"),
    (1000, "one thousand"),
    (1200, "twelve hundred"),
    (1250, "twelve fifty"),
    (1500, "fifteen hundred"),
    (1750, "seventeen fifty"),
    (1800, "eighteen hundred"),
];

/// Renders a dollar amount the way a dispatcher would say it. Amounts
/// outside the known table fall back to the plain numeral.
pub fn spoken_amount(amount: Decimal) -> String {
    match known_amount(amount) {
        Some(spoken) => spoken.to_owned(),
        None => amount.normalize().to_string(),
    }
}

fn known_amount(amount: Decimal) -> Option<&'static str> {
    if !amount.fract().is_zero() {
        return None;
    }
    let whole = amount.to_u64()?;
    SPOKEN_AMOUNTS.iter().find(|(value, _)| *value == whole).map(|(_, spoken)| *spoken)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::spoken_amount;

    #[test]
    fn known_amounts_are_spoken() {
        assert_eq!(spoken_amount(Decimal::new(1500, 0)), "fifteen hundred");
        assert_eq!(spoken_amount(Decimal::new(150000, 2)), "fifteen hundred");
        assert_eq!(spoken_amount(Decimal::new(1250, 0)), "twelve fifty");
    }

    #[test]
    fn other_amounts_fall_back_to_numerals() {
        assert_eq!(spoken_amount(Decimal::new(2000, 0)), "2000");
        assert_eq!(spoken_amount(Decimal::new(1350, 0)), "1350");
        assert_eq!(spoken_amount(Decimal::new(165050, 2)), "1650.5");
    }
}
