//! Courier fee calculation.
//!
//! Fees are charged in centavos. The base rate covers the first kilogram and
//! each started kilogram after that adds `rate_per_kg`.

/// Parcels lighter than this are billed as if they weighed this much.
pub const MIN_CHARGEABLE_WEIGHT_KG: f64 = 0.1;

/// Weight covered by the base rate.
pub const BASE_WEIGHT_KG: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourierRates {
    pub base_rate: i64,
    pub rate_per_kg: i64,
    pub max_weight_kg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShippingFee {
    Fee(i64),
    /// The parcel exceeds what the courier accepts.
    Incapable,
}

impl ShippingFee {
    pub fn amount(self) -> Option<i64> {
        match self {
            ShippingFee::Fee(amount) => Some(amount),
            ShippingFee::Incapable => None,
        }
    }
}

pub fn chargeable_weight(weight_kg: f64) -> f64 {
    weight_kg.max(MIN_CHARGEABLE_WEIGHT_KG)
}

pub fn shipping_fee(weight_kg: f64, rates: &CourierRates) -> ShippingFee {
    let weight = chargeable_weight(weight_kg);
    if weight > rates.max_weight_kg {
        return ShippingFee::Incapable;
    }
    if weight <= BASE_WEIGHT_KG {
        return ShippingFee::Fee(rates.base_rate);
    }
    let extra_kg = (weight - BASE_WEIGHT_KG).ceil() as i64;
    ShippingFee::Fee(
        rates
            .base_rate
            .saturating_add(extra_kg.saturating_mul(rates.rate_per_kg)),
    )
}

/// Sum line weights in whole grams so repeated float additions cannot push a
/// parcel over a kilogram boundary.
pub fn total_weight_kg<I>(lines: I) -> f64
where
    I: IntoIterator<Item = (f64, i32)>,
{
    let grams: i64 = lines
        .into_iter()
        .map(|(weight_kg, quantity)| {
            ((weight_kg * 1000.0).round() as i64).saturating_mul(i64::from(quantity))
        })
        .fold(0, i64::saturating_add);
    grams as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const LBC: CourierRates = CourierRates {
        base_rate: 10_000,
        rate_per_kg: 4_500,
        max_weight_kg: 20.0,
    };

    #[test]
    fn light_parcels_pay_base_rate() {
        assert_eq!(shipping_fee(0.0, &LBC), ShippingFee::Fee(10_000));
        assert_eq!(shipping_fee(0.05, &LBC), ShippingFee::Fee(10_000));
        assert_eq!(shipping_fee(1.0, &LBC), ShippingFee::Fee(10_000));
    }

    #[test]
    fn every_started_kilogram_is_charged() {
        assert_eq!(shipping_fee(1.01, &LBC), ShippingFee::Fee(14_500));
        assert_eq!(shipping_fee(2.0, &LBC), ShippingFee::Fee(14_500));
        assert_eq!(shipping_fee(2.5, &LBC), ShippingFee::Fee(19_000));
    }

    #[test]
    fn max_weight_is_inclusive() {
        assert_eq!(
            shipping_fee(20.0, &LBC),
            ShippingFee::Fee(10_000 + 19 * 4_500)
        );
        assert_eq!(shipping_fee(20.001, &LBC), ShippingFee::Incapable);
        assert_eq!(shipping_fee(20.001, &LBC).amount(), None);
    }

    #[test]
    fn courier_below_minimum_weight_is_incapable() {
        let tiny = CourierRates {
            base_rate: 5_000,
            rate_per_kg: 0,
            max_weight_kg: 0.05,
        };
        assert_eq!(shipping_fee(0.01, &tiny), ShippingFee::Incapable);
    }

    #[test]
    fn cart_weight_is_summed_in_grams() {
        let weight = total_weight_kg([(0.1, 3), (0.35, 2), (0.0, 5)]);
        assert_eq!(weight, 1.0);
        assert_eq!(shipping_fee(weight, &LBC), ShippingFee::Fee(10_000));
    }

    #[test]
    fn huge_rates_and_weights_saturate() {
        let greedy = CourierRates {
            base_rate: 10_000,
            rate_per_kg: i64::MAX / 2,
            max_weight_kg: 1_000.0,
        };
        assert_eq!(shipping_fee(10.0, &greedy), ShippingFee::Fee(i64::MAX));
        assert_eq!(total_weight_kg([(1e15, i32::MAX)]), i64::MAX as f64 / 1000.0);
    }

    proptest! {
        #[test]
        fn up_to_one_kg_costs_base_rate(weight in 0.0f64..=1.0) {
            prop_assert_eq!(shipping_fee(weight, &LBC), ShippingFee::Fee(LBC.base_rate));
        }

        #[test]
        fn above_one_kg_adds_ceiling_of_extra_weight(weight in 1.0001f64..20.0) {
            let expected = LBC.base_rate + (weight - 1.0).ceil() as i64 * LBC.rate_per_kg;
            prop_assert_eq!(shipping_fee(weight, &LBC), ShippingFee::Fee(expected));
        }

        #[test]
        fn over_max_weight_is_unusable(excess in 0.0001f64..1000.0) {
            prop_assert_eq!(
                shipping_fee(LBC.max_weight_kg + excess, &LBC),
                ShippingFee::Incapable
            );
        }

        #[test]
        fn fee_never_decreases_with_weight(a in 0.0f64..20.0, b in 0.0f64..20.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let lo_fee = shipping_fee(lo, &LBC).amount().unwrap_or(i64::MAX);
            let hi_fee = shipping_fee(hi, &LBC).amount().unwrap_or(i64::MAX);
            prop_assert!(lo_fee <= hi_fee);
        }
    }
}
