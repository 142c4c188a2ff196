use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::{HOURS_PER_DAY, gaussian_noise};
use crate::sim::HORIZON;

/// VAT applied on top of wholesale price and fees.
pub const VAT_FACTOR: f64 = 1.19;

/// Surcharges turning a wholesale price into a customer price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdditionalCosts {
    pub apply: bool,
    /// Taxes and levies (ct/kWh).
    pub taxes_and_fees_ct_kwh: f64,
    /// Network charges (ct/kWh).
    pub grid_fees_ct_kwh: f64,
}

impl Default for AdditionalCosts {
    fn default() -> Self {
        Self {
            apply: true,
            taxes_and_fees_ct_kwh: 5.0,
            grid_fees_ct_kwh: 12.0,
        }
    }
}

/// Customer price in EUR/kWh.
///
/// With additional costs applied the price is
/// `(wholesale + taxes/100 + grid_fees/100) * 1.19`; otherwise the
/// wholesale price is passed through.
pub fn customer_price(wholesale_eur_kwh: &[f64], costs: &AdditionalCosts) -> Vec<f64> {
    if !costs.apply {
        return wholesale_eur_kwh.to_vec();
    }
    let surcharge = costs.taxes_and_fees_ct_kwh / 100.0 + costs.grid_fees_ct_kwh / 100.0;
    wholesale_eur_kwh
        .iter()
        .map(|p| (p + surcharge) * VAT_FACTOR)
        .collect()
}

/// Morning and evening peak weights for hour `h`.
fn daily_peaks(hour: f64) -> f64 {
    let morning = (-(hour - 8.0).powi(2) / 6.0).exp();
    let evening = (-(hour - 19.0).powi(2) / 8.0).exp();
    0.6 * morning + evening
}

/// Synthetic day-ahead wholesale price (EUR/kWh), never negative.
pub fn wholesale_price_eur_kwh(seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..HORIZON)
        .map(|t| {
            let hour = (t % HOURS_PER_DAY) as f64;
            (0.05 + 0.06 * daily_peaks(hour) + gaussian_noise(&mut rng, 0.005)).max(0.0)
        })
        .collect()
}

/// Synthetic specific CO2 emissions of grid electricity (g/kWh).
///
/// Lower around midday when solar is on the grid, higher at the peaks.
pub fn co2_intensity_g_kwh(seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..HORIZON)
        .map(|t| {
            let hour = (t % HOURS_PER_DAY) as f64;
            let midday_dip = (-(hour - 13.0).powi(2) / 10.0).exp();
            (420.0 + 80.0 * daily_peaks(hour) - 90.0 * midday_dip + gaussian_noise(&mut rng, 10.0))
                .max(0.0)
        })
        .collect()
}
