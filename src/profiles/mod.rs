//! Deterministic default input series for one simulated week.
//!
//! Every generator is seeded, so the same configuration always yields the
//! same series.

/// Wholesale price, CO2 intensity and customer price.
pub mod grid;
/// Household demand profiles.
pub mod household;
/// PV capacity factor.
pub mod solar;

use rand::{Rng, rngs::StdRng};

pub use grid::{AdditionalCosts, co2_intensity_g_kwh, customer_price, wholesale_price_eur_kwh};
pub use household::{HouseholdLoad, LoadProfile};
pub use solar::SolarProfile;

/// Hours per simulated day.
pub const HOURS_PER_DAY: usize = 24;

/// Gaussian noise via the Box-Muller transform.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `std_dev` - Standard deviation of the noise
///
/// # Returns
///
/// Sample from N(0, `std_dev`²), or 0.0 when `std_dev <= 0`
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Half-sine daylight shape: 0 outside `[sunrise, sunset)`, 1 at solar noon.
pub fn daylight_frac(hour_of_day: usize, sunrise: usize, sunset: usize) -> f64 {
    if sunrise >= sunset || hour_of_day < sunrise || hour_of_day >= sunset {
        return 0.0;
    }
    let span = (sunset - sunrise) as f64;
    (std::f64::consts::PI * (hour_of_day - sunrise) as f64 / span).sin()
}
