use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{HOURS_PER_DAY, daylight_frac, gaussian_noise};
use crate::sim::HORIZON;

/// Week-long PV capacity factor generator.
///
/// Each day gets a random clearness factor, each daylight hour a half-sine
/// shape with multiplicative noise. Values are clamped to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarProfile {
    /// Hour of day when generation starts (inclusive).
    pub sunrise_hour: usize,
    /// Hour of day when generation ends (exclusive).
    pub sunset_hour: usize,
    /// Capacity factor at solar noon on a clear day.
    pub peak_cf: f64,
    /// Lowest daily clearness factor; the highest is 1.
    pub min_clearness: f64,
    /// Standard deviation of the hourly noise as a fraction of output.
    pub noise_std: f64,
    pub seed: u64,
}

impl Default for SolarProfile {
    fn default() -> Self {
        Self {
            sunrise_hour: 8,
            sunset_hour: 17,
            peak_cf: 0.55,
            min_clearness: 0.3,
            noise_std: 0.1,
            seed: 42,
        }
    }
}

impl SolarProfile {
    /// Capacity factors for every hour of the horizon.
    pub fn capacity_factor(&self) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let min_clearness = self.min_clearness.clamp(0.0, 1.0);
        let mut clearness = 1.0;

        (0..HORIZON)
            .map(|t| {
                let hour = t % HOURS_PER_DAY;
                if hour == 0 {
                    clearness = rng.random_range(min_clearness..=1.0);
                }
                let frac = daylight_frac(hour, self.sunrise_hour, self.sunset_hour);
                if frac <= 0.0 {
                    return 0.0;
                }
                let noise_mult = 1.0 + gaussian_noise(&mut rng, self.noise_std);
                (self.peak_cf * clearness * frac * noise_mult).clamp(0.0, 1.0)
            })
            .collect()
    }

    /// PV generation in kW for an installation of `capacity_kw`.
    pub fn generation_kw(&self, capacity_kw: f64) -> Vec<f64> {
        self.capacity_factor()
            .into_iter()
            .map(|cf| cf * capacity_kw.max(0.0))
            .collect()
    }
}
