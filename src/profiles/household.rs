use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::{HOURS_PER_DAY, gaussian_noise};
use crate::sim::HORIZON;

/// Built-in household demand shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadProfile {
    /// Working household: morning and evening peaks.
    #[default]
    Profile1,
    /// Family at home during the day.
    Profile2,
    /// Small flat with a pronounced evening peak.
    Profile3,
}

impl LoadProfile {
    pub const ALL: [Self; 3] = [Self::Profile1, Self::Profile2, Self::Profile3];

    /// Short tag used in export file names.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Profile1 => "P1",
            Self::Profile2 => "P2",
            Self::Profile3 => "P3",
        }
    }

    /// `(base_kw, daily_amp_kw, evening_peak_kw)`
    const fn shape(self) -> (f64, f64, f64) {
        match self {
            Self::Profile1 => (0.45, 0.25, 0.9),
            Self::Profile2 => (0.6, 0.35, 0.6),
            Self::Profile3 => (0.25, 0.1, 0.7),
        }
    }
}

/// Sinusoidal daily demand plus an evening bump and Gaussian noise.
#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdLoad {
    pub profile: LoadProfile,
    /// Multiplier applied to the whole profile.
    pub scale: f64,
    /// Standard deviation of the noise in kW.
    pub noise_std: f64,
    pub seed: u64,
}

impl Default for HouseholdLoad {
    fn default() -> Self {
        Self {
            profile: LoadProfile::default(),
            scale: 1.0,
            noise_std: 0.05,
            seed: 7,
        }
    }
}

impl HouseholdLoad {
    /// Demand in kW for every hour of the horizon; never negative.
    pub fn demand_kw(&self) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let (base, amp, evening) = self.profile.shape();

        (0..HORIZON)
            .map(|t| {
                let hour = (t % HOURS_PER_DAY) as f64;
                // minimum around 04:00, maximum around 16:00
                let angle = 2.0 * std::f64::consts::PI * (hour - 10.0) / HOURS_PER_DAY as f64;
                let bump = (-(hour - 19.0).powi(2) / 4.0).exp();
                let kw = (base + amp * angle.sin() + evening * bump) * self.scale
                    + gaussian_noise(&mut rng, self.noise_std);
                kw.max(0.0)
            })
            .collect()
    }
}
