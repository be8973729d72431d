//! rf_model.rs — Signal width/RSSI models and the spectrum synthesizer
//!
//! Turns station↔emitter distance into the observable triple and a per-bin
//! angular spectrum. None of this is physical — the mappings are chosen so
//! downstream consumers see plausible-looking numbers:
//! - width grows linearly with distance
//! - RSSI follows a 1/d² log falloff with uniform noise, clamped to the
//!   receiver's reporting range
//! - the displayed spectral peak scales with |RSSI| (weaker signal, larger
//!   peak), floored so the spectrum never degenerates
//!
//! All random draws flow through the caller's `Rng` so tests can substitute
//! a seeded generator.

use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// Reporting range of the simulated receiver, dB.
pub const RSSI_MIN_DB: f64 = -120.0;
pub const RSSI_MAX_DB: f64 = -10.0;

/// Spectral peaks never drop below this magnitude.
const PEAK_FLOOR: f64 = 0.1;

/// Gaussian half-width never narrows below this, degrees.
const SIGMA_FLOOR_DEG: f64 = 0.5;

// ── Signal models ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SignalModel {
    pub base_width_rad: f64,
    pub width_slope_rad_per_m: f64,
    pub rssi_ref_db_at_1m: f64,
    pub rssi_noise_db: f64,
    pub peak_scale_div: f64,
}

impl SignalModel {
    pub fn new(cfg: &crate::config::SignalConfig) -> Self {
        Self {
            base_width_rad: cfg.base_width_rad,
            width_slope_rad_per_m: cfg.width_slope_rad_per_m,
            rssi_ref_db_at_1m: cfg.rssi_ref_db_at_1m,
            rssi_noise_db: cfg.rssi_noise_db,
            peak_scale_div: cfg.peak_scale_div,
        }
    }

    /// Angular width in radians, strictly increasing with distance.
    pub fn width_rad(&self, distance_m: f64) -> f64 {
        self.base_width_rad + self.width_slope_rad_per_m * distance_m
    }

    /// Received signal strength in dB, clamped to the reporting range.
    /// Distances below 1 m are floored to 1 m before the logarithm.
    pub fn rssi_db(&self, distance_m: f64, rng: &mut impl Rng) -> f64 {
        let d = distance_m.max(1.0);
        let noise = if self.rssi_noise_db > 0.0 {
            Uniform::new_inclusive(-self.rssi_noise_db, self.rssi_noise_db).sample(rng)
        } else {
            0.0
        };
        (self.rssi_ref_db_at_1m - 20.0 * d.log10() + noise).clamp(RSSI_MIN_DB, RSSI_MAX_DB)
    }

    /// Displayed spectral peak magnitude from RSSI. RSSI is always negative
    /// in range, so the peak is positive; weaker signal yields a larger peak.
    pub fn peak(&self, rssi_db: f64) -> f64 {
        (-rssi_db / self.peak_scale_div).max(PEAK_FLOOR)
    }
}

// ── Spectrum synthesizer ──────────────────────────────────────────────────────

/// Build `n_bins` magnitude samples on the unit circle: a wrap-around
/// Gaussian centered at the bearing's unit-circle angle, scaled by `peak`,
/// over a background floor with independent multiplicative jitter per bin.
///
/// Every bin is regenerated from scratch each call.
pub fn synthesize_spectrum(
    n_bins: usize,
    bearing_compass_deg: f64,
    width_rad: f64,
    peak: f64,
    background: f64,
    rng: &mut impl Rng,
) -> Vec<f64> {
    // Compass bearing → unit-circle center (0° = East, counter-clockwise).
    let center = (90.0 - bearing_compass_deg + 360.0).rem_euclid(360.0);
    let sigma_deg = (width_rad.to_degrees() / 2.0).max(SIGMA_FLOOR_DEG);
    let jitter = Uniform::new(0.9, 1.1);

    (0..n_bins)
        .map(|d| {
            let mut delta = (d as f64 - center).abs();
            if delta > 180.0 {
                delta = 360.0 - delta;
            }
            let gauss = (-0.5 * (delta / sigma_deg).powi(2)).exp();
            peak * gauss + background * jitter.sample(rng)
        })
        .collect()
}
