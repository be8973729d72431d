//! config.rs — Simulator configuration
//!
//! Deserialized once at startup from `config.toml` (or the compiled-in
//! default) and validated before the first tick. Invalid parameters are a
//! fatal startup error; the simulator never produces reports from a config
//! that failed validation.

use df_types::{GeoPoint, RecordFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::emitter::EndOfPathPolicy;

// ── Config structs ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct FullConfig {
    pub stations: Vec<StationConfig>,
    pub emitter: EmitterConfig,
    pub timing: TimingConfig,
    pub signal: SignalConfig,
    pub spectrum: SpectrumConfig,
    #[serde(default)]
    pub format: RecordFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub alt_m: f64,
    pub port: u16,
}

impl StationConfig {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon, self.alt_m)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmitterConfig {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
    pub speed_mps: f64,
    pub on_reach_end: EndOfPathPolicy,
    /// ± meters of per-tick position jitter (0 = off).
    #[serde(default)]
    pub position_jitter_m: f64,
}

impl EmitterConfig {
    pub fn start(&self) -> GeoPoint {
        GeoPoint::new(self.start_lat, self.start_lon, 0.0)
    }

    pub fn end(&self) -> GeoPoint {
        GeoPoint::new(self.end_lat, self.end_lon, 0.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    pub tick_period_s: f64,
    /// ± ms of jitter on each tick's firing instant.
    pub tick_jitter_ms: f64,
    /// Extra ± ms on the reported timestamp, on top of tick jitter (0 = off).
    #[serde(default)]
    pub timestamp_jitter_ms: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalConfig {
    pub base_width_rad: f64,
    pub width_slope_rad_per_m: f64,
    pub rssi_ref_db_at_1m: f64,
    pub rssi_noise_db: f64,
    pub peak_scale_div: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpectrumConfig {
    pub n_bins: usize,
    pub background_level: f64,
    pub center_freq_hz: u64,
    pub array_type: String,
}

// ── Validation ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no stations configured")]
    NoStations,

    #[error("station `{id}`: coordinates ({lat}, {lon}) out of range")]
    StationCoordinates { id: String, lat: f64, lon: f64 },

    #[error("stations `{a}` and `{b}` both bind port {port}")]
    DuplicatePort { a: String, b: String, port: u16 },

    #[error("emitter coordinates ({lat}, {lon}) out of range")]
    EmitterCoordinates { lat: f64, lon: f64 },

    #[error("emitter speed must be non-negative, got {0} m/s")]
    NegativeSpeed(f64),

    #[error("emitter position jitter must be non-negative, got {0} m")]
    NegativePositionJitter(f64),

    #[error("tick period must be positive, got {0} s")]
    NonPositiveTickPeriod(f64),

    #[error("tick jitter must be non-negative, got {0} ms")]
    NegativeTickJitter(f64),

    #[error("timestamp jitter must be non-negative, got {0} ms")]
    NegativeTimestampJitter(f64),

    #[error("spectrum bin count must be positive")]
    ZeroBins,

    #[error("RSSI noise must be non-negative, got {0} dB")]
    NegativeRssiNoise(f64),

    #[error("peak scale divisor must be positive, got {0}")]
    NonPositivePeakScale(f64),
}

fn coords_ok(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

impl FullConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stations.is_empty() {
            return Err(ConfigError::NoStations);
        }
        for st in &self.stations {
            if !coords_ok(st.lat, st.lon) {
                return Err(ConfigError::StationCoordinates {
                    id: st.id.clone(),
                    lat: st.lat,
                    lon: st.lon,
                });
            }
        }
        for (i, a) in self.stations.iter().enumerate() {
            for b in &self.stations[i + 1..] {
                if a.port == b.port {
                    return Err(ConfigError::DuplicatePort {
                        a: a.id.clone(),
                        b: b.id.clone(),
                        port: a.port,
                    });
                }
            }
        }

        let e = &self.emitter;
        if !coords_ok(e.start_lat, e.start_lon) {
            return Err(ConfigError::EmitterCoordinates { lat: e.start_lat, lon: e.start_lon });
        }
        if !coords_ok(e.end_lat, e.end_lon) {
            return Err(ConfigError::EmitterCoordinates { lat: e.end_lat, lon: e.end_lon });
        }
        if !e.speed_mps.is_finite() || e.speed_mps < 0.0 {
            return Err(ConfigError::NegativeSpeed(e.speed_mps));
        }
        if e.position_jitter_m < 0.0 {
            return Err(ConfigError::NegativePositionJitter(e.position_jitter_m));
        }

        let t = &self.timing;
        if !t.tick_period_s.is_finite() || t.tick_period_s <= 0.0 {
            return Err(ConfigError::NonPositiveTickPeriod(t.tick_period_s));
        }
        if t.tick_jitter_ms < 0.0 {
            return Err(ConfigError::NegativeTickJitter(t.tick_jitter_ms));
        }
        if t.timestamp_jitter_ms < 0.0 {
            return Err(ConfigError::NegativeTimestampJitter(t.timestamp_jitter_ms));
        }

        if self.spectrum.n_bins == 0 {
            return Err(ConfigError::ZeroBins);
        }
        if self.signal.rssi_noise_db < 0.0 {
            return Err(ConfigError::NegativeRssiNoise(self.signal.rssi_noise_db));
        }
        if self.signal.peak_scale_div <= 0.0 {
            return Err(ConfigError::NonPositivePeakScale(self.signal.peak_scale_div));
        }
        Ok(())
    }
}
