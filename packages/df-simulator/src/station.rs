//! station.rs — Per-station state and the once-per-tick update pipeline
//!
//! Each station is created once at startup at a fixed position and mutated
//! only here: geodesy → signal models → spectrum → render record. Stations
//! never read each other's state; only the shared emitter position couples
//! them within a tick.

use df_types::{DoaReport, GeoPoint, RecordFormat, StationStatus};
use rand::Rng;

use crate::config::{SpectrumConfig, StationConfig};
use crate::rf_model::{synthesize_spectrum, SignalModel};

#[derive(Debug, Clone)]
pub struct Station {
    pub id: String,
    pub position: GeoPoint,
    /// Strictly increases on every update; reset to 1 only by the loop
    /// policy.
    pub seq: u32,
    pub bearing_deg: f64,
    pub width_rad: f64,
    pub rssi_db: f64,
    /// Latest rendered record, replaced wholesale each update. Readers copy
    /// it under a read lock and never observe a partial write.
    pub last_record: String,
}

impl Station {
    pub fn new(cfg: &StationConfig) -> Self {
        Self {
            id: cfg.id.clone(),
            position: cfg.position(),
            seq: 1,
            bearing_deg: 0.0,
            width_rad: 0.0,
            rssi_db: 0.0,
            last_record: String::new(),
        }
    }

    /// Run the full update pipeline against the current emitter position.
    pub fn update(
        &mut self,
        emitter_pos: &GeoPoint,
        model: &SignalModel,
        spectrum_cfg: &SpectrumConfig,
        fmt: &RecordFormat,
        timestamp_ms: u64,
        rng: &mut impl Rng,
    ) {
        let distance_m = self.position.distance_m(emitter_pos);
        let bearing = self.position.initial_bearing_deg(emitter_pos);
        let width = model.width_rad(distance_m);
        let rssi = model.rssi_db(distance_m, rng);
        let peak = model.peak(rssi);

        let spectrum = synthesize_spectrum(
            spectrum_cfg.n_bins,
            bearing,
            width,
            peak,
            spectrum_cfg.background_level,
            rng,
        );

        let confidence = (99.0 * (-width).exp()).clamp(0.0, 99.0);

        let report = DoaReport {
            timestamp_ms,
            bearing_deg: bearing,
            confidence,
            rssi_db: rssi,
            center_freq_hz: spectrum_cfg.center_freq_hz,
            array_type: spectrum_cfg.array_type.clone(),
            station_id: self.id.clone(),
            station_lat_deg: self.position.lat_deg,
            station_lon_deg: self.position.lon_deg,
            gps_heading_deg: bearing,
            compass_heading_deg: bearing,
            spectrum,
        };

        self.last_record = report.to_csv_line(fmt);
        self.bearing_deg = bearing;
        self.width_rad = width;
        self.rssi_db = rssi;
        self.seq += 1;
    }

    pub fn status(&self) -> StationStatus {
        StationStatus {
            id: self.id.clone(),
            lat: self.position.lat_deg,
            lon: self.position.lon_deg,
            bearing: self.bearing_deg,
            rssi: self.rssi_db,
        }
    }
}
