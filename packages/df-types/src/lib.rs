//! # df-types
//!
//! Shared record structures for the DF station simulator.
//!
//! These types are used by:
//! - `df-simulator`: rendering one report record per station per tick
//! - downstream hub/consumer software: parsing the CSV records and the
//!   `/status.json` response
//!
//! ## Conventions
//!
//! - **Compass bearing**: degrees clockwise from true North, [0, 360)
//! - **Unit-circle angle**: degrees counter-clockwise from East (spectrum bins)
//! - **RSSI**: dB, always inside [-120, -10]
//!
//! The CSV record is a single line of `17 + N` comma-separated fields for a
//! spectrum of `N` bins; field order is fixed and identical for every station.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

// ── Geographic Point ──────────────────────────────────────────────────────────

/// Mean Earth radius used by the haversine distance.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A geographic position (degrees, meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_m: f64,
}

impl GeoPoint {
    pub fn new(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        Self { lat_deg, lon_deg, alt_m }
    }

    /// Great-circle distance to another point in meters (haversine).
    /// Symmetric; zero iff the points coincide. Altitude is ignored.
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let dlat = (other.lat_deg - self.lat_deg).to_radians();
        let dlon = (other.lon_deg - self.lon_deg).to_radians();
        let a = (dlat / 2.0).sin().powi(2)
            + self.lat_deg.to_radians().cos()
                * other.lat_deg.to_radians().cos()
                * (dlon / 2.0).sin().powi(2);
        EARTH_RADIUS_M * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// Forward azimuth from `self` toward `other`, compass degrees in [0, 360).
    ///
    /// Not symmetric. For coincident points the formula degenerates to
    /// `atan2(0, 0) = 0`, so the bearing of a point toward itself is 0°.
    pub fn initial_bearing_deg(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat_deg.to_radians();
        let lat2 = other.lat_deg.to_radians();
        let dlon = (other.lon_deg - self.lon_deg).to_radians();
        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }
}

/// Local linear scale at a given latitude: degrees of latitude and longitude
/// per meter of ground displacement. Used to place points by meter offsets.
pub fn degrees_per_meter(lat_deg: f64) -> (f64, f64) {
    let d_lat = 1.0 / 111_320.0;
    let d_lon = 1.0 / (111_320.0 * lat_deg.to_radians().cos());
    (d_lat, d_lon)
}

// ── Record Formatting ─────────────────────────────────────────────────────────

/// Decimal precision per field class of the CSV record.
///
/// Confidence and the two heading fields are always rendered with 1 decimal
/// place; those are part of the fixed record contract, not configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordFormat {
    pub rssi_decimals: usize,
    pub latlon_decimals: usize,
    pub spectrum_decimals: usize,
}

impl Default for RecordFormat {
    fn default() -> Self {
        Self {
            rssi_decimals: 2,
            latlon_decimals: 6,
            spectrum_decimals: 2,
        }
    }
}

// ── DOA Report ────────────────────────────────────────────────────────────────

/// Number of fields preceding the spectrum bins in a rendered record.
pub const FIXED_FIELD_COUNT: usize = 17;

/// One station's report for one tick — an immutable snapshot combining the
/// observable triple, station identity/position and the full spectrum.
///
/// `bearing_deg` is kept unrounded; rendering rounds it for field 2 while the
/// heading fields (11/12) carry the unrounded value at 1 decimal place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoaReport {
    /// Milliseconds since process start.
    pub timestamp_ms: u64,
    pub bearing_deg: f64,
    /// Detection confidence in [0, 99].
    pub confidence: f64,
    pub rssi_db: f64,
    pub center_freq_hz: u64,
    pub array_type: String,
    pub station_id: String,
    pub station_lat_deg: f64,
    pub station_lon_deg: f64,
    /// Both heading fields report the computed bearing (heading source "GPS").
    pub gps_heading_deg: f64,
    pub compass_heading_deg: f64,
    /// Per-bin magnitudes on the unit circle, bin order.
    pub spectrum: Vec<f64>,
}

impl DoaReport {
    /// Total field count of the rendered record.
    pub fn field_count(&self) -> usize {
        FIXED_FIELD_COUNT + self.spectrum.len()
    }

    /// Render the fixed-field CSV line (no trailing newline).
    pub fn to_csv_line(&self, fmt: &RecordFormat) -> String {
        let mut line = String::with_capacity(96 + self.spectrum.len() * 8);

        // Field 2 wraps the rounded bearing into [0, 359].
        let bearing_int = (self.bearing_deg.round() as i64).rem_euclid(360);

        let _ = write!(line, "{}", self.timestamp_ms);
        let _ = write!(line, ",{bearing_int}");
        let _ = write!(line, ",{:.1}", self.confidence);
        let _ = write!(line, ",{:.*}", fmt.rssi_decimals, self.rssi_db);
        let _ = write!(line, ",{}", self.center_freq_hz);
        let _ = write!(line, ",{}", self.array_type);
        line.push_str(",50"); // latency ms (fake)
        let _ = write!(line, ",{}", self.station_id);
        let _ = write!(line, ",{:.*}", fmt.latlon_decimals, self.station_lat_deg);
        let _ = write!(line, ",{:.*}", fmt.latlon_decimals, self.station_lon_deg);
        let _ = write!(line, ",{:.1}", self.gps_heading_deg);
        let _ = write!(line, ",{:.1}", self.compass_heading_deg);
        line.push_str(",GPS"); // main heading source
        line.push_str(",0,0,0,0"); // reserved
        for v in &self.spectrum {
            let _ = write!(line, ",{:.*}", fmt.spectrum_decimals, v);
        }
        line
    }
}

// ── Station Status ────────────────────────────────────────────────────────────

/// Response body of a station's `/status.json` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationStatus {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    /// Last computed bearing, compass degrees.
    pub bearing: f64,
    /// Last computed RSSI, dB.
    pub rssi: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(bearing: f64, n_bins: usize) -> DoaReport {
        DoaReport {
            timestamp_ms: 12_345,
            bearing_deg: bearing,
            confidence: 84.2,
            rssi_db: -47.319,
            center_freq_hz: 148_524_000,
            array_type: "ULA".to_string(),
            station_id: "FAKE1".to_string(),
            station_lat_deg: 47.474242,
            station_lon_deg: 7.765962,
            gps_heading_deg: bearing,
            compass_heading_deg: bearing,
            spectrum: vec![0.05; n_bins],
        }
    }

    #[test]
    fn distance_is_zero_for_identical_points() {
        let p = GeoPoint::new(47.474242, 7.765962, 400.0);
        assert_eq!(p.distance_m(&p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(47.474242, 7.765962, 400.0);
        let b = GeoPoint::new(47.473120, 7.766545, 0.0);
        let ab = a.distance_m(&b);
        let ba = b.distance_m(&a);
        assert!((ab - ba).abs() < 1e-9);
        assert!(ab > 0.0);
    }

    #[test]
    fn bearing_stays_in_range() {
        let a = GeoPoint::new(47.474242, 7.765962, 400.0);
        let targets = [
            GeoPoint::new(47.474904, 7.766416, 0.0),
            GeoPoint::new(47.473120, 7.766545, 0.0),
            GeoPoint::new(47.474242, 7.764000, 0.0),
            GeoPoint::new(48.0, 7.0, 0.0),
        ];
        for t in &targets {
            let b = a.initial_bearing_deg(t);
            assert!((0.0..360.0).contains(&b), "bearing {b} out of range");
        }
    }

    #[test]
    fn bearing_of_point_toward_itself_is_zero() {
        let p = GeoPoint::new(47.474242, 7.765962, 400.0);
        assert_eq!(p.initial_bearing_deg(&p), 0.0);
    }

    #[test]
    fn bearing_due_east_is_ninety() {
        let a = GeoPoint::new(47.474242, 7.765962, 400.0);
        let b = GeoPoint::new(47.474242, 7.767291, 400.0); // ~100 m east
        let bearing = a.initial_bearing_deg(&b);
        assert!((bearing - 90.0).abs() < 0.1, "got {bearing}");
    }

    #[test]
    fn degrees_per_meter_places_hundred_meter_offset() {
        // The canonical two-station geometry: B sits ~100 m east of A at
        // lat 47.474242, i.e. lon offset ≈ 0.001329°.
        let (_, d_lon) = degrees_per_meter(47.474242);
        assert!((100.0 * d_lon - 0.001329).abs() < 1e-5);

        let a = GeoPoint::new(47.474242, 7.765962, 400.0);
        let b = GeoPoint::new(47.474242, 7.765962 + 100.0 * d_lon, 400.0);
        let dist = a.distance_m(&b);
        assert!((dist - 100.0).abs() < 1.0, "got {dist} m");
    }

    #[test]
    fn record_has_seventeen_plus_n_fields() {
        let fmt = RecordFormat::default();
        for n in [1, 181, 360] {
            let line = report(123.4, n).to_csv_line(&fmt);
            assert_eq!(line.split(',').count(), FIXED_FIELD_COUNT + n);
        }
    }

    #[test]
    fn rounded_bearing_wraps_to_zero() {
        let fmt = RecordFormat::default();
        let line = report(359.7, 4).to_csv_line(&fmt);
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields[1], "0");
        // Heading fields carry the unrounded value.
        assert_eq!(fields[10], "359.7");
        assert_eq!(fields[11], "359.7");
    }

    #[test]
    fn record_field_precisions() {
        let fmt = RecordFormat::default();
        let line = report(42.0, 2).to_csv_line(&fmt);
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields[0], "12345");
        assert_eq!(fields[2], "84.2"); // confidence, 1 dp
        assert_eq!(fields[3], "-47.32"); // RSSI, 2 dp
        assert_eq!(fields[4], "148524000");
        assert_eq!(fields[5], "ULA");
        assert_eq!(fields[6], "50");
        assert_eq!(fields[7], "FAKE1");
        assert_eq!(fields[8], "47.474242"); // lat, 6 dp
        assert_eq!(fields[12], "GPS");
        assert_eq!(&fields[13..17], &["0", "0", "0", "0"]);
        assert_eq!(fields[17], "0.05");
    }
}
