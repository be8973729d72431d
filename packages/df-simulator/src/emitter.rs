//! emitter.rs — Moving-emitter motion model
//!
//! The emitter walks a fixed two-point path at constant ground speed. Its
//! current position is a pure function of elapsed simulated time: the path
//! fraction `u` is clamped to [0, 1] and the lat/lon pair is a straight
//! linear blend of the endpoints (acceptable at the short ranges this
//! simulator targets — no geodesic interpolation).

use df_types::{degrees_per_meter, GeoPoint};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

/// What to do once the emitter reaches the end of its path (`u ≥ 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndOfPathPolicy {
    /// Freeze all updates; cached reports keep serving their last values.
    Stop,
    /// Keep ticking with the emitter pinned at the end position.
    Hold,
    /// Reset the path clock and all station sequence counters, restarting
    /// the traversal.
    Loop,
}

#[derive(Debug, Clone)]
pub struct EmitterPath {
    start: GeoPoint,
    end: GeoPoint,
    path_length_m: f64,
    /// 0 when speed ≤ 0 — the emitter is then always at the end position.
    travel_time_s: f64,
    position_jitter_m: f64,
}

impl EmitterPath {
    pub fn new(start: GeoPoint, end: GeoPoint, speed_mps: f64, position_jitter_m: f64) -> Self {
        let path_length_m = start.distance_m(&end);
        let travel_time_s = if speed_mps > 0.0 {
            path_length_m / speed_mps
        } else {
            0.0
        };
        Self {
            start,
            end,
            path_length_m,
            travel_time_s,
            position_jitter_m,
        }
    }

    pub fn path_length_m(&self) -> f64 {
        self.path_length_m
    }

    pub fn travel_time_s(&self) -> f64 {
        self.travel_time_s
    }

    /// Path fraction `u` at the given elapsed time, clamped to [0, 1].
    /// `u = 1` signals path completion.
    pub fn fraction_at(&self, elapsed_s: f64) -> f64 {
        if self.travel_time_s <= 0.0 {
            1.0
        } else {
            (elapsed_s / self.travel_time_s).clamp(0.0, 1.0)
        }
    }

    /// Current emitter position and path fraction at the given elapsed time.
    pub fn position_at(&self, elapsed_s: f64) -> (GeoPoint, f64) {
        let u = self.fraction_at(elapsed_s);
        let pos = GeoPoint::new(
            self.start.lat_deg + (self.end.lat_deg - self.start.lat_deg) * u,
            self.start.lon_deg + (self.end.lon_deg - self.start.lon_deg) * u,
            0.0,
        );
        (pos, u)
    }

    /// Apply the configured per-tick position jitter (± meters, converted to
    /// degrees at the local latitude). No-op when jitter is 0.
    pub fn apply_jitter(&self, pos: GeoPoint, rng: &mut impl Rng) -> GeoPoint {
        if self.position_jitter_m <= 0.0 {
            return pos;
        }
        let offset = Uniform::new_inclusive(-self.position_jitter_m, self.position_jitter_m);
        let (d_lat, d_lon) = degrees_per_meter(pos.lat_deg);
        GeoPoint::new(
            pos.lat_deg + offset.sample(rng) * d_lat,
            pos.lon_deg + offset.sample(rng) * d_lon,
            pos.alt_m,
        )
    }
}
