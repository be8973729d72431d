//! main.rs — DF station simulator entry point
//!
//! Runs N+1 concurrent tasks:
//!   1. Driver loop: fires one simulation tick per period (plus bounded
//!      jitter), updating every station against the shared emitter position
//!   2..N+1. One HTTP server per station, serving that station's latest
//!      cached record and status
//!
//! The tick deadline chain is derived from the previous deadline, never
//! from the firing instant, so handler latency does not accumulate drift;
//! jitter is re-drawn on top each tick.

mod config;
mod emitter;
mod http;
mod rf_model;
mod sim;
mod station;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{error, info};

use config::{FullConfig, TimingConfig};
use http::SharedSim;
use sim::{SimState, TickOutcome};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "df-sim", about = "Fake DF receiver stations for consumer development")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Bind address for the station servers
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "df_simulator=info".into()),
        )
        .init();

    let args = Args::parse();

    // Load config (compiled-in default when the file is absent)
    let config_str = std::fs::read_to_string(&args.config)
        .unwrap_or_else(|_| include_str!("../config.toml").to_string());
    let cfg: FullConfig = toml::from_str(&config_str)
        .with_context(|| format!("failed to parse {}", args.config))?;
    cfg.validate().context("invalid configuration")?;

    let state = SimState::new(&cfg);
    info!(
        "📡 DF simulator starting — {} stations, path {:.0} m at {} m/s ({:.0} s traversal)",
        state.stations.len(),
        state.path.path_length_m(),
        cfg.emitter.speed_mps,
        state.path.travel_time_s(),
    );

    let shared: SharedSim = Arc::new(RwLock::new(state));

    // One HTTP server per station
    for (index, st) in cfg.stations.iter().enumerate() {
        let app = http::station_router(shared.clone(), index);
        let addr = format!("{}:{}", args.bind, st.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr} for station {}", st.id))?;
        info!("🖥  {} at http://{addr}/DOA_value.html", st.id);
        let id = st.id.clone();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("station {id} server exited: {e}");
            }
        });
    }

    drive(shared, cfg.timing).await;
    Ok(())
}

// ── Driver loop ───────────────────────────────────────────────────────────────

/// Advance the simulation at the configured cadence until process exit.
async fn drive(state: SharedSim, timing: TimingConfig) {
    let period = Duration::from_secs_f64(timing.tick_period_s);
    let process_start = Instant::now();
    let mut path_start = process_start;
    let mut next_deadline = process_start + period;
    let mut rng = StdRng::from_entropy();
    let mut halt_logged = false;

    info!("⚓ Tick loop running at {:.2} s period (±{} ms jitter)", timing.tick_period_s, timing.tick_jitter_ms);

    loop {
        tokio::time::sleep_until(jittered(next_deadline, timing.tick_jitter_ms, &mut rng)).await;
        // Chain from the previous deadline, not the firing instant.
        next_deadline += period;

        let path_elapsed_s = path_start.elapsed().as_secs_f64();
        let timestamp_ms = process_start.elapsed().as_millis() as u64;

        let outcome = state.write().await.tick(path_elapsed_s, timestamp_ms, &mut rng);
        match outcome {
            TickOutcome::Advanced => {}
            TickOutcome::Halted => {
                if !halt_logged {
                    info!("🏁 Path complete — stop policy engaged, serving frozen records");
                    halt_logged = true;
                }
            }
            TickOutcome::Looped => {
                path_start = Instant::now();
                info!("↺ Path complete — looping back to start");
            }
        }
    }
}

/// Perturb a deadline by a uniform draw in ±`jitter_ms`.
fn jittered(deadline: Instant, jitter_ms: f64, rng: &mut impl Rng) -> Instant {
    if jitter_ms <= 0.0 {
        return deadline;
    }
    let offset_ms = Uniform::new_inclusive(-jitter_ms, jitter_ms).sample(rng);
    let offset = Duration::from_secs_f64(offset_ms.abs() / 1000.0);
    if offset_ms >= 0.0 {
        deadline + offset
    } else {
        deadline.checked_sub(offset).unwrap_or(deadline)
    }
}
