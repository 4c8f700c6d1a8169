//! Capture-file replay: feed recorded sentences through a session, run the
//! consumer cycle at replay time, and print the resulting state.
//!
//! Capture lines are either raw sentences or `seconds;$sentence` pairs;
//! lines without a timestamp get synthetic 0.1 s spacing.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use comfy_table::{Cell, Table};

use glidenav_core::config;
use glidenav_core::session::{Outcome, ParserSession};
use glidenav_core::state::NavigationState;
use glidenav_core::types::{radio_id_to_string, NavError, Result};

#[derive(Debug, Default)]
pub struct ReplayStats {
    pub lines: u64,
    pub updated: u64,
    pub stale: u64,
    pub ignored: u64,
    pub rejected: u64,
}

pub fn run(file: PathBuf, cycle: f64, json: bool, log_raw: Option<PathBuf>) -> Result<()> {
    let cfg = config::load_config();
    let mut session = ParserSession::with_caps(cfg.device.name.clone(), cfg.session_caps());
    let mut state = NavigationState::new();
    state.traffic = cfg.traffic_table();

    if let Some(path) = log_raw {
        let mut sink = std::fs::File::create(&path)?;
        session.set_line_hook(Box::new(move |source, line, accepted| {
            let flag = if accepted { '+' } else { '-' };
            let _ = writeln!(sink, "{flag} {source} {line}");
        }));
    }

    let reader: Box<dyn BufRead> = if file.to_str() == Some("-") {
        Box::new(io::stdin().lock())
    } else {
        Box::new(io::BufReader::new(std::fs::File::open(&file)?))
    };

    let stats = replay_lines(
        reader.lines().map_while(|l| l.ok()),
        &mut session,
        &mut state,
        cycle,
    );

    if json {
        let text = serde_json::to_string_pretty(&state)
            .map_err(|e| NavError::Config(e.to_string()))?;
        println!("{text}");
    } else {
        print_summary(&state, &stats, session.fix_sources());
    }
    Ok(())
}

/// Feed lines through the session, polling on every cycle boundary of the
/// replay clock. Returns the line statistics; the final poll has run.
pub fn replay_lines<I>(
    lines: I,
    session: &mut ParserSession,
    state: &mut NavigationState,
    cycle: f64,
) -> ReplayStats
where
    I: IntoIterator<Item = String>,
{
    let cycle = cycle.max(0.1);
    let mut stats = ReplayStats::default();
    let mut now = 0.0f64;
    let mut next_poll = cycle;

    for raw in lines {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let line = match trimmed.split_once(';') {
            Some((ts, rest)) => match ts.trim().parse::<f64>() {
                Ok(t) => {
                    now = t;
                    rest.trim()
                }
                Err(_) => trimmed,
            },
            None => {
                now += 0.1;
                trimmed
            }
        };

        while next_poll <= now {
            session.poll(next_poll, state);
            next_poll += cycle;
        }

        stats.lines += 1;
        match session.parse_line(line, now, state) {
            Ok(Outcome::Updated(_)) => stats.updated += 1,
            Ok(Outcome::Stale(_)) => stats.stale += 1,
            Ok(Outcome::Ignored) => stats.ignored += 1,
            Err(_) => stats.rejected += 1,
        }
    }

    session.poll(now, state);
    stats
}

fn print_summary(state: &NavigationState, stats: &ReplayStats, sources: (bool, bool, bool)) {
    println!();
    println!(
        "Lines: {} total, {} applied, {} stale, {} ignored, {} rejected",
        stats.lines, stats.updated, stats.stale, stats.ignored, stats.rejected
    );
    println!();

    if state.fix_valid {
        let (gga, rmc, gll) = sources;
        let source = if gga {
            "GGA"
        } else if rmc {
            "RMC"
        } else if gll {
            "GLL"
        } else {
            "injected"
        };
        println!(
            "Fix: valid ({source})  sat={} lat={:.4} lon={:.4} alt={:.1}m gs={:.1}m/s trk={:.0}",
            state.satellites,
            state.latitude,
            state.longitude,
            state.altitude_m,
            state.ground_speed_ms,
            state.track_deg
        );
    } else if state.connected {
        println!("Fix: none (receiver connected, sat={})", state.satellites);
    } else {
        println!("Fix: no receiver");
    }
    if state.date_valid {
        println!(
            "Date: {:04}-{:02}-{:02}  time-of-day: {:.1}s",
            state.year, state.month, state.day, state.time_of_day
        );
    }
    if let Some(baro) = state.baro_altitude_m {
        println!("Baro altitude: {baro:.1}m");
    }
    if let Some(vs) = state.vertical_speed_ms {
        println!("Vario: {vs:+.2}m/s");
    }
    if let Some(tas) = state.true_airspeed_ms {
        println!("TAS: {tas:.1}m/s");
    }
    if let Some(hdg) = state.heading_deg {
        println!("Heading: {hdg:.1}");
    }

    let status = &state.traffic_status;
    if status.available {
        println!(
            "Radio: rx={} tx={} gps={} alarm={}",
            status.rx_count, status.tx_ok, status.gps_ok, status.alarm
        );
    } else {
        println!("Radio: not available");
    }

    if state.traffic.is_empty() {
        return;
    }

    println!();
    let mut table = Table::new();
    table.set_header(vec![
        "Id", "Alarm", "North", "East", "Vert", "Track", "Speed", "Climb", "Lat", "Lon", "Stale",
    ]);

    for slot in state.traffic.iter() {
        table.add_row(vec![
            Cell::new(radio_id_to_string(slot.radio_id)),
            Cell::new(slot.alarm.to_string()),
            Cell::new(format!("{:.0}", slot.north_m)),
            Cell::new(format!("{:.0}", slot.east_m)),
            Cell::new(format!("{:+.0}", slot.vertical_m)),
            Cell::new(
                slot.track_deg
                    .map(|t| format!("{t:.0}"))
                    .unwrap_or("-".into()),
            ),
            Cell::new(
                slot.speed_ms
                    .map(|s| format!("{s:.1}"))
                    .unwrap_or("-".into()),
            ),
            Cell::new(
                slot.climb_ms
                    .map(|c| format!("{c:+.1}"))
                    .unwrap_or("-".into()),
            ),
            Cell::new(
                slot.position
                    .map(|p| format!("{:.4}", p.latitude))
                    .unwrap_or("-".into()),
            ),
            Cell::new(
                slot.position
                    .map(|p| format!("{:.4}", p.longitude))
                    .unwrap_or("-".into()),
            ),
            Cell::new(if slot.stale { "yes" } else { "" }),
        ]);
    }

    println!("{table}");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
