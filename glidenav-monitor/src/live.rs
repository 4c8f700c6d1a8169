//! Live decoding of a stdin stream.
//!
//! One reader thread per device delivers complete lines into the session
//! (single producer); the main thread is the consumer, running the
//! fixed-rate cycle that polls staleness and prints a status line. Session
//! and state share one mutex — the merge boundary between the producer and
//! every reader of the snapshot.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use glidenav_core::config;
use glidenav_core::session::ParserSession;
use glidenav_core::state::NavigationState;
use glidenav_core::types::Result;

struct Shared {
    session: ParserSession,
    state: NavigationState,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn run(source: String, cycle: f64) -> Result<()> {
    let cycle = cycle.max(0.2);
    let cfg = config::load_config();

    let mut state = NavigationState::new();
    state.traffic = cfg.traffic_table();
    let shared = Arc::new(Mutex::new(Shared {
        session: ParserSession::with_caps(source, cfg.session_caps()),
        state,
    }));
    let done = Arc::new(AtomicBool::new(false));
    let epoch = Instant::now();

    let producer = {
        let shared = Arc::clone(&shared);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let now = epoch.elapsed().as_secs_f64();
                let mut guard = lock(&shared);
                let sh = &mut *guard;
                let _ = sh.session.parse_line(&line, now, &mut sh.state);
            }
            done.store(true, Ordering::Release);
        })
    };

    loop {
        thread::sleep(Duration::from_secs_f64(cycle));
        let now = epoch.elapsed().as_secs_f64();
        {
            let mut guard = lock(&shared);
            let sh = &mut *guard;
            sh.session.poll(now, &mut sh.state);
            println!("{}", status_line(&sh.state));
        }
        if done.load(Ordering::Acquire) {
            break;
        }
    }

    let _ = producer.join();
    Ok(())
}

fn status_line(state: &NavigationState) -> String {
    let fix = if state.fix_valid {
        "fix"
    } else if state.connected {
        "no-fix"
    } else {
        "no-gps"
    };
    let mut out = format!(
        "[{fix}] sat={} lat={:.4} lon={:.4} alt={:.0}m gs={:.1}m/s",
        state.satellites, state.latitude, state.longitude, state.altitude_m, state.ground_speed_ms
    );
    if let Some(baro) = state.baro_altitude_m {
        out.push_str(&format!(" baro={baro:.0}m"));
    }
    if let Some(vs) = state.vertical_speed_ms {
        out.push_str(&format!(" vario={vs:+.1}"));
    }
    if state.traffic_status.available {
        out.push_str(&format!(
            " traffic={} alarm={}",
            state.traffic.len(),
            state.traffic_status.alarm
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
