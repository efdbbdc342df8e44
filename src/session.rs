//! Control session: one tick per captured frame until the stream ends,
//! a shutdown signal arrives, or something fails.
//!
//! The frame source and command sink are always released on the way out,
//! whichever of those happened.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::command::CommandSink;
use crate::error::SessionError;
use crate::gesture::{GesturePipeline, MachineState};
use crate::tracking::FrameSource;

/// Global flag set by SIGTERM/SIGINT handlers.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Install signal handlers for graceful shutdown (SIGTERM, SIGINT).
pub fn install_signal_handlers() -> &'static AtomicBool {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
    }
    &SHUTDOWN_REQUESTED
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Counters kept over one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub commands: u64,
    /// Hands dropped because another hand already held their side.
    pub ambiguous_hands: u64,
}

/// Run a control session to completion.
///
/// End of stream and a raised `shutdown` flag are normal terminations.
/// Any tracking, capture or channel error ends the loop and is returned
/// after cleanup.
pub fn run(
    source: &mut dyn FrameSource,
    sink: &mut dyn CommandSink,
    pipeline: &GesturePipeline,
    shutdown: &AtomicBool,
    status_interval: Duration,
) -> Result<SessionStats, SessionError> {
    let mut stats = SessionStats::default();
    let started = Instant::now();
    info!("control session started");

    let result = drive(source, sink, pipeline, shutdown, status_interval, &mut stats);

    // Cleanup runs on every path.
    source.release();
    let closed = sink.close();

    info!(
        "control session ended after {:.1}s ({} frame(s), {} command(s), {} ambiguous hand(s))",
        started.elapsed().as_secs_f64(),
        stats.frames,
        stats.commands,
        stats.ambiguous_hands
    );

    match (result, closed) {
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                warn!("command channel close after failure also failed: {}", close_err);
            }
            error!("control session failed: {}", e);
            Err(e)
        }
        (Ok(()), Err(close_err)) => Err(close_err.into()),
        (Ok(()), Ok(())) => Ok(stats),
    }
}

fn drive(
    source: &mut dyn FrameSource,
    sink: &mut dyn CommandSink,
    pipeline: &GesturePipeline,
    shutdown: &AtomicBool,
    status_interval: Duration,
    stats: &mut SessionStats,
) -> Result<(), SessionError> {
    let mut state = MachineState::new();
    let mut last_status_log = Instant::now();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            info!("Shutdown signal received, exiting");
            return Ok(());
        }

        let Some(frame) = source.next_frame()? else {
            info!("tracker feed ended");
            return Ok(());
        };
        stats.frames += 1;

        if frame.restarted {
            info!(
                t_ms = frame.timestamp.as_millis() as u64,
                "tracker restarted, resetting gesture state"
            );
            state.reset();
        }

        let report = pipeline.tick(&mut state, &frame.hands, frame.timestamp)?;
        stats.ambiguous_hands += report.dropped_hands as u64;

        if !report.commands.is_empty() {
            debug!(
                t_ms = frame.timestamp.as_millis() as u64,
                observation = %report.observation.to_sexp(),
                state = %state.status_sexp(),
                "tick emitted {} command(s)",
                report.commands.len()
            );
        }
        for command in report.commands {
            sink.send(command)?;
            stats.commands += 1;
        }

        if last_status_log.elapsed() >= status_interval {
            let held_ms = state
                .candidate_since()
                .map_or(0, |since| frame.timestamp.saturating_sub(since).as_millis());
            info!(
                "Session status: {} frame(s), {} command(s), {} ambiguous hand(s), gesture {} held {}ms",
                stats.frames,
                stats.commands,
                stats.ambiguous_hands,
                state.confirmed_gesture().as_str(),
                held_ms
            );
            last_status_log = Instant::now();
        }
    }
}
