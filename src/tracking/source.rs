//! Frame sources: the capture loop and tracker as seen from the control loop.
//!
//! The landmark tracker runs out of process.  Its output reaches us as a
//! line-oriented feed, one s-expression plist per frame:
//!
//! ```text
//! (:time-ms 33 :hands ((:handedness :left :landmarks ((0.41 0.80 0.0) ...))))
//! ```
//!
//! `:time-ms` is optional; frames without it are stamped from the monotonic
//! clock.  A frame carrying `:restart t` marks a tracker restart.  Lines
//! starting with `;` are comments.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

use lexpr::Value;
use tracing::{debug, info, warn};

use super::hand::{Handedness, Landmark, RawHand};
use crate::error::CaptureError;
use crate::sexp;

/// Monotonic offset from session start.
pub type Timestamp = Duration;

/// One captured frame with the hands the tracker reported for it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub timestamp: Timestamp,
    pub hands: Vec<RawHand>,
    /// The tracker restarted before this frame; gesture state is stale.
    pub restarted: bool,
}

/// Supplier of frames for the control loop.
pub trait FrameSource {
    /// Block until the next frame is available.
    /// Returns `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError>;

    /// Release the underlying capture resource.  Must be idempotent.
    fn release(&mut self);
}

/// Frame source reading the tracker feed from any buffered reader.
pub struct FeedSource<R> {
    reader: Option<R>,
    name: String,
    line_no: usize,
    clock: Instant,
    last_timestamp: Timestamp,
    buf: String,
}

impl FeedSource<Box<dyn BufRead>> {
    /// Open a feed file, or standard input when `path` is `-`.
    pub fn open(path: &Path) -> io::Result<Self> {
        let reader: Box<dyn BufRead> = if path.as_os_str() == "-" {
            Box::new(BufReader::new(io::stdin()))
        } else {
            Box::new(BufReader::new(File::open(path)?))
        };
        info!(?path, "tracker feed opened");
        Ok(Self::new(reader, path.display().to_string()))
    }
}

impl<R: BufRead> FeedSource<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader: Some(reader),
            name: name.into(),
            line_no: 0,
            clock: Instant::now(),
            last_timestamp: Duration::ZERO,
            buf: String::new(),
        }
    }

    /// Whether [`FrameSource::release`] has run.
    #[cfg(test)]
    pub fn is_released(&self) -> bool {
        self.reader.is_none()
    }

    /// Clamp timestamps so they never run backwards.
    fn monotonic(&mut self, ts: Timestamp) -> Timestamp {
        if ts < self.last_timestamp {
            warn!(
                line = self.line_no,
                "frame timestamp went backwards ({:?} < {:?}), clamping",
                ts,
                self.last_timestamp
            );
            return self.last_timestamp;
        }
        self.last_timestamp = ts;
        ts
    }
}

impl<R: BufRead> FrameSource for FeedSource<R> {
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        loop {
            let Some(reader) = self.reader.as_mut() else {
                return Ok(None);
            };
            self.buf.clear();
            if reader.read_line(&mut self.buf)? == 0 {
                debug!(source = %self.name, lines = self.line_no, "tracker feed exhausted");
                return Ok(None);
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let record = parse_frame(line, self.line_no)?;
            let timestamp = record.time.unwrap_or_else(|| self.clock.elapsed());
            let timestamp = self.monotonic(timestamp);
            return Ok(Some(Frame {
                timestamp,
                hands: record.hands,
                restarted: record.restart,
            }));
        }
    }

    fn release(&mut self) {
        if self.reader.take().is_some() {
            info!(source = %self.name, frames = self.line_no, "tracker feed released");
        }
    }
}

/// One feed line, before the source stamps it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameRecord {
    /// `:time-ms`, if the tracker supplied one.
    pub time: Option<Timestamp>,
    pub hands: Vec<RawHand>,
    pub restart: bool,
}

/// Parse one feed line.
pub fn parse_frame(line: &str, line_no: usize) -> Result<FrameRecord, CaptureError> {
    let parse_err = |message: String| CaptureError::Parse {
        line: line_no,
        message,
    };

    let value = lexpr::from_str(line).map_err(|e| parse_err(format!("malformed s-expression: {e}")))?;
    let value = &value;

    let timestamp = match sexp::plist_get(value, "time-ms") {
        None => None,
        Some(v) => {
            let ms = sexp::as_f64(v)
                .filter(|ms| ms.is_finite() && *ms >= 0.0)
                .ok_or_else(|| parse_err(format!(":time-ms must be a non-negative number, got {v}")))?;
            Some(Duration::from_micros((ms * 1000.0).round() as u64))
        }
    };

    let hands = match sexp::plist_get(value, "hands") {
        None => Vec::new(),
        Some(list) => {
            let items = sexp::list_items(list)
                .ok_or_else(|| parse_err(":hands must be a list".to_string()))?;
            items
                .into_iter()
                .map(|hand| parse_hand(hand).map_err(&parse_err))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(FrameRecord {
        time: timestamp,
        hands,
        restart: sexp::get_bool(value, "restart").unwrap_or(false),
    })
}

fn parse_hand(value: &Value) -> Result<RawHand, String> {
    let handedness = match sexp::get_keyword(value, "handedness") {
        None => None,
        Some(s) if s == "nil" => None,
        Some(s) => Some(Handedness::parse(&s).ok_or_else(|| format!("unknown handedness {s:?}"))?),
    };

    let points = sexp::plist_get(value, "landmarks")
        .ok_or_else(|| "hand without :landmarks".to_string())?;
    let points = sexp::list_items(points).ok_or_else(|| ":landmarks must be a list".to_string())?;

    let landmarks = points
        .into_iter()
        .enumerate()
        .map(|(i, point)| parse_point(point).ok_or_else(|| format!("landmark {i} is not (x y) or (x y z)")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawHand {
        landmarks,
        handedness,
    })
}

fn parse_point(value: &Value) -> Option<Landmark> {
    let coords = sexp::list_items(value)?
        .into_iter()
        .map(sexp::as_f64)
        .collect::<Option<Vec<f64>>>()?;
    match coords.as_slice() {
        [x, y] => Some(Landmark::new(*x as f32, *y as f32, 0.0)),
        [x, y, z] => Some(Landmark::new(*x as f32, *y as f32, *z as f32)),
        _ => None,
    }
}
