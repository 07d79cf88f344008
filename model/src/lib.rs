#[macro_use]
extern crate log;

mod driver;
mod error;
mod interpolate;
mod path;
mod playback;
mod records;
mod session;
mod sink;

use std::num::NonZeroUsize;

use geom::Duration;
use serde::{Deserialize, Serialize};

pub use self::driver::TickDriver;
pub use self::error::{ModelError, Result};
pub use self::interpolate::{interpolate, Interpolation};
pub use self::path::{Bounds, Path, PathSummary};
pub use self::playback::{advance, PlaybackEngine, PlaybackState, Status};
pub use self::session::{Command, Session};
pub use self::sink::{NullSink, PositionSink};

/// One recorded sample. Coordinates aren't range-checked. The timestamp is carried along, but
/// playback doesn't use it for pacing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lng: f64,
    pub timestamp: i64,
}

impl Waypoint {
    pub fn position(&self) -> Position {
        Position {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Where the marker currently is
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackConfig {
    /// How many steps each segment is divided into. Every segment emits `total_steps + 1`
    /// positions, no matter how long it is.
    pub total_steps: NonZeroUsize,
    /// Real time between ticks
    pub tick_interval: Duration,
}

impl PlaybackConfig {
    pub const DEFAULT_STEPS: usize = 100;
    pub const DEFAULT_TICK_MS: f64 = 50.0;

    pub fn new(total_steps: usize, tick_interval: Duration) -> Result<Self> {
        let total_steps = NonZeroUsize::new(total_steps).ok_or_else(|| {
            ModelError::InvalidArgument("segments need at least 1 step".to_string())
        })?;
        // Each segment emits total_steps + 1 positions, which has to be countable
        if total_steps.get() == usize::MAX {
            return Err(ModelError::InvalidArgument(format!(
                "{total_steps} steps per segment is too many"
            )));
        }
        if tick_interval <= Duration::ZERO {
            return Err(ModelError::InvalidArgument(format!(
                "tick interval must be positive, not {tick_interval}"
            )));
        }
        Ok(Self {
            total_steps,
            tick_interval,
        })
    }

    pub fn from_millis(total_steps: usize, tick_ms: f64) -> Result<Self> {
        // geom::Duration can't hold these at all
        if !tick_ms.is_finite() {
            return Err(ModelError::InvalidArgument(format!(
                "tick interval must be a finite number of milliseconds, not {tick_ms}"
            )));
        }
        Self::new(total_steps, Duration::seconds(tick_ms / 1000.0))
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            total_steps: NonZeroUsize::new(Self::DEFAULT_STEPS).unwrap(),
            tick_interval: Duration::seconds(Self::DEFAULT_TICK_MS / 1000.0),
        }
    }
}
