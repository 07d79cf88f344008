use geom::Duration;

/// Turns real elapsed time into a number of fixed-interval ticks. Time only accumulates while
/// armed, so a disarmed driver can never produce a tick.
pub struct TickDriver {
    interval: Duration,
    armed: bool,
    // Real time that's passed since the last tick, while armed
    pending: Duration,
}

impl TickDriver {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            armed: false,
            pending: Duration::ZERO,
        }
    }

    /// Starts counting towards the next tick. Any backlog from before is forgotten, so
    /// re-arming never replays a step.
    pub fn arm(&mut self) {
        self.armed = true;
        self.pending = Duration::ZERO;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
        self.pending = Duration::ZERO;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Records that `real_dt` has passed, returning how many ticks are now due. If the caller
    /// fell behind, several ticks come due at once and should run back to back.
    pub fn elapse(&mut self, real_dt: Duration) -> usize {
        if !self.armed {
            return 0;
        }
        self.pending = self.pending + real_dt;
        let mut due = 0;
        while self.pending >= self.interval {
            self.pending = self.pending - self.interval;
            due += 1;
        }
        due
    }

    /// How long until the next tick is due. None when disarmed.
    pub fn until_next_tick(&self) -> Option<Duration> {
        if !self.armed {
            return None;
        }
        if self.pending >= self.interval {
            return Some(Duration::ZERO);
        }
        Some(self.interval - self.pending)
    }
}
