use geom::Duration;

use crate::{PlaybackConfig, PlaybackEngine, PositionSink, Result, Status, TickDriver};

/// Everything a control surface can ask for
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// One manually entered `lat,lng,timestamp` record
    AddRecord(String),
    /// The raw contents of a file of records, replacing the current path
    Load(Vec<u8>),
    Start,
    Pause,
    Resume,
    Stop,
}

/// The single owner of a playback engine and the driver ticking it. Commands and ticks both go
/// through here, one at a time, so they can never interleave.
pub struct Session<S: PositionSink> {
    engine: PlaybackEngine<S>,
    driver: TickDriver,
}

impl<S: PositionSink> Session<S> {
    pub fn new(config: PlaybackConfig, sink: S) -> Self {
        Self {
            driver: TickDriver::new(config.tick_interval),
            engine: PlaybackEngine::new(config, sink),
        }
    }

    pub fn engine(&self) -> &PlaybackEngine<S> {
        &self.engine
    }

    pub fn is_ticking(&self) -> bool {
        self.driver.is_armed()
    }

    /// Applies one command. A rejected command changes nothing.
    pub fn handle(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::AddRecord(input) => {
                let waypoint = self.engine.add_record(&input)?;
                debug!("Added waypoint {:?}", waypoint);
            }
            Command::Load(bytes) => {
                self.engine.load(bytes.as_slice())?;
            }
            Command::Start => {
                self.engine.start()?;
                self.driver.arm();
            }
            Command::Pause => {
                self.engine.pause()?;
                self.driver.disarm();
            }
            Command::Resume => {
                self.engine.resume()?;
                self.driver.arm();
            }
            Command::Stop => {
                self.engine.stop()?;
                self.driver.disarm();
            }
        }
        Ok(())
    }

    /// Records that `real_dt` has passed and runs every tick that came due, in order. Returns the
    /// number of ticks run.
    pub fn update(&mut self, real_dt: Duration) -> usize {
        let due = self.driver.elapse(real_dt);
        let mut ran = 0;
        for _ in 0..due {
            self.engine.tick();
            ran += 1;
            if self.engine.status() == Status::Finished {
                self.driver.disarm();
                break;
            }
        }
        ran
    }

    /// How long a host can sleep before calling `update` again. None when nothing is ticking.
    pub fn until_next_tick(&self) -> Option<Duration> {
        self.driver.until_next_tick()
    }
}
