use std::io::Read;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::interpolate::point_at;
use crate::{ModelError, Path, PlaybackConfig, Position, PositionSink, Result, Waypoint};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Idle,
    Running,
    Paused,
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub status: Status,
    /// Which pair of consecutive waypoints is active
    pub segment_index: usize,
    /// The next step of the active segment to emit
    pub step_index: usize,
}

impl PlaybackState {
    pub const IDLE: PlaybackState = PlaybackState {
        status: Status::Idle,
        segment_index: 0,
        step_index: 0,
    };
}

/// One tick of playback. Emits the next position along the active segment, or moves on to the
/// next segment without emitting anything. Anything besides `Running` is left alone.
pub fn advance(
    state: PlaybackState,
    path: &Path,
    total_steps: NonZeroUsize,
) -> (PlaybackState, Option<Position>) {
    if state.status != Status::Running {
        return (state, None);
    }

    let (start, end) = match path.segment(state.segment_index) {
        Some(pair) => pair,
        None => {
            return (
                PlaybackState {
                    status: Status::Finished,
                    ..state
                },
                None,
            );
        }
    };

    if let Some(pos) = point_at(
        start.position(),
        end.position(),
        total_steps.get(),
        state.step_index,
    ) {
        return (
            PlaybackState {
                step_index: state.step_index + 1,
                ..state
            },
            Some(pos),
        );
    }

    let mut next = PlaybackState {
        status: Status::Running,
        segment_index: state.segment_index + 1,
        step_index: 0,
    };
    if next.segment_index + 1 >= path.len() {
        next.status = Status::Finished;
    }
    (next, None)
}

/// Owns the path and the playback state, and reports every move to a sink.
pub struct PlaybackEngine<S> {
    config: PlaybackConfig,
    path: Path,
    state: PlaybackState,
    current: Option<Position>,
    sink: S,
}

impl<S: PositionSink> PlaybackEngine<S> {
    pub fn new(config: PlaybackConfig, sink: S) -> Self {
        Self {
            config,
            path: Path::default(),
            state: PlaybackState::IDLE,
            current: None,
            sink,
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    /// Running or paused. The path can't change in the meantime.
    pub fn is_active(&self) -> bool {
        matches!(self.state.status, Status::Running | Status::Paused)
    }

    pub fn current_position(&self) -> Option<Position> {
        self.current
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Replaces the whole path with records read in bulk. Malformed lines are skipped. Returns
    /// the number of waypoints kept.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<usize> {
        self.check_path_mutable("load a path")?;
        let path = Path::load(reader)?;
        info!("Loaded a path with {} waypoints", path.len());
        self.set_path(path);
        Ok(self.path.len())
    }

    pub fn replace_path(&mut self, path: Path) -> Result<()> {
        self.check_path_mutable("replace the path")?;
        self.set_path(path);
        Ok(())
    }

    /// Appends one manually entered record. A parse error leaves the path untouched.
    pub fn add_record(&mut self, input: &str) -> Result<Waypoint> {
        self.check_path_mutable("add a waypoint")?;
        let waypoint = *self.path.append_record(input)?;
        self.reset_if_finished();
        self.sink.on_path(&self.path);
        Ok(waypoint)
    }

    pub fn start(&mut self) -> Result<()> {
        if self.is_active() {
            return Err(ModelError::InvalidState(format!(
                "playback is already {:?}; stop it first",
                self.state.status
            )));
        }
        if self.path.len() < 2 {
            return Err(ModelError::InvalidState(format!(
                "need at least 2 waypoints to start, but the path has {}",
                self.path.len()
            )));
        }

        self.state = PlaybackState {
            status: Status::Running,
            segment_index: 0,
            step_index: 0,
        };
        let first = self.path.waypoints()[0].position();
        self.emit(first);
        info!(
            "Started playback over {} segments",
            self.path.num_segments()
        );
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.transition("pause", Status::Running, Status::Paused)
    }

    pub fn resume(&mut self) -> Result<()> {
        self.transition("resume", Status::Paused, Status::Running)
    }

    /// Abandons playback from any state but `Idle`, forgetting progress and the marker.
    pub fn stop(&mut self) -> Result<()> {
        if self.state.status == Status::Idle {
            return Err(ModelError::InvalidState(
                "can't stop, playback hasn't started".to_string(),
            ));
        }
        info!("Stopped playback from {:?}", self.state.status);
        self.state = PlaybackState::IDLE;
        self.current = None;
        Ok(())
    }

    /// Advances by one step. Returns the position emitted, if any. Does nothing unless running.
    pub fn tick(&mut self) -> Option<Position> {
        let prev = self.state;
        let (next, emitted) = advance(prev, &self.path, self.config.total_steps);
        self.state = next;

        if next.status == Status::Finished && prev.status != Status::Finished {
            info!("Playback finished after {} segments", next.segment_index);
        } else if next.segment_index != prev.segment_index {
            debug!(
                "Moving onto segment {}/{}",
                next.segment_index + 1,
                self.path.num_segments()
            );
        }

        if let Some(pos) = emitted {
            self.emit(pos);
        }
        emitted
    }

    fn emit(&mut self, pos: Position) {
        self.current = Some(pos);
        self.sink.on_position(pos);
    }

    fn transition(&mut self, action: &str, from: Status, to: Status) -> Result<()> {
        if self.state.status != from {
            return Err(ModelError::InvalidState(format!(
                "can't {action} while {:?}",
                self.state.status
            )));
        }
        info!("Playback {:?} -> {:?}", from, to);
        self.state.status = to;
        Ok(())
    }

    fn check_path_mutable(&self, action: &str) -> Result<()> {
        if self.is_active() {
            return Err(ModelError::InvalidState(format!(
                "can't {action} while playback is {:?}",
                self.state.status
            )));
        }
        Ok(())
    }

    fn set_path(&mut self, path: Path) {
        self.path = path;
        self.reset_if_finished();
        self.sink.on_path(&self.path);
    }

    // A finished run refers to the old path
    fn reset_if_finished(&mut self) {
        if self.state.status == Status::Finished {
            self.state = PlaybackState::IDLE;
            self.current = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        positions: Vec<Position>,
        paths: Vec<usize>,
    }

    impl PositionSink for Recorder {
        fn on_position(&mut self, pos: Position) {
            self.positions.push(pos);
        }

        fn on_path(&mut self, path: &Path) {
            self.paths.push(path.len());
        }
    }

    fn engine(steps: usize, input: &str) -> PlaybackEngine<Recorder> {
        let config = PlaybackConfig::from_millis(steps, 50.0).unwrap();
        let mut engine = PlaybackEngine::new(config, Recorder::default());
        engine.load(input.as_bytes()).unwrap();
        engine
    }

    fn pos(lat: f64, lng: f64) -> Position {
        Position { lat, lng }
    }

    #[test]
    fn start_emits_first_waypoint() {
        let mut engine = engine(100, "3,4,0\n10,10,1");
        engine.start().unwrap();
        assert_eq!(engine.status(), Status::Running);
        assert_eq!(engine.sink().positions, vec![pos(3.0, 4.0)]);
        assert_eq!(engine.current_position(), Some(pos(3.0, 4.0)));
        assert_eq!(
            (engine.state().segment_index, engine.state().step_index),
            (0, 0)
        );
    }

    #[test]
    fn start_needs_two_waypoints() {
        for input in ["", "1,1,1"] {
            let mut engine = engine(100, input);
            assert!(matches!(engine.start(), Err(ModelError::InvalidState(_))));
            assert_eq!(engine.state(), PlaybackState::IDLE);
            assert!(engine.sink().positions.is_empty());
            assert_eq!(engine.tick(), None);
        }
    }

    #[test]
    fn no_reentrant_start() {
        let mut engine = engine(10, "0,0,0\n1,1,1");
        engine.start().unwrap();
        engine.tick();
        let before = engine.state();
        assert!(matches!(engine.start(), Err(ModelError::InvalidState(_))));
        assert_eq!(engine.state(), before);

        engine.pause().unwrap();
        assert!(matches!(engine.start(), Err(ModelError::InvalidState(_))));
        assert_eq!(engine.status(), Status::Paused);
    }

    #[test]
    fn pause_and_resume_preserve_progress() {
        let mut engine = engine(100, "0,0,0\n10,10,0\n20,0,0");
        engine.start().unwrap();
        for _ in 0..37 {
            engine.tick();
        }
        let state = engine.state();
        let current = engine.current_position();

        engine.pause().unwrap();
        assert_eq!(engine.tick(), None);
        assert_eq!(engine.state().step_index, state.step_index);
        engine.resume().unwrap();

        assert_eq!(engine.state(), state);
        assert_eq!(engine.current_position(), current);
        // The next tick continues right where things left off
        let next = engine.tick().unwrap();
        assert!((next.lat - 3.7).abs() < 1e-9);
    }

    #[test]
    fn bad_transitions_are_rejected() {
        let mut engine = engine(10, "0,0,0\n1,1,1");
        assert!(matches!(engine.pause(), Err(ModelError::InvalidState(_))));
        assert!(matches!(engine.resume(), Err(ModelError::InvalidState(_))));
        assert!(matches!(engine.stop(), Err(ModelError::InvalidState(_))));

        engine.start().unwrap();
        assert!(matches!(engine.resume(), Err(ModelError::InvalidState(_))));
        engine.pause().unwrap();
        assert!(matches!(engine.pause(), Err(ModelError::InvalidState(_))));
        assert_eq!(engine.status(), Status::Paused);
    }

    #[test]
    fn traverses_every_segment_then_finishes() {
        let steps = 4;
        let mut engine = engine(steps, "0,0,0\n4,0,1\n4,8,2\n0,0,3");
        engine.start().unwrap();

        let mut segments_seen = Vec::new();
        let mut ticks = 0;
        while engine.status() == Status::Running {
            let segment = engine.state().segment_index;
            if engine.tick().is_some() && segments_seen.last() != Some(&segment) {
                segments_seen.push(segment);
            }
            ticks += 1;
        }

        assert_eq!(engine.status(), Status::Finished);
        assert_eq!(segments_seen, vec![0, 1, 2]);
        // Each segment: steps+1 emitting ticks, plus one to move on
        assert_eq!(ticks, 3 * (steps + 2));
        // The initial position, plus steps+1 per segment
        assert_eq!(engine.sink().positions.len(), 1 + 3 * (steps + 1));
        assert_eq!(engine.current_position(), Some(pos(0.0, 0.0)));

        let emitted = engine.sink().positions.len();
        for _ in 0..10 {
            assert_eq!(engine.tick(), None);
        }
        assert_eq!(engine.sink().positions.len(), emitted);
        assert_eq!(engine.status(), Status::Finished);
    }

    #[test]
    fn path_is_frozen_while_active() {
        let mut engine = engine(10, "0,0,0\n1,1,1");
        engine.start().unwrap();
        assert!(matches!(
            engine.add_record("2,2,2"),
            Err(ModelError::InvalidState(_))
        ));
        assert!(matches!(
            engine.load("5,5,5\n6,6,6".as_bytes()),
            Err(ModelError::InvalidState(_))
        ));
        engine.pause().unwrap();
        assert!(matches!(
            engine.replace_path(Path::default()),
            Err(ModelError::InvalidState(_))
        ));
        assert_eq!(engine.path().len(), 2);
        assert_eq!(engine.sink().paths, vec![2]);
    }

    #[test]
    fn stop_resets() {
        let mut engine = engine(10, "0,0,0\n1,1,1");
        engine.start().unwrap();
        engine.tick();
        engine.tick();
        engine.stop().unwrap();
        assert_eq!(engine.state(), PlaybackState::IDLE);
        assert_eq!(engine.current_position(), None);

        // Now the path can change again
        engine.add_record("2,2,2").unwrap();
        assert_eq!(engine.sink().paths, vec![2, 3]);
    }

    #[test]
    fn restart_after_finishing() {
        let mut engine = engine(1, "0,0,0\n1,1,1");
        engine.start().unwrap();
        while engine.status() == Status::Running {
            engine.tick();
        }
        engine.start().unwrap();
        assert_eq!(engine.state().segment_index, 0);
        assert_eq!(engine.current_position(), Some(pos(0.0, 0.0)));
    }

    #[test]
    fn changing_path_after_finishing_resets() {
        let mut engine = engine(1, "0,0,0\n1,1,1");
        engine.start().unwrap();
        while engine.status() == Status::Running {
            engine.tick();
        }
        engine.add_record("5,5,5").unwrap();
        assert_eq!(engine.state(), PlaybackState::IDLE);
        assert_eq!(engine.current_position(), None);
    }

    #[test]
    fn manual_parse_error_is_surfaced() {
        let mut engine = engine(10, "1,2,3\nbad\n4,5,6");
        assert_eq!(engine.path().len(), 2);
        assert!(matches!(
            engine.add_record("bad"),
            Err(ModelError::Parse { .. })
        ));
        assert_eq!(engine.path().len(), 2);
        // Only the bulk load notified the sink
        assert_eq!(engine.sink().paths, vec![2]);
    }

    #[test]
    fn advance_is_pure() {
        let path = Path::load("0,0,0\n10,10,0".as_bytes()).unwrap();
        let steps = NonZeroUsize::new(100).unwrap();
        let state = PlaybackState {
            status: Status::Running,
            segment_index: 0,
            step_index: 50,
        };
        let (next1, pos1) = advance(state, &path, steps);
        let (next2, pos2) = advance(state, &path, steps);
        assert_eq!(next1, next2);
        assert_eq!(pos1, pos2);
        assert_eq!(next1.step_index, 51);
        let pos = pos1.unwrap();
        assert!((pos.lat - 5.0).abs() < 1e-9 && (pos.lng - 5.0).abs() < 1e-9);

        let exhausted = PlaybackState {
            step_index: 101,
            ..state
        };
        assert_eq!(
            advance(exhausted, &path, steps),
            (
                PlaybackState {
                    status: Status::Finished,
                    segment_index: 1,
                    step_index: 0,
                },
                None
            )
        );

        for status in [Status::Idle, Status::Paused, Status::Finished] {
            let state = PlaybackState { status, ..state };
            assert_eq!(advance(state, &path, steps), (state, None));
        }
    }
}
