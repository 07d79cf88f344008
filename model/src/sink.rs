use crate::{Path, Position};

/// Whatever draws the marker and the route. Playback never reads anything back from it.
pub trait PositionSink {
    /// Called at start and once for every tick that moves the marker
    fn on_position(&mut self, pos: Position);
    /// Called once whenever the path is replaced or extended
    fn on_path(&mut self, path: &Path);
}

/// Discards everything
pub struct NullSink;

impl PositionSink for NullSink {
    fn on_position(&mut self, _: Position) {}
    fn on_path(&mut self, _: &Path) {}
}

impl<S: PositionSink + ?Sized> PositionSink for Box<S> {
    fn on_position(&mut self, pos: Position) {
        (**self).on_position(pos);
    }

    fn on_path(&mut self, path: &Path) {
        (**self).on_path(path);
    }
}
