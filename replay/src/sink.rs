use std::io::Write;

use serde::Serialize;

use model::{Path, PathSummary, Position, PositionSink};

/// Prints every position on its own line, either as `lat,lng` or as JSON
pub struct TerminalSink<W: Write> {
    out: W,
    json: bool,
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Event<'a> {
    Position(&'a Position),
    Path(&'a PathSummary),
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self { out, json }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_event(&mut self, event: &Event) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn write_position(&mut self, pos: Position) -> anyhow::Result<()> {
        if self.json {
            self.write_event(&Event::Position(&pos))?;
        } else {
            writeln!(self.out, "{},{}", pos.lat, pos.lng)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> PositionSink for TerminalSink<W> {
    fn on_position(&mut self, pos: Position) {
        if let Err(err) = self.write_position(pos) {
            warn!("Couldn't write position: {}", err);
        }
    }

    fn on_path(&mut self, path: &Path) {
        let summary = path.summary();
        info!(
            "Path has {} waypoints, {} segments, covering {:.0}m",
            summary.waypoints, summary.segments, summary.distance_meters
        );
        if self.json {
            if let Err(err) = self.write_event(&Event::Path(&summary)) {
                warn!("Couldn't write path: {}", err);
            }
        }
    }
}
