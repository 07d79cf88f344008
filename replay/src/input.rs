use std::io::BufRead;

use anyhow::Result;
use futures_channel::mpsc::{self, UnboundedReceiver};

use model::Command;

/// One line typed into the terminal
#[derive(Debug, PartialEq)]
pub enum Input {
    Command(Command),
    /// Replace the path with the records in this file
    LoadFile(String),
    Status,
    Quit,
}

pub fn parse_line(line: &str) -> Result<Option<Input>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let input = match (word.to_lowercase().as_str(), rest.is_empty()) {
        ("add", false) => Input::Command(Command::AddRecord(rest.to_string())),
        ("load", false) => Input::LoadFile(rest.to_string()),
        ("add", true) => bail!("Usage: add <lat>,<lng>,<timestamp>"),
        ("load", true) => bail!("Usage: load <file>"),
        ("start", true) => Input::Command(Command::Start),
        ("pause", true) => Input::Command(Command::Pause),
        ("resume", true) => Input::Command(Command::Resume),
        ("stop", true) => Input::Command(Command::Stop),
        ("status", true) => Input::Status,
        ("quit", true) | ("exit", true) => Input::Quit,
        _ => bail!("Unknown command {:?}", line),
    };
    Ok(Some(input))
}

/// Reads lines on a background thread and forwards them to whoever owns the session. The
/// channel closes when the input ends.
pub fn spawn_reader<R: BufRead + Send + 'static>(reader: R) -> UnboundedReceiver<Input> {
    let (tx, rx) = mpsc::unbounded();
    std::thread::spawn(move || {
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!("Couldn't read input: {}", err);
                    break;
                }
            };
            match parse_line(&line) {
                Ok(Some(input)) => {
                    if tx.unbounded_send(input).is_err() {
                        // Nobody's listening anymore
                        break;
                    }
                }
                Ok(None) => {}
                Err(err) => warn!("{}", err),
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn commands() {
        assert_eq!(
            parse_line("add 1.5,2,3").unwrap(),
            Some(Input::Command(Command::AddRecord("1.5,2,3".to_string())))
        );
        assert_eq!(
            parse_line("  LOAD   data/flight 1.csv ").unwrap(),
            Some(Input::LoadFile("data/flight 1.csv".to_string()))
        );
        assert_eq!(
            parse_line("start").unwrap(),
            Some(Input::Command(Command::Start))
        );
        assert_eq!(parse_line("exit").unwrap(), Some(Input::Quit));
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn bad_commands() {
        for line in ["add", "load ", "start now", "fly"] {
            assert!(parse_line(line).is_err(), "{line:?} should be rejected");
        }
    }

    #[test]
    fn add_passes_records_through_unparsed() {
        // The engine decides whether this is valid
        assert_eq!(
            parse_line("add bad").unwrap(),
            Some(Input::Command(Command::AddRecord("bad".to_string())))
        );
    }

    #[test]
    fn reader_forwards_lines_then_closes() {
        let mut rx = spawn_reader("start\nnonsense\n\npause\n".as_bytes());
        let mut got = Vec::new();
        // Block until the reader thread finishes and drops its sender
        loop {
            match rx.try_next() {
                Ok(Some(input)) => got.push(input),
                Ok(None) => break,
                Err(_) => std::thread::yield_now(),
            }
        }
        assert_eq!(
            got,
            vec![
                Input::Command(Command::Start),
                Input::Command(Command::Pause)
            ]
        );
    }
}
