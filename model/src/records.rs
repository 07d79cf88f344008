use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{ModelError, Result, Waypoint};

/// Reads newline-delimited `lat,lng,timestamp` records. Lines that don't parse are skipped; only
/// a failure of the underlying reader is an error.
pub fn load<R: Read>(reader: R) -> Result<Vec<Waypoint>> {
    let mut waypoints = Vec::new();
    let mut dropped = 0;
    for rec in builder().from_reader(reader).records() {
        let rec = match rec {
            Ok(rec) => rec,
            Err(err) if err.is_io_error() => {
                return Err(ModelError::Io(err.into()));
            }
            // Bad UTF-8 and the like count as a malformed line
            Err(_) => {
                dropped += 1;
                continue;
            }
        };
        match to_waypoint(&rec) {
            Ok(waypoint) => waypoints.push(waypoint),
            Err(_) => {
                dropped += 1;
            }
        }
    }
    if dropped > 0 {
        debug!("Skipped {dropped} malformed records, kept {}", waypoints.len());
    }
    Ok(waypoints)
}

/// Parses exactly one manually entered record. Unlike `load`, anything malformed is an error.
pub fn parse_one(input: &str) -> Result<Waypoint> {
    let parse_err = |reason: String| ModelError::Parse {
        input: input.to_string(),
        reason,
    };

    let mut records = builder().from_reader(input.as_bytes()).into_records();
    let rec = match records.next() {
        Some(Ok(rec)) => rec,
        Some(Err(err)) => return Err(parse_err(err.to_string())),
        None => return Err(parse_err("nothing entered".to_string())),
    };
    if records.next().is_some() {
        return Err(parse_err("expected a single record".to_string()));
    }
    to_waypoint(&rec).map_err(parse_err)
}

fn builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.has_headers(false).flexible(true).trim(Trim::All);
    builder
}

fn to_waypoint(rec: &StringRecord) -> Result<Waypoint, String> {
    if rec.len() != 3 {
        return Err(format!("expected 3 fields, found {}", rec.len()));
    }
    Ok(Waypoint {
        lat: coordinate(&rec[0])?,
        lng: coordinate(&rec[1])?,
        timestamp: rec[2]
            .parse::<i64>()
            .map_err(|err| format!("bad timestamp {:?}: {err}", &rec[2]))?,
    })
}

fn coordinate(field: &str) -> Result<f64, String> {
    let value = field
        .parse::<f64>()
        .map_err(|err| format!("bad coordinate {field:?}: {err}"))?;
    if !value.is_finite() {
        return Err(format!("coordinate {field:?} isn't finite"));
    }
    Ok(value)
}
