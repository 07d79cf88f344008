use std::io::Read;

use geom::{Distance, GPSBounds, LonLat};
use serde::{Deserialize, Serialize};

use crate::{records, Result, Waypoint};

/// The waypoints to traverse, in the order they were recorded or entered. Never sorted or
/// deduplicated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    waypoints: Vec<Waypoint>,
}

impl Path {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    /// Bulk-loads records, silently skipping any line that doesn't parse.
    pub fn load<R: Read>(reader: R) -> Result<Self> {
        Ok(Self::new(records::load(reader)?))
    }

    /// Appends one manually entered record. On a parse error, the path is untouched.
    pub fn append_record(&mut self, input: &str) -> Result<&Waypoint> {
        let waypoint = records::parse_one(input)?;
        self.waypoints.push(waypoint);
        Ok(&self.waypoints[self.waypoints.len() - 1])
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn num_segments(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }

    /// The endpoints of segment `idx`
    pub fn segment(&self, idx: usize) -> Option<(&Waypoint, &Waypoint)> {
        Some((self.waypoints.get(idx)?, self.waypoints.get(idx + 1)?))
    }

    pub fn summary(&self) -> PathSummary {
        let mut distance = Distance::ZERO;
        for pair in self.waypoints.windows(2) {
            distance = distance + pair[0].to_lon_lat().gps_dist(pair[1].to_lon_lat());
        }

        let bounds = if self.waypoints.is_empty() {
            None
        } else {
            let mut bounds = GPSBounds::new();
            for waypoint in &self.waypoints {
                bounds.update(waypoint.to_lon_lat());
            }
            Some(Bounds {
                min_lat: bounds.min_lat,
                min_lng: bounds.min_lon,
                max_lat: bounds.max_lat,
                max_lng: bounds.max_lon,
            })
        };

        PathSummary {
            waypoints: self.len(),
            segments: self.num_segments(),
            distance_meters: distance.inner_meters(),
            bounds,
        }
    }
}

impl Waypoint {
    pub fn to_lon_lat(&self) -> LonLat {
        LonLat::new(self.lng, self.lat)
    }
}

/// Describes a path for a renderer or a log line. The distance follows the earth's surface, even
/// though playback moves in a straight line through lat/lng space.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PathSummary {
    pub waypoints: usize,
    pub segments: usize,
    pub distance_meters: f64,
    pub bounds: Option<Bounds>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}
