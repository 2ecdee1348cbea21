//! # Sky coordinates and their sources
//!
//! A target position is obtained once, when the target is built, from one of two
//! collaborators:
//!
//! 1. a [`CoordinateResolver`] turning an object name into a position (e.g. the CDS
//!    [`SesameResolver`](crate::coordinates::sesame::SesameResolver)),
//! 2. a [`CoordinateParser`] reading the explicit position string of the target file
//!    ([`SexagesimalParser`] by default).
//!
//! The resolver is best effort and may fail for any reason; the parser is the fallback.
//!
//! ## Units
//!
//! - `lon`, `lat`: **degrees**. For equatorial frames `lon` is the right ascension and
//!   `lat` the declination.
//! - [`ProperMotion`]: the two rates exactly as given in the target file (mas/yr by
//!   convention); they are carried, never applied.

pub mod sesame;

use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::{
    constants::{ArcSec, Degree, ARCSEC_PER_DEG, RADEG},
    conversion::parse_position,
    scheduler_errors::SchedulerError,
};

/// Celestial reference frame of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Frame {
    #[default]
    Icrs,
    Fk5,
    Fk4,
    Galactic,
}

impl Frame {
    /// `true` for frames whose longitude is a right ascension.
    pub fn is_equatorial(&self) -> bool {
        !matches!(self, Frame::Galactic)
    }
}

impl FromStr for Frame {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "icrs" => Ok(Frame::Icrs),
            "fk5" => Ok(Frame::Fk5),
            "fk4" => Ok(Frame::Fk4),
            "galactic" | "gal" => Ok(Frame::Galactic),
            _ => Err(SchedulerError::UnknownFrame(s.to_string())),
        }
    }
}

impl TryFrom<String> for Frame {
    type Error = SchedulerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frame::Icrs => "icrs",
            Frame::Fk5 => "fk5",
            Frame::Fk4 => "fk4",
            Frame::Galactic => "galactic",
        };
        f.write_str(name)
    }
}

/// A position on the sky.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lon: Degree,
    pub lat: Degree,
    pub frame: Frame,
}

impl Coordinate {
    /// Build a coordinate, normalizing the longitude into `[0, 360)`.
    ///
    /// Return
    /// ------
    /// * [`SchedulerError::InvalidCoordinate`] if an angle is not finite or the latitude
    ///   is outside `[-90, 90]`.
    pub fn new(lon: Degree, lat: Degree, frame: Frame) -> Result<Self, SchedulerError> {
        if !lon.is_finite() || !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(SchedulerError::InvalidCoordinate(format!("{lon} {lat}")));
        }
        Ok(Coordinate {
            lon: lon.rem_euclid(360.0),
            lat,
            frame,
        })
    }

    /// ICRS position from right ascension and declination in degrees.
    pub fn icrs(ra: Degree, dec: Degree) -> Result<Self, SchedulerError> {
        Coordinate::new(ra, dec, Frame::Icrs)
    }

    /// Great-circle distance to `other`, in arcseconds (haversine form).
    ///
    /// Frames are not converted: both positions are assumed to share one.
    pub fn separation(&self, other: &Coordinate) -> ArcSec {
        let (lat1, lat2) = (self.lat * RADEG, other.lat * RADEG);
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon) * RADEG;

        let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * h.sqrt().min(1.0).asin() / RADEG * ARCSEC_PER_DEG
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:+.6}) {}", self.lon, self.lat, self.frame)
    }
}

/// Proper motion of a target: (dRA/dt, dDec/dt).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProperMotion {
    pub d_ra: f64,
    pub d_dec: f64,
}

impl FromStr for ProperMotion {
    type Err = SchedulerError;

    /// Parse a `"dRA dDec"` pair.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SchedulerError::invalid_field("proper_motion", format!("`{s}`"));

        let mut fields = s.split_whitespace();
        let (Some(d_ra), Some(d_dec), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(invalid());
        };

        Ok(ProperMotion {
            d_ra: d_ra.parse().map_err(|_| invalid())?,
            d_dec: d_dec.parse().map_err(|_| invalid())?,
        })
    }
}

/// Name-based coordinate lookup.
///
/// Any error is treated as "the name could not be resolved" by the caller.
pub trait CoordinateResolver {
    fn resolve(&self, name: &str) -> Result<Coordinate, SchedulerError>;
}

/// Reading of an explicit position string.
pub trait CoordinateParser {
    fn parse(&self, position: &str, frame: Frame) -> Result<Coordinate, SchedulerError>;
}

/// Parser for the sexagesimal and decimal formats described in [`crate::conversion`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SexagesimalParser;

impl CoordinateParser for SexagesimalParser {
    fn parse(&self, position: &str, frame: Frame) -> Result<Coordinate, SchedulerError> {
        let (lon, lat) = parse_position(position, frame)?;
        Coordinate::new(lon, lat, frame)
    }
}

/// Resolver that never knows any name.
///
/// Useful offline: every target then falls back to its explicit position.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineResolver;

impl CoordinateResolver for OfflineResolver {
    fn resolve(&self, name: &str) -> Result<Coordinate, SchedulerError> {
        Err(SchedulerError::ResolutionFailed {
            name: name.to_string(),
            reason: "offline".into(),
        })
    }
}
