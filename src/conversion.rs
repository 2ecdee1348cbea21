//! Parsing of explicit sky positions.
//!
//! Positions come from hand-written target files and take one of the usual shapes:
//!
//! ```text
//! 05h35m17.3s -05d23m28s     unit letters
//! 05:35:17.3 -05:23:28       colon separated
//! 05 35 17.3 -05 23 28       whitespace separated
//! 83.8221 -5.3911            decimal degrees
//! 5.5881h -5.3911d           decimal hours / degrees
//! ```
//!
//! The first three forms are sexagesimal (hours for the longitude-like axis of an
//! equatorial frame, degrees for galactic longitude). The last two are decimal.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    constants::{Degree, DEG_PER_HOUR},
    coordinates::Frame,
    scheduler_errors::SchedulerError,
};

/// Unit markers and separators accepted between sexagesimal fields.
static SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[hdms:°'"]"#).expect("separator regex is valid"));

/// Combine three sexagesimal fields into a single value in the unit of the first field.
///
/// The sign is carried by the first field only (`-00 30 14.2` is negative), minutes and
/// seconds must lie in `[0, 60)`.
fn sexagesimal(fields: &[&str]) -> Option<f64> {
    let [major, minutes, seconds] = fields else {
        return None;
    };

    let sign = if major.starts_with('-') { -1.0 } else { 1.0 };
    let major: f64 = major.trim_start_matches(&['-', '+'][..]).parse().ok()?;
    let m: f64 = minutes.parse().ok()?;
    let s: f64 = seconds.parse().ok()?;

    if !(0.0..60.0).contains(&m) || !(0.0..60.0).contains(&s) {
        return None;
    }

    Some(sign * (major + m / 60.0 + s / 3600.0))
}

/// Parse a right ascension string to degrees
///
/// Arguments
/// ---------
/// * `ra`: a string representing the right ascension in the format `HH MM SS.SS`
///
/// Returns
/// -------
/// * `Option<Degree>`: the right ascension in degrees, `None` if the input format is invalid.
pub(crate) fn parse_ra_to_deg(ra: &str) -> Option<Degree> {
    let parts: Vec<&str> = ra.split_whitespace().collect();
    Some(sexagesimal(&parts)? * DEG_PER_HOUR)
}

/// Parse a declination string to degrees
///
/// Arguments
/// ---------
/// * `dec`: a string representing the declination in the format `±DD MM SS.SS`
///
/// Returns
/// -------
/// * `Option<Degree>`: the declination in degrees, `None` if the input format is invalid.
pub(crate) fn parse_dec_to_deg(dec: &str) -> Option<Degree> {
    let parts: Vec<&str> = dec.split_whitespace().collect();
    sexagesimal(&parts)
}

/// Parse an explicit position string into a pair of angles in degrees.
///
/// Arguments
/// ---------
/// * `position`: the position string, in any of the shapes listed in the module docs
/// * `frame`: the frame the position is expressed in. Equatorial frames read the first
///   sexagesimal triple as hours, [`Frame::Galactic`] reads it as degrees.
///
/// Return
/// ------
/// * `(lon, lat)` in degrees, `lon` normalized to `[0, 360)`, or
///   [`SchedulerError::InvalidCoordinate`] if the string cannot be read or the latitude
///   falls outside `[-90, 90]`.
pub fn parse_position(position: &str, frame: Frame) -> Result<(Degree, Degree), SchedulerError> {
    let invalid = || SchedulerError::InvalidCoordinate(position.to_string());

    let cleaned = SEPARATORS.replace_all(position, " ");
    let fields: Vec<&str> = cleaned.split_whitespace().collect();

    let (lon, lat) = match fields.len() {
        6 => {
            let lon = if frame.is_equatorial() {
                parse_ra_to_deg(&fields[..3].join(" "))
            } else {
                sexagesimal(&fields[..3])
            }
            .ok_or_else(invalid)?;
            let lat = parse_dec_to_deg(&fields[3..].join(" ")).ok_or_else(invalid)?;
            (lon, lat)
        }
        2 => {
            let lon: f64 = fields[0].parse().map_err(|_| invalid())?;
            let lat: f64 = fields[1].parse().map_err(|_| invalid())?;
            // a trailing `h` on the first token means decimal hours
            let first_token = position.split_whitespace().next().unwrap_or_default();
            if first_token.ends_with('h') {
                (lon * DEG_PER_HOUR, lat)
            } else {
                (lon, lat)
            }
        }
        _ => return Err(invalid()),
    };

    if !lon.is_finite() || !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(invalid());
    }

    Ok((lon.rem_euclid(360.0), lat))
}
