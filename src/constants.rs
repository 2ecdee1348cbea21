//! # Constants and type definitions for skyvisit
//!
//! This module centralizes the **conversion factors**, **configuration defaults** and
//! **common type aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Unit conversions (degrees ↔ radians, arcseconds ↔ degrees)
//! - Time anchors used to turn Julian years into instants
//! - Defaults applied when a target or visit specification omits a field
//! - Core type aliases used across the crate

// -------------------------------------------------------------------------------------------------
// Unit conversions
// -------------------------------------------------------------------------------------------------

/// Numerical epsilon used for floating-point comparisons
pub const EPS: f64 = 1e-6;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds per degree
pub const ARCSEC_PER_DEG: f64 = 3600.0;

/// Hours of right ascension → degrees
pub const DEG_PER_HOUR: f64 = 15.0;

// -------------------------------------------------------------------------------------------------
// Time anchors
// -------------------------------------------------------------------------------------------------

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Length of a Julian year in days
pub const JULIAN_YEAR_DAYS: f64 = 365.25;

/// MJD epoch of B1900.0, anchor of the Besselian year count
pub const B1900: f64 = 15019.81352;

/// Length of a tropical (Besselian) year in days
pub const TROPICAL_YEAR_DAYS: f64 = 365.242198781;

// -------------------------------------------------------------------------------------------------
// Defaults
// -------------------------------------------------------------------------------------------------

/// Equinox assumed when a target does not name one
pub const DEFAULT_EQUINOX: &str = "2000";

/// Epoch (Julian year) assumed when a target does not name one
pub const DEFAULT_EPOCH: f64 = 2000.0;

/// Scheduling weight of a target without an explicit priority
pub const DEFAULT_PRIORITY: f64 = 1.0;

/// Proper motion ("dRA dDec") assumed when a target does not give one
pub const DEFAULT_PROPER_MOTION: &str = "0.0 0.0";

/// Exposure time of a visit in seconds
pub const DEFAULT_EXP_TIME: f64 = 120.0;

/// Minimum number of exposures making up a complete visit
pub const DEFAULT_MIN_NEXP: usize = 60;

/// Number of exposures taken between two pointing corrections
pub const DEFAULT_EXP_SET_SIZE: usize = 10;

/// Priority of a single visit inside its target
pub const DEFAULT_VISIT_PRIORITY: f64 = 100.0;

/// Largest box (pixels per side) used by the phase correlation
pub const DEFAULT_BOX_SIZE: usize = 256;

/// Smallest usable correlation box (pixels per side)
pub const MIN_BOX_SIZE: usize = 8;

/// Largest drift between two frames we expect to measure, in arcseconds
pub const DEFAULT_MAX_DRIFT: ArcSec = 120.0;

/// Largest ratio between two plate scales still considered the same optical setup
pub const DEFAULT_MAX_PIXEL_SCALE_RATIO: f64 = 1.05;

/// Timeout of a single name resolution request, in seconds
pub const DEFAULT_RESOLVER_TIMEOUT: u64 = 10;

/// CDS Sesame name resolver, text output, all databases
pub const SESAME_URL: &str = "https://cds.unistra.fr/cgi-bin/nph-sesame/-oI/A";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Distance on the detector in pixels
pub type Pixel = f64;
/// Modified Julian Date (days)
pub type MJD = f64;
/// Identifier of a camera bound to a visit
pub type CameraId = String;
