use std::{fmt, str::FromStr};

use hifitime::{Duration, Epoch, TimeScale};

use crate::{
    constants::{B1900, JULIAN_YEAR_DAYS, MJD, T2000, TROPICAL_YEAR_DAYS},
    scheduler_errors::SchedulerError,
};

/// Year count an [`Equinox`] is expressed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum YearSystem {
    /// Julian years of 365.25 days from J2000.0 (`J2000`, `J2015.5`, or a bare number)
    Julian,
    /// Besselian (tropical) years from B1900.0 (`B1950`)
    Besselian,
}

/// Equinox of the frame a target position refers to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equinox {
    pub system: YearSystem,
    pub year: f64,
}

impl Equinox {
    pub const J2000: Equinox = Equinox {
        system: YearSystem::Julian,
        year: 2000.0,
    };

    /// Modified Julian Date (TT) of the equinox.
    pub fn mjd(&self) -> MJD {
        match self.system {
            YearSystem::Julian => julian_year_to_mjd(self.year),
            YearSystem::Besselian => B1900 + (self.year - 1900.0) * TROPICAL_YEAR_DAYS,
        }
    }

    /// The equinox as an instant in the TT time scale.
    pub fn epoch(&self) -> Epoch {
        Epoch::from_mjd_in_time_scale(self.mjd(), TimeScale::TT)
    }
}

impl Default for Equinox {
    fn default() -> Self {
        Equinox::J2000
    }
}

impl FromStr for Equinox {
    type Err = SchedulerError;

    /// Parse an equinox.
    ///
    /// - `"2000"`, `"2000.0"`, `"J2000"` → Julian year 2000
    /// - `"B1950"` → Besselian year 1950
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (system, digits) = match trimmed.chars().next() {
            Some('J') | Some('j') => (YearSystem::Julian, &trimmed[1..]),
            Some('B') | Some('b') => (YearSystem::Besselian, &trimmed[1..]),
            _ => (YearSystem::Julian, trimmed),
        };

        let year: f64 = digits
            .parse()
            .map_err(|_| SchedulerError::InvalidEquinox(s.to_string()))?;
        if !year.is_finite() {
            return Err(SchedulerError::InvalidEquinox(s.to_string()));
        }

        Ok(Equinox { system, year })
    }
}

impl fmt::Display for Equinox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.system {
            YearSystem::Julian => write!(f, "J{}", self.year),
            YearSystem::Besselian => write!(f, "B{}", self.year),
        }
    }
}

/// Transformation from a Julian year (e.g. `2000.0`, `2015.5`) to modified julian date (MJD)
///
/// Argument
/// --------
/// * `year`: the Julian year
///
/// Return
/// ------
/// * the modified julian date of that Julian year, in the TT frame
pub fn julian_year_to_mjd(year: f64) -> MJD {
    T2000 + (year - 2000.0) * JULIAN_YEAR_DAYS
}

/// Transformation from a Julian year to a [`hifitime::Epoch`] in the TT time scale.
pub fn julian_year_to_epoch(year: f64) -> Epoch {
    Epoch::from_mjd_in_time_scale(julian_year_to_mjd(year), TimeScale::TT)
}

/// Build a [`Duration`] from a number of seconds as found in a configuration file.
pub fn seconds(value: f64) -> Duration {
    Duration::from_seconds(value)
}
