//! Explicit configuration of the scheduler.
//!
//! Every default a target may fall back on lives here and is handed to
//! [`Target::new`](crate::target::Target::new) through a
//! [`SchedulerEnv`](crate::env_state::SchedulerEnv). Nothing is read from the process
//! environment. All structs deserialize from a partial document: missing keys take the
//! values of [`Default`].

use std::time::Duration;

use serde::Deserialize;

use crate::{
    constants::{
        ArcSec, DEFAULT_BOX_SIZE, DEFAULT_EPOCH, DEFAULT_EQUINOX, DEFAULT_MAX_DRIFT,
        DEFAULT_MAX_PIXEL_SCALE_RATIO, DEFAULT_PRIORITY, DEFAULT_PROPER_MOTION,
        DEFAULT_RESOLVER_TIMEOUT, SESAME_URL,
    },
    coordinates::Frame,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub defaults: TargetDefaults,
    pub tracking: TrackingConfig,
    /// Seconds allowed to a single name resolution
    pub resolver_timeout: u64,
    pub sesame_url: String,
}

impl SchedulerConfig {
    pub fn resolver_timeout(&self) -> Duration {
        Duration::from_secs(self.resolver_timeout)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            defaults: TargetDefaults::default(),
            tracking: TrackingConfig::default(),
            resolver_timeout: DEFAULT_RESOLVER_TIMEOUT,
            sesame_url: SESAME_URL.to_string(),
        }
    }
}

/// Values used for the optional fields of a target specification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TargetDefaults {
    pub frame: Frame,
    pub equinox: String,
    pub epoch: f64,
    pub priority: f64,
    pub proper_motion: String,
}

impl Default for TargetDefaults {
    fn default() -> Self {
        TargetDefaults {
            frame: Frame::Icrs,
            equinox: DEFAULT_EQUINOX.to_string(),
            epoch: DEFAULT_EPOCH,
            priority: DEFAULT_PRIORITY,
            proper_motion: DEFAULT_PROPER_MOTION.to_string(),
        }
    }
}

/// Tuning of the offset tracker.
///
/// # Fields
///
/// * `box_size` - largest side (pixels) of the centered box fed to the phase correlation,
///   rounded down to a power of two
/// * `max_drift_arcsec` - largest drift searched for when the reference is plate-solved
/// * `max_pixel_scale_ratio` - two plate solutions whose scales differ by more than this
///   ratio are not compared
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub box_size: usize,
    pub max_drift_arcsec: ArcSec,
    pub max_pixel_scale_ratio: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        TrackingConfig {
            box_size: DEFAULT_BOX_SIZE,
            max_drift_arcsec: DEFAULT_MAX_DRIFT,
            max_pixel_scale_ratio: DEFAULT_MAX_PIXEL_SCALE_RATIO,
        }
    }
}
