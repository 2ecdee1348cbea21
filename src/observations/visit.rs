use hifitime::Duration;
use serde::Deserialize;

use crate::{
    constants::{
        CameraId, DEFAULT_EXP_SET_SIZE, DEFAULT_EXP_TIME, DEFAULT_MIN_NEXP,
        DEFAULT_VISIT_PRIORITY,
    },
    observations::exposure::Exposure,
    scheduler_errors::SchedulerError,
    time::seconds,
};

/// Declarative description of one visit, as found in a target file. Unknown keys are ignored.
///
/// # Fields
///
/// * `field_name` - optional label of the observed field
/// * `exp_time` - exposure time in seconds
/// * `min_nexp` - number of exposures after which the visit is complete
/// * `exp_set_size` - number of exposures between two pointing corrections
/// * `priority` - weight of the visit inside its target
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VisitSpec {
    pub field_name: Option<String>,
    pub exp_time: f64,
    pub min_nexp: usize,
    pub exp_set_size: usize,
    pub priority: f64,
}

impl Default for VisitSpec {
    fn default() -> Self {
        VisitSpec {
            field_name: None,
            exp_time: DEFAULT_EXP_TIME,
            min_nexp: DEFAULT_MIN_NEXP,
            exp_set_size: DEFAULT_EXP_SET_SIZE,
            priority: DEFAULT_VISIT_PRIORITY,
        }
    }
}

/// One scheduled block of exposures on a target.
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    field_name: Option<String>,
    exp_time: Duration,
    min_nexp: usize,
    exp_set_size: usize,
    priority: f64,
    cameras: Vec<CameraId>,
    exposures: Vec<Exposure>,
}

impl Visit {
    /// Build a visit from its specification and the cameras taking part in it.
    ///
    /// Return
    /// ------
    /// * [`SchedulerError::InvalidField`] if the exposure time is negative or not finite,
    ///   or if `min_nexp` or `exp_set_size` is zero.
    pub fn new(spec: &VisitSpec, cameras: &[CameraId]) -> Result<Self, SchedulerError> {
        if !spec.exp_time.is_finite() || spec.exp_time < 0.0 {
            return Err(SchedulerError::invalid_field(
                "exp_time",
                format!("{} is not a valid exposure time", spec.exp_time),
            ));
        }
        if spec.min_nexp == 0 {
            return Err(SchedulerError::invalid_field("min_nexp", "must be at least 1"));
        }
        if spec.exp_set_size == 0 {
            return Err(SchedulerError::invalid_field(
                "exp_set_size",
                "must be at least 1",
            ));
        }

        Ok(Visit {
            field_name: spec.field_name.clone(),
            exp_time: seconds(spec.exp_time),
            min_nexp: spec.min_nexp,
            exp_set_size: spec.exp_set_size,
            priority: spec.priority,
            cameras: cameras.to_vec(),
            exposures: Vec::new(),
        })
    }

    pub fn field_name(&self) -> Option<&str> {
        self.field_name.as_deref()
    }

    pub fn exp_time(&self) -> Duration {
        self.exp_time
    }

    pub fn min_nexp(&self) -> usize {
        self.min_nexp
    }

    pub fn exp_set_size(&self) -> usize {
        self.exp_set_size
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }

    pub fn cameras(&self) -> &[CameraId] {
        &self.cameras
    }

    pub fn exposures(&self) -> &[Exposure] {
        &self.exposures
    }

    /// Number of exposures recorded so far.
    pub fn current_exp(&self) -> usize {
        self.exposures.len()
    }

    pub fn last_exposure(&self) -> Option<&Exposure> {
        self.exposures.last()
    }

    /// `true` once `min_nexp` exposures have been recorded.
    pub fn complete(&self) -> bool {
        self.exposures.len() >= self.min_nexp
    }

    /// `true` right after the last exposure of a set has been recorded.
    pub fn set_is_finished(&self) -> bool {
        let n = self.exposures.len();
        n > 0 && n % self.exp_set_size == 0
    }

    pub fn add_exposure(&mut self, exposure: Exposure) {
        self.exposures.push(exposure);
    }

    /// Forget every recorded exposure.
    pub fn reset_exposures(&mut self) {
        self.exposures.clear();
    }

    /// Time spent exposing over the whole visit: `exp_time * min_nexp`.
    pub fn estimate_duration(&self) -> Duration {
        seconds(self.exp_time.to_seconds() * self.min_nexp as f64)
    }
}
