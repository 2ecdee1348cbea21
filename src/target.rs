//! # Observation target
//!
//! A [`Target`] is one object of the sky, the ordered list of [`Visit`]s planned on it,
//! and the state needed to keep the telescope on it while the visits run:
//!
//! - a [`VisitSequencer`] handing out the visits in order,
//! - a write-once reference image, the first image ever recorded for the target,
//! - an [`OffsetTracker`] measuring the drift of each new image from that reference.
//!
//! ## Construction
//!
//! Targets are built from a declarative [`TargetSpec`] (usually read from a JSON target
//! file) with [`Target::new`]:
//!
//! 1. the mandatory `name` and `position` are checked, the optional fields are normalized
//!    against [`TargetDefaults`](crate::config::TargetDefaults);
//! 2. the name is resolved through the environment's
//!    [`CoordinateResolver`](crate::coordinates::CoordinateResolver); on any failure the
//!    explicit `position` is parsed instead, in `frame`, which is only read on this path;
//! 3. one [`Visit`] is built per entry of `visit` (a single default visit if absent);
//! 4. the visits are reset.
//!
//! ## Example
//!
//! ```rust,no_run
//! use skyvisit::config::SchedulerConfig;
//! use skyvisit::env_state::SchedulerEnv;
//! use skyvisit::target::{Target, TargetSpec};
//!
//! let env = SchedulerEnv::offline(SchedulerConfig::default());
//! let spec = TargetSpec::from_json(
//!     r#"{"name": "M42", "position": "05h35m17s -05d23m28s",
//!         "visit": [{"exp_time": 60, "min_nexp": 10}]}"#,
//! )?;
//! let mut target = Target::new(&spec, &["cam00".to_string()], &env)?;
//!
//! while !target.is_finished() {
//!     let visit = target.get_visit()?;
//!     // expose, then record the exposure in `visit` and call `get_image_offset`
//!     # break;
//! }
//! # Ok::<(), skyvisit::scheduler_errors::SchedulerError>(())
//! ```

use std::fmt;

use hifitime::{Duration, Epoch};
use once_cell::unsync::OnceCell;
use serde::Deserialize;

use crate::{
    constants::CameraId,
    coordinates::{Coordinate, Frame, ProperMotion},
    env_state::SchedulerEnv,
    observations::{Exposure, Image, Visit, VisitSpec},
    scheduler_errors::SchedulerError,
    sequencer::{SequencerState, VisitSequencer},
    time::{julian_year_to_epoch, Equinox, YearSystem},
    tracking::{OffsetInfo, OffsetTracker},
};

/// A number written either as a JSON number or as a numeric string (`2000` or `"2000"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn to_f64(&self, field: &str) -> Result<f64, SchedulerError> {
        let value = match self {
            Numeric::Number(value) => *value,
            Numeric::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| SchedulerError::invalid_field(field, format!("`{text}` is not a number")))?,
        };
        if !value.is_finite() {
            return Err(SchedulerError::invalid_field(field, format!("{value} is not finite")));
        }
        Ok(value)
    }

    fn to_equinox(&self) -> Result<Equinox, SchedulerError> {
        match self {
            Numeric::Number(year) if year.is_finite() => Ok(Equinox {
                system: YearSystem::Julian,
                year: *year,
            }),
            Numeric::Number(year) => Err(SchedulerError::InvalidEquinox(year.to_string())),
            Numeric::Text(text) => text.parse(),
        }
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Numeric::Number(value)
    }
}

impl From<&str> for Numeric {
    fn from(value: &str) -> Self {
        Numeric::Text(value.to_string())
    }
}

/// Declarative description of a target, as found in a target file.
///
/// Only `name` and `position` are mandatory; they are kept optional here so that their
/// absence is reported by [`Target::new`] as a [`SchedulerError::MissingField`].
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TargetSpec {
    pub name: Option<String>,
    pub position: Option<String>,
    pub frame: Option<String>,
    pub equinox: Option<Numeric>,
    pub epoch: Option<Numeric>,
    pub priority: Option<Numeric>,
    pub proper_motion: Option<String>,
    pub visit: Option<Vec<VisitSpec>>,
}

impl TargetSpec {
    pub fn new(name: impl Into<String>, position: impl Into<String>) -> Self {
        TargetSpec {
            name: Some(name.into()),
            position: Some(position.into()),
            ..TargetSpec::default()
        }
    }

    /// Decode a JSON target description.
    ///
    /// Return
    /// ------
    /// * the specification, or [`SchedulerError::InvalidSpec`] if the document is not
    ///   valid JSON or a field has the wrong type (e.g. a numeric `name`)
    pub fn from_json(json: &str) -> Result<Self, SchedulerError> {
        serde_json::from_str(json).map_err(|err| SchedulerError::InvalidSpec(err.to_string()))
    }

    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.frame = Some(frame.into());
        self
    }

    pub fn with_equinox(mut self, equinox: impl Into<Numeric>) -> Self {
        self.equinox = Some(equinox.into());
        self
    }

    pub fn with_epoch(mut self, epoch: impl Into<Numeric>) -> Self {
        self.epoch = Some(epoch.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<Numeric>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_proper_motion(mut self, proper_motion: impl Into<String>) -> Self {
        self.proper_motion = Some(proper_motion.into());
        self
    }

    pub fn with_visits(mut self, visits: Vec<VisitSpec>) -> Self {
        self.visit = Some(visits);
        self
    }
}

#[derive(Debug)]
pub struct Target {
    name: String,
    coord: Coordinate,
    equinox: Equinox,
    epoch: f64,
    priority: f64,
    proper_motion: ProperMotion,
    visits: Vec<Visit>,
    sequencer: VisitSequencer,
    reference_image: OnceCell<Image>,
    tracker: OffsetTracker,
}

impl Target {
    /// Build a target from its specification.
    ///
    /// Arguments
    /// ---------
    /// * `spec`: the declarative description of the target
    /// * `cameras`: camera bindings, handed unchanged to every visit
    /// * `env`: configuration defaults and collaborators
    ///
    /// Return
    /// ------
    /// * the target with its visits reset, or a configuration error
    ///   (see [`SchedulerError::is_configuration_error`]). A failed name resolution is
    ///   not an error as long as the explicit position parses.
    pub fn new(
        spec: &TargetSpec,
        cameras: &[CameraId],
        env: &SchedulerEnv,
    ) -> Result<Self, SchedulerError> {
        let defaults = &env.config.defaults;

        let name = spec
            .name
            .as_deref()
            .ok_or_else(|| SchedulerError::MissingField("name".into()))?;
        if name.trim().is_empty() {
            return Err(SchedulerError::invalid_field("name", "empty name"));
        }
        let position = spec
            .position
            .as_deref()
            .ok_or_else(|| SchedulerError::MissingField("position".into()))?;

        let equinox = match &spec.equinox {
            Some(equinox) => equinox.to_equinox()?,
            None => defaults.equinox.parse()?,
        };
        let epoch = match &spec.epoch {
            Some(epoch) => epoch.to_f64("epoch")?,
            None => defaults.epoch,
        };
        let priority = match &spec.priority {
            Some(priority) => priority.to_f64("priority")?,
            None => defaults.priority,
        };
        if !priority.is_finite() || priority <= 0.0 {
            return Err(SchedulerError::invalid_field(
                "priority",
                format!("{priority} is not a positive number"),
            ));
        }
        let proper_motion: ProperMotion = spec
            .proper_motion
            .as_deref()
            .unwrap_or(&defaults.proper_motion)
            .parse()?;

        let visits = match &spec.visit {
            Some(specs) if specs.is_empty() => {
                return Err(SchedulerError::invalid_field("visit", "empty visit list"))
            }
            Some(specs) => specs
                .iter()
                .map(|visit| Visit::new(visit, cameras))
                .collect::<Result<Vec<_>, _>>()?,
            None => vec![Visit::new(&VisitSpec::default(), cameras)?],
        };

        let coord = match env.resolver().resolve(name) {
            Ok(coord) => coord,
            Err(err) => {
                log::debug!("Could not resolve name {name}: {err}, using position `{position}`");
                let frame = match &spec.frame {
                    Some(frame) => frame.parse::<Frame>()?,
                    None => defaults.frame,
                };
                env.parser().parse(position, frame)?
            }
        };

        let mut target = Target {
            name: name.to_string(),
            coord,
            equinox,
            epoch,
            priority,
            proper_motion,
            sequencer: VisitSequencer::new(visits.len()),
            visits,
            reference_image: OnceCell::new(),
            tracker: OffsetTracker::new(
                env.image_reader(),
                env.correlator(),
                env.config.tracking.clone(),
            ),
        };
        target.reset_visits();
        Ok(target)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coord(&self) -> &Coordinate {
        &self.coord
    }

    pub fn equinox(&self) -> Equinox {
        self.equinox
    }

    /// Epoch of the position, in Julian years.
    pub fn epoch(&self) -> f64 {
        self.epoch
    }

    /// Epoch of the position as an instant (TT).
    pub fn epoch_instant(&self) -> Epoch {
        julian_year_to_epoch(self.epoch)
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }

    pub fn proper_motion(&self) -> ProperMotion {
        self.proper_motion
    }

    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    /// The visit to work on.
    ///
    /// The current visit is returned again until it is complete, then the next one is
    /// handed out.
    ///
    /// Return
    /// ------
    /// * the visit, or [`SchedulerError::VisitsExhausted`] once the last visit is complete
    pub fn get_visit(&mut self) -> Result<&mut Visit, SchedulerError> {
        let index = self.sequencer.next_visit(&self.visits)?;
        self.visits
            .get_mut(index)
            .ok_or(SchedulerError::VisitsExhausted)
    }

    /// `true` once the last visit has been handed out, even if it is still running.
    pub fn done_visiting(&self) -> bool {
        self.sequencer.done_visiting()
    }

    /// `true` once the last visit has been handed out and is complete.
    pub fn is_finished(&self) -> bool {
        self.sequencer_state() == SequencerState::Exhausted
    }

    /// 0-based index of the visit handed out last.
    pub fn visit_num(&self) -> usize {
        self.sequencer.visit_num()
    }

    pub fn current_visit(&self) -> Option<&Visit> {
        self.sequencer
            .current()
            .and_then(|index| self.visits.get(index))
    }

    pub fn sequencer_state(&self) -> SequencerState {
        self.sequencer.state(&self.visits)
    }

    /// Forget every recorded exposure and rewind to the first visit.
    ///
    /// The reference image and the last offset are kept.
    pub fn reset_visits(&mut self) {
        self.visits.iter_mut().for_each(Visit::reset_exposures);
        self.sequencer.reset();
    }

    /// The first image recorded for this target, latched on first availability.
    pub fn reference_image(&self) -> Option<&Image> {
        latch_reference(&self.reference_image, &self.visits)
    }

    pub fn offset_info(&self) -> Option<&OffsetInfo> {
        self.tracker.offset_info()
    }

    /// Measure the drift of the most recent image of `exposure` from the reference image.
    ///
    /// Never fails: when nothing can be measured the previous result is returned, possibly
    /// `None`.
    pub fn get_image_offset(&mut self, exposure: &Exposure) -> Option<&OffsetInfo> {
        let reference = latch_reference(&self.reference_image, &self.visits);
        self.tracker.update(reference, exposure)
    }

    /// [`Target::get_image_offset`] on the last exposure of the current visit.
    pub fn get_current_offset(&mut self) -> Option<&OffsetInfo> {
        let reference = latch_reference(&self.reference_image, &self.visits);
        let Some(exposure) = self
            .sequencer
            .current()
            .and_then(|index| self.visits.get(index))
            .and_then(Visit::last_exposure)
        else {
            log::debug!("No exposure recorded for the current visit, offset not computed");
            return self.tracker.offset_info();
        };
        self.tracker.update(reference, exposure)
    }

    /// Expected time needed to run every visit.
    ///
    /// Arguments
    /// ---------
    /// * `overhead`: time added per visit (slew, setup); usually [`Duration::ZERO`]
    pub fn estimate_visit_duration(&self, overhead: Duration) -> Duration {
        self.visits.iter().fold(Duration::ZERO, |total, visit| {
            total + visit.estimate_duration() + overhead
        })
    }
}

/// Latch the first image of the first exposure of the first visit, if there is one yet.
fn latch_reference<'a>(cell: &'a OnceCell<Image>, visits: &[Visit]) -> Option<&'a Image> {
    cell.get_or_try_init(|| {
        let image = visits
            .first()
            .and_then(|visit| visit.exposures().first())
            .and_then(Exposure::first_image)
            .ok_or(())?;
        log::info!("Reference image: {}", image.path());
        Ok::<_, ()>(image.clone())
    })
    .ok()
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} equinox {} epoch {} priority {} ({} visits)",
            self.name,
            self.coord,
            self.equinox,
            self.epoch,
            self.priority,
            self.visits.len()
        )
    }
}

#[cfg(test)]
mod target_test {
    use super::*;
    use crate::{
        config::SchedulerConfig,
        coordinates::CoordinateResolver,
        time::seconds,
    };
    use approx::assert_relative_eq;

    struct FixedResolver(Coordinate);

    impl CoordinateResolver for FixedResolver {
        fn resolve(&self, _name: &str) -> Result<Coordinate, SchedulerError> {
            Ok(self.0)
        }
    }

    fn offline() -> SchedulerEnv {
        SchedulerEnv::offline(SchedulerConfig::default())
    }

    fn visit(exp_time: f64, min_nexp: usize) -> VisitSpec {
        VisitSpec {
            exp_time,
            min_nexp,
            ..VisitSpec::default()
        }
    }

    fn cameras() -> Vec<CameraId> {
        vec!["cam00".to_string()]
    }

    #[test]
    fn test_defaults() {
        let spec = TargetSpec::new("Vega", "18h36m56.3s +38d47m01s");
        let target = Target::new(&spec, &cameras(), &offline()).unwrap();

        assert_eq!(target.name(), "Vega");
        assert_eq!(target.equinox(), Equinox::J2000);
        assert_eq!(target.epoch(), 2000.0);
        assert_eq!(target.priority(), 1.0);
        assert_eq!(target.proper_motion(), ProperMotion::default());
        assert_eq!(target.coord().frame, Frame::Icrs);
        assert_eq!(target.visits().len(), 1);
        assert_eq!(target.visits()[0].min_nexp(), 60);
        assert_eq!(target.visits()[0].cameras(), cameras().as_slice());
        assert_eq!(target.sequencer_state(), SequencerState::NotStarted);
        assert!(!target.done_visiting());
    }

    #[test]
    fn test_resolver_wins_over_position() {
        let env = offline().with_resolver(FixedResolver(Coordinate::icrs(83.822, -5.391).unwrap()));
        let spec = TargetSpec::new("M42", "0.0 0.0");
        let target = Target::new(&spec, &[], &env).unwrap();
        assert_relative_eq!(target.coord().lon, 83.822);
    }

    #[test]
    fn test_numeric_strings() {
        let spec = TargetSpec::new("T", "10.0 20.0")
            .with_priority("2.5")
            .with_epoch(2015.5)
            .with_equinox("B1950")
            .with_frame("FK4");
        let target = Target::new(&spec, &[], &offline()).unwrap();
        assert_eq!(target.priority(), 2.5);
        assert_eq!(target.epoch(), 2015.5);
        assert_eq!(target.equinox().system, YearSystem::Besselian);
        assert_eq!(target.coord().frame, Frame::Fk4);
    }

    #[test]
    fn test_configuration_errors() {
        let env = offline();
        let check = |spec: TargetSpec| {
            let err = Target::new(&spec, &[], &env).unwrap_err();
            assert!(err.is_configuration_error(), "{err}");
            err
        };

        assert_eq!(
            check(TargetSpec {
                position: Some("0 0".into()),
                ..TargetSpec::default()
            }),
            SchedulerError::MissingField("name".into())
        );
        assert_eq!(
            check(TargetSpec {
                name: Some("T".into()),
                ..TargetSpec::default()
            }),
            SchedulerError::MissingField("position".into())
        );
        check(TargetSpec::new("  ", "0 0"));
        check(TargetSpec::new("T", "0 0").with_frame("altaz"));
        check(TargetSpec::new("T", "0 0").with_priority(0.0));
        check(TargetSpec::new("T", "0 0").with_priority("high"));
        check(TargetSpec::new("T", "0 0").with_equinox("Jfoo"));
        check(TargetSpec::new("T", "0 0").with_proper_motion("1.0"));
        check(TargetSpec::new("T", "0 0").with_visits(vec![]));
        check(TargetSpec::new("T", "not a position"));
    }

    #[test]
    fn test_from_json() {
        let spec = TargetSpec::from_json(
            r#"{"name": "HD 1", "position": "1.0 2.0", "priority": "3",
                "comment": "ignored", "visit": [{"exp_time": 2, "min_nexp": 2}]}"#,
        )
        .unwrap();
        assert_eq!(spec.priority, Some(Numeric::Text("3".into())));
        assert_eq!(spec.visit.as_ref().map(Vec::len), Some(1));

        assert!(matches!(
            TargetSpec::from_json(r#"{"name": 12, "position": "1.0 2.0"}"#),
            Err(SchedulerError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_visits_and_reset() {
        let spec = TargetSpec::new("T", "1 1").with_visits(vec![visit(1.0, 1), visit(1.0, 1)]);
        let mut target = Target::new(&spec, &cameras(), &offline()).unwrap();

        target.get_visit().unwrap().add_exposure(Exposure::new());
        assert_eq!(target.visit_num(), 0);
        target.get_visit().unwrap().add_exposure(Exposure::new());
        assert_eq!(target.visit_num(), 1);
        assert!(target.done_visiting());
        assert!(target.is_finished());
        assert_eq!(
            target.get_visit().unwrap_err(),
            SchedulerError::VisitsExhausted
        );

        target.reset_visits();
        target.reset_visits();
        assert!(!target.done_visiting());
        assert_eq!(target.visit_num(), 0);
        assert!(target.current_visit().is_none());
        assert!(target.visits().iter().all(|visit| visit.current_exp() == 0));
    }

    #[test]
    fn test_reference_image_latched_once() {
        let spec = TargetSpec::new("T", "1 1").with_visits(vec![visit(1.0, 3)]);
        let mut target = Target::new(&spec, &cameras(), &offline()).unwrap();
        assert!(target.reference_image().is_none());

        let first = Exposure::new().with_image("cam00", Image::new("first.fits"));
        target.get_visit().unwrap().add_exposure(first);
        assert_eq!(target.reference_image().unwrap().path(), "first.fits");

        target.reset_visits();
        let second = Exposure::new().with_image("cam00", Image::new("second.fits"));
        target.get_visit().unwrap().add_exposure(second);
        assert_eq!(target.reference_image().unwrap().path(), "first.fits");
    }

    #[test]
    fn test_estimate_visit_duration() {
        let spec = TargetSpec::new("T", "1 1").with_visits(vec![visit(10.0, 3), visit(5.0, 2)]);
        let target = Target::new(&spec, &[], &offline()).unwrap();
        assert_eq!(target.estimate_visit_duration(Duration::ZERO), seconds(40.0));
        assert_eq!(target.estimate_visit_duration(seconds(30.0)), seconds(100.0));
    }

    #[test]
    fn test_frame_only_read_for_position_fallback() {
        let env = offline().with_resolver(FixedResolver(Coordinate::icrs(10.0, 20.0).unwrap()));
        let spec = TargetSpec::new("T", "0 0").with_frame("altaz");
        let target = Target::new(&spec, &[], &env).unwrap();
        assert_eq!(target.coord().frame, Frame::Icrs);

        assert_eq!(
            Target::new(&spec, &[], &offline()).unwrap_err(),
            SchedulerError::UnknownFrame("altaz".into())
        );
    }

    #[test]
    fn test_current_offset_uses_last_exposure() {
        let spec = TargetSpec::new("T", "1 1").with_visits(vec![visit(1.0, 3)]);
        let mut target = Target::new(&spec, &cameras(), &offline()).unwrap();
        assert!(target.get_current_offset().is_none());

        let solved = |path: &str, ra: f64| {
            Exposure::new().with_image(
                "cam00",
                Image::solved(
                    path,
                    crate::observations::WcsSolution::new(Coordinate::icrs(ra, 0.0).unwrap(), 10.0, 0.0),
                ),
            )
        };
        target.get_visit().unwrap().add_exposure(solved("a.fits", 10.0));
        assert!(target.get_current_offset().is_none());

        target
            .get_visit()
            .unwrap()
            .add_exposure(solved("b.fits", 10.0 + 10.0 / 3600.0));
        let info = target.get_current_offset().unwrap();
        assert_eq!(info.candidate, "b.fits");
        assert_eq!(info.generation, 1);
    }

    #[test]
    fn test_epoch_instant() {
        let target = Target::new(&TargetSpec::new("T", "1 1"), &[], &offline()).unwrap();
        assert_eq!(target.epoch_instant(), Equinox::J2000.epoch());
    }
}
