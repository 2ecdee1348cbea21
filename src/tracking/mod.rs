//! # Reference frame tracking
//!
//! Measures how far the latest image of a target has drifted from its reference image
//! (the first image ever recorded for the target). The measurement is best effort and
//! works in two tiers:
//!
//! 1. **Astrometry** ([`astrometry::solve_offset`]): when both images carry a plate
//!    solution, the drift is the difference of the solved centers. Cheap and precise.
//! 2. **Phase correlation** ([`phase_correlation::PhaseCorrelator`]): otherwise both
//!    images are read back ([`image_io::ImageDataReader`]) and correlated in the Fourier
//!    domain. A plate-solved reference narrows the search.
//!
//! The last successful measurement, an [`OffsetInfo`], is kept. A failed measurement is
//! logged and leaves it untouched, so callers always get the most recent usable
//! correction, possibly stale, never an error.
//!
//! ```text
//! get_image_offset(exposure)
//!   ├─ no reference / no image / same file ──────────────> previous OffsetInfo
//!   ├─ tier 1 Ok ─────────────────────────────────────────> new OffsetInfo (Astrometric)
//!   └─ tier 1 Err ─> read pixels ─> tier 2 Ok ────────────> new OffsetInfo (Pixel)
//!                                 └─ Err (logged) ────────> previous OffsetInfo
//! ```

pub mod astrometry;
pub mod image_io;
pub mod phase_correlation;

use std::{fmt, sync::Arc};

use camino::Utf8PathBuf;
use hifitime::Epoch;

use crate::{
    config::TrackingConfig,
    observations::{Exposure, Image},
};

use astrometry::{solve_offset, AstrometricOffset};
use image_io::ImageDataReader;
use phase_correlation::{CorrelationError, CorrelationHint, PhaseCorrelator, PixelOffset};

/// Technique that produced an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetMethod {
    Astrometry,
    PhaseCorrelation,
}

/// A measured drift, on the sky or on the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Offset {
    Astrometric(AstrometricOffset),
    Pixel(PixelOffset),
}

impl Offset {
    pub fn method(&self) -> OffsetMethod {
        match self {
            Offset::Astrometric(_) => OffsetMethod::Astrometry,
            Offset::Pixel(_) => OffsetMethod::PhaseCorrelation,
        }
    }

    /// Drift expressed in detector pixels, whatever the technique.
    pub fn pixel_shift(&self) -> (f64, f64) {
        match self {
            Offset::Astrometric(delta) => delta.pixel_shift(),
            Offset::Pixel(shift) => (shift.dx, shift.dy),
        }
    }
}

/// The last successfully computed pointing correction of a target.
///
/// # Fields
///
/// * `offset` - the drift itself
/// * `reference`, `candidate` - the files compared
/// * `computed_at` - wall clock time of the measurement, `None` if the clock could not be read
/// * `generation` - number of successful measurements so far, this one included
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetInfo {
    pub offset: Offset,
    pub reference: Utf8PathBuf,
    pub candidate: Utf8PathBuf,
    pub computed_at: Option<Epoch>,
    pub generation: u64,
}

impl OffsetInfo {
    pub fn method(&self) -> OffsetMethod {
        self.offset.method()
    }
}

/// Offset state of one target and the collaborators needed to update it.
pub struct OffsetTracker {
    offset_info: Option<OffsetInfo>,
    generation: u64,
    image_reader: Arc<dyn ImageDataReader>,
    correlator: Arc<dyn PhaseCorrelator>,
    config: TrackingConfig,
}

impl fmt::Debug for OffsetTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffsetTracker")
            .field("offset_info", &self.offset_info)
            .field("generation", &self.generation)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OffsetTracker {
    pub fn new(
        image_reader: Arc<dyn ImageDataReader>,
        correlator: Arc<dyn PhaseCorrelator>,
        config: TrackingConfig,
    ) -> Self {
        OffsetTracker {
            offset_info: None,
            generation: 0,
            image_reader,
            correlator,
            config,
        }
    }

    pub fn offset_info(&self) -> Option<&OffsetInfo> {
        self.offset_info.as_ref()
    }

    /// Compare the last image of `exposure` with `reference` and keep the result.
    ///
    /// Arguments
    /// -----------------
    /// * `reference`: the target's reference image, if already known
    /// * `exposure`: the exposure whose most recently recorded image is compared
    ///
    /// Return
    /// ----------
    /// * the current [`OffsetInfo`]: the new measurement on success, the previous one
    ///   (or `None` if there never was one) otherwise
    pub fn update(&mut self, reference: Option<&Image>, exposure: &Exposure) -> Option<&OffsetInfo> {
        let Some(reference) = reference else {
            log::debug!("No reference image yet, offset not computed");
            return self.offset_info.as_ref();
        };
        let Some(candidate) = exposure.last_image() else {
            log::debug!("Exposure has no image, offset not computed");
            return self.offset_info.as_ref();
        };

        if reference.same_file(candidate) {
            log::debug!(
                "Image files are the same, not comparing: {}\t{}",
                reference.path(),
                candidate.path()
            );
            return self.offset_info.as_ref();
        }

        log::debug!(
            "Comparing recent to reference: {}\t{}",
            reference.path(),
            candidate.path()
        );

        match self.measure(reference, candidate) {
            Ok(offset) => {
                self.generation += 1;
                self.offset_info = Some(OffsetInfo {
                    offset,
                    reference: reference.path().to_owned(),
                    candidate: candidate.path().to_owned(),
                    computed_at: Epoch::now().ok(),
                    generation: self.generation,
                });
            }
            Err(err) => {
                log::warn!("Can't get phase translation between images: {err}");
            }
        }

        log::debug!("Offset info: {:?}", self.offset_info);
        self.offset_info.as_ref()
    }

    /// Tier 1, then tier 2 if tier 1 fails.
    fn measure(&self, reference: &Image, candidate: &Image) -> Result<Offset, CorrelationError> {
        match solve_offset(
            reference.wcs(),
            candidate.wcs(),
            self.config.max_pixel_scale_ratio,
        ) {
            Ok(delta) => return Ok(Offset::Astrometric(delta)),
            Err(err) => log::warn!("Can't solve offset: {err}"),
        }

        let reference_data = self
            .image_reader
            .read(reference.path())
            .ok_or_else(|| CorrelationError::MissingData(reference.path().to_owned()))?;
        let candidate_data = self
            .image_reader
            .read(candidate.path())
            .ok_or_else(|| CorrelationError::MissingData(candidate.path().to_owned()))?;

        let hint = reference
            .wcs()
            .and_then(|wcs| CorrelationHint::from_wcs(wcs, self.config.max_drift_arcsec));

        self.correlator
            .correlate(&reference_data, &candidate_data, hint.as_ref())
            .map(Offset::Pixel)
    }
}
