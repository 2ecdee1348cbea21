//! Tier 1: offset between two plate solutions.
//!
//! When both images were plate solved, the drift is the difference of their solved
//! centers, projected on the sky (`Δα·cos δ`, `Δδ`), plus the difference of their field
//! rotations. No pixel is read.

use thiserror::Error;

use crate::{
    constants::{ArcSec, Degree, Pixel, ARCSEC_PER_DEG, RADEG},
    coordinates::Frame,
    observations::WcsSolution,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AstrometryError {
    #[error("{0} image has no plate solution")]
    MissingSolution(&'static str),

    #[error("Plate solutions are in different frames: {reference} vs {candidate}")]
    FrameMismatch { reference: Frame, candidate: Frame },

    #[error("Degenerate plate solution for the {0} image")]
    DegenerateSolution(&'static str),

    #[error("Pixel scales are not comparable: {reference} vs {candidate} arcsec/pixel")]
    PixelScaleMismatch {
        reference: ArcSec,
        candidate: ArcSec,
    },
}

/// Drift of a candidate image relative to the reference, measured on the sky.
///
/// # Fields
///
/// * `delta_ra` - eastward offset (`Δα·cos δ`), arcseconds
/// * `delta_dec` - northward offset, arcseconds
/// * `delta_rotation` - change of field rotation in `(-180, 180]` degrees
/// * `separation` - great-circle distance between both centers, arcseconds
/// * `pixel_scale`, `rotation` - plate scale and rotation of the candidate, used to bring
///   the offset back onto the detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AstrometricOffset {
    pub delta_ra: ArcSec,
    pub delta_dec: ArcSec,
    pub delta_rotation: Degree,
    pub separation: ArcSec,
    pub pixel_scale: ArcSec,
    pub rotation: Degree,
}

impl AstrometricOffset {
    /// The offset expressed in detector pixels `(dx, dy)`.
    ///
    /// `+y` points at position angle `rotation`, `+x` at `rotation - 90°`, so with no
    /// rotation north is `+y` and east is `-x`.
    pub fn pixel_shift(&self) -> (Pixel, Pixel) {
        let theta = self.rotation * RADEG;
        let (sin, cos) = theta.sin_cos();
        let dx = (-self.delta_ra * cos + self.delta_dec * sin) / self.pixel_scale;
        let dy = (self.delta_ra * sin + self.delta_dec * cos) / self.pixel_scale;
        (dx, dy)
    }
}

fn wrap_degrees(angle: Degree) -> Degree {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

fn check_solution(wcs: &WcsSolution, which: &'static str) -> Result<(), AstrometryError> {
    let finite = wcs.center.lon.is_finite()
        && wcs.center.lat.is_finite()
        && wcs.pixel_scale.is_finite()
        && wcs.rotation.is_finite();
    if !finite || wcs.pixel_scale <= 0.0 {
        return Err(AstrometryError::DegenerateSolution(which));
    }
    Ok(())
}

/// Compute the sky offset of `candidate` relative to `reference`.
///
/// Arguments
/// ---------
/// * `reference`, `candidate`: the plate solutions, if any
/// * `max_pixel_scale_ratio`: largest ratio between both plate scales still accepted
///
/// Return
/// ------
/// * the [`AstrometricOffset`], or an [`AstrometryError`] when a solution is missing,
///   degenerate, or not comparable with the other one
pub fn solve_offset(
    reference: Option<&WcsSolution>,
    candidate: Option<&WcsSolution>,
    max_pixel_scale_ratio: f64,
) -> Result<AstrometricOffset, AstrometryError> {
    let reference = reference.ok_or(AstrometryError::MissingSolution("reference"))?;
    let candidate = candidate.ok_or(AstrometryError::MissingSolution("candidate"))?;

    check_solution(reference, "reference")?;
    check_solution(candidate, "candidate")?;

    if reference.center.frame != candidate.center.frame {
        return Err(AstrometryError::FrameMismatch {
            reference: reference.center.frame,
            candidate: candidate.center.frame,
        });
    }

    let ratio = reference.pixel_scale.max(candidate.pixel_scale)
        / reference.pixel_scale.min(candidate.pixel_scale);
    if ratio > max_pixel_scale_ratio {
        return Err(AstrometryError::PixelScaleMismatch {
            reference: reference.pixel_scale,
            candidate: candidate.pixel_scale,
        });
    }

    let mean_lat = 0.5 * (reference.center.lat + candidate.center.lat) * RADEG;
    let d_lon = wrap_degrees(candidate.center.lon - reference.center.lon);
    let d_lat = candidate.center.lat - reference.center.lat;

    Ok(AstrometricOffset {
        delta_ra: d_lon * mean_lat.cos() * ARCSEC_PER_DEG,
        delta_dec: d_lat * ARCSEC_PER_DEG,
        delta_rotation: wrap_degrees(candidate.rotation - reference.rotation),
        separation: reference.center.separation(&candidate.center),
        pixel_scale: candidate.pixel_scale,
        rotation: candidate.rotation,
    })
}
