//! Tier 2: translation between two images by phase correlation.
//!
//! Given a reference `r` and a candidate `c = r` shifted by `(dx, dy)`, the normalized
//! cross-power spectrum
//!
//! ```text
//! R(k) = conj(F_r(k)) · F_c(k) / |conj(F_r(k)) · F_c(k)|
//! ```
//!
//! is a pure phase ramp whose inverse transform is a Dirac peak at `(dx, dy)`. The peak
//! is searched on a centered power-of-two box of both images, then refined to sub-pixel
//! precision with a three-point parabola along each axis.
//!
//! Shifts larger than half the box are indistinguishable from negative ones
//! (wraparound); they are reported as negative. When the reference is plate solved, a
//! [`CorrelationHint`] bounds the search to the drift we can physically expect, which
//! also rules out spurious peaks far from the origin.

use camino::Utf8PathBuf;
use itertools::iproduct;
use nalgebra::DMatrix;
use rustfft::{num_complex::Complex, FftDirection, FftPlanner};
use thiserror::Error;

use crate::{
    constants::{ArcSec, Pixel, EPS, MIN_BOX_SIZE},
    observations::WcsSolution,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorrelationError {
    #[error("No pixel data for {0}")]
    MissingData(Utf8PathBuf),

    #[error("Images have different shapes: {reference:?} vs {candidate:?}")]
    ShapeMismatch {
        reference: (usize, usize),
        candidate: (usize, usize),
    },

    #[error("Images of {rows}x{cols} pixels are too small to correlate")]
    TooSmall { rows: usize, cols: usize },

    #[error("Image data contains non-finite values")]
    NonFinite,

    #[error("No correlation peak found")]
    NoPeak,
}

/// Translation of the candidate relative to the reference, in pixels.
///
/// `dx` runs along columns, `dy` along rows. `peak` is the height of the correlation
/// peak, 1.0 for a perfect circular shift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelOffset {
    pub dx: Pixel,
    pub dy: Pixel,
    pub peak: f64,
}

/// Prior knowledge narrowing the peak search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationHint {
    /// Largest shift (pixels, per axis) considered
    pub search_radius: Pixel,
}

impl CorrelationHint {
    /// Derive the search radius from the reference plate solution.
    ///
    /// Return
    /// ------
    /// * `None` if the solution has no usable pixel scale
    pub fn from_wcs(wcs: &WcsSolution, max_drift: ArcSec) -> Option<Self> {
        if !wcs.pixel_scale.is_finite() || wcs.pixel_scale <= 0.0 || !max_drift.is_finite() {
            return None;
        }
        Some(CorrelationHint {
            search_radius: max_drift.abs() / wcs.pixel_scale,
        })
    }
}

/// Phase-correlation primitive used by the offset tracker.
pub trait PhaseCorrelator {
    fn correlate(
        &self,
        reference: &DMatrix<f64>,
        candidate: &DMatrix<f64>,
        hint: Option<&CorrelationHint>,
    ) -> Result<PixelOffset, CorrelationError>;
}

/// FFT based [`PhaseCorrelator`].
#[derive(Debug, Clone, Copy)]
pub struct FftPhaseCorrelator {
    box_size: usize,
}

impl FftPhaseCorrelator {
    /// `box_size` bounds the side of the correlated box; it is rounded down to a power of two.
    pub fn new(box_size: usize) -> Self {
        FftPhaseCorrelator { box_size }
    }

    /// Side of the box correlated for images of `rows x cols` pixels.
    fn box_side(&self, rows: usize, cols: usize) -> Option<usize> {
        let limit = rows.min(cols).min(self.box_size);
        if limit < MIN_BOX_SIZE {
            return None;
        }
        // largest power of two <= limit
        Some(1 << (usize::BITS - 1 - limit.leading_zeros()))
    }
}

impl Default for FftPhaseCorrelator {
    fn default() -> Self {
        FftPhaseCorrelator::new(crate::constants::DEFAULT_BOX_SIZE)
    }
}

impl PhaseCorrelator for FftPhaseCorrelator {
    fn correlate(
        &self,
        reference: &DMatrix<f64>,
        candidate: &DMatrix<f64>,
        hint: Option<&CorrelationHint>,
    ) -> Result<PixelOffset, CorrelationError> {
        if reference.shape() != candidate.shape() {
            return Err(CorrelationError::ShapeMismatch {
                reference: reference.shape(),
                candidate: candidate.shape(),
            });
        }

        let (rows, cols) = reference.shape();
        let side = self
            .box_side(rows, cols)
            .ok_or(CorrelationError::TooSmall { rows, cols })?;

        let mut spectrum_ref = centered_box(reference, side)?;
        let mut spectrum_cand = centered_box(candidate, side)?;
        fft2(&mut spectrum_ref, side, FftDirection::Forward);
        fft2(&mut spectrum_cand, side, FftDirection::Forward);

        let mut surface: Vec<Complex<f64>> = spectrum_ref
            .iter()
            .zip(&spectrum_cand)
            .map(|(r, c)| {
                let cross = r.conj() * c;
                let norm = cross.norm();
                if norm > EPS {
                    cross.unscale(norm)
                } else {
                    Complex::new(0.0, 0.0)
                }
            })
            .collect();
        fft2(&mut surface, side, FftDirection::Inverse);

        let surface: Vec<f64> = surface.iter().map(|v| v.re).collect();
        let radius = hint.map(|h| h.search_radius);

        let (row, col, peak) = iproduct!(0..side, 0..side)
            .filter(|&(row, col)| match radius {
                Some(r) => {
                    (wrap_shift(row, side) as f64).abs() <= r.max(0.0)
                        && (wrap_shift(col, side) as f64).abs() <= r.max(0.0)
                }
                None => true,
            })
            .map(|(row, col)| (row, col, surface[row * side + col]))
            .fold(None, |best: Option<(usize, usize, f64)>, current| match best {
                Some(b) if b.2 >= current.2 => Some(b),
                _ => Some(current),
            })
            .ok_or(CorrelationError::NoPeak)?;

        if !peak.is_finite() || peak <= EPS {
            return Err(CorrelationError::NoPeak);
        }

        let up = surface[((row + side - 1) % side) * side + col];
        let down = surface[((row + 1) % side) * side + col];
        let left = surface[row * side + (col + side - 1) % side];
        let right = surface[row * side + (col + 1) % side];

        Ok(PixelOffset {
            dx: wrap_shift(col, side) as f64 + parabolic_refinement(left, peak, right),
            dy: wrap_shift(row, side) as f64 + parabolic_refinement(up, peak, down),
            peak,
        })
    }
}

/// Signed shift represented by index `i` of a periodic axis of length `n`.
fn wrap_shift(i: usize, n: usize) -> i64 {
    if i > n / 2 {
        i as i64 - n as i64
    } else {
        i as i64
    }
}

/// Vertex of the parabola through three samples, relative to the middle one.
fn parabolic_refinement(before: f64, center: f64, after: f64) -> f64 {
    let denom = before - 2.0 * center + after;
    if denom.abs() < EPS {
        return 0.0;
    }
    (0.5 * (before - after) / denom).clamp(-0.5, 0.5)
}

/// Copy the centered `side x side` box of `data`, mean subtracted, row-major.
fn centered_box(data: &DMatrix<f64>, side: usize) -> Result<Vec<Complex<f64>>, CorrelationError> {
    let (rows, cols) = data.shape();
    let (r0, c0) = ((rows - side) / 2, (cols - side) / 2);

    let values: Vec<f64> = iproduct!(0..side, 0..side)
        .map(|(r, c)| data[(r0 + r, c0 + c)])
        .collect();
    if values.iter().any(|v| !v.is_finite()) {
        return Err(CorrelationError::NonFinite);
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Ok(values
        .into_iter()
        .map(|v| Complex::new(v - mean, 0.0))
        .collect())
}

/// Transpose a row-major `side x side` buffer in place.
fn transpose(buf: &mut [Complex<f64>], side: usize) {
    for (row, col) in iproduct!(0..side, 0..side).filter(|(row, col)| row < col) {
        buf.swap(row * side + col, col * side + row);
    }
}

/// 2-D FFT of a row-major `side x side` buffer, by rows then by columns.
///
/// The inverse is normalized by `1 / side²`.
fn fft2(buf: &mut [Complex<f64>], side: usize, direction: FftDirection) {
    let fft = FftPlanner::new().plan_fft(side, direction);

    // `process` transforms every consecutive chunk of `side` values
    fft.process(buf);
    transpose(buf, side);
    fft.process(buf);
    transpose(buf, side);

    if direction == FftDirection::Inverse {
        let n = (side * side) as f64;
        for value in buf.iter_mut() {
            *value = value.unscale(n);
        }
    }
}
