use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::{constants::ArcSec, constants::Degree, coordinates::Coordinate};

/// Plate solution of an image, as returned by the astrometric solver.
///
/// # Fields
///
/// * `center` - sky position of the image center (its frame is the solution's frame)
/// * `pixel_scale` - arcseconds per pixel
/// * `rotation` - position angle of the image `+y` axis, degrees east of north
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WcsSolution {
    pub center: Coordinate,
    pub pixel_scale: ArcSec,
    pub rotation: Degree,
}

impl WcsSolution {
    pub fn new(center: Coordinate, pixel_scale: ArcSec, rotation: Degree) -> Self {
        WcsSolution {
            center,
            pixel_scale,
            rotation,
        }
    }
}

/// A recorded image. Immutable once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    path: Utf8PathBuf,
    solved: Option<WcsSolution>,
}

impl Image {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Image {
            path: path.into(),
            solved: None,
        }
    }

    /// An image for which plate solving succeeded.
    pub fn solved(path: impl Into<Utf8PathBuf>, wcs: WcsSolution) -> Self {
        Image {
            path: path.into(),
            solved: Some(wcs),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn wcs(&self) -> Option<&WcsSolution> {
        self.solved.as_ref()
    }

    /// `true` if both records point to the same file on disk.
    ///
    /// Equal paths always match; otherwise both paths must canonicalize to the same file.
    pub fn same_file(&self, other: &Image) -> bool {
        if self.path == other.path {
            return true;
        }
        match (fs::canonicalize(&self.path), fs::canonicalize(&other.path)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}
