//! Pixel data access for the phase correlation.
//!
//! [`FitsImageReader`] reads the primary HDU of a FITS file through `fitsio`. Only
//! two-dimensional images are accepted (leading axes of length 1 are tolerated) and
//! `BSCALE`/`BZERO` are applied by cfitsio. The header is checked against the file size
//! before any pixel buffer is allocated.

use std::fs;

use camino::Utf8Path;
use fitsio::{hdu::HduInfo, images::ImageType, FitsFile};
use nalgebra::DMatrix;

use crate::scheduler_errors::SchedulerError;

/// Image data reader used by the offset tracker.
///
/// Returns `None` when the data cannot be read; the tracker treats it as a recoverable
/// failure.
pub trait ImageDataReader {
    fn read(&self, path: &Utf8Path) -> Option<DMatrix<f64>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FitsImageReader;

impl ImageDataReader for FitsImageReader {
    fn read(&self, path: &Utf8Path) -> Option<DMatrix<f64>> {
        match read_fits(path) {
            Ok(data) => Some(data),
            Err(err) => {
                log::warn!("Can't read image data from {path}: {err}");
                None
            }
        }
    }
}

fn invalid(reason: impl Into<String>) -> SchedulerError {
    SchedulerError::InvalidFits(reason.into())
}

/// Bytes per stored pixel.
fn pixel_width(image_type: &ImageType) -> u64 {
    match image_type {
        ImageType::UnsignedByte | ImageType::Byte => 1,
        ImageType::Short | ImageType::UnsignedShort => 2,
        ImageType::Long | ImageType::UnsignedLong | ImageType::Float => 4,
        ImageType::LongLong | ImageType::Double => 8,
    }
}

/// Rows and columns of a primary image of C-ordered `shape`.
///
/// The data unit it describes must fit in `file_len` bytes.
fn image_dimensions(
    shape: &[usize],
    image_type: &ImageType,
    file_len: u64,
) -> Result<(usize, usize), SchedulerError> {
    let (rows, cols) = match shape {
        [rest @ .., rows, cols] if rest.iter().all(|&n| n == 1) => (*rows, *cols),
        _ => return Err(invalid(format!("not a 2-D image: {shape:?}"))),
    };
    if rows == 0 || cols == 0 {
        return Err(invalid("empty image"));
    }

    let data_len = u64::try_from(rows)
        .ok()
        .zip(u64::try_from(cols).ok())
        .and_then(|(rows, cols)| rows.checked_mul(cols))
        .and_then(|count| count.checked_mul(pixel_width(image_type)))
        .ok_or_else(|| invalid(format!("data unit size overflows: {shape:?}")))?;

    if data_len > file_len {
        return Err(invalid("data unit larger than the file"));
    }
    Ok((rows, cols))
}

/// Read the primary image of a FITS file.
///
/// Arguments
/// ---------
/// * `path`: the FITS file
///
/// Return
/// ------
/// * a `NAXIS2 x NAXIS1` matrix (rows x columns) of physical values, or an error if the
///   file cannot be read or is not a 2-D primary image
pub fn read_fits(path: &Utf8Path) -> Result<DMatrix<f64>, SchedulerError> {
    let file_len = fs::metadata(path)?.len();
    let mut fptr = FitsFile::open(path)?;
    let hdu = fptr.primary_hdu()?;

    let (rows, cols) = match &hdu.info {
        HduInfo::ImageInfo { shape, image_type } => {
            image_dimensions(shape, image_type, file_len)?
        }
        HduInfo::TableInfo { .. } => return Err(invalid("primary HDU is a table")),
        HduInfo::AnyInfo => return Err(invalid("unknown primary HDU type")),
    };

    let values: Vec<f64> = hdu.read_image(&mut fptr)?;
    if values.len() != rows * cols {
        return Err(invalid(format!(
            "expected {} pixels, read {}",
            rows * cols,
            values.len()
        )));
    }

    Ok(DMatrix::from_row_slice(rows, cols, &values))
}
