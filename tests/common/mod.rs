#![allow(dead_code)]

use std::{collections::HashMap, fs};

use camino::{Utf8Path, Utf8PathBuf};
use fitsio::{
    images::{ImageDescription, ImageType},
    FitsFile,
};
use nalgebra::DMatrix;
use skyvisit::{
    config::SchedulerConfig,
    coordinates::{Coordinate, CoordinateResolver},
    env_state::SchedulerEnv,
    observations::VisitSpec,
    scheduler_errors::SchedulerError,
};

/// Resolver answering from a fixed table, failing for every other name.
#[derive(Debug, Default)]
pub struct TableResolver {
    known: HashMap<String, Coordinate>,
}

impl TableResolver {
    pub fn with(mut self, name: &str, ra: f64, dec: f64) -> Self {
        let coord = Coordinate::icrs(ra, dec).unwrap();
        self.known.insert(name.to_string(), coord);
        self
    }
}

impl CoordinateResolver for TableResolver {
    fn resolve(&self, name: &str) -> Result<Coordinate, SchedulerError> {
        self.known
            .get(name)
            .copied()
            .ok_or_else(|| SchedulerError::ResolutionFailed {
                name: name.to_string(),
                reason: "unknown object".into(),
            })
    }
}

pub fn offline_env() -> SchedulerEnv {
    SchedulerEnv::offline(SchedulerConfig::default())
}

pub fn env_with(resolver: TableResolver) -> SchedulerEnv {
    offline_env().with_resolver(resolver)
}

pub fn cameras() -> Vec<String> {
    vec!["cam00".to_string(), "cam01".to_string()]
}

pub fn visit_spec(exp_time: f64, min_nexp: usize) -> VisitSpec {
    VisitSpec {
        exp_time,
        min_nexp,
        exp_set_size: min_nexp,
        ..VisitSpec::default()
    }
}

/// Deterministic pseudo-random image.
pub fn speckle(size: usize, seed: u64) -> DMatrix<f64> {
    let mut state = seed;
    DMatrix::from_fn(size, size, |_, _| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 40) as f64
    })
}

/// `data` translated by `dx` columns and `dy` rows, wrapping around the edges.
pub fn rolled(data: &DMatrix<f64>, dx: i64, dy: i64) -> DMatrix<f64> {
    let (rows, cols) = data.shape();
    DMatrix::from_fn(rows, cols, |r, c| {
        data[(
            (r as i64 - dy).rem_euclid(rows as i64) as usize,
            (c as i64 - dx).rem_euclid(cols as i64) as usize,
        )]
    })
}

/// Write `data` as a 64-bit float FITS primary image.
pub fn write_fits(path: &Utf8Path, data: &DMatrix<f64>) {
    let (rows, cols) = data.shape();
    let description = ImageDescription {
        data_type: ImageType::Double,
        dimensions: &[rows, cols],
    };
    let mut fptr = FitsFile::create(path)
        .with_custom_primary(&description)
        .open()
        .unwrap();
    let hdu = fptr.primary_hdu().unwrap();
    // row-major, as FITS stores it
    let values: Vec<f64> = data.transpose().iter().copied().collect();
    hdu.write_image(&mut fptr, &values).unwrap();
}

/// Write a lone primary header announcing a `naxis1 x naxis2` 16-bit image.
pub fn write_fits_header(path: &Utf8Path, naxis1: u64, naxis2: u64) {
    let mut bytes = [
        "SIMPLE  =                    T".to_string(),
        "BITPIX  =                   16".to_string(),
        "NAXIS   =                    2".to_string(),
        format!("NAXIS1  = {naxis1:>20}"),
        format!("NAXIS2  = {naxis2:>20}"),
        "END".to_string(),
    ]
    .iter()
    .map(|card| format!("{card:<80}"))
    .collect::<String>()
    .into_bytes();
    bytes.resize(2880, b' ');
    fs::write(path, bytes).unwrap();
}

pub fn temp_path(dir: &tempfile::TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap()
}
