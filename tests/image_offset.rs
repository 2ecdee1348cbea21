mod common;

use approx::assert_relative_eq;
use skyvisit::{
    coordinates::{Coordinate, Frame},
    observations::{Exposure, Image, WcsSolution},
    target::{Target, TargetSpec},
    tracking::OffsetMethod,
};

use crate::common::{
    offline_env, rolled, speckle, temp_path, visit_spec, write_fits, write_fits_header,
};

fn target() -> Target {
    let spec = TargetSpec::new("WASP-33", "02h26m51s +37d33m02s").with_visits(vec![visit_spec(60.0, 10)]);
    Target::new(&spec, &["cam00".to_string()], &offline_env()).unwrap()
}

/// Record `image` as a new exposure of the current visit and ask for the offset.
fn expose(target: &mut Target, image: Image) -> Option<skyvisit::tracking::OffsetInfo> {
    let exposure = Exposure::new().with_image("cam00", image);
    target.get_visit().unwrap().add_exposure(exposure);
    target.get_current_offset().cloned()
}

fn wcs(ra: f64, dec: f64) -> WcsSolution {
    WcsSolution::new(Coordinate::icrs(ra, dec).unwrap(), 10.0, 0.0)
}

#[test]
fn test_no_reference_yet() {
    let mut target = target();
    let exposure = Exposure::new().with_image("cam00", Image::new("early.fits"));
    assert!(target.get_image_offset(&exposure).is_none());
    assert!(target.reference_image().is_none());
}

#[test]
fn test_reference_itself_is_noop() {
    let mut target = target();
    assert!(expose(&mut target, Image::solved("ref.fits", wcs(36.7, 37.5))).is_none());
    assert_eq!(target.reference_image().unwrap().path(), "ref.fits");

    // same path again, even with another solution
    let again = Exposure::new().with_image("cam00", Image::solved("ref.fits", wcs(36.8, 37.5)));
    assert!(target.get_image_offset(&again).is_none());
    assert!(target.offset_info().is_none());
}

#[test]
fn test_same_file_through_another_path_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "ref.fits");
    write_fits(&path, &speckle(16, 1));

    let mut target = target();
    expose(&mut target, Image::new(path.clone()));

    let detour = path
        .parent()
        .unwrap()
        .join(".")
        .join(path.file_name().unwrap());
    assert!(expose(&mut target, Image::new(detour)).is_none());
}

#[test]
fn test_plate_solved_drift() {
    let mut target = target();
    expose(&mut target, Image::solved("ref.fits", wcs(36.7, 0.0)));
    let info = expose(
        &mut target,
        Image::solved("next.fits", wcs(36.7 + 20.0 / 3600.0, 0.0)),
    )
    .unwrap();

    assert_eq!(info.method(), OffsetMethod::Astrometry);
    assert_eq!(info.generation, 1);
    assert_eq!(info.reference, "ref.fits");
    assert_eq!(info.candidate, "next.fits");
    let (dx, dy) = info.offset.pixel_shift();
    assert_relative_eq!(dx, -2.0, epsilon = 1e-6);
    assert_relative_eq!(dy, 0.0, epsilon = 1e-6);
}

#[test]
fn test_phase_correlation_on_fits_files() {
    let dir = tempfile::tempdir().unwrap();
    let reference = temp_path(&dir, "ref.fits");
    let shifted = temp_path(&dir, "shifted.fits");
    let base = speckle(64, 42);
    write_fits(&reference, &base);
    write_fits(&shifted, &rolled(&base, 3, -2));

    let mut target = target();
    expose(&mut target, Image::new(reference));
    let info = expose(&mut target, Image::new(shifted)).unwrap();

    assert_eq!(info.method(), OffsetMethod::PhaseCorrelation);
    let (dx, dy) = info.offset.pixel_shift();
    assert_relative_eq!(dx, 3.0, epsilon = 1e-6);
    assert_relative_eq!(dy, -2.0, epsilon = 1e-6);
}

#[test]
fn test_solved_reference_bounds_correlation_search() {
    let dir = tempfile::tempdir().unwrap();
    let reference = temp_path(&dir, "ref.fits");
    let near = temp_path(&dir, "near.fits");
    let far = temp_path(&dir, "far.fits");
    let base = speckle(64, 7);
    write_fits(&reference, &base);
    write_fits(&near, &rolled(&base, 3, -2));
    write_fits(&far, &rolled(&base, 20, 0));

    // 10"/px and a 120" drift bound: shifts up to 12 px are searched
    let mut target = target();
    expose(&mut target, Image::solved(reference, wcs(36.7, 37.5)));

    let info = expose(&mut target, Image::new(near)).unwrap();
    assert_eq!(info.method(), OffsetMethod::PhaseCorrelation);
    let (dx, dy) = info.offset.pixel_shift();
    assert_relative_eq!(dx, 3.0, epsilon = 1e-6);
    assert_relative_eq!(dy, -2.0, epsilon = 1e-6);

    // the true peak lies outside the window
    let after_far = expose(&mut target, Image::new(far));
    assert_eq!(after_far, Some(info));
    assert_eq!(target.offset_info().map(|info| info.generation), Some(1));
}

#[test]
fn test_oversized_fits_header_keeps_previous_offset() {
    let dir = tempfile::tempdir().unwrap();
    let reference = temp_path(&dir, "ref.fits");
    let shifted = temp_path(&dir, "shifted.fits");
    let huge = temp_path(&dir, "huge.fits");
    let base = speckle(32, 3);
    write_fits(&reference, &base);
    write_fits(&shifted, &rolled(&base, -4, 1));
    write_fits_header(&huge, 4_294_967_296, 4_294_967_296);

    let mut target = target();
    expose(&mut target, Image::new(reference));
    let good = expose(&mut target, Image::new(shifted));
    assert!(good.is_some());

    assert_eq!(expose(&mut target, Image::new(huge)), good);
}

#[test]
fn test_current_offset_without_exposure() {
    let mut target = target();
    assert!(target.get_current_offset().is_none());
    target.get_visit().unwrap();
    assert!(target.get_current_offset().is_none());
}

#[test]
fn test_failures_keep_previous_offset() {
    let mut target = target();
    expose(&mut target, Image::solved("ref.fits", wcs(36.7, 0.0)));
    let good = expose(&mut target, Image::solved("good.fits", wcs(36.701, 0.0)));
    assert!(good.is_some());

    // neither solved nor readable
    let after_missing = expose(&mut target, Image::new("/nonexistent/missing.fits"));
    assert_eq!(after_missing, good);

    // degenerate solution, and still no pixels to fall back on
    let degenerate = WcsSolution::new(Coordinate::icrs(36.7, 0.0).unwrap(), 0.0, 0.0);
    let after_degenerate = expose(&mut target, Image::solved("bad.fits", degenerate));
    assert_eq!(after_degenerate, good);

    // solved in another frame
    let galactic = WcsSolution::new(Coordinate::new(36.7, 0.0, Frame::Galactic).unwrap(), 10.0, 0.0);
    let after_frame = expose(&mut target, Image::solved("gal.fits", galactic));
    assert_eq!(after_frame, good);

    assert_eq!(target.offset_info().map(|info| info.generation), Some(1));
}

#[test]
fn test_last_image_of_exposure_is_compared() {
    let mut target = target();
    expose(&mut target, Image::solved("ref.fits", wcs(36.7, 0.0)));

    let mut exposure = Exposure::new();
    exposure.insert("cam00", Image::solved("old.fits", wcs(36.7 + 10.0 / 3600.0, 0.0)));
    exposure.insert("cam01", Image::solved("other.fits", wcs(36.7 + 30.0 / 3600.0, 0.0)));
    // re-acquired: moves to the end
    exposure.insert("cam00", Image::solved("new.fits", wcs(36.7 + 50.0 / 3600.0, 0.0)));

    let info = target.get_image_offset(&exposure).unwrap();
    assert_eq!(info.candidate, "new.fits");
}
