use crate::{constants::CameraId, observations::image::Image};

/// Images produced by one camera trigger, keyed by camera.
///
/// The order of the entries is the acquisition order. Recording a second image for a
/// camera replaces its previous entry and moves it to the end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exposure {
    images: Vec<(CameraId, Image)>,
}

impl Exposure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the image acquired by `camera`.
    pub fn insert(&mut self, camera: impl Into<CameraId>, image: Image) {
        let camera = camera.into();
        self.images.retain(|(id, _)| *id != camera);
        self.images.push((camera, image));
    }

    /// Builder form of [`Exposure::insert`].
    pub fn with_image(mut self, camera: impl Into<CameraId>, image: Image) -> Self {
        self.insert(camera, image);
        self
    }

    pub fn get(&self, camera: &str) -> Option<&Image> {
        self.images
            .iter()
            .find(|(id, _)| id == camera)
            .map(|(_, image)| image)
    }

    /// First image recorded for this exposure.
    pub fn first_image(&self) -> Option<&Image> {
        self.images.first().map(|(_, image)| image)
    }

    /// Most recently recorded image.
    pub fn last_image(&self) -> Option<&Image> {
        self.images.last().map(|(_, image)| image)
    }

    pub fn images(&self) -> impl Iterator<Item = (&str, &Image)> {
        self.images.iter().map(|(id, image)| (id.as_str(), image))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
