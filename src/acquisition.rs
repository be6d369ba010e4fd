use std::future::Future;

/// Where an image came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageSource {
    Camera,
    Gallery,
}

impl ImageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSource::Camera => "camera",
            ImageSource::Gallery => "gallery",
        }
    }
}

/// An image picked by the user, identified by its URI.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageAsset {
    uri: String,
    source: ImageSource,
}

impl ImageAsset {
    pub fn new(uri: impl Into<String>, source: ImageSource) -> Self {
        Self {
            uri: uri.into(),
            source,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn source(&self) -> ImageSource {
        self.source
    }
}

/// Source of images for the workflow, implemented by camera and gallery pickers.
///
/// Returning `None` means the user cancelled the picker; the workflow treats
/// that as a no-op.
pub trait InputAcquisitionPort {
    fn acquire(&self, source: ImageSource) -> impl Future<Output = Option<ImageAsset>> + Send;
}
