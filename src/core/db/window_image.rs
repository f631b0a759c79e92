use std::{future::Future, path::PathBuf};

use crate::core::db::request::WindowRequest;

#[derive(Debug, Clone)]
pub struct WindowImage {
    pub id: i64,
    pub request_id: i64,
    /// Location of the stored copy inside the store directory
    pub image_path: PathBuf,
    pub location_type: String,
    pub reference_type: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub(super) _guard: (),
}

impl WindowImage {
    pub fn is_measured(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewImage {
    /// File to copy into the store
    pub source_path: PathBuf,
    pub location_type: String,
    pub reference_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

pub trait ImageRepository {
    fn add_image(&self, request: &WindowRequest, image: &NewImage) -> impl Future<Output = anyhow::Result<WindowImage>>;
    fn get_images(&self, request: &WindowRequest) -> impl Future<Output = anyhow::Result<Vec<WindowImage>>>;
    fn get_image_by_id(&self, id: i64) -> impl Future<Output = anyhow::Result<Option<WindowImage>>>;
    /// Overwrites any earlier measurement
    fn set_image_dimensions(&self, image: &WindowImage, dimensions: Dimensions) -> impl Future<Output = anyhow::Result<WindowImage>>;
}
