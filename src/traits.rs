use image::{DynamicImage, GrayImage, ImageBuffer, Luma};

use crate::errors::Result;
use crate::params::{OdisfConfig, SamplingStrategy};

/// One superpixel label per pixel; 0 marks pixels outside the region of interest.
pub type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Images a segmentation is bound to. Optional inputs share the domain of `image`.
#[derive(Debug, Clone)]
pub struct InputImages {
    pub image: DynamicImage,
    pub mask: Option<GrayImage>,
    pub objsm: Option<GrayImage>,
}

/// Creates segmentation handles bound to a set of input images.
///
/// The images are moved into the handle; they are released together with it.
pub trait SegmentationEngine {
    type Handle: SuperpixelHandle;

    fn create(&self, inputs: InputImages) -> Result<Self::Handle>;
}

/// A configured-but-not-yet-run segmentation.
///
/// Setters only record values. `run` consumes the handle, so a handle runs
/// at most once and is released as soon as the labels exist.
pub trait SuperpixelHandle {
    fn use_diagonal_adjacency(&mut self, enabled: bool);

    fn set_initial_seeds(&mut self, n0: i32);

    fn set_final_superpixels(&mut self, nf: i32);

    fn set_sampling(&mut self, strategy: SamplingStrategy);

    fn config(&self) -> &OdisfConfig;

    fn run(self) -> Result<LabelImage>;
}
