use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use image::GenericImageView;
use parking_lot::Mutex;

use crate::errors::{OdisfError, Result};
use crate::params::{OdisfConfig, SamplingStrategy};
use crate::traits::{InputImages, LabelImage, SegmentationEngine, SuperpixelHandle};

/// What a [`MockSegmentationEngine`] saw during a job.
#[derive(Debug, Default)]
pub struct MockRecord {
    pub created: AtomicUsize,
    pub dropped: AtomicUsize,
    pub runs: AtomicUsize,
    pub setter_calls: AtomicUsize,
    pub last_config: Mutex<Option<OdisfConfig>>,
    pub had_mask: AtomicBool,
    pub had_objsm: AtomicBool,
}

/// Test engine: every run labels the whole input image as a single superpixel.
#[derive(Debug, Clone, Default)]
pub struct MockSegmentationEngine {
    pub record: Arc<MockRecord>,
    pub fail_create: bool,
    pub fail_run: bool,
}

impl MockSegmentationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_run() -> Self {
        Self {
            fail_run: true,
            ..Self::default()
        }
    }

    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    pub fn created(&self) -> usize {
        self.record.created.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> usize {
        self.record.dropped.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.record.runs.load(Ordering::SeqCst)
    }

    pub fn last_config(&self) -> Option<OdisfConfig> {
        *self.record.last_config.lock()
    }
}

impl SegmentationEngine for MockSegmentationEngine {
    type Handle = MockHandle;

    fn create(&self, inputs: InputImages) -> Result<MockHandle> {
        if self.fail_create {
            return Err(OdisfError::algorithm("mock create failure"));
        }
        self.record.created.fetch_add(1, Ordering::SeqCst);
        self.record
            .had_mask
            .store(inputs.mask.is_some(), Ordering::SeqCst);
        self.record
            .had_objsm
            .store(inputs.objsm.is_some(), Ordering::SeqCst);

        Ok(MockHandle {
            dimensions: inputs.image.dimensions(),
            config: OdisfConfig::default(),
            fail_run: self.fail_run,
            record: Arc::clone(&self.record),
        })
    }
}

#[derive(Debug)]
pub struct MockHandle {
    dimensions: (u32, u32),
    config: OdisfConfig,
    fail_run: bool,
    record: Arc<MockRecord>,
}

impl MockHandle {
    fn touch(&self) {
        self.record.setter_calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl SuperpixelHandle for MockHandle {
    fn use_diagonal_adjacency(&mut self, enabled: bool) {
        self.touch();
        self.config.use_diagonal_adjacency = enabled;
    }

    fn set_initial_seeds(&mut self, n0: i32) {
        self.touch();
        self.config.initial_seeds = n0;
    }

    fn set_final_superpixels(&mut self, nf: i32) {
        self.touch();
        self.config.final_superpixels = nf;
    }

    fn set_sampling(&mut self, strategy: SamplingStrategy) {
        self.touch();
        self.config.sampling = strategy;
    }

    fn config(&self) -> &OdisfConfig {
        &self.config
    }

    fn run(self) -> Result<LabelImage> {
        self.record.runs.fetch_add(1, Ordering::SeqCst);
        *self.record.last_config.lock() = Some(self.config);
        if self.fail_run {
            return Err(OdisfError::algorithm("mock run failure"));
        }
        let (width, height) = self.dimensions;
        Ok(LabelImage::from_pixel(width, height, image::Luma([1])))
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.record.dropped.fetch_add(1, Ordering::SeqCst);
    }
}
