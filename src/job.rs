use std::fmt;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageBuffer, Luma, Pixel, Primitive};
use num_traits::NumCast;
use tracing::{debug, info};

use crate::builder::apply_configuration;
use crate::config::RawArguments;
use crate::errors::{JobFailure, JobStep, OdisfError, Result};
use crate::resolver::{check_output_path, resolve_inputs, LabelDepth, ResolvedInputs};
use crate::traits::{LabelImage, SegmentationEngine, SuperpixelHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Init,
    Resolved,
    Configured,
    Executed,
    Finalized,
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Summary of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub superpixels: u32,
}

/// One segmentation command: resolve inputs, configure, run, persist.
///
/// Every resource is owned by exactly one binding at a time, so whichever
/// step fails, everything acquired before it is released on the way out and
/// the output file is only touched after the segmentation succeeded.
pub struct Job<'a, E: SegmentationEngine> {
    args: &'a RawArguments,
    engine: &'a E,
    state: JobState,
}

impl<'a, E: SegmentationEngine> Job<'a, E> {
    pub const fn new(args: &'a RawArguments, engine: &'a E) -> Self {
        Self {
            args,
            engine,
            state: JobState::Init,
        }
    }

    pub const fn state(&self) -> JobState {
        self.state
    }

    /// Runs the job to a terminal state. A job runs once.
    pub fn run(mut self) -> std::result::Result<JobReport, JobFailure> {
        self.drive()
    }

    fn drive(&mut self) -> std::result::Result<JobReport, JobFailure> {
        let result = self.execute();
        if result.is_err() {
            self.transition(JobState::Failed);
        }
        result
    }

    fn execute(&mut self) -> std::result::Result<JobReport, JobFailure> {
        let ResolvedInputs {
            images,
            output_path,
        } = resolve_inputs(self.args).map_err(|e| JobFailure::new(JobStep::ResolveInputs, e))?;
        self.transition(JobState::Resolved);

        // the images move into the handle and are released with it
        let mut handle = self
            .engine
            .create(images)
            .map_err(|e| JobFailure::new(JobStep::Configure, e))?;
        apply_configuration(self.args, &mut handle)
            .map_err(|e| JobFailure::new(JobStep::Configure, e))?;
        self.transition(JobState::Configured);

        let labels = handle
            .run()
            .map_err(|e| JobFailure::new(JobStep::Execute, e))?;
        self.transition(JobState::Executed);

        write_labels(&labels, &output_path).map_err(|e| JobFailure::new(JobStep::Persist, e))?;
        let report = JobReport {
            output_path,
            width: labels.width(),
            height: labels.height(),
            superpixels: labels.iter().copied().max().unwrap_or(0),
        };
        drop(labels);
        self.transition(JobState::Finalized);

        info!(
            path = %report.output_path.display(),
            superpixels = report.superpixels,
            "label image written"
        );
        Ok(report)
    }

    fn transition(&mut self, next: JobState) {
        debug!(from = %self.state, to = %next, "job state changed");
        self.state = next;
    }
}

/// Runs a whole job with `engine`.
pub fn run_job<E: SegmentationEngine>(
    args: &RawArguments,
    engine: &E,
) -> std::result::Result<JobReport, JobFailure> {
    Job::new(args, engine).run()
}

/// What a command invocation amounted to.
#[derive(Debug)]
pub enum CommandOutcome {
    Finished(JobReport),
    /// `--help` was given; nothing else was looked at.
    Usage,
    Failed(JobFailure),
}

impl CommandOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

pub fn run_command<E: SegmentationEngine>(args: &RawArguments, engine: &E) -> CommandOutcome {
    if args.help_requested() {
        return CommandOutcome::Usage;
    }
    match run_job(args, engine) {
        Ok(report) => CommandOutcome::Finished(report),
        Err(failure) => CommandOutcome::Failed(failure),
    }
}

/// Writes `labels` with the format implied by the extension of `path`.
///
/// PNG, TIFF and PNM get 16-bit samples, other formats 8-bit ones. Labels
/// that do not fit are an error rather than being wrapped.
pub fn write_labels(labels: &LabelImage, path: &Path) -> Result<()> {
    let (format, depth) = check_output_path(path)?;
    let image = match depth {
        LabelDepth::Sixteen => DynamicImage::ImageLuma16(narrow(labels, path)?),
        LabelDepth::Eight => DynamicImage::ImageLuma8(narrow(labels, path)?),
    };

    image
        .save_with_format(path, format)
        .map_err(|e| OdisfError::ImageIo {
            path: path.to_path_buf(),
            operation: "label image write",
            source: Box::new(e),
        })
}

fn narrow<T>(labels: &LabelImage, path: &Path) -> Result<ImageBuffer<Luma<T>, Vec<T>>>
where
    T: Primitive + NumCast,
    Luma<T>: Pixel<Subpixel = T>,
{
    let too_large = |label: u32| OdisfError::ImageIo {
        path: path.to_path_buf(),
        operation: "label conversion",
        source: format!("label {} does not fit the output sample type", label).into(),
    };

    let samples = labels
        .iter()
        .map(|&label| <T as NumCast>::from(label).ok_or_else(|| too_large(label)))
        .collect::<Result<Vec<T>>>()?;
    ImageBuffer::from_raw(labels.width(), labels.height(), samples)
        .ok_or_else(|| too_large(0))
}
