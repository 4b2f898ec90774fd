//! Built-in superpixel engine.
//!
//! Seeds are oversampled, delineated with an image foresting transform and
//! then thinned out over a few iterations, dropping the seeds of trees that
//! look like their neighbours, until at most the requested number of
//! superpixels remains. Adjacent superpixels that are indistinguishable in
//! colour and saliency are finally merged.

mod forest;
mod sampling;

use image::GenericImageView;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::errors::{OdisfError, Result};
use crate::params::{OdisfConfig, SamplingStrategy};
use crate::traits::{InputImages, LabelImage, SegmentationEngine, SuperpixelHandle};

use forest::{color_distance, Adjacency, Forest, TreeStats};

/// Trees whose contrast is at most this are merged into one superpixel.
const MERGE_TOLERANCE: f32 = 1e-4;

/// Per-pixel data the engine keeps once the input images are released.
#[derive(Debug, Clone)]
pub(crate) struct Features {
    pub width: usize,
    pub height: usize,
    pub color: Vec<[f32; 3]>,
    pub mask: Option<Vec<bool>>,
    pub saliency: Option<Vec<f32>>,
}

impl Features {
    fn from_inputs(inputs: InputImages) -> Self {
        let (width, height) = inputs.image.dimensions();
        let color = inputs
            .image
            .to_rgb32f()
            .pixels()
            .map(|pixel| pixel.0)
            .collect();
        let mask = inputs
            .mask
            .map(|mask| mask.pixels().map(|pixel| pixel.0[0] > 0).collect());
        let saliency = inputs.objsm.map(|objsm| {
            objsm
                .pixels()
                .map(|pixel| f32::from(pixel.0[0]) / 255.0)
                .collect()
        });

        Self {
            width: width as usize,
            height: height as usize,
            color,
            mask,
            saliency,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.width * self.height
    }

    pub(crate) fn in_roi(&self, pixel: usize) -> bool {
        self.mask.as_ref().map_or(true, |mask| mask[pixel])
    }

    pub(crate) fn roi_area(&self) -> usize {
        self.mask
            .as_ref()
            .map_or(self.len(), |mask| mask.iter().filter(|&&inside| inside).count())
    }

    pub(crate) fn saliency_at(&self, pixel: usize) -> f32 {
        self.saliency.as_ref().map_or(0.0, |saliency| saliency[pixel])
    }
}

/// Creates [`Odisf`] handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct OdisfEngine {
    show_progress: bool,
}

impl OdisfEngine {
    pub const fn new() -> Self {
        Self {
            show_progress: false,
        }
    }

    /// Show a progress bar over the seed-removal iterations.
    pub const fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

impl SegmentationEngine for OdisfEngine {
    type Handle = Odisf;

    fn create(&self, inputs: InputImages) -> Result<Odisf> {
        Ok(Odisf::new(inputs).with_progress(self.show_progress))
    }
}

/// A segmentation bound to its input images.
#[derive(Debug)]
pub struct Odisf {
    features: Features,
    config: OdisfConfig,
    show_progress: bool,
}

impl Odisf {
    pub fn new(inputs: InputImages) -> Self {
        Self {
            features: Features::from_inputs(inputs),
            config: OdisfConfig::default(),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, iterations: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress_bar = ProgressBar::new(iterations);
        progress_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        progress_bar
    }

    fn seed_counts(&self) -> Result<(usize, usize)> {
        let OdisfConfig {
            initial_seeds,
            final_superpixels,
            ..
        } = self.config;
        if initial_seeds <= 0 {
            return Err(OdisfError::algorithm(format!(
                "initial number of seeds must be positive, got {}",
                initial_seeds
            )));
        }
        if final_superpixels <= 0 {
            return Err(OdisfError::algorithm(format!(
                "final number of superpixels must be positive, got {}",
                final_superpixels
            )));
        }
        Ok((initial_seeds as usize, final_superpixels as usize))
    }
}

impl SuperpixelHandle for Odisf {
    fn use_diagonal_adjacency(&mut self, enabled: bool) {
        self.config.use_diagonal_adjacency = enabled;
    }

    fn set_initial_seeds(&mut self, n0: i32) {
        self.config.initial_seeds = n0;
    }

    fn set_final_superpixels(&mut self, nf: i32) {
        self.config.final_superpixels = nf;
    }

    fn set_sampling(&mut self, strategy: SamplingStrategy) {
        self.config.sampling = strategy;
    }

    fn config(&self) -> &OdisfConfig {
        &self.config
    }

    fn run(self) -> Result<LabelImage> {
        let (n0, nf) = self.seed_counts()?;
        let adjacency = Adjacency::new(self.config.use_diagonal_adjacency);
        let features = &self.features;

        let mut seeds = sampling::sample_seeds(features, self.config.sampling, n0, adjacency)?;
        debug!(seeds = seeds.len(), requested = n0, "initial seeds sampled");

        let progress_bar = self.progress_bar(expected_iterations(n0, nf));
        let mut iteration = 1;
        let forest = loop {
            let forest = forest::delineate(features, &seeds, adjacency);
            progress_bar.inc(1);
            if seeds.len() <= nf {
                break forest;
            }

            let target = (n0 as f64 * (-f64::from(iteration)).exp()).round() as usize;
            let keep = target.max(nf);
            let reduced = reduce_seeds(features, &forest, &seeds, adjacency, keep);
            // disconnected regions of interest cannot merge below one seed each
            if keep == nf && reduced.len() == seeds.len() {
                warn!(seeds = seeds.len(), nf, "seed count cannot be reduced further");
                break forest;
            }
            seeds = reduced;
            debug!(iteration, seeds = seeds.len(), "seeds reduced");
            iteration += 1;
        };
        progress_bar.finish_and_clear();

        let labels = merge_and_label(features, &forest, adjacency);
        info!(
            superpixels = labels.iter().copied().max().unwrap_or(0),
            iterations = iteration,
            "segmentation finished"
        );
        Ok(labels)
    }
}

/// Number of delineations needed to go from `n0` down to `nf` seeds when the
/// kept count decays as `n0 * e^-i`.
fn expected_iterations(n0: usize, nf: usize) -> u64 {
    if n0 <= nf {
        1
    } else {
        (n0 as f64 / nf as f64).ln().ceil() as u64 + 1
    }
}

/// Thins `seeds` down to `keep` by grouping adjacent trees, least contrasting
/// pairs first, until `keep` groups remain. Each group keeps the seed of its
/// largest tree. Kept seeds stay in their original order.
fn reduce_seeds(
    features: &Features,
    forest: &Forest,
    seeds: &[usize],
    adjacency: Adjacency,
    keep: usize,
) -> Vec<usize> {
    if keep >= seeds.len() {
        return seeds.to_vec();
    }

    let neighbors = forest.tree_neighbors(features, adjacency);
    let mut pairs: Vec<(f32, usize, usize)> = neighbors
        .iter()
        .enumerate()
        .flat_map(|(a, adjacent)| {
            adjacent
                .iter()
                .filter(move |&&b| b > a)
                .map(move |&b| (a, b))
        })
        .map(|(a, b)| (contrast(&forest.trees[a], &forest.trees[b]), a, b))
        .collect();
    pairs.sort_by(|x, y| {
        x.0.total_cmp(&y.0)
            .then(x.1.cmp(&y.1))
            .then(x.2.cmp(&y.2))
    });

    let mut parent: Vec<usize> = (0..seeds.len()).collect();
    let mut groups = seeds.len();
    for (_, a, b) in pairs {
        if groups <= keep {
            break;
        }
        let (a, b) = (find(&mut parent, a), find(&mut parent, b));
        if a != b {
            parent[a.max(b)] = a.min(b);
            groups -= 1;
        }
    }

    let mut largest: Vec<Option<usize>> = vec![None; seeds.len()];
    for tree in 0..seeds.len() {
        let root = find(&mut parent, tree);
        let replace = largest[root]
            .map_or(true, |current| forest.trees[tree].size > forest.trees[current].size);
        if replace {
            largest[root] = Some(tree);
        }
    }

    let mut kept: Vec<usize> = largest.into_iter().flatten().collect();
    kept.sort_unstable();
    kept.into_iter().map(|tree| seeds[tree]).collect()
}

/// Mean-colour distance plus mean-saliency difference.
fn contrast(a: &TreeStats, b: &TreeStats) -> f32 {
    let saliency = (a.mean_saliency() - b.mean_saliency()).abs();
    color_distance(&a.mean_color(), &b.mean_color()) + saliency
}

/// Merges adjacent indistinguishable trees and numbers the result `1..=k` in
/// raster order. Pixels outside the region of interest keep label 0.
fn merge_and_label(features: &Features, forest: &Forest, adjacency: Adjacency) -> LabelImage {
    let mut parent: Vec<usize> = (0..forest.trees.len()).collect();
    for (tree, adjacent) in forest.tree_neighbors(features, adjacency).iter().enumerate() {
        for &other in adjacent.iter().filter(|&&other| other > tree) {
            if contrast(&forest.trees[tree], &forest.trees[other]) <= MERGE_TOLERANCE {
                let (a, b) = (find(&mut parent, tree), find(&mut parent, other));
                parent[a.max(b)] = a.min(b);
            }
        }
    }

    let mut label_of_root = vec![0u32; forest.trees.len()];
    let mut next_label = 0u32;
    let labels = forest
        .tree_of
        .iter()
        .map(|tree| match *tree {
            None => 0,
            Some(tree) => {
                let root = find(&mut parent, tree);
                if label_of_root[root] == 0 {
                    next_label += 1;
                    label_of_root[root] = next_label;
                }
                label_of_root[root]
            }
        })
        .collect();

    LabelImage::from_raw(features.width as u32, features.height as u32, labels)
        .unwrap_or_else(|| LabelImage::new(features.width as u32, features.height as u32))
}

fn find(parent: &mut [usize], mut node: usize) -> usize {
    while parent[node] != node {
        parent[node] = parent[parent[node]];
        node = parent[node];
    }
    node
}
