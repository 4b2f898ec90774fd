use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use super::forest::Adjacency;
use super::Features;
use crate::errors::{OdisfError, Result};
use crate::params::SamplingStrategy;

/// Fixed so that random sampling is reproducible between runs.
const RANDOM_SEED: u64 = 0x0D15_F5EE;

/// Picks about `count` distinct seed pixels inside the region of interest,
/// in ascending pixel order.
///
/// Every connected component of the region of interest gets at least one
/// seed, so no pixel inside it is left without a superpixel.
pub(crate) fn sample_seeds(
    features: &Features,
    strategy: SamplingStrategy,
    count: usize,
    adjacency: Adjacency,
) -> Result<Vec<usize>> {
    let mut seeds = match strategy {
        SamplingStrategy::Grid => grid(features, count),
        SamplingStrategy::Random => random(features, count)?,
    };
    cover_components(features, adjacency, &mut seeds);
    if seeds.is_empty() {
        return Err(OdisfError::algorithm(
            "no seed could be placed inside the region of interest",
        ));
    }
    Ok(seeds)
}

fn grid(features: &Features, count: usize) -> Vec<usize> {
    let area = features.roi_area();
    if area == 0 || count == 0 {
        return Vec::new();
    }

    let stride = ((area as f64 / count as f64).sqrt().floor() as usize).max(1);
    let offset = stride / 2;
    let mut seeds = Vec::new();
    for y in (offset..features.height).step_by(stride) {
        for x in (offset..features.width).step_by(stride) {
            let pixel = y * features.width + x;
            if features.in_roi(pixel) {
                seeds.push(pixel);
            }
        }
    }
    seeds
}

/// Adds the first pixel, in raster order, of every region-of-interest
/// component that holds no seed. Keeps `seeds` sorted.
fn cover_components(features: &Features, adjacency: Adjacency, seeds: &mut Vec<usize>) {
    let mut visited = vec![false; features.len()];
    let mut missing = Vec::new();
    let mut stack = Vec::new();

    for start in 0..features.len() {
        if visited[start] || !features.in_roi(start) {
            continue;
        }
        visited[start] = true;
        stack.push(start);
        let mut seeded = false;
        while let Some(pixel) = stack.pop() {
            seeded |= seeds.binary_search(&pixel).is_ok();
            for neighbor in adjacency.neighbors(pixel, features.width, features.height) {
                if !visited[neighbor] && features.in_roi(neighbor) {
                    visited[neighbor] = true;
                    stack.push(neighbor);
                }
            }
        }
        if !seeded {
            missing.push(start);
        }
    }

    if !missing.is_empty() {
        debug!(components = missing.len(), "seeded components the sampling missed");
        seeds.extend(missing);
        seeds.sort_unstable();
    }
}

/// Weighted draw without replacement; salient pixels are more likely seeds.
fn random(features: &Features, count: usize) -> Result<Vec<usize>> {
    let candidates: Vec<usize> = (0..features.len())
        .filter(|&pixel| features.in_roi(pixel))
        .collect();
    let amount = count.min(candidates.len());
    let mut rng = StdRng::seed_from_u64(RANDOM_SEED);

    let mut seeds: Vec<usize> = candidates
        .choose_multiple_weighted(&mut rng, amount, |&pixel| {
            1.0 + f64::from(features.saliency_at(pixel))
        })
        .map_err(|e| OdisfError::algorithm(format!("invalid sampling weights: {}", e)))?
        .copied()
        .collect();
    seeds.sort_unstable();
    Ok(seeds)
}
