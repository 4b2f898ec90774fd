use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::Features;

const FOUR_NEIGHBORS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const EIGHT_NEIGHBORS: [(isize, isize); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Adjacency {
    Four,
    Eight,
}

impl Adjacency {
    pub(crate) const fn new(diagonal: bool) -> Self {
        if diagonal {
            Self::Eight
        } else {
            Self::Four
        }
    }

    fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Self::Four => &FOUR_NEIGHBORS,
            Self::Eight => &EIGHT_NEIGHBORS,
        }
    }

    pub(crate) fn neighbors(
        self,
        pixel: usize,
        width: usize,
        height: usize,
    ) -> impl Iterator<Item = usize> {
        let x = (pixel % width) as isize;
        let y = (pixel / width) as isize;
        self.offsets().iter().filter_map(move |&(dx, dy)| {
            let (nx, ny) = (x + dx, y + dy);
            if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                None
            } else {
                Some(ny as usize * width + nx as usize)
            }
        })
    }
}

/// Running statistics of one tree of the forest.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TreeStats {
    pub size: usize,
    color_sum: [f32; 3],
    saliency_sum: f32,
}

impl TreeStats {
    fn add(&mut self, features: &Features, pixel: usize) {
        self.size += 1;
        for (sum, value) in self.color_sum.iter_mut().zip(features.color[pixel]) {
            *sum += value;
        }
        self.saliency_sum += features.saliency_at(pixel);
    }

    pub(crate) fn mean_color(&self) -> [f32; 3] {
        if self.size == 0 {
            return [0.0; 3];
        }
        let n = self.size as f32;
        self.color_sum.map(|sum| sum / n)
    }

    pub(crate) fn mean_saliency(&self) -> f32 {
        if self.size == 0 {
            0.0
        } else {
            self.saliency_sum / self.size as f32
        }
    }
}

/// Result of one delineation: the tree of every pixel and per-tree statistics.
/// Tree `i` grows from seed `i`.
#[derive(Debug, Clone)]
pub(crate) struct Forest {
    pub tree_of: Vec<Option<usize>>,
    pub trees: Vec<TreeStats>,
}

impl Forest {
    /// Sorted, deduplicated neighbour trees of every tree.
    pub(crate) fn tree_neighbors(
        &self,
        features: &Features,
        adjacency: Adjacency,
    ) -> Vec<Vec<usize>> {
        let mut neighbors = vec![Vec::new(); self.trees.len()];
        for (pixel, tree) in self.tree_of.iter().enumerate() {
            let Some(tree) = *tree else { continue };
            for other in adjacency.neighbors(pixel, features.width, features.height) {
                if let Some(other_tree) = self.tree_of[other] {
                    if other_tree != tree {
                        neighbors[tree].push(other_tree);
                    }
                }
            }
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        neighbors
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    cost: f32,
    pixel: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then(self.pixel.cmp(&other.pixel))
    }
}

/// Image foresting transform with `fmax` path cost.
///
/// The arc weight to a pixel is its colour distance to the current mean
/// colour of the tree trying to conquer it, so tree statistics are updated
/// as each pixel leaves the queue. Pixels outside the region of interest
/// are never conquered.
pub(crate) fn delineate(features: &Features, seeds: &[usize], adjacency: Adjacency) -> Forest {
    let len = features.len();
    let mut cost = vec![f32::INFINITY; len];
    let mut tree_of: Vec<Option<usize>> = vec![None; len];
    let mut finished = vec![false; len];
    let mut trees = vec![TreeStats::default(); seeds.len()];
    let mut queue = BinaryHeap::with_capacity(seeds.len());

    for (tree, &seed) in seeds.iter().enumerate() {
        cost[seed] = 0.0;
        tree_of[seed] = Some(tree);
        queue.push(Reverse(Candidate {
            cost: 0.0,
            pixel: seed,
        }));
    }

    while let Some(Reverse(Candidate { cost: path_cost, pixel })) = queue.pop() {
        if finished[pixel] || path_cost > cost[pixel] {
            continue;
        }
        finished[pixel] = true;

        let Some(tree) = tree_of[pixel] else { continue };
        trees[tree].add(features, pixel);
        let mean = trees[tree].mean_color();

        for neighbor in adjacency.neighbors(pixel, features.width, features.height) {
            if finished[neighbor] || !features.in_roi(neighbor) {
                continue;
            }
            let extended = path_cost.max(color_distance(&features.color[neighbor], &mean));
            if extended < cost[neighbor] {
                cost[neighbor] = extended;
                tree_of[neighbor] = Some(tree);
                queue.push(Reverse(Candidate {
                    cost: extended,
                    pixel: neighbor,
                }));
            }
        }
    }

    Forest { tree_of, trees }
}

pub(crate) fn color_distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(
        width: usize,
        height: usize,
        color: impl Fn(usize, usize) -> [f32; 3],
    ) -> Features {
        let color = (0..width * height)
            .map(|i| color(i % width, i / width))
            .collect();
        Features {
            width,
            height,
            color,
            mask: None,
            saliency: None,
        }
    }

    #[test]
    fn test_neighbors_at_corner() {
        let mut four: Vec<_> = Adjacency::Four.neighbors(0, 3, 3).collect();
        four.sort_unstable();
        assert_eq!(four, vec![1, 3]);

        let mut eight: Vec<_> = Adjacency::Eight.neighbors(0, 3, 3).collect();
        eight.sort_unstable();
        assert_eq!(eight, vec![1, 3, 4]);

        assert_eq!(Adjacency::Eight.neighbors(4, 3, 3).count(), 8);
    }

    #[test]
    fn test_two_regions_follow_the_edge() {
        // left half black, right half white; one seed on each side
        let features = features(6, 4, |x, _| if x < 3 { [0.0; 3] } else { [1.0; 3] });
        let forest = delineate(&features, &[6, 11], Adjacency::Eight);

        for (pixel, tree) in forest.tree_of.iter().enumerate() {
            let expected = if pixel % 6 < 3 { 0 } else { 1 };
            assert_eq!(*tree, Some(expected), "pixel {}", pixel);
        }
        assert_eq!(forest.trees[0].size, 12);
        assert_eq!(forest.trees[1].mean_color(), [1.0; 3]);
        assert_eq!(forest.tree_neighbors(&features, Adjacency::Four), vec![vec![1], vec![0]]);
    }

    #[test]
    fn test_mask_blocks_propagation() {
        let mut features = features(3, 1, |_, _| [0.5; 3]);
        features.mask = Some(vec![true, false, true]);
        let forest = delineate(&features, &[0], Adjacency::Eight);

        assert_eq!(forest.tree_of, vec![Some(0), None, None]);
    }
}
