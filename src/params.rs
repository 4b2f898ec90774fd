/// Seed sampling strategy used to place the initial seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingStrategy {
    #[default]
    Grid,
    Random,
}

impl SamplingStrategy {
    /// Tokens accepted on the command line, in the order they are listed to users.
    pub const TOKENS: &'static str = "grid, rnd";

    /// Exact, case-sensitive token lookup.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "grid" => Some(Self::Grid),
            "rnd" => Some(Self::Random),
            _ => None,
        }
    }
}

pub const DEFAULT_INITIAL_SEEDS: i32 = 8000;
pub const DEFAULT_FINAL_SUPERPIXELS: i32 = 200;

/// Parameters of a segmentation run.
///
/// Seed counts are stored as given; their range is checked by the engine
/// when the run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OdisfConfig {
    pub use_diagonal_adjacency: bool,
    pub initial_seeds: i32,
    pub final_superpixels: i32,
    pub sampling: SamplingStrategy,
}

impl Default for OdisfConfig {
    fn default() -> Self {
        Self {
            use_diagonal_adjacency: true,
            initial_seeds: DEFAULT_INITIAL_SEEDS,
            final_superpixels: DEFAULT_FINAL_SUPERPIXELS,
            sampling: SamplingStrategy::Grid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OdisfConfig::default();
        assert!(config.use_diagonal_adjacency);
        assert_eq!(config.initial_seeds, 8000);
        assert_eq!(config.final_superpixels, 200);
        assert_eq!(config.sampling, SamplingStrategy::Grid);
    }

    #[test]
    fn test_sampling_tokens() {
        assert_eq!(SamplingStrategy::from_token("grid"), Some(SamplingStrategy::Grid));
        assert_eq!(SamplingStrategy::from_token("rnd"), Some(SamplingStrategy::Random));
        assert_eq!(SamplingStrategy::from_token("GRID"), None);
        assert_eq!(SamplingStrategy::from_token("random"), None);
    }
}
