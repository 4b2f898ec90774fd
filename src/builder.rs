use tracing::debug;

use crate::config::{ArgName, ArgValue, RawArguments};
use crate::errors::{OdisfError, Result};
use crate::params::SamplingStrategy;
use crate::traits::SuperpixelHandle;

/// Applies the optional algorithm parameters found in `args` to `handle`.
///
/// Each field is set at most once. All parameters are parsed before the
/// first setter runs, so a rejected parameter leaves the handle untouched.
pub fn apply_configuration<H: SuperpixelHandle>(
    args: &RawArguments,
    handle: &mut H,
) -> Result<()> {
    let diagonal = !args.exists(ArgName::NoDiagAdj);
    let n0 = seed_count(args, ArgName::N0, "no initial number of seeds was given")?;
    let nf = seed_count(args, ArgName::Nf, "no desired quantity of superpixels was given")?;
    let sampling = sampling_strategy(args)?;

    handle.use_diagonal_adjacency(diagonal);
    if let Some(n0) = n0 {
        handle.set_initial_seeds(n0);
    }
    if let Some(nf) = nf {
        handle.set_final_superpixels(nf);
    }
    if let Some(strategy) = sampling {
        handle.set_sampling(strategy);
    }

    debug!(config = ?handle.config(), "segmentation configured");
    Ok(())
}

/// Non-numeric values are rejected; the range is left to the engine.
fn seed_count(args: &RawArguments, name: ArgName, what: &'static str) -> Result<Option<i32>> {
    match args.value(name) {
        ArgValue::Absent => Ok(None),
        ArgValue::Empty => Err(OdisfError::MissingInput { option: name, what }),
        ArgValue::Given(value) => value
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|e| OdisfError::InvalidValue {
                option: name,
                reason: format!("{:?} is not an integer ({})", value, e),
            }),
    }
}

fn sampling_strategy(args: &RawArguments) -> Result<Option<SamplingStrategy>> {
    match args.value(ArgName::SamplOp) {
        ArgValue::Absent => Ok(None),
        ArgValue::Empty => Err(OdisfError::MissingInput {
            option: ArgName::SamplOp,
            what: "no sampling algorithm was given",
        }),
        ArgValue::Given(token) => match SamplingStrategy::from_token(token) {
            Some(strategy) => Ok(Some(strategy)),
            None => Err(OdisfError::UnsupportedOption {
                option: ArgName::SamplOp,
                value: token.to_string(),
                expected: SamplingStrategy::TOKENS,
            }),
        },
    }
}
