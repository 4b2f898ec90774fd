use std::fmt;

use clap::{CommandFactory, Parser};

/// Command-line options as typed by the user.
///
/// Value-carrying options are kept loosely typed: each one is absent,
/// present without a value, or present with a value. Turning them into
/// images and algorithm settings is the job of the resolver and builder.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    version,
    about,
    long_about = None,
    disable_help_flag = true,
    args_override_self = true
)]
pub struct RawArguments {
    /// Input 2D image
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    img: Option<Option<String>>,

    /// Output 2D label image
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    out: Option<Option<String>>,

    /// Mask image indicating the region of interest
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    mask: Option<Option<String>>,

    /// Grayscale object saliency map
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    objsm: Option<Option<String>>,

    /// Disable search scope to consider 8-adjacency
    #[arg(long = "no-diag-adj")]
    no_diag_adj: bool,

    /// Desired initial number of seeds. Default: 8000
    #[arg(long, value_name = "N", num_args = 0..=1, allow_negative_numbers = true)]
    n0: Option<Option<String>>,

    /// Desired final number of superpixels. Default: 200
    #[arg(long, value_name = "N", num_args = 0..=1, allow_negative_numbers = true)]
    nf: Option<Option<String>>,

    /// Seed sampling algorithm. Options: grid, rnd. Default: grid
    #[arg(long = "sampl-op", value_name = "OP", num_args = 0..=1)]
    sampl_op: Option<Option<String>>,

    /// Prints this message
    #[arg(long)]
    help: bool,
}

/// Names of the options understood by [`RawArguments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgName {
    Img,
    Out,
    Mask,
    Objsm,
    NoDiagAdj,
    N0,
    Nf,
    SamplOp,
    Help,
}

impl ArgName {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Img => "img",
            Self::Out => "out",
            Self::Mask => "mask",
            Self::Objsm => "objsm",
            Self::NoDiagAdj => "no-diag-adj",
            Self::N0 => "n0",
            Self::Nf => "nf",
            Self::SamplOp => "sampl-op",
            Self::Help => "help",
        }
    }
}

impl fmt::Display for ArgName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{}", self.as_str())
    }
}

/// The three observable states of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgValue<'a> {
    Absent,
    /// The option was given, but without a value (or with an empty one).
    Empty,
    Given(&'a str),
}

impl<'a> ArgValue<'a> {
    fn from_slot(slot: &'a Option<Option<String>>) -> Self {
        match slot {
            None => Self::Absent,
            Some(None) => Self::Empty,
            Some(Some(value)) if value.is_empty() => Self::Empty,
            Some(Some(value)) => Self::Given(value.as_str()),
        }
    }

    fn from_flag(set: bool) -> Self {
        if set {
            Self::Empty
        } else {
            Self::Absent
        }
    }

    pub const fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }
}

impl RawArguments {
    pub fn value(&self, name: ArgName) -> ArgValue<'_> {
        match name {
            ArgName::Img => ArgValue::from_slot(&self.img),
            ArgName::Out => ArgValue::from_slot(&self.out),
            ArgName::Mask => ArgValue::from_slot(&self.mask),
            ArgName::Objsm => ArgValue::from_slot(&self.objsm),
            ArgName::NoDiagAdj => ArgValue::from_flag(self.no_diag_adj),
            ArgName::N0 => ArgValue::from_slot(&self.n0),
            ArgName::Nf => ArgValue::from_slot(&self.nf),
            ArgName::SamplOp => ArgValue::from_slot(&self.sampl_op),
            ArgName::Help => ArgValue::from_flag(self.help),
        }
    }

    pub fn exists(&self, name: ArgName) -> bool {
        self.value(name).is_present()
    }

    pub const fn help_requested(&self) -> bool {
        self.help
    }

    /// Usage text listing every option.
    pub fn usage() -> String {
        let mut command = Self::command();
        command.render_help().to_string()
    }
}
