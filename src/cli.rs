use clap::{Parser, Subcommand, ValueEnum};
use finfo::extractors::Layer;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "finfo")]
#[command(about = "Read file metadata through registered extractors", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $FINFO_CONFIG or config/finfo.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print property values of a file as JSON
    Inspect(InspectArgs),
    /// Print the virtual property index
    Properties,
    /// Print the capabilities of a registered extractor
    Describe(DescribeArgs),
    /// Query one extractor directly through a single naming layer
    Explore(ExploreArgs),
}

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    /// File to inspect
    pub file: PathBuf,

    /// Property to extract (repeatable); defaults apply when omitted
    #[arg(short, long = "property")]
    pub properties: Vec<String>,

    /// Return every known property, ignoring configured defaults
    #[arg(long)]
    pub all: bool,
}

#[derive(clap::Args, Debug)]
pub struct DescribeArgs {
    /// Extractor name, e.g. "basic"
    pub handler: String,
}

#[derive(clap::Args, Debug)]
pub struct ExploreArgs {
    /// Extractor name, e.g. "basic"
    pub handler: String,

    /// File to inspect
    pub file: PathBuf,

    /// Names the keys are looked up by
    #[arg(long, value_enum, default_value_t = LayerArg::Virtual)]
    pub layer: LayerArg,

    /// Key to look up (repeatable); every key of the layer when omitted
    #[arg(short, long = "key")]
    pub keys: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerArg {
    /// Operation ids such as get_size_property
    Operations,
    /// Declared properties without aliases
    Properties,
    /// Aliases only
    Aliases,
    /// Declared properties and aliases
    Virtual,
}

impl From<LayerArg> for Layer {
    fn from(arg: LayerArg) -> Self {
        match arg {
            LayerArg::Operations => Layer::Operations,
            LayerArg::Properties => Layer::Properties,
            LayerArg::Aliases => Layer::Aliases,
            LayerArg::Virtual => Layer::VirtualProperties,
        }
    }
}
