use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "overlay",
    version = overlay_core::version(),
    about = "Runs the overlay registry headless over simulated renderers",
)]
pub struct Args {
    /// Specify custom configuration file path
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Specify custom configuration file path"
    )]
    pub config_path: Option<PathBuf>,

    /// Validate configuration and exit without running frames
    #[arg(
        long = "dry-run",
        help = "Validate configuration and exit without running frames"
    )]
    pub dry_run: bool,

    /// Use default configuration and ignore config files
    #[arg(
        long = "defaults",
        help = "Use default configuration and ignore config files"
    )]
    pub use_defaults: bool,

    /// Number of frames to render on every renderer
    #[arg(short = 'f', long = "frames", default_value_t = 3)]
    pub frames: u32,

    /// Number of simulated renderers
    #[arg(short = 'r', long = "renderers", default_value_t = 2)]
    pub renderers: u32,

    /// Number of overlays placed by the grid layouter
    #[arg(short = 't', long = "tiles", default_value_t = 4)]
    pub tiles: u32,

    /// Viewport width of every renderer
    #[arg(long = "width", default_value_t = 800)]
    pub width: u32,

    /// Viewport height of every renderer
    #[arg(long = "height", default_value_t = 600)]
    pub height: u32,

    /// Only log info and above
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log everything including trace output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}
