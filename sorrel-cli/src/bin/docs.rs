#![allow(clippy::all)]
use clap::{Parser, Subcommand};
use clap_markdown;

use sorrel_cli::{download, segment, utils};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Download(download::DownloadArgs),
    Segment(segment::SegmentArgs),
    Utils(utils::UtilsArgs),
}

fn main() {
    clap_markdown::print_help_markdown::<Cli>();
}
