// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use clap::{Args, Subcommand};

mod points;

use points::{SegmentPointsArgs, segment_points};

#[derive(Debug, Args)]
#[command(about = "Segment objects in images with a promptable segmentation model.")]
#[command(args_conflicts_with_subcommands = true)]
#[command(arg_required_else_help = true)]
#[command(flatten_help = true)]
pub struct SegmentArgs {
    #[command(subcommand)]
    command: Option<SegmentCommands>,
}

#[derive(Debug, Subcommand)]
enum SegmentCommands {
    Points(SegmentPointsArgs),
}

pub fn segment(args: &SegmentArgs) {
    match args.command.as_ref() {
        Some(SegmentCommands::Points(points_args)) => segment_points(points_args),
        None => {}
    }
}
