// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use clap::{Args, Subcommand};

mod composite;
mod overlay;

use composite::{CompositeArgs, utils_composite};
use overlay::{OverlayArgs, utils_overlay};

#[derive(Debug, Args)]
#[command(about = "Utilities for merging masks and inspecting label images.")]
#[command(args_conflicts_with_subcommands = true)]
#[command(arg_required_else_help = true)]
#[command(flatten_help = true)]
pub struct UtilsArgs {
    #[command(subcommand)]
    command: Option<UtilsCommands>,
}

#[derive(Debug, Subcommand)]
enum UtilsCommands {
    Composite(CompositeArgs),
    Overlay(OverlayArgs),
}

pub fn utils(args: &UtilsArgs) {
    match args.command.as_ref() {
        Some(UtilsCommands::Composite(composite_args)) => utils_composite(composite_args),
        Some(UtilsCommands::Overlay(overlay_args)) => utils_overlay(overlay_args),
        None => {}
    }
}
