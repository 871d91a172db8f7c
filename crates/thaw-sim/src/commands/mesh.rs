use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use thaw_core::Settings;
use thaw_mesh::{Grid, MeshParams};

#[derive(Args, Debug)]
pub struct MeshArgs {
    /// Solver settings file with the grid keys.
    #[arg(long)]
    pub settings: PathBuf,
    /// Directory for the grid arrays.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
    /// Write the grid arrays even when the settings do not ask for it.
    #[arg(long)]
    pub save: bool,
}

pub fn run(args: &MeshArgs) -> Result<(), Box<dyn Error>> {
    let settings = Settings::load(&args.settings)?;
    let params = MeshParams::from(&settings.grid);
    let grid = Grid::new(&params)?;
    let widths = grid.delz();
    let (thinnest, thickest) = widths
        .iter()
        .fold((f64::INFINITY, 0.0f64), |(lo, hi), w| (lo.min(*w), hi.max(*w)));
    println!(
        "cells={} depth={} thinnest={:.6} thickest={:.6}",
        grid.n(),
        -grid.depth(),
        thinnest,
        thickest
    );
    if args.save || settings.grid.save_grid {
        grid.save(&args.out)?;
    }
    Ok(())
}
