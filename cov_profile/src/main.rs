mod axis;
mod cli;
mod config;
mod contig;
mod depth;
mod io;
mod normalize;
mod process;
mod sample;
mod summary;
mod window;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

use anyhow::Context;

fn main() -> anyhow::Result<()> {
    let cfg = cli::handle_cli().with_context(|| "Error processing command line arguments")?;
    process::process_samples(&cfg)
}
