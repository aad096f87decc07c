use ai2java_rs_core::cli::Args;
use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = Args::parse();
    ai2java_rs_core::run_cli(&args)
}
