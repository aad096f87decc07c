use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ai2java-rs",
    about = "Rust App Inventor blocks-to-Java converter (emits component runtime calls)."
)]
pub struct Args {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Apply find/replace conditions from this XML or JSON file to every emitted line."
    )]
    pub conditions: Option<PathBuf>,
}
