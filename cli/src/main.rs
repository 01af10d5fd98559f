#![deny(missing_docs)]

//! # Genschema CLI
//!
//! Command line front-end: loads Rust sources, extracts the queried type and
//! prints its JSON Schema document.
//!
//! Logging goes to stderr through `env_logger` (`RUST_LOG`, default `warn`),
//! the document goes to stdout or to `--output`.

use clap::Parser;
use genschema_core::AppResult;

mod schema_gen;

#[derive(Parser, Debug)]
#[clap(
    name = "genschema",
    author,
    version,
    about = "Generate JSON Schema from Rust type declarations"
)]
struct Cli {
    #[clap(flatten)]
    args: schema_gen::SchemaGenArgs,
}

fn main() -> AppResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let invocation = std::env::args().collect::<Vec<_>>().join(" ");
    schema_gen::execute(&cli.args, &invocation)
}
