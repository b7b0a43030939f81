//! A simple CLI to render a named template from a directory against
//! key=value arguments supplied on the command line.

use clap::Parser;
use std::collections::HashMap;
use std::io::Write;
use stencil::{Engine, Value};

#[derive(Parser)]
#[command(about = "Renders a stencil template file against key=value arguments")]
struct Cli {
    /// Directory templates are resolved relative to.
    root: String,
    /// Template name, relative to `root`.
    template: String,
    /// Arguments passed to the template as `name=value`.
    #[arg(value_parser = parse_kwarg)]
    args: Vec<(String, String)>,
}

fn parse_kwarg(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{s}'"))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let engine = Engine::filesystem(&cli.root);
    let kwargs: HashMap<String, Value> = cli
        .args
        .into_iter()
        .map(|(k, v)| (k, Value::from(v)))
        .collect();

    match engine.render(&cli.template, kwargs) {
        Ok(bytes) => {
            std::io::stdout().write_all(&bytes).expect("failed to write to stdout");
        }
        Err(e) => {
            eprintln!("error rendering '{}': {e}", cli.template);
            std::process::exit(1);
        }
    }
}
