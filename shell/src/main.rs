//! Group-administration shell built on `cmdguard`.
//!
//! Matches the given tokens against a fixed command tree, runs the guards on
//! the matched path and then the command itself. Exit codes are listed in
//! [`exit_codes`].

mod commands;
mod config;
mod directory;
mod exit_codes;
mod logging;
mod parse;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cmdguard::Dispatcher;
use serde::Serialize;
use tracing::{debug, info};

use crate::commands::Session;
use crate::config::load_config;

#[derive(Parser)]
#[command(
    name = "shell",
    version,
    about = "Group administration shell with guarded commands"
)]
struct Cli {
    /// Path to the shell config (defaults apply if missing).
    #[arg(long, default_value = "shell.toml")]
    config: PathBuf,

    /// User the command runs as.
    #[arg(long, default_value = "guest")]
    user: String,

    /// Print a JSON report instead of plain output lines.
    #[arg(long)]
    json: bool,

    /// Log guard decisions to stderr (ignored when `RUST_LOG` is set).
    #[arg(short, long)]
    verbose: bool,

    /// Command tokens, e.g. `group staff add bob`.
    #[arg(trailing_var_arg = true, required = true)]
    command: Vec<String>,
}

#[derive(Serialize)]
struct Report<'a> {
    command: String,
    user: &'a str,
    code: i32,
    output: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let config = load_config(&cli.config).context("load config")?;
    debug!(config = %cli.config.display(), "config loaded");

    let session = Arc::new(Session::new(&cli.user, &config));
    let tree = commands::build(&session).context("build command tree")?;
    let dispatcher = Dispatcher::new(tree, config.dispatch.clone());

    let parse = parse::resolve(dispatcher.tree(), &cli.command)?;
    let command = cli.command.join(" ");
    info!(user = %cli.user, command = %command, "executing");
    let code = dispatcher
        .execute(&parse)
        .with_context(|| format!("execute '{}'", command))?;
    debug!(code, "command finished");

    let output = session.take_output();
    if cli.json {
        let report = Report {
            command,
            user: session.user(),
            code,
            output,
        };
        println!(
            "{}",
            serde_json::to_string(&report).context("serialize report")?
        );
    } else {
        for line in output {
            println!("{}", line);
        }
    }
    Ok(exit_codes::from_result(code))
}
