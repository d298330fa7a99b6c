mod cli;
mod commands;
mod config;
mod datasource;
mod engine;
mod paths;
mod progress;
mod resource;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, StateCommand};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config_path: PathBuf,
    pub state_path: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let config_path = paths::config_file(cli.config.as_deref());
    let state_path = paths::state_file(cli.state.as_deref(), &config_path);
    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config_path,
        state_path,
    };
    log::debug!(
        "config: {}, state: {} (verbosity {})",
        ctx.config_path.display(),
        ctx.state_path.display(),
        ctx.verbose
    );

    match cli.command {
        Command::Plan(args) => commands::declarative::plan(&ctx, args.target.as_deref()),
        Command::Apply(args) => {
            commands::declarative::apply(&ctx, args.target.as_deref(), args.yes, args.jobs)
        }
        Command::Refresh(args) => {
            commands::declarative::refresh(&ctx, args.target.as_deref(), args.jobs)
        }
        Command::Import {
            address,
            identifier,
        } => commands::import::run(&ctx, &address, &identifier),
        Command::Destroy(args) => {
            commands::declarative::destroy(&ctx, args.target.as_deref(), args.yes, args.jobs)
        }
        Command::State(cmd) => match cmd {
            StateCommand::List => commands::state::list(&ctx),
            StateCommand::Show { address } => commands::state::show(&ctx, &address),
            StateCommand::Rm { address } => commands::state::rm(&ctx, &address),
        },
        Command::Lookup { source, keys } => commands::lookup::run(&ctx, &source, &keys),
        Command::Schema { name } => commands::schema::run(name.as_deref()),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "tursoform", &mut io::stdout());
            Ok(())
        }
    }
}
