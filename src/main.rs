use clap::Parser;
use std::io::{self, IsTerminal};
use ticketdeck::StructuredError;
use ticketdeck::cli::commands::{self, CommandResult};
use ticketdeck::cli::{Cli, Commands};
use ticketdeck::config;
use ticketdeck::logging::init_logging;
use ticketdeck::output::OutputContext;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, None) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let overrides = build_cli_overrides(&cli);
    let ctx = OutputContext::from_args(&cli);

    let result: CommandResult = match &cli.command {
        Commands::Init { force } => {
            commands::init::execute(*force, cli.dir.as_deref(), &ctx).map_err(Into::into)
        }
        Commands::Import(args) => commands::import::execute(args, &overrides, &ctx),
        Commands::List(args) => commands::list::execute(args, &overrides, &ctx).map_err(Into::into),
        Commands::Show { key } => commands::show::execute(key, &overrides, &ctx),
        Commands::Stats => commands::stats::execute(&overrides, &ctx).map_err(Into::into),
        Commands::Label { command } => commands::label::execute(command, &overrides, &ctx),
        Commands::Done { key, undo } => commands::done::execute(key, *undo, &overrides, &ctx),
        Commands::Due { key, date } => commands::due::execute(key, date, &overrides, &ctx),
        Commands::Delete { key } => commands::delete::execute(key, &overrides, &ctx),
        Commands::Reset { yes } => {
            commands::reset::execute(*yes, &overrides, &ctx).map_err(Into::into)
        }
        Commands::Rules { command } => {
            commands::rules::execute(command, &overrides, &ctx).map_err(Into::into)
        }
        Commands::Blacklist { command } => {
            commands::blacklist::execute(command, &overrides, &ctx).map_err(Into::into)
        }
        Commands::Tags { command } => {
            commands::tags::execute(command, &overrides, &ctx).map_err(Into::into)
        }
        Commands::Export { output } => {
            commands::export::execute(output.as_deref(), &overrides, &ctx).map_err(Into::into)
        }
        Commands::Load { file } => {
            commands::load::execute(file, &overrides, &ctx).map_err(Into::into)
        }
        Commands::Completions(args) => commands::completions::execute(args).map_err(Into::into),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(structured: &StructuredError, json_mode: bool) -> ! {
    let exit_code = structured.code.exit_code();
    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}

fn build_cli_overrides(cli: &Cli) -> config::CliOverrides {
    config::CliOverrides {
        dir: cli.dir.clone(),
        json: Some(cli.json),
        autosave_ms: None,
    }
}
