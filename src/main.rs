//! Automation hub CLI entry point.

use clap::Parser;
use hub::cli::commands;
use hub::cli::{Cli, Commands};
use hub::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR non-TTY stdout
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    // Run the command and handle errors
    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,rusqlite=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let db = cli.db.as_ref();

    match &cli.command {
        Commands::Init => commands::init::execute(db, json),
        Commands::Version => commands::version::execute(json),
        Commands::Status => commands::status::execute(db, json),
        Commands::Settings { command } => commands::settings::execute(command, db, json),

        // Entity kinds
        Commands::Project { command } => commands::project::execute(command, db, json),
        Commands::Sheet { command } => commands::sheet::execute(command, db, json),
        Commands::Note { command } => commands::note::execute(command, db, json),
        Commands::Utility { command } => commands::utility::execute(command, db, json),
        Commands::Cmd { command } => commands::cmd::execute(command, db, json),
        Commands::Reminder { command } => commands::reminder::execute(command, db, json),
        Commands::Download { command } => commands::download::execute(command, db, json),

        // Audit log and backups
        Commands::History { command } => commands::history::execute(command, db, json),
        Commands::Backup { command } => commands::backup::execute(command, db, json),

        // Housekeeping
        Commands::Cleanup { paths, temp } => {
            commands::maintenance::execute_cleanup(paths, *temp, db, json)
        }
        Commands::Maintenance => commands::maintenance::execute_maintenance(db, json),

        // Shell completions
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
