//! Polaudit CLI - Audit legal documents of websites with a language model.

use clap::Parser;
use polaudit_cli::commands;
use polaudit_cli::{init_logging, AuditConfig, Cli, CliError, Command};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> polaudit_cli::Result<()> {
    let config = AuditConfig::load_or_default(cli.config.as_deref())?;
    let mut stdout = std::io::stdout();

    match cli.command {
        Command::Audit(args) => {
            let metrics = commands::execute_audit(args, config)?;
            println!("{}", metrics.summary());
            if metrics.quota_halted {
                return Err(CliError::QuotaHalted);
            }
        }
        Command::Pending(args) => {
            commands::execute_pending(args, config.runner.identity_hash, &mut stdout)?;
        }
        Command::Schema(args) => {
            commands::execute_schema(args, &mut stdout)?;
        }
    }

    Ok(())
}
