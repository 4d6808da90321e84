use clap::Parser;
use screen_narrator::cli::commands::{cmd_run, cmd_screens, cmd_validate};
use screen_narrator::cli::config::{Cli, Commands, load_config};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Run {
            scenario,
            format,
            output,
        } => {
            let all_passed = cmd_run(
                &scenario,
                &format,
                output.as_deref(),
                cli.catalog.as_deref(),
                &config,
            )?;
            if !all_passed {
                std::process::exit(1);
            }
        }
        Commands::Screens { yaml } => {
            cmd_screens(cli.catalog.as_deref(), yaml)?;
        }
        Commands::Validate { path } => {
            cmd_validate(&path)?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise the level follows the `-v` count.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
