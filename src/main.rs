use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use manifest_notes::config::DEFAULT_CONFIG_FILE;
use manifest_notes::github::GhCli;
use manifest_notes::pipeline::REQUIRED_TOOLS;
use manifest_notes::{Config, Error, Outcome, RunOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "manifest-notes")]
#[command(version, about = "Publish a release of the manifest repository with notes from every repository")]
struct Cli {
    /// Tag of the release to create
    tag: String,

    /// Path to the configuration file
    #[arg(long, env = "MANIFEST_NOTES_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Print the notes instead of publishing them
    #[arg(long)]
    dry_run: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return exit_code(&Error::Usage(e.to_string()));
        }
    };

    init_tracing(cli.verbose);

    // Dropping the run future on a signal removes the workspace and kills
    // any git or gh child still running.
    let result = tokio::select! {
        result = run(&cli) => result,
        () = shutdown_signal() => Err(Error::Interrupted),
    };

    match result {
        Ok(outcome) => {
            match outcome {
                Outcome::Published { handle, .. } => {
                    println!("{}", handle.url.unwrap_or(handle.tag));
                }
                Outcome::DryRun { document } => print!("{document}"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            report(&e);
            exit_code(&e)
        }
    }
}

async fn run(cli: &Cli) -> Result<Outcome, Error> {
    manifest_notes::check_tools(REQUIRED_TOOLS).await?;
    let config = Config::load(&cli.config)?;
    let options = RunOptions {
        dry_run: cli.dry_run,
    };
    manifest_notes::run(&GhCli::default(), &config, &cli.tag, &options).await
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

fn report(err: &Error) {
    eprintln!("error: {err}");
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

fn exit_code(err: &Error) -> ExitCode {
    ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
}
