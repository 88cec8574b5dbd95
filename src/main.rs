use anyhow::Result;
use clap::{CommandFactory, Parser};
use polydub::app;
use polydub::cli::{Cli, Commands};
use polydub::config::Config;
use polydub::daemon::run_daemon;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let socket = app::resolve_socket(cli.socket.clone(), &config);

    match cli.command {
        Commands::Daemon => {
            run_daemon(config, cli.socket, cli.quiet).await?;
        }
        Commands::Dub {
            source,
            language,
            output,
            keep_workdir,
            timeout,
        } => {
            let mut config = config;
            if let Some(secs) = timeout {
                config.acquire.timeout_secs = secs;
            }
            app::run_dub_command(
                config,
                &source,
                &language,
                output,
                keep_workdir,
                cli.quiet,
                cli.verbose,
            )
            .await?;
        }
        Commands::Submit { source, language } => {
            app::submit_remote(&socket, &source, &language).await?;
        }
        Commands::Status { job_id } => {
            app::status_remote(&socket, &job_id).await?;
        }
        Commands::Watch { job_id } => {
            app::watch_remote(&socket, &job_id, cli.quiet).await?;
        }
        Commands::Output { job_id } => {
            app::output_remote(&socket, &job_id).await?;
        }
        Commands::Cleanup { job_id } => {
            app::cleanup_remote(&socket, &job_id, cli.quiet).await?;
        }
        Commands::Languages => {
            // Prefer the daemon's view when one is running; fall back to
            // the built-in catalog.
            if app::languages_remote(&socket).await.is_err() {
                app::languages_local();
            }
        }
        Commands::Health => {
            app::health_remote(&socket).await?;
        }
        Commands::Shutdown => {
            app::shutdown_remote(&socket, cli.quiet).await?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path())?,
    };
    Ok(config.with_env_overrides())
}
