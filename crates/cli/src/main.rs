mod cli;
mod commands;
mod context;
mod errors;
mod output;

use std::process::ExitCode;

use clap::Parser;

use cli::{CacheCommands, CapturesCommands, Cli, Commands, TemplatesCommands};
use context::AppContext;
use errors::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error_line(&err.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config_flag = cli.config.clone();
    let ctx = AppContext::load(cli.config)?;
    init_tracing(&ctx, command_verbose(&cli.command));

    match cli.command {
        Commands::Capture { host, port, .. } => commands::capture::run(&ctx, host, port).await,

        Commands::Captures { action } => match action {
            CapturesCommands::List {
                limit,
                provider,
                format,
            } => commands::captures::list(&ctx, limit, provider, format).await,
            CapturesCommands::Delete { selector, force } => {
                commands::captures::delete(&ctx, selector, force).await
            }
            CapturesCommands::Replay {
                selector,
                target_url,
                base_url,
                method,
                header,
                timeout,
                ..
            } => {
                commands::captures::replay(
                    &ctx, selector, target_url, base_url, method, header, timeout,
                )
                .await
            }
        },

        Commands::Templates { action } => match action {
            TemplatesCommands::List {
                provider,
                refresh,
                format,
            } => commands::templates::list(&ctx, provider, refresh, format).await,
            TemplatesCommands::Local { provider, format } => {
                commands::templates::local(&ctx, provider, format).await
            }
            TemplatesCommands::Download { id, all, refresh } => {
                commands::templates::download(&ctx, id, all, refresh).await
            }
            TemplatesCommands::Search {
                query,
                provider,
                refresh,
                format,
            } => commands::templates::search(&ctx, query, provider, refresh, format).await,
            TemplatesCommands::Run {
                id,
                target_url,
                secret,
                allow_env_placeholders,
                header,
                timeout,
                ..
            } => {
                commands::templates::run(
                    &ctx,
                    id,
                    target_url,
                    secret,
                    allow_env_placeholders,
                    header,
                    timeout,
                )
                .await
            }
            TemplatesCommands::Cache { action } => match action {
                CacheCommands::Clear => commands::templates::cache_clear(&ctx).await,
            },
            TemplatesCommands::Clean { force } => commands::templates::clean(&ctx, force).await,
        },

        Commands::Init { force } => commands::init::run(config_flag, force).await,
    }
}

/// Whether the invoked leaf subcommand passed `--verbose`. Only the
/// commands that make outbound requests expose the flag.
fn command_verbose(command: &Commands) -> bool {
    match command {
        Commands::Capture { verbose, .. } => *verbose,
        Commands::Captures {
            action: CapturesCommands::Replay { verbose, .. },
        } => *verbose,
        Commands::Templates {
            action: TemplatesCommands::Run { verbose, .. },
        } => *verbose,
        _ => false,
    }
}

fn init_tracing(ctx: &AppContext, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        match ctx.config.log_level {
            webhook_config::LogLevel::Debug => "debug",
            webhook_config::LogLevel::Info => "info",
            webhook_config::LogLevel::Warn => "warn",
            webhook_config::LogLevel::Error => "error",
        }
    };
    let filter = level.to_string();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .try_init();
}
