//! `templates list|local|download|search|run|cache clear|clean`.

use std::time::Duration;

use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use webhook_templates::RunRequest;

use crate::cli::{parse_header_flag, OutputFormat};
use crate::context::AppContext;
use crate::errors::CliError;
use crate::output;

pub async fn list(
    ctx: &AppContext,
    provider: Option<String>,
    refresh: bool,
    format: OutputFormat,
) -> Result<(), CliError> {
    let cancel = CancellationToken::new();
    let listings = ctx
        .template_service()
        .list_remote(provider.as_deref(), refresh, &cancel)
        .await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listings).unwrap()),
        OutputFormat::Text => {
            if listings.is_empty() {
                output::info_line("no templates found");
            } else {
                println!("{}", output::remote_templates_table(&listings));
            }
        }
    }
    Ok(())
}

pub async fn local(
    ctx: &AppContext,
    provider: Option<String>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let cancel = CancellationToken::new();
    let templates = ctx
        .template_service()
        .list_local(provider.as_deref(), &cancel)
        .await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&templates).unwrap()),
        OutputFormat::Text => {
            if templates.is_empty() {
                output::info_line("no templates downloaded yet");
            } else {
                println!("{}", output::local_templates_table(&templates));
            }
        }
    }
    Ok(())
}

pub async fn download(
    ctx: &AppContext,
    id: Option<String>,
    all: bool,
    refresh: bool,
) -> Result<(), CliError> {
    let cancel = CancellationToken::new();
    let service = ctx.template_service();

    if all {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("downloading templates...");
        spinner.enable_steady_tick(Duration::from_millis(100));

        let outcome = service.download_all(refresh, &cancel).await?;
        spinner.finish_and_clear();
        output::success_line(&format!(
            "downloaded {}/{} templates ({} already present, {} failed)",
            outcome.downloaded, outcome.total, outcome.skipped, outcome.failed
        ));
        if !outcome.failed_ids.is_empty() {
            output::info_line(&format!("failed: {}", outcome.failed_ids.join(", ")));
        }
        return Ok(());
    }

    let id = id.ok_or_else(|| {
        CliError::Other(anyhow::anyhow!("pass a template id, or --all to download every template"))
    })?;
    let template = service.download(&id, refresh, &cancel).await?;
    output::success_line(&format!("downloaded template {}", template.id));
    Ok(())
}

pub async fn search(
    ctx: &AppContext,
    query: String,
    provider: Option<String>,
    refresh: bool,
    format: OutputFormat,
) -> Result<(), CliError> {
    let cancel = CancellationToken::new();
    let results = ctx
        .template_service()
        .search(&query, provider.as_deref(), refresh, &cancel)
        .await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results).unwrap()),
        OutputFormat::Text => {
            if results.local.is_empty() && results.remote.is_empty() {
                output::info_line("no matching templates");
            } else {
                if !results.local.is_empty() {
                    output::info_line("local:");
                    println!("{}", output::local_templates_table(&results.local));
                }
                if !results.remote.is_empty() {
                    output::info_line("remote:");
                    println!("{}", output::template_metadata_table(&results.remote));
                }
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn run(
    ctx: &AppContext,
    id: String,
    target_url: Option<String>,
    secret: Option<String>,
    allow_env_placeholders: bool,
    headers: Vec<String>,
    timeout: u64,
) -> Result<(), CliError> {
    let header_overrides = headers
        .iter()
        .map(|raw| parse_header_flag(raw).map_err(CliError::Other))
        .collect::<Result<Vec<_>, _>>()?;

    let request = RunRequest {
        id,
        target_url,
        secret,
        allow_env_placeholders,
        header_overrides,
        timeout: Duration::from_secs(timeout),
    };

    let outcome = ctx
        .template_service()
        .run(&request, &CancellationToken::new())
        .await?;

    output::info_line(&format!(
        "{} {} -> {} ({} ms)",
        outcome.method,
        outcome.url,
        outcome.response.status,
        outcome.response.elapsed.as_millis()
    ));
    if outcome.response.body_truncated {
        output::info_line("(response body truncated)");
    }
    Ok(())
}

pub async fn cache_clear(ctx: &AppContext) -> Result<(), CliError> {
    ctx.template_service().clear_cache().await?;
    output::success_line("cleared the template index cache");
    Ok(())
}

pub async fn clean(ctx: &AppContext, force: bool) -> Result<(), CliError> {
    if !force {
        let confirmed = Confirm::new()
            .with_prompt("Delete every downloaded template?")
            .default(false)
            .interact()
            .unwrap_or(false);
        if !confirmed {
            output::info_line("aborted");
            return Ok(());
        }
    }

    let cancel = CancellationToken::new();
    let removed = ctx.template_service().clean_local(&cancel).await?;
    output::success_line(&format!("removed {removed} downloaded templates"));
    Ok(())
}
