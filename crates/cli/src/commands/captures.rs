//! `captures list|delete|replay`.

use std::time::Duration;

use colored::Colorize;
use dialoguer::Confirm;
use tokio_util::sync::CancellationToken;
use webhook_replay::{ReplayOverrides, ReplayRequest};

use crate::cli::{parse_header_flag, OutputFormat};
use crate::context::AppContext;
use crate::errors::CliError;
use crate::output;

pub async fn list(
    ctx: &AppContext,
    limit: usize,
    provider: Option<String>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let cancel = CancellationToken::new();
    let mut captures = ctx.capture_store().list(Some(limit), &cancel).await?;
    if let Some(provider) = &provider {
        captures.retain(|c| c.record.provider.eq_ignore_ascii_case(provider));
    }

    match format {
        OutputFormat::Json => {
            let records: Vec<_> = captures.iter().map(|c| &c.record).collect();
            println!("{}", serde_json::to_string_pretty(&records).unwrap());
        }
        OutputFormat::Text => {
            if captures.is_empty() {
                output::info_line("no captures stored yet");
            } else {
                println!("{}", output::captures_table(&captures));
            }
        }
    }
    Ok(())
}

pub async fn delete(ctx: &AppContext, selector: String, force: bool) -> Result<(), CliError> {
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete capture {selector:?}?"))
            .default(false)
            .interact()
            .unwrap_or(false);
        if !confirmed {
            output::info_line("aborted");
            return Ok(());
        }
    }

    let cancel = CancellationToken::new();
    let id = ctx
        .capture_store()
        .delete_by_id_or_prefix(&selector, &cancel)
        .await?;
    output::success_line(&format!("deleted capture {id}"));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn replay(
    ctx: &AppContext,
    selector: String,
    target_url: Option<String>,
    base_url: Option<String>,
    method: Option<String>,
    headers: Vec<String>,
    timeout: u64,
) -> Result<(), CliError> {
    let header_overrides = headers
        .iter()
        .map(|raw| parse_header_flag(raw).map_err(CliError::Other))
        .collect::<Result<Vec<_>, _>>()?;

    let replay_service = ctx.replay_service(Duration::from_secs(timeout))?;
    let request = ReplayRequest {
        selector,
        target_url,
        base_url,
        overrides: ReplayOverrides {
            method,
            headers: header_overrides,
            body: None,
        },
    };

    let outcome = replay_service.replay(&request, &CancellationToken::new()).await?;

    let status_color = if outcome.response.status < 400 {
        outcome.response.status.to_string().green()
    } else {
        outcome.response.status.to_string().red()
    };
    output::info_line(&format!(
        "{} {} -> {status_color} ({} ms)",
        outcome.method,
        outcome.url,
        outcome.response.elapsed.as_millis()
    ));
    if outcome.response.body_truncated {
        output::info_line("(response body truncated)");
    }
    Ok(())
}
