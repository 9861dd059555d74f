//! `init`: writes a default config.toml to the resolved config path.

use crate::errors::CliError;
use crate::output;

pub async fn run(config_flag: Option<String>, force: bool) -> Result<(), CliError> {
    let home = webhook_config::real_home_dir();
    let path = match (&config_flag, &home) {
        (Some(path), _) => std::path::PathBuf::from(path),
        (None, Some(home)) => home.join(".better-webhook").join("config.toml"),
        (None, None) => {
            return Err(CliError::Other(anyhow::anyhow!(
                "could not determine the home directory; pass --config explicitly"
            )))
        }
    };

    if path.exists() && !force {
        return Err(CliError::Other(anyhow::anyhow!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| CliError::Other(anyhow::anyhow!(err)))?;
    }
    std::fs::write(&path, webhook_config::default_config_toml())
        .map_err(|err| CliError::Other(anyhow::anyhow!(err)))?;

    output::success_line(&format!("wrote {}", path.display()));
    Ok(())
}
