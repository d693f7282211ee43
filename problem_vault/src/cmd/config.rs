use crate::cmd::ConfigFileArgs;
use anyhow::{bail, Result};
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
    #[command(flatten)]
    file: ConfigFileArgs,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the stored configuration.
    Show,
    /// Store the backend base URL and/or the API key.
    Set {
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
    },
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{}{}", visible, "*".repeat(key.chars().count().saturating_sub(4).min(12)))
}

pub async fn run(args: ConfigArgs) -> Result<()> {
    let file = args.file.config_file()?;

    match args.action {
        ConfigAction::Show => {
            let config = file.load()?;
            println!("file:     {}", file.path().display());
            println!("base url: {}", config.base_url());
            println!(
                "api key:  {}",
                config.api_key().map(mask).unwrap_or_else(|| String::from("(not set)"))
            );
        }
        ConfigAction::Set { base_url, api_key } => {
            let api_key = api_key.filter(|key| !key.trim().is_empty());
            if api_key.is_none() && !file.load()?.has_api_key() {
                bail!("API key is required");
            }

            let config = file.store(base_url.as_deref(), api_key.as_deref())?;
            println!("Configuration saved.");
            println!("base url: {}", config.base_url());
        }
    }

    Ok(())
}
