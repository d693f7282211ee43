use crate::{
    cmd::ClientArgs,
    modules::capture::{
        CaptureAgent, SourceClient, SourceSession, DEFAULT_LANGUAGE, DEFAULT_SOURCE_HOST,
    },
};
use anyhow::{Context, Result};
use clap::Args;
use problem_vault_libs::client::{Outcome, SyncClient, SyncError};
use std::env;

#[derive(Debug, Args)]
pub struct CaptureArgs {
    /// Problem slug or problem page URL.
    target: String,
    /// Print the captured payload instead of submitting it.
    #[arg(long)]
    dry_run: bool,
    /// Language to look for a submission in. Repeat to try several, in order.
    /// Defaults to $CAPTURE_LANGUAGES (comma separated), then java.
    #[arg(long = "language", short = 'l', value_name = "LANG")]
    languages: Vec<String>,
    /// Source site. Defaults to $CAPTURE_HOST, then https://leetcode.com.
    #[arg(long)]
    host: Option<String>,
    #[command(flatten)]
    client: ClientArgs,
}

fn languages(args: &CaptureArgs) -> Vec<String> {
    if !args.languages.is_empty() {
        return args.languages.clone();
    }

    let from_env: Vec<String> = env::var("CAPTURE_LANGUAGES")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|language| !language.is_empty())
        .map(String::from)
        .collect();
    if from_env.is_empty() {
        vec![String::from(DEFAULT_LANGUAGE)]
    } else {
        from_env
    }
}

/// Client for submitting captures. Fails before anything is fetched when no API key is stored.
fn submitting_client(args: &ClientArgs) -> Result<SyncClient> {
    let client = args.client()?;
    if !client.config().has_api_key() {
        let error = SyncError::ApiKeyRequired;
        println!("{}", error.status_line());
        return Err(error).context("run `problem_vault config set --api-key <KEY>` first");
    }

    Ok(client)
}

pub async fn run(args: CaptureArgs) -> Result<()> {
    let client = if args.dry_run {
        None
    } else {
        Some(submitting_client(&args.client)?)
    };

    let host = args
        .host
        .clone()
        .or_else(|| env::var("CAPTURE_HOST").ok())
        .unwrap_or_else(|| String::from(DEFAULT_SOURCE_HOST));
    let source = SourceClient::new(&host, SourceSession::from_env())
        .with_context(|| format!("invalid source host {}", host))?;
    let agent = CaptureAgent::with_languages(source, &languages(&args));

    let payload = agent.capture(&args.target).await.with_context(|| {
        let message = format!("failed to capture {}", args.target);
        tracing::error!(message);
        message
    })?;

    let client = match client {
        Some(client) => client,
        None => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            return Ok(());
        }
    };

    match client.save_problem(&payload.to_submission()).await {
        Ok(saved) => {
            println!("{}", Outcome::Success.status_line());
            println!(
                "#{} {} ({})",
                saved.record.id,
                saved.record.title,
                if saved.created { "created" } else { "updated" }
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", e.status_line());
            Err(e).context("failed to submit the captured problem")
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cmd::ConfigFileArgs;
    use std::process;

    fn client_args(config: &str) -> ClientArgs {
        ClientArgs {
            file: ConfigFileArgs {
                config: Some(env::temp_dir().join(config)),
            },
            backend: Some(String::from("http://127.0.0.1:9")),
        }
    }

    #[test]
    fn capture_without_api_key_stops_before_fetching() {
        let args = client_args(&format!("problem_vault-no-key-{}.json", process::id()));

        let error = submitting_client(&args).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<SyncError>(),
            Some(SyncError::ApiKeyRequired)
        ));
    }
}
