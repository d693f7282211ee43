use crate::cmd::ClientArgs;
use anyhow::{Context, Result};
use clap::Args;

#[derive(Debug, Args)]
pub struct ShowArgs {
    id: i64,
    #[command(flatten)]
    client: ClientArgs,
}

pub async fn run(args: ShowArgs) -> Result<()> {
    let client = args.client.client()?;
    let problem = client
        .get_problem(args.id)
        .await
        .with_context(|| format!("failed to fetch problem {}", args.id))?;

    println!("{}", serde_json::to_string_pretty(&problem)?);
    Ok(())
}
