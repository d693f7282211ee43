use crate::cmd::ClientArgs;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct PingArgs {
    #[command(flatten)]
    client: ClientArgs,
}

pub async fn run(args: PingArgs) -> Result<()> {
    let client = args.client.client()?;

    match client.test_connection().await {
        Ok(index) => {
            println!("{} {} ({})", index.message, index.version, index.status);
            let count = client.get_problem_count().await?;
            println!("{} problems stored at {}", count, client.config().base_url());
            Ok(())
        }
        Err(e) => {
            println!("{}", e.status_line());
            Err(e.into())
        }
    }
}
