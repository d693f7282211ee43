use crate::cmd::ClientArgs;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(flatten)]
    client: ClientArgs,
}

pub async fn run(args: StatsArgs) -> Result<()> {
    let client = args.client.client()?;
    let stats = client.get_stats().await?;

    println!("total problems: {}", stats.total_problems);
    for (difficulty, count) in stats.difficulties.iter() {
        println!("  {:<10} {}", difficulty, count);
    }
    if !stats.top_tags.is_empty() {
        println!("top tags:");
        for tag in stats.top_tags.iter() {
            println!("  {:<24} {}", tag.tag, tag.count);
        }
    }

    Ok(())
}
