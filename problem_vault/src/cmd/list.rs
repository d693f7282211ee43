use crate::cmd::ClientArgs;
use anyhow::Result;
use clap::Args;
use itertools::Itertools;
use problem_vault_libs::api::ProblemListParameter;

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long)]
    difficulty: Option<String>,
    /// Matches problems having any of the given tags. Repeatable.
    #[arg(long = "tag", value_name = "TAG")]
    tags: Vec<String>,
    #[arg(long)]
    user_id: Option<String>,
    /// Full-text search over title, tags, difficulty, description and solution.
    #[arg(long, short)]
    search: Option<String>,
    #[command(flatten)]
    client: ClientArgs,
}

pub async fn run(args: ListArgs) -> Result<()> {
    let client = args.client.client()?;
    let params = ProblemListParameter {
        page: args.page,
        limit: args.limit,
        difficulty: args.difficulty,
        user_id: args.user_id,
        search: args.search,
        ..Default::default()
    }
    .with_tags(&args.tags);

    let page = client.get_problems(&params).await?;

    if let Some(search_query) = &page.search_query {
        println!("results for \"{}\"", search_query);
    }
    for problem in page.problems.iter() {
        println!(
            "{:>6}  {:<8} {}  [{}]",
            problem.id,
            problem.difficulty,
            problem.title,
            problem.tags.iter().join(", ")
        );
    }
    if let Some(pagination) = page.pagination {
        println!(
            "page {}/{} ({} problems)",
            pagination.page, pagination.pages, pagination.total
        );
    }

    Ok(())
}
