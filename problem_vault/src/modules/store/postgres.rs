use super::{search_terms, Listing, ProblemStore, Result, Upserted, TOP_TAG_COUNT};
use crate::{
    modules::migration::MIGRATOR,
    types::tables::{DifficultyCount, TagCountRow},
};
use async_trait::async_trait;
use itertools::Itertools;
use problem_vault_libs::{
    api::{NewProblem, ProblemListParameter, ProblemRecord, ProblemStats, TagCount},
    FieldList,
};
use sqlx::{postgres::Postgres, FromRow, Pool, QueryBuilder, Row};

/// Record store backed by the `problems` table.
///
/// The `UNIQUE ("url")` constraint together with `INSERT ... ON CONFLICT` keeps one record
/// per URL even under concurrent submissions.
#[derive(Debug, Clone)]
pub struct PgProblemStore {
    pool: Pool<Postgres>,
}

impl PgProblemStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }
}

/// `websearch_to_tsquery` input matching records that contain any of the words.
fn tsquery_input(search: &str) -> Option<String> {
    let terms = search_terms(search);
    if terms.is_empty() {
        None
    } else {
        Some(terms.iter().join(" or "))
    }
}

fn push_filters<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    params: &'a ProblemListParameter,
    tsquery: Option<&'a String>,
) {
    builder.push(r#" WHERE TRUE"#);
    if let Some(difficulty) = params.difficulty() {
        builder.push(r#" AND "difficulty" = "#).push_bind(difficulty);
    }
    let tags = params.tag_list();
    if !tags.is_empty() {
        builder.push(r#" AND "tags" && "#).push_bind(tags);
    }
    if let Some(user_id) = params.user_id() {
        builder.push(r#" AND "user_id" = "#).push_bind(user_id);
    }
    if params.search().is_some() {
        match tsquery {
            Some(tsquery) => {
                builder
                    .push(r#" AND "search_vector" @@ websearch_to_tsquery('english', "#)
                    .push_bind(tsquery)
                    .push(")");
            }
            // A search without any word matches nothing.
            None => {
                builder.push(" AND FALSE");
            }
        }
    }
}

#[async_trait]
impl ProblemStore for PgProblemStore {
    async fn list(&self, params: &ProblemListParameter) -> Result<Listing> {
        let tsquery = params.search().and_then(tsquery_input);

        let mut count_query = QueryBuilder::<Postgres>::new(r#"SELECT COUNT(*) FROM "problems""#);
        push_filters(&mut count_query, params, tsquery.as_ref());
        let (total,): (i64,) = count_query
            .build_query_as()
            .fetch_one(&self.pool)
            .await?;

        let mut select_query = QueryBuilder::<Postgres>::new(format!(
            r#"SELECT {} FROM "problems""#,
            ProblemRecord::field_list()
        ));
        push_filters(&mut select_query, params, tsquery.as_ref());
        match tsquery.as_ref() {
            Some(tsquery) => {
                select_query
                    .push(r#" ORDER BY ts_rank("search_vector", websearch_to_tsquery('english', "#)
                    .push_bind(tsquery)
                    .push(r#")) DESC, "created_at" DESC, "id" DESC"#);
            }
            None => {
                select_query.push(r#" ORDER BY "created_at" DESC, "id" DESC"#);
            }
        }
        select_query
            .push(" LIMIT ")
            .push_bind(params.limit() as i64)
            .push(" OFFSET ")
            .push_bind(params.offset() as i64);

        let problems: Vec<ProblemRecord> = select_query
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        Ok(Listing {
            problems,
            total: total as u64,
        })
    }

    async fn get(&self, id: i64) -> Result<Option<ProblemRecord>> {
        let sql = format!(
            r#"SELECT {} FROM "problems" WHERE "id" = $1"#,
            ProblemRecord::field_list()
        );
        let record = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn upsert(&self, problem: NewProblem) -> Result<Upserted> {
        let sql = format!(
            r#"
            INSERT INTO "problems" (
                "title",
                "url",
                "difficulty",
                "description",
                "solution",
                "test_cases",
                "tags",
                "tags_text",
                "user_id",
                "user_email",
                "created_at",
                "updated_at"
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW())
            ON CONFLICT ("url") DO UPDATE SET
                "title" = EXCLUDED."title",
                "difficulty" = EXCLUDED."difficulty",
                "description" = EXCLUDED."description",
                "solution" = EXCLUDED."solution",
                "test_cases" = EXCLUDED."test_cases",
                "tags" = EXCLUDED."tags",
                "tags_text" = EXCLUDED."tags_text",
                "user_id" = EXCLUDED."user_id",
                "user_email" = EXCLUDED."user_email",
                "created_at" = EXCLUDED."created_at",
                "updated_at" = EXCLUDED."updated_at"
            RETURNING {}, ("xmax" = 0) AS "inserted"
            "#,
            ProblemRecord::field_list()
        );

        let tags_text = problem.tags_text();
        let row = sqlx::query(&sql)
            .bind(&problem.title)
            .bind(&problem.url)
            .bind(&problem.difficulty)
            .bind(&problem.description)
            .bind(&problem.solution)
            .bind(&problem.test_cases)
            .bind(&problem.tags)
            .bind(&tags_text)
            .bind(&problem.user_id)
            .bind(&problem.user_email)
            .fetch_one(&self.pool)
            .await?;

        let inserted: bool = row.try_get("inserted")?;
        let record = ProblemRecord::from_row(&row)?;
        tracing::debug!("upserted problem {} (inserted={})", record.id, inserted);

        Ok(if inserted {
            Upserted::Created(record)
        } else {
            Upserted::Updated(record)
        })
    }

    async fn count(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM "problems""#)
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }

    async fn stats(&self) -> Result<ProblemStats> {
        let total_problems = self.count().await?;

        let difficulties: Vec<DifficultyCount> = sqlx::query_as(
            r#"
            SELECT "difficulty", COUNT(*) AS "count"
            FROM "problems"
            GROUP BY "difficulty"
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let top_tags: Vec<TagCountRow> = sqlx::query_as(
            r#"
            SELECT "tag", COUNT(*) AS "count"
            FROM "problems", UNNEST("tags") AS "tag"
            GROUP BY "tag"
            ORDER BY "count" DESC, "tag" ASC
            LIMIT $1
            "#,
        )
        .bind(TOP_TAG_COUNT as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(ProblemStats {
            total_problems,
            difficulties: difficulties
                .into_iter()
                .map(|row| (row.difficulty, row.count as u64))
                .collect(),
            top_tags: top_tags
                .into_iter()
                .map(|row| TagCount {
                    tag: row.tag,
                    count: row.count as u64,
                })
                .collect(),
        })
    }
}
