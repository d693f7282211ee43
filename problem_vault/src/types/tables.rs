use sqlx::FromRow;

/// Row of the per-difficulty aggregation.
#[derive(Debug, FromRow)]
pub struct DifficultyCount {
    pub difficulty: String,
    pub count: i64,
}

/// Row of the tag frequency aggregation.
#[derive(Debug, FromRow)]
pub struct TagCountRow {
    pub tag: String,
    pub count: i64,
}
