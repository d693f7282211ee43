use sqlx::migrate::Migrator;

/// Schema of the `problems` table, embedded from `migrations/`.
pub static MIGRATOR: Migrator = sqlx::migrate!();
