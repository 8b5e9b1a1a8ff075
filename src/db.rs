use anyhow::{Context, Result};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use tracing::{info, warn};

use crate::auth::password::hash_password;
use crate::config::Config;
use crate::model::role::Role;

pub async fn init_db(config: &Config) -> Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations applied");
    }

    if config.seed_demo_data {
        seed_demo_data(&pool, &config.seed_owner_password).await?;
    }

    Ok(pool)
}

/// Branch "Central", an owner account and three employees on sensors 1-3.
/// Safe to run on every start: existing rows are left alone.
async fn seed_demo_data(pool: &MySqlPool, owner_password: &str) -> Result<()> {
    let mut tx = pool.begin().await?;

    let branch_id: u64 = match sqlx::query_scalar::<_, u64>(
        "SELECT id FROM branches WHERE name = ? ORDER BY id LIMIT 1",
    )
    .bind("Central")
    .fetch_optional(&mut *tx)
    .await?
    {
        Some(id) => id,
        None => sqlx::query("INSERT INTO branches (name) VALUES (?)")
            .bind("Central")
            .execute(&mut *tx)
            .await?
            .last_insert_id(),
    };

    let hashed = hash_password(owner_password)
        .map_err(|e| anyhow::anyhow!("Failed to hash seed password: {e}"))?;

    sqlx::query(
        r#"
        INSERT IGNORE INTO users (name, email, password, role_id, branch_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind("Owner")
    .bind("owner@company.com")
    .bind(hashed)
    .bind(Role::Owner.id())
    .bind(branch_id)
    .execute(&mut *tx)
    .await?;

    for (name, sensor_id) in [("Juan Pérez", 1u32), ("María López", 2), ("Carlos Sánchez", 3)] {
        sqlx::query("INSERT IGNORE INTO employees (name, sensor_id, branch_id) VALUES (?, ?, ?)")
            .bind(name)
            .bind(sensor_id)
            .bind(branch_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    if owner_password == "change-me" {
        warn!("Demo owner account uses the default password, set SEED_OWNER_PASSWORD");
    }
    info!(branch_id, "Demo data seeded");

    Ok(())
}
