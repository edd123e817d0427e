//! 测试辅助：内存 SQLite + 生产迁移

use chrono::{TimeZone, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

use crate::entities::user_entity as users;
use crate::error::AppResult;
use crate::models::CreateStageRequest;

/// 内存库只能有一个连接，否则每个连接各自是一份空库
pub async fn setup_test_db() -> AppResult<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn create_test_user(db: &DatabaseConnection, username: &str) -> AppResult<users::Model> {
    insert_user(db, username, false).await
}

pub async fn create_blacklisted_user(
    db: &DatabaseConnection,
    username: &str,
) -> AppResult<users::Model> {
    insert_user(db, username, true).await
}

async fn insert_user(
    db: &DatabaseConnection,
    username: &str,
    is_blacklisted: bool,
) -> AppResult<users::Model> {
    let now = Utc::now();
    let user = users::ActiveModel {
        username: Set(username.to_string()),
        trading_volume: Set("0".to_string()),
        streaming_minutes: Set(0),
        watching_minutes: Set(0),
        post_count: Set(0),
        is_blacklisted: Set(is_blacklisted),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(user)
}

/// 阶段 S0：预算 1,000,000，2026-01-13 ~ 2026-04-06
pub fn s0_request() -> CreateStageRequest {
    CreateStageRequest {
        stage_name: "S0".into(),
        total_budget: 1_000_000,
        start_date: Utc.with_ymd_and_hms(2026, 1, 13, 0, 0, 0).unwrap(),
        end_date: Utc.with_ymd_and_hms(2026, 4, 6, 0, 0, 0).unwrap(),
    }
}
