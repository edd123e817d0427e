use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use super::ActivityStatus;

/// 直播场次。received_tip_fee / score 为十进制字符串
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "live_streams")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub duration_minutes: i64,
    pub avg_ccu: i64,
    pub valid_chat_count: i64,
    pub received_tip_fee: String,
    pub featured_post_count: i64,
    pub score: String,
    pub status: ActivityStatus,
    pub freeze_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
