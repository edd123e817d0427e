use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use super::ActivityStatus;

/// 交易记录。金额 / 时长 / 分数均为十进制字符串
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "trade_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub volume: String,
    pub fee_amount: String,
    pub holding_duration_hours: String,
    pub order_count: i64,
    pub is_valid_open: bool,
    pub score: String,
    pub status: ActivityStatus,
    pub freeze_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
