use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 用户与累计统计。交易量以十进制字符串保存；积分余额不在此表，由积分流水求和得出
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    pub trading_volume: String,
    pub streaming_minutes: i64,
    pub watching_minutes: i64,
    pub post_count: i64,
    pub is_blacklisted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
