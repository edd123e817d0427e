use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 结算状态只能向前：preview -> confirmed -> distributed
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    #[sea_orm(string_value = "preview")]
    Preview,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "distributed")]
    Distributed,
}

impl SettlementStatus {
    /// 唯一合法的下一状态（不允许跳过或回退）
    pub fn next(self) -> Option<SettlementStatus> {
        match self {
            SettlementStatus::Preview => Some(SettlementStatus::Confirmed),
            SettlementStatus::Confirmed => Some(SettlementStatus::Distributed),
            SettlementStatus::Distributed => None,
        }
    }
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementStatus::Preview => write!(f, "preview"),
            SettlementStatus::Confirmed => write!(f, "confirmed"),
            SettlementStatus::Distributed => write!(f, "distributed"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub week_number: i32,
    pub year: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_points: i64,
    pub genesis_points: i64,
    pub eco_points: i64,
    pub trade_points: i64,
    pub status: SettlementStatus,
    pub actual_distribution_points: Option<i64>,
    pub distributed_at: Option<DateTime<Utc>>,
    /// 发放时扣减预算的阶段
    pub stage_id: Option<i64>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
