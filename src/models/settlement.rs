use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{SettlementStatus, settlement_entity as settlements};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateSettlementPreviewRequest {
    pub week_number: i32,
    pub year: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct DistributeSettlementRequest {
    /// 实际发放积分，缺省为结算总积分
    pub actual_points: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SettlementResponse {
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
    pub stage_id: Option<i64>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<settlements::Model> for SettlementResponse {
    fn from(m: settlements::Model) -> Self {
        SettlementResponse {
            id: m.id,
            week_number: m.week_number,
            year: m.year,
            start_date: m.start_date,
            end_date: m.end_date,
            total_points: m.total_points,
            genesis_points: m.genesis_points,
            eco_points: m.eco_points,
            trade_points: m.trade_points,
            status: m.status,
            actual_distribution_points: m.actual_distribution_points,
            distributed_at: m.distributed_at,
            stage_id: m.stage_id,
            confirmed_at: m.confirmed_at,
            created_at: m.created_at,
        }
    }
}
