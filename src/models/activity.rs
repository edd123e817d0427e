use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{ActivityStatus, live_stream_entity as streams, trade_record_entity as trades};
use crate::models::PointsRecordResponse;

/// 主播直播场次数据。金额字段为十进制字符串
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RecordStreamRequest {
    pub user_id: i64,
    pub duration_minutes: i64,
    pub avg_ccu: i64,
    pub valid_chat_count: i64,
    pub received_tip_fee: String,
    pub featured_post_count: i64,
}

/// 观众在某场直播中的行为数据
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RecordAudienceRequest {
    pub user_id: i64,
    pub tip_fee: String,
    pub watch_minutes: i64,
    pub valid_chat_count: i64,
    pub featured_post_count: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RecordTradeRequest {
    pub user_id: i64,
    pub volume: String,
    pub fee_amount: String,
    pub holding_duration_hours: String,
    pub order_count: i64,
    pub is_valid_open: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LiveStreamResponse {
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
}

impl From<streams::Model> for LiveStreamResponse {
    fn from(m: streams::Model) -> Self {
        LiveStreamResponse {
            id: m.id,
            user_id: m.user_id,
            duration_minutes: m.duration_minutes,
            avg_ccu: m.avg_ccu,
            valid_chat_count: m.valid_chat_count,
            received_tip_fee: m.received_tip_fee,
            featured_post_count: m.featured_post_count,
            score: m.score,
            status: m.status,
            freeze_reason: m.freeze_reason,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TradeRecordResponse {
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
}

impl From<trades::Model> for TradeRecordResponse {
    fn from(m: trades::Model) -> Self {
        TradeRecordResponse {
            id: m.id,
            user_id: m.user_id,
            volume: m.volume,
            fee_amount: m.fee_amount,
            holding_duration_hours: m.holding_duration_hours,
            order_count: m.order_count,
            is_valid_open: m.is_valid_open,
            score: m.score,
            status: m.status,
            freeze_reason: m.freeze_reason,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StreamRecordedResponse {
    pub stream: LiveStreamResponse,
    pub points_record: PointsRecordResponse,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AudienceRecordedResponse {
    pub stream_id: i64,
    pub score: String,
    pub points_record: PointsRecordResponse,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TradeRecordedResponse {
    pub trade: TradeRecordResponse,
    pub points_record: PointsRecordResponse,
}
