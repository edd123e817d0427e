use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{TicketPriority, TicketStatus, TicketType, ticket_entity as tickets};
use crate::models::PointsRecordResponse;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SubmitTicketRequest {
    pub user_id: i64,
    pub ticket_type: TicketType,
    pub title: String,
    pub content: String,
    pub priority: TicketPriority,
}

/// 审核工单。status 只能是 approved / rejected
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ReviewTicketRequest {
    pub priority: TicketPriority,
    /// 最终给分，缺省为优先级默认分
    pub final_score: Option<i64>,
    pub status: TicketStatus,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TicketResponse {
    pub id: i64,
    pub user_id: i64,
    pub ticket_type: TicketType,
    pub title: String,
    pub content: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub base_score: i64,
    pub final_score: Option<i64>,
    pub review_note: Option<String>,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<tickets::Model> for TicketResponse {
    fn from(m: tickets::Model) -> Self {
        TicketResponse {
            id: m.id,
            user_id: m.user_id,
            ticket_type: m.ticket_type,
            title: m.title,
            content: m.content,
            priority: m.priority,
            status: m.status,
            base_score: m.base_score,
            final_score: m.final_score,
            review_note: m.review_note,
            reviewed_by: m.reviewed_by,
            reviewed_at: m.reviewed_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewTicketResponse {
    pub ticket: TicketResponse,
    /// 审核通过时写入的创世池流水
    pub points_record: Option<PointsRecordResponse>,
}
