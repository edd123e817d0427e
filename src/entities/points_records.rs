use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PointsPool {
    /// 创世池：工单贡献
    #[sea_orm(string_value = "genesis")]
    Genesis,
    /// 生态池：直播 / 观众
    #[sea_orm(string_value = "eco")]
    Eco,
    /// 交易池
    #[sea_orm(string_value = "trade")]
    Trade,
}

impl std::fmt::Display for PointsPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointsPool::Genesis => write!(f, "genesis"),
            PointsPool::Eco => write!(f, "eco"),
            PointsPool::Trade => write!(f, "trade"),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PointsRecordStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "frozen")]
    Frozen,
}

impl PointsRecordStatus {
    /// 已批准的流水只允许转为 frozen / rejected；rejected 与 frozen 为终态（冻结暂不支持解冻）
    pub fn can_transition_to(self, next: PointsRecordStatus) -> bool {
        use PointsRecordStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Approved, Rejected) | (Pending, Frozen) | (Approved, Frozen)
        )
    }
}

impl std::fmt::Display for PointsRecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointsRecordStatus::Pending => write!(f, "pending"),
            PointsRecordStatus::Approved => write!(f, "approved"),
            PointsRecordStatus::Rejected => write!(f, "rejected"),
            PointsRecordStatus::Frozen => write!(f, "frozen"),
        }
    }
}

/// 积分流水（账本）
/// - related_id: 来源对象 ID（工单 / 直播 / 交易），与 pool 组合唯一定位来源
/// - approved_by: 审核人或手动调整的操作人
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "points_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub pool: PointsPool,
    pub sub_type: String,
    pub amount: i64,
    pub status: PointsRecordStatus,
    pub related_id: Option<i64>,
    pub reason: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_record_transitions() {
        use PointsRecordStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Frozen));
        assert!(!Approved.can_transition_to(Pending));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Frozen.can_transition_to(Approved));
        assert!(!Frozen.can_transition_to(Frozen));
    }
}
