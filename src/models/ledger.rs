use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{PointsPool, PointsRecordStatus, points_record_entity as points};
use crate::error::{AppError, AppResult};

/// 手动调整积分（正数补发，负数扣减）
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AdjustPointsRequest {
    pub user_id: i64,
    pub pool: PointsPool,
    pub amount: i64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct RejectPointsRequest {
    pub reason: Option<String>,
}

/// 冻结积分流水：指定 record_id，或指定 (pool, related_id) 冻结来源对象的全部流水
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct FreezePointsRequest {
    pub record_id: Option<i64>,
    pub pool: Option<PointsPool>,
    pub related_id: Option<i64>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeTarget {
    Record(i64),
    Related { pool: PointsPool, related_id: i64 },
}

impl FreezePointsRequest {
    pub fn target(&self) -> AppResult<FreezeTarget> {
        match (self.record_id, self.pool, self.related_id) {
            (Some(id), None, None) => Ok(FreezeTarget::Record(id)),
            (None, Some(pool), Some(related_id)) => Ok(FreezeTarget::Related { pool, related_id }),
            _ => Err(AppError::ValidationError(
                "Specify either record_id, or both pool and related_id".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FreezePointsResponse {
    /// 本次被冻结的流水条数
    pub frozen_count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PointsRecordResponse {
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

impl From<points::Model> for PointsRecordResponse {
    fn from(m: points::Model) -> Self {
        PointsRecordResponse {
            id: m.id,
            user_id: m.user_id,
            pool: m.pool,
            sub_type: m.sub_type,
            amount: m.amount,
            status: m.status,
            related_id: m.related_id,
            reason: m.reason,
            approved_at: m.approved_at,
            approved_by: m.approved_by,
            created_at: m.created_at,
        }
    }
}

/// 用户积分余额（仅统计 approved 流水）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PointsBalanceResponse {
    pub user_id: i64,
    pub genesis: i64,
    pub eco: i64,
    pub trade: i64,
    pub total: i64,
}

impl PointsBalanceResponse {
    pub fn add(&mut self, pool: PointsPool, amount: i64) -> AppResult<()> {
        let user_id = self.user_id;
        let overflow = || AppError::InternalError(format!("Points balance of user {user_id} overflows"));
        let slot = match pool {
            PointsPool::Genesis => &mut self.genesis,
            PointsPool::Eco => &mut self.eco,
            PointsPool::Trade => &mut self.trade,
        };
        *slot = slot.checked_add(amount).ok_or_else(overflow)?;
        self.total = self.total.checked_add(amount).ok_or_else(overflow)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freeze_req(record_id: Option<i64>, pool: Option<PointsPool>, related_id: Option<i64>) -> FreezePointsRequest {
        FreezePointsRequest {
            record_id,
            pool,
            related_id,
            reason: "risk".into(),
        }
    }

    #[test]
    fn test_freeze_target() {
        assert_eq!(
            freeze_req(Some(3), None, None).target().unwrap(),
            FreezeTarget::Record(3)
        );
        assert_eq!(
            freeze_req(None, Some(PointsPool::Trade), Some(9)).target().unwrap(),
            FreezeTarget::Related {
                pool: PointsPool::Trade,
                related_id: 9
            }
        );
        assert!(freeze_req(Some(3), Some(PointsPool::Trade), Some(9)).target().is_err());
        assert!(freeze_req(None, Some(PointsPool::Eco), None).target().is_err());
    }

    #[test]
    fn test_balance_accumulates_per_pool() {
        let mut balance = PointsBalanceResponse {
            user_id: 1,
            ..Default::default()
        };
        balance.add(PointsPool::Genesis, 500).unwrap();
        balance.add(PointsPool::Trade, 42).unwrap();
        balance.add(PointsPool::Genesis, -100).unwrap();
        assert_eq!(balance.genesis, 400);
        assert_eq!(balance.trade, 42);
        assert_eq!(balance.eco, 0);
        assert_eq!(balance.total, 442);
    }

    #[test]
    fn test_balance_overflow_is_an_error() {
        let mut balance = PointsBalanceResponse::default();
        balance.add(PointsPool::Eco, i64::MAX).unwrap();
        assert!(matches!(
            balance.add(PointsPool::Trade, 1),
            Err(AppError::InternalError(_))
        ));
    }
}
