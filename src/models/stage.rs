use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{StageStatus, stage_budget_entity as stage};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateStageRequest {
    /// 阶段名称（唯一），如 "S0"
    pub stage_name: String,
    /// 阶段积分总预算
    pub total_budget: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StageResponse {
    pub id: i64,
    pub stage_name: String,
    pub total_budget: i64,
    pub used_budget: i64,
    pub remaining_budget: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: StageStatus,
    pub created_at: DateTime<Utc>,
}

impl From<stage::Model> for StageResponse {
    fn from(m: stage::Model) -> Self {
        StageResponse {
            id: m.id,
            remaining_budget: m.remaining_budget(),
            stage_name: m.stage_name,
            total_budget: m.total_budget,
            used_budget: m.used_budget,
            start_date: m.start_date,
            end_date: m.end_date,
            status: m.status,
            created_at: m.created_at,
        }
    }
}

/// 预算预警等级：>= 95% critical，>= 80% warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BudgetWarningLevel {
    Normal,
    Warning,
    Critical,
}

impl BudgetWarningLevel {
    pub fn from_usage_rate(rate: Decimal) -> Self {
        if rate >= Decimal::from(95) {
            BudgetWarningLevel::Critical
        } else if rate >= Decimal::from(80) {
            BudgetWarningLevel::Warning
        } else {
            BudgetWarningLevel::Normal
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StageUsageResponse {
    pub stage_id: i64,
    pub total_budget: i64,
    pub used_budget: i64,
    pub remaining_budget: i64,
    /// 使用率（百分比，两位小数）
    pub usage_rate: String,
    pub warning_level: BudgetWarningLevel,
}

impl From<&stage::Model> for StageUsageResponse {
    fn from(m: &stage::Model) -> Self {
        let rate = if m.total_budget > 0 {
            Decimal::from(m.used_budget) * Decimal::from(100) / Decimal::from(m.total_budget)
        } else {
            Decimal::ZERO
        };
        // 预警判断使用未截断的比例
        let warning_level = BudgetWarningLevel::from_usage_rate(rate);
        StageUsageResponse {
            stage_id: m.id,
            total_budget: m.total_budget,
            used_budget: m.used_budget,
            remaining_budget: m.remaining_budget(),
            usage_rate: rate.round_dp(2).normalize().to_string(),
            warning_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_with(total: i64, used: i64) -> stage::Model {
        let now = Utc::now();
        stage::Model {
            id: 1,
            stage_name: "S0".into(),
            total_budget: total,
            used_budget: used,
            start_date: now,
            end_date: now,
            status: StageStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_usage_levels() {
        let usage = StageUsageResponse::from(&stage_with(1_000_000, 0));
        assert_eq!(usage.warning_level, BudgetWarningLevel::Normal);
        assert_eq!(usage.remaining_budget, 1_000_000);

        let usage = StageUsageResponse::from(&stage_with(1_000_000, 800_000));
        assert_eq!(usage.warning_level, BudgetWarningLevel::Warning);
        assert_eq!(usage.usage_rate, "80");

        let usage = StageUsageResponse::from(&stage_with(1_000_000, 949_999));
        assert_eq!(usage.warning_level, BudgetWarningLevel::Warning);

        let usage = StageUsageResponse::from(&stage_with(1_000_000, 950_000));
        assert_eq!(usage.warning_level, BudgetWarningLevel::Critical);
    }

    #[test]
    fn test_usage_rate_rounded() {
        let usage = StageUsageResponse::from(&stage_with(3, 1));
        assert_eq!(usage.usage_rate, "33.33");
    }
}
