use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

use crate::entities::{WeeklyRuleStatus, weekly_rule_entity as rules};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateWeeklyRuleRequest {
    pub stage_id: i64,
    /// 周内任意一天，服务端归一到周一 ~ 周日
    #[schema(value_type = String, format = Date, example = "2026-01-14")]
    pub selected_date: NaiveDate,
    pub weekly_points_target: i64,
    /// 十进制字符串，如 "40"、"33.34"
    pub p_genesis_percent: String,
    pub p_eco_percent: String,
    pub p_trade_percent: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WeeklyRuleResponse {
    pub id: i64,
    pub stage_id: i64,
    pub week_number: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub weekly_points_target: i64,
    pub p_genesis_percent: String,
    pub p_eco_percent: String,
    pub p_trade_percent: String,
    pub status: WeeklyRuleStatus,
    pub actual_released: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<rules::Model> for WeeklyRuleResponse {
    fn from(m: rules::Model) -> Self {
        WeeklyRuleResponse {
            id: m.id,
            stage_id: m.stage_id,
            week_number: m.week_number,
            start_date: m.start_date,
            end_date: m.end_date,
            weekly_points_target: m.weekly_points_target,
            p_genesis_percent: m.p_genesis_percent,
            p_eco_percent: m.p_eco_percent,
            p_trade_percent: m.p_trade_percent,
            status: m.status,
            actual_released: m.actual_released,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// 周释放完成度；各池目标 = 周目标 * 比例 / 100
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WeeklyRuleProgressResponse {
    pub rule_id: i64,
    pub actual_released: i64,
    pub weekly_points_target: i64,
    /// 完成率（百分比，两位小数，可超过 100）
    pub completion_rate: String,
    pub genesis_target: String,
    pub eco_target: String,
    pub trade_target: String,
}

impl From<&rules::Model> for WeeklyRuleProgressResponse {
    fn from(m: &rules::Model) -> Self {
        let hundred = Decimal::from(100);
        let target = Decimal::from(m.weekly_points_target);
        let completion = if m.weekly_points_target > 0 {
            Decimal::from(m.actual_released) * hundred / target
        } else {
            Decimal::ZERO
        };
        // 入库前已校验为合法小数
        let pool_target = |pct: &str| {
            let pct = Decimal::from_str(pct).unwrap_or_default();
            (target * pct / hundred).round_dp(2).normalize().to_string()
        };
        WeeklyRuleProgressResponse {
            rule_id: m.id,
            actual_released: m.actual_released,
            weekly_points_target: m.weekly_points_target,
            completion_rate: completion.round_dp(2).normalize().to_string(),
            genesis_target: pool_target(&m.p_genesis_percent),
            eco_target: pool_target(&m.p_eco_percent),
            trade_target: pool_target(&m.p_trade_percent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_targets() {
        let now = Utc::now();
        let rule = rules::Model {
            id: 7,
            stage_id: 1,
            week_number: 1,
            start_date: now,
            end_date: now,
            weekly_points_target: 100_000,
            p_genesis_percent: "40".into(),
            p_eco_percent: "40".into(),
            p_trade_percent: "20".into(),
            status: WeeklyRuleStatus::Active,
            actual_released: 25_000,
            created_at: now,
            updated_at: now,
        };
        let progress = WeeklyRuleProgressResponse::from(&rule);
        assert_eq!(progress.completion_rate, "25");
        assert_eq!(progress.genesis_target, "40000");
        assert_eq!(progress.eco_target, "40000");
        assert_eq!(progress.trade_target, "20000");
    }
}
