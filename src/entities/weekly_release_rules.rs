use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum WeeklyRuleStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "paused")]
    Paused,
    #[sea_orm(string_value = "ended")]
    Ended,
}

impl WeeklyRuleStatus {
    /// 创建时根据周起始时间决定初始状态；之后不会随时间自动切换
    pub fn initial(start_date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if start_date > now {
            WeeklyRuleStatus::Pending
        } else {
            WeeklyRuleStatus::Active
        }
    }

    pub fn can_pause(self) -> bool {
        matches!(self, WeeklyRuleStatus::Pending | WeeklyRuleStatus::Active)
    }

    pub fn can_resume(self) -> bool {
        self == WeeklyRuleStatus::Paused
    }

    pub fn can_end(self) -> bool {
        self != WeeklyRuleStatus::Ended
    }
}

impl std::fmt::Display for WeeklyRuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeeklyRuleStatus::Pending => write!(f, "pending"),
            WeeklyRuleStatus::Active => write!(f, "active"),
            WeeklyRuleStatus::Paused => write!(f, "paused"),
            WeeklyRuleStatus::Ended => write!(f, "ended"),
        }
    }
}

/// 自然周释放规则
/// - start_date: 周一 00:00:00.000 UTC，end_date: 周日 23:59:59.999 UTC
/// - p_*_percent: 三个池子的分配比例（十进制字符串），之和恰为 100
/// - actual_released: 实际释放量，仅用于完成率统计，不设上限
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "weekly_release_rules")]
pub struct Model {
    #[sea_orm(primary_key)]
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

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_initial_status() {
        let now = Utc.with_ymd_and_hms(2026, 1, 14, 12, 0, 0).unwrap();
        let past = Utc.with_ymd_and_hms(2026, 1, 12, 0, 0, 0).unwrap();
        let future = Utc.with_ymd_and_hms(2026, 1, 19, 0, 0, 0).unwrap();
        assert_eq!(WeeklyRuleStatus::initial(past, now), WeeklyRuleStatus::Active);
        assert_eq!(WeeklyRuleStatus::initial(future, now), WeeklyRuleStatus::Pending);
        assert_eq!(WeeklyRuleStatus::initial(now, now), WeeklyRuleStatus::Active);
    }

    #[test]
    fn test_rule_transitions() {
        use WeeklyRuleStatus::*;
        assert!(Pending.can_pause());
        assert!(Active.can_pause());
        assert!(!Paused.can_pause());
        assert!(!Ended.can_pause());
        assert!(Paused.can_resume());
        assert!(!Active.can_resume());
        assert!(!Ended.can_resume());
        assert!(Paused.can_end());
        assert!(!Ended.can_end());
    }
}
