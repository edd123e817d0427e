use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 直播 / 交易原始数据的风控状态；非 normal 的数据在结算时贡献为 0
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    #[sea_orm(string_value = "normal")]
    Normal,
    #[sea_orm(string_value = "frozen")]
    Frozen,
    #[sea_orm(string_value = "suspicious")]
    Suspicious,
}

impl ActivityStatus {
    pub fn counts_toward_settlement(self) -> bool {
        self == ActivityStatus::Normal
    }
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityStatus::Normal => write!(f, "normal"),
            ActivityStatus::Frozen => write!(f, "frozen"),
            ActivityStatus::Suspicious => write!(f, "suspicious"),
        }
    }
}
