//! 贡献分计算
//!
//! 纯函数，无状态。权重为产品约定，修改前需同步运营规则：
//! - 工单：优先级倍数 p0=50 / p1=10 / p2=5 / p3=2，名义基数 10
//! - 主播：直播小时*5 + 平均在线*3 + 有效弹幕*0.2 + 收到打赏*1 + 精选帖*5
//! - 观众：打赏*5 + min(观看小时, 4)*1 + 有效弹幕*0.2 + 精选帖*5
//! - 交易：手续费*10 + 持仓小时*0.1 + 有效开仓奖励 5

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::entities::TicketPriority;
use crate::error::{AppError, AppResult};

const TICKET_NOMINAL_BASE: i64 = 10;
const SCORE_SCALE: u32 = 4;
const AUDIENCE_WATCH_HOURS_CAP: i64 = 4;
const VALID_OPEN_BONUS: i64 = 5;

pub fn priority_multiplier(priority: TicketPriority) -> i64 {
    match priority {
        TicketPriority::P0 => 50,
        TicketPriority::P1 => 10,
        TicketPriority::P2 => 5,
        TicketPriority::P3 => 2,
    }
}

/// 工单默认基础分：p0=500, p1=100, p2=50, p3=20
pub fn ticket_base_score(priority: TicketPriority) -> i64 {
    TICKET_NOMINAL_BASE * priority_multiplier(priority)
}

#[derive(Debug, Clone)]
pub struct CreatorFacts {
    pub duration_minutes: i64,
    pub avg_ccu: i64,
    pub valid_chat_count: i64,
    pub received_tip_fee: Decimal,
    pub featured_post_count: i64,
}

#[derive(Debug, Clone)]
pub struct AudienceFacts {
    pub tip_fee: Decimal,
    pub watch_minutes: i64,
    pub valid_chat_count: i64,
    pub featured_post_count: i64,
}

#[derive(Debug, Clone)]
pub struct TradeFacts {
    pub fee_amount: Decimal,
    pub holding_duration_hours: Decimal,
    pub is_valid_open: bool,
}

fn minutes_to_hours(minutes: i64) -> Decimal {
    Decimal::from(minutes) / Decimal::from(60)
}

fn chat_weight() -> Decimal {
    Decimal::new(2, 1)
}

/// 加权求和后保留 4 位小数；任何一步溢出都视为非法输入
fn weighted_sum(terms: &[(Decimal, Decimal)]) -> AppResult<Decimal> {
    terms
        .iter()
        .try_fold(Decimal::ZERO, |acc, &(value, weight)| {
            value.checked_mul(weight).and_then(|term| acc.checked_add(term))
        })
        .map(|score| {
            score
                .round_dp_with_strategy(SCORE_SCALE, RoundingStrategy::MidpointAwayFromZero)
                .normalize()
        })
        .ok_or_else(|| AppError::ValidationError("Activity values are too large to score".into()))
}

pub fn creator_score(facts: &CreatorFacts) -> AppResult<Decimal> {
    weighted_sum(&[
        (minutes_to_hours(facts.duration_minutes), Decimal::from(5)),
        (Decimal::from(facts.avg_ccu), Decimal::from(3)),
        (Decimal::from(facts.valid_chat_count), chat_weight()),
        (facts.received_tip_fee, Decimal::ONE),
        (Decimal::from(facts.featured_post_count), Decimal::from(5)),
    ])
}

pub fn audience_score(facts: &AudienceFacts) -> AppResult<Decimal> {
    let watch_hours = minutes_to_hours(facts.watch_minutes).min(Decimal::from(AUDIENCE_WATCH_HOURS_CAP));
    weighted_sum(&[
        (facts.tip_fee, Decimal::from(5)),
        (watch_hours, Decimal::ONE),
        (Decimal::from(facts.valid_chat_count), chat_weight()),
        (Decimal::from(facts.featured_post_count), Decimal::from(5)),
    ])
}

/// 交易分（手续费加权 x10 为唯一口径）
pub fn trade_score(facts: &TradeFacts) -> AppResult<Decimal> {
    let bonus = if facts.is_valid_open {
        Decimal::from(VALID_OPEN_BONUS)
    } else {
        Decimal::ZERO
    };
    weighted_sum(&[
        (facts.fee_amount, Decimal::from(10)),
        (facts.holding_duration_hours, Decimal::new(1, 1)),
        (bonus, Decimal::ONE),
    ])
}

/// 分数转积分：四舍五入（远离零）到整数，超出 i64 范围拒绝
pub fn score_to_points(score: Decimal) -> AppResult<i64> {
    score
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| AppError::ValidationError(format!("Score {score} exceeds the points range")))
}
