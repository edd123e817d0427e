use crate::entities::{
    StageStatus, WeeklyRuleStatus, stage_budget_entity as stages, weekly_rule_entity as rules,
};
use crate::error::{AppError, AppResult};
use crate::models::{CreateWeeklyRuleRequest, WeeklyRuleProgressResponse, WeeklyRuleResponse};
use crate::services::StageBudgetService;
use crate::utils::{WeekWindow, natural_week, week_number};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use std::str::FromStr;

/// 三个池子的分配比例
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSplit {
    pub genesis: Decimal,
    pub eco: Decimal,
    pub trade: Decimal,
}

impl PoolSplit {
    /// 解析并校验比例：合法小数、非负、之和恰为 100（十进制精确比较）
    pub fn parse(genesis: &str, eco: &str, trade: &str) -> AppResult<Self> {
        fn percent(name: &str, raw: &str) -> AppResult<Decimal> {
            let value = Decimal::from_str(raw.trim()).map_err(|_| {
                AppError::ValidationError(format!("{name} percent is not a decimal: {raw}"))
            })?;
            if value.is_sign_negative() && !value.is_zero() {
                return Err(AppError::ValidationError(format!(
                    "{name} percent must not be negative"
                )));
            }
            Ok(value)
        }

        let split = PoolSplit {
            genesis: percent("Genesis", genesis)?,
            eco: percent("Eco", eco)?,
            trade: percent("Trade", trade)?,
        };
        let sum = split.genesis + split.eco + split.trade;
        if sum != Decimal::from(100) {
            return Err(AppError::ValidationError(format!(
                "Pool percentages must sum to 100, got {sum}"
            )));
        }
        Ok(split)
    }
}

#[derive(Clone)]
pub struct WeeklyRuleService {
    pool: DatabaseConnection,
}

impl WeeklyRuleService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 创建周释放规则
    ///
    /// 1. 所选日期归一到所在自然周（周一 00:00 ~ 周日 23:59:59.999）
    /// 2. 校验比例之和、周目标、阶段状态与时间范围
    /// 3. 同阶段未结束的规则不得与本周重叠（唯一索引兜底并发）
    /// 4. 周起点在未来则为 pending，否则 active
    pub async fn create_rule(&self, req: CreateWeeklyRuleRequest) -> AppResult<WeeklyRuleResponse> {
        PoolSplit::parse(
            &req.p_genesis_percent,
            &req.p_eco_percent,
            &req.p_trade_percent,
        )?;
        if req.weekly_points_target <= 0 {
            return Err(AppError::ValidationError(
                "Weekly points target must be positive".into(),
            ));
        }

        let window = natural_week(req.selected_date);

        let txn = self.pool.begin().await?;

        let stage = StageBudgetService::find_in(&txn, req.stage_id).await?;
        if stage.status == StageStatus::Ended {
            return Err(AppError::InvalidState(format!(
                "Stage {} has ended",
                stage.stage_name
            )));
        }
        if !window.intersects(stage.start_date, stage.end_date) {
            return Err(AppError::ValidationError(format!(
                "Week {} ~ {} is outside stage {}",
                window.start.date_naive(),
                window.end.date_naive(),
                stage.stage_name
            )));
        }
        let week_number = Self::week_number_in_stage(&stage, &window)?;

        let existing = rules::Entity::find()
            .filter(rules::Column::StageId.eq(stage.id))
            .filter(rules::Column::Status.ne(WeeklyRuleStatus::Ended))
            .all(&txn)
            .await?;
        if let Some(clash) = existing
            .iter()
            .find(|r| window.overlaps(r.start_date, r.end_date))
        {
            log::warn!(
                "Week rule overlap: stage={} week_start={} existing_rule={}",
                stage.id,
                window.start,
                clash.id
            );
            return Err(AppError::Conflict(format!(
                "Week {} ~ {} overlaps rule {} (week {})",
                window.start.date_naive(),
                window.end.date_naive(),
                clash.id,
                clash.week_number
            )));
        }

        let now = Utc::now();
        let rule = rules::ActiveModel {
            stage_id: Set(stage.id),
            week_number: Set(week_number),
            start_date: Set(window.start),
            end_date: Set(window.end),
            weekly_points_target: Set(req.weekly_points_target),
            p_genesis_percent: Set(req.p_genesis_percent.trim().to_string()),
            p_eco_percent: Set(req.p_eco_percent.trim().to_string()),
            p_trade_percent: Set(req.p_trade_percent.trim().to_string()),
            status: Set(WeeklyRuleStatus::initial(window.start, now)),
            actual_released: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, "A rule for this week already exists in the stage")
        })?;

        txn.commit().await?;

        log::info!(
            "Week rule created: id={} stage={} week={} status={}",
            rule.id,
            rule.stage_id,
            rule.week_number,
            rule.status
        );
        Ok(rule.into())
    }

    /// pending / active -> paused
    pub async fn pause(&self, rule_id: i64) -> AppResult<WeeklyRuleResponse> {
        self.transition(rule_id, WeeklyRuleStatus::Paused, WeeklyRuleStatus::can_pause)
            .await
    }

    /// paused -> active
    pub async fn resume(&self, rule_id: i64) -> AppResult<WeeklyRuleResponse> {
        self.transition(rule_id, WeeklyRuleStatus::Active, WeeklyRuleStatus::can_resume)
            .await
    }

    /// 任意未结束状态 -> ended
    pub async fn end(&self, rule_id: i64) -> AppResult<WeeklyRuleResponse> {
        self.transition(rule_id, WeeklyRuleStatus::Ended, WeeklyRuleStatus::can_end)
            .await
    }

    /// 累加实际释放量（仅统计用途，不设周上限）
    pub async fn record_release(&self, rule_id: i64, amount: i64) -> AppResult<WeeklyRuleResponse> {
        Self::record_release_in(&self.pool, rule_id, amount).await?;
        let rule = Self::find_in(&self.pool, rule_id).await?;
        Ok(rule.into())
    }

    pub async fn progress(&self, rule_id: i64) -> AppResult<WeeklyRuleProgressResponse> {
        let rule = Self::find_in(&self.pool, rule_id).await?;
        Ok(WeeklyRuleProgressResponse::from(&rule))
    }

    // -----------------------------
    // 内部辅助方法
    // -----------------------------

    fn week_number_in_stage(stage: &stages::Model, window: &WeekWindow) -> AppResult<i32> {
        let number = week_number(stage.start_date, window.start);
        i32::try_from(number)
            .map_err(|_| AppError::ValidationError(format!("Week number {number} out of range")))
    }

    pub(crate) async fn find_in<C: ConnectionTrait>(
        conn: &C,
        rule_id: i64,
    ) -> AppResult<rules::Model> {
        rules::Entity::find_by_id(rule_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Week rule {rule_id} not found")))
    }

    /// 阶段内覆盖某一时刻的未结束规则
    pub(crate) async fn find_covering_in<C: ConnectionTrait>(
        conn: &C,
        stage_id: i64,
        instant: DateTime<Utc>,
    ) -> AppResult<Option<rules::Model>> {
        let candidates = rules::Entity::find()
            .filter(rules::Column::StageId.eq(stage_id))
            .filter(rules::Column::Status.ne(WeeklyRuleStatus::Ended))
            .all(conn)
            .await?;
        Ok(candidates.into_iter().find(|r| {
            WeekWindow {
                start: r.start_date,
                end: r.end_date,
            }
            .contains(instant)
        }))
    }

    pub(crate) async fn record_release_in<C: ConnectionTrait>(
        conn: &C,
        rule_id: i64,
        amount: i64,
    ) -> AppResult<()> {
        if amount < 0 {
            return Err(AppError::ValidationError(
                "Released amount must not be negative".into(),
            ));
        }
        let result = rules::Entity::update_many()
            .col_expr(
                rules::Column::ActualReleased,
                Expr::col(rules::Column::ActualReleased).add(amount),
            )
            .col_expr(rules::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(rules::Column::Id.eq(rule_id))
            .exec(conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Week rule {rule_id} not found")));
        }
        log::info!("Week rule {rule_id} released {amount}");
        Ok(())
    }

    async fn transition(
        &self,
        rule_id: i64,
        next: WeeklyRuleStatus,
        allowed: fn(WeeklyRuleStatus) -> bool,
    ) -> AppResult<WeeklyRuleResponse> {
        let txn = self.pool.begin().await?;
        let rule = Self::find_in(&txn, rule_id).await?;
        if !allowed(rule.status) {
            return Err(AppError::InvalidState(format!(
                "Week rule {rule_id} cannot move from {} to {next}",
                rule.status
            )));
        }

        let result = rules::Entity::update_many()
            .col_expr(rules::Column::Status, Expr::value(next))
            .col_expr(rules::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(rules::Column::Id.eq(rule_id))
            .filter(rules::Column::Status.eq(rule.status))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::InvalidState(format!(
                "Week rule {rule_id} was modified concurrently"
            )));
        }

        let updated = Self::find_in(&txn, rule_id).await?;
        txn.commit().await?;

        log::info!("Week rule {rule_id}: {} -> {next}", rule.status);
        Ok(updated.into())
    }
}
