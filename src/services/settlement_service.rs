use crate::entities::{
    ActivityStatus, PointsPool, PointsRecordStatus, SettlementStatus, live_stream_entity as streams,
    points_record_entity as points, settlement_entity as settlements,
    trade_record_entity as trades,
};
use crate::error::{AppError, AppResult};
use crate::models::{CreateSettlementPreviewRequest, SettlementResponse};
use crate::services::{StageBudgetService, WeeklyRuleService};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use std::collections::HashSet;

/// 一周内各池子的汇总积分
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolTotals {
    pub genesis: i64,
    pub eco: i64,
    pub trade: i64,
}

impl PoolTotals {
    pub fn total(&self) -> AppResult<i64> {
        self.genesis
            .checked_add(self.eco)
            .and_then(|sum| sum.checked_add(self.trade))
            .ok_or_else(|| AppError::InternalError("Settlement total overflows".into()))
    }

    fn add(&mut self, pool: PointsPool, amount: i64) -> AppResult<()> {
        let slot = match pool {
            PointsPool::Genesis => &mut self.genesis,
            PointsPool::Eco => &mut self.eco,
            PointsPool::Trade => &mut self.trade,
        };
        *slot = slot
            .checked_add(amount)
            .ok_or_else(|| AppError::InternalError(format!("Settlement {pool} points overflow")))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct SettlementService {
    pool: DatabaseConnection,
}

impl SettlementService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 生成结算预览：汇总区间内 approved 流水，冻结 / 可疑的直播与交易不计入
    pub async fn create_preview(
        &self,
        req: CreateSettlementPreviewRequest,
    ) -> AppResult<SettlementResponse> {
        if req.end_date <= req.start_date {
            return Err(AppError::ValidationError(
                "Settlement end date must be after start date".into(),
            ));
        }
        if !(1..=53).contains(&req.week_number) {
            return Err(AppError::ValidationError(format!(
                "Week number {} out of range",
                req.week_number
            )));
        }

        let settled = settlements::Entity::find()
            .filter(settlements::Column::Year.eq(req.year))
            .filter(settlements::Column::WeekNumber.eq(req.week_number))
            .filter(settlements::Column::Status.ne(SettlementStatus::Preview))
            .one(&self.pool)
            .await?;
        if let Some(existing) = settled {
            return Err(AppError::Conflict(format!(
                "Week {} of {} is already {} (settlement {})",
                req.week_number, req.year, existing.status, existing.id
            )));
        }

        let totals = Self::aggregate(&self.pool, req.start_date, req.end_date).await?;

        let now = Utc::now();
        let settlement = settlements::ActiveModel {
            week_number: Set(req.week_number),
            year: Set(req.year),
            start_date: Set(req.start_date),
            end_date: Set(req.end_date),
            total_points: Set(totals.total()?),
            genesis_points: Set(totals.genesis),
            eco_points: Set(totals.eco),
            trade_points: Set(totals.trade),
            status: Set(SettlementStatus::Preview),
            actual_distribution_points: Set(None),
            distributed_at: Set(None),
            stage_id: Set(None),
            confirmed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Settlement preview: id={} {}-W{} total={}",
            settlement.id,
            settlement.year,
            settlement.week_number,
            settlement.total_points
        );
        Ok(settlement.into())
    }

    /// preview -> confirmed，数值自此冻结不再重算
    ///
    /// 同一 (year, week_number) 只能有一条结算离开 preview，其余预览作废；
    /// 并发确认由部分唯一索引兜底。
    pub async fn confirm(&self, settlement_id: i64) -> AppResult<SettlementResponse> {
        let txn = self.pool.begin().await?;

        let settlement = Self::find_in(&txn, settlement_id).await?;
        if settlement.status.next() != Some(SettlementStatus::Confirmed) {
            return Err(AppError::InvalidState(format!(
                "Settlement {settlement_id} is {}, only previews can be confirmed",
                settlement.status
            )));
        }

        let sibling = settlements::Entity::find()
            .filter(settlements::Column::Year.eq(settlement.year))
            .filter(settlements::Column::WeekNumber.eq(settlement.week_number))
            .filter(settlements::Column::Status.ne(SettlementStatus::Preview))
            .filter(settlements::Column::Id.ne(settlement_id))
            .one(&txn)
            .await?;
        if let Some(existing) = sibling {
            log::warn!(
                "Settlement confirm refused: id={settlement_id} {}-W{} already {} by settlement {}",
                settlement.year,
                settlement.week_number,
                existing.status,
                existing.id
            );
            return Err(AppError::Conflict(format!(
                "Week {} of {} is already {} (settlement {})",
                settlement.week_number, settlement.year, existing.status, existing.id
            )));
        }

        let now = Utc::now();
        let result = settlements::Entity::update_many()
            .col_expr(
                settlements::Column::Status,
                Expr::value(SettlementStatus::Confirmed),
            )
            .col_expr(settlements::Column::ConfirmedAt, Expr::value(now))
            .col_expr(settlements::Column::UpdatedAt, Expr::value(now))
            .filter(settlements::Column::Id.eq(settlement_id))
            .filter(settlements::Column::Status.eq(SettlementStatus::Preview))
            .exec(&txn)
            .await
            .map_err(|e| {
                AppError::from_unique_violation(
                    e,
                    format!(
                        "Week {} of {} was confirmed concurrently",
                        settlement.week_number, settlement.year
                    ),
                )
            })?;
        if result.rows_affected == 0 {
            return Err(AppError::InvalidState(format!(
                "Settlement {settlement_id} was modified concurrently"
            )));
        }

        let confirmed = Self::find_in(&txn, settlement_id).await?;
        txn.commit().await?;

        log::info!("Settlement confirmed: id={settlement_id}");
        Ok(confirmed.into())
    }

    /// 发放
    ///
    /// 同一事务内：
    /// 1. 以 status = confirmed 为条件更新为 distributed（重复发放直接报错）
    /// 2. 扣减当前 active 阶段预算，超出则整体回滚
    /// 3. 累加覆盖结算起点的周规则实际释放量
    pub async fn distribute(
        &self,
        settlement_id: i64,
        actual_points: Option<i64>,
    ) -> AppResult<SettlementResponse> {
        if actual_points.is_some_and(|p| p < 0) {
            return Err(AppError::ValidationError(
                "Actual distribution points must not be negative".into(),
            ));
        }

        let txn = self.pool.begin().await?;

        let settlement = Self::find_in(&txn, settlement_id).await?;
        match settlement.status.next() {
            Some(SettlementStatus::Distributed) => {}
            None => return Err(AppError::AlreadyDistributed(settlement_id)),
            Some(_) => {
                return Err(AppError::InvalidState(format!(
                    "Settlement {settlement_id} must be confirmed before distribution"
                )));
            }
        }

        let stage = StageBudgetService::find_active_in(&txn)
            .await?
            .ok_or_else(|| AppError::InvalidState("No active stage to charge".into()))?;
        let actual = actual_points.unwrap_or(settlement.total_points);

        let now = Utc::now();
        let result = settlements::Entity::update_many()
            .col_expr(
                settlements::Column::Status,
                Expr::value(SettlementStatus::Distributed),
            )
            .col_expr(
                settlements::Column::ActualDistributionPoints,
                Expr::value(actual),
            )
            .col_expr(settlements::Column::DistributedAt, Expr::value(now))
            .col_expr(settlements::Column::StageId, Expr::value(stage.id))
            .col_expr(settlements::Column::UpdatedAt, Expr::value(now))
            .filter(settlements::Column::Id.eq(settlement_id))
            .filter(settlements::Column::Status.eq(SettlementStatus::Confirmed))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::AlreadyDistributed(settlement_id));
        }

        StageBudgetService::record_usage_in(&txn, stage.id, actual).await?;

        if let Some(rule) =
            WeeklyRuleService::find_covering_in(&txn, stage.id, settlement.start_date).await?
        {
            WeeklyRuleService::record_release_in(&txn, rule.id, actual).await?;
        }

        let distributed = Self::find_in(&txn, settlement_id).await?;
        txn.commit().await?;

        log::info!(
            "Settlement distributed: id={settlement_id} points={actual} stage={}",
            stage.id
        );
        Ok(distributed.into())
    }

    // -----------------------------
    // 内部辅助方法
    // -----------------------------

    async fn find_in<C: ConnectionTrait>(
        conn: &C,
        settlement_id: i64,
    ) -> AppResult<settlements::Model> {
        settlements::Entity::find_by_id(settlement_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Settlement {settlement_id} not found")))
    }

    async fn aggregate<C: ConnectionTrait>(
        conn: &C,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<PoolTotals> {
        let records = points::Entity::find()
            .filter(points::Column::Status.eq(PointsRecordStatus::Approved))
            .filter(points::Column::CreatedAt.between(start, end))
            .all(conn)
            .await?;

        let excluded_trades: HashSet<i64> = trades::Entity::find()
            .select_only()
            .column(trades::Column::Id)
            .filter(trades::Column::Status.ne(ActivityStatus::Normal))
            .into_tuple::<i64>()
            .all(conn)
            .await?
            .into_iter()
            .collect();
        let excluded_streams: HashSet<i64> = streams::Entity::find()
            .select_only()
            .column(streams::Column::Id)
            .filter(streams::Column::Status.ne(ActivityStatus::Normal))
            .into_tuple::<i64>()
            .all(conn)
            .await?
            .into_iter()
            .collect();

        let mut totals = PoolTotals::default();
        for record in records {
            let excluded = match (record.pool, record.related_id) {
                (PointsPool::Trade, Some(id)) => excluded_trades.contains(&id),
                (PointsPool::Eco, Some(id)) => excluded_streams.contains(&id),
                _ => false,
            };
            if !excluded {
                totals.add(record.pool, record.amount)?;
            }
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user_entity as users;
    use crate::models::{CreateWeeklyRuleRequest, FreezeTarget};
    use crate::services::{LedgerService, NewPointsRecord};
    use crate::test_utils::{create_test_user, s0_request, setup_test_db};
    use chrono::{NaiveDate, TimeZone};
    use sea_orm::DatabaseConnection;

    struct Fixture {
        db: DatabaseConnection,
        service: SettlementService,
        stages: StageBudgetService,
        rules: WeeklyRuleService,
        stage_id: i64,
        user: users::Model,
    }

    async fn setup() -> AppResult<Fixture> {
        let db = setup_test_db().await?;
        let stages = StageBudgetService::new(db.clone());
        let stage = stages.create_stage(s0_request()).await?;
        let user = create_test_user(&db, "eve").await?;
        Ok(Fixture {
            service: SettlementService::new(db.clone()),
            rules: WeeklyRuleService::new(db.clone()),
            stages,
            stage_id: stage.id,
            user,
            db,
        })
    }

    /// 直接写入指定时间的流水
    async fn insert_record(
        db: &DatabaseConnection,
        user_id: i64,
        pool: PointsPool,
        amount: i64,
        status: PointsRecordStatus,
        related_id: Option<i64>,
        created_at: DateTime<Utc>,
    ) -> AppResult<points::Model> {
        let record = points::ActiveModel {
            user_id: Set(user_id),
            pool: Set(pool),
            sub_type: Set("test".into()),
            amount: Set(amount),
            status: Set(status),
            related_id: Set(related_id),
            reason: Set(None),
            approved_at: Set(None),
            approved_by: Set(None),
            created_at: Set(created_at),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(record)
    }

    async fn insert_trade(
        db: &DatabaseConnection,
        user_id: i64,
        status: ActivityStatus,
    ) -> AppResult<trades::Model> {
        let now = Utc::now();
        let trade = trades::ActiveModel {
            user_id: Set(user_id),
            volume: Set("1000".into()),
            fee_amount: Set("1".into()),
            holding_duration_hours: Set("0".into()),
            order_count: Set(1),
            is_valid_open: Set(false),
            score: Set("10".into()),
            status: Set(status),
            freeze_reason: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(trade)
    }

    fn week3_request() -> CreateSettlementPreviewRequest {
        CreateSettlementPreviewRequest {
            week_number: 3,
            year: 2026,
            start_date: Utc.with_ymd_and_hms(2026, 1, 12, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2026, 1, 18, 23, 59, 59).unwrap(),
        }
    }

    fn midweek() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 14, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_preview_aggregates_approved_normal_activity() -> AppResult<()> {
        let f = setup().await?;
        let uid = f.user.id;
        let normal = insert_trade(&f.db, uid, ActivityStatus::Normal).await?;
        let frozen = insert_trade(&f.db, uid, ActivityStatus::Frozen).await?;

        use PointsRecordStatus::*;
        insert_record(&f.db, uid, PointsPool::Genesis, 500, Approved, Some(1), midweek()).await?;
        insert_record(&f.db, uid, PointsPool::Eco, 80, Approved, None, midweek()).await?;
        insert_record(&f.db, uid, PointsPool::Trade, 40, Approved, Some(normal.id), midweek()).await?;
        // 以下均不计入
        insert_record(&f.db, uid, PointsPool::Trade, 70, Approved, Some(frozen.id), midweek()).await?;
        insert_record(&f.db, uid, PointsPool::Genesis, 100, Pending, None, midweek()).await?;
        insert_record(&f.db, uid, PointsPool::Genesis, 100, Frozen, None, midweek()).await?;
        insert_record(&f.db, uid, PointsPool::Genesis, 100, Rejected, None, midweek()).await?;
        insert_record(
            &f.db,
            uid,
            PointsPool::Genesis,
            999,
            Approved,
            None,
            Utc.with_ymd_and_hms(2026, 1, 20, 12, 0, 0).unwrap(),
        )
        .await?;

        let preview = f.service.create_preview(week3_request()).await?;
        assert_eq!(preview.status, SettlementStatus::Preview);
        assert_eq!(preview.genesis_points, 500);
        assert_eq!(preview.eco_points, 80);
        assert_eq!(preview.trade_points, 40);
        assert_eq!(preview.total_points, 620);
        Ok(())
    }

    #[tokio::test]
    async fn test_frozen_ledger_entries_drop_out_of_preview() -> AppResult<()> {
        let f = setup().await?;
        let uid = f.user.id;
        let record = insert_record(
            &f.db,
            uid,
            PointsPool::Eco,
            300,
            PointsRecordStatus::Approved,
            Some(5),
            midweek(),
        )
        .await?;

        let before = f.service.create_preview(week3_request()).await?;
        assert_eq!(before.eco_points, 300);

        LedgerService::new(f.db.clone())
            .freeze(FreezeTarget::Record(record.id), "abuse".into())
            .await?;
        let after = f.service.create_preview(week3_request()).await?;
        assert_eq!(after.eco_points, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_lifecycle_and_double_distribution() -> AppResult<()> {
        let f = setup().await?;
        let rule = f
            .rules
            .create_rule(CreateWeeklyRuleRequest {
                stage_id: f.stage_id,
                selected_date: NaiveDate::from_ymd_opt(2026, 1, 14).unwrap(),
                weekly_points_target: 100_000,
                p_genesis_percent: "40".into(),
                p_eco_percent: "40".into(),
                p_trade_percent: "20".into(),
            })
            .await?;
        insert_record(
            &f.db,
            f.user.id,
            PointsPool::Genesis,
            5_000,
            PointsRecordStatus::Approved,
            None,
            midweek(),
        )
        .await?;

        let preview = f.service.create_preview(week3_request()).await?;

        // 未确认不可发放
        let err = f.service.distribute(preview.id, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let confirmed = f.service.confirm(preview.id).await?;
        assert_eq!(confirmed.status, SettlementStatus::Confirmed);
        assert!(confirmed.confirmed_at.is_some());
        let err = f.service.confirm(preview.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let distributed = f.service.distribute(preview.id, Some(4_200)).await?;
        assert_eq!(distributed.status, SettlementStatus::Distributed);
        assert_eq!(distributed.actual_distribution_points, Some(4_200));
        assert_eq!(distributed.stage_id, Some(f.stage_id));
        let distributed_at = distributed.distributed_at;
        assert!(distributed_at.is_some());

        let err = f.service.distribute(preview.id, Some(1)).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyDistributed(id) if id == preview.id));

        let reloaded = SettlementService::find_in(&f.db, preview.id).await?;
        assert_eq!(reloaded.actual_distribution_points, Some(4_200));
        assert_eq!(reloaded.distributed_at, distributed_at);

        assert_eq!(f.stages.usage(f.stage_id).await?.used_budget, 4_200);
        assert_eq!(f.rules.progress(rule.id).await?.actual_released, 4_200);

        // 已发放的周不可再生成预览
        let err = f.service.create_preview(week3_request()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_only_one_settlement_per_week_leaves_preview() -> AppResult<()> {
        let f = setup().await?;
        insert_record(
            &f.db,
            f.user.id,
            PointsPool::Genesis,
            1_000,
            PointsRecordStatus::Approved,
            None,
            midweek(),
        )
        .await?;

        let first = f.service.create_preview(week3_request()).await?;
        let second = f.service.create_preview(week3_request()).await?;
        f.service.confirm(first.id).await?;

        let err = f.service.confirm(second.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let err = f.service.distribute(second.id, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        f.service.distribute(first.id, None).await?;
        assert_eq!(f.stages.usage(f.stage_id).await?.used_budget, 1_000);

        // 绕过服务直接改状态，由部分唯一索引拒绝
        let err = settlements::Entity::update_many()
            .col_expr(
                settlements::Column::Status,
                Expr::value(SettlementStatus::Confirmed),
            )
            .filter(settlements::Column::Id.eq(second.id))
            .exec(&f.db)
            .await
            .map_err(|e| AppError::from_unique_violation(e, "week already settled"))
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let reloaded = SettlementService::find_in(&f.db, second.id).await?;
        assert_eq!(reloaded.status, SettlementStatus::Preview);
        Ok(())
    }

    #[test]
    fn test_pool_totals_overflow_is_an_error() {
        let mut totals = PoolTotals::default();
        totals.add(PointsPool::Genesis, i64::MAX).unwrap();
        totals.add(PointsPool::Eco, 1).unwrap();
        assert!(matches!(totals.total(), Err(AppError::InternalError(_))));
        assert!(matches!(
            totals.add(PointsPool::Genesis, 1),
            Err(AppError::InternalError(_))
        ));
    }

    #[tokio::test]
    async fn test_distribution_over_budget_rolls_back() -> AppResult<()> {
        let f = setup().await?;
        insert_record(
            &f.db,
            f.user.id,
            PointsPool::Trade,
            10,
            PointsRecordStatus::Approved,
            None,
            midweek(),
        )
        .await?;
        let preview = f.service.create_preview(week3_request()).await?;
        f.service.confirm(preview.id).await?;

        let err = f
            .service
            .distribute(preview.id, Some(1_000_001))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BudgetExceeded(_)));

        let reloaded = SettlementService::find_in(&f.db, preview.id).await?;
        assert_eq!(reloaded.status, SettlementStatus::Confirmed);
        assert!(reloaded.distributed_at.is_none());
        assert_eq!(f.stages.usage(f.stage_id).await?.used_budget, 0);

        // 缺省按结算总积分发放
        let distributed = f.service.distribute(preview.id, None).await?;
        assert_eq!(distributed.actual_distribution_points, Some(10));
        Ok(())
    }

    #[tokio::test]
    async fn test_distribute_requires_active_stage() -> AppResult<()> {
        let f = setup().await?;
        let preview = f.service.create_preview(week3_request()).await?;
        f.service.confirm(preview.id).await?;
        f.stages.end_stage(f.stage_id).await?;

        let err = f.service.distribute(preview.id, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let err = f.service.distribute(404, None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_preview_validation() -> AppResult<()> {
        let f = setup().await?;
        let req = week3_request();
        let err = f
            .service
            .create_preview(CreateSettlementPreviewRequest {
                end_date: req.start_date,
                ..req.clone()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = f
            .service
            .create_preview(CreateSettlementPreviewRequest {
                week_number: 0,
                ..req
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        Ok(())
    }
}
