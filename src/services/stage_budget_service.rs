use crate::entities::{StageStatus, stage_budget_entity as stages};
use crate::error::{AppError, AppResult};
use crate::models::{CreateStageRequest, StageResponse, StageUsageResponse};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};

#[derive(Clone)]
pub struct StageBudgetService {
    pool: DatabaseConnection,
}

impl StageBudgetService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 创建阶段。全局同一时间只允许一个 active 阶段，阶段名唯一
    pub async fn create_stage(&self, req: CreateStageRequest) -> AppResult<StageResponse> {
        let stage_name = req.stage_name.trim().to_string();
        if stage_name.is_empty() {
            return Err(AppError::ValidationError("Stage name is required".into()));
        }
        if req.total_budget <= 0 {
            return Err(AppError::ValidationError(
                "Total budget must be positive".into(),
            ));
        }
        if req.end_date <= req.start_date {
            return Err(AppError::ValidationError(
                "Stage end date must be after start date".into(),
            ));
        }

        let txn = self.pool.begin().await?;

        if stages::Entity::find()
            .filter(stages::Column::StageName.eq(stage_name.as_str()))
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Stage {stage_name} already exists"
            )));
        }
        if let Some(active) = Self::find_active_in(&txn).await? {
            return Err(AppError::Conflict(format!(
                "Stage {} is still active; end it before creating a new one",
                active.stage_name
            )));
        }

        let now = Utc::now();
        // 并发创建时由唯一索引兜底
        let stage = stages::ActiveModel {
            stage_name: Set(stage_name.clone()),
            total_budget: Set(req.total_budget),
            used_budget: Set(0),
            start_date: Set(req.start_date),
            end_date: Set(req.end_date),
            status: Set(StageStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, format!("Stage {stage_name} conflicts with an existing stage"))
        })?;

        txn.commit().await?;

        log::info!(
            "Stage created: id={} name={} budget={}",
            stage.id,
            stage.stage_name,
            stage.total_budget
        );
        Ok(stage.into())
    }

    /// 结束阶段（不可恢复）
    pub async fn end_stage(&self, stage_id: i64) -> AppResult<StageResponse> {
        let result = stages::Entity::update_many()
            .col_expr(stages::Column::Status, Expr::value(StageStatus::Ended))
            .col_expr(stages::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(stages::Column::Id.eq(stage_id))
            .filter(stages::Column::Status.eq(StageStatus::Active))
            .exec(&self.pool)
            .await?;

        let stage = Self::find_in(&self.pool, stage_id).await?;
        if result.rows_affected == 0 {
            return Err(AppError::InvalidState(format!(
                "Stage {stage_id} has already ended"
            )));
        }

        log::info!("Stage ended: id={stage_id} used={}", stage.used_budget);
        Ok(stage.into())
    }

    /// 记录预算使用（发放时调用）
    pub async fn record_usage(&self, stage_id: i64, amount: i64) -> AppResult<StageUsageResponse> {
        Self::record_usage_in(&self.pool, stage_id, amount).await?;
        self.usage(stage_id).await
    }

    /// 预算使用情况与预警等级
    pub async fn usage(&self, stage_id: i64) -> AppResult<StageUsageResponse> {
        let stage = Self::find_in(&self.pool, stage_id).await?;
        Ok(StageUsageResponse::from(&stage))
    }

    pub async fn active_stage(&self) -> AppResult<StageResponse> {
        Self::find_active_in(&self.pool)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("No active stage".into()))
    }

    // -----------------------------
    // 事务内复用
    // -----------------------------

    pub(crate) async fn find_in<C: ConnectionTrait>(
        conn: &C,
        stage_id: i64,
    ) -> AppResult<stages::Model> {
        stages::Entity::find_by_id(stage_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Stage {stage_id} not found")))
    }

    pub(crate) async fn find_active_in<C: ConnectionTrait>(
        conn: &C,
    ) -> AppResult<Option<stages::Model>> {
        let stage = stages::Entity::find()
            .filter(stages::Column::Status.eq(StageStatus::Active))
            .one(conn)
            .await?;
        Ok(stage)
    }

    /// 预算硬校验：used_budget + amount <= total_budget 作为更新条件，超出则整体拒绝，不截断
    pub(crate) async fn record_usage_in<C: ConnectionTrait>(
        conn: &C,
        stage_id: i64,
        amount: i64,
    ) -> AppResult<()> {
        if amount < 0 {
            return Err(AppError::ValidationError(
                "Budget usage must not be negative".into(),
            ));
        }

        let result = stages::Entity::update_many()
            .col_expr(
                stages::Column::UsedBudget,
                Expr::col(stages::Column::UsedBudget).add(amount),
            )
            .col_expr(stages::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(stages::Column::Id.eq(stage_id))
            .filter(stages::Column::Status.eq(StageStatus::Active))
            .filter(
                Expr::col(stages::Column::UsedBudget)
                    .lte(Expr::col(stages::Column::TotalBudget).sub(amount)),
            )
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            let stage = Self::find_in(conn, stage_id).await?;
            if stage.status != StageStatus::Active {
                return Err(AppError::InvalidState(format!(
                    "Stage {stage_id} has ended"
                )));
            }
            log::warn!(
                "Budget exceeded: stage={stage_id} requested={amount} remaining={}",
                stage.remaining_budget()
            );
            return Err(AppError::BudgetExceeded(format!(
                "Stage {} has {} points remaining, {amount} requested",
                stage.stage_name,
                stage.remaining_budget()
            )));
        }

        log::info!("Budget used: stage={stage_id} amount={amount}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BudgetWarningLevel;
    use crate::test_utils::{s0_request, setup_test_db};

    #[tokio::test]
    async fn test_single_active_stage() -> AppResult<()> {
        let service = StageBudgetService::new(setup_test_db().await?);

        let s0 = service.create_stage(s0_request()).await?;
        assert_eq!(s0.status, StageStatus::Active);
        assert_eq!(s0.remaining_budget, 1_000_000);

        let err = service
            .create_stage(CreateStageRequest {
                stage_name: "S1".into(),
                ..s0_request()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        service.end_stage(s0.id).await?;

        // 同名阶段即使已结束也冲突
        let err = service.create_stage(s0_request()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let s1 = service
            .create_stage(CreateStageRequest {
                stage_name: "S1".into(),
                ..s0_request()
            })
            .await?;
        assert_eq!(service.active_stage().await?.id, s1.id);
        Ok(())
    }

    fn raw_stage(name: &str, status: StageStatus) -> stages::ActiveModel {
        let req = s0_request();
        let now = Utc::now();
        stages::ActiveModel {
            stage_name: Set(name.to_string()),
            total_budget: Set(req.total_budget),
            used_budget: Set(0),
            start_date: Set(req.start_date),
            end_date: Set(req.end_date),
            status: Set(status),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_single_active_index_rejects_direct_insert() -> AppResult<()> {
        let service = StageBudgetService::new(setup_test_db().await?);
        service.create_stage(s0_request()).await?;

        let err = raw_stage("S1", StageStatus::Active)
            .insert(&service.pool)
            .await
            .map_err(|e| AppError::from_unique_violation(e, "second active stage"))
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // 已结束的阶段不受限制
        let ended = raw_stage("S-1", StageStatus::Ended)
            .insert(&service.pool)
            .await?;
        assert_eq!(ended.status, StageStatus::Ended);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_stage_validation() -> AppResult<()> {
        let service = StageBudgetService::new(setup_test_db().await?);

        let err = service
            .create_stage(CreateStageRequest {
                total_budget: 0,
                ..s0_request()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let req = s0_request();
        let err = service
            .create_stage(CreateStageRequest {
                end_date: req.start_date,
                ..req
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = service
            .create_stage(CreateStageRequest {
                stage_name: "  ".into(),
                ..s0_request()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_end_stage_is_irreversible() -> AppResult<()> {
        let service = StageBudgetService::new(setup_test_db().await?);
        let s0 = service.create_stage(s0_request()).await?;

        let ended = service.end_stage(s0.id).await?;
        assert_eq!(ended.status, StageStatus::Ended);

        let err = service.end_stage(s0.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let err = service.end_stage(404).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service.active_stage().await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service.record_usage(s0.id, 10).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_budget_ceiling_rejects_not_clamps() -> AppResult<()> {
        let service = StageBudgetService::new(setup_test_db().await?);
        let s0 = service.create_stage(s0_request()).await?;

        let usage = service.record_usage(s0.id, 800_000).await?;
        assert_eq!(usage.used_budget, 800_000);
        assert_eq!(usage.warning_level, BudgetWarningLevel::Warning);

        let err = service.record_usage(s0.id, 200_001).await.unwrap_err();
        assert!(matches!(err, AppError::BudgetExceeded(_)));
        assert_eq!(service.usage(s0.id).await?.used_budget, 800_000);

        // 恰好用满
        let usage = service.record_usage(s0.id, 200_000).await?;
        assert_eq!(usage.remaining_budget, 0);
        assert_eq!(usage.usage_rate, "100");
        assert_eq!(usage.warning_level, BudgetWarningLevel::Critical);

        let err = service.record_usage(s0.id, -5).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = service.record_usage(404, 1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        Ok(())
    }
}
