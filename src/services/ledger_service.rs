use crate::entities::{
    PointsPool, PointsRecordStatus, points_record_entity as points, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    AdjustPointsRequest, FreezePointsResponse, FreezeTarget, PointsBalanceResponse,
    PointsRecordResponse,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};

const MANUAL_ADJUST_SUB_TYPE: &str = "manual_adjust";

/// 待写入的积分流水
#[derive(Debug, Clone)]
pub struct NewPointsRecord {
    pub user_id: i64,
    pub pool: PointsPool,
    pub sub_type: String,
    pub amount: i64,
    pub related_id: Option<i64>,
    pub reason: Option<String>,
    /// 已审核来源（如工单审核）直接写 approved，否则 pending
    pub approved_by: Option<i64>,
}

#[derive(Clone)]
pub struct LedgerService {
    pool: DatabaseConnection,
}

impl LedgerService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 发放积分（自动来源）
    pub async fn grant(&self, entry: NewPointsRecord) -> AppResult<PointsRecordResponse> {
        let record = Self::grant_in(&self.pool, entry).await?;
        Ok(record.into())
    }

    /// 管理员手动调整：立即生效（approved），正数补发、负数扣减；黑名单用户同样允许
    pub async fn adjust(
        &self,
        req: AdjustPointsRequest,
        actor: i64,
    ) -> AppResult<PointsRecordResponse> {
        if req.amount == 0 {
            return Err(AppError::ValidationError(
                "Adjustment amount must not be zero".into(),
            ));
        }
        let reason = req.reason.trim();
        if reason.is_empty() {
            return Err(AppError::ValidationError(
                "Adjustment reason is required".into(),
            ));
        }

        Self::find_user_in(&self.pool, req.user_id).await?;

        let now = Utc::now();
        let record = points::ActiveModel {
            user_id: Set(req.user_id),
            pool: Set(req.pool),
            sub_type: Set(MANUAL_ADJUST_SUB_TYPE.to_string()),
            amount: Set(req.amount),
            status: Set(PointsRecordStatus::Approved),
            related_id: Set(None),
            reason: Set(Some(reason.to_string())),
            approved_at: Set(Some(now)),
            approved_by: Set(Some(actor)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Points adjusted: record={} user={} pool={} amount={} actor={}",
            record.id,
            record.user_id,
            record.pool,
            record.amount,
            actor
        );
        Ok(record.into())
    }

    /// 审核通过待审流水
    pub async fn approve(&self, record_id: i64, actor: i64) -> AppResult<PointsRecordResponse> {
        let record = self
            .transition(record_id, PointsRecordStatus::Approved, Some(actor), None)
            .await?;
        Ok(record.into())
    }

    /// 驳回流水（pending 或已 approved 的均可驳回）
    pub async fn reject(
        &self,
        record_id: i64,
        actor: i64,
        reason: Option<String>,
    ) -> AppResult<PointsRecordResponse> {
        let record = self
            .transition(record_id, PointsRecordStatus::Rejected, Some(actor), reason)
            .await?;
        Ok(record.into())
    }

    /// 冻结流水：单条，或某个来源对象（pool + related_id）下所有 pending / approved 流水
    pub async fn freeze(
        &self,
        target: FreezeTarget,
        reason: String,
    ) -> AppResult<FreezePointsResponse> {
        let reason = reason.trim().to_string();
        if reason.is_empty() {
            return Err(AppError::ValidationError("Freeze reason is required".into()));
        }

        match target {
            FreezeTarget::Record(id) => {
                self.transition(id, PointsRecordStatus::Frozen, None, Some(reason))
                    .await?;
                Ok(FreezePointsResponse { frozen_count: 1 })
            }
            FreezeTarget::Related { pool, related_id } => {
                let result = points::Entity::update_many()
                    .col_expr(
                        points::Column::Status,
                        Expr::value(PointsRecordStatus::Frozen),
                    )
                    .col_expr(points::Column::Reason, Expr::value(reason))
                    .filter(points::Column::Pool.eq(pool))
                    .filter(points::Column::RelatedId.eq(related_id))
                    .filter(points::Column::Status.is_in([
                        PointsRecordStatus::Pending,
                        PointsRecordStatus::Approved,
                    ]))
                    .exec(&self.pool)
                    .await?;

                log::info!(
                    "Points frozen by source: pool={pool} related_id={related_id} count={}",
                    result.rows_affected
                );
                Ok(FreezePointsResponse {
                    frozen_count: result.rows_affected,
                })
            }
        }
    }

    /// 用户积分余额：仅统计 approved 流水
    pub async fn balance(&self, user_id: i64) -> AppResult<PointsBalanceResponse> {
        Self::find_user_in(&self.pool, user_id).await?;

        let records = points::Entity::find()
            .filter(points::Column::UserId.eq(user_id))
            .filter(points::Column::Status.eq(PointsRecordStatus::Approved))
            .all(&self.pool)
            .await?;

        let mut balance = PointsBalanceResponse {
            user_id,
            ..Default::default()
        };
        for record in records {
            balance.add(record.pool, record.amount)?;
        }
        Ok(balance)
    }

    // -----------------------------
    // 事务内复用
    // -----------------------------

    pub(crate) async fn find_user_in<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
    ) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
    }

    /// 校验用户存在且未被拉黑
    pub(crate) async fn find_grantable_user_in<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
    ) -> AppResult<users::Model> {
        let user = Self::find_user_in(conn, user_id).await?;
        if user.is_blacklisted {
            return Err(AppError::InvalidState(format!(
                "User {user_id} is blacklisted"
            )));
        }
        Ok(user)
    }

    pub(crate) async fn grant_in<C: ConnectionTrait>(
        conn: &C,
        entry: NewPointsRecord,
    ) -> AppResult<points::Model> {
        if entry.amount < 0 {
            return Err(AppError::ValidationError(
                "Granted amount must not be negative".into(),
            ));
        }
        Self::find_grantable_user_in(conn, entry.user_id).await?;

        let now = Utc::now();
        let (status, approved_at) = match entry.approved_by {
            Some(_) => (PointsRecordStatus::Approved, Some(now)),
            None => (PointsRecordStatus::Pending, None),
        };

        let record = points::ActiveModel {
            user_id: Set(entry.user_id),
            pool: Set(entry.pool),
            sub_type: Set(entry.sub_type),
            amount: Set(entry.amount),
            status: Set(status),
            related_id: Set(entry.related_id),
            reason: Set(entry.reason),
            approved_at: Set(approved_at),
            approved_by: Set(entry.approved_by),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        log::info!(
            "Points granted: record={} user={} pool={} sub_type={} amount={} status={}",
            record.id,
            record.user_id,
            record.pool,
            record.sub_type,
            record.amount,
            record.status
        );
        Ok(record)
    }

    /// 状态迁移：先校验迁移合法，再以当前状态为条件更新，防止并发覆盖
    async fn transition(
        &self,
        record_id: i64,
        next: PointsRecordStatus,
        actor: Option<i64>,
        reason: Option<String>,
    ) -> AppResult<points::Model> {
        let txn = self.pool.begin().await?;

        let record = points::Entity::find_by_id(record_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Points record {record_id} not found")))?;

        if !record.status.can_transition_to(next) {
            return Err(AppError::InvalidState(format!(
                "Points record {record_id} cannot move from {} to {next}",
                record.status
            )));
        }

        let mut update = points::Entity::update_many()
            .col_expr(points::Column::Status, Expr::value(next))
            .filter(points::Column::Id.eq(record_id))
            .filter(points::Column::Status.eq(record.status));
        if next == PointsRecordStatus::Approved {
            update = update
                .col_expr(points::Column::ApprovedAt, Expr::value(Utc::now()))
                .col_expr(points::Column::ApprovedBy, Expr::value(actor));
        }
        if let Some(reason) = reason {
            update = update.col_expr(points::Column::Reason, Expr::value(reason));
        }

        let result = update.exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(AppError::InvalidState(format!(
                "Points record {record_id} was modified concurrently"
            )));
        }

        let updated = points::Entity::find_by_id(record_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Points record {record_id} not found")))?;
        txn.commit().await?;

        log::info!(
            "Points record {record_id}: {} -> {next} (actor={actor:?})",
            record.status
        );
        Ok(updated)
    }
}
