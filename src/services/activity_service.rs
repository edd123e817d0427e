use crate::entities::{
    ActivityStatus, PointsPool, live_stream_entity as streams, trade_record_entity as trades,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    AudienceRecordedResponse, LiveStreamResponse, RecordAudienceRequest, RecordStreamRequest,
    RecordTradeRequest, StreamRecordedResponse, TradeRecordResponse, TradeRecordedResponse,
};
use crate::services::{LedgerService, NewPointsRecord};
use crate::utils::scoring::{
    AudienceFacts, CreatorFacts, TradeFacts, audience_score, creator_score, score_to_points,
    trade_score,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use std::str::FromStr;

const CREATOR_SUB_TYPE: &str = "creator";
const AUDIENCE_SUB_TYPE: &str = "audience";
const TRADE_SUB_TYPE: &str = "trade";

fn parse_amount(field: &str, raw: &str) -> AppResult<Decimal> {
    let value = Decimal::from_str(raw.trim())
        .map_err(|_| AppError::ValidationError(format!("{field} is not a decimal: {raw}")))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AppError::ValidationError(format!(
            "{field} must not be negative"
        )));
    }
    Ok(value)
}

fn non_negative(field: &str, value: i64) -> AppResult<i64> {
    if value < 0 {
        return Err(AppError::ValidationError(format!(
            "{field} must not be negative"
        )));
    }
    Ok(value)
}

/// 直播 / 观众 / 交易原始数据录入与风控冻结
#[derive(Clone)]
pub struct ActivityService {
    pool: DatabaseConnection,
}

impl ActivityService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 录入一场直播：计算主播分，累加直播时长，写入生态池待审流水
    pub async fn record_stream(&self, req: RecordStreamRequest) -> AppResult<StreamRecordedResponse> {
        let facts = CreatorFacts {
            duration_minutes: non_negative("duration_minutes", req.duration_minutes)?,
            avg_ccu: non_negative("avg_ccu", req.avg_ccu)?,
            valid_chat_count: non_negative("valid_chat_count", req.valid_chat_count)?,
            received_tip_fee: parse_amount("received_tip_fee", &req.received_tip_fee)?,
            featured_post_count: non_negative("featured_post_count", req.featured_post_count)?,
        };
        let score = creator_score(&facts)?;
        let points = score_to_points(score)?;

        let txn = self.pool.begin().await?;
        LedgerService::find_grantable_user_in(&txn, req.user_id).await?;

        let now = Utc::now();
        let stream = streams::ActiveModel {
            user_id: Set(req.user_id),
            duration_minutes: Set(facts.duration_minutes),
            avg_ccu: Set(facts.avg_ccu),
            valid_chat_count: Set(facts.valid_chat_count),
            received_tip_fee: Set(facts.received_tip_fee.normalize().to_string()),
            featured_post_count: Set(facts.featured_post_count),
            score: Set(score.to_string()),
            status: Set(ActivityStatus::Normal),
            freeze_reason: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        users::Entity::update_many()
            .col_expr(
                users::Column::StreamingMinutes,
                Expr::col(users::Column::StreamingMinutes).add(facts.duration_minutes),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(req.user_id))
            .exec(&txn)
            .await?;

        let record = LedgerService::grant_in(
            &txn,
            NewPointsRecord {
                user_id: req.user_id,
                pool: PointsPool::Eco,
                sub_type: CREATOR_SUB_TYPE.to_string(),
                amount: points,
                related_id: Some(stream.id),
                reason: None,
                approved_by: None,
            },
        )
        .await?;

        txn.commit().await?;

        log::info!(
            "Stream recorded: id={} user={} score={score}",
            stream.id,
            stream.user_id
        );
        Ok(StreamRecordedResponse {
            stream: stream.into(),
            points_record: record.into(),
        })
    }

    /// 录入观众在某场直播中的行为：直播须为 normal 状态
    pub async fn record_audience(
        &self,
        stream_id: i64,
        req: RecordAudienceRequest,
    ) -> AppResult<AudienceRecordedResponse> {
        let facts = AudienceFacts {
            tip_fee: parse_amount("tip_fee", &req.tip_fee)?,
            watch_minutes: non_negative("watch_minutes", req.watch_minutes)?,
            valid_chat_count: non_negative("valid_chat_count", req.valid_chat_count)?,
            featured_post_count: non_negative("featured_post_count", req.featured_post_count)?,
        };
        let score = audience_score(&facts)?;
        let points = score_to_points(score)?;

        let txn = self.pool.begin().await?;
        let stream = Self::find_stream_in(&txn, stream_id).await?;
        if !stream.status.counts_toward_settlement() {
            return Err(AppError::InvalidState(format!(
                "Stream {stream_id} is {}",
                stream.status
            )));
        }
        LedgerService::find_grantable_user_in(&txn, req.user_id).await?;

        let now = Utc::now();
        users::Entity::update_many()
            .col_expr(
                users::Column::WatchingMinutes,
                Expr::col(users::Column::WatchingMinutes).add(facts.watch_minutes),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(req.user_id))
            .exec(&txn)
            .await?;

        let record = LedgerService::grant_in(
            &txn,
            NewPointsRecord {
                user_id: req.user_id,
                pool: PointsPool::Eco,
                sub_type: AUDIENCE_SUB_TYPE.to_string(),
                amount: points,
                related_id: Some(stream_id),
                reason: None,
                approved_by: None,
            },
        )
        .await?;

        txn.commit().await?;

        log::info!(
            "Audience recorded: stream={stream_id} user={} score={score}",
            req.user_id
        );
        Ok(AudienceRecordedResponse {
            stream_id,
            score: score.to_string(),
            points_record: record.into(),
        })
    }

    /// 录入交易：计算交易分，累加交易量，写入交易池待审流水
    pub async fn record_trade(&self, req: RecordTradeRequest) -> AppResult<TradeRecordedResponse> {
        let volume = parse_amount("volume", &req.volume)?;
        let facts = TradeFacts {
            fee_amount: parse_amount("fee_amount", &req.fee_amount)?,
            holding_duration_hours: parse_amount(
                "holding_duration_hours",
                &req.holding_duration_hours,
            )?,
            is_valid_open: req.is_valid_open,
        };
        let order_count = non_negative("order_count", req.order_count)?;
        let score = trade_score(&facts)?;
        let points = score_to_points(score)?;

        let txn = self.pool.begin().await?;
        let user = LedgerService::find_grantable_user_in(&txn, req.user_id).await?;

        let now = Utc::now();
        let trade = trades::ActiveModel {
            user_id: Set(req.user_id),
            volume: Set(volume.normalize().to_string()),
            fee_amount: Set(facts.fee_amount.normalize().to_string()),
            holding_duration_hours: Set(facts.holding_duration_hours.normalize().to_string()),
            order_count: Set(order_count),
            is_valid_open: Set(facts.is_valid_open),
            score: Set(score.to_string()),
            status: Set(ActivityStatus::Normal),
            freeze_reason: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // 交易量为十进制字符串，以旧值为条件更新，避免并发丢失
        let current = Decimal::from_str(&user.trading_volume).map_err(|_| {
            AppError::InternalError(format!(
                "User {} has malformed trading volume {}",
                user.id, user.trading_volume
            ))
        })?;
        let total_volume = current.checked_add(volume).ok_or_else(|| {
            AppError::ValidationError(format!(
                "Trading volume of user {} would overflow",
                user.id
            ))
        })?;
        let result = users::Entity::update_many()
            .col_expr(
                users::Column::TradingVolume,
                Expr::value(total_volume.normalize().to_string()),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(user.id))
            .filter(users::Column::TradingVolume.eq(user.trading_volume.as_str()))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::Conflict(format!(
                "Trading volume of user {} changed concurrently, retry",
                user.id
            )));
        }

        let record = LedgerService::grant_in(
            &txn,
            NewPointsRecord {
                user_id: req.user_id,
                pool: PointsPool::Trade,
                sub_type: TRADE_SUB_TYPE.to_string(),
                amount: points,
                related_id: Some(trade.id),
                reason: None,
                approved_by: None,
            },
        )
        .await?;

        txn.commit().await?;

        log::info!(
            "Trade recorded: id={} user={} score={score}",
            trade.id,
            trade.user_id
        );
        Ok(TradeRecordedResponse {
            trade: trade.into(),
            points_record: record.into(),
        })
    }

    /// 冻结交易：之后结算不再计入，已写入的流水不自动回滚
    pub async fn freeze_trade(&self, trade_id: i64, reason: String) -> AppResult<TradeRecordResponse> {
        let reason = required_reason(reason)?;
        let result = trades::Entity::update_many()
            .col_expr(trades::Column::Status, Expr::value(ActivityStatus::Frozen))
            .col_expr(trades::Column::FreezeReason, Expr::value(reason))
            .col_expr(trades::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(trades::Column::Id.eq(trade_id))
            .filter(trades::Column::Status.ne(ActivityStatus::Frozen))
            .exec(&self.pool)
            .await?;

        let trade = Self::find_trade_in(&self.pool, trade_id).await?;
        if result.rows_affected == 0 {
            return Err(AppError::InvalidState(format!(
                "Trade {trade_id} is already frozen"
            )));
        }
        log::info!("Trade frozen: id={trade_id}");
        Ok(trade.into())
    }

    pub async fn unfreeze_trade(&self, trade_id: i64) -> AppResult<TradeRecordResponse> {
        let result = trades::Entity::update_many()
            .col_expr(trades::Column::Status, Expr::value(ActivityStatus::Normal))
            .col_expr(trades::Column::FreezeReason, Expr::value(Option::<String>::None))
            .col_expr(trades::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(trades::Column::Id.eq(trade_id))
            .filter(trades::Column::Status.eq(ActivityStatus::Frozen))
            .exec(&self.pool)
            .await?;

        let trade = Self::find_trade_in(&self.pool, trade_id).await?;
        if result.rows_affected == 0 {
            return Err(AppError::InvalidState(format!(
                "Trade {trade_id} is {}, not frozen",
                trade.status
            )));
        }
        log::info!("Trade unfrozen: id={trade_id}");
        Ok(trade.into())
    }

    pub async fn freeze_stream(&self, stream_id: i64, reason: String) -> AppResult<LiveStreamResponse> {
        let reason = required_reason(reason)?;
        let result = streams::Entity::update_many()
            .col_expr(streams::Column::Status, Expr::value(ActivityStatus::Frozen))
            .col_expr(streams::Column::FreezeReason, Expr::value(reason))
            .col_expr(streams::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(streams::Column::Id.eq(stream_id))
            .filter(streams::Column::Status.ne(ActivityStatus::Frozen))
            .exec(&self.pool)
            .await?;

        let stream = Self::find_stream_in(&self.pool, stream_id).await?;
        if result.rows_affected == 0 {
            return Err(AppError::InvalidState(format!(
                "Stream {stream_id} is already frozen"
            )));
        }
        log::info!("Stream frozen: id={stream_id}");
        Ok(stream.into())
    }

    pub async fn unfreeze_stream(&self, stream_id: i64) -> AppResult<LiveStreamResponse> {
        let result = streams::Entity::update_many()
            .col_expr(streams::Column::Status, Expr::value(ActivityStatus::Normal))
            .col_expr(streams::Column::FreezeReason, Expr::value(Option::<String>::None))
            .col_expr(streams::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(streams::Column::Id.eq(stream_id))
            .filter(streams::Column::Status.eq(ActivityStatus::Frozen))
            .exec(&self.pool)
            .await?;

        let stream = Self::find_stream_in(&self.pool, stream_id).await?;
        if result.rows_affected == 0 {
            return Err(AppError::InvalidState(format!(
                "Stream {stream_id} is {}, not frozen",
                stream.status
            )));
        }
        log::info!("Stream unfrozen: id={stream_id}");
        Ok(stream.into())
    }

    async fn find_stream_in<C: ConnectionTrait>(
        conn: &C,
        stream_id: i64,
    ) -> AppResult<streams::Model> {
        streams::Entity::find_by_id(stream_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Stream {stream_id} not found")))
    }

    async fn find_trade_in<C: ConnectionTrait>(conn: &C, trade_id: i64) -> AppResult<trades::Model> {
        trades::Entity::find_by_id(trade_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Trade {trade_id} not found")))
    }
}

fn required_reason(reason: String) -> AppResult<String> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::ValidationError("Freeze reason is required".into()));
    }
    Ok(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PointsRecordStatus;
    use crate::test_utils::{create_blacklisted_user, create_test_user, setup_test_db};

    fn stream_request(user_id: i64) -> RecordStreamRequest {
        RecordStreamRequest {
            user_id,
            duration_minutes: 120,
            avg_ccu: 30,
            valid_chat_count: 100,
            received_tip_fee: "12.5".into(),
            featured_post_count: 1,
        }
    }

    fn trade_request(user_id: i64, volume: &str) -> RecordTradeRequest {
        RecordTradeRequest {
            user_id,
            volume: volume.into(),
            fee_amount: "3.2".into(),
            holding_duration_hours: "48".into(),
            order_count: 4,
            is_valid_open: true,
        }
    }

    #[tokio::test]
    async fn test_record_stream_scores_and_accumulates() -> AppResult<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "kim").await?;
        let service = ActivityService::new(db.clone());

        let recorded = service.record_stream(stream_request(user.id)).await?;
        assert_eq!(recorded.stream.score, "137.5");
        assert_eq!(recorded.stream.status, ActivityStatus::Normal);
        assert_eq!(recorded.points_record.pool, PointsPool::Eco);
        assert_eq!(recorded.points_record.sub_type, CREATOR_SUB_TYPE);
        assert_eq!(recorded.points_record.amount, 138);
        assert_eq!(recorded.points_record.status, PointsRecordStatus::Pending);
        assert_eq!(recorded.points_record.related_id, Some(recorded.stream.id));

        let user = LedgerService::find_user_in(&db, user.id).await?;
        assert_eq!(user.streaming_minutes, 120);
        Ok(())
    }

    #[tokio::test]
    async fn test_record_audience_requires_normal_stream() -> AppResult<()> {
        let db = setup_test_db().await?;
        let streamer = create_test_user(&db, "leo").await?;
        let viewer = create_test_user(&db, "mia").await?;
        let service = ActivityService::new(db.clone());

        let stream = service.record_stream(stream_request(streamer.id)).await?.stream;
        let audience = RecordAudienceRequest {
            user_id: viewer.id,
            tip_fee: "1".into(),
            watch_minutes: 600,
            valid_chat_count: 10,
            featured_post_count: 0,
        };

        let recorded = service.record_audience(stream.id, audience.clone()).await?;
        assert_eq!(recorded.score, "11");
        assert_eq!(recorded.points_record.amount, 11);
        assert_eq!(recorded.points_record.sub_type, AUDIENCE_SUB_TYPE);
        assert_eq!(recorded.points_record.related_id, Some(stream.id));
        assert_eq!(LedgerService::find_user_in(&db, viewer.id).await?.watching_minutes, 600);

        service.freeze_stream(stream.id, "view botting".into()).await?;
        let err = service
            .record_audience(stream.id, audience.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let err = service.record_audience(404, audience).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_trade_accumulates_volume() -> AppResult<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "nick").await?;
        let service = ActivityService::new(db.clone());

        let first = service.record_trade(trade_request(user.id, "1000.5")).await?;
        assert_eq!(first.trade.score, "41.8");
        assert_eq!(first.points_record.pool, PointsPool::Trade);
        assert_eq!(first.points_record.amount, 42);
        service.record_trade(trade_request(user.id, "99.5")).await?;

        let user = LedgerService::find_user_in(&db, user.id).await?;
        assert_eq!(user.trading_volume, "1100");
        Ok(())
    }

    #[tokio::test]
    async fn test_ingestion_validation() -> AppResult<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "olga").await?;
        let banned = create_blacklisted_user(&db, "pete").await?;
        let service = ActivityService::new(db.clone());

        let err = service
            .record_trade(RecordTradeRequest {
                fee_amount: "-1".into(),
                ..trade_request(user.id, "10")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = service
            .record_stream(RecordStreamRequest {
                duration_minutes: -5,
                ..stream_request(user.id)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = service
            .record_trade(trade_request(banned.id, "10"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        // 黑名单录入整体回滚，不留下交易记录
        assert!(trades::Entity::find().one(&db).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_oversized_trade_is_rejected_without_writes() -> AppResult<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "ruth").await?;
        let service = ActivityService::new(db.clone());
        let max = Decimal::MAX.to_string();

        let err = service
            .record_trade(RecordTradeRequest {
                fee_amount: max.clone(),
                ..trade_request(user.id, "10")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(trades::Entity::find().one(&db).await?.is_none());

        // 累计交易量溢出
        service.record_trade(trade_request(user.id, &max)).await?;
        let err = service
            .record_trade(trade_request(user.id, "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        use sea_orm::PaginatorTrait;
        assert_eq!(trades::Entity::find().count(&db).await?, 1);
        assert_eq!(LedgerService::find_user_in(&db, user.id).await?.trading_volume, max);
        Ok(())
    }

    #[tokio::test]
    async fn test_trade_freeze_unfreeze_mirror() -> AppResult<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "quinn").await?;
        let service = ActivityService::new(db);
        let trade = service.record_trade(trade_request(user.id, "10")).await?.trade;

        let frozen = service.freeze_trade(trade.id, "wash trading".into()).await?;
        assert_eq!(frozen.status, ActivityStatus::Frozen);
        assert_eq!(frozen.freeze_reason.as_deref(), Some("wash trading"));

        let err = service.freeze_trade(trade.id, "again".into()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let unfrozen = service.unfreeze_trade(trade.id).await?;
        assert_eq!(unfrozen.status, ActivityStatus::Normal);
        assert!(unfrozen.freeze_reason.is_none());

        let err = service.unfreeze_trade(trade.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let err = service.freeze_trade(404, "x".into()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service.freeze_trade(trade.id, "  ".into()).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        Ok(())
    }
}
