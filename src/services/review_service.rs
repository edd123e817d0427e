use crate::entities::{PointsPool, TicketStatus, ticket_entity as tickets};
use crate::error::{AppError, AppResult};
use crate::models::{ReviewTicketRequest, ReviewTicketResponse, SubmitTicketRequest, TicketResponse};
use crate::services::{LedgerService, NewPointsRecord};
use crate::utils::scoring::ticket_base_score;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};

#[derive(Clone)]
pub struct ReviewService {
    pool: DatabaseConnection,
}

impl ReviewService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 提交工单（pending，基础分按优先级）
    pub async fn submit_ticket(&self, req: SubmitTicketRequest) -> AppResult<TicketResponse> {
        let title = req.title.trim();
        if title.is_empty() {
            return Err(AppError::ValidationError("Ticket title is required".into()));
        }
        if req.content.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Ticket content is required".into(),
            ));
        }
        LedgerService::find_user_in(&self.pool, req.user_id).await?;

        let now = Utc::now();
        let ticket = tickets::ActiveModel {
            user_id: Set(req.user_id),
            ticket_type: Set(req.ticket_type),
            title: Set(title.to_string()),
            content: Set(req.content),
            priority: Set(req.priority),
            status: Set(TicketStatus::Pending),
            base_score: Set(ticket_base_score(req.priority)),
            final_score: Set(None),
            review_note: Set(None),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Ticket submitted: id={} user={} type={}",
            ticket.id,
            ticket.user_id,
            ticket.ticket_type
        );
        Ok(ticket.into())
    }

    /// 审核工单
    ///
    /// 只有 pending 工单可以审核，且只能审核一次。通过时在同一事务内写入创世池流水，
    /// 分值以审核人给出的 final_score 为准，缺省为优先级默认分。
    pub async fn review_ticket(
        &self,
        ticket_id: i64,
        req: ReviewTicketRequest,
        reviewer: i64,
    ) -> AppResult<ReviewTicketResponse> {
        if req.status == TicketStatus::Pending {
            return Err(AppError::ValidationError(
                "Review status must be approved or rejected".into(),
            ));
        }
        if req.final_score.is_some_and(|s| s < 0) {
            return Err(AppError::ValidationError(
                "Final score must not be negative".into(),
            ));
        }

        let txn = self.pool.begin().await?;

        let ticket = Self::find_in(&txn, ticket_id).await?;
        if ticket.status != TicketStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Ticket {ticket_id} has already been {}",
                ticket.status
            )));
        }

        let base_score = ticket_base_score(req.priority);
        let final_score = match req.status {
            TicketStatus::Approved => Some(req.final_score.unwrap_or(base_score)),
            _ => req.final_score,
        };

        let now = Utc::now();
        let result = tickets::Entity::update_many()
            .col_expr(tickets::Column::Status, Expr::value(req.status))
            .col_expr(tickets::Column::Priority, Expr::value(req.priority))
            .col_expr(tickets::Column::BaseScore, Expr::value(base_score))
            .col_expr(tickets::Column::FinalScore, Expr::value(final_score))
            .col_expr(tickets::Column::ReviewNote, Expr::value(req.note.clone()))
            .col_expr(tickets::Column::ReviewedBy, Expr::value(reviewer))
            .col_expr(tickets::Column::ReviewedAt, Expr::value(now))
            .col_expr(tickets::Column::UpdatedAt, Expr::value(now))
            .filter(tickets::Column::Id.eq(ticket_id))
            .filter(tickets::Column::Status.eq(TicketStatus::Pending))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::InvalidState(format!(
                "Ticket {ticket_id} was reviewed concurrently"
            )));
        }

        let points_record = match (req.status, final_score) {
            (TicketStatus::Approved, Some(amount)) => {
                let record = LedgerService::grant_in(
                    &txn,
                    NewPointsRecord {
                        user_id: ticket.user_id,
                        pool: PointsPool::Genesis,
                        sub_type: format!("ticket_{}", ticket.ticket_type),
                        amount,
                        related_id: Some(ticket_id),
                        reason: req.note,
                        approved_by: Some(reviewer),
                    },
                )
                .await?;
                Some(record.into())
            }
            _ => None,
        };

        let reviewed = Self::find_in(&txn, ticket_id).await?;
        txn.commit().await?;

        log::info!(
            "Ticket reviewed: id={ticket_id} status={} score={final_score:?} reviewer={reviewer}",
            reviewed.status
        );
        Ok(ReviewTicketResponse {
            ticket: reviewed.into(),
            points_record,
        })
    }

    async fn find_in<C: ConnectionTrait>(conn: &C, ticket_id: i64) -> AppResult<tickets::Model> {
        tickets::Entity::find_by_id(ticket_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticket {ticket_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{PointsRecordStatus, TicketPriority, TicketType, points_record_entity as points};
    use crate::test_utils::{create_blacklisted_user, create_test_user, setup_test_db};
    use sea_orm::PaginatorTrait;

    fn bug_report(user_id: i64, priority: TicketPriority) -> SubmitTicketRequest {
        SubmitTicketRequest {
            user_id,
            ticket_type: TicketType::Bug,
            title: "Order book freezes".into(),
            content: "Depth chart stops updating after reconnect".into(),
            priority,
        }
    }

    fn review(status: TicketStatus, priority: TicketPriority, score: Option<i64>) -> ReviewTicketRequest {
        ReviewTicketRequest {
            priority,
            final_score: score,
            status,
            note: Some("confirmed".into()),
        }
    }

    #[tokio::test]
    async fn test_submit_uses_priority_base_score() -> AppResult<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "frank").await?;
        let service = ReviewService::new(db);

        let ticket = service.submit_ticket(bug_report(user.id, TicketPriority::P1)).await?;
        assert_eq!(ticket.status, TicketStatus::Pending);
        assert_eq!(ticket.base_score, 100);

        let err = service
            .submit_ticket(bug_report(404, TicketPriority::P1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_approval_writes_genesis_record_once() -> AppResult<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "grace").await?;
        let service = ReviewService::new(db.clone());

        let ticket = service.submit_ticket(bug_report(user.id, TicketPriority::P2)).await?;
        let reviewed = service
            .review_ticket(
                ticket.id,
                review(TicketStatus::Approved, TicketPriority::P0, Some(750)),
                11,
            )
            .await?;
        assert_eq!(reviewed.ticket.status, TicketStatus::Approved);
        assert_eq!(reviewed.ticket.base_score, 500);
        assert_eq!(reviewed.ticket.final_score, Some(750));
        assert_eq!(reviewed.ticket.reviewed_by, Some(11));

        let record = reviewed.points_record.expect("ledger entry");
        assert_eq!(record.pool, PointsPool::Genesis);
        assert_eq!(record.amount, 750);
        assert_eq!(record.status, PointsRecordStatus::Approved);
        assert_eq!(record.sub_type, "ticket_bug");
        assert_eq!(record.related_id, Some(ticket.id));

        // 重复审核
        let err = service
            .review_ticket(
                ticket.id,
                review(TicketStatus::Rejected, TicketPriority::P0, None),
                11,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let count = points::Entity::find()
            .filter(points::Column::RelatedId.eq(ticket.id))
            .count(&db)
            .await?;
        assert_eq!(count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_default_score_and_rejection() -> AppResult<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "heidi").await?;
        let service = ReviewService::new(db.clone());

        let first = service.submit_ticket(bug_report(user.id, TicketPriority::P3)).await?;
        let approved = service
            .review_ticket(first.id, review(TicketStatus::Approved, TicketPriority::P3, None), 2)
            .await?;
        assert_eq!(approved.points_record.map(|r| r.amount), Some(20));

        let second = service.submit_ticket(bug_report(user.id, TicketPriority::P1)).await?;
        let rejected = service
            .review_ticket(second.id, review(TicketStatus::Rejected, TicketPriority::P1, None), 2)
            .await?;
        assert_eq!(rejected.ticket.status, TicketStatus::Rejected);
        assert!(rejected.points_record.is_none());

        let count = points::Entity::find()
            .filter(points::Column::RelatedId.eq(second.id))
            .count(&db)
            .await?;
        assert_eq!(count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_review_validation() -> AppResult<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "ivan").await?;
        let service = ReviewService::new(db);
        let ticket = service.submit_ticket(bug_report(user.id, TicketPriority::P2)).await?;

        let err = service
            .review_ticket(ticket.id, review(TicketStatus::Pending, TicketPriority::P2, None), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = service
            .review_ticket(ticket.id, review(TicketStatus::Approved, TicketPriority::P2, Some(-1)), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = service
            .review_ticket(999, review(TicketStatus::Approved, TicketPriority::P2, None), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_blacklisted_approval_rolls_back() -> AppResult<()> {
        let db = setup_test_db().await?;
        let user = create_blacklisted_user(&db, "judy").await?;
        let service = ReviewService::new(db);
        let ticket = service.submit_ticket(bug_report(user.id, TicketPriority::P2)).await?;

        let err = service
            .review_ticket(ticket.id, review(TicketStatus::Approved, TicketPriority::P2, None), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        // 工单保持 pending
        let rejected = service
            .review_ticket(ticket.id, review(TicketStatus::Rejected, TicketPriority::P2, None), 1)
            .await?;
        assert_eq!(rejected.ticket.status, TicketStatus::Rejected);
        Ok(())
    }
}
