use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    ActivityStatus, PointsPool, PointsRecordStatus, SettlementStatus, StageStatus, TicketPriority,
    TicketStatus, TicketType, WeeklyRuleStatus,
};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::stage::create_stage,
        handlers::stage::get_active_stage,
        handlers::stage::end_stage,
        handlers::stage::get_stage_usage,
        handlers::week_rule::create_rule,
        handlers::week_rule::pause_rule,
        handlers::week_rule::resume_rule,
        handlers::week_rule::end_rule,
        handlers::week_rule::get_rule_progress,
        handlers::settlement::create_preview,
        handlers::settlement::confirm_settlement,
        handlers::settlement::distribute_settlement,
        handlers::ticket::submit_ticket,
        handlers::ticket::review_ticket,
        handlers::activity::record_trade,
        handlers::activity::freeze_trade,
        handlers::activity::unfreeze_trade,
        handlers::activity::record_stream,
        handlers::activity::record_audience,
        handlers::activity::freeze_stream,
        handlers::activity::unfreeze_stream,
        handlers::ledger::adjust_points,
        handlers::ledger::approve_points,
        handlers::ledger::reject_points,
        handlers::ledger::freeze_points,
        handlers::ledger::get_balance,
    ),
    components(
        schemas(
            PointsPool,
            PointsRecordStatus,
            StageStatus,
            WeeklyRuleStatus,
            SettlementStatus,
            TicketType,
            TicketPriority,
            TicketStatus,
            ActivityStatus,
            ApiError,
            ApiErrorResponse,
            ReasonRequest,
            CreateStageRequest,
            StageResponse,
            StageUsageResponse,
            BudgetWarningLevel,
            CreateWeeklyRuleRequest,
            WeeklyRuleResponse,
            WeeklyRuleProgressResponse,
            CreateSettlementPreviewRequest,
            DistributeSettlementRequest,
            SettlementResponse,
            SubmitTicketRequest,
            ReviewTicketRequest,
            TicketResponse,
            ReviewTicketResponse,
            RecordTradeRequest,
            TradeRecordResponse,
            TradeRecordedResponse,
            RecordStreamRequest,
            RecordAudienceRequest,
            LiveStreamResponse,
            StreamRecordedResponse,
            AudienceRecordedResponse,
            AdjustPointsRequest,
            RejectPointsRequest,
            FreezePointsRequest,
            FreezePointsResponse,
            PointsRecordResponse,
            PointsBalanceResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "stage", description = "Stage budget API"),
        (name = "week_rule", description = "Weekly release rule API"),
        (name = "settlement", description = "Weekly settlement API"),
        (name = "ticket", description = "Ticket review API"),
        (name = "activity", description = "Trade and live stream ingestion API"),
        (name = "ledger", description = "Points ledger API"),
    ),
    info(
        title = "Points Ops Backend API",
        version = "0.1.0",
        description = "Points program operations backend: scoring, ledger, stage budget, weekly release and settlement"
    ),
    servers(
        (url = "/api/v1/admin", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
