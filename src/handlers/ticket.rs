use crate::handlers::get_staff_id_from_request;
use crate::models::*;
use crate::services::ReviewService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/tickets",
    tag = "ticket",
    request_body = SubmitTicketRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "工单已提交", body = TicketResponse),
        (status = 400, description = "参数错误", body = ApiErrorResponse),
        (status = 404, description = "用户不存在", body = ApiErrorResponse)
    )
)]
pub async fn submit_ticket(
    service: web::Data<ReviewService>,
    payload: web::Json<SubmitTicketRequest>,
) -> Result<HttpResponse> {
    match service.submit_ticket(payload.into_inner()).await {
        Ok(ticket) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": ticket }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/tickets/{id}/review",
    tag = "ticket",
    params(
        ("id" = i64, Path, description = "工单ID")
    ),
    request_body = ReviewTicketRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "审核完成", body = ReviewTicketResponse),
        (status = 400, description = "参数错误", body = ApiErrorResponse),
        (status = 404, description = "工单不存在", body = ApiErrorResponse),
        (status = 409, description = "工单已审核", body = ApiErrorResponse)
    )
)]
/// 审核工单：通过时写入创世池积分流水，审核人取自访问令牌
pub async fn review_ticket(
    service: web::Data<ReviewService>,
    req: HttpRequest,
    path: web::Path<i64>,
    payload: web::Json<ReviewTicketRequest>,
) -> Result<HttpResponse> {
    let reviewer = match get_staff_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .review_ticket(path.into_inner(), payload.into_inner(), reviewer)
        .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn ticket_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tickets")
            .route("", web::post().to(submit_ticket))
            .route("/{id}/review", web::post().to(review_ticket)),
    );
}
