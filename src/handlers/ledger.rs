use crate::handlers::get_staff_id_from_request;
use crate::models::*;
use crate::services::LedgerService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/ledger/adjust",
    tag = "ledger",
    request_body = AdjustPointsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "调整成功（立即生效）", body = PointsRecordResponse),
        (status = 400, description = "金额为 0 或缺少原因", body = ApiErrorResponse),
        (status = 404, description = "用户不存在", body = ApiErrorResponse)
    )
)]
/// 手动调整积分，操作人取自访问令牌
pub async fn adjust_points(
    service: web::Data<LedgerService>,
    req: HttpRequest,
    payload: web::Json<AdjustPointsRequest>,
) -> Result<HttpResponse> {
    let actor = match get_staff_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.adjust(payload.into_inner(), actor).await {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": record }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/ledger/{id}/approve",
    tag = "ledger",
    params(
        ("id" = i64, Path, description = "流水ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "审核通过", body = PointsRecordResponse),
        (status = 404, description = "流水不存在", body = ApiErrorResponse),
        (status = 409, description = "当前状态不可审核通过", body = ApiErrorResponse)
    )
)]
pub async fn approve_points(
    service: web::Data<LedgerService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let actor = match get_staff_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.approve(path.into_inner(), actor).await {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": record }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/ledger/{id}/reject",
    tag = "ledger",
    params(
        ("id" = i64, Path, description = "流水ID")
    ),
    request_body = RejectPointsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "已驳回", body = PointsRecordResponse),
        (status = 404, description = "流水不存在", body = ApiErrorResponse),
        (status = 409, description = "当前状态不可驳回", body = ApiErrorResponse)
    )
)]
pub async fn reject_points(
    service: web::Data<LedgerService>,
    req: HttpRequest,
    path: web::Path<i64>,
    payload: Option<web::Json<RejectPointsRequest>>,
) -> Result<HttpResponse> {
    let actor = match get_staff_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    let reason = payload.and_then(|p| p.into_inner().reason);
    match service.reject(path.into_inner(), actor, reason).await {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": record }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/ledger/freeze",
    tag = "ledger",
    request_body = FreezePointsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "冻结成功", body = FreezePointsResponse),
        (status = 400, description = "冻结目标不明确", body = ApiErrorResponse),
        (status = 409, description = "流水当前状态不可冻结", body = ApiErrorResponse)
    )
)]
/// 冻结积分流水：指定 record_id，或指定 pool + related_id 冻结来源对象的所有流水
pub async fn freeze_points(
    service: web::Data<LedgerService>,
    payload: web::Json<FreezePointsRequest>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    let target = match payload.target() {
        Ok(target) => target,
        Err(e) => return Ok(e.error_response()),
    };
    match service.freeze(target, payload.reason).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/ledger/users/{user_id}/balance",
    tag = "ledger",
    params(
        ("user_id" = i64, Path, description = "用户ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "用户积分余额", body = PointsBalanceResponse),
        (status = 404, description = "用户不存在", body = ApiErrorResponse)
    )
)]
pub async fn get_balance(
    service: web::Data<LedgerService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.balance(path.into_inner()).await {
        Ok(balance) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": balance }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn ledger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/ledger")
            .route("/adjust", web::post().to(adjust_points))
            .route("/freeze", web::post().to(freeze_points))
            .route("/users/{user_id}/balance", web::get().to(get_balance))
            .route("/{id}/approve", web::post().to(approve_points))
            .route("/{id}/reject", web::post().to(reject_points)),
    );
}
