use crate::models::*;
use crate::services::StageBudgetService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/stages",
    tag = "stage",
    request_body = CreateStageRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建阶段成功", body = StageResponse),
        (status = 400, description = "参数错误", body = ApiErrorResponse),
        (status = 409, description = "阶段名重复或已有进行中的阶段", body = ApiErrorResponse)
    )
)]
/// 创建阶段预算（全局仅允许一个 active 阶段）
pub async fn create_stage(
    service: web::Data<StageBudgetService>,
    payload: web::Json<CreateStageRequest>,
) -> Result<HttpResponse> {
    match service.create_stage(payload.into_inner()).await {
        Ok(stage) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": stage }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/stages/active",
    tag = "stage",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "当前进行中的阶段", body = StageResponse),
        (status = 404, description = "没有进行中的阶段", body = ApiErrorResponse)
    )
)]
pub async fn get_active_stage(service: web::Data<StageBudgetService>) -> Result<HttpResponse> {
    match service.active_stage().await {
        Ok(stage) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": stage }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/stages/{id}/end",
    tag = "stage",
    params(
        ("id" = i64, Path, description = "阶段ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "阶段已结束", body = StageResponse),
        (status = 404, description = "阶段不存在", body = ApiErrorResponse),
        (status = 409, description = "阶段已结束", body = ApiErrorResponse)
    )
)]
/// 结束阶段，不可恢复
pub async fn end_stage(
    service: web::Data<StageBudgetService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.end_stage(path.into_inner()).await {
        Ok(stage) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": stage }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/stages/{id}/usage",
    tag = "stage",
    params(
        ("id" = i64, Path, description = "阶段ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "预算使用情况", body = StageUsageResponse),
        (status = 404, description = "阶段不存在", body = ApiErrorResponse)
    )
)]
pub async fn get_stage_usage(
    service: web::Data<StageBudgetService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.usage(path.into_inner()).await {
        Ok(usage) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": usage }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn stage_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/stages")
            .route("", web::post().to(create_stage))
            .route("/active", web::get().to(get_active_stage))
            .route("/{id}/end", web::post().to(end_stage))
            .route("/{id}/usage", web::get().to(get_stage_usage)),
    );
}
