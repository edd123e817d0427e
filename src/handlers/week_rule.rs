use crate::models::*;
use crate::services::WeeklyRuleService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/week-rules",
    tag = "week_rule",
    request_body = CreateWeeklyRuleRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建周释放规则成功", body = WeeklyRuleResponse),
        (status = 400, description = "比例之和不为 100 或日期超出阶段", body = ApiErrorResponse),
        (status = 404, description = "阶段不存在", body = ApiErrorResponse),
        (status = 409, description = "与已有规则的周重叠", body = ApiErrorResponse)
    )
)]
/// 创建周释放规则：所选日期归一到所在自然周（周一 ~ 周日）
pub async fn create_rule(
    service: web::Data<WeeklyRuleService>,
    payload: web::Json<CreateWeeklyRuleRequest>,
) -> Result<HttpResponse> {
    match service.create_rule(payload.into_inner()).await {
        Ok(rule) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": rule }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/week-rules/{id}/pause",
    tag = "week_rule",
    params(
        ("id" = i64, Path, description = "规则ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "已暂停", body = WeeklyRuleResponse),
        (status = 409, description = "当前状态不可暂停", body = ApiErrorResponse)
    )
)]
pub async fn pause_rule(
    service: web::Data<WeeklyRuleService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.pause(path.into_inner()).await {
        Ok(rule) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": rule }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/week-rules/{id}/resume",
    tag = "week_rule",
    params(
        ("id" = i64, Path, description = "规则ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "已恢复", body = WeeklyRuleResponse),
        (status = 409, description = "规则未处于暂停状态", body = ApiErrorResponse)
    )
)]
pub async fn resume_rule(
    service: web::Data<WeeklyRuleService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.resume(path.into_inner()).await {
        Ok(rule) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": rule }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/week-rules/{id}/end",
    tag = "week_rule",
    params(
        ("id" = i64, Path, description = "规则ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "已结束", body = WeeklyRuleResponse),
        (status = 409, description = "规则已结束", body = ApiErrorResponse)
    )
)]
pub async fn end_rule(
    service: web::Data<WeeklyRuleService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.end(path.into_inner()).await {
        Ok(rule) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": rule }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/week-rules/{id}/progress",
    tag = "week_rule",
    params(
        ("id" = i64, Path, description = "规则ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "周释放完成度", body = WeeklyRuleProgressResponse),
        (status = 404, description = "规则不存在", body = ApiErrorResponse)
    )
)]
pub async fn get_rule_progress(
    service: web::Data<WeeklyRuleService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.progress(path.into_inner()).await {
        Ok(progress) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": progress }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn week_rule_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/week-rules")
            .route("", web::post().to(create_rule))
            .route("/{id}/pause", web::post().to(pause_rule))
            .route("/{id}/resume", web::post().to(resume_rule))
            .route("/{id}/end", web::post().to(end_rule))
            .route("/{id}/progress", web::get().to(get_rule_progress)),
    );
}
