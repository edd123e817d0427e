use crate::models::*;
use crate::services::ActivityService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/trades",
    tag = "activity",
    request_body = RecordTradeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "交易已录入并生成待审积分", body = TradeRecordedResponse),
        (status = 400, description = "参数错误", body = ApiErrorResponse),
        (status = 409, description = "用户已被拉黑", body = ApiErrorResponse)
    )
)]
pub async fn record_trade(
    service: web::Data<ActivityService>,
    payload: web::Json<RecordTradeRequest>,
) -> Result<HttpResponse> {
    match service.record_trade(payload.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/trades/{id}/freeze",
    tag = "activity",
    params(
        ("id" = i64, Path, description = "交易ID")
    ),
    request_body = ReasonRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "交易已冻结", body = TradeRecordResponse),
        (status = 404, description = "交易不存在", body = ApiErrorResponse),
        (status = 409, description = "交易已冻结", body = ApiErrorResponse)
    )
)]
/// 冻结交易，结算时不再计入
pub async fn freeze_trade(
    service: web::Data<ActivityService>,
    path: web::Path<i64>,
    payload: web::Json<ReasonRequest>,
) -> Result<HttpResponse> {
    match service
        .freeze_trade(path.into_inner(), payload.into_inner().reason)
        .await
    {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/trades/{id}/unfreeze",
    tag = "activity",
    params(
        ("id" = i64, Path, description = "交易ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "交易已解冻", body = TradeRecordResponse),
        (status = 409, description = "交易未冻结", body = ApiErrorResponse)
    )
)]
pub async fn unfreeze_trade(
    service: web::Data<ActivityService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.unfreeze_trade(path.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/streams",
    tag = "activity",
    request_body = RecordStreamRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "直播已录入并生成待审积分", body = StreamRecordedResponse),
        (status = 400, description = "参数错误", body = ApiErrorResponse)
    )
)]
pub async fn record_stream(
    service: web::Data<ActivityService>,
    payload: web::Json<RecordStreamRequest>,
) -> Result<HttpResponse> {
    match service.record_stream(payload.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/streams/{id}/audience",
    tag = "activity",
    params(
        ("id" = i64, Path, description = "直播ID")
    ),
    request_body = RecordAudienceRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "观众行为已录入", body = AudienceRecordedResponse),
        (status = 404, description = "直播不存在", body = ApiErrorResponse),
        (status = 409, description = "直播已冻结", body = ApiErrorResponse)
    )
)]
pub async fn record_audience(
    service: web::Data<ActivityService>,
    path: web::Path<i64>,
    payload: web::Json<RecordAudienceRequest>,
) -> Result<HttpResponse> {
    match service
        .record_audience(path.into_inner(), payload.into_inner())
        .await
    {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/streams/{id}/freeze",
    tag = "activity",
    params(
        ("id" = i64, Path, description = "直播ID")
    ),
    request_body = ReasonRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "直播已冻结", body = LiveStreamResponse),
        (status = 409, description = "直播已冻结", body = ApiErrorResponse)
    )
)]
pub async fn freeze_stream(
    service: web::Data<ActivityService>,
    path: web::Path<i64>,
    payload: web::Json<ReasonRequest>,
) -> Result<HttpResponse> {
    match service
        .freeze_stream(path.into_inner(), payload.into_inner().reason)
        .await
    {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/streams/{id}/unfreeze",
    tag = "activity",
    params(
        ("id" = i64, Path, description = "直播ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "直播已解冻", body = LiveStreamResponse),
        (status = 409, description = "直播未冻结", body = ApiErrorResponse)
    )
)]
pub async fn unfreeze_stream(
    service: web::Data<ActivityService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.unfreeze_stream(path.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn activity_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/trades")
            .route("", web::post().to(record_trade))
            .route("/{id}/freeze", web::post().to(freeze_trade))
            .route("/{id}/unfreeze", web::post().to(unfreeze_trade)),
    )
    .service(
        web::scope("/streams")
            .route("", web::post().to(record_stream))
            .route("/{id}/audience", web::post().to(record_audience))
            .route("/{id}/freeze", web::post().to(freeze_stream))
            .route("/{id}/unfreeze", web::post().to(unfreeze_stream)),
    );
}
