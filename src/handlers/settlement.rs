use crate::models::*;
use crate::services::SettlementService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/settlements/preview",
    tag = "settlement",
    request_body = CreateSettlementPreviewRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "生成结算预览成功", body = SettlementResponse),
        (status = 400, description = "参数错误", body = ApiErrorResponse),
        (status = 409, description = "该周已确认或已发放", body = ApiErrorResponse)
    )
)]
/// 汇总区间内已审核通过的积分流水，生成结算预览
pub async fn create_preview(
    service: web::Data<SettlementService>,
    payload: web::Json<CreateSettlementPreviewRequest>,
) -> Result<HttpResponse> {
    match service.create_preview(payload.into_inner()).await {
        Ok(settlement) => {
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": settlement })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/settlements/{id}/confirm",
    tag = "settlement",
    params(
        ("id" = i64, Path, description = "结算ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "确认成功", body = SettlementResponse),
        (status = 404, description = "结算不存在", body = ApiErrorResponse),
        (status = 409, description = "非预览状态，或该周已有确认的结算", body = ApiErrorResponse)
    )
)]
pub async fn confirm_settlement(
    service: web::Data<SettlementService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.confirm(path.into_inner()).await {
        Ok(settlement) => {
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": settlement })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/settlements/{id}/distribute",
    tag = "settlement",
    params(
        ("id" = i64, Path, description = "结算ID")
    ),
    request_body(content = DistributeSettlementRequest, description = "可选，缺省按结算总积分发放"),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "发放成功", body = SettlementResponse),
        (status = 404, description = "结算不存在", body = ApiErrorResponse),
        (status = 409, description = "重复发放或尚未确认", body = ApiErrorResponse),
        (status = 422, description = "超出阶段预算", body = ApiErrorResponse)
    )
)]
/// 发放结算：扣减当前阶段预算并累加对应周规则的实际释放量
pub async fn distribute_settlement(
    service: web::Data<SettlementService>,
    path: web::Path<i64>,
    payload: Option<web::Json<DistributeSettlementRequest>>,
) -> Result<HttpResponse> {
    let actual_points = payload.and_then(|p| p.into_inner().actual_points);
    match service.distribute(path.into_inner(), actual_points).await {
        Ok(settlement) => {
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": settlement })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn settlement_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/settlements")
            .route("/preview", web::post().to(create_preview))
            .route("/{id}/confirm", web::post().to(confirm_settlement))
            .route("/{id}/distribute", web::post().to(distribute_settlement)),
    );
}
