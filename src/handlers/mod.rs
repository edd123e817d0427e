pub mod activity;
pub mod health;
pub mod ledger;
pub mod settlement;
pub mod stage;
pub mod ticket;
pub mod week_rule;

pub use activity::activity_config;
pub use health::health_config;
pub use ledger::ledger_config;
pub use settlement::settlement_config;
pub use stage::stage_config;
pub use ticket::ticket_config;
pub use week_rule::week_rule_config;

use crate::error::{AppError, AppResult};
use actix_web::{HttpMessage, HttpRequest};

/// 从请求扩展中获取员工ID（中间件在鉴权后注入）
pub(crate) fn get_staff_id_from_request(req: &HttpRequest) -> AppResult<i64> {
    req.extensions()
        .get::<i64>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Missing staff identity".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middlewares::AuthMiddleware;
    use crate::services::*;
    use crate::test_utils::{create_test_user, setup_test_db};
    use crate::utils::JwtService;
    use actix_web::test as actix_test;
    use actix_web::{App, web};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn test_admin_flow_over_http() -> AppResult<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "kate").await?;
        let jwt = JwtService::new("flow-secret", 3600);
        let token = jwt.generate_access_token(7)?;
        let bearer = ("Authorization", format!("Bearer {token}"));

        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt))
                .app_data(web::Data::new(StageBudgetService::new(db.clone())))
                .app_data(web::Data::new(WeeklyRuleService::new(db.clone())))
                .app_data(web::Data::new(ReviewService::new(db.clone())))
                .app_data(web::Data::new(LedgerService::new(db.clone())))
                .configure(health_config)
                .service(
                    web::scope("/api/v1/admin")
                        .configure(stage_config)
                        .configure(week_rule_config)
                        .configure(ticket_config)
                        .configure(ledger_config),
                ),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/v1/admin/stages")
            .insert_header(bearer.clone())
            .set_json(json!({
                "stage_name": "S0",
                "total_budget": 1_000_000,
                "start_date": "2026-01-13T00:00:00Z",
                "end_date": "2026-04-06T00:00:00Z"
            }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        let stage_id = body["data"]["id"].as_i64().unwrap();

        let rule = |date: &str| {
            json!({
                "stage_id": stage_id,
                "selected_date": date,
                "weekly_points_target": 100_000,
                "p_genesis_percent": "40",
                "p_eco_percent": "40",
                "p_trade_percent": "20"
            })
        };
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/admin/week-rules")
            .insert_header(bearer.clone())
            .set_json(rule("2026-01-14"))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["week_number"], 1);

        // 同一自然周
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/admin/week-rules")
            .insert_header(bearer.clone())
            .set_json(rule("2026-01-15"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 409);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "CONFLICT");

        let req = actix_test::TestRequest::post()
            .uri("/api/v1/admin/tickets")
            .insert_header(bearer.clone())
            .set_json(json!({
                "user_id": user.id,
                "ticket_type": "bug",
                "title": "Withdraw button disabled",
                "content": "Button stays grey after KYC",
                "priority": "p1"
            }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        let ticket_id = body["data"]["id"].as_i64().unwrap();

        let req = actix_test::TestRequest::post()
            .uri(&format!("/api/v1/admin/tickets/{ticket_id}/review"))
            .insert_header(bearer.clone())
            .set_json(json!({ "priority": "p1", "status": "approved" }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["ticket"]["reviewed_by"], 7);
        assert_eq!(body["data"]["points_record"]["amount"], 100);

        let req = actix_test::TestRequest::get()
            .uri(&format!("/api/v1/admin/ledger/users/{}/balance", user.id))
            .insert_header(bearer)
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["genesis"], 100);
        assert_eq!(body["data"]["total"], 100);

        let resp = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/health").to_request()).await;
        assert!(resp.status().is_success());
        Ok(())
    }
}
