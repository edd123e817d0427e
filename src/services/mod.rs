pub mod activity_service;
pub mod ledger_service;
pub mod review_service;
pub mod settlement_service;
pub mod stage_budget_service;
pub mod weekly_rule_service;

pub use activity_service::*;
pub use ledger_service::*;
pub use review_service::*;
pub use settlement_service::*;
pub use stage_budget_service::*;
pub use weekly_rule_service::*;
