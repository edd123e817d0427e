pub mod activity_status;
pub mod live_streams;
pub mod points_records;
pub mod settlements;
pub mod stage_budgets;
pub mod tickets;
pub mod trade_records;
pub mod users;
pub mod weekly_release_rules;

pub use activity_status::ActivityStatus;
pub use points_records::{PointsPool, PointsRecordStatus};
pub use settlements::SettlementStatus;
pub use stage_budgets::StageStatus;
pub use tickets::{TicketPriority, TicketStatus, TicketType};
pub use weekly_release_rules::WeeklyRuleStatus;

pub use live_streams as live_stream_entity;
pub use points_records as points_record_entity;
pub use settlements as settlement_entity;
pub use stage_budgets as stage_budget_entity;
pub use tickets as ticket_entity;
pub use trade_records as trade_record_entity;
pub use users as user_entity;
pub use weekly_release_rules as weekly_rule_entity;
