pub mod activity;
pub mod common;
pub mod ledger;
pub mod settlement;
pub mod stage;
pub mod ticket;
pub mod week_rule;

pub use activity::*;
pub use common::*;
pub use ledger::*;
pub use settlement::*;
pub use stage::*;
pub use ticket::*;
pub use week_rule::*;
