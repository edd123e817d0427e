pub mod jwt;
pub mod natural_week;
pub mod scoring;

pub use jwt::*;
pub use natural_week::{WeekWindow, natural_week, week_number};
