//! 自然周（周一 ~ 周日）窗口计算，统一使用 UTC

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekWindow {
    /// 周一 00:00:00.000
    pub start: DateTime<Utc>,
    /// 周日 23:59:59.999
    pub end: DateTime<Utc>,
}

impl WeekWindow {
    /// 与另一个闭区间是否重叠。
    /// 三种情况：新起点落在已有区间内 / 新终点落在已有区间内 / 新区间完整包含已有区间
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        let start_inside = self.start >= start && self.start <= end;
        let end_inside = self.end >= start && self.end <= end;
        let contains = self.start <= start && self.end >= end;
        start_inside || end_inside || contains
    }

    /// 与 [start, end] 是否有交集
    pub fn intersects(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start <= end && self.end >= start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// 给定周内任意一天，返回所在自然周窗口（周日回退 6 天到周一）
pub fn natural_week(date: NaiveDate) -> WeekWindow {
    let days_from_monday = i64::from(date.weekday().num_days_from_monday());
    let monday = date - Duration::days(days_from_monday);
    let start = monday.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(7) - Duration::milliseconds(1);
    WeekWindow { start, end }
}

/// 周序号：以阶段开始日所在周的周一为第 1 周
pub fn week_number(stage_start: DateTime<Utc>, week_start: DateTime<Utc>) -> i64 {
    let stage_monday = natural_week(stage_start.date_naive()).start;
    let days = (week_start - stage_monday).num_days();
    days.div_euclid(7) + 1
}
