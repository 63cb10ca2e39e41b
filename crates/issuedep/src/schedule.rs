//! Scheduling helpers for the timeline view.
//!
//! An issue's planned period comes from its sprints (earliest sprint start,
//! latest sprint end), overridden by explicit start and due dates. Effort is
//! compared against the business days of that period.

use crate::domain::{IssueId, IssuePeriod, IssueInfo};
use crate::graph::IssueGraph;
use chrono::{DateTime, Datelike, TimeDelta, Utc};
use serde::Serialize;

/// Working hours in one estimated day.
pub const WORK_HOURS_PER_DAY: i64 = 8;

/// Weekend days in the padding before a start weekday or after an end weekday.
const WEEKEND_PADDING: [i64; 7] = [0, 0, 1, 2, 3, 4, 5];

/// Estimated effort in working days.
pub fn estimation_to_days(estimation: Option<&IssuePeriod>) -> f64 {
    match estimation {
        Some(period) if period.minutes != 0 => {
            period.minutes as f64 / (60 * WORK_HOURS_PER_DAY) as f64
        }
        _ => 0.0,
    }
}

/// Planned start and end of an issue.
pub fn issue_start_end(issue: &IssueInfo) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let sprint_start = issue.sprints.iter().filter_map(|s| s.start_date).min();
    let sprint_end = issue.sprints.iter().filter_map(|s| s.end_date).max();
    (
        issue.start_date.or(sprint_start),
        issue.due_date.or(sprint_end),
    )
}

/// Business days from `start` to `end`, both inclusive.
///
/// Returns -1 if `start` is after `end`. Weekdays are taken in UTC.
pub fn calc_business_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    if start > end {
        return -1;
    }

    let num_days = (end + TimeDelta::days(1) - start).num_days();
    // Days needed to pad the range to whole weeks
    let a = start.weekday().num_days_from_sunday() as usize;
    let b = 6 - end.weekday().num_days_from_sunday() as usize;
    let weekend_days = WEEKEND_PADDING[a] + WEEKEND_PADDING[b];
    let (a, b) = (a as i64, b as i64);

    // 7 / 5 calendar days per business day
    ((num_days + a + b) * 5).div_euclid(7) - weekend_days
}

/// Effort versus schedule of one issue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkInfo {
    /// Estimated working days, if estimated
    pub estimated_days: Option<f64>,
    /// Business days between planned start and end
    pub scheduled_days: Option<i64>,
    /// Estimated over scheduled days
    pub work_factor: Option<f64>,
}

/// Effort versus schedule of one issue.
///
/// The work factor needs a positive number of scheduled days.
pub fn issue_work(issue: &IssueInfo) -> WorkInfo {
    let estimated = estimation_to_days(issue.estimation.as_ref());
    let scheduled = match issue_start_end(issue) {
        (Some(start), Some(end)) => Some(calc_business_days(start, end)),
        _ => None,
    };

    WorkInfo {
        estimated_days: (estimated != 0.0).then_some(estimated),
        scheduled_days: scheduled.filter(|days| *days != 0),
        work_factor: scheduled
            .filter(|days| *days > 0)
            .map(|days| estimated / days as f64),
    }
}

/// Returns `true` if the issue is unresolved and its due date has passed.
pub fn is_overdue(issue: &IssueInfo, now: DateTime<Utc>) -> bool {
    !issue.resolved && issue.due_date.is_some_and(|due| due < now)
}

/// Timeline entry of one issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSchedule {
    /// Internal id
    pub id: IssueId,
    /// Display id
    pub id_readable: String,
    /// Summary
    pub summary: String,
    /// Planned start
    pub start: Option<DateTime<Utc>>,
    /// Planned end
    pub end: Option<DateTime<Utc>>,
    /// Effort figures
    pub work: WorkInfo,
    /// Past due and unresolved
    pub overdue: bool,
}

/// Timeline entries of every scheduled issue, ordered by start then id.
///
/// Issues with neither start nor end are left out.
pub fn schedule(graph: &IssueGraph, now: DateTime<Utc>) -> Vec<IssueSchedule> {
    let mut entries: Vec<IssueSchedule> = graph
        .iter()
        .filter_map(|issue| {
            let (start, end) = issue_start_end(issue);
            if start.is_none() && end.is_none() {
                return None;
            }
            Some(IssueSchedule {
                id: issue.id.clone(),
                id_readable: issue.id_readable.clone(),
                summary: issue.summary.clone(),
                start,
                end,
                work: issue_work(issue),
                overdue: is_overdue(issue, now),
            })
        })
        .collect();
    entries.sort_by(|a, b| {
        a.start
            .or(a.end)
            .cmp(&b.start.or(b.end))
            .then_with(|| a.id.cmp(&b.id))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VersionValue;
    use chrono::TimeZone;
    use rstest::rstest;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn period(minutes: i64) -> IssuePeriod {
        IssuePeriod {
            presentation: format!("{minutes}m"),
            minutes,
        }
    }

    #[rstest]
    #[case(None, 0.0)]
    #[case(Some(0), 0.0)]
    #[case(Some(480), 1.0)]
    #[case(Some(1200), 2.5)]
    fn test_estimation_to_days(#[case] minutes: Option<i64>, #[case] expected: f64) {
        let estimation = minutes.map(period);
        assert!((estimation_to_days(estimation.as_ref()) - expected).abs() < f64::EPSILON);
    }

    // 2024-01-01 is a Monday
    #[rstest]
    #[case(day(2024, 1, 1), day(2024, 1, 1), 1)]
    #[case(day(2024, 1, 1), day(2024, 1, 5), 5)]
    #[case(day(2024, 1, 1), day(2024, 1, 7), 5)]
    #[case(day(2024, 1, 1), day(2024, 1, 8), 6)]
    #[case(day(2024, 1, 6), day(2024, 1, 7), 0)]
    #[case(day(2024, 1, 5), day(2024, 1, 8), 2)]
    #[case(day(2024, 1, 1), day(2024, 1, 31), 23)]
    #[case(day(2024, 1, 2), day(2024, 1, 1), -1)]
    fn test_calc_business_days(
        #[case] start: DateTime<Utc>,
        #[case] end: DateTime<Utc>,
        #[case] expected: i64,
    ) {
        assert_eq!(calc_business_days(start, end), expected);
    }

    #[test]
    fn test_start_end_from_sprints_with_overrides() {
        let mut issue = IssueInfo::new("a", "A-1", 1);
        issue.sprints = vec![
            VersionValue {
                name: "S2".into(),
                start_date: Some(day(2024, 1, 15)),
                end_date: Some(day(2024, 1, 26)),
            },
            VersionValue {
                name: "S1".into(),
                start_date: Some(day(2024, 1, 1)),
                end_date: Some(day(2024, 1, 12)),
            },
            VersionValue {
                name: "Backlog".into(),
                start_date: None,
                end_date: None,
            },
        ];

        assert_eq!(
            issue_start_end(&issue),
            (Some(day(2024, 1, 1)), Some(day(2024, 1, 26)))
        );

        issue.due_date = Some(day(2024, 1, 19));
        assert_eq!(
            issue_start_end(&issue),
            (Some(day(2024, 1, 1)), Some(day(2024, 1, 19)))
        );
    }

    #[test]
    fn test_issue_work() {
        let mut issue = IssueInfo::new("a", "A-1", 1);
        issue.estimation = Some(period(480 * 5));
        issue.start_date = Some(day(2024, 1, 1));
        issue.due_date = Some(day(2024, 1, 12));

        let work = issue_work(&issue);
        assert_eq!(work.estimated_days, Some(5.0));
        assert_eq!(work.scheduled_days, Some(10));
        assert_eq!(work.work_factor, Some(0.5));
    }

    #[test]
    fn test_issue_work_without_schedule() {
        let mut issue = IssueInfo::new("a", "A-1", 1);
        issue.estimation = Some(period(480));

        let work = issue_work(&issue);
        assert_eq!(work.estimated_days, Some(1.0));
        assert_eq!(work.scheduled_days, None);
        assert_eq!(work.work_factor, None);
    }

    #[test]
    fn test_is_overdue() {
        let now = day(2024, 2, 1);
        let mut issue = IssueInfo::new("a", "A-1", 1);
        assert!(!is_overdue(&issue, now));

        issue.due_date = Some(day(2024, 1, 31));
        assert!(is_overdue(&issue, now));

        issue.resolved = true;
        assert!(!is_overdue(&issue, now));
    }

    #[test]
    fn test_schedule_orders_by_start() {
        let mut late = IssueInfo::new("a", "A-1", 1);
        late.start_date = Some(day(2024, 3, 1));
        let mut early = IssueInfo::new("b", "B-1", 1);
        early.due_date = Some(day(2024, 1, 10));
        let unscheduled = IssueInfo::new("c", "C-1", 0);
        let graph: IssueGraph = [late, early, unscheduled].into_iter().collect();

        let entries = schedule(&graph, day(2024, 2, 1));
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(entries[0].overdue);
    }
}
