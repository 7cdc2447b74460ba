//! Dashboard derived state
//!
//! Progress, deadline urgency, search/filter and summary counters are
//! computed here so the browser only renders what the server returns.
//!
//! # Example
//!
//! ```
//! use chrono::{NaiveDate, TimeZone, Utc};
//! use progresso_shared::dashboard::{days_until_deadline, progress, DeadlineUrgency};
//! use progresso_shared::models::task::TaskStatus;
//!
//! assert_eq!(progress([TaskStatus::Done, TaskStatus::Done, TaskStatus::Todo]), 67);
//!
//! let now = Utc.with_ymd_and_hms(2025, 11, 24, 0, 0, 0).unwrap();
//! let deadline = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
//! let days = days_until_deadline(deadline, now);
//! assert_eq!(days, 7);
//! assert_eq!(DeadlineUrgency::from_days(days), DeadlineUrgency::Warning);
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::project::ProjectDetails;
use crate::models::task::TaskStatus;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Percentage of done tasks, rounded half up; 0 when there are no tasks
pub fn progress<I>(statuses: I) -> u8
where
    I: IntoIterator<Item = TaskStatus>,
{
    let (done, total) = statuses
        .into_iter()
        .fold((0u64, 0u64), |(done, total), status| {
            (done + u64::from(status.is_done()), total + 1)
        });

    if total == 0 {
        return 0;
    }

    // round(100 * done / total) == floor((200 * done + total) / (2 * total))
    ((200 * done + total) / (2 * total)) as u8
}

/// Whole days from `now` until the start of `deadline` (UTC), rounded up
///
/// Negative values mean the deadline has passed.
pub fn days_until_deadline(deadline: NaiveDate, now: DateTime<Utc>) -> i64 {
    let midnight = Utc.from_utc_datetime(&deadline.and_time(NaiveTime::default()));
    let millis = (midnight - now).num_milliseconds();

    millis.div_euclid(MILLIS_PER_DAY) + i64::from(millis.rem_euclid(MILLIS_PER_DAY) != 0)
}

/// How pressing a deadline is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadlineUrgency {
    /// Overdue
    Critical,

    /// Due within a week
    Warning,

    /// More than a week away
    Normal,
}

impl DeadlineUrgency {
    /// Classifies a day count from [`days_until_deadline`]
    pub fn from_days(days: i64) -> Self {
        if days < 0 {
            DeadlineUrgency::Critical
        } else if days <= 7 {
            DeadlineUrgency::Warning
        } else {
            DeadlineUrgency::Normal
        }
    }
}

/// Completion filter for the project list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectFilter {
    /// Every project
    #[default]
    All,

    /// Progress below 100
    Active,

    /// Progress at 100
    Completed,
}

impl ProjectFilter {
    /// Whether a project with `progress` passes the filter
    pub fn matches(&self, progress: u8) -> bool {
        match self {
            ProjectFilter::All => true,
            ProjectFilter::Active => progress < 100,
            ProjectFilter::Completed => progress == 100,
        }
    }

    /// Query-string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectFilter::All => "all",
            ProjectFilter::Active => "active",
            ProjectFilter::Completed => "completed",
        }
    }
}

impl fmt::Display for ProjectFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown filter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter '{0}', expected all, active or completed")]
pub struct ParseProjectFilterError(pub String);

impl FromStr for ProjectFilter {
    type Err = ParseProjectFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(ProjectFilter::All),
            "active" => Ok(ProjectFilter::Active),
            "completed" => Ok(ProjectFilter::Completed),
            _ => Err(ParseProjectFilterError(s.to_string())),
        }
    }
}

/// Keeps projects whose name contains `search` (ignoring case) and that pass `filter`
pub fn filter_projects(
    projects: Vec<ProjectDetails>,
    search: &str,
    filter: ProjectFilter,
) -> Vec<ProjectDetails> {
    let needle = search.trim().to_lowercase();

    projects
        .into_iter()
        .filter(|p| needle.is_empty() || p.project.name.to_lowercase().contains(&needle))
        .filter(|p| filter.matches(p.progress))
        .collect()
}

/// Counters shown above the project grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Number of projects
    pub total_projects: usize,

    /// Tasks in `DONE`
    pub completed_tasks: usize,

    /// Tasks in `IN_PROGRESS`
    pub in_progress_tasks: usize,

    /// Memberships across all projects
    pub total_members: usize,
}

impl DashboardSummary {
    /// Counts over the given projects
    pub fn from_projects(projects: &[ProjectDetails]) -> Self {
        let tasks = || projects.iter().flat_map(|p| p.tasks.iter());

        Self {
            total_projects: projects.len(),
            completed_tasks: tasks().filter(|t| t.status == TaskStatus::Done).count(),
            in_progress_tasks: tasks().filter(|t| t.status == TaskStatus::InProgress).count(),
            total_members: projects.iter().map(|p| p.members.len()).sum(),
        }
    }
}

/// One project as rendered on the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCard {
    /// Project with members, tasks and progress
    #[serde(flatten)]
    pub details: ProjectDetails,

    /// Days until the deadline, if there is one
    pub days_until_deadline: Option<i64>,

    /// Urgency of the deadline, if there is one
    pub urgency: Option<DeadlineUrgency>,
}

impl ProjectCard {
    /// Derives deadline fields relative to `now`
    pub fn new(details: ProjectDetails, now: DateTime<Utc>) -> Self {
        let days_until_deadline = details
            .project
            .deadline
            .map(|deadline| days_until_deadline(deadline, now));

        Self {
            urgency: days_until_deadline.map(DeadlineUrgency::from_days),
            days_until_deadline,
            details,
        }
    }
}

/// Full dashboard payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    /// Counters over the unfiltered project set
    pub summary: DashboardSummary,

    /// Filtered project cards
    pub projects: Vec<ProjectCard>,
}

impl Dashboard {
    /// Builds the dashboard; the summary ignores `search` and `filter`
    pub fn build(
        projects: Vec<ProjectDetails>,
        search: &str,
        filter: ProjectFilter,
        now: DateTime<Utc>,
    ) -> Self {
        let summary = DashboardSummary::from_projects(&projects);
        let projects = filter_projects(projects, search, filter)
            .into_iter()
            .map(|details| ProjectCard::new(details, now))
            .collect();

        Self { summary, projects }
    }
}
