//! Enriched read models.
//!
//! Listings join in the human-facing names so callers do not have to chase
//! ids. Names resolve best-effort: a dangling reference renders as
//! `"Unknown"` rather than failing the whole listing.

use psync_core::{Issue, Project};
use serde::Serialize;

/// An issue with its project and people resolved to display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueDetails {
    /// The issue record.
    #[serde(flatten)]
    pub issue: Issue,

    /// Title of the owning project, or `"Unknown"` if it no longer resolves.
    pub project_title: String,

    /// Username of the assignee, if assigned.
    pub assignee_name: Option<String>,

    /// Username of the creator, or `"Unknown"` if it no longer resolves.
    pub creator_name: String,
}

/// A project with issue counts and its manager's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    /// The project record.
    #[serde(flatten)]
    pub project: Project,

    /// Total issues in the project.
    pub issue_count: usize,

    /// Issues not yet completed.
    pub outstanding_count: usize,

    /// Completed issues.
    pub completed_count: usize,

    /// Username of the owning manager, or `"Unknown"`.
    pub manager_name: String,
}

/// System-wide counters and recency lists for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// Total projects, active or not.
    pub total_projects: usize,

    /// Total issues.
    pub total_issues: usize,

    /// Issues still `Open`.
    pub open_issues: usize,

    /// Issues in the terminal status.
    pub completed_issues: usize,

    /// Issues with `High` priority.
    pub high_priority_issues: usize,

    /// The five most recently created issues, newest first.
    pub recent_issues: Vec<Issue>,

    /// The five most recently created projects, newest first.
    pub recent_projects: Vec<Project>,
}
