//! Issue status, workflow table, and the issue record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::FieldParseError;

/// The lifecycle status of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    /// Created, waiting for the manager to assign it.
    Open,
    /// Bound to an assignee, work not started.
    Assigned,
    /// Being worked by the assignee.
    InProgress,
    /// Waiting for review; may bounce back to `InProgress`.
    Review,
    /// Done. Terminal for everyone; nothing leaves this status.
    Completed,
}

impl IssueStatus {
    /// Parses a status from its wire string.
    ///
    /// # Errors
    ///
    /// Returns [`FieldParseError::Status`] if the string is not recognized.
    pub fn parse(s: &str) -> Result<Self, FieldParseError> {
        match s {
            "OPEN" => Ok(Self::Open),
            "ASSIGNED" => Ok(Self::Assigned),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "REVIEW" => Ok(Self::Review),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(FieldParseError::Status {
                value: s.to_string(),
            }),
        }
    }

    /// Returns the wire string for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Assigned => "ASSIGNED",
            Self::InProgress => "IN_PROGRESS",
            Self::Review => "REVIEW",
            Self::Completed => "COMPLETED",
        }
    }

    /// Returns `true` for the terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns `true` for statuses counted as outstanding in summaries.
    #[must_use]
    pub const fn is_outstanding(self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How urgent an issue is. Informational; nothing routes on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssuePriority {
    /// Low urgency.
    Low,
    /// Default urgency.
    Medium,
    /// High urgency.
    High,
    /// Drop everything.
    Critical,
}

impl IssuePriority {
    /// Parses a priority from its wire string.
    ///
    /// # Errors
    ///
    /// Returns [`FieldParseError::Priority`] if the string is not recognized.
    pub fn parse(s: &str) -> Result<Self, FieldParseError> {
        match s {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(FieldParseError::Priority {
                value: s.to_string(),
            }),
        }
    }

    /// Returns the wire string for this priority.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for IssuePriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What kind of work an issue tracks. Informational; nothing routes on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    /// Defect in existing behavior.
    Bug,
    /// General unit of work.
    Task,
    /// New functionality.
    Feature,
    /// Improvement to existing functionality.
    Enhancement,
}

impl IssueKind {
    /// Parses a kind from its wire string.
    ///
    /// # Errors
    ///
    /// Returns [`FieldParseError::Kind`] if the string is not recognized.
    pub fn parse(s: &str) -> Result<Self, FieldParseError> {
        match s {
            "BUG" => Ok(Self::Bug),
            "TASK" => Ok(Self::Task),
            "FEATURE" => Ok(Self::Feature),
            "ENHANCEMENT" => Ok(Self::Enhancement),
            _ => Err(FieldParseError::Kind {
                value: s.to_string(),
            }),
        }
    }

    /// Returns the wire string for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bug => "BUG",
            Self::Task => "TASK",
            Self::Feature => "FEATURE",
            Self::Enhancement => "ENHANCEMENT",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The workflow table: which statuses a non-manager assignee may move an
/// issue to, keyed by the current status.
///
/// `Open` has no targets (the manager must assign first) and `Completed`
/// has none (terminal). The table binds non-manager actors only; the
/// manager's moves skip it entirely.
const WORKFLOW: &[(IssueStatus, &[IssueStatus])] = &[
    (IssueStatus::Open, &[]),
    (IssueStatus::Assigned, &[IssueStatus::InProgress]),
    (
        IssueStatus::InProgress,
        &[IssueStatus::Review, IssueStatus::Assigned],
    ),
    (IssueStatus::Review, &[IssueStatus::InProgress]),
    (IssueStatus::Completed, &[]),
];

/// Returns the statuses a non-manager assignee may move to from `from`.
#[must_use]
pub fn permitted_targets(from: IssueStatus) -> &'static [IssueStatus] {
    WORKFLOW
        .iter()
        .find(|(status, _)| *status == from)
        .map_or(&[], |(_, targets)| *targets)
}

/// Returns `true` if the workflow table permits `from` → `to`.
#[must_use]
pub fn is_permitted(from: IssueStatus, to: IssueStatus) -> bool {
    permitted_targets(from).contains(&to)
}

/// A tracked work item.
///
/// Issues are created `Open` and unassigned, belong to exactly one project,
/// and are never deleted. Only two mutations exist after creation:
/// [`apply_transition`](Self::apply_transition) and
/// [`apply_assignment`](Self::apply_assignment); both refresh `updated_at`
/// and touch nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Unique identifier.
    pub id: Uuid,

    /// Short summary.
    pub title: String,

    /// Optional free-form description.
    pub description: Option<String>,

    /// Urgency. Informational.
    pub priority: IssuePriority,

    /// Kind of work. Informational.
    pub kind: IssueKind,

    /// Current lifecycle status.
    pub status: IssueStatus,

    /// The project this issue belongs to. Immutable.
    pub project_id: Uuid,

    /// The identity that created the issue. Set once at creation.
    pub created_by: Uuid,

    /// The current assignee, if any. Absent until the first assignment.
    pub assigned_to: Option<Uuid>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    /// Creates an `Open`, unassigned issue with both timestamps set to `now`.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        title: impl Into<String>,
        description: Option<String>,
        priority: IssuePriority,
        kind: IssueKind,
        project_id: Uuid,
        created_by: Uuid,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description,
            priority,
            kind,
            status: IssueStatus::Open,
            project_id,
            created_by,
            assigned_to: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if `actor_id` is the current assignee.
    ///
    /// This is the assignee-of-issue relation the gate uses for transition
    /// ownership. It is distinct from project ownership
    /// ([`Project::is_managed_by`](crate::project::Project::is_managed_by)).
    #[must_use]
    pub fn is_assigned_to(&self, actor_id: Uuid) -> bool {
        self.assigned_to == Some(actor_id)
    }

    /// Moves the issue to `target` and refreshes `updated_at`.
    ///
    /// Callers must have an approval from
    /// [`gate::authorize_transition`](crate::gate::authorize_transition)
    /// for this exact `(actor, issue, target)` triple; no rule is
    /// re-evaluated here.
    pub fn apply_transition(&mut self, target: IssueStatus, now: DateTime<Utc>) {
        self.status = target;
        self.updated_at = now;
    }

    /// Binds `assignee_id` and forces the status back to `Assigned`.
    ///
    /// The reset is unconditional: an issue in `InProgress` or `Review`
    /// drops back to `Assigned`, and re-assigning the current assignee
    /// still resets the status. Callers must have an approval from
    /// [`gate::authorize_assignment`](crate::gate::authorize_assignment).
    pub fn apply_assignment(&mut self, assignee_id: Uuid, now: DateTime<Utc>) {
        self.assigned_to = Some(assignee_id);
        self.status = IssueStatus::Assigned;
        self.updated_at = now;
    }
}
