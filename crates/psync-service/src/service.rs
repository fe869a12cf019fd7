//! The operations layer.
//!
//! [`SyncService`] wires the credential resolver, the stores, and the
//! kernel's gate into the request-shaped operations a transport layer
//! would expose. Every operation is stateless and short-lived: records
//! are read fresh, the gate decides, and at most one write is committed.

use std::sync::Arc;

use chrono::Utc;
use psync_core::gate;
use psync_core::identity::{resolve_registration_role, Capability, Role};
use psync_core::issue::{IssueKind, IssuePriority, IssueStatus};
use psync_core::{Denial, Issue, Project, User};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::CredentialResolver;
use crate::error::{ResourceKind, ServiceError};
use crate::store::{IssueStore, ProjectStore, UserStore};
use crate::views::{DashboardStats, IssueDetails, ProjectSummary};

/// How many records the dashboard's recency lists carry.
const DASHBOARD_RECENT_LIMIT: usize = 5;

/// A registration request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    /// Unique email address.
    pub email: String,
    /// Unique display name.
    pub username: String,
    /// The role the registrant asked for. The first registration takes the
    /// manager seat regardless.
    pub requested_role: Role,
}

/// A project creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    /// Project title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
}

/// A project title/description edit.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectEdit {
    /// Replacement title.
    pub title: String,
    /// Replacement description.
    pub description: Option<String>,
}

/// An issue creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewIssue {
    /// Short summary.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Urgency.
    pub priority: IssuePriority,
    /// Kind of work.
    pub kind: IssueKind,
    /// The project this issue belongs to.
    pub project_id: Uuid,
}

/// The transport-agnostic operations of the tracker.
pub struct SyncService {
    issues: Arc<dyn IssueStore>,
    projects: Arc<dyn ProjectStore>,
    users: Arc<dyn UserStore>,
    credentials: Arc<dyn CredentialResolver>,
}

impl SyncService {
    /// Creates a service over explicit collaborators.
    #[must_use]
    pub fn new(
        issues: Arc<dyn IssueStore>,
        projects: Arc<dyn ProjectStore>,
        users: Arc<dyn UserStore>,
        credentials: Arc<dyn CredentialResolver>,
    ) -> Self {
        Self {
            issues,
            projects,
            users,
            credentials,
        }
    }

    /// Creates a service over a single store implementing all three store
    /// traits (both shipped stores do).
    #[must_use]
    pub fn with_store<S>(store: Arc<S>, credentials: Arc<dyn CredentialResolver>) -> Self
    where
        S: IssueStore + ProjectStore + UserStore + 'static,
    {
        Self::new(
            Arc::clone(&store) as Arc<dyn IssueStore>,
            Arc::clone(&store) as Arc<dyn ProjectStore>,
            store as Arc<dyn UserStore>,
            credentials,
        )
    }

    /// Resolves a bearer credential to its user record.
    ///
    /// A credential that resolves to a missing user is indistinguishable
    /// from an invalid credential, on purpose.
    fn authenticate(&self, credential: &str) -> Result<User, ServiceError> {
        let user_id = self
            .credentials
            .resolve(credential)
            .map_err(|_| ServiceError::Unauthorized)?;
        self.users
            .load(user_id)?
            .ok_or(ServiceError::Unauthorized)
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Registers a new identity.
    ///
    /// The first registration takes the manager seat regardless of the
    /// requested role; later manager requests are rejected while the seat
    /// is occupied. The store's insert is the authority under concurrent
    /// registration; the pre-checks here exist to produce precise errors.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Registration`] on duplicate email/username or an
    /// occupied manager seat.
    pub fn register_user(&self, registration: NewUser) -> Result<User, ServiceError> {
        if let Some(existing) = self.users.find_by_email(&registration.email)? {
            return Err(ServiceError::Registration(
                psync_core::identity::RegistrationError::DuplicateEmail {
                    email: existing.email,
                },
            ));
        }
        if let Some(existing) = self.users.find_by_username(&registration.username)? {
            return Err(ServiceError::Registration(
                psync_core::identity::RegistrationError::DuplicateUsername {
                    username: existing.username,
                },
            ));
        }

        let any_users = self.users.user_count()? > 0;
        let manager_exists = self.users.manager_exists()?;
        let role =
            resolve_registration_role(registration.requested_role, any_users, manager_exists)?;

        let user = User::new(
            Uuid::new_v4(),
            registration.email,
            registration.username,
            role,
            Utc::now(),
        );
        self.users.insert(&user)?;

        info!(
            user_id = %user.id,
            username = %user.username,
            role = %user.role,
            "registered user"
        );
        Ok(user)
    }

    /// Returns the authenticated user's own record.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Unauthorized`] if the credential does not resolve.
    pub fn current_user(&self, credential: &str) -> Result<User, ServiceError> {
        self.authenticate(credential)
    }

    /// Lists active users. Manager only.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Forbidden`] for non-manager callers.
    pub fn list_users(&self, credential: &str) -> Result<Vec<User>, ServiceError> {
        let actor = self.authenticate(credential)?;
        if !actor.role.can(Capability::ListUsers) {
            return Err(denied(&actor, Denial::ManagerRequired, "list users"));
        }
        Ok(self.users.list_active()?)
    }

    // =========================================================================
    // Projects
    // =========================================================================

    /// Creates a project owned by the calling manager.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Forbidden`] for non-manager callers.
    pub fn create_project(
        &self,
        credential: &str,
        project: NewProject,
    ) -> Result<Project, ServiceError> {
        let actor = self.authenticate(credential)?;
        if let Err(denial) = gate::authorize_project_creation(&actor) {
            return Err(denied(&actor, denial, "create project"));
        }

        let record = Project::new(
            Uuid::new_v4(),
            project.title,
            project.description,
            actor.id,
            Utc::now(),
        );
        self.projects.insert(&record)?;

        info!(project_id = %record.id, manager_id = %actor.id, "created project");
        Ok(record)
    }

    /// Loads a single project.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the id does not resolve.
    pub fn get_project(&self, credential: &str, project_id: Uuid) -> Result<Project, ServiceError> {
        self.authenticate(credential)?;
        self.projects
            .load(project_id)?
            .ok_or(ServiceError::NotFound {
                kind: ResourceKind::Project,
                id: project_id,
            })
    }

    /// Edits a project's title and description. Owning manager only.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the id does not resolve;
    /// [`ServiceError::Forbidden`] for non-managers and for a manager that
    /// does not own this project.
    pub fn update_project(
        &self,
        credential: &str,
        project_id: Uuid,
        edit: ProjectEdit,
    ) -> Result<Project, ServiceError> {
        let actor = self.authenticate(credential)?;
        let mut project = self
            .projects
            .load(project_id)?
            .ok_or(ServiceError::NotFound {
                kind: ResourceKind::Project,
                id: project_id,
            })?;

        if let Err(denial) = gate::authorize_project_edit(&actor, &project) {
            return Err(denied(&actor, denial, "update project"));
        }

        project.apply_edit(edit.title, edit.description, Utc::now());
        self.projects.update(&project)?;

        info!(project_id = %project.id, manager_id = %actor.id, "updated project");
        Ok(project)
    }

    /// Lists active projects with issue counts and manager names.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Unauthorized`] if the credential does not resolve.
    pub fn list_projects(&self, credential: &str) -> Result<Vec<ProjectSummary>, ServiceError> {
        self.authenticate(credential)?;

        let mut summaries = Vec::new();
        for project in self.projects.list_active()? {
            let issues = self.issues.list_for_project(project.id)?;
            let outstanding_count = issues
                .iter()
                .filter(|issue| issue.status.is_outstanding())
                .count();
            let manager_name = self
                .users
                .load(project.manager_id)?
                .map_or_else(|| "Unknown".to_string(), |user| user.username);

            summaries.push(ProjectSummary {
                issue_count: issues.len(),
                outstanding_count,
                completed_count: issues.len() - outstanding_count,
                manager_name,
                project,
            });
        }
        Ok(summaries)
    }

    // =========================================================================
    // Issues
    // =========================================================================

    /// Creates an `Open`, unassigned issue against an existing project.
    ///
    /// Any authenticated identity may create issues.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the project does not resolve.
    pub fn create_issue(&self, credential: &str, issue: NewIssue) -> Result<Issue, ServiceError> {
        let actor = self.authenticate(credential)?;
        self.projects
            .load(issue.project_id)?
            .ok_or(ServiceError::NotFound {
                kind: ResourceKind::Project,
                id: issue.project_id,
            })?;

        let record = Issue::new(
            Uuid::new_v4(),
            issue.title,
            issue.description,
            issue.priority,
            issue.kind,
            issue.project_id,
            actor.id,
            Utc::now(),
        );
        self.issues.insert(&record)?;

        info!(
            issue_id = %record.id,
            project_id = %record.project_id,
            created_by = %actor.id,
            "created issue"
        );
        Ok(record)
    }

    /// Binds an assignee to an issue, forcing its status back to
    /// `Assigned` whatever it was before. Manager only.
    ///
    /// The role check runs before the existence checks: a non-manager
    /// learns nothing about which issue ids exist. The assignee's active
    /// flag is deliberately not checked, and re-assigning the current
    /// assignee still resets the status.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Forbidden`] for non-manager callers;
    /// [`ServiceError::NotFound`] if the issue or assignee does not
    /// resolve; [`ServiceError::Conflict`] if the issue moved between the
    /// decision and the write.
    pub fn request_assignment(
        &self,
        credential: &str,
        issue_id: Uuid,
        assignee_id: Uuid,
    ) -> Result<Issue, ServiceError> {
        let actor = self.authenticate(credential)?;
        if let Err(denial) = gate::authorize_assignment(&actor) {
            return Err(denied(&actor, denial, "assign issue"));
        }

        let mut issue = self.issues.load(issue_id)?.ok_or(ServiceError::NotFound {
            kind: ResourceKind::Issue,
            id: issue_id,
        })?;
        let assignee = self.users.load(assignee_id)?.ok_or(ServiceError::NotFound {
            kind: ResourceKind::User,
            id: assignee_id,
        })?;

        let expected = issue.status;
        issue.apply_assignment(assignee.id, Utc::now());
        self.issues.update(&issue, expected)?;

        info!(
            issue_id = %issue.id,
            assignee_id = %assignee.id,
            previous_status = %expected,
            "assigned issue"
        );
        Ok(issue)
    }

    /// Moves an issue to `target` if the gate approves.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the issue does not resolve;
    /// [`ServiceError::Forbidden`] on a role/ownership denial;
    /// [`ServiceError::InvalidTransition`] when the workflow table forbids
    /// the move for a non-manager assignee; [`ServiceError::Conflict`] if
    /// the issue moved between the decision and the write.
    pub fn request_status_change(
        &self,
        credential: &str,
        issue_id: Uuid,
        target: IssueStatus,
    ) -> Result<Issue, ServiceError> {
        let actor = self.authenticate(credential)?;
        let mut issue = self.issues.load(issue_id)?.ok_or(ServiceError::NotFound {
            kind: ResourceKind::Issue,
            id: issue_id,
        })?;

        if let Err(denial) = gate::authorize_transition(&actor, &issue, target) {
            return Err(denied(&actor, denial, "change issue status"));
        }

        let expected = issue.status;
        issue.apply_transition(target, Utc::now());
        self.issues.update(&issue, expected)?;

        info!(
            issue_id = %issue.id,
            actor_id = %actor.id,
            from = %expected,
            to = %target,
            "changed issue status"
        );
        Ok(issue)
    }

    /// Lists the issues the caller may see: everything for the manager,
    /// their assigned issues for everyone else.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Unauthorized`] if the credential does not resolve.
    pub fn list_issues_visible_to(
        &self,
        credential: &str,
    ) -> Result<Vec<IssueDetails>, ServiceError> {
        let actor = self.authenticate(credential)?;
        let issues = if actor.role.can(Capability::ViewAllIssues) {
            self.issues.list_all()?
        } else {
            self.issues.list_assigned_to(actor.id)?
        };
        self.with_details(issues)
    }

    /// Lists the issues the caller created, whoever they are assigned to.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Unauthorized`] if the credential does not resolve.
    pub fn list_created_issues(
        &self,
        credential: &str,
    ) -> Result<Vec<IssueDetails>, ServiceError> {
        let actor = self.authenticate(credential)?;
        let issues = self.issues.list_created_by(actor.id)?;
        self.with_details(issues)
    }

    /// Lists unassigned (`Open`) issues. Manager only.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Forbidden`] for non-manager callers.
    pub fn list_open_issues(&self, credential: &str) -> Result<Vec<IssueDetails>, ServiceError> {
        let actor = self.authenticate(credential)?;
        if !actor.role.can(Capability::ViewAllIssues) {
            return Err(denied(&actor, Denial::ManagerRequired, "list open issues"));
        }
        let issues = self.issues.list_with_status(IssueStatus::Open)?;
        self.with_details(issues)
    }

    /// System-wide counters and recency lists.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Store`] on storage failure.
    pub fn dashboard_stats(&self) -> Result<DashboardStats, ServiceError> {
        let issues = self.issues.list_all()?;
        let projects = self.projects.list_all()?;

        let open_issues = issues
            .iter()
            .filter(|issue| issue.status == IssueStatus::Open)
            .count();
        let completed_issues = issues
            .iter()
            .filter(|issue| issue.status.is_terminal())
            .count();
        let high_priority_issues = issues
            .iter()
            .filter(|issue| issue.priority == IssuePriority::High)
            .count();

        let mut recent_issues = issues.clone();
        recent_issues.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        recent_issues.truncate(DASHBOARD_RECENT_LIMIT);

        let mut recent_projects = projects.clone();
        recent_projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        recent_projects.truncate(DASHBOARD_RECENT_LIMIT);

        Ok(DashboardStats {
            total_projects: projects.len(),
            total_issues: issues.len(),
            open_issues,
            completed_issues,
            high_priority_issues,
            recent_issues,
            recent_projects,
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Resolves display names for a batch of issues.
    fn with_details(&self, issues: Vec<Issue>) -> Result<Vec<IssueDetails>, ServiceError> {
        issues
            .into_iter()
            .map(|issue| self.issue_details(issue))
            .collect()
    }

    fn issue_details(&self, issue: Issue) -> Result<IssueDetails, ServiceError> {
        let project_title = self
            .projects
            .load(issue.project_id)?
            .map_or_else(|| "Unknown".to_string(), |project| project.title);
        let assignee_name = match issue.assigned_to {
            Some(id) => self.users.load(id)?.map(|user| user.username),
            None => None,
        };
        let creator_name = self
            .users
            .load(issue.created_by)?
            .map_or_else(|| "Unknown".to_string(), |user| user.username);

        Ok(IssueDetails {
            issue,
            project_title,
            assignee_name,
            creator_name,
        })
    }
}

/// Logs a denial and converts it into its service error.
fn denied(actor: &User, denial: Denial, operation: &str) -> ServiceError {
    warn!(
        actor_id = %actor.id,
        role = %actor.role,
        reason = denial.reason_code(),
        operation,
        "request denied"
    );
    ServiceError::from_denial(denial)
}
