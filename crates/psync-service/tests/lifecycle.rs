//! End-to-end lifecycle tests over the in-memory store.

use std::sync::Arc;

use psync_core::identity::Role;
use psync_core::issue::{IssueKind, IssuePriority, IssueStatus};
use psync_core::{Denial, User};
use psync_service::{
    MemoryStore, NewIssue, NewProject, NewUser, ProjectEdit, ServiceError, StaticTokenResolver,
    SyncService,
};
use uuid::Uuid;

struct Harness {
    service: SyncService,
    resolver: Arc<StaticTokenResolver>,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let resolver = Arc::new(StaticTokenResolver::new());
        let service = SyncService::with_store(store, Arc::clone(&resolver) as _);
        Self { service, resolver }
    }

    /// Registers a user and mints a bearer token for them.
    fn register(&self, email: &str, username: &str, role: Role) -> (User, String) {
        let user = self
            .service
            .register_user(NewUser {
                email: email.to_string(),
                username: username.to_string(),
                requested_role: role,
            })
            .expect("registration should succeed");
        let token = format!("tok-{username}");
        self.resolver.insert_token(token.clone(), user.id);
        (user, token)
    }

    /// Standard cast: one manager, one developer, one designer, a project.
    fn with_cast(&self) -> Cast {
        let (manager, manager_tok) = self.register("pm@example.com", "pm", Role::ProjectManager);
        let (dev, dev_tok) = self.register("dev@example.com", "dev", Role::Developer);
        let (designer, designer_tok) =
            self.register("designer@example.com", "designer", Role::Designer);
        let project = self
            .service
            .create_project(
                &manager_tok,
                NewProject {
                    title: "atlas".to_string(),
                    description: None,
                },
            )
            .expect("project creation should succeed");
        Cast {
            manager,
            manager_tok,
            dev,
            dev_tok,
            designer,
            designer_tok,
            project_id: project.id,
        }
    }
}

struct Cast {
    manager: User,
    manager_tok: String,
    dev: User,
    dev_tok: String,
    designer: User,
    designer_tok: String,
    project_id: Uuid,
}

impl Cast {
    fn new_issue(&self, service: &SyncService, title: &str) -> Uuid {
        service
            .create_issue(
                &self.dev_tok,
                NewIssue {
                    title: title.to_string(),
                    description: None,
                    priority: IssuePriority::Medium,
                    kind: IssueKind::Task,
                    project_id: self.project_id,
                },
            )
            .expect("issue creation should succeed")
            .id
    }
}

const ALL_STATUSES: [IssueStatus; 5] = [
    IssueStatus::Open,
    IssueStatus::Assigned,
    IssueStatus::InProgress,
    IssueStatus::Review,
    IssueStatus::Completed,
];

// =============================================================================
// Status changes
// =============================================================================

#[test]
fn open_issue_refuses_every_non_manager_move() {
    let h = Harness::new();
    let cast = h.with_cast();
    let issue_id = cast.new_issue(&h.service, "unassigned");

    // Even as creator, the developer cannot touch an Open issue: it is not
    // assigned to them, so ownership fails first.
    for target in ALL_STATUSES {
        let err = h
            .service
            .request_status_change(&cast.dev_tok, issue_id, target)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)), "{target}");
    }

    // Assign to the developer, force back to Open via the manager, and the
    // denial becomes the assignment-pending one.
    h.service
        .request_assignment(&cast.manager_tok, issue_id, cast.dev.id)
        .unwrap();
    h.service
        .request_status_change(&cast.manager_tok, issue_id, IssueStatus::Open)
        .unwrap();
    let err = h
        .service
        .request_status_change(&cast.dev_tok, issue_id, IssueStatus::InProgress)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Forbidden(Denial::AwaitingAssignment { .. })
    ));
}

#[test]
fn non_manager_can_never_complete() {
    let h = Harness::new();
    let cast = h.with_cast();
    let issue_id = cast.new_issue(&h.service, "no shortcuts");
    h.service
        .request_assignment(&cast.manager_tok, issue_id, cast.dev.id)
        .unwrap();

    // Walk the issue through every working status; Completed stays out of
    // reach at each step.
    for via in [None, Some(IssueStatus::InProgress), Some(IssueStatus::Review)] {
        if let Some(next) = via {
            h.service
                .request_status_change(&cast.dev_tok, issue_id, next)
                .unwrap();
        }
        let err = h
            .service
            .request_status_change(&cast.dev_tok, issue_id, IssueStatus::Completed)
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Forbidden(Denial::CompletionRequiresManager { .. })
        ));
    }
}

#[test]
fn manager_moves_never_hit_the_workflow_table() {
    let h = Harness::new();
    let cast = h.with_cast();
    let issue_id = cast.new_issue(&h.service, "managed directly");

    for from in ALL_STATUSES {
        for to in ALL_STATUSES {
            // Put the issue into `from` (a bypass move itself), then jump
            // to `to`. Neither may return InvalidTransition.
            h.service
                .request_status_change(&cast.manager_tok, issue_id, from)
                .unwrap_or_else(|e| panic!("seeding {from}: {e}"));
            let moved = h
                .service
                .request_status_change(&cast.manager_tok, issue_id, to)
                .unwrap_or_else(|e| panic!("{from} -> {to}: {e}"));
            assert_eq!(moved.status, to);
        }
    }
}

#[test]
fn open_to_completed_in_one_manager_move() {
    let h = Harness::new();
    let cast = h.with_cast();
    let issue_id = cast.new_issue(&h.service, "fast-tracked");

    let issue = h
        .service
        .request_status_change(&cast.manager_tok, issue_id, IssueStatus::Completed)
        .unwrap();
    assert_eq!(issue.status, IssueStatus::Completed);
    assert!(issue.assigned_to.is_none());
}

#[test]
fn assignee_walks_the_workflow_and_manager_completes() {
    let h = Harness::new();
    let cast = h.with_cast();
    let issue_id = cast.new_issue(&h.service, "login button");
    h.service
        .request_assignment(&cast.manager_tok, issue_id, cast.dev.id)
        .unwrap();

    h.service
        .request_status_change(&cast.dev_tok, issue_id, IssueStatus::InProgress)
        .unwrap();
    let issue = h
        .service
        .request_status_change(&cast.dev_tok, issue_id, IssueStatus::Review)
        .unwrap();
    assert_eq!(issue.status, IssueStatus::Review);

    let err = h
        .service
        .request_status_change(&cast.dev_tok, issue_id, IssueStatus::Completed)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Forbidden(Denial::CompletionRequiresManager { .. })
    ));

    let issue = h
        .service
        .request_status_change(&cast.manager_tok, issue_id, IssueStatus::Completed)
        .unwrap();
    assert_eq!(issue.status, IssueStatus::Completed);
}

#[test]
fn non_assignee_is_refused_even_inside_the_workflow() {
    let h = Harness::new();
    let cast = h.with_cast();
    let issue_id = cast.new_issue(&h.service, "someone else's work");
    h.service
        .request_assignment(&cast.manager_tok, issue_id, cast.dev.id)
        .unwrap();

    // InProgress would be a legal move for the assignee; the designer is
    // turned away on ownership before the table is consulted.
    let err = h
        .service
        .request_status_change(&cast.designer_tok, issue_id, IssueStatus::InProgress)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Forbidden(Denial::NotAssignee { .. })
    ));
}

#[test]
fn workflow_violations_surface_as_invalid_transition() {
    let h = Harness::new();
    let cast = h.with_cast();
    let issue_id = cast.new_issue(&h.service, "no skipping review");
    h.service
        .request_assignment(&cast.manager_tok, issue_id, cast.dev.id)
        .unwrap();

    // Assigned -> Review skips InProgress.
    let err = h
        .service
        .request_status_change(&cast.dev_tok, issue_id, IssueStatus::Review)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidTransition {
            from: IssueStatus::Assigned,
            to: IssueStatus::Review,
        }
    ));
}

#[test]
fn missing_issue_is_not_found() {
    let h = Harness::new();
    let cast = h.with_cast();

    let err = h
        .service
        .request_status_change(&cast.manager_tok, Uuid::new_v4(), IssueStatus::Review)
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

// =============================================================================
// Assignment
// =============================================================================

#[test]
fn assignment_is_manager_only_from_any_state() {
    let h = Harness::new();
    let cast = h.with_cast();
    let issue_id = cast.new_issue(&h.service, "covetable");

    for seed in ALL_STATUSES {
        h.service
            .request_status_change(&cast.manager_tok, issue_id, seed)
            .unwrap();
        for tok in [&cast.dev_tok, &cast.designer_tok] {
            let err = h
                .service
                .request_assignment(tok, issue_id, cast.dev.id)
                .unwrap_err();
            assert!(
                matches!(err, ServiceError::Forbidden(Denial::ManagerRequired)),
                "{seed}"
            );
        }
    }
}

#[test]
fn assignment_resets_in_progress_work() {
    let h = Harness::new();
    let cast = h.with_cast();
    let issue_id = cast.new_issue(&h.service, "handed over");
    h.service
        .request_assignment(&cast.manager_tok, issue_id, cast.dev.id)
        .unwrap();
    h.service
        .request_status_change(&cast.dev_tok, issue_id, IssueStatus::InProgress)
        .unwrap();

    let issue = h
        .service
        .request_assignment(&cast.manager_tok, issue_id, cast.designer.id)
        .unwrap();
    assert_eq!(issue.status, IssueStatus::Assigned);
    assert_eq!(issue.assigned_to, Some(cast.designer.id));
}

#[test]
fn reassigning_the_same_person_still_resets_status() {
    let h = Harness::new();
    let cast = h.with_cast();
    let issue_id = cast.new_issue(&h.service, "observable reset");
    h.service
        .request_assignment(&cast.manager_tok, issue_id, cast.dev.id)
        .unwrap();
    h.service
        .request_status_change(&cast.dev_tok, issue_id, IssueStatus::InProgress)
        .unwrap();
    h.service
        .request_status_change(&cast.dev_tok, issue_id, IssueStatus::Review)
        .unwrap();

    let issue = h
        .service
        .request_assignment(&cast.manager_tok, issue_id, cast.dev.id)
        .unwrap();
    assert_eq!(issue.status, IssueStatus::Assigned);
    assert_eq!(issue.assigned_to, Some(cast.dev.id));
}

#[test]
fn assignment_to_missing_user_is_not_found() {
    let h = Harness::new();
    let cast = h.with_cast();
    let issue_id = cast.new_issue(&h.service, "nobody home");

    let err = h
        .service
        .request_assignment(&cast.manager_tok, issue_id, Uuid::new_v4())
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

// =============================================================================
// Visibility
// =============================================================================

#[test]
fn manager_sees_all_others_see_assigned_only() {
    let h = Harness::new();
    let cast = h.with_cast();
    let a = cast.new_issue(&h.service, "a");
    let b = cast.new_issue(&h.service, "b");
    let _c = cast.new_issue(&h.service, "c");
    h.service
        .request_assignment(&cast.manager_tok, a, cast.dev.id)
        .unwrap();
    h.service
        .request_assignment(&cast.manager_tok, b, cast.designer.id)
        .unwrap();

    let manager_view = h
        .service
        .list_issues_visible_to(&cast.manager_tok)
        .unwrap();
    assert_eq!(manager_view.len(), 3);

    let dev_view = h.service.list_issues_visible_to(&cast.dev_tok).unwrap();
    assert_eq!(dev_view.len(), 1);
    assert_eq!(dev_view[0].issue.id, a);
    assert_eq!(dev_view[0].assignee_name.as_deref(), Some("dev"));
    assert_eq!(dev_view[0].project_title, "atlas");
    assert_eq!(dev_view[0].creator_name, "dev");

    let designer_view = h
        .service
        .list_issues_visible_to(&cast.designer_tok)
        .unwrap();
    assert_eq!(designer_view.len(), 1);
    assert_eq!(designer_view[0].issue.id, b);
}

#[test]
fn created_issue_listing_follows_the_creator() {
    let h = Harness::new();
    let cast = h.with_cast();
    cast.new_issue(&h.service, "mine");
    cast.new_issue(&h.service, "also mine");

    let created = h.service.list_created_issues(&cast.dev_tok).unwrap();
    assert_eq!(created.len(), 2);

    let none = h.service.list_created_issues(&cast.designer_tok).unwrap();
    assert!(none.is_empty());
}

#[test]
fn open_issue_listing_is_manager_only() {
    let h = Harness::new();
    let cast = h.with_cast();
    let open_id = cast.new_issue(&h.service, "still open");
    let assigned_id = cast.new_issue(&h.service, "taken");
    h.service
        .request_assignment(&cast.manager_tok, assigned_id, cast.dev.id)
        .unwrap();

    let open = h.service.list_open_issues(&cast.manager_tok).unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].issue.id, open_id);

    let err = h.service.list_open_issues(&cast.dev_tok).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Forbidden(Denial::ManagerRequired)
    ));
}

// =============================================================================
// Registration and users
// =============================================================================

#[test]
fn first_registration_takes_the_manager_seat() {
    let h = Harness::new();
    let (user, _) = h.register("first@example.com", "first", Role::Developer);
    assert_eq!(user.role, Role::ProjectManager);
}

#[test]
fn second_manager_registration_is_rejected() {
    let h = Harness::new();
    h.register("pm@example.com", "pm", Role::ProjectManager);

    let err = h
        .service
        .register_user(NewUser {
            email: "usurper@example.com".to_string(),
            username: "usurper".to_string(),
            requested_role: Role::ProjectManager,
        })
        .unwrap_err();
    assert!(matches!(err, ServiceError::Registration(_)));
}

#[test]
fn duplicate_email_and_username_are_rejected() {
    let h = Harness::new();
    h.register("pm@example.com", "pm", Role::ProjectManager);

    let err = h
        .service
        .register_user(NewUser {
            email: "pm@example.com".to_string(),
            username: "someone-else".to_string(),
            requested_role: Role::Developer,
        })
        .unwrap_err();
    assert!(matches!(err, ServiceError::Registration(_)));

    let err = h
        .service
        .register_user(NewUser {
            email: "new@example.com".to_string(),
            username: "pm".to_string(),
            requested_role: Role::Developer,
        })
        .unwrap_err();
    assert!(matches!(err, ServiceError::Registration(_)));
}

#[test]
fn user_listing_is_manager_only() {
    let h = Harness::new();
    let cast = h.with_cast();

    let users = h.service.list_users(&cast.manager_tok).unwrap();
    assert_eq!(users.len(), 3);

    let err = h.service.list_users(&cast.dev_tok).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Forbidden(Denial::ManagerRequired)
    ));
}

#[test]
fn unknown_credentials_are_unauthorized() {
    let h = Harness::new();
    h.with_cast();

    let err = h.service.list_issues_visible_to("tok-nobody").unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized));
}

#[test]
fn current_user_returns_the_callers_record() {
    let h = Harness::new();
    let cast = h.with_cast();

    let me = h.service.current_user(&cast.dev_tok).unwrap();
    assert_eq!(me.id, cast.dev.id);
    assert_eq!(me.role, Role::Developer);
}

// =============================================================================
// Projects
// =============================================================================

#[test]
fn project_creation_is_manager_only() {
    let h = Harness::new();
    let cast = h.with_cast();

    let err = h
        .service
        .create_project(
            &cast.dev_tok,
            NewProject {
                title: "shadow".to_string(),
                description: None,
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Forbidden(Denial::ManagerRequired)
    ));
}

#[test]
fn project_edit_requires_the_owner_and_updates_fields() {
    let h = Harness::new();
    let cast = h.with_cast();

    let err = h
        .service
        .update_project(
            &cast.dev_tok,
            cast.project_id,
            ProjectEdit {
                title: "renamed".to_string(),
                description: None,
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Forbidden(Denial::ManagerRequired)
    ));

    let project = h
        .service
        .update_project(
            &cast.manager_tok,
            cast.project_id,
            ProjectEdit {
                title: "atlas v2".to_string(),
                description: Some("second iteration".to_string()),
            },
        )
        .unwrap();
    assert_eq!(project.title, "atlas v2");
    assert_eq!(project.description.as_deref(), Some("second iteration"));
    assert_eq!(project.manager_id, cast.manager.id);
}

#[test]
fn project_summaries_count_issue_progress() {
    let h = Harness::new();
    let cast = h.with_cast();
    let a = cast.new_issue(&h.service, "a");
    let _b = cast.new_issue(&h.service, "b");
    h.service
        .request_status_change(&cast.manager_tok, a, IssueStatus::Completed)
        .unwrap();

    let summaries = h.service.list_projects(&cast.dev_tok).unwrap();
    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.issue_count, 2);
    assert_eq!(summary.completed_count, 1);
    assert_eq!(summary.outstanding_count, 1);
    assert_eq!(summary.manager_name, "pm");
}

#[test]
fn issue_creation_requires_an_existing_project() {
    let h = Harness::new();
    let cast = h.with_cast();

    let err = h
        .service
        .create_issue(
            &cast.dev_tok,
            NewIssue {
                title: "orphan".to_string(),
                description: None,
                priority: IssuePriority::Low,
                kind: IssueKind::Bug,
                project_id: Uuid::new_v4(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

// =============================================================================
// Dashboard
// =============================================================================

#[test]
fn dashboard_counts_and_recency() {
    let h = Harness::new();
    let cast = h.with_cast();
    for n in 0..7 {
        cast.new_issue(&h.service, &format!("issue-{n}"));
    }
    let completed = cast.new_issue(&h.service, "done");
    h.service
        .request_status_change(&cast.manager_tok, completed, IssueStatus::Completed)
        .unwrap();

    let stats = h.service.dashboard_stats().unwrap();
    assert_eq!(stats.total_projects, 1);
    assert_eq!(stats.total_issues, 8);
    assert_eq!(stats.open_issues, 7);
    assert_eq!(stats.completed_issues, 1);
    assert_eq!(stats.recent_issues.len(), 5);
    assert_eq!(stats.recent_projects.len(), 1);
}
