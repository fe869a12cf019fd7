//! Bounded in-memory store.

use std::collections::HashMap;
use std::sync::RwLock;

use psync_core::issue::IssueStatus;
use psync_core::{Issue, Project, User};
use uuid::Uuid;

use super::{IssueStore, ProjectStore, StoreError, UserStore};

/// Maximum records held per collection.
///
/// In-memory storage is for tests and embedding callers; the cap keeps a
/// runaway caller from exhausting memory. Inserts past the cap fail, they
/// never evict (this is a system of record, not a cache).
pub const MAX_RECORDS: usize = 10_000;

#[derive(Debug, Default)]
struct Collections {
    issues: HashMap<Uuid, Issue>,
    projects: HashMap<Uuid, Project>,
    users: HashMap<Uuid, User>,
}

/// In-memory implementation of all three store traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Collections>, StoreError> {
        self.inner.read().map_err(|_| StoreError::Backend {
            message: "store lock poisoned".to_string(),
        })
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Collections>, StoreError> {
        self.inner.write().map_err(|_| StoreError::Backend {
            message: "store lock poisoned".to_string(),
        })
    }
}

/// Sorts by creation time, breaking ties by id for a deterministic order.
fn sorted<T, K>(mut records: Vec<T>, key: K) -> Vec<T>
where
    K: Fn(&T) -> (chrono::DateTime<chrono::Utc>, Uuid),
{
    records.sort_by_key(|record| key(record));
    records
}

impl IssueStore for MemoryStore {
    fn load(&self, id: Uuid) -> Result<Option<Issue>, StoreError> {
        Ok(self.read()?.issues.get(&id).cloned())
    }

    fn insert(&self, issue: &Issue) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.issues.contains_key(&issue.id) {
            return Err(StoreError::DuplicateId { id: issue.id });
        }
        if inner.issues.len() >= MAX_RECORDS {
            return Err(StoreError::Backend {
                message: "issue capacity exhausted".to_string(),
            });
        }
        inner.issues.insert(issue.id, issue.clone());
        Ok(())
    }

    fn update(&self, issue: &Issue, expected_status: IssueStatus) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let stored = inner
            .issues
            .get_mut(&issue.id)
            .ok_or(StoreError::IssueNotFound { id: issue.id })?;
        if stored.status != expected_status {
            return Err(StoreError::StatusConflict {
                id: issue.id,
                expected: expected_status,
                actual: stored.status,
            });
        }
        *stored = issue.clone();
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<Issue>, StoreError> {
        let issues = self.read()?.issues.values().cloned().collect();
        Ok(sorted(issues, |i: &Issue| (i.created_at, i.id)))
    }

    fn list_assigned_to(&self, user_id: Uuid) -> Result<Vec<Issue>, StoreError> {
        let issues = self
            .read()?
            .issues
            .values()
            .filter(|issue| issue.assigned_to == Some(user_id))
            .cloned()
            .collect();
        Ok(sorted(issues, |i: &Issue| (i.created_at, i.id)))
    }

    fn list_created_by(&self, user_id: Uuid) -> Result<Vec<Issue>, StoreError> {
        let issues = self
            .read()?
            .issues
            .values()
            .filter(|issue| issue.created_by == user_id)
            .cloned()
            .collect();
        Ok(sorted(issues, |i: &Issue| (i.created_at, i.id)))
    }

    fn list_with_status(&self, status: IssueStatus) -> Result<Vec<Issue>, StoreError> {
        let issues = self
            .read()?
            .issues
            .values()
            .filter(|issue| issue.status == status)
            .cloned()
            .collect();
        Ok(sorted(issues, |i: &Issue| (i.created_at, i.id)))
    }

    fn list_for_project(&self, project_id: Uuid) -> Result<Vec<Issue>, StoreError> {
        let issues = self
            .read()?
            .issues
            .values()
            .filter(|issue| issue.project_id == project_id)
            .cloned()
            .collect();
        Ok(sorted(issues, |i: &Issue| (i.created_at, i.id)))
    }
}

impl ProjectStore for MemoryStore {
    fn load(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        Ok(self.read()?.projects.get(&id).cloned())
    }

    fn insert(&self, project: &Project) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.projects.contains_key(&project.id) {
            return Err(StoreError::DuplicateId { id: project.id });
        }
        if inner.projects.len() >= MAX_RECORDS {
            return Err(StoreError::Backend {
                message: "project capacity exhausted".to_string(),
            });
        }
        inner.projects.insert(project.id, project.clone());
        Ok(())
    }

    fn update(&self, project: &Project) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        match inner.projects.get_mut(&project.id) {
            Some(stored) => {
                *stored = project.clone();
                Ok(())
            }
            None => Err(StoreError::Backend {
                message: format!("project not found: {}", project.id),
            }),
        }
    }

    fn list_active(&self) -> Result<Vec<Project>, StoreError> {
        let projects = self
            .read()?
            .projects
            .values()
            .filter(|project| project.is_active)
            .cloned()
            .collect();
        Ok(sorted(projects, |p: &Project| (p.created_at, p.id)))
    }

    fn list_all(&self) -> Result<Vec<Project>, StoreError> {
        let projects = self.read()?.projects.values().cloned().collect();
        Ok(sorted(projects, |p: &Project| (p.created_at, p.id)))
    }
}

impl UserStore for MemoryStore {
    fn load(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    fn insert(&self, user: &User) -> Result<(), StoreError> {
        // All uniqueness checks happen under the same write lock as the
        // insert, so two racing registrations cannot both pass them.
        let mut inner = self.write()?;
        if inner.users.contains_key(&user.id) {
            return Err(StoreError::DuplicateId { id: user.id });
        }
        if inner.users.len() >= MAX_RECORDS {
            return Err(StoreError::Backend {
                message: "user capacity exhausted".to_string(),
            });
        }
        if user.role.is_manager() && inner.users.values().any(|u| u.role.is_manager()) {
            return Err(StoreError::ManagerSeatTaken);
        }
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail {
                email: user.email.clone(),
            });
        }
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::DuplicateUsername {
                username: user.username.clone(),
            });
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    fn list_active(&self) -> Result<Vec<User>, StoreError> {
        let users = self
            .read()?
            .users
            .values()
            .filter(|user| user.is_active)
            .cloned()
            .collect();
        Ok(sorted(users, |u: &User| (u.created_at, u.id)))
    }

    fn manager_exists(&self) -> Result<bool, StoreError> {
        Ok(self.read()?.users.values().any(|u| u.role.is_manager()))
    }

    fn user_count(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.users.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use psync_core::identity::Role;
    use psync_core::issue::{IssueKind, IssuePriority};

    use super::*;

    fn user(role: Role, email: &str, username: &str) -> User {
        User::new(Uuid::new_v4(), email, username, role, Utc::now())
    }

    fn issue() -> Issue {
        Issue::new(
            Uuid::new_v4(),
            "t",
            None,
            IssuePriority::Low,
            IssueKind::Task,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Utc::now(),
        )
    }

    #[test]
    fn second_manager_insert_is_refused() {
        let store = MemoryStore::new();
        UserStore::insert(&store, &user(Role::ProjectManager, "a@x.io", "a")).unwrap();

        let err = UserStore::insert(&store, &user(Role::ProjectManager, "b@x.io", "b"))
            .unwrap_err();
        assert_eq!(err, StoreError::ManagerSeatTaken);
    }

    #[test]
    fn duplicate_email_is_refused() {
        let store = MemoryStore::new();
        UserStore::insert(&store, &user(Role::Developer, "a@x.io", "a")).unwrap();

        let err = UserStore::insert(&store, &user(Role::Designer, "a@x.io", "b")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail { .. }));
    }

    #[test]
    fn status_cas_refuses_stale_writes() {
        let store = MemoryStore::new();
        let mut stored = issue();
        IssueStore::insert(&store, &stored).unwrap();

        // Another writer moves the issue first.
        let mut racer = stored.clone();
        racer.apply_assignment(Uuid::new_v4(), Utc::now());
        IssueStore::update(&store, &racer, IssueStatus::Open).unwrap();

        // Our write decided over Open, which is no longer the stored status.
        stored.apply_transition(IssueStatus::Completed, Utc::now());
        let err = IssueStore::update(&store, &stored, IssueStatus::Open).unwrap_err();
        assert!(matches!(
            err,
            StoreError::StatusConflict {
                expected: IssueStatus::Open,
                actual: IssueStatus::Assigned,
                ..
            }
        ));
    }
}
