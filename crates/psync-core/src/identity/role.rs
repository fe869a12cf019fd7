//! Roles and the declarative role → capability table.

use serde::{Deserialize, Serialize};

use super::error::UnknownRole;

/// The role an identity holds.
///
/// Exactly one identity in the system may hold [`Role::ProjectManager`];
/// see [`resolve_registration_role`](super::resolve_registration_role).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The single privileged role: assigns issues, bypasses the status
    /// workflow, completes issues, and owns projects.
    #[serde(rename = "PM")]
    ProjectManager,
    /// Works issues assigned to them.
    Developer,
    /// Works issues assigned to them.
    Designer,
}

impl Role {
    /// Parses a role from its wire string.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownRole`] if the string is not a recognized role.
    pub fn parse(s: &str) -> Result<Self, UnknownRole> {
        match s {
            "PM" => Ok(Self::ProjectManager),
            "Developer" => Ok(Self::Developer),
            "Designer" => Ok(Self::Designer),
            _ => Err(UnknownRole {
                value: s.to_string(),
            }),
        }
    }

    /// Returns the wire string for this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProjectManager => "PM",
            Self::Developer => "Developer",
            Self::Designer => "Designer",
        }
    }

    /// Returns `true` if this role holds the given capability.
    #[must_use]
    pub fn can(self, capability: Capability) -> bool {
        ROLE_CAPABILITIES
            .iter()
            .find(|(role, _)| *role == self)
            .is_some_and(|(_, caps)| caps.contains(&capability))
    }

    /// Returns `true` for the privileged manager role.
    #[must_use]
    pub const fn is_manager(self) -> bool {
        matches!(self, Self::ProjectManager)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named permission a role grants before any record state is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Capability {
    /// May bind an assignee to an issue (forcing its status back to
    /// `Assigned`).
    AssignIssues,
    /// May act on any issue regardless of who it is assigned to.
    ActOnAnyIssue,
    /// May move an issue to any status with no workflow-table check.
    ///
    /// This is deliberately unbounded: the holder can jump an issue straight
    /// from `Open` to `Completed`, skipping every intermediate status. The
    /// asymmetry (the workflow table binds everyone else) is inherited
    /// behavior, kept as a named override rather than folded into the table.
    BypassWorkflow,
    /// May move an issue into the terminal `Completed` status.
    CompleteIssues,
    /// May create projects and edit projects they manage.
    ManageProjects,
    /// Sees every issue; roles without this see only their assigned issues.
    ViewAllIssues,
    /// May list the registered users.
    ListUsers,
}

/// The role → capability table.
///
/// Only the manager role carries capabilities today; the table still earns
/// its keep by making that asymmetry explicit and unit-testable.
const ROLE_CAPABILITIES: &[(Role, &[Capability])] = &[
    (
        Role::ProjectManager,
        &[
            Capability::AssignIssues,
            Capability::ActOnAnyIssue,
            Capability::BypassWorkflow,
            Capability::CompleteIssues,
            Capability::ManageProjects,
            Capability::ViewAllIssues,
            Capability::ListUsers,
        ],
    ),
    (Role::Developer, &[]),
    (Role::Designer, &[]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_holds_every_capability() {
        for capability in [
            Capability::AssignIssues,
            Capability::ActOnAnyIssue,
            Capability::BypassWorkflow,
            Capability::CompleteIssues,
            Capability::ManageProjects,
            Capability::ViewAllIssues,
            Capability::ListUsers,
        ] {
            assert!(Role::ProjectManager.can(capability), "{capability:?}");
        }
    }

    #[test]
    fn non_manager_roles_hold_none() {
        for role in [Role::Developer, Role::Designer] {
            for capability in [
                Capability::AssignIssues,
                Capability::ActOnAnyIssue,
                Capability::BypassWorkflow,
                Capability::CompleteIssues,
                Capability::ManageProjects,
                Capability::ViewAllIssues,
                Capability::ListUsers,
            ] {
                assert!(!role.can(capability), "{role} {capability:?}");
            }
        }
    }

    #[test]
    fn parse_round_trips() {
        for role in [Role::ProjectManager, Role::Developer, Role::Designer] {
            assert_eq!(Role::parse(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = Role::parse("Admin").unwrap_err();
        assert_eq!(err.value, "Admin");
    }

    #[test]
    fn serde_uses_wire_strings() {
        let json = serde_json::to_string(&Role::ProjectManager).unwrap();
        assert_eq!(json, "\"PM\"");
        let back: Role = serde_json::from_str("\"Developer\"").unwrap();
        assert_eq!(back, Role::Developer);
    }
}
