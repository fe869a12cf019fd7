//! Registration role policy.

use super::error::RegistrationError;
use super::role::Role;

/// Resolves the role a new registration actually receives.
///
/// - If no users exist yet, the registrant takes the manager seat no matter
///   which role they asked for.
/// - If the manager seat is occupied, asking for it is rejected.
/// - Developer and Designer requests pass through unchanged.
///
/// This function is the pure decision half; the storage layer enforces the
/// single-manager invariant atomically at insert time so that two
/// concurrent registrations cannot both seat a manager.
///
/// # Errors
///
/// Returns [`RegistrationError::ManagerSeatTaken`] when the manager role is
/// requested while a manager already exists.
pub const fn resolve_registration_role(
    requested: Role,
    any_users: bool,
    manager_exists: bool,
) -> Result<Role, RegistrationError> {
    if !any_users {
        return Ok(Role::ProjectManager);
    }
    if matches!(requested, Role::ProjectManager) && manager_exists {
        return Err(RegistrationError::ManagerSeatTaken);
    }
    Ok(requested)
}
