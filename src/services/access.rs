//! Role-scoped access.
//!
//! Every authenticated request carries an [`Actor`]. Read paths over owned
//! tables take the actor's [`Scope`] and the repositories apply the owner
//! filter; write paths call [`Actor::require_staff`] or
//! [`Actor::require_admin`].

use serde::Serialize;

use crate::domain::Role;

use super::ServiceError;

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

/// Which rows of an owned table the caller may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Only rows whose owner column equals the user id.
    Own(String),
    All,
}

impl Scope {
    /// The owner id to filter on, or `None` when unrestricted.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::Own(user_id) => Some(user_id),
            Self::All => None,
        }
    }

    #[must_use]
    pub fn permits(&self, owner_id: &str) -> bool {
        self.owner().is_none_or(|id| id == owner_id)
    }
}

impl Actor {
    #[must_use]
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            role,
        }
    }

    #[must_use]
    pub fn scope(&self) -> Scope {
        if self.role.is_admin_or_staff() {
            Scope::All
        } else {
            Scope::Own(self.user_id.clone())
        }
    }

    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.role.is_admin_or_staff()
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    pub fn require_staff(&self) -> Result<(), ServiceError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "Admin or lab staff role required".to_string(),
            ))
        }
    }

    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("Admin role required".to_string()))
        }
    }

    /// Owner of a row, or staff.
    pub fn require_owner_or_staff(&self, owner_id: &str) -> Result<(), ServiceError> {
        if self.scope().permits(owner_id) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "You can only access your own records".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_scope_is_own_rows() {
        let student = Actor::new("u-1", "s@lab.local", Role::Student);
        assert_eq!(student.scope(), Scope::Own("u-1".to_string()));
        assert!(student.scope().permits("u-1"));
        assert!(!student.scope().permits("u-2"));
    }

    #[test]
    fn test_staff_scope_is_unrestricted() {
        for role in [Role::Admin, Role::LabStaff] {
            let actor = Actor::new("u-1", "x@lab.local", role);
            assert_eq!(actor.scope(), Scope::All);
            assert!(actor.scope().permits("someone-else"));
        }
    }

    #[test]
    fn test_write_gates() {
        let admin = Actor::new("a", "a@lab.local", Role::Admin);
        let staff = Actor::new("b", "b@lab.local", Role::LabStaff);
        let student = Actor::new("c", "c@lab.local", Role::Student);

        assert!(admin.require_admin().is_ok());
        assert!(staff.require_staff().is_ok());
        assert!(matches!(
            staff.require_admin(),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            student.require_staff(),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(student.require_owner_or_staff("c").is_ok());
        assert!(student.require_owner_or_staff("a").is_err());
    }
}
