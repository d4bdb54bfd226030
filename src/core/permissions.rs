//! Access policies evaluated before any mutation.
//!
//! Endpoint-level checks only need to know whether a user is present;
//! object-level checks also compare the caller with the resource's author.
//! A failed check never has side effects: callers run it before touching
//! the database.

use crate::{
    entities::user,
    errors::{Error, Result},
};

/// What the caller is trying to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Safe methods (GET, HEAD, OPTIONS)
    Read,
    /// Anything that changes state
    Write,
}

/// Per-endpoint access policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Everyone may read; writing requires authentication
    AuthenticatedOrReadOnly,
    /// Everyone may read; writing requires being the author or staff
    AuthorOrStaffOrReadOnly,
    /// Nobody may write
    ReadOnly,
    /// Every method requires authentication
    Authenticated,
}

impl Policy {
    /// Endpoint-level check, before the target object is loaded.
    pub fn check(self, access: Access, viewer: Option<&user::Model>) -> Result<()> {
        match (self, access) {
            (Self::ReadOnly, Access::Write) => Err(Error::PermissionDenied),
            (
                Self::ReadOnly | Self::AuthenticatedOrReadOnly | Self::AuthorOrStaffOrReadOnly,
                Access::Read,
            ) => Ok(()),
            (_, _) if viewer.is_none() => Err(Error::NotAuthenticated),
            _ => Ok(()),
        }
    }

    /// Endpoint-level check for an operation that acts as a user, returning
    /// that user.
    pub fn acting_user(self, access: Access, viewer: Option<&user::Model>) -> Result<&user::Model> {
        self.check(access, viewer)?;
        viewer.ok_or(Error::NotAuthenticated)
    }

    /// Object-level check against the author of the target resource.
    pub fn check_object(
        self,
        access: Access,
        viewer: Option<&user::Model>,
        author_id: i32,
    ) -> Result<()> {
        self.check(access, viewer)?;

        match (self, access, viewer) {
            (Self::AuthorOrStaffOrReadOnly, Access::Write, Some(user))
                if user.id != author_id && !user.is_privileged() =>
            {
                Err(Error::PermissionDenied)
            }
            _ => Ok(()),
        }
    }
}
