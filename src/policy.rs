//! Access-control policy: one function over an enumerated table instead of a
//! permission-class hierarchy. Handlers ask `permits(actor, action, resource,
//! is_owner)` after the auth middleware has established identity; anonymous
//! requests never reach it because write routes are behind the middleware.

use crate::models::{User, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Category,
    Genre,
    Title,
    Review,
    Comment,
    User,
}

/// The identity facts a permission decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub role: UserRole,
    pub is_superuser: bool,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor {
            role: user.role,
            is_superuser: user.is_superuser,
        }
    }
}

/// The policy table. Superuser satisfies every check regardless of role.
pub fn permits(actor: Actor, action: Action, resource: Resource, is_owner: bool) -> bool {
    if actor.is_superuser {
        return true;
    }

    use Action::*;
    use Resource::*;

    match (actor.role, resource, action) {
        (UserRole::Admin, _, _) => true,

        // Moderators manage user-generated content, nothing else.
        (UserRole::Moderator, Review | Comment, _) => true,
        (UserRole::Moderator, Category | Genre | Title, Read) => true,
        (UserRole::Moderator, _, _) => false,

        // Plain users: read, write their own reviews/comments.
        (UserRole::User, Category | Genre | Title, Read) => true,
        (UserRole::User, Review | Comment, Read | Create) => true,
        (UserRole::User, Review | Comment, Update | Delete) => is_owner,
        (UserRole::User, _, _) => false,
    }
}

/// Policy check as used by handlers: deny becomes a 403.
pub fn require(
    actor: Actor,
    action: Action,
    resource: Resource,
    is_owner: bool,
) -> Result<(), crate::error::HttpError> {
    if permits(actor, action, resource, is_owner) {
        Ok(())
    } else {
        Err(crate::error::HttpError::forbidden(
            crate::error::ErrorMessage::PermissionDenied.to_string(),
        ))
    }
}
