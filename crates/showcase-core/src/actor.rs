//! The authenticated caller of an operation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Platform-wide role. Ordered by privilege.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  #[default]
  User,
  Admin,
  SuperAdmin,
}

/// Who is performing an operation. Built once per request by the
/// authorization layer and handed to every store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
  pub id:   Uuid,
  pub role: Role,
}

impl ActorContext {
  pub fn new(id: Uuid, role: Role) -> Self { Self { id, role } }

  pub fn is_admin(&self) -> bool { self.role >= Role::Admin }

  /// Fail with [`Error::Forbidden`] unless the actor holds at least `role`.
  pub fn require(&self, role: Role) -> Result<()> {
    if self.role >= role {
      Ok(())
    } else {
      Err(Error::forbidden(format!("requires role {role:?}")))
    }
  }
}

/// Which path an operation is taken through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
  /// Self-service: ownership checks apply.
  Owner,
  /// Admin console: requires [`Role::Admin`], skips ownership checks and
  /// records an audit entry.
  Moderator,
}

impl Authority {
  /// Check the actor may use this path at all.
  pub fn admit(self, actor: &ActorContext) -> Result<()> {
    match self {
      Self::Owner => Ok(()),
      Self::Moderator => actor.require(Role::Admin),
    }
  }

  pub fn is_moderator(self) -> bool { matches!(self, Self::Moderator) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn roles_are_ordered_by_privilege() {
    assert!(Role::SuperAdmin > Role::Admin);
    assert!(Role::Admin > Role::User);
  }

  #[test]
  fn moderator_path_requires_admin() {
    let user = ActorContext::new(Uuid::new_v4(), Role::User);
    let admin = ActorContext::new(Uuid::new_v4(), Role::Admin);

    assert!(Authority::Owner.admit(&user).is_ok());
    assert!(matches!(
      Authority::Moderator.admit(&user),
      Err(Error::Forbidden(_))
    ));
    assert!(Authority::Moderator.admit(&admin).is_ok());
  }

  #[test]
  fn super_admin_satisfies_admin_requirement() {
    let actor = ActorContext::new(Uuid::new_v4(), Role::SuperAdmin);
    assert!(actor.is_admin());
    assert!(actor.require(Role::Admin).is_ok());
  }
}
