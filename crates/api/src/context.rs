use stockwatch_auth::{Actor, AdminRole};
use stockwatch_core::AdminId;

/// Authenticated admin for a request.
///
/// Built by the auth middleware from the current stored account, so role
/// changes take effect on the next request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AdminContext {
    actor: Actor,
}

impl AdminContext {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> Actor {
        self.actor
    }

    pub fn admin_id(&self) -> AdminId {
        self.actor.id
    }

    pub fn role(&self) -> AdminRole {
        self.actor.role
    }
}
