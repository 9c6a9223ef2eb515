//! Authorization decisions. Every function here is pure: it looks only at the
//! acting user and the request, never at the database.

use bson::oid::ObjectId;
use pos_db::models::{Role, User};
use thiserror::Error;

/// The authenticated caller, as resolved from a verified token and a fresh user read.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub user_id: ObjectId,
    pub role: Role,
    pub tenant_id: Option<ObjectId>,
    pub is_superuser: bool,
}

impl Actor {
    pub fn new(user_id: ObjectId, user: &User) -> Self {
        Self {
            user_id,
            role: user.role,
            tenant_id: user.tenant_id,
            is_superuser: user.is_superuser,
        }
    }

    fn is_manager(&self) -> bool {
        self.is_superuser || self.role.is_manager()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Denied {
    #[error("You must be part of a tenant to do this")]
    NoTenant,
    #[error("{0}")]
    Forbidden(&'static str),
}

/// Which users an actor can see or act on.
#[derive(Debug, Clone, PartialEq)]
pub enum UserScope {
    All,
    Tenant(ObjectId),
    OnlySelf(ObjectId),
}

/// Which tenant-owned records (tenants, branches, invitations) an actor can see.
#[derive(Debug, Clone, PartialEq)]
pub enum TenantScope {
    All,
    Only(ObjectId),
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantBinding {
    /// The creator's tenant reference is set to the new tenant.
    Bind,
    /// The tenant is created without touching the creator.
    Unbound,
}

/// Role-pair table: may a holder of `assigner` hand out `target`?
///
/// Owners grant anything. Admins grant only roles below the managers.
pub fn can_assign(assigner: Role, target: Role) -> bool {
    match assigner {
        Role::Owner => true,
        Role::Admin => !target.is_manager(),
        Role::Staff | Role::Sales | Role::Purchase | Role::Accountant => false,
    }
}

fn assign(actor: &Actor, target: Role) -> Result<(), Denied> {
    if actor.is_superuser || can_assign(actor.role, target) {
        Ok(())
    } else {
        Err(Denied::Forbidden("cannot invite equal-or-higher privilege"))
    }
}

pub fn user_scope(actor: &Actor) -> UserScope {
    match (actor.is_superuser, actor.tenant_id) {
        (true, _) => UserScope::All,
        (false, Some(tenant_id)) => UserScope::Tenant(tenant_id),
        (false, None) => UserScope::OnlySelf(actor.user_id),
    }
}

pub fn tenant_scope(actor: &Actor) -> TenantScope {
    match (actor.is_superuser, actor.tenant_id) {
        (true, _) => TenantScope::All,
        (false, Some(tenant_id)) => TenantScope::Only(tenant_id),
        (false, None) => TenantScope::Nothing,
    }
}

/// Decides what creating a tenant does to its creator.
///
/// Superusers and owners are bound to the tenant they create. Moving an actor
/// that already belongs to a tenant is refused unless `allow_rebind` is set.
pub fn tenant_binding(actor: &Actor, allow_rebind: bool) -> Result<TenantBinding, Denied> {
    if !(actor.is_superuser || actor.role == Role::Owner) {
        return Ok(TenantBinding::Unbound);
    }
    if actor.tenant_id.is_some() && !allow_rebind {
        return Err(Denied::Forbidden("You already belong to a tenant"));
    }
    Ok(TenantBinding::Bind)
}

/// Returns the tenant the invitation will belong to.
pub fn authorize_invite(actor: &Actor, role: Role) -> Result<ObjectId, Denied> {
    let tenant_id = actor.tenant_id.ok_or(Denied::NoTenant)?;
    if !actor.is_manager() {
        return Err(Denied::Forbidden("You don't have permission to invite users"));
    }
    assign(actor, role)?;
    Ok(tenant_id)
}

/// Invitation listing and resending follow the inviting rules minus the role check.
pub fn invitation_scope(actor: &Actor) -> Result<TenantScope, Denied> {
    if actor.is_superuser {
        return Ok(TenantScope::All);
    }
    let tenant_id = actor.tenant_id.ok_or(Denied::NoTenant)?;
    if !actor.role.is_manager() {
        return Err(Denied::Forbidden("You don't have permission to manage invitations"));
    }
    Ok(TenantScope::Only(tenant_id))
}

/// Tenant and role of a self-service registration.
///
/// An owner or admin with a tenant who registers someone else makes it an
/// affiliated sign-up: the account joins the caller's tenant with the requested
/// role (staff when omitted). Everyone else gets a tenant-less owner account.
pub fn registration(
    caller: Option<&Actor>,
    requested: Option<Role>,
) -> Result<(Option<ObjectId>, Role), Denied> {
    match caller {
        Some(actor) if actor.role.is_manager() && actor.tenant_id.is_some() => {
            let role = requested.unwrap_or(Role::Staff);
            assign(actor, role)?;
            Ok((actor.tenant_id, role))
        }
        _ => match requested {
            None | Some(Role::Owner) => Ok((None, Role::Owner)),
            Some(_) => Err(Denied::Forbidden(
                "Only an owner or admin can choose the role of a new account",
            )),
        },
    }
}

/// `privileged` covers role, branch and activation changes; names are not privileged.
pub fn authorize_user_update(
    actor: &Actor,
    target: &User,
    privileged: bool,
    new_role: Option<Role>,
) -> Result<(), Denied> {
    let is_self = target.id == Some(actor.user_id);

    if privileged {
        if is_self {
            return Err(Denied::Forbidden("You cannot change your own role or status"));
        }
        manage(actor, target)?;
        if let Some(role) = new_role {
            assign(actor, role)?;
        }
        return Ok(());
    }

    if is_self {
        return Ok(());
    }
    manage(actor, target)
}

pub fn authorize_user_delete(actor: &Actor, target: &User) -> Result<(), Denied> {
    if target.id == Some(actor.user_id) {
        return Err(Denied::Forbidden("You cannot delete your own account"));
    }
    manage(actor, target)
}

pub fn authorize_branch_create(actor: &Actor) -> Result<ObjectId, Denied> {
    let tenant_id = actor.tenant_id.ok_or(Denied::NoTenant)?;
    if !actor.is_manager() {
        return Err(Denied::Forbidden("You don't have permission to create branches"));
    }
    Ok(tenant_id)
}

fn manage(actor: &Actor, target: &User) -> Result<(), Denied> {
    if actor.is_superuser {
        return Ok(());
    }
    if actor.role.is_manager() && can_assign(actor.role, target.role) {
        Ok(())
    } else {
        Err(Denied::Forbidden("You don't have permission to manage this user"))
    }
}
