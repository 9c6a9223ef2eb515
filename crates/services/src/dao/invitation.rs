use bson::{doc, oid::ObjectId, DateTime};
use chrono::Duration;
use futures::FutureExt;
use mongodb::{Collection, Database};
use pos_db::models::{Invitation, Role, User};
use tracing::debug;

use super::base::{BaseDao, DaoError, DaoResult, PaginatedResult, PaginationParams, write_error};
use crate::policy::TenantScope;

pub struct InvitationDao {
    pub base: BaseDao<Invitation>,
    users: Collection<User>,
    db: Database,
}

impl InvitationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Invitation::COLLECTION),
            users: db.collection::<User>(User::COLLECTION),
            db: db.clone(),
        }
    }

    pub async fn create(
        &self,
        email: String,
        tenant_id: ObjectId,
        role: Role,
        branch_id: Option<ObjectId>,
        invited_by: ObjectId,
        ttl: Duration,
    ) -> DaoResult<Invitation> {
        let now = DateTime::now();
        let invitation = Invitation {
            id: None,
            email,
            token: Invitation::new_token(),
            tenant_id,
            role,
            branch_id,
            invited_by,
            is_accepted: false,
            accepted_at: None,
            expires_at: DateTime::from_millis(now.timestamp_millis() + ttl.num_milliseconds()),
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&invitation).await?;
        self.base.find_by_id(id).await
    }

    /// Accepted invitations are invisible here: a spent token looks like an unknown one.
    pub async fn find_unaccepted_by_token(&self, token: &str) -> DaoResult<Invitation> {
        self.base
            .find_one(doc! { "token": token, "is_accepted": false })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn list(
        &self,
        scope: &TenantScope,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Invitation>> {
        let filter = match scope {
            TenantScope::All => doc! {},
            TenantScope::Only(tenant_id) => doc! { "tenant_id": tenant_id },
            TenantScope::Nothing => return Ok(PaginatedResult::empty(params)),
        };
        self.base
            .find_paginated(filter, Some(doc! { "created_at": -1 }), params)
            .await
    }

    pub async fn find_in_scope(&self, scope: &TenantScope, id: ObjectId) -> DaoResult<Invitation> {
        match scope {
            TenantScope::All => self.base.find_by_id(id).await,
            TenantScope::Only(tenant_id) => self.base.find_by_id_in_tenant(*tenant_id, id).await,
            TenantScope::Nothing => Err(DaoError::NotFound),
        }
    }

    /// Marks the invitation accepted and inserts `user` in one transaction.
    ///
    /// Either both writes land or neither does. Transient transaction errors
    /// (write conflicts with a concurrent redemption, stepdowns) rerun the
    /// whole transaction, so the loser of a race finds the invitation already
    /// claimed and gets `NotFound`. Requires MongoDB running as a replica set.
    pub async fn accept(&self, invitation_id: ObjectId, user: &User) -> DaoResult<ObjectId> {
        let mut session = self.db.client().start_session().await?;
        let context = (self.base.collection().clone(), self.users.clone(), user.clone());

        let inserted = session
            .start_transaction()
            .and_run(context, move |session, (invitations, users, user)| {
                async move {
                    let now = DateTime::now();
                    let claimed = invitations
                        .update_one(
                            doc! { "_id": invitation_id, "is_accepted": false },
                            doc! { "$set": { "is_accepted": true, "accepted_at": now, "updated_at": now } },
                        )
                        .session(&mut *session)
                        .await?;
                    if claimed.modified_count == 0 {
                        return Ok(None);
                    }

                    let inserted = users.insert_one(&*user).session(&mut *session).await?;
                    Ok(Some(inserted.inserted_id))
                }
                .boxed()
            })
            .await
            .map_err(write_error)?;

        let Some(inserted_id) = inserted else {
            debug!(%invitation_id, "Invitation already claimed");
            return Err(DaoError::NotFound);
        };
        let user_id = inserted_id
            .as_object_id()
            .ok_or_else(|| DaoError::Validation("inserted _id is not an ObjectId".to_string()))?;
        debug!(%invitation_id, %user_id, "Invitation accepted");
        Ok(user_id)
    }
}
