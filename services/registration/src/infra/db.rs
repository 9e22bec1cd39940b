use anyhow::{Context as _, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter,
};
use uuid::Uuid;

use corvid_registration_schema::{pending_registrations, registration_tickets};

use crate::domain::repository::{PendingRegistrationRepository, TicketRepository};
use crate::domain::types::{PendingRegistration, RegistrationTicket};
use crate::error::RegistrationServiceError;

// ── Ticket repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbTicketRepository {
    pub db: DatabaseConnection,
}

impl TicketRepository for DbTicketRepository {
    async fn find_by_code(
        &self,
        code: &str,
    ) -> Result<Option<RegistrationTicket>, RegistrationServiceError> {
        let model = registration_tickets::Entity::find()
            .filter(registration_tickets::Column::Code.eq(code))
            .one(&self.db)
            .await
            .context("find ticket by code")?;
        Ok(model.map(ticket_from_model))
    }

    async fn claim(&self, id: Uuid) -> Result<bool, RegistrationServiceError> {
        let result = registration_tickets::Entity::update_many()
            .col_expr(
                registration_tickets::Column::UsedAt,
                Expr::value(Utc::now()),
            )
            .filter(registration_tickets::Column::Id.eq(id))
            .filter(registration_tickets::Column::UsedAt.is_null())
            .filter(registration_tickets::Column::UsedBy.is_null())
            .exec(&self.db)
            .await
            .context("claim ticket")?;
        Ok(result.rows_affected > 0)
    }

    async fn claim_for_pending(
        &self,
        id: Uuid,
        pending_id: Uuid,
        stale_before: DateTime<Utc>,
    ) -> Result<bool, RegistrationServiceError> {
        // used_at and pending_registration_id move together, in one update,
        // so a ticket is never observable as unclaimed-but-pending.
        let result = registration_tickets::Entity::update_many()
            .col_expr(
                registration_tickets::Column::UsedAt,
                Expr::value(Utc::now()),
            )
            .col_expr(
                registration_tickets::Column::PendingRegistrationId,
                Expr::value(pending_id),
            )
            .filter(registration_tickets::Column::Id.eq(id))
            .filter(registration_tickets::Column::UsedBy.is_null())
            .filter(
                Condition::any()
                    .add(registration_tickets::Column::UsedAt.is_null())
                    .add(registration_tickets::Column::UsedAt.lte(stale_before)),
            )
            .exec(&self.db)
            .await
            .context("provisionally claim ticket")?;
        Ok(result.rows_affected > 0)
    }

    async fn assign_used_by(
        &self,
        id: Uuid,
        account_id: Uuid,
    ) -> Result<(), RegistrationServiceError> {
        registration_tickets::Entity::update_many()
            .col_expr(
                registration_tickets::Column::UsedBy,
                Expr::value(account_id),
            )
            .filter(registration_tickets::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("assign ticket used_by")?;
        Ok(())
    }

    async fn release(&self, id: Uuid) -> Result<(), RegistrationServiceError> {
        registration_tickets::Entity::update_many()
            .col_expr(
                registration_tickets::Column::UsedAt,
                Expr::value(None::<DateTime<Utc>>),
            )
            .col_expr(
                registration_tickets::Column::PendingRegistrationId,
                Expr::value(None::<Uuid>),
            )
            .filter(registration_tickets::Column::Id.eq(id))
            .filter(registration_tickets::Column::UsedBy.is_null())
            .exec(&self.db)
            .await
            .context("release ticket")?;
        Ok(())
    }

    async fn finalize_for_pending(
        &self,
        pending_id: Uuid,
        account_id: Uuid,
    ) -> Result<(), RegistrationServiceError> {
        registration_tickets::Entity::update_many()
            .col_expr(
                registration_tickets::Column::UsedBy,
                Expr::value(account_id),
            )
            .col_expr(
                registration_tickets::Column::PendingRegistrationId,
                Expr::value(None::<Uuid>),
            )
            .filter(registration_tickets::Column::PendingRegistrationId.eq(pending_id))
            .exec(&self.db)
            .await
            .context("finalize ticket for pending registration")?;
        Ok(())
    }
}

fn ticket_from_model(model: registration_tickets::Model) -> RegistrationTicket {
    RegistrationTicket {
        id: model.id,
        code: model.code,
        expires_at: model.expires_at,
        used_at: model.used_at,
        used_by: model.used_by,
        pending_registration_id: model.pending_registration_id,
        created_at: model.created_at,
    }
}

// ── Pending-registration repository ───────────────────────────────────────────

#[derive(Clone)]
pub struct DbPendingRegistrationRepository {
    pub db: DatabaseConnection,
}

impl PendingRegistrationRepository for DbPendingRegistrationRepository {
    async fn create(
        &self,
        pending: &PendingRegistration,
    ) -> Result<(), RegistrationServiceError> {
        let insert = pending_registrations::ActiveModel {
            id: Set(pending.id),
            code: Set(pending.code.clone()),
            username: Set(pending.username.clone()),
            password_hash: Set(pending.password_hash.clone()),
            email: Set(pending.email.clone()),
            created_at: Set(pending.created_at),
        }
        .insert(&self.db)
        .await;
        match insert {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_))) => {
                Err(RegistrationServiceError::Internal(anyhow!(
                    "confirmation code collision"
                )))
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context("create pending registration")
                .into()),
        }
    }

    async fn find_by_code(
        &self,
        code: &str,
    ) -> Result<Option<PendingRegistration>, RegistrationServiceError> {
        let model = pending_registrations::Entity::find()
            .filter(pending_registrations::Column::Code.eq(code))
            .one(&self.db)
            .await
            .context("find pending registration by code")?;
        Ok(model.map(pending_from_model))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RegistrationServiceError> {
        let result = pending_registrations::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete pending registration")?;
        Ok(result.rows_affected > 0)
    }
}

fn pending_from_model(model: pending_registrations::Model) -> PendingRegistration {
    PendingRegistration {
        id: model.id,
        code: model.code,
        username: model.username,
        password_hash: model.password_hash,
        email: model.email,
        created_at: model.created_at,
    }
}
