use sea_orm::entity::prelude::*;

/// Pre-issued invitation ticket gating signup on closed instances.
///
/// `used_by` set means permanently consumed. `used_at` set with `used_by`
/// still null means provisionally claimed by an unconfirmed pending
/// registration (referenced through `pending_registration_id`).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "registration_tickets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub used_at: Option<chrono::DateTime<chrono::Utc>>,
    pub used_by: Option<Uuid>,
    pub pending_registration_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
