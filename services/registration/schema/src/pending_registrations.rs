use sea_orm::entity::prelude::*;

/// Unconfirmed signup awaiting email confirmation.
/// Valid for 30 minutes from `created_at`; expiry is enforced lazily at
/// redemption, the row is never swept.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pending_registrations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub username: String,
    /// argon2 PHC string, never a cleartext password.
    pub password_hash: String,
    pub email: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
