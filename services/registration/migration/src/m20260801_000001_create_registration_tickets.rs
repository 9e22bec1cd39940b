use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RegistrationTickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RegistrationTickets::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RegistrationTickets::Code)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(RegistrationTickets::ExpiresAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(RegistrationTickets::UsedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(RegistrationTickets::UsedBy).uuid())
                    .col(ColumnDef::new(RegistrationTickets::PendingRegistrationId).uuid())
                    .col(
                        ColumnDef::new(RegistrationTickets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(RegistrationTickets::Table)
                    .col(RegistrationTickets::PendingRegistrationId)
                    .name("idx_registration_tickets_pending_registration_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RegistrationTickets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RegistrationTickets {
    Table,
    Id,
    Code,
    ExpiresAt,
    UsedAt,
    UsedBy,
    PendingRegistrationId,
    CreatedAt,
}
