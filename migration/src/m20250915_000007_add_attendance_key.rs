use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Points {
    Table,
    UserId,
    AttendedOn,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if !manager.has_column("points", "attended_on").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Points::Table)
                        .add_column(ColumnDef::new(Points::AttendedOn).date().null())
                        .to_owned(),
                )
                .await?;
        }

        // 非签到流水的 attended_on 为 NULL，不受唯一约束影响
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_points_user_attended_on")
                    .table(Points::Table)
                    .col(Points::UserId)
                    .col(Points::AttendedOn)
                    .unique()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("uq_points_user_attended_on")
                    .table(Points::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Points::Table)
                    .drop_column(Points::AttendedOn)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
