use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Items {
    Table,
    Pk,
    Sk,
    Attrs,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Items::Pk).string().not_null())
                    .col(ColumnDef::new(Items::Sk).string().not_null())
                    .col(ColumnDef::new(Items::Attrs).text().not_null())
                    .primary_key(
                        Index::create()
                            .name("pk-items")
                            .col(Items::Pk)
                            .col(Items::Sk),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await
    }
}
