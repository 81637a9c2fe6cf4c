use sea_orm_migration::prelude::*;

/// Creates the `course` table.
///
/// Deleting a referenced category or owner is blocked (RESTRICT) so that
/// courses are never orphaned by either side.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Course {
    Table,
    Id,
    Title,
    Description,
    CoverImageUrl,
    Price,
    TotalRating,
    TotalVotes,
    NumberOfLearners,
    IsApproved,
    CategoryId,
    OwnerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Category {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
}

#[async_trait::async_trait]
#[allow(clippy::too_many_lines)]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Course::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Course::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Course::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Course::Description).text().not_null())
                    .col(
                        ColumnDef::new(Course::CoverImageUrl)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Course::Price).integer().not_null())
                    .col(
                        ColumnDef::new(Course::TotalRating)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Course::TotalVotes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Course::NumberOfLearners)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Course::IsApproved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Course::CategoryId).integer().not_null())
                    .col(ColumnDef::new(Course::OwnerId).uuid().not_null())
                    .col(
                        ColumnDef::new(Course::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Course::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_category_id")
                            .from(Course::Table, Course::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_owner_id")
                            .from(Course::Table, Course::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Course::Table).to_owned())
            .await
    }
}
