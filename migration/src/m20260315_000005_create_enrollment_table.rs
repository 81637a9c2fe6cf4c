use sea_orm_migration::prelude::*;

/// Creates the `enrollment` table.
///
/// Enrollments cascade with their course; deleting a user with enrollments
/// is blocked (RESTRICT).
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Enrollment {
    Table,
    Id,
    EnrolledAt,
    Rating,
    UserId,
    CourseId,
}

#[derive(DeriveIden)]
enum Course {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Enrollment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Enrollment::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Enrollment::EnrolledAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Enrollment::Rating).integer().null())
                    .col(ColumnDef::new(Enrollment::UserId).uuid().not_null())
                    .col(ColumnDef::new(Enrollment::CourseId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollment_user_id")
                            .from(Enrollment::Table, Enrollment::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollment_course_id")
                            .from(Enrollment::Table, Enrollment::CourseId)
                            .to(Course::Table, Course::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Enrollment::Table).to_owned())
            .await
    }
}
