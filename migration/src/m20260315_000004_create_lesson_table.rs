use sea_orm_migration::prelude::*;

/// Creates the `lesson` table. Lessons go down with their course (CASCADE).
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Lesson {
    Table,
    Id,
    Title,
    VideoUrl,
    CourseId,
}

#[derive(DeriveIden)]
enum Course {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Lesson::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Lesson::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Lesson::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Lesson::VideoUrl).string_len(500).not_null())
                    .col(ColumnDef::new(Lesson::CourseId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lesson_course_id")
                            .from(Lesson::Table, Lesson::CourseId)
                            .to(Course::Table, Course::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Lesson::Table).to_owned())
            .await
    }
}
