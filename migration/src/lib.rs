pub use sea_orm_migration::prelude::*;

mod m20260315_000001_create_user_table;
mod m20260315_000002_create_category_table;
mod m20260315_000003_create_course_table;
mod m20260315_000004_create_lesson_table;
mod m20260315_000005_create_enrollment_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260315_000001_create_user_table::Migration),
            Box::new(m20260315_000002_create_category_table::Migration),
            Box::new(m20260315_000003_create_course_table::Migration),
            Box::new(m20260315_000004_create_lesson_table::Migration),
            Box::new(m20260315_000005_create_enrollment_table::Migration),
        ]
    }
}
