//! Database configuration module for the workshop ledger.
//!
//! This module handles `SQLite` connection setup and schema migrations using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Migrations are an ordered, versioned list;
//! the highest applied version is recorded under [`SCHEMA_VERSION_KEY`] in `system_state`
//! and each step runs at most once.

use crate::entities::{
    CategoryOrder, CategoryOrderColumn, ClassOrder, ClassOrderColumn, Material, MaterialColumn,
    Payment, PaymentColumn, Project, Purchase, PurchaseColumn, Student, SystemState,
    SystemStateColumn, system_state,
};
use crate::errors::{Error, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    QueryFilter, Schema, Set, TransactionTrait, sea_query::Index,
};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Connection string used when neither `DATABASE_URL` nor the settings file provide one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/workshop_ledger.sqlite?mode=rwc";

/// `system_state` key holding the applied schema version.
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back to
/// `configured` and then to [`DEFAULT_DATABASE_URL`].
#[must_use]
pub fn get_database_url(configured: Option<&str>) -> String {
    std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Creates the parent directory of a file-backed `SQLite` URL so that `mode=rwc` can create
/// the file. In-memory URLs are left alone.
pub fn prepare_sqlite_path(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or_default();
    if file.is_empty() || file == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Establishes a connection and brings the schema up to date.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    prepare_sqlite_path(database_url)?;
    let db = Database::connect(database_url).await?;
    let version = migrate(&db).await?;
    info!(version, "Database ready");
    Ok(db)
}

/// One step of the schema history. Steps are applied in [`Migration::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Migration {
    /// students, materials, projects, purchases, payments
    CoreTables,
    /// class_order, category_order
    OrderingTables,
    /// lookup indexes for purchases, payments, materials and the ordering tables
    QueryIndexes,
}

impl Migration {
    /// Every migration, oldest first.
    pub const ALL: [Self; 3] = [Self::CoreTables, Self::OrderingTables, Self::QueryIndexes];

    /// Version number recorded once this step has been applied.
    #[must_use]
    pub const fn version(self) -> i32 {
        match self {
            Self::CoreTables => 1,
            Self::OrderingTables => 2,
            Self::QueryIndexes => 3,
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CoreTables => "create_core_tables",
            Self::OrderingTables => "create_ordering_tables",
            Self::QueryIndexes => "create_query_indexes",
        }
    }

    async fn up<C>(self, db: &C) -> Result<()>
    where
        C: ConnectionTrait,
    {
        match self {
            Self::CoreTables => {
                create_table(db, Student).await?;
                create_table(db, Material).await?;
                create_table(db, Project).await?;
                create_table(db, Purchase).await?;
                create_table(db, Payment).await?;
            }
            Self::OrderingTables => {
                create_table(db, ClassOrder).await?;
                create_table(db, CategoryOrder).await?;
            }
            Self::QueryIndexes => {
                let builder = db.get_database_backend();
                let indexes = [
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchases_student")
                        .table(Purchase)
                        .col(PurchaseColumn::StudentId)
                        .to_owned(),
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchases_material")
                        .table(Purchase)
                        .col(PurchaseColumn::MaterialId)
                        .to_owned(),
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchases_project")
                        .table(Purchase)
                        .col(PurchaseColumn::ProjectId)
                        .to_owned(),
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchases_date")
                        .table(Purchase)
                        .col(PurchaseColumn::PurchaseDate)
                        .to_owned(),
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_student")
                        .table(Payment)
                        .col(PaymentColumn::StudentId)
                        .to_owned(),
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_date")
                        .table(Payment)
                        .col(PaymentColumn::PaymentDate)
                        .to_owned(),
                    Index::create()
                        .if_not_exists()
                        .name("idx_materials_active")
                        .table(Material)
                        .col(MaterialColumn::IsActive)
                        .to_owned(),
                    Index::create()
                        .if_not_exists()
                        .name("idx_class_order")
                        .table(ClassOrder)
                        .col(ClassOrderColumn::SortOrder)
                        .to_owned(),
                    Index::create()
                        .if_not_exists()
                        .name("idx_category_order")
                        .table(CategoryOrder)
                        .col(CategoryOrderColumn::SortOrder)
                        .to_owned(),
                ];
                for index in &indexes {
                    db.execute(builder.build(index)).await?;
                }
            }
        }
        Ok(())
    }
}

async fn create_table<C, E>(db: &C, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Reads the applied schema version, 0 for a fresh store.
pub async fn current_schema_version<C>(db: &C) -> Result<i32>
where
    C: ConnectionTrait,
{
    let Some(row) = SystemState::find()
        .filter(SystemStateColumn::Key.eq(SCHEMA_VERSION_KEY))
        .one(db)
        .await?
    else {
        return Ok(0);
    };
    row.value.parse().map_err(|e| Error::Config {
        message: format!("Corrupt schema version {:?}: {e}", row.value),
    })
}

async fn record_schema_version<C>(db: &C, version: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = chrono::Local::now().naive_local();
    let existing = SystemState::find()
        .filter(SystemStateColumn::Key.eq(SCHEMA_VERSION_KEY))
        .one(db)
        .await?;
    match existing {
        Some(row) => {
            let mut row: system_state::ActiveModel = row.into();
            row.value = Set(version.to_string());
            row.updated_at = Set(now);
            row.update(db).await?;
        }
        None => {
            system_state::ActiveModel {
                key: Set(SCHEMA_VERSION_KEY.to_string()),
                value: Set(version.to_string()),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }
    Ok(())
}

/// Applies every pending migration, each in its own transaction, and returns the
/// resulting schema version. Running it again on an up-to-date store does nothing.
#[instrument(skip(db))]
pub async fn migrate(db: &DatabaseConnection) -> Result<i32> {
    create_table(db, SystemState).await?;
    let mut current = current_schema_version(db).await?;
    debug!(current, "Checking for pending migrations");

    for migration in Migration::ALL {
        if migration.version() <= current {
            continue;
        }
        let txn = db.begin().await?;
        migration.up(&txn).await?;
        record_schema_version(&txn, migration.version()).await?;
        txn.commit().await?;
        info!(
            version = migration.version(),
            name = migration.name(),
            "Applied migration"
        );
        current = migration.version();
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        category_order::Model as CategoryOrderModel, class_order::Model as ClassOrderModel,
        material::Model as MaterialModel, payment::Model as PaymentModel,
        project::Model as ProjectModel, purchase::Model as PurchaseModel,
        student::Model as StudentModel,
    };
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_migrate_creates_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        let version = migrate(&db).await?;
        assert_eq!(version, 3);

        // Test that tables exist by querying them
        let _: Vec<StudentModel> = Student::find().limit(1).all(&db).await?;
        let _: Vec<MaterialModel> = Material::find().limit(1).all(&db).await?;
        let _: Vec<ProjectModel> = Project::find().limit(1).all(&db).await?;
        let _: Vec<PurchaseModel> = Purchase::find().limit(1).all(&db).await?;
        let _: Vec<PaymentModel> = Payment::find().limit(1).all(&db).await?;
        let _: Vec<ClassOrderModel> = ClassOrder::find().limit(1).all(&db).await?;
        let _: Vec<CategoryOrderModel> = CategoryOrder::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        assert_eq!(migrate(&db).await?, 3);
        assert_eq!(migrate(&db).await?, 3);
        assert_eq!(current_schema_version(&db).await?, 3);

        // Only one marker row is kept
        let rows = SystemState::find().all(&db).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, "3");
        Ok(())
    }

    #[tokio::test]
    async fn test_migrate_resumes_from_recorded_version() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_table(&db, SystemState).await?;
        Migration::CoreTables.up(&db).await?;
        record_schema_version(&db, 1).await?;

        assert_eq!(migrate(&db).await?, 3);
        let _: Vec<ClassOrderModel> = ClassOrder::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[test]
    fn test_migration_versions_are_increasing() {
        let versions: Vec<i32> = Migration::ALL.iter().map(|m| m.version()).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_prepare_sqlite_path_ignores_memory() -> Result<()> {
        prepare_sqlite_path("sqlite::memory:")?;
        prepare_sqlite_path("sqlite://:memory:")?;
        Ok(())
    }

    #[test]
    fn test_get_database_url_prefers_configured_over_default() {
        // DATABASE_URL may be set in the environment running the tests
        if std::env::var("DATABASE_URL").is_err() {
            assert_eq!(get_database_url(Some("sqlite::memory:")), "sqlite::memory:");
            assert_eq!(get_database_url(None), DEFAULT_DATABASE_URL);
        }
    }
}
