use migration::{AuditMigrator, AuthMigrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection, DbErr};

/// Connect to the auth database and apply pending migrations
pub async fn init_database(url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(url).await?;
    AuthMigrator::up(&db, None).await?;
    Ok(db)
}

/// Connect to the audit database and apply pending migrations
pub async fn init_audit_database(url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(url).await?;
    AuditMigrator::up(&db, None).await?;
    Ok(db)
}
