use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Username).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::FirstName).string().not_null())
                    .col(ColumnDef::new(Users::LastName).string().not_null())
                    .col(ColumnDef::new(Users::Phone).string())
                    .col(ColumnDef::new(Users::Company).string())
                    .col(ColumnDef::new(Users::Department).string())
                    .col(ColumnDef::new(Users::Bio).text())
                    .col(ColumnDef::new(Users::RoleId).integer())
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Users::IsVerified).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::TwoFactorEnabled).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::TwoFactorSecret).string())
                    .col(ColumnDef::new(Users::FailedLoginAttempts).integer().not_null().default(0))
                    .col(ColumnDef::new(Users::LockedUntil).big_integer())
                    .col(ColumnDef::new(Users::LastLogin).big_integer())
                    .col(ColumnDef::new(Users::LastLoginIp).string())
                    .col(ColumnDef::new(Users::CurrentSessionId).string())
                    .col(ColumnDef::new(Users::SessionIp).string())
                    .col(ColumnDef::new(Users::SessionUserAgent).string())
                    .col(ColumnDef::new(Users::LastActivity).big_integer())
                    .col(ColumnDef::new(Users::ResetToken).string())
                    .col(ColumnDef::new(Users::ResetTokenExpires).big_integer())
                    .col(ColumnDef::new(Users::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_email")
                    .table(Users::Table)
                    .col(Users::Email)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_reset_token")
                    .table(Users::Table)
                    .col(Users::ResetToken)
                    .to_owned(),
            )
            .await?;

        // Create roles table
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Roles::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Roles::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Roles::DisplayName).string().not_null())
                    .col(ColumnDef::new(Roles::Description).text())
                    .col(ColumnDef::new(Roles::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Roles::IsAllmilo).boolean().not_null().default(false))
                    .col(ColumnDef::new(Roles::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Roles::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // Create applications table
        manager
            .create_table(
                Table::create()
                    .table(Applications::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Applications::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Applications::Key).string().not_null().unique_key())
                    .col(ColumnDef::new(Applications::Name).string().not_null())
                    .col(ColumnDef::new(Applications::Description).text())
                    .col(ColumnDef::new(Applications::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Applications::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Applications::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // Create functionalities table (key unique per application)
        manager
            .create_table(
                Table::create()
                    .table(Functionalities::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Functionalities::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Functionalities::ApplicationId).integer().not_null())
                    .col(ColumnDef::new(Functionalities::Key).string().not_null())
                    .col(ColumnDef::new(Functionalities::Name).string().not_null())
                    .col(ColumnDef::new(Functionalities::Description).text())
                    .col(ColumnDef::new(Functionalities::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Functionalities::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Functionalities::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_functionalities_application_id")
                            .from(Functionalities::Table, Functionalities::ApplicationId)
                            .to(Applications::Table, Applications::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_functionalities_app_key")
                    .table(Functionalities::Table)
                    .col(Functionalities::ApplicationId)
                    .col(Functionalities::Key)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create role_app_access table (unique per role/app)
        manager
            .create_table(
                Table::create()
                    .table(RoleAppAccess::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RoleAppAccess::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(RoleAppAccess::RoleId).integer().not_null())
                    .col(ColumnDef::new(RoleAppAccess::AppId).integer().not_null())
                    .col(ColumnDef::new(RoleAppAccess::FullAccess).boolean().not_null().default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_app_access_role_id")
                            .from(RoleAppAccess::Table, RoleAppAccess::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_app_access_app_id")
                            .from(RoleAppAccess::Table, RoleAppAccess::AppId)
                            .to(Applications::Table, Applications::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_role_app_access")
                    .table(RoleAppAccess::Table)
                    .col(RoleAppAccess::RoleId)
                    .col(RoleAppAccess::AppId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create role_functionalities table (unique per role/functionality)
        manager
            .create_table(
                Table::create()
                    .table(RoleFunctionalities::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RoleFunctionalities::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(RoleFunctionalities::RoleId).integer().not_null())
                    .col(ColumnDef::new(RoleFunctionalities::FunctionalityId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_functionalities_role_id")
                            .from(RoleFunctionalities::Table, RoleFunctionalities::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_functionalities_functionality_id")
                            .from(RoleFunctionalities::Table, RoleFunctionalities::FunctionalityId)
                            .to(Functionalities::Table, Functionalities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_role_functionality")
                    .table(RoleFunctionalities::Table)
                    .col(RoleFunctionalities::RoleId)
                    .col(RoleFunctionalities::FunctionalityId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create user_roles table (additional roles beyond the primary role_id)
        manager
            .create_table(
                Table::create()
                    .table(UserRoles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserRoles::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(UserRoles::UserId).integer().not_null())
                    .col(ColumnDef::new(UserRoles::RoleId).integer().not_null())
                    .col(ColumnDef::new(UserRoles::GrantedAt).big_integer().not_null())
                    .col(ColumnDef::new(UserRoles::GrantedBy).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_roles_user_id")
                            .from(UserRoles::Table, UserRoles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_roles_role_id")
                            .from(UserRoles::Table, UserRoles::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_user_role")
                    .table(UserRoles::Table)
                    .col(UserRoles::UserId)
                    .col(UserRoles::RoleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserRoles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RoleFunctionalities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RoleAppAccess::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Functionalities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Applications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Username,
    PasswordHash,
    FirstName,
    LastName,
    Phone,
    Company,
    Department,
    Bio,
    RoleId,
    IsActive,
    IsVerified,
    TwoFactorEnabled,
    TwoFactorSecret,
    FailedLoginAttempts,
    LockedUntil,
    LastLogin,
    LastLoginIp,
    CurrentSessionId,
    SessionIp,
    SessionUserAgent,
    LastActivity,
    ResetToken,
    ResetTokenExpires,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Roles {
    Table,
    Id,
    Name,
    DisplayName,
    Description,
    IsActive,
    IsAllmilo,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Applications {
    Table,
    Id,
    Key,
    Name,
    Description,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Functionalities {
    Table,
    Id,
    ApplicationId,
    Key,
    Name,
    Description,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RoleAppAccess {
    Table,
    Id,
    RoleId,
    AppId,
    FullAccess,
}

#[derive(DeriveIden)]
enum RoleFunctionalities {
    Table,
    Id,
    RoleId,
    FunctionalityId,
}

#[derive(DeriveIden)]
enum UserRoles {
    Table,
    Id,
    UserId,
    RoleId,
    GrantedAt,
    GrantedBy,
}
