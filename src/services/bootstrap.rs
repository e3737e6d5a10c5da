use std::sync::Arc;

use crate::errors::InternalError;
use crate::services::password::PasswordService;
use crate::stores::{RoleStore, UserStore};

const DEFAULT_APPS: &[(&str, &str)] = &[
    ("milosign", "MiloSign"),
    ("contratacion", "Contratación"),
    ("presupuesto", "Presupuesto"),
];

const DEFAULT_FUNCTIONALITIES: &[(&str, &str)] = &[
    ("view", "View"),
    ("create", "Create"),
    ("edit", "Edit"),
    ("delete", "Delete"),
];

/// Seed the default roles, applications, functionalities, and the initial
/// administrator account. Idempotent: existing rows are left alone, so this
/// runs unconditionally at startup.
pub async fn seed_defaults(
    user_store: &UserStore,
    role_store: &RoleStore,
    password_service: &Arc<PasswordService>,
) -> Result<(), InternalError> {
    let admin_role = match role_store.find_role_by_name("admin").await? {
        Some(role) => role,
        None => {
            role_store
                .create_role("admin", "Administrator", Some("Platform administration".into()), false)
                .await?
        }
    };

    if role_store.find_role_by_name("user").await?.is_none() {
        role_store
            .create_role("user", "User", Some("Standard user".into()), false)
            .await?;
    }

    let allmilo_role = match role_store.find_role_by_name("ALLMILO").await? {
        Some(role) => role,
        None => {
            role_store
                .create_role(
                    "ALLMILO",
                    "All Milo Applications",
                    Some("Unrestricted access to every application".into()),
                    true,
                )
                .await?
        }
    };

    for (key, name) in DEFAULT_APPS {
        let app = match role_store.find_application_by_key(key).await? {
            Some(app) => app,
            None => role_store.create_application(key, name, None).await?,
        };
        let existing = role_store.list_functionalities(app.id).await?;
        for (fn_key, fn_name) in DEFAULT_FUNCTIONALITIES {
            if !existing.iter().any(|f| f.key == *fn_key) {
                role_store
                    .create_functionality(app.id, fn_key, fn_name, None)
                    .await?;
            }
        }
    }

    if user_store.find_by_email("admin@miloapps.com").await?.is_none() {
        // Default credentials for first login; deployments are expected to
        // change them immediately.
        let hash = password_service.hash("admin123")?;
        let admin = user_store
            .create_user(
                "admin@miloapps.com",
                "admin",
                hash,
                "System",
                "Administrator",
                Some(admin_role.id),
            )
            .await?;
        role_store
            .replace_user_roles(admin.id, &[admin_role.id, allmilo_role.id], None)
            .await?;
        tracing::info!("seeded default administrator account");
    }

    Ok(())
}
