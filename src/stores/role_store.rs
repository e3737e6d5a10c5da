use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::errors::InternalError;
use crate::types::db::application::{self, Entity as Application};
use crate::types::db::functionality::{self, Entity as Functionality};
use crate::types::db::role::{self, Entity as Role};
use crate::types::db::role_app_access::{self, Entity as RoleAppAccess};
use crate::types::db::role_functionality::{self, Entity as RoleFunctionality};
use crate::types::db::user;
use crate::types::db::user_role::{self, Entity as UserRole};
use crate::types::internal::permissions::{EffectiveRoleSet, RoleGrants};

/// RoleStore owns the role/application/functionality tables and the grant
/// tables that tie them together.
pub struct RoleStore {
    db: DatabaseConnection,
}

/// A grant of a single functionality, addressed by keys rather than ids.
pub struct FunctionalityGrantSpec {
    pub application_key: String,
    pub functionality_key: String,
}

impl RoleStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // --- roles ---

    pub async fn create_role(
        &self,
        name: &str,
        display_name: &str,
        description: Option<String>,
        is_allmilo: bool,
    ) -> Result<role::Model, InternalError> {
        let now = Utc::now().timestamp();
        let new_role = role::ActiveModel {
            name: Set(name.to_string()),
            display_name: Set(display_name.to_string()),
            description: Set(description),
            is_active: Set(true),
            is_allmilo: Set(is_allmilo),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        new_role
            .insert(&self.db)
            .await
            .map_err(|e| InternalError::database("create_role", e))
    }

    pub async fn find_role_by_name(&self, name: &str) -> Result<Option<role::Model>, InternalError> {
        Role::find()
            .filter(role::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_role_by_name", e))
    }

    pub async fn find_role_by_id(&self, role_id: i32) -> Result<Option<role::Model>, InternalError> {
        Role::find_by_id(role_id)
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_role_by_id", e))
    }

    pub async fn set_role_active(
        &self,
        role_id: i32,
        is_active: bool,
    ) -> Result<(), InternalError> {
        let found = Role::find_by_id(role_id)
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("set_role_active", e))?
            .ok_or_else(|| InternalError::RoleMissing(role_id.to_string()))?;
        let mut active: role::ActiveModel = found.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now().timestamp());
        active
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("set_role_active", e))?;
        Ok(())
    }

    pub async fn list_roles(&self) -> Result<Vec<role::Model>, InternalError> {
        Role::find()
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("list_roles", e))
    }

    // --- applications ---

    pub async fn create_application(
        &self,
        key: &str,
        name: &str,
        description: Option<String>,
    ) -> Result<application::Model, InternalError> {
        let now = Utc::now().timestamp();
        let new_app = application::ActiveModel {
            key: Set(key.to_string()),
            name: Set(name.to_string()),
            description: Set(description),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        new_app
            .insert(&self.db)
            .await
            .map_err(|e| InternalError::database("create_application", e))
    }

    pub async fn find_application_by_key(
        &self,
        key: &str,
    ) -> Result<Option<application::Model>, InternalError> {
        Application::find()
            .filter(application::Column::Key.eq(key))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_application_by_key", e))
    }

    pub async fn list_applications(&self) -> Result<Vec<application::Model>, InternalError> {
        Application::find()
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("list_applications", e))
    }

    // --- functionalities ---

    pub async fn create_functionality(
        &self,
        application_id: i32,
        key: &str,
        name: &str,
        description: Option<String>,
    ) -> Result<functionality::Model, InternalError> {
        let now = Utc::now().timestamp();
        let new_fn = functionality::ActiveModel {
            application_id: Set(application_id),
            key: Set(key.to_string()),
            name: Set(name.to_string()),
            description: Set(description),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        new_fn
            .insert(&self.db)
            .await
            .map_err(|e| InternalError::database("create_functionality", e))
    }

    pub async fn list_functionalities(
        &self,
        application_id: i32,
    ) -> Result<Vec<functionality::Model>, InternalError> {
        Functionality::find()
            .filter(functionality::Column::ApplicationId.eq(application_id))
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("list_functionalities", e))
    }

    // --- grants ---

    /// Replace a role's entire permission set: full-access applications and
    /// granular functionality grants, addressed by key. The previous grant
    /// rows are deleted and the new set inserted in one transaction.
    pub async fn replace_role_permissions(
        &self,
        role_id: i32,
        full_access_apps: &[String],
        functionality_grants: &[FunctionalityGrantSpec],
    ) -> Result<(), InternalError> {
        let apps = Application::find()
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("replace_role_permissions.apps", e))?;
        let app_by_key: HashMap<&str, i32> =
            apps.iter().map(|a| (a.key.as_str(), a.id)).collect();

        let fns = Functionality::find()
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("replace_role_permissions.fns", e))?;
        let fn_by_app_and_key: HashMap<(i32, &str), i32> = fns
            .iter()
            .map(|f| ((f.application_id, f.key.as_str()), f.id))
            .collect();

        // Resolve every key before touching the grant tables so a bad key
        // leaves the existing grants intact.
        let mut full_access_ids = Vec::with_capacity(full_access_apps.len());
        for key in full_access_apps {
            let app_id = app_by_key
                .get(key.as_str())
                .copied()
                .ok_or_else(|| InternalError::ApplicationMissing(key.clone()))?;
            full_access_ids.push(app_id);
        }

        let mut grant_ids = Vec::with_capacity(functionality_grants.len());
        for grant in functionality_grants {
            let app_id = app_by_key
                .get(grant.application_key.as_str())
                .copied()
                .ok_or_else(|| InternalError::ApplicationMissing(grant.application_key.clone()))?;
            let fn_id = fn_by_app_and_key
                .get(&(app_id, grant.functionality_key.as_str()))
                .copied()
                .ok_or_else(|| {
                    InternalError::ApplicationMissing(format!(
                        "{}/{}",
                        grant.application_key, grant.functionality_key
                    ))
                })?;
            grant_ids.push((app_id, fn_id));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| InternalError::database("replace_role_permissions.begin", e))?;

        RoleAppAccess::delete_many()
            .filter(role_app_access::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await
            .map_err(|e| InternalError::database("replace_role_permissions.delete_apps", e))?;
        RoleFunctionality::delete_many()
            .filter(role_functionality::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await
            .map_err(|e| InternalError::database("replace_role_permissions.delete_fns", e))?;

        for app_id in full_access_ids {
            role_app_access::ActiveModel {
                role_id: Set(role_id),
                app_id: Set(app_id),
                full_access: Set(true),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| InternalError::database("replace_role_permissions.insert_app", e))?;
        }

        // A granular grant also needs an app-access row (without full access)
        // unless the app already got one above.
        let full_set: HashSet<i32> = RoleAppAccess::find()
            .filter(role_app_access::Column::RoleId.eq(role_id))
            .all(&txn)
            .await
            .map_err(|e| InternalError::database("replace_role_permissions.reload", e))?
            .into_iter()
            .map(|r| r.app_id)
            .collect();

        let mut partial_inserted: HashSet<i32> = HashSet::new();
        for (app_id, fn_id) in grant_ids {
            if !full_set.contains(&app_id) && partial_inserted.insert(app_id) {
                role_app_access::ActiveModel {
                    role_id: Set(role_id),
                    app_id: Set(app_id),
                    full_access: Set(false),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(|e| {
                    InternalError::database("replace_role_permissions.insert_partial", e)
                })?;
            }
            role_functionality::ActiveModel {
                role_id: Set(role_id),
                functionality_id: Set(fn_id),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| InternalError::database("replace_role_permissions.insert_fn", e))?;
        }

        txn.commit()
            .await
            .map_err(|e| InternalError::database("replace_role_permissions.commit", e))?;
        Ok(())
    }

    /// Replace a user's additional role assignments. The legacy primary
    /// role_id on the users row is left untouched.
    pub async fn replace_user_roles(
        &self,
        user_id: i32,
        role_ids: &[i32],
        granted_by: Option<i32>,
    ) -> Result<(), InternalError> {
        for role_id in role_ids {
            if self.find_role_by_id(*role_id).await?.is_none() {
                return Err(InternalError::RoleMissing(role_id.to_string()));
            }
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| InternalError::database("replace_user_roles.begin", e))?;

        UserRole::delete_many()
            .filter(user_role::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(|e| InternalError::database("replace_user_roles.delete", e))?;

        let now = Utc::now().timestamp();
        let mut seen = HashSet::new();
        for role_id in role_ids {
            if !seen.insert(*role_id) {
                continue;
            }
            user_role::ActiveModel {
                user_id: Set(user_id),
                role_id: Set(*role_id),
                granted_at: Set(now),
                granted_by: Set(granted_by),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| InternalError::database("replace_user_roles.insert", e))?;
        }

        txn.commit()
            .await
            .map_err(|e| InternalError::database("replace_user_roles.commit", e))?;
        Ok(())
    }

    /// Resolve the user's effective role set: the legacy primary role plus
    /// every user_roles assignment, each expanded to its grants with ids
    /// mapped back to application and functionality keys. Inactive roles are
    /// skipped.
    pub async fn effective_role_set(
        &self,
        user: &user::Model,
    ) -> Result<EffectiveRoleSet, InternalError> {
        let mut role_ids: Vec<i32> = Vec::new();
        if let Some(primary) = user.role_id {
            role_ids.push(primary);
        }
        let assigned = UserRole::find()
            .filter(user_role::Column::UserId.eq(user.id))
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("effective_role_set.user_roles", e))?;
        for row in assigned {
            if !role_ids.contains(&row.role_id) {
                role_ids.push(row.role_id);
            }
        }
        if role_ids.is_empty() {
            return Ok(EffectiveRoleSet::default());
        }

        let roles = Role::find()
            .filter(role::Column::Id.is_in(role_ids.clone()))
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("effective_role_set.roles", e))?;

        let apps = Application::find()
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("effective_role_set.apps", e))?;
        let app_key_by_id: HashMap<i32, &str> =
            apps.iter().map(|a| (a.id, a.key.as_str())).collect();

        let fns = Functionality::find()
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("effective_role_set.fns", e))?;
        let fn_by_id: HashMap<i32, (&str, i32)> = fns
            .iter()
            .map(|f| (f.id, (f.key.as_str(), f.application_id)))
            .collect();

        let mut grants = Vec::with_capacity(roles.len());
        for r in roles.into_iter().filter(|r| r.is_active) {
            let mut role_grants = RoleGrants {
                role_name: r.name.clone(),
                is_allmilo: r.is_allmilo,
                ..Default::default()
            };

            let app_rows = RoleAppAccess::find()
                .filter(role_app_access::Column::RoleId.eq(r.id))
                .all(&self.db)
                .await
                .map_err(|e| InternalError::database("effective_role_set.app_access", e))?;
            for row in app_rows {
                if row.full_access {
                    if let Some(key) = app_key_by_id.get(&row.app_id) {
                        role_grants.full_access_apps.insert((*key).to_string());
                    }
                }
            }

            let fn_rows = RoleFunctionality::find()
                .filter(role_functionality::Column::RoleId.eq(r.id))
                .all(&self.db)
                .await
                .map_err(|e| InternalError::database("effective_role_set.fn_grants", e))?;
            for row in fn_rows {
                if let Some((fn_key, app_id)) = fn_by_id.get(&row.functionality_id) {
                    if let Some(app_key) = app_key_by_id.get(app_id) {
                        role_grants
                            .functionalities
                            .insert(((*app_key).to_string(), (*fn_key).to_string()));
                    }
                }
            }

            grants.push(role_grants);
        }

        Ok(EffectiveRoleSet { roles: grants })
    }
}
