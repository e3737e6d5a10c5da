use std::sync::Arc;

use poem::Request;
use poem_openapi::{param::Path, payload::Json, OpenApi, Tags};

use crate::api::auth::SessionAuth;
use crate::errors::auth::AuthError;
use crate::services::{AdminService, PermissionService, SessionService};
use crate::stores::FunctionalityGrantSpec;
use crate::types::db::user;
use crate::types::dto::admin::{
    ApplicationResponse, AssignRolesRequest, CreateApplicationRequest, CreateFunctionalityRequest,
    CreateRoleRequest, FunctionalityResponse, PruneAuditRequest, PruneAuditResponse,
    RolePermissionsRequest, RoleResponse,
};
use crate::types::dto::auth::MessageResponse;
use crate::types::internal::client_info::ClientInfo;

#[derive(Tags)]
enum AdminTags {
    /// Role and permission administration
    Administration,
}

/// Administrative API. Every endpoint requires the admin role (or a
/// super role).
pub struct AdminApi {
    admin_service: Arc<AdminService>,
    permission_service: Arc<PermissionService>,
    session_service: Arc<SessionService>,
}

impl AdminApi {
    pub fn new(
        admin_service: Arc<AdminService>,
        permission_service: Arc<PermissionService>,
        session_service: Arc<SessionService>,
    ) -> Self {
        Self {
            admin_service,
            permission_service,
            session_service,
        }
    }

    async fn require_admin(
        &self,
        auth: &SessionAuth,
        client: &ClientInfo,
    ) -> Result<user::Model, AuthError> {
        let user = self.session_service.authenticate(&auth.0.key, client).await?;
        self.permission_service
            .require_role(&user, "admin", client)
            .await?;
        Ok(user)
    }
}

fn role_response(role: crate::types::db::role::Model) -> RoleResponse {
    RoleResponse {
        id: role.id,
        name: role.name,
        display_name: role.display_name,
        is_allmilo: role.is_allmilo,
        is_active: role.is_active,
    }
}

#[OpenApi(prefix_path = "/admin")]
impl AdminApi {
    /// List all roles
    #[oai(path = "/roles", method = "get", tag = "AdminTags::Administration")]
    async fn list_roles(
        &self,
        req: &Request,
        auth: SessionAuth,
    ) -> Result<Json<Vec<RoleResponse>>, AuthError> {
        let client = ClientInfo::from_request(req);
        self.require_admin(&auth, &client).await?;
        let roles = self.admin_service.list_roles().await?;
        Ok(Json(roles.into_iter().map(role_response).collect()))
    }

    /// Create a role
    #[oai(path = "/roles", method = "post", tag = "AdminTags::Administration")]
    async fn create_role(
        &self,
        req: &Request,
        auth: SessionAuth,
        body: Json<CreateRoleRequest>,
    ) -> Result<Json<RoleResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        self.require_admin(&auth, &client).await?;
        let role = self
            .admin_service
            .create_role(
                &body.name,
                &body.display_name,
                body.description.clone(),
                body.is_allmilo,
            )
            .await?;
        Ok(Json(role_response(role)))
    }

    /// Replace a role's entire permission set
    #[oai(
        path = "/roles/:role_id/permissions",
        method = "put",
        tag = "AdminTags::Administration"
    )]
    async fn replace_role_permissions(
        &self,
        req: &Request,
        auth: SessionAuth,
        role_id: Path<i32>,
        body: Json<RolePermissionsRequest>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        self.require_admin(&auth, &client).await?;
        let grants = body
            .functionalities
            .iter()
            .map(|g| FunctionalityGrantSpec {
                application_key: g.application_key.clone(),
                functionality_key: g.functionality_key.clone(),
            })
            .collect();
        self.admin_service
            .replace_role_permissions(role_id.0, body.full_access.clone(), grants)
            .await?;
        Ok(Json(MessageResponse {
            message: "Role permissions updated".to_string(),
        }))
    }

    /// Replace a user's additional role assignments
    #[oai(
        path = "/users/:user_id/roles",
        method = "put",
        tag = "AdminTags::Administration"
    )]
    async fn assign_user_roles(
        &self,
        req: &Request,
        auth: SessionAuth,
        user_id: Path<i32>,
        body: Json<AssignRolesRequest>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        let admin = self.require_admin(&auth, &client).await?;
        self.admin_service
            .assign_user_roles(user_id.0, body.role_ids.clone(), admin.id)
            .await?;
        Ok(Json(MessageResponse {
            message: "User roles updated".to_string(),
        }))
    }

    /// Clear a user's lockout before it expires
    #[oai(
        path = "/users/:user_id/unlock",
        method = "post",
        tag = "AdminTags::Administration"
    )]
    async fn unlock_user(
        &self,
        req: &Request,
        auth: SessionAuth,
        user_id: Path<i32>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        let admin = self.require_admin(&auth, &client).await?;
        self.admin_service
            .unlock_user(user_id.0, admin.id, &client)
            .await?;
        Ok(Json(MessageResponse {
            message: "Account unlocked".to_string(),
        }))
    }

    /// List all applications
    #[oai(path = "/applications", method = "get", tag = "AdminTags::Administration")]
    async fn list_applications(
        &self,
        req: &Request,
        auth: SessionAuth,
    ) -> Result<Json<Vec<ApplicationResponse>>, AuthError> {
        let client = ClientInfo::from_request(req);
        self.require_admin(&auth, &client).await?;
        let apps = self.admin_service.list_applications().await?;
        Ok(Json(
            apps.into_iter()
                .map(|a| ApplicationResponse {
                    id: a.id,
                    key: a.key,
                    name: a.name,
                })
                .collect(),
        ))
    }

    /// Register an application
    #[oai(path = "/applications", method = "post", tag = "AdminTags::Administration")]
    async fn create_application(
        &self,
        req: &Request,
        auth: SessionAuth,
        body: Json<CreateApplicationRequest>,
    ) -> Result<Json<ApplicationResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        self.require_admin(&auth, &client).await?;
        let app = self
            .admin_service
            .create_application(&body.key, &body.name, body.description.clone())
            .await?;
        Ok(Json(ApplicationResponse {
            id: app.id,
            key: app.key,
            name: app.name,
        }))
    }

    /// List the functionalities of an application
    #[oai(
        path = "/applications/:app_key/functionalities",
        method = "get",
        tag = "AdminTags::Administration"
    )]
    async fn list_functionalities(
        &self,
        req: &Request,
        auth: SessionAuth,
        app_key: Path<String>,
    ) -> Result<Json<Vec<FunctionalityResponse>>, AuthError> {
        let client = ClientInfo::from_request(req);
        self.require_admin(&auth, &client).await?;
        let functionalities = self
            .admin_service
            .list_functionalities(&app_key.0)
            .await?;
        Ok(Json(
            functionalities
                .into_iter()
                .map(|f| FunctionalityResponse {
                    id: f.id,
                    application_key: app_key.0.clone(),
                    key: f.key,
                    name: f.name,
                })
                .collect(),
        ))
    }

    /// Add a functionality to an application
    #[oai(path = "/functionalities", method = "post", tag = "AdminTags::Administration")]
    async fn create_functionality(
        &self,
        req: &Request,
        auth: SessionAuth,
        body: Json<CreateFunctionalityRequest>,
    ) -> Result<Json<FunctionalityResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        self.require_admin(&auth, &client).await?;
        let f = self
            .admin_service
            .create_functionality(
                &body.application_key,
                &body.key,
                &body.name,
                body.description.clone(),
            )
            .await?;
        Ok(Json(FunctionalityResponse {
            id: f.id,
            application_key: body.application_key.clone(),
            key: f.key,
            name: f.name,
        }))
    }

    /// Delete audit events older than the retention window
    #[oai(path = "/audit/prune", method = "post", tag = "AdminTags::Administration")]
    async fn prune_audit(
        &self,
        req: &Request,
        auth: SessionAuth,
        body: Json<PruneAuditRequest>,
    ) -> Result<Json<PruneAuditResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        self.require_admin(&auth, &client).await?;
        let deleted = self.admin_service.prune_audit(body.retain_days).await?;
        Ok(Json(PruneAuditResponse { deleted }))
    }
}
