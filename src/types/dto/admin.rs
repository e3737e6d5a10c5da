use poem_openapi::Object;

#[derive(Object, Debug)]
pub struct CreateRoleRequest {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    /// Super-role flag: bypasses every app/functionality check
    pub is_allmilo: bool,
}

#[derive(Object, Debug)]
pub struct RoleResponse {
    pub id: i32,
    pub name: String,
    pub display_name: String,
    pub is_allmilo: bool,
    pub is_active: bool,
}

#[derive(Object, Debug)]
pub struct CreateApplicationRequest {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Object, Debug)]
pub struct ApplicationResponse {
    pub id: i32,
    pub key: String,
    pub name: String,
}

#[derive(Object, Debug)]
pub struct CreateFunctionalityRequest {
    pub application_key: String,
    pub key: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Object, Debug)]
pub struct FunctionalityResponse {
    pub id: i32,
    pub application_key: String,
    pub key: String,
    pub name: String,
}

/// One granular grant in a role permission set
#[derive(Object, Debug)]
pub struct FunctionalityGrant {
    pub application_key: String,
    pub functionality_key: String,
}

/// Replace-all permission set for a role, mirroring the admin permissions
/// form: previous grants for the role are deleted and these inserted.
#[derive(Object, Debug)]
pub struct RolePermissionsRequest {
    /// Application keys granted with full access
    pub full_access: Vec<String>,
    /// Individual functionality grants
    pub functionalities: Vec<FunctionalityGrant>,
}

/// Bulk-replace of a user's additional roles. The legacy primary role_id is
/// left untouched.
#[derive(Object, Debug)]
pub struct AssignRolesRequest {
    pub role_ids: Vec<i32>,
}

#[derive(Object, Debug)]
pub struct PruneAuditRequest {
    /// Entries older than this many days are deleted
    pub retain_days: i64,
}

#[derive(Object, Debug)]
pub struct PruneAuditResponse {
    pub deleted: u64,
}
