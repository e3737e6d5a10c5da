use std::collections::HashSet;

/// Grants carried by one role in a user's effective role set
#[derive(Debug, Clone, Default)]
pub struct RoleGrants {
    pub role_name: String,
    pub is_allmilo: bool,
    /// Application keys this role has full access to
    pub full_access_apps: HashSet<String>,
    /// (application key, functionality key) pairs granted individually
    pub functionalities: HashSet<(String, String)>,
}

/// Snapshot of a user's effective role set: the primary role (if any) plus
/// all additional roles, with their grants resolved to keys.
///
/// Permission checks are additive across roles; there is no deny grant, so
/// absence of a match is the only way to refuse.
#[derive(Debug, Clone, Default)]
pub struct EffectiveRoleSet {
    pub roles: Vec<RoleGrants>,
}

impl EffectiveRoleSet {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.role_name == name)
    }

    /// True if any role carries the ALLMILO super flag
    pub fn has_allmilo(&self) -> bool {
        self.roles.iter().any(|r| r.is_allmilo)
    }

    /// Whether any role grants access to the application: super role,
    /// full access, or at least one functionality under the app.
    pub fn has_app_access(&self, app_key: &str) -> bool {
        if self.has_allmilo() {
            return true;
        }
        self.roles.iter().any(|r| {
            r.full_access_apps.contains(app_key)
                || r.functionalities.iter().any(|(app, _)| app == app_key)
        })
    }

    /// Whether any role grants the specific functionality. Full access on
    /// the application satisfies every functionality under it.
    pub fn has_functionality(&self, app_key: &str, functionality_key: &str) -> bool {
        if self.has_allmilo() {
            return true;
        }
        self.roles.iter().any(|r| {
            r.full_access_apps.contains(app_key)
                || r
                    .functionalities
                    .contains(&(app_key.to_string(), functionality_key.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str) -> RoleGrants {
        RoleGrants {
            role_name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_role_set_denies_everything() {
        let set = EffectiveRoleSet::default();
        assert!(!set.has_app_access("milosign"));
        assert!(!set.has_functionality("milosign", "view"));
    }

    #[test]
    fn allmilo_bypasses_all_checks() {
        let mut superrole = role("ALLMILO");
        superrole.is_allmilo = true;
        let set = EffectiveRoleSet {
            roles: vec![superrole],
        };
        assert!(set.has_app_access("milosign"));
        assert!(set.has_app_access("never-configured"));
        assert!(set.has_functionality("never-configured", "anything"));
    }

    #[test]
    fn full_access_implies_every_functionality() {
        let mut editor = role("editor");
        editor.full_access_apps.insert("milosign".to_string());
        let set = EffectiveRoleSet {
            roles: vec![editor],
        };
        assert!(set.has_app_access("milosign"));
        assert!(set.has_functionality("milosign", "view"));
        assert!(set.has_functionality("milosign", "delete"));
        assert!(!set.has_functionality("contratacion", "view"));
    }

    #[test]
    fn granular_grant_gives_app_access_but_only_that_functionality() {
        let mut viewer = role("viewer");
        viewer
            .functionalities
            .insert(("milosign".to_string(), "view".to_string()));
        let set = EffectiveRoleSet {
            roles: vec![viewer],
        };
        assert!(set.has_app_access("milosign"));
        assert!(set.has_functionality("milosign", "view"));
        assert!(!set.has_functionality("milosign", "delete"));
    }

    #[test]
    fn permissions_are_additive_across_roles() {
        let mut signer = role("signer");
        signer
            .functionalities
            .insert(("milosign".to_string(), "create".to_string()));
        let unrelated = role("unrelated");
        let set = EffectiveRoleSet {
            roles: vec![unrelated, signer],
        };
        assert!(set.has_functionality("milosign", "create"));
    }
}
