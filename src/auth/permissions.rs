/*!
 * # Permissions Module
 *
 * This module defines permissions for resources in the system.
 * Permissions are organized by resource type and action.
 */

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Permission definition
#[derive(Debug, Clone)]
pub struct Permission {
    pub name: String,
    pub description: String,
    pub resource_type: String,
    pub action: String,
}

/// Permission actions
pub struct Actions;

impl Actions {
    pub const VIEW: &'static str = "view";
    pub const UPDATE: &'static str = "update";
    pub const DELETE: &'static str = "delete";
    pub const CHECKOUT: &'static str = "checkout";
    pub const CHECKIN: &'static str = "checkin";
    pub const ALL: &'static str = "*";
}

/// Resource types
pub struct Resources;

impl Resources {
    pub const ASSETS: &'static str = "assets";
    pub const LICENSES: &'static str = "licenses";
    pub const USERS: &'static str = "users";
    pub const LOCATIONS: &'static str = "locations";
    pub const REPORTS: &'static str = "reports";
    pub const SETTINGS: &'static str = "settings";
    pub const ADMIN: &'static str = "admin";
}

/// Common permission string constants for compile-time safety
pub mod consts {
    // Assets
    pub const ASSETS_VIEW: &str = "assets:view";
    pub const ASSETS_UPDATE: &str = "assets:update";
    pub const ASSETS_DELETE: &str = "assets:delete";
    pub const ASSETS_CHECKOUT: &str = "assets:checkout";
    pub const ASSETS_CHECKIN: &str = "assets:checkin";
}

/// Format a permission string
pub fn format_permission(resource: &str, action: &str) -> String {
    format!("{}:{}", resource, action)
}

// Permission set definition with descriptions
lazy_static! {
    pub static ref PERMISSIONS: HashMap<String, Permission> = {
        let mut perms = HashMap::new();

        // Asset permissions
        perms.insert(
            format_permission(Resources::ASSETS, Actions::VIEW),
            Permission {
                name: format_permission(Resources::ASSETS, Actions::VIEW),
                description: "View assets and prepare bulk actions".to_string(),
                resource_type: Resources::ASSETS.to_string(),
                action: Actions::VIEW.to_string(),
            },
        );

        perms.insert(
            format_permission(Resources::ASSETS, Actions::UPDATE),
            Permission {
                name: format_permission(Resources::ASSETS, Actions::UPDATE),
                description: "Update assets, including bulk edits and restores".to_string(),
                resource_type: Resources::ASSETS.to_string(),
                action: Actions::UPDATE.to_string(),
            },
        );

        perms.insert(
            format_permission(Resources::ASSETS, Actions::DELETE),
            Permission {
                name: format_permission(Resources::ASSETS, Actions::DELETE),
                description: "Delete assets".to_string(),
                resource_type: Resources::ASSETS.to_string(),
                action: Actions::DELETE.to_string(),
            },
        );

        perms.insert(
            format_permission(Resources::ASSETS, Actions::CHECKOUT),
            Permission {
                name: format_permission(Resources::ASSETS, Actions::CHECKOUT),
                description: "Check assets out to users, locations or other assets".to_string(),
                resource_type: Resources::ASSETS.to_string(),
                action: Actions::CHECKOUT.to_string(),
            },
        );

        perms.insert(
            format_permission(Resources::ASSETS, Actions::CHECKIN),
            Permission {
                name: format_permission(Resources::ASSETS, Actions::CHECKIN),
                description: "Check assets back in from their assignees".to_string(),
                resource_type: Resources::ASSETS.to_string(),
                action: Actions::CHECKIN.to_string(),
            },
        );

        perms.insert(
            format_permission(Resources::ASSETS, Actions::ALL),
            Permission {
                name: format_permission(Resources::ASSETS, Actions::ALL),
                description: "Full control over assets".to_string(),
                resource_type: Resources::ASSETS.to_string(),
                action: Actions::ALL.to_string(),
            },
        );

        // License permissions
        perms.insert(
            format_permission(Resources::LICENSES, Actions::VIEW),
            Permission {
                name: format_permission(Resources::LICENSES, Actions::VIEW),
                description: "View licenses and seat assignments".to_string(),
                resource_type: Resources::LICENSES.to_string(),
                action: Actions::VIEW.to_string(),
            },
        );

        perms.insert(
            format_permission(Resources::LICENSES, Actions::ALL),
            Permission {
                name: format_permission(Resources::LICENSES, Actions::ALL),
                description: "Full control over licenses".to_string(),
                resource_type: Resources::LICENSES.to_string(),
                action: Actions::ALL.to_string(),
            },
        );

        // User directory permissions
        perms.insert(
            format_permission(Resources::USERS, Actions::VIEW),
            Permission {
                name: format_permission(Resources::USERS, Actions::VIEW),
                description: "View users".to_string(),
                resource_type: Resources::USERS.to_string(),
                action: Actions::VIEW.to_string(),
            },
        );

        // Location permissions
        perms.insert(
            format_permission(Resources::LOCATIONS, Actions::VIEW),
            Permission {
                name: format_permission(Resources::LOCATIONS, Actions::VIEW),
                description: "View locations".to_string(),
                resource_type: Resources::LOCATIONS.to_string(),
                action: Actions::VIEW.to_string(),
            },
        );

        // Report permissions
        perms.insert(
            format_permission(Resources::REPORTS, Actions::VIEW),
            Permission {
                name: format_permission(Resources::REPORTS, Actions::VIEW),
                description: "View activity reports".to_string(),
                resource_type: Resources::REPORTS.to_string(),
                action: Actions::VIEW.to_string(),
            },
        );

        // Settings permissions
        perms.insert(
            format_permission(Resources::SETTINGS, Actions::ALL),
            Permission {
                name: format_permission(Resources::SETTINGS, Actions::ALL),
                description: "Manage instance settings".to_string(),
                resource_type: Resources::SETTINGS.to_string(),
                action: Actions::ALL.to_string(),
            },
        );

        // Admin permissions
        perms.insert(
            format_permission(Resources::ADMIN, Actions::ALL),
            Permission {
                name: format_permission(Resources::ADMIN, Actions::ALL),
                description: "Full administrator access".to_string(),
                resource_type: Resources::ADMIN.to_string(),
                action: Actions::ALL.to_string(),
            },
        );

        perms
    };
}

/// Service for resolving permission grants
#[derive(Clone)]
pub struct PermissionService;

impl PermissionService {
    /// Get a permission by name
    pub fn get_permission(name: &str) -> Option<&'static Permission> {
        PERMISSIONS.get(name)
    }

    /// Check if a permission exists in the catalog
    pub fn permission_exists(name: &str) -> bool {
        PERMISSIONS.contains_key(name)
    }

    /// Check if a permission is implied by another permission
    pub fn is_permission_implied(user_perm: &str, required_perm: &str) -> bool {
        // Direct match
        if user_perm == required_perm {
            return true;
        }

        // Wildcard match (resource:*)
        let user_parts: Vec<&str> = user_perm.split(':').collect();
        let required_parts: Vec<&str> = required_perm.split(':').collect();

        if user_parts.len() == 2 && required_parts.len() == 2 {
            let user_resource = user_parts[0];
            let user_action = user_parts[1];
            let required_resource = required_parts[0];

            // Check for resource wildcard (resource:*)
            if user_resource == required_resource && user_action == "*" {
                return true;
            }

            // Check for admin permission (admin:*)
            if user_resource == "admin" && user_action == "*" {
                return true;
            }
        }

        // Global wildcard match
        if user_perm == "*" {
            return true;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn catalog_contains_every_const() {
        for name in [
            consts::ASSETS_VIEW,
            consts::ASSETS_UPDATE,
            consts::ASSETS_DELETE,
            consts::ASSETS_CHECKOUT,
            consts::ASSETS_CHECKIN,
        ] {
            assert!(
                PermissionService::permission_exists(name),
                "missing catalog entry for {name}"
            );
        }
    }

    #[test]
    fn catalog_entries_carry_their_own_name() {
        let perm = PermissionService::get_permission(consts::ASSETS_CHECKOUT)
            .expect("checkout permission");
        assert_eq!(perm.name, "assets:checkout");
        assert_eq!(perm.resource_type, "assets");
        assert_eq!(perm.action, "checkout");
    }

    #[test_case("assets:update", "assets:update", true; "exact match")]
    #[test_case("assets:*", "assets:delete", true; "resource wildcard")]
    #[test_case("admin:*", "assets:checkin", true; "admin wildcard")]
    #[test_case("*", "assets:view", true; "global wildcard")]
    #[test_case("assets:view", "assets:update", false; "different action")]
    #[test_case("licenses:*", "assets:update", false; "different resource")]
    fn permission_implication(granted: &str, required: &str, expected: bool) {
        assert_eq!(
            PermissionService::is_permission_implied(granted, required),
            expected
        );
    }
}
