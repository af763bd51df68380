//! Table naming for a site export.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::{is_safe_identifier, TenantContext};
use crate::errors::ExtractError;

/// Per-site table roles, in the order the platform declares them.
pub const BLOG_TABLE_ROLES: &[&str] = &[
    "posts",
    "comments",
    "links",
    "options",
    "postmeta",
    "terms",
    "term_taxonomy",
    "term_relationships",
    "termmeta",
    "commentmeta",
];

/// Quote a table name with backticks after checking it is a plain identifier.
pub fn quote_ident(name: &str) -> Result<String, ExtractError> {
    if is_safe_identifier(name) {
        Ok(format!("`{}`", name))
    } else {
        Err(ExtractError::Platform(format!(
            "Refusing to use table name {:?}",
            name
        )))
    }
}

/// One staged table that must be renamed on import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameEntry {
    pub staged: String,
    pub canonical: String,
}

/// Staged → canonical renames, only populated for the primary site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameMap {
    entries: Vec<RenameEntry>,
}

impl RenameMap {
    pub fn push(&mut self, staged: impl Into<String>, canonical: impl Into<String>) {
        self.entries.push(RenameEntry {
            staged: staged.into(),
            canonical: canonical.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `RENAME TABLE` directives appended to the dump.
    pub fn statements(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| format!("RENAME TABLE `{}` TO `{}`;", e.staged, e.canonical))
            .collect()
    }
}

/// Names of the staged user tables and whether they had to dodge the global ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTablePlan {
    pub users: String,
    pub usermeta: String,
    pub renames: RenameMap,
    /// True exactly for the primary site, whose natural user table names are the global ones
    pub collision: bool,
}

/// Logical role → physical table name for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSet {
    tables: BTreeMap<String, String>,
}

impl TableSet {
    /// Blog tables of the site with `users`/`usermeta` pointing at the staged copies.
    pub fn for_tenant(tenant: &TenantContext, plan: &UserTablePlan) -> Self {
        let mut tables: BTreeMap<String, String> = BLOG_TABLE_ROLES
            .iter()
            .map(|role| (role.to_string(), format!("{}{}", tenant.table_prefix, role)))
            .collect();
        tables.insert("users".to_string(), plan.users.clone());
        tables.insert("usermeta".to_string(), plan.usermeta.clone());
        Self { tables }
    }

    #[cfg(test)]
    pub fn get(&self, role: &str) -> Option<&str> {
        self.tables.get(role).map(String::as_str)
    }

    /// Physical names, for the dump process.
    pub fn names(&self) -> Vec<String> {
        self.tables.values().cloned().collect()
    }
}

/// Users carried into the standalone site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserIdSet {
    pub ids: BTreeSet<u64>,
    /// Super admins that are not members of the site, in super-admin order
    pub supplemental_admins: Vec<u64>,
}

impl UserIdSet {
    pub fn build(members: &[u64], super_admins: &[u64]) -> Self {
        let member_set: BTreeSet<u64> = members.iter().copied().collect();

        let mut supplemental_admins = Vec::new();
        for id in super_admins {
            if *id != 0 && !member_set.contains(id) && !supplemental_admins.contains(id) {
                supplemental_admins.push(*id);
            }
        }

        let ids = members
            .iter()
            .chain(super_admins)
            .copied()
            .filter(|id| *id != 0)
            .collect();

        Self {
            ids,
            supplemental_admins,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Comma separated id list for an `IN (...)` clause.
    pub fn id_list(&self) -> String {
        self.ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlogRecord;

    #[test]
    fn test_table_set_overrides_user_tables() {
        let tenant = TenantContext::from_record(
            BlogRecord {
                blog_id: 5,
                network_id: 1,
                domain: "example.com".to_string(),
                path: "/five/".to_string(),
            },
            "wp_",
        );
        let plan = UserTablePlan {
            users: "wp_5_users".to_string(),
            usermeta: "wp_5_usermeta".to_string(),
            renames: RenameMap::default(),
            collision: false,
        };
        let set = TableSet::for_tenant(&tenant, &plan);

        assert_eq!(set.get("posts"), Some("wp_5_posts"));
        assert_eq!(set.get("users"), Some("wp_5_users"));
        assert_eq!(set.get("usermeta"), Some("wp_5_usermeta"));
        assert_eq!(set.names().len(), BLOG_TABLE_ROLES.len() + 2);
    }

    #[test]
    fn test_user_id_set_includes_every_super_admin() {
        let set = UserIdSet::build(&[3, 4, 0], &[1, 4, 1, 9]);
        assert_eq!(set.ids.iter().copied().collect::<Vec<_>>(), vec![1, 3, 4, 9]);
        assert_eq!(set.supplemental_admins, vec![1, 9]);
        assert_eq!(set.id_list(), "1,3,4,9");
    }

    #[test]
    fn test_user_id_set_empty() {
        let set = UserIdSet::build(&[], &[]);
        assert!(set.is_empty());
        assert!(set.supplemental_admins.is_empty());
        assert_eq!(set.id_list(), "");
    }

    #[test]
    fn test_rename_statements_keep_order() {
        let mut renames = RenameMap::default();
        renames.push("wp_temp_users", "wp_users");
        renames.push("wp_temp_usermeta", "wp_usermeta");
        assert_eq!(
            renames.statements(),
            vec![
                "RENAME TABLE `wp_temp_users` TO `wp_users`;".to_string(),
                "RENAME TABLE `wp_temp_usermeta` TO `wp_usermeta`;".to_string(),
            ]
        );
    }

    #[test]
    fn test_quote_ident_rejects_injection() {
        assert_eq!(quote_ident("wp_posts").unwrap(), "`wp_posts`");
        assert!(quote_ident("wp_posts` where 1").is_err());
    }
}
