//! Site (tenant) records.

use serde::Serialize;

/// Id of the primary site of a network.
pub const PRIMARY_BLOG_ID: u64 = 1;

/// Row of the network's site registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogRecord {
    pub blog_id: u64,
    pub network_id: u64,
    pub domain: String,
    pub path: String,
}

/// A resolved site, threaded explicitly through every stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantContext {
    pub id: u64,
    pub network_id: u64,
    pub domain: String,
    pub url_path: String,
    pub table_prefix: String,
    /// The primary site shares the unqualified base prefix with the global tables
    pub primary: bool,
}

impl TenantContext {
    /// Build the context for a registry row under the given base prefix.
    pub fn from_record(record: BlogRecord, base_prefix: &str) -> Self {
        let primary = record.blog_id == PRIMARY_BLOG_ID;
        let table_prefix = if primary {
            base_prefix.to_string()
        } else {
            format!("{}{}_", base_prefix, record.blog_id)
        };

        Self {
            id: record.blog_id,
            network_id: record.network_id,
            domain: record.domain,
            url_path: record.path,
            table_prefix,
            primary,
        }
    }

    /// Domain and path of the site, without a trailing slash.
    pub fn old_url(&self) -> String {
        let url = format!("{}{}", self.domain, self.url_path);
        url.trim_end_matches('/').to_string()
    }

    /// Meta key holding a user's roles on this site.
    pub fn capabilities_key(&self) -> String {
        format!("{}capabilities", self.table_prefix)
    }
}

/// Active theme of a site.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ThemeSlugs {
    pub stylesheet: String,
    pub template: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64) -> BlogRecord {
        BlogRecord {
            blog_id: id,
            network_id: 1,
            domain: "example.com".to_string(),
            path: "/blog/".to_string(),
        }
    }

    #[test]
    fn test_prefix_for_primary_and_secondary_sites() {
        let primary = TenantContext::from_record(record(1), "wp_");
        assert!(primary.primary);
        assert_eq!(primary.table_prefix, "wp_");

        let site = TenantContext::from_record(record(12), "wp_");
        assert!(!site.primary);
        assert_eq!(site.table_prefix, "wp_12_");
        assert_eq!(site.capabilities_key(), "wp_12_capabilities");
    }

    #[test]
    fn test_old_url_drops_trailing_slash() {
        let site = TenantContext::from_record(record(3), "wp_");
        assert_eq!(site.old_url(), "example.com/blog");

        let mut root = record(4);
        root.path = "/".to_string();
        assert_eq!(TenantContext::from_record(root, "wp_").old_url(), "example.com");
    }
}
