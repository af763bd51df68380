//! Resolve a blog id into a [`TenantContext`].

use crate::errors::ExtractError;
use crate::models::TenantContext;
use crate::platform::TenantRegistry;

/// Check multisite mode and look the site up.
pub async fn resolve(
    registry: &dyn TenantRegistry,
    multisite: bool,
    base_prefix: &str,
    blog_id: u64,
) -> Result<TenantContext, ExtractError> {
    if !multisite {
        return Err(ExtractError::NotMultiTenant(
            "This is a multisite command only.".to_string(),
        ));
    }

    let record = match blog_id {
        0 => None,
        id => registry.blog_details(id).await?,
    };

    let record = record.ok_or_else(|| {
        ExtractError::InvalidTenant(format!("Given blog id {} is invalid.", blog_id))
    })?;

    Ok(TenantContext::from_record(record, base_prefix))
}
