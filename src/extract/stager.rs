//! Stage filtered copies of the global user tables for one site.
//!
//! The staged tables carry the site's own prefix so the dump imports cleanly into a
//! standalone install. The primary site's prefix is the network's base prefix, so its natural
//! names are the live global tables; it stages under `temp_` names and renames on import. The
//! same happens for any site whose natural user table is a custom global one.

use crate::db::php;
use crate::errors::ExtractError;
use crate::models::{
    quote_ident, GlobalTables, RenameMap, TenantContext, UserIdSet, UserTablePlan,
};
use crate::platform::{SqlExecutor, TenantRegistry, UserMetaRow};

/// Result of staging, reported back to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingOutcome {
    pub users: UserIdSet,
    /// Set when no user rows could be carried over
    pub no_users_exported: bool,
}

/// Pick staged table names, refusing any plan that would write into the live tables.
pub fn plan_user_tables(
    tenant: &TenantContext,
    global: &GlobalTables,
) -> Result<UserTablePlan, ExtractError> {
    let natural_users = format!("{}users", tenant.table_prefix);
    let natural_usermeta = format!("{}usermeta", tenant.table_prefix);
    let collision = tenant.primary;

    let plan = if collision || natural_users == global.users {
        let mut renames = RenameMap::default();
        let users = format!("{}temp_users", tenant.table_prefix);
        let usermeta = format!("{}temp_usermeta", tenant.table_prefix);
        renames.push(users.clone(), natural_users);
        renames.push(usermeta.clone(), natural_usermeta);
        UserTablePlan {
            users,
            usermeta,
            renames,
            collision,
        }
    } else {
        UserTablePlan {
            users: natural_users,
            usermeta: natural_usermeta,
            renames: RenameMap::default(),
            collision,
        }
    };

    if plan.users == global.users || plan.usermeta == global.usermeta {
        return Err(ExtractError::CollisionUnresolved(format!(
            "There was an error duplicating user tables: staged table {} would overwrite the global user tables.",
            plan.users
        )));
    }

    Ok(plan)
}

pub fn create_like_sql(staged: &str, source: &str) -> Result<String, ExtractError> {
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} LIKE {}",
        quote_ident(staged)?,
        quote_ident(source)?
    ))
}

pub fn copy_rows_sql(
    staged: &str,
    source: &str,
    id_column: &str,
    ids: &UserIdSet,
) -> Result<String, ExtractError> {
    Ok(format!(
        "INSERT INTO {} SELECT * FROM {} WHERE {} IN ({})",
        quote_ident(staged)?,
        quote_ident(source)?,
        id_column,
        ids.id_list()
    ))
}

pub fn drop_staged_sql(plan: &UserTablePlan) -> Result<String, ExtractError> {
    Ok(format!(
        "DROP TABLE IF EXISTS {}, {}",
        quote_ident(&plan.users)?,
        quote_ident(&plan.usermeta)?
    ))
}

/// Members of the site plus every super admin.
pub async fn collect_user_ids(
    registry: &dyn TenantRegistry,
    tenant: &TenantContext,
) -> Result<UserIdSet, ExtractError> {
    let members = registry.member_user_ids(tenant).await?;

    let mut super_admins = Vec::new();
    for login in registry.super_admin_logins(tenant.network_id).await? {
        match registry.user_id_by_login(&login).await? {
            Some(id) => super_admins.push(id),
            None => tracing::warn!("Super admin {} has no user record, skipping", login),
        }
    }

    Ok(UserIdSet::build(&members, &super_admins))
}

/// Create and fill the staged tables described by `plan`.
pub async fn stage_user_tables(
    sql: &dyn SqlExecutor,
    tenant: &TenantContext,
    global: &GlobalTables,
    plan: &UserTablePlan,
    users: UserIdSet,
) -> Result<StagingOutcome, ExtractError> {
    tracing::info!("Begin copying user tables");
    let mut no_users_exported = false;

    sql.execute(&create_like_sql(&plan.users, &global.users)?)
        .await?;
    if sql.count_rows(&plan.users).await? == 0 {
        tracing::info!("copying main users table");
        if users.is_empty() {
            tracing::info!("No users to copy into {}", plan.users);
            no_users_exported = true;
        } else {
            sql.execute(&copy_rows_sql(&plan.users, &global.users, "ID", &users)?)
                .await?;
        }
    }

    sql.execute(&create_like_sql(&plan.usermeta, &global.usermeta)?)
        .await?;
    if sql.count_rows(&plan.usermeta).await? == 0 {
        tracing::info!("copying main usermeta table");
        if !users.is_empty() {
            sql.execute(&copy_rows_sql(
                &plan.usermeta,
                &global.usermeta,
                "user_id",
                &users,
            )?)
            .await?;
        }
    }

    let capabilities = php::serialize_roles(&["administrator"]);
    for admin in &users.supplemental_admins {
        tracing::debug!("Granting administrator to super admin {}", admin);
        sql.insert_user_meta(
            &plan.usermeta,
            &UserMetaRow {
                user_id: *admin,
                meta_key: tenant.capabilities_key(),
                meta_value: capabilities.clone(),
            },
        )
        .await?;
    }

    Ok(StagingOutcome {
        users,
        no_users_exported,
    })
}
