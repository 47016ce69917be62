//! Role-based search filter construction.
//!
//! Derives an OData `$filter` expression from the caller's role set. The
//! contract is fail-closed: when no usable roles are present, the filter
//! matches zero documents rather than falling open. Only the `admin` role
//! bypasses filtering entirely.

use crate::models::UserContext;

/// Filter that effectively returns no results.
const DENY_ALL_FILTER: &str = "id eq 'no_access'";

/// Outcome of filter construction for a user context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleFilter {
    /// Admin: no filter applied, all documents visible.
    Unrestricted,
    /// Disjunction over the user's roles against each document's allow-list.
    Roles(String),
    /// No usable roles: match nothing.
    DenyAll,
}

impl RoleFilter {
    /// The `$filter` value to send with the query, or `None` for unrestricted.
    pub fn to_odata(&self) -> Option<String> {
        match self {
            RoleFilter::Unrestricted => None,
            RoleFilter::Roles(expr) => Some(expr.clone()),
            RoleFilter::DenyAll => Some(DENY_ALL_FILTER.to_string()),
        }
    }
}

/// Build the role filter for a user context.
///
/// Blank roles are dropped; remaining roles are quoted for OData. A context
/// whose role set is empty (or becomes empty after cleaning) gets
/// [`RoleFilter::DenyAll`].
pub fn build_role_filter(user: &UserContext) -> RoleFilter {
    if user.roles.iter().any(|r| r.trim() == "admin") {
        return RoleFilter::Unrestricted;
    }

    let terms: Vec<String> = user
        .roles
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .map(|r| format!("allowed_roles/any(r: r eq '{}')", escape_odata(r)))
        .collect();

    if terms.is_empty() {
        return RoleFilter::DenyAll;
    }

    RoleFilter::Roles(format!("({})", terms.join(" or ")))
}

/// Escape a string literal for OData: single quotes double up.
fn escape_odata(value: &str) -> String {
    value.replace('\'', "''")
}
