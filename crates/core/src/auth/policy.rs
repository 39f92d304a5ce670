//! Login policies for the identity linking guard.
//!
//! A [`GuardPolicy`] names the role a login endpoint links identities to and
//! where to send the browser when the linked profile fails a policy check.
//! Evaluation is pure; turning a violation into an HTTP redirect is left to
//! the caller.

use url::Url;

use crate::directory::{Role, UserProfile};

/// Why a linked profile was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyViolation {
    /// The profile has been deactivated.
    Inactive,
    /// The profile was linked under a different role than the endpoint serves.
    InvalidRole,
}

/// How a policy outcome is encoded onto the frontend URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// `<base>#<fragment>`
    Fragment(String),
    /// `<base>?<key>=<value>`
    Query { key: String, value: String },
}

impl RedirectTarget {
    pub fn fragment(fragment: impl Into<String>) -> Self {
        Self::Fragment(fragment.into())
    }

    pub fn query(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Query {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Renders this target against the frontend base URL.
    pub fn apply(&self, base: &Url) -> Url {
        let mut url = base.clone();
        match self {
            Self::Fragment(fragment) => url.set_fragment(Some(fragment)),
            Self::Query { key, value } => {
                url.query_pairs_mut().append_pair(key, value);
            }
        }
        url
    }
}

/// Redirect targets for each policy violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectPolicy {
    pub inactive: RedirectTarget,
    pub invalid_role: RedirectTarget,
}

impl RedirectPolicy {
    pub fn target_for(&self, violation: PolicyViolation) -> &RedirectTarget {
        match violation {
            PolicyViolation::Inactive => &self.inactive,
            PolicyViolation::InvalidRole => &self.invalid_role,
        }
    }
}

/// Configuration of one login endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardPolicy {
    /// Role given to newly linked profiles and required of existing ones.
    pub target_role: Role,
    pub redirects: RedirectPolicy,
}

impl GuardPolicy {
    /// Policy for the regular user portal.
    pub fn user() -> Self {
        Self {
            target_role: Role::User,
            redirects: RedirectPolicy {
                inactive: RedirectTarget::fragment("USER_NOT_ACTIVE"),
                invalid_role: RedirectTarget::fragment("INVALID_ROLE"),
            },
        }
    }

    /// Policy for the staff portal.
    pub fn staff() -> Self {
        Self {
            target_role: Role::Staff,
            redirects: RedirectPolicy {
                inactive: RedirectTarget::query("userInactive", "true"),
                invalid_role: RedirectTarget::query("invalidRole", "true"),
            },
        }
    }

    /// URL to send the browser to for `violation`.
    pub fn redirect_url(&self, violation: PolicyViolation, frontend: &Url) -> Url {
        self.redirects.target_for(violation).apply(frontend)
    }
}

/// Checks an existing or freshly created profile against the endpoint's role.
///
/// The active flag is checked before the role.
pub fn evaluate_policy(profile: &UserProfile, target_role: Role) -> Result<(), PolicyViolation> {
    if !profile.active {
        return Err(PolicyViolation::Inactive);
    }
    if profile.role != target_role {
        return Err(PolicyViolation::InvalidRole);
    }
    Ok(())
}
