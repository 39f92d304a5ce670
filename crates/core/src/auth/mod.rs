mod error;
mod functions;
mod policy;
mod traits;
mod types;

pub use error::AuthError;
pub use functions::{
    calculate_expiry, generate_session_id, is_session_expired, new_profile_from_claims,
    new_session,
};
pub use policy::{evaluate_policy, GuardPolicy, PolicyViolation, RedirectPolicy, RedirectTarget};
pub use traits::{Result, SessionRepository, TokenVerifier};
pub use types::{AuthenticatedUser, Decision, IdentityClaims, Session, SessionId, TokenClaims};
