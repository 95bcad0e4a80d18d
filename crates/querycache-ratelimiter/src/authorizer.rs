//! Identity resolution and scope checks (§4.6).

use crate::error::AuthorizerError;
use std::collections::HashSet;
use std::sync::Arc;

/// A resolved caller identity: who they are, and what they're allowed to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub scopes: HashSet<String>,
}

/// Verifies an opaque bearer token and resolves it to an [`Identity`].
///
/// Tokens are opaque to this crate (§6); implementations typically wrap a
/// JWT verifier or a session store lookup.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, AuthorizerError>;
}

/// Checks a tool's auth requirements against a resolved (or absent) identity.
#[derive(Clone)]
pub struct Authorizer {
    verifier: Arc<dyn IdentityVerifier>,
}

impl Authorizer {
    pub fn new(verifier: impl IdentityVerifier + 'static) -> Self {
        Self { verifier: Arc::new(verifier) }
    }

    /// Resolves `token` against a tool's requirements.
    ///
    /// Returns `Ok(None)` when the tool does not require auth and no token
    /// was presented. Returns `Ok(Some(identity))` on a successfully
    /// authorized call that did require auth.
    pub fn authorize(
        &self,
        requires_auth: bool,
        required_scopes: &HashSet<String>,
        token: Option<&str>,
    ) -> Result<Option<Identity>, AuthorizerError> {
        if !requires_auth && token.is_none() {
            return Ok(None);
        }

        let token = token.ok_or(AuthorizerError::Unauthenticated)?;
        let identity = self.verifier.verify(token)?;

        let missing: Vec<String> = required_scopes
            .iter()
            .filter(|scope| !identity.scopes.contains(*scope))
            .cloned()
            .collect();

        if !missing.is_empty() {
            return Err(AuthorizerError::Unauthorized { missing });
        }

        Ok(Some(identity))
    }
}
