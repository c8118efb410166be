//! Auth resolver: identity verification, role probing and session caching.
//!
//! A bearer token is verified by an [`IdentityVerifier`], then the ordered
//! [`RoleProbe`]s are asked in turn whether the identity holds their role. The
//! first hit wins. The resolved [`Session`] is cached per token until the
//! token expires or the session is signed out.

use std::collections::HashMap;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use ripple_common::{AppError, AppResult, AuthConfig, RoleLookupFailurePolicy};
use ripple_db::repositories::StaffRepository;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

/// Staff role of a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Supervisor,
}

impl Role {
    /// Console home path for this role.
    #[must_use]
    pub const fn home(&self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Supervisor => "/supervisor",
        }
    }
}

/// A verified identity as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Provider subject id.
    pub subject: String,
    pub email: Option<String>,
    /// Token expiry (unix seconds).
    pub expires_at: Option<i64>,
}

/// The role-scoped user attached to an auth session.
///
/// `role` is `None` when no role record matched and the session was kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub block_id: Option<String>,
}

impl Session {
    /// Role of this session, or `RoleUndetermined`.
    pub fn require_role(&self) -> AppResult<Role> {
        self.role.ok_or(AppError::RoleUndetermined)
    }
}

/// Metadata carried by a role record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaffRecord {
    pub email: Option<String>,
    pub block_id: Option<String>,
}

/// Verifies bearer tokens.
#[async_trait::async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify a token. Invalid or expired tokens are `Unauthenticated`.
    async fn verify(&self, token: &str) -> AppResult<Identity>;
}

/// A lookup that classifies an identity as one specific role.
#[async_trait::async_trait]
pub trait RoleProbe: Send + Sync {
    /// The role this probe grants.
    fn role(&self) -> Role;

    /// Look up the role record for an identity.
    async fn probe(&self, identity: &Identity) -> AppResult<Option<StaffRecord>>;
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    email: Option<String>,
    exp: Option<i64>,
}

/// JWT identity verifier (HS256 shared secret or RS256 public key).
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Build a verifier from the auth configuration.
    pub fn from_config(config: &AuthConfig) -> AppResult<Self> {
        let (key, algorithm) = if let Some(pem) = &config.jwt_public_key_pem {
            let key = DecodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| AppError::Config(format!("Invalid JWT public key: {e}")))?;
            (key, Algorithm::RS256)
        } else if let Some(secret) = &config.jwt_secret {
            (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
        } else {
            return Err(AppError::Config(
                "auth.jwt_secret or auth.jwt_public_key_pem must be set".to_string(),
            ));
        };

        let mut validation = Validation::new(algorithm);
        validation.set_required_spec_claims(&["sub", "exp"]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self { key, validation })
    }
}

#[async_trait::async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> AppResult<Identity> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected identity token");
            AppError::Unauthenticated
        })?;

        Ok(Identity {
            subject: data.claims.sub,
            email: data.claims.email,
            expires_at: data.claims.exp,
        })
    }
}

/// Probe against the `admins` table.
pub struct AdminProbe {
    staff: StaffRepository,
}

impl AdminProbe {
    #[must_use]
    pub const fn new(staff: StaffRepository) -> Self {
        Self { staff }
    }
}

#[async_trait::async_trait]
impl RoleProbe for AdminProbe {
    fn role(&self) -> Role {
        Role::Admin
    }

    async fn probe(&self, identity: &Identity) -> AppResult<Option<StaffRecord>> {
        Ok(self
            .staff
            .find_admin(&identity.subject)
            .await?
            .map(|admin| StaffRecord {
                email: admin.email,
                block_id: None,
            }))
    }
}

/// Probe against the `supervisors` table.
pub struct SupervisorProbe {
    staff: StaffRepository,
}

impl SupervisorProbe {
    #[must_use]
    pub const fn new(staff: StaffRepository) -> Self {
        Self { staff }
    }
}

#[async_trait::async_trait]
impl RoleProbe for SupervisorProbe {
    fn role(&self) -> Role {
        Role::Supervisor
    }

    async fn probe(&self, identity: &Identity) -> AppResult<Option<StaffRecord>> {
        Ok(self
            .staff
            .find_supervisor(&identity.subject)
            .await?
            .map(|supervisor| StaffRecord {
                email: supervisor.email,
                block_id: supervisor.block_id,
            }))
    }
}

/// Outcome of guarding a console route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    RedirectToLogin,
    /// Signed in with another role; send them to that role's console.
    RedirectTo(&'static str),
    Denied(String),
}

/// Decide whether a session may enter a console that requires `required`.
#[must_use]
pub fn authorize(session: Option<&Session>, required: Role) -> AccessDecision {
    match session.map(|s| s.role) {
        None => AccessDecision::RedirectToLogin,
        Some(Some(role)) if role == required => AccessDecision::Granted,
        Some(Some(role)) => AccessDecision::RedirectTo(role.home()),
        Some(None) => AccessDecision::Denied(AppError::RoleUndetermined.to_string()),
    }
}

/// How long a revocation is kept for a token without an `exp` claim.
const UNEXPIRING_REVOCATION_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
struct CachedSession {
    session: Session,
    expires_at: Option<i64>,
}

/// Resolves bearer tokens into sessions.
#[derive(Clone)]
pub struct AuthResolver {
    verifier: Arc<dyn IdentityVerifier>,
    probes: Vec<Arc<dyn RoleProbe>>,
    policy: RoleLookupFailurePolicy,
    sessions: Arc<RwLock<HashMap<String, CachedSession>>>,
    /// Signed-out token keys and the time their token expires.
    revoked: Arc<RwLock<HashMap<String, i64>>>,
}

impl AuthResolver {
    /// Create a resolver. Probes are consulted in the given order.
    #[must_use]
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        probes: Vec<Arc<dyn RoleProbe>>,
        policy: RoleLookupFailurePolicy,
    ) -> Self {
        Self {
            verifier,
            probes,
            policy,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            revoked: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Resolve a token into a session. The role may be absent.
    pub async fn session(&self, token: &str) -> AppResult<Session> {
        let key = token_key(token);
        let now = chrono::Utc::now().timestamp();

        if self.revoked.read().await.contains_key(&key) {
            return Err(AppError::Unauthenticated);
        }

        if let Some(cached) = self.sessions.read().await.get(&key)
            && cached.expires_at.is_none_or(|exp| exp > now)
        {
            return Ok(cached.session.clone());
        }
        self.sessions.write().await.remove(&key);

        let identity = self.verifier.verify(token).await?;
        let found = self.probe_roles(&identity).await;

        let session = match found {
            Some((role, record)) => Session {
                id: identity.subject.clone(),
                email: identity.email.clone().or(record.email),
                role: Some(role),
                block_id: record.block_id,
            },
            None => match self.policy {
                RoleLookupFailurePolicy::ClearRole => {
                    tracing::info!(user_id = %identity.subject, "No role record; role cleared");
                    Session {
                        id: identity.subject.clone(),
                        email: identity.email.clone(),
                        role: None,
                        block_id: None,
                    }
                }
                RoleLookupFailurePolicy::SignOut => {
                    tracing::info!(user_id = %identity.subject, "No role record; signing out");
                    self.revoke(key, identity.expires_at).await;
                    return Err(AppError::Unauthenticated);
                }
            },
        };

        if identity.expires_at.is_none_or(|exp| exp > now) {
            let mut sessions = self.sessions.write().await;
            sessions.retain(|_, c| c.expires_at.is_none_or(|exp| exp > now));
            sessions.insert(
                key,
                CachedSession {
                    session: session.clone(),
                    expires_at: identity.expires_at,
                },
            );
        }

        Ok(session)
    }

    /// Resolve a token into a session that holds a role.
    pub async fn resolve(&self, token: &str) -> AppResult<Session> {
        let session = self.session(token).await?;
        session.require_role()?;
        Ok(session)
    }

    /// Discard the cached session and refuse the token from now on.
    ///
    /// Only tokens that are cached or still verify can be revoked.
    pub async fn sign_out(&self, token: &str) -> AppResult<()> {
        let key = token_key(token);
        let cached = self.sessions.write().await.remove(&key);
        let expires_at = match cached {
            Some(c) => c.expires_at,
            None => self.verifier.verify(token).await?.expires_at,
        };
        self.revoke(key, expires_at).await;
        Ok(())
    }

    async fn probe_roles(&self, identity: &Identity) -> Option<(Role, StaffRecord)> {
        for probe in &self.probes {
            match probe.probe(identity).await {
                Ok(Some(record)) => {
                    tracing::debug!(user_id = %identity.subject, role = ?probe.role(), "Role probe hit");
                    return Some((probe.role(), record));
                }
                Ok(None) => {
                    tracing::debug!(user_id = %identity.subject, role = ?probe.role(), "Role probe miss");
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = %identity.subject,
                        role = ?probe.role(),
                        error = %e,
                        "Role probe failed; treating as miss"
                    );
                }
            }
        }
        None
    }

    async fn revoke(&self, key: String, expires_at: Option<i64>) {
        let now = chrono::Utc::now().timestamp();
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| *exp > now);
        let until = expires_at.unwrap_or(now + UNEXPIRING_REVOCATION_SECS);
        if until > now {
            revoked.insert(key, until);
        }
    }
}

fn token_key(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
