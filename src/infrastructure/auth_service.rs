use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::error::PersistenceError;

use super::api_repository::read_data;
use super::credentials::{AuthUser, CredentialStore};

#[derive(Debug, Error)]
pub enum AuthError {
    /// Input rejected before any request was made.
    #[error("{0}")]
    Invalid(String),

    /// The backend refused the credentials or the registration.
    #[error("{0}")]
    Rejected(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error(transparent)]
    Storage(PersistenceError),
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: AuthUser,
}

impl LoginInput {
    pub fn validate(&self) -> Result<(), AuthError> {
        check_email(&self.email)?;
        check_password(&self.password)
    }
}

impl RegisterInput {
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.name.trim().chars().count() < 2 {
            return Err(AuthError::Invalid("Name must be at least 2 characters".into()));
        }
        check_email(&self.email)?;
        check_password(&self.password)?;
        if self.password != self.confirm_password {
            return Err(AuthError::Invalid("Passwords don't match".into()));
        }
        Ok(())
    }
}

fn check_email(email: &str) -> Result<(), AuthError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
        }
        None => false,
    };
    if valid { Ok(()) } else { Err(AuthError::Invalid("Invalid email address".into())) }
}

fn check_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < 6 {
        return Err(AuthError::Invalid("Password must be at least 6 characters".into()));
    }
    Ok(())
}

/// Signs in against the backend and keeps the resulting session in the credential store.
#[derive(Clone)]
pub struct AuthService {
    client: Client,
    base_url: String,
    credentials: CredentialStore,
}

impl AuthService {
    pub fn new(base_url: &str, credentials: CredentialStore) -> Self {
        Self { client: Client::new(), base_url: base_url.trim_end_matches('/').to_string(), credentials }
    }

    pub async fn login(&self, input: &LoginInput) -> Result<AuthSession, AuthError> {
        input.validate()?;
        let session = self.post("/auth/login", input, "Login failed").await?;
        self.remember(&session).await?;
        tracing::info!(user = %session.user.id, "logged in");
        Ok(session)
    }

    pub async fn register(&self, input: &RegisterInput) -> Result<AuthSession, AuthError> {
        input.validate()?;
        let body = RegisterBody { name: input.name.trim(), email: &input.email, password: &input.password };
        let session = self.post("/auth/register", &body, "Registration failed").await?;
        self.remember(&session).await?;
        tracing::info!(user = %session.user.id, "registered");
        Ok(session)
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.credentials.clear().await.map_err(AuthError::Storage)
    }

    pub async fn is_authenticated(&self) -> Result<bool, AuthError> {
        Ok(self.credentials.token().await.map_err(AuthError::Storage)?.is_some())
    }

    pub async fn current_user(&self) -> Result<Option<AuthUser>, AuthError> {
        self.credentials.user().await.map_err(AuthError::Storage)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B, fallback: &str) -> Result<AuthSession, AuthError> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        match read_data::<AuthSession>(resp).await {
            Ok(Some(session)) => Ok(session),
            Ok(None) => Err(AuthError::Rejected(fallback.to_string())),
            Err(PersistenceError::Api { message, status }) => {
                tracing::warn!(status, %message, "authentication rejected");
                Err(AuthError::Rejected(message))
            }
            Err(PersistenceError::Transport(e)) => Err(AuthError::Transport(e)),
            Err(_) => Err(AuthError::Rejected(fallback.to_string())),
        }
    }

    async fn remember(&self, session: &AuthSession) -> Result<(), AuthError> {
        self.credentials.set_token(&session.token).await.map_err(AuthError::Storage)?;
        self.credentials.set_user(&session.user).await.map_err(AuthError::Storage)
    }
}
