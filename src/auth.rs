use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AuthError;
use crate::prefs::SharedStorage;

pub const SESSION_KEY: &str = "authSession";
const MIN_PASSWORD_LEN: usize = 6;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
}

// --- Provider trait ---

/// Implementations are shared with worker threads.
pub trait IdentityProvider: Send + Sync {
    fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError>;
    fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError>;
}

pub fn validate_email(email: &str) -> Result<(), AuthError> {
    if !EMAIL.is_match(email.trim()) {
        return Err(AuthError::Validation("Enter a valid email address.".to_string()));
    }
    Ok(())
}

pub fn validate_sign_in(email: &str, password: &str) -> Result<(), AuthError> {
    validate_email(email)?;
    if password.is_empty() {
        return Err(AuthError::Validation("Enter your password.".to_string()));
    }
    Ok(())
}

pub fn validate_sign_up(email: &str, password: &str, confirm: &str) -> Result<(), AuthError> {
    validate_email(email)?;
    if password != confirm {
        return Err(AuthError::Validation("Passwords do not match.".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(
            "Password should be at least 6 characters long.".to_string(),
        ));
    }
    Ok(())
}

// --- REST identity provider ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    email: String,
    id_token: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

pub struct RestIdentity {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl RestIdentity {
    pub fn new(config: &Config) -> Result<Self, AuthError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            base_url: config.identity_url.trim_end_matches('/').to_string(),
            api_key: config.identity_api_key.clone(),
            client,
        })
    }

    fn call(&self, endpoint: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let api_key = self.api_key.as_deref().ok_or(AuthError::NotConfigured)?;
        let url = format!("{}/accounts:{}", self.base_url, endpoint);

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&PasswordRequest {
                email: email.trim(),
                password,
                return_secure_token: true,
            })
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let code = response
                .json::<ErrorResponse>()
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
            warn!(endpoint, %code, "identity service rejected request");
            return Err(AuthError::Rejected(describe_error(&code)));
        }

        let body: PasswordResponse = response.json()?;
        Ok(User {
            uid: body.local_id,
            email: body.email,
            id_token: body.id_token,
            refresh_token: body.refresh_token,
        })
    }
}

impl IdentityProvider for RestIdentity {
    fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.call("signInWithPassword", email, password)
    }

    fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.call("signUp", email, password)
    }
}

/// Turns identity-service error codes into the text shown under the form.
fn describe_error(code: &str) -> String {
    // Codes can carry a detail suffix: "WEAK_PASSWORD : Password should be ..."
    let key = code.split(" : ").next().unwrap_or(code).trim();
    match key {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Failed to log in. Please check your credentials.".to_string()
        }
        "USER_DISABLED" => "This account has been disabled.".to_string(),
        "EMAIL_EXISTS" => "An account with this email already exists.".to_string(),
        "INVALID_EMAIL" => "Enter a valid email address.".to_string(),
        "WEAK_PASSWORD" => "Password should be at least 6 characters long.".to_string(),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts. Try again later.".to_string(),
        other => format!("Authentication failed ({}).", other),
    }
}

// --- Session ---

pub type ListenerId = usize;
type Listener = Box<dyn FnMut(Option<&User>)>;

/// Current signed-in user plus everyone watching for changes to it.
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    storage: SharedStorage,
    user: Option<User>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: ListenerId,
}

impl AuthSession {
    /// Restores any session left in local storage.
    pub fn open(provider: Arc<dyn IdentityProvider>, storage: SharedStorage) -> Self {
        let user = storage
            .borrow()
            .get_item(SESSION_KEY)
            .and_then(|raw| serde_json::from_str(raw).ok());
        Self {
            provider,
            storage,
            user,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Handle for calling the identity service off the UI thread.
    pub fn provider(&self) -> Arc<dyn IdentityProvider> {
        Arc::clone(&self.provider)
    }

    /// Adopts a user the provider already authenticated.
    pub fn establish(&mut self, user: User) {
        info!(email = %user.email, "session established");
        self.set_user(Some(user));
    }

    /// The listener fires right away with the current state, then on every change.
    pub fn subscribe<F>(&mut self, mut listener: F) -> ListenerId
    where
        F: FnMut(Option<&User>) + 'static,
    {
        listener(self.user.as_ref());
        self.next_listener += 1;
        self.listeners.push((self.next_listener, Box::new(listener)));
        self.next_listener
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        validate_sign_in(email, password)?;
        let user = self.provider.sign_in(email, password)?;
        self.establish(user.clone());
        Ok(user)
    }

    pub fn sign_up(&mut self, email: &str, password: &str, confirm: &str) -> Result<User, AuthError> {
        validate_sign_up(email, password, confirm)?;
        let user = self.provider.sign_up(email, password)?;
        self.establish(user.clone());
        Ok(user)
    }

    pub fn sign_out(&mut self) {
        if self.user.is_some() {
            info!("signed out");
            self.set_user(None);
        }
    }

    fn set_user(&mut self, user: Option<User>) {
        self.user = user;

        let persisted = match &self.user {
            Some(user) => serde_json::to_string(user)
                .map_err(Into::into)
                .and_then(|raw| self.storage.borrow_mut().set_item(SESSION_KEY, raw)),
            None => self.storage.borrow_mut().remove_item(SESSION_KEY),
        };
        if let Err(e) = persisted {
            warn!(error = %e, "failed to persist session");
        }

        for (_, listener) in self.listeners.iter_mut() {
            listener(self.user.as_ref());
        }
    }
}
