//! The authentication exchange the session store delegates to.
//!
//! The dashboard has no backend, so [`MockAuthenticator`] stands in for
//! one: it waits out a simulated round trip and hands back a demo identity
//! for any credentials. The sign-in and sign-up form rules can be switched
//! on with [`MockAuthenticator::with_form_checks`].

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use uuid::Uuid;

use crate::app::domain::user::{Role, User, validate_email};
use crate::app::infrastructure::error::{AppError, AuthError, Result};

const MIN_LOGIN_PASSWORD_LEN: usize = 6;
const MIN_REGISTER_PASSWORD_LEN: usize = 8;
const MIN_NAME_LEN: usize = 2;
const DEMO_EMAIL: &str = "admin@dashboard.com";
const DEMO_AVATAR: &str =
    "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=100&h=100&fit=crop&crop=face";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<User>;

    async fn register(&self, registration: &Registration) -> Result<User>;
}

pub struct MockAuthenticator {
    latency: Duration,
    accounts: Mutex<HashSet<String>>,
    failures: Mutex<VecDeque<AuthError>>,
    form_checks: bool,
}

impl MockAuthenticator {
    pub fn new(latency: Duration) -> Self {
        let mut accounts = HashSet::new();
        accounts.insert(DEMO_EMAIL.to_string());
        Self {
            latency,
            accounts: Mutex::new(accounts),
            failures: Mutex::new(VecDeque::new()),
            form_checks: false,
        }
    }

    /// Reject input the login and register forms would not submit.
    pub fn with_form_checks(mut self) -> Self {
        self.form_checks = true;
        self
    }

    /// Make the next exchange fail with `error`, after the usual latency.
    pub fn fail_next(&self, error: AuthError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
    }

    pub fn is_registered(&self, email: &str) -> bool {
        self.accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&email.to_ascii_lowercase())
    }

    /// The identity every demo sign-in resolves to.
    pub fn demo_user() -> User {
        User {
            id: "1".to_string(),
            email: DEMO_EMAIL.to_string(),
            display_name: "John Doe".to_string(),
            avatar_ref: Some(DEMO_AVATAR.to_string()),
            role: Role::Admin,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default(),
        }
    }

    async fn round_trip(&self) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let injected = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match injected {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

impl Default for MockAuthenticator {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

fn validate_password(password: &str, min_len: usize) -> Result<()> {
    if password.chars().count() < min_len {
        return Err(AppError::Validation(format!(
            "Password must be at least {min_len} characters"
        )));
    }
    Ok(())
}

fn validate_login_form(credentials: &Credentials) -> Result<()> {
    validate_email(&credentials.email)?;
    validate_password(&credentials.password, MIN_LOGIN_PASSWORD_LEN)
}

fn validate_register_form(registration: &Registration) -> Result<()> {
    if registration.name.trim().chars().count() < MIN_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Name must be at least {MIN_NAME_LEN} characters"
        )));
    }
    validate_email(&registration.email)?;
    validate_password(&registration.password, MIN_REGISTER_PASSWORD_LEN)
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    async fn login(&self, credentials: &Credentials) -> Result<User> {
        if self.form_checks {
            validate_login_form(credentials)?;
        }
        self.round_trip().await?;

        // Demo backend: any credentials are accepted
        Ok(User {
            email: credentials.email.clone(),
            ..Self::demo_user()
        })
    }

    async fn register(&self, registration: &Registration) -> Result<User> {
        if self.form_checks {
            validate_register_form(registration)?;
        }
        self.round_trip().await?;

        let key = registration.email.to_ascii_lowercase();
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        if !accounts.insert(key) {
            return Err(AuthError::EmailTaken.into());
        }

        Ok(User {
            id: Uuid::new_v4().to_string(),
            email: registration.email.clone(),
            display_name: registration.name.trim().to_string(),
            avatar_ref: None,
            role: Role::User,
            created_at: Utc::now().date_naive(),
        })
    }
}
