//! Session utility and the `login` / `logout` / `whoami` / `register` commands.
//!
//! Role checks here only decide what the UI offers. The server enforces
//! authorization on every request regardless of what the client shows.

use anyhow::{bail, Result};
use shared::{RegisterRequest, User};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::api::ApiClient;
use crate::events::{AppEvent, EventBus};
use crate::storage::{CredentialStore, StoreError};

#[derive(Debug, Clone)]
pub struct AuthService {
    store: Arc<CredentialStore>,
    events: EventBus,
}

impl AuthService {
    pub fn new(store: Arc<CredentialStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// A token is stored. Says nothing about whether the server accepts it.
    pub fn is_authenticated(&self) -> bool {
        self.store.token().is_some()
    }

    /// Cached user record from the last login or validation
    pub fn current_user(&self) -> Option<User> {
        self.store.user()
    }

    /// UI hint only
    pub fn is_admin(&self) -> bool {
        self.current_user().map(|u| u.is_admin()).unwrap_or(false)
    }

    /// Forget credentials and tell listeners to start over
    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.clear()?;
        tracing::info!("Logged out");
        self.events.publish(AppEvent::LoggedOut);
        Ok(())
    }

    /// Reaction to [`AppEvent::AuthError`]: force a logout if credentials
    /// are somehow still around. Returns whether a logout happened.
    pub fn handle_auth_error(&self) -> Result<bool, StoreError> {
        if self.is_authenticated() {
            self.logout()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        bail!("{} is required", label);
    }
    Ok(value)
}

/// Log in from the command line, prompting for anything not given
pub async fn login(api: &ApiClient, username: Option<String>, password: Option<String>) -> Result<User> {
    let username = match username {
        Some(u) => u,
        None => prompt("Username")?,
    };
    let password = match password {
        Some(p) => p,
        None => prompt("Password")?,
    };

    let user = api.login(&username, &password).await?;
    println!();
    println!("\x1b[1;32m✅ Login successful!\x1b[0m");
    println!("\x1b[90mSigned in as {} ({})\x1b[0m", user.username, user.role.label());
    Ok(user)
}

/// Create an account interactively, then log in with it
pub async fn register(api: &ApiClient) -> Result<User> {
    let request = RegisterRequest {
        username: prompt("Username")?,
        email: prompt("Email")?,
        first_name: prompt("First name")?,
        last_name: prompt("Last name")?,
        password: prompt("Password")?,
        phone: None,
    };

    let user = api.register(&request).await?;
    println!("\x1b[1;32m✅ Account created, you are logged in as {}\x1b[0m", user.username);
    Ok(user)
}

/// Logout by clearing the stored credentials
pub fn logout(auth: &AuthService) -> Result<()> {
    auth.logout()?;
    println!("\x1b[32m✅ Logged out successfully\x1b[0m");
    Ok(())
}

/// Show current login status, checking the token against the server
pub async fn whoami(api: &ApiClient, auth: &AuthService) -> Result<()> {
    if !auth.is_authenticated() {
        println!("\x1b[33m✗ Not logged in\x1b[0m");
        println!("Run '\x1b[1mcinema login\x1b[0m' to authenticate");
        return Ok(());
    }

    match api.current_user().await {
        Ok(user) => {
            api.store().set_user(&user)?;
            println!("\x1b[32m✓ Logged in\x1b[0m");
            println!("User: {} <{}>", user.display_name(), user.email);
            println!("Role: {}", user.role.label());
            println!("Server: {}", api.base_url());
            println!("Credentials: {}", api.store().path().display());
        }
        Err(e) if e.is_unauthorized() => {
            println!("\x1b[33m✗ Stored session was rejected by the server and has been cleared\x1b[0m");
            println!("Run '\x1b[1mcinema login\x1b[0m' to authenticate");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
