//! Account commands: status, login, logout, register, whoami, open.

use secrecy::SecretString;
use vunjabei_client::{ClientError, Registration};
use vunjabei_core::{Route, access};

use super::{App, CliError};
use crate::render;

/// Report whether the backend answers.
pub async fn status(app: &App) -> Result<(), CliError> {
    let health = app.api.health().await?;
    render::message(&format!(
        "{} is {} ({})",
        health.service.as_deref().unwrap_or("backend"),
        health.status,
        app.api.base_url()
    ));
    render::session(app.sessions.current().as_ref());
    Ok(())
}

/// Sign in and show where the session lands.
///
/// `next` is the screen the user was trying to open, if any; it is only
/// honoured when the new session may render it.
pub async fn login(
    app: &App,
    username: &str,
    password: &SecretString,
    next: Option<&str>,
) -> Result<(), CliError> {
    let session = app.sessions.login(username, password).await?;
    let target = next.unwrap_or_else(|| session.role.landing_path());
    let navigation = access::navigate(Some(&session), target);
    render::message(&format!(
        "Signed in as {} ({}). Opening {}",
        session.username,
        session.role,
        navigation.route.path()
    ));
    Ok(())
}

pub fn logout(app: &App) -> Result<(), CliError> {
    app.sessions.logout()?;
    render::message("Signed out.");
    Ok(())
}

pub async fn register(
    app: &App,
    username: &str,
    email: &str,
    password: SecretString,
    confirmation: &SecretString,
) -> Result<(), CliError> {
    let navigation = access::navigate(app.sessions.current().as_ref(), &Route::Register.path());
    if navigation.route != Route::Register {
        return Err(CliError::Redirected {
            requested: Route::Register.path(),
            landing: navigation.route.path(),
        });
    }
    let registration = Registration::new(username, email, password, confirmation)
        .map_err(ClientError::from)?;
    let message = app.sessions.register(&registration).await?;
    render::message(&message);
    Ok(())
}

pub async fn register_staff(
    app: &App,
    username: &str,
    email: &str,
    password: SecretString,
    confirmation: &SecretString,
) -> Result<(), CliError> {
    app.enter(Route::AdminDashboard)?;
    let registration = Registration::new(username, email, password, confirmation)
        .map_err(ClientError::from)?;
    let message = app.sessions.register_staff(&registration).await?;
    render::message(&message);
    Ok(())
}

pub fn whoami(app: &App) {
    render::session(app.sessions.current().as_ref());
}

/// Resolve a path the way a browser front-end would, following redirects.
pub fn open(app: &App, path: &str) {
    let session = app.sessions.current();
    let navigation = access::navigate(session.as_ref(), path);
    let mut line = format!("{path} -> {}", navigation.route.path());
    if let Some(from) = navigation.from {
        line.push_str(&format!(" (sign in to continue to {from})"));
    }
    render::message(&line);
}
