//! Session marker and the login/logout contract

use serde::{Deserialize, Serialize};

use crate::app::FinTrack;
use crate::command::LedgerCommand;
use crate::error::{
    AuthError, FieldErrors, FinTrackError, SerializationError, SessionError, ValidationError,
};
use crate::traits::SnapshotStorage;

pub const SESSION_KEY: &str = "fintrack_session";

/// Opaque marker whose presence gates protected operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMarker {
    pub email: String,
    pub name: String,
}

/// `Err(NotLoggedIn)` when no marker is stored. Unreadable storage counts as
/// no session.
pub fn require_session(storage: &dyn SnapshotStorage) -> Result<(), SessionError> {
    match storage.get(SESSION_KEY) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(SessionError::NotLoggedIn),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read session marker");
            Err(SessionError::NotLoggedIn)
        }
    }
}

/// Decoded marker, if one is stored and parses
pub fn current_session(storage: &dyn SnapshotStorage) -> Option<SessionMarker> {
    let bytes = storage.get(SESSION_KEY).ok().flatten()?;
    serde_json::from_slice(&bytes).ok()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

pub fn validate_login(form: &LoginForm) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if form.email.trim().is_empty() {
        errors.insert("email", "Email is required");
    }
    if form.password.trim().is_empty() {
        errors.insert("password", "Password is required");
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check the credentials after the login delay. Other scheduled work keeps
/// landing while the attempt waits.
///
/// On failure the form's password is cleared and the error does not say which
/// credential was wrong.
pub fn login(app: &mut FinTrack, form: &mut LoginForm) -> Result<SessionMarker, FinTrackError> {
    validate_login(form).map_err(ValidationError::Fields)?;

    let (min, max) = (app.config().delays.login_min_ms, app.config().delays.login_max_ms);
    let wait = app.context_mut().random().between_ms(min, max);
    app.sleep(wait);

    let user = &app.read().user;
    if form.email != user.email || form.password != user.password {
        form.password.clear();
        tracing::info!("Login rejected");
        return Err(AuthError::InvalidCredentials.into());
    }

    let marker = SessionMarker {
        email: form.email.clone(),
        name: user.name.clone(),
    };
    app.dispatch(LedgerCommand::SetLoggedIn(true))?;

    let bytes = serde_json::to_vec(&marker).map_err(|e| SerializationError::SerializationFailed {
        reason: e.to_string(),
    })?;
    app.store_mut().storage_mut().set(SESSION_KEY, &bytes)?;
    tracing::info!(email = %marker.email, "Logged in");
    Ok(marker)
}

/// Drop the session marker. The ledger's logged-in flag is left as is.
pub fn logout(app: &mut FinTrack) -> Result<(), FinTrackError> {
    app.store_mut().storage_mut().remove(SESSION_KEY)?;
    tracing::info!("Logged out");
    Ok(())
}
