//! Profile and account settings
//!
//! The settings form is filled from the stored profile. Notification toggles
//! are staged on the form and only reach the ledger through a profile save,
//! unless the preferences defect is fixed.

use crate::app::FinTrack;
use crate::command::{LedgerCommand, ProfileChanges};
use crate::error::{FieldErrors, FinTrackError, ValidationError};
use crate::scheduler::{Completion, Task};
use crate::types::{NotificationFlags, UserProfile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsForm {
    pub name: String,
    pub phone: String,
    pub address: String,
    /// Read-only in the form, but whatever is here gets saved
    pub email: String,
    pub notifications: NotificationFlags,
}

impl SettingsForm {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone(),
            phone: profile.phone.clone(),
            address: profile.address.clone(),
            email: profile.email.clone(),
            notifications: profile.notifications,
        }
    }

    pub fn profile_changes(&self) -> ProfileChanges {
        ProfileChanges {
            name: self.name.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordChange {
    pub current: String,
    pub new_password: String,
    pub confirm: String,
}

impl PasswordChange {
    pub fn new(
        current: impl Into<String>,
        new_password: impl Into<String>,
        confirm: impl Into<String>,
    ) -> Self {
        Self {
            current: current.into(),
            new_password: new_password.into(),
            confirm: confirm.into(),
        }
    }
}

/// Checks a password change against the stored password.
///
/// A wrong current password is reported alone. The confirmation is compared
/// only when `compare_confirmation` is set.
pub fn validate_password_change(
    change: &PasswordChange,
    stored: &str,
    compare_confirmation: bool,
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if change.current != stored {
        errors.insert("currentPwd", "Current password is incorrect");
        return Err(errors);
    }
    if change.new_password.is_empty() {
        errors.insert("newPwd", "New password is required");
    }
    if compare_confirmation && change.new_password != change.confirm {
        errors.insert("confirmPwd", "Passwords do not match");
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Write the contact fields and the staged notification toggles. The change
/// lands immediately, empty name included; the confirmation follows after the
/// profile save delay.
pub fn save_profile(app: &mut FinTrack, form: &SettingsForm) -> Result<(), FinTrackError> {
    app.require_session()?;

    app.dispatch(LedgerCommand::Batch(vec![
        LedgerCommand::UpdateProfile(form.profile_changes()),
        LedgerCommand::SetNotifications(form.notifications),
    ]))?;
    let delay = app.config().delays.profile_save_ms;
    app.schedule(
        delay,
        Task::new("profile_saved").with_completion(Completion::ProfileSaved),
    );
    Ok(())
}

/// Validate now, store the new password after the password change delay
pub fn change_password(app: &mut FinTrack, change: &PasswordChange) -> Result<(), FinTrackError> {
    app.require_session()?;

    let compare = app.config().defects.password_confirmation.is_fixed();
    validate_password_change(change, &app.read().user.password, compare)
        .map_err(ValidationError::Fields)?;

    let delay = app.config().delays.password_change_ms;
    app.schedule(
        delay,
        Task::new("password_change")
            .with_command(LedgerCommand::SetPassword(change.new_password.clone()))
            .with_completion(Completion::PasswordChanged),
    );
    Ok(())
}

/// Reports success after the preferences delay. Writes the flags only when the
/// preferences defect is fixed; otherwise they stay staged on the form.
pub fn save_notification_preferences(
    app: &mut FinTrack,
    flags: NotificationFlags,
) -> Result<(), FinTrackError> {
    app.require_session()?;

    let mut task =
        Task::new("notification_preferences").with_completion(Completion::NotificationPreferencesSaved);
    if app.config().defects.notification_preferences.is_fixed() {
        task = task.with_command(LedgerCommand::SetNotifications(flags));
    } else {
        tracing::debug!("Notification preferences not written");
    }
    let delay = app.config().delays.notification_save_ms;
    app.schedule(delay, task);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{seed_profile, SEED_PASSWORD};

    #[test]
    fn test_form_starts_from_profile() {
        let form = SettingsForm::from_profile(&seed_profile());
        assert_eq!(form.name, "Abu Hena");
        assert_eq!(form.notifications, NotificationFlags { email: true, sms: false });
    }

    #[test]
    fn test_wrong_current_password_is_reported_alone() {
        let errors = validate_password_change(&PasswordChange::new("wrong", "", "x"), SEED_PASSWORD, true)
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("currentPwd"), Some("Current password is incorrect"));
    }

    #[test]
    fn test_confirmation_compared_only_when_asked() {
        let change = PasswordChange::new(SEED_PASSWORD, "newpw", "different");
        assert!(validate_password_change(&change, SEED_PASSWORD, false).is_ok());

        let errors = validate_password_change(&change, SEED_PASSWORD, true).unwrap_err();
        assert_eq!(errors.get("confirmPwd"), Some("Passwords do not match"));
    }

    #[test]
    fn test_new_password_required() {
        let errors = validate_password_change(&PasswordChange::new(SEED_PASSWORD, "", ""), SEED_PASSWORD, false)
            .unwrap_err();
        assert_eq!(errors.get("newPwd"), Some("New password is required"));
    }
}
