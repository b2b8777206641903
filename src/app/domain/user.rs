use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::app::infrastructure::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
    Editor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Editor => "editor",
        })
    }
}

/// The signed-in identity.
///
/// Field names on the wire match the dashboard's `auth-storage` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "avatar", default, skip_serializing_if = "Option::is_none")]
    pub avatar_ref: Option<String>,
    pub role: Role,
    pub created_at: NaiveDate,
}

impl User {
    /// Up to two uppercase initials, as shown in the avatar fallback.
    pub fn initials(&self) -> String {
        self.display_name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }

    /// Merge a partial update. Fields left as `None` keep their value.
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.display_name {
            self.display_name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(avatar) = update.avatar_ref {
            self.avatar_ref = avatar;
        }
        if let Some(role) = update.role {
            self.role = role;
        }
    }
}

/// Partial profile edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// `Some(None)` clears the avatar.
    pub avatar_ref: Option<Option<String>>,
    pub role: Option<Role>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ProfileUpdate::default()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.display_name {
            if name.trim().is_empty() {
                return Err(AppError::Validation("Name is required".to_string()));
            }
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

/// Shape check for `local@domain.tld`.
pub fn validate_email(email: &str) -> Result<()> {
    let invalid = || AppError::Validation("Please enter a valid email".to_string());

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            id: "1".to_string(),
            email: "admin@dashboard.com".to_string(),
            display_name: "John Doe".to_string(),
            avatar_ref: None,
            role: Role::Admin,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
    }

    #[test]
    fn test_initials() {
        let mut user = sample();
        assert_eq!(user.initials(), "JD");
        user.display_name = "ada".to_string();
        assert_eq!(user.initials(), "A");
        user.display_name = "Mary Ann Evans".to_string();
        assert_eq!(user.initials(), "MA");
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["name"], "John Doe");
        assert_eq!(json["role"], "admin");
        assert_eq!(json["createdAt"], "2024-01-15");
        assert!(json.get("avatar").is_none());
    }

    #[test]
    fn test_apply_partial_update() {
        let mut user = sample();
        user.apply(ProfileUpdate {
            display_name: Some("Jane Doe".to_string()),
            avatar_ref: Some(Some("avatars/jane.png".to_string())),
            ..Default::default()
        });
        assert_eq!(user.display_name, "Jane Doe");
        assert_eq!(user.email, "admin@dashboard.com");
        assert_eq!(user.avatar_ref.as_deref(), Some("avatars/jane.png"));

        user.apply(ProfileUpdate {
            avatar_ref: Some(None),
            ..Default::default()
        });
        assert_eq!(user.avatar_ref, None);
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com").is_ok());
        for bad in ["", "plain", "@x.com", "a@x", "a@.com", "a b@x.com", "a@x@y.com", "a@x."] {
            assert!(validate_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_update_validation() {
        assert!(ProfileUpdate::default().is_empty());
        let bad = ProfileUpdate {
            display_name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));
    }
}
