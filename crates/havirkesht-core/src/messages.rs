//! User-facing wording for failed operations.
//!
//! The error taxonomy says what went wrong at the HTTP level; this module
//! says what it means for the thing the user was trying to do.

use crate::api::ApiError;
use crate::console::ConsoleError;
use crate::models::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Load(ResourceKind),
    Create(ResourceKind),
    CreateUser,
    Delete(ResourceKind),
    ChangePassword,
}

pub fn user_message(op: Operation, err: &ConsoleError) -> String {
    match err {
        ConsoleError::Api(api) => api_message(op, api),
        other => other.to_string(),
    }
}

fn api_message(op: Operation, err: &ApiError) -> String {
    let status = err.status();

    match (op, err) {
        (_, ApiError::Network(_)) => {
            "Could not reach the server. Check your connection and try again.".to_string()
        }
        (Operation::Login, _) => match status {
            Some(401) | Some(403) => "Login failed: wrong credentials.".to_string(),
            Some(422) => "Login failed: the entered details are not valid.".to_string(),
            Some(500..=599) => "Server error. Please try again later.".to_string(),
            _ => format!("Login failed: {}", err.message()),
        },
        (_, ApiError::AuthInvalid) => "Your session has expired. Please sign in again.".to_string(),
        (Operation::Create(kind), _) if status == Some(422) => {
            format!("Could not add {}: the name already exists or is invalid.", kind)
        }
        (Operation::Create(kind), _) => format!("Could not add {}: {}", kind, err.message()),
        (Operation::CreateUser, _) => match status {
            Some(400) => "Could not create user: username or email already exists.".to_string(),
            Some(403) => "You are not permitted to create users.".to_string(),
            _ => format!("Could not create user: {}", err.message()),
        },
        (Operation::ChangePassword, _) if status == Some(400) => {
            "The current password is wrong.".to_string()
        }
        (Operation::ChangePassword, _) => format!("Could not change password: {}", err.message()),
        (Operation::Delete(ResourceKind::Village), _) if status == Some(400) => {
            "This village is in use and cannot be deleted.".to_string()
        }
        (Operation::Delete(kind), _) => format!("Could not delete {}: {}", kind, err.message()),
        (Operation::Load(kind), _) => {
            format!("Could not load {}: {}", kind.spec().plural, err.message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, body: &str) -> ConsoleError {
        ConsoleError::Api(ApiError::from_status(status, body))
    }

    #[test]
    fn test_login_rejection_mentions_wrong_credentials() {
        let msg = user_message(Operation::Login, &ConsoleError::Api(ApiError::AuthInvalid));
        assert!(msg.contains("wrong credentials"));

        let msg = user_message(Operation::Login, &api(403, r#"{"detail":"Inactive user"}"#));
        assert!(msg.contains("wrong credentials"));
    }

    #[test]
    fn test_login_other_statuses() {
        assert!(user_message(Operation::Login, &api(422, "{}")).contains("not valid"));
        assert!(user_message(Operation::Login, &api(502, "")).starts_with("Server error"));
        assert!(user_message(
            Operation::Login,
            &ConsoleError::Api(ApiError::Network("refused".to_string()))
        )
        .contains("reach the server"));
    }

    #[test]
    fn test_duplicate_geography_name() {
        let msg = user_message(Operation::Create(ResourceKind::City), &api(422, "{}"));
        assert_eq!(msg, "Could not add city: the name already exists or is invalid.");
    }

    #[test]
    fn test_create_user_mappings() {
        assert!(user_message(Operation::CreateUser, &api(400, "{}")).contains("already exists"));
        assert!(user_message(Operation::CreateUser, &api(403, "{}")).contains("not permitted"));

        let body = r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address"}]}"#;
        let msg = user_message(Operation::CreateUser, &api(422, body));
        assert!(msg.contains("body.email: value is not a valid email address"));
    }

    #[test]
    fn test_wrong_current_password() {
        let msg = user_message(Operation::ChangePassword, &api(400, "{}"));
        assert_eq!(msg, "The current password is wrong.");
    }

    #[test]
    fn test_village_in_use() {
        let msg = user_message(Operation::Delete(ResourceKind::Village), &api(400, "{}"));
        assert!(msg.contains("in use"));

        let msg = user_message(Operation::Delete(ResourceKind::Province), &api(400, r#"{"detail":"has cities"}"#));
        assert_eq!(msg, "Could not delete province: has cities");
    }

    #[test]
    fn test_expired_session_outside_login() {
        let msg = user_message(
            Operation::Load(ResourceKind::User),
            &ConsoleError::Api(ApiError::AuthInvalid),
        );
        assert!(msg.contains("sign in again"));
    }

    #[test]
    fn test_local_validation_passes_through() {
        let err = ConsoleError::Invalid("Please enter a province name.".to_string());
        assert_eq!(user_message(Operation::Create(ResourceKind::Province), &err), "Please enter a province name.");
    }
}
