use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProvince {
    pub province: String,
}

/// A numeric parent is sent as `province_id`; anything else falls back to
/// the parent's name for backends that key provinces by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCity {
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
}

impl NewCity {
    pub fn new(city: &str, province: &str) -> Self {
        let (province_id, province) = split_parent(province);
        Self {
            city: city.to_string(),
            province_id,
            province,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVillage {
    pub village: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl NewVillage {
    pub fn new(village: &str, city: &str) -> Self {
        let (city_id, city) = split_parent(city);
        Self {
            village: village.to_string(),
            city_id,
            city,
        }
    }
}

fn split_parent(parent: &str) -> (Option<i64>, Option<String>) {
    match parent.trim().parse::<i64>() {
        Ok(id) => (Some(id), None),
        Err(_) => (None, Some(parent.trim().to_string())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn id(&self) -> i64 {
        match self {
            Role::Admin => 1,
            Role::User => 2,
        }
    }

    /// Anything other than 1 is a regular user.
    pub fn from_id(id: i64) -> Self {
        if id == 1 {
            Role::Admin
        } else {
            Role::User
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::User => write!(f, "User"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "admin" => Ok(Role::Admin),
            "2" | "user" => Ok(Role::User),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Body of `POST /users/admin/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub fullname: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub role_id: i64,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_numeric_parent_is_sent_as_id() {
        let body = serde_json::to_value(NewCity::new("Bonab", "4")).unwrap();
        assert_eq!(body, json!({"city": "Bonab", "province_id": 4}));
    }

    #[test]
    fn test_named_parent_is_sent_as_name() {
        let body = serde_json::to_value(NewVillage::new("Kandovan", "Osku")).unwrap();
        assert_eq!(body, json!({"village": "Kandovan", "city": "Osku"}));
    }

    #[test]
    fn test_phone_is_omitted_when_absent() {
        let user = NewUser {
            username: "reza".to_string(),
            password: "secret1".to_string(),
            fullname: "Reza K".to_string(),
            email: "reza@example.ir".to_string(),
            phone_number: None,
            role_id: Role::User.id(),
            disabled: false,
        };
        let body = serde_json::to_value(&user).unwrap();
        assert!(body.get("phone_number").is_none());
        assert_eq!(body["role_id"], 2);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" 2 ".parse::<Role>(), Ok(Role::User));
        assert!("owner".parse::<Role>().is_err());
        assert_eq!(Role::from_id(1).to_string(), "Admin");
        assert_eq!(Role::from_id(5), Role::User);
    }
}
