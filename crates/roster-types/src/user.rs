use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub const UNKNOWN_COMPANY: &str = "unknown";

/// Canonical textual form of a user identifier.
///
/// The remote API hands out numeric ids while locally added users and CLI
/// arguments carry strings; both collapse to the same text here so `1` and
/// `"1"` name the same user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::new(s)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self(i.to_string()))
                } else if let Some(u) = n.as_u64() {
                    Some(Self(u.to_string()))
                } else {
                    n.as_f64().map(|f| {
                        if f.fract() == 0.0 && f.abs() < 1e15 {
                            Self(format!("{}", f as i64))
                        } else {
                            Self(f.to_string())
                        }
                    })
                }
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<u64> for UserId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        UserId::from_value(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("expected string or number id, got {}", value))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub suite: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zipcode: String,
}

/// A user as served by the remote API (`GET /users`, `GET /users/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiUser {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl ApiUser {
    pub fn company_name(&self) -> Option<&str> {
        self.company
            .as_ref()
            .and_then(|c| c.name.as_deref())
            .filter(|n| !n.trim().is_empty())
    }
}

/// A user held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Ordering marker for "recently added"; never a real creation time
    /// for bulk-loaded users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
}

impl UserRecord {
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            company: UNKNOWN_COMPANY.to_string(),
            phone: None,
            website: None,
            address: None,
            created_at: None,
        }
    }

    /// Returns `None` when the payload has no id; such a payload cannot be
    /// addressed by any later operation.
    pub fn from_api(user: ApiUser, created_at: Option<u64>) -> Option<Self> {
        let company = user
            .company_name()
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN_COMPANY.to_string());
        let id = user.id?;
        Some(Self {
            id,
            name: user.name,
            email: user.email,
            company,
            phone: user.phone,
            website: user.website,
            address: user.address,
            created_at,
        })
    }

    pub fn order_marker(&self) -> u64 {
        self.created_at.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_and_string_ids_normalize() {
        let a: UserId = serde_json::from_value(json!(7)).unwrap();
        let b: UserId = serde_json::from_value(json!("7")).unwrap();
        let c: UserId = serde_json::from_value(json!(7.0)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.as_str(), "7");
        assert!(serde_json::from_value::<UserId>(json!(null)).is_err());
    }

    #[test]
    fn test_api_user_parses_remote_shape() {
        let user: ApiUser = serde_json::from_value(json!({
            "id": 1,
            "name": "Leanne Graham",
            "username": "Bret",
            "email": "Sincere@april.biz",
            "address": {
                "street": "Kulas Light",
                "suite": "Apt. 556",
                "city": "Gwenborough",
                "zipcode": "92998-3874",
                "geo": {"lat": "-37.3159", "lng": "81.1496"}
            },
            "phone": "1-770-736-8031 x56442",
            "website": "hildegard.org",
            "company": {"name": "Romaguera-Crona", "catchPhrase": "Multi-layered"}
        }))
        .unwrap();

        assert_eq!(user.id, Some(UserId::from("1")));
        assert_eq!(user.company_name(), Some("Romaguera-Crona"));
        assert_eq!(user.address.as_ref().map(|a| a.city.as_str()), Some("Gwenborough"));
    }

    #[test]
    fn test_record_defaults_company() {
        let user: ApiUser = serde_json::from_value(json!({
            "id": "x1",
            "name": "No Company",
            "email": "nc@example.com",
            "company": {"name": "  "}
        }))
        .unwrap();
        let record = UserRecord::from_api(user, Some(3)).unwrap();
        assert_eq!(record.company, UNKNOWN_COMPANY);
        assert_eq!(record.order_marker(), 3);
    }

    #[test]
    fn test_record_requires_id() {
        let user = ApiUser {
            name: "Nobody".to_string(),
            ..Default::default()
        };
        assert!(UserRecord::from_api(user, None).is_none());
    }
}
