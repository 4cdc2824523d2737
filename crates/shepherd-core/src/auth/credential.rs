use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The signed-in user's profile.
///
/// Only `id`, `name` and `email` are named; everything else the API sends
/// is carried through untouched in `extra`. None of the fields are
/// validated: `id` keeps whatever JSON the server used, and a null or
/// non-string name or email reads as text instead of failing the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub id: Value,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    /// The name as stored, unless it is blank
    pub fn display_name(&self) -> Option<&str> {
        if self.name.trim().is_empty() {
            None
        } else {
            Some(&self.name)
        }
    }
}

/// null becomes "", other scalars their JSON text
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Token plus profile: what a successful login produces and what the
/// session persists.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub access_token: String,
    pub user: Profile,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, user: Profile) -> Self {
        Self {
            access_token: access_token.into(),
            user,
        }
    }
}
