use serde::{Deserialize, Serialize};

/// Lifecycle webhook payloads from the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    #[serde(rename = "type")]
    pub kind: LifecycleKind,
    pub data: LifecycleData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleKind {
    #[serde(rename = "user.created")]
    UserCreated,
    #[serde(rename = "user.updated")]
    UserUpdated,
    #[serde(rename = "user.deleted")]
    UserDeleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleData {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAddress {
    pub email_address: String,
}

impl LifecycleEvent {
    /// First listed email address, if any.
    pub fn primary_email(&self) -> Option<&str> {
        self.data
            .email_addresses
            .first()
            .map(|e| e.email_address.as_str())
    }

    /// First and last name joined, or whichever half is present.
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.data.first_name.as_deref(), self.data.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_created_payload() {
        let event: LifecycleEvent = serde_json::from_value(serde_json::json!({
            "type": "user.created",
            "data": {
                "id": "user_abc",
                "email_addresses": [
                    { "email_address": "ada@example.com" },
                    { "email_address": "alt@example.com" }
                ],
                "first_name": "Ada",
                "last_name": "Lovelace"
            }
        }))
        .unwrap();

        assert_eq!(event.kind, LifecycleKind::UserCreated);
        assert_eq!(event.primary_email(), Some("ada@example.com"));
        assert_eq!(event.full_name(), Some("Ada Lovelace".to_string()));
    }

    #[test]
    fn handles_missing_name_and_email() {
        let event: LifecycleEvent = serde_json::from_value(serde_json::json!({
            "type": "user.deleted",
            "data": { "id": "user_gone" }
        }))
        .unwrap();

        assert_eq!(event.kind, LifecycleKind::UserDeleted);
        assert_eq!(event.primary_email(), None);
        assert_eq!(event.full_name(), None);
    }

    #[test]
    fn single_name_half_is_used_alone() {
        let event: LifecycleEvent = serde_json::from_value(serde_json::json!({
            "type": "user.updated",
            "data": { "id": "u", "first_name": "Cher" }
        }))
        .unwrap();
        assert_eq!(event.full_name(), Some("Cher".to_string()));
    }
}
