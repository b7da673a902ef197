use chrono::{DateTime, TimeZone, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use counsel_types::{CertifiedStatus, ChatMode, Domain, ItemStatus, Thread, ThreadItem, UserRecord};

/// MongoDB-side thread document (ObjectId ids, SCREAMING domain strings).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub user_id: String,
    pub pinned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_at: Option<bson::DateTime>,
    pub domain: String,
    pub certified_status: CertifiedStatus,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

/// MongoDB-side thread item document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThreadItem {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub thread_id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ObjectId>,
    pub query: String,
    pub mode: ChatMode,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_attachment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_results: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub sources: Vec<serde_json::Value>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<serde_json::Value>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

/// MongoDB-side user document. The id comes from the identity provider,
/// so it stays a plain string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: String,
    pub created_at: bson::DateTime,
}

/// Storage form of a domain: `LEGAL`, `CIVIL_ENGINEERING`, `REAL_ESTATE`.
pub fn domain_to_storage(domain: Domain) -> &'static str {
    match domain {
        Domain::Legal => "LEGAL",
        Domain::CivilEngineering => "CIVIL_ENGINEERING",
        Domain::RealEstate => "REAL_ESTATE",
    }
}

pub fn domain_from_storage(value: &str) -> Option<Domain> {
    match value {
        "LEGAL" => Some(Domain::Legal),
        "CIVIL_ENGINEERING" => Some(Domain::CivilEngineering),
        "REAL_ESTATE" => Some(Domain::RealEstate),
        _ => None,
    }
}

pub fn to_bson_datetime(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

pub fn to_chrono_datetime(dt: bson::DateTime) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(dt.timestamp_millis())
        .single()
        .unwrap_or_else(Utc::now)
}

impl MongoThread {
    pub fn into_thread(self) -> Thread {
        let domain = domain_from_storage(&self.domain).unwrap_or_else(|| {
            tracing::warn!(thread_id = %self.id, domain = %self.domain, "unknown stored domain");
            Domain::Legal
        });
        Thread {
            id: self.id.to_hex(),
            title: self.title,
            user_id: self.user_id,
            pinned: self.pinned,
            pinned_at: self.pinned_at.map(to_chrono_datetime),
            domain,
            certified_status: self.certified_status,
            created_at: to_chrono_datetime(self.created_at),
            updated_at: to_chrono_datetime(self.updated_at),
        }
    }
}

impl MongoThreadItem {
    pub fn into_item(self) -> ThreadItem {
        ThreadItem {
            id: self.id.to_hex(),
            thread_id: self.thread_id.to_hex(),
            parent_id: self.parent_id.map(|id| id.to_hex()),
            query: self.query,
            mode: self.mode,
            status: self.status,
            error: self.error,
            image_attachment: self.image_attachment,
            tool_calls: self.tool_calls,
            tool_results: self.tool_results,
            steps: self.steps,
            answer: self.answer,
            metadata: self.metadata,
            sources: self.sources,
            suggestions: self.suggestions,
            object: self.object,
            created_at: to_chrono_datetime(self.created_at),
            updated_at: to_chrono_datetime(self.updated_at),
        }
    }
}

impl MongoUser {
    pub fn into_record(self) -> UserRecord {
        UserRecord {
            id: self.id,
            email: self.email,
            name: self.name,
            role: self.role,
            created_at: to_chrono_datetime(self.created_at),
        }
    }

    pub fn from_record(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: to_bson_datetime(user.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_storage_round_trips() {
        for domain in Domain::ALL {
            assert_eq!(domain_from_storage(domain_to_storage(domain)), Some(domain));
        }
        assert_eq!(domain_from_storage("COOKING"), None);
    }

    #[test]
    fn datetime_conversion_preserves_millis() {
        let now = Utc::now();
        let round_tripped = to_chrono_datetime(to_bson_datetime(now));
        assert_eq!(round_tripped.timestamp_millis(), now.timestamp_millis());
    }
}
