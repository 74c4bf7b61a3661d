//! Group models.

use keystone_core::types::{GroupUuid, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// A row from the `groups` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Group {
    pub uuid: GroupUuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a group.
#[derive(Debug, Clone)]
pub struct CreateGroup {
    pub uuid: GroupUuid,
    pub name: String,
    pub description: Option<String>,
}

/// JSON merge-patch body for a group.
///
/// Outer `None`: field absent, keep the stored value. `Some(None)`: explicit
/// `null`. `Some(Some(v))`: replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GroupPatch {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let patch: GroupPatch = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(patch.name, None);
        assert_eq!(patch.description, Some(None));

        let patch: GroupPatch = serde_json::from_str(r#"{"name": "ops"}"#).unwrap();
        assert_eq!(patch.name, Some(Some("ops".to_string())));
        assert_eq!(patch.description, None);
    }
}
