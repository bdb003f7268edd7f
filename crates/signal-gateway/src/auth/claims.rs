//! Grant set carried by an access token.
//!
//! The gateway only looks at the identity, the presence of a video grant and
//! the join permission. Everything else is forwarded to the room's node as
//! JSON (`grants_json`), so the serde names here are the wire names.

use crate::errors::SignalError;
use common::types::{ParticipantIdentity, RoomName};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Permissions and profile attached to a participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantSet {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub identity: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoGrant>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub room_preset: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub metadata: String,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
}

/// Room-level permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_create: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub room_join: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub room_admin: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub room: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_publish: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_subscribe: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_publish_data: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_update_own_metadata: Option<bool>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl VideoGrant {
    /// Unset means not allowed.
    pub fn can_update_own_metadata(&self) -> bool {
        self.can_update_own_metadata.unwrap_or(false)
    }
}

impl GrantSet {
    pub fn has_video_grant(&self) -> bool {
        self.video.is_some()
    }

    pub fn participant_identity(&self) -> ParticipantIdentity {
        ParticipantIdentity::from(self.identity.as_str())
    }

    /// Room the holder may join.
    ///
    /// The returned name may be empty; callers decide whether that is an
    /// error for their endpoint.
    ///
    /// # Errors
    ///
    /// - `SignalError::PermissionDenied` - no video grant
    /// - `SignalError::Unauthorized` - video grant without `roomJoin`
    pub fn ensure_join_permission(&self) -> Result<RoomName, SignalError> {
        let video = self.video.as_ref().ok_or(SignalError::PermissionDenied)?;

        if !video.room_join {
            return Err(SignalError::Unauthorized(
                "permission to join room denied".to_string(),
            ));
        }

        Ok(RoomName::from(video.room.as_str()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn join_grant(room: &str) -> GrantSet {
        GrantSet {
            identity: "alice".to_string(),
            video: Some(VideoGrant {
                room_join: true,
                room: room.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_ensure_join_permission_returns_room() {
        let room = join_grant("standup").ensure_join_permission().unwrap();
        assert_eq!(room.as_str(), "standup");
    }

    #[test]
    fn test_ensure_join_permission_allows_empty_room() {
        let room = join_grant("").ensure_join_permission().unwrap();
        assert!(room.is_empty());
    }

    #[test]
    fn test_ensure_join_permission_without_join() {
        let mut grants = join_grant("standup");
        if let Some(video) = grants.video.as_mut() {
            video.room_join = false;
        }

        assert!(matches!(
            grants.ensure_join_permission(),
            Err(SignalError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_ensure_join_permission_without_video() {
        let grants = GrantSet {
            identity: "alice".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            grants.ensure_join_permission(),
            Err(SignalError::PermissionDenied)
        ));
    }

    #[test]
    fn test_serialize_uses_wire_names_and_skips_defaults() {
        let mut grants = join_grant("standup");
        grants.room_preset = "webinar".to_string();
        if let Some(video) = grants.video.as_mut() {
            video.can_update_own_metadata = Some(true);
        }

        let json = serde_json::to_value(&grants).unwrap();

        assert_eq!(json["identity"], "alice");
        assert_eq!(json["roomPreset"], "webinar");
        assert_eq!(json["video"]["roomJoin"], true);
        assert_eq!(json["video"]["room"], "standup");
        assert_eq!(json["video"]["canUpdateOwnMetadata"], true);
        assert!(json.get("name").is_none());
        assert!(json.get("attributes").is_none());
        assert!(json["video"].get("roomAdmin").is_none());
        assert!(json["video"].get("canPublish").is_none());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "name": "Alice",
            "metadata": "{\"seat\":1}",
            "attributes": {"role": "host"},
            "video": {"roomJoin": true, "room": "r1", "canPublish": false}
        }"#;

        let grants: GrantSet = serde_json::from_str(json).unwrap();

        assert_eq!(grants.name, "Alice");
        assert_eq!(grants.attributes.get("role").map(String::as_str), Some("host"));
        let video = grants.video.unwrap();
        assert!(video.room_join);
        assert_eq!(video.can_publish, Some(false));
        assert!(!video.can_update_own_metadata());
    }
}
