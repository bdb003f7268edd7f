//! Default connect validation.
//!
//! Checks the caller's grants against the limits, then applies the
//! metadata and attribute overrides carried by the connect request.

use crate::config::LimitConfig;
use crate::context::RequestContext;
use crate::errors::SignalError;
use crate::services::{
    ConnectParams, ConnectValidator, MessageRouter, PlacementClient, ValidatedConnect,
};
use axum::http::StatusCode;
use signal_proto::internal::CreateRoomRequest;

/// Grants-and-limits validator used by the binary.
#[derive(Debug, Clone, Default)]
pub struct DefaultConnectValidator;

impl DefaultConnectValidator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ConnectValidator for DefaultConnectValidator {
    /// # Errors
    ///
    /// - 401 - no video grant, no join permission, no room, or metadata /
    ///   attribute overrides without `canUpdateOwnMetadata`
    /// - 400 - empty identity, or a length / size limit exceeded
    async fn validate(
        &self,
        ctx: &RequestContext,
        limits: &LimitConfig,
        params: ConnectParams,
        _router: &dyn MessageRouter,
        placement: &dyn PlacementClient,
    ) -> Result<ValidatedConnect, SignalError> {
        let mut grants = ctx
            .grants()
            .filter(|grants| grants.has_video_grant())
            .cloned()
            .ok_or(SignalError::PermissionDenied)?;

        let room_name = grants.ensure_join_permission()?;

        if grants.identity.is_empty() {
            return Err(SignalError::rejected(
                StatusCode::BAD_REQUEST,
                SignalError::IdentityEmpty.to_string(),
            ));
        }
        if !limits.check_participant_identity_length(&grants.identity) {
            return Err(SignalError::rejected(
                StatusCode::BAD_REQUEST,
                format!(
                    "participant identity exceeds limits: max length {}",
                    limits.max_participant_identity_length
                ),
            ));
        }

        if room_name.is_empty() {
            return Err(SignalError::NoRoomName);
        }
        if !limits.check_room_name_length(room_name.as_str()) {
            return Err(SignalError::rejected(
                StatusCode::BAD_REQUEST,
                format!(
                    "room name exceeds limits: max length {}",
                    limits.max_room_name_length
                ),
            ));
        }

        let can_update_own_metadata = grants
            .video
            .as_ref()
            .is_some_and(|video| video.can_update_own_metadata());

        if !params.metadata.is_empty() {
            if !can_update_own_metadata {
                return Err(SignalError::PermissionDenied);
            }
            if !limits.check_metadata_size(&params.metadata) {
                return Err(SignalError::rejected(
                    StatusCode::BAD_REQUEST,
                    format!(
                        "metadata size exceeds limits: max size {}",
                        limits.max_metadata_size
                    ),
                ));
            }
            grants.metadata = params.metadata;
        }

        if !params.attributes.is_empty() {
            if !can_update_own_metadata {
                return Err(SignalError::PermissionDenied);
            }
            // an empty value removes the attribute
            for (key, value) in params.attributes {
                if value.is_empty() {
                    grants.attributes.remove(&key);
                } else {
                    grants.attributes.insert(key, value);
                }
            }
            if !limits.check_attributes_size(&grants.attributes) {
                return Err(SignalError::rejected(
                    StatusCode::BAD_REQUEST,
                    format!(
                        "attributes size exceeds limits: max size {}",
                        limits.max_attributes_size
                    ),
                ));
            }
        }

        let create_room = placement.auto_create_enabled().then(|| CreateRoomRequest {
            name: room_name.to_string(),
            room_preset: grants.room_preset.clone(),
            ..Default::default()
        });

        tracing::debug!(
            target: "signal.services.validator",
            room = %room_name,
            participant = %grants.identity,
            create_room = create_room.is_some(),
            "Connect request validated"
        );

        Ok(ValidatedConnect {
            grants,
            room_name,
            create_room,
        })
    }
}
