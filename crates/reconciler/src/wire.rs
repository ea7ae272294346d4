//! Wire representation of a lifecycle hook as exchanged with the remote API.

use lifehook_core::{DefaultResult, Error, HeartbeatTimeout, Hook, Result};
use serde::{Deserialize, Serialize};

/// A lifecycle hook as the remote API sends and receives it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireHook {
    pub lifecycle_hook_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_scaling_group_name: Option<String>,
    pub lifecycle_transition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_result: Option<String>,
    /// Whole seconds. Absent means the remote default, never zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_timeout: Option<i64>,
    #[serde(
        default,
        rename = "NotificationTargetARN",
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_target_arn: Option<String>,
    #[serde(default, rename = "RoleARN", skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_metadata: Option<String>,
}

impl From<&Hook> for WireHook {
    fn from(hook: &Hook) -> Self {
        Self {
            lifecycle_hook_name: hook.name.clone(),
            auto_scaling_group_name: None,
            lifecycle_transition: hook.lifecycle_transition.to_string(),
            default_result: hook.default_result.map(|r| r.to_string()),
            heartbeat_timeout: hook
                .heartbeat_timeout
                .map(|t| i64::try_from(t.as_secs()).unwrap_or(i64::MAX)),
            notification_target_arn: hook.notification_target_arn.clone(),
            role_arn: hook.role_arn.clone(),
            notification_metadata: hook.notification_metadata.clone(),
        }
    }
}

impl TryFrom<WireHook> for Hook {
    type Error = Error;

    /// Decode a remote hook. An absent default result reads back as
    /// `Continue`; an absent heartbeat stays absent.
    fn try_from(wire: WireHook) -> Result<Self> {
        let heartbeat_timeout = wire
            .heartbeat_timeout
            .map(|secs| {
                u64::try_from(secs)
                    .map(HeartbeatTimeout::from_secs)
                    .map_err(|_| Error::invalid_value("heartbeat timeout", secs.to_string()))
            })
            .transpose()?;

        let default_result = wire
            .default_result
            .as_deref()
            .map(str::parse::<DefaultResult>)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            lifecycle_transition: wire.lifecycle_transition.parse()?,
            name: wire.lifecycle_hook_name,
            default_result: Some(default_result),
            heartbeat_timeout,
            notification_target_arn: wire.notification_target_arn,
            role_arn: wire.role_arn,
            notification_metadata: wire.notification_metadata,
        })
    }
}
