//! Lifecycle hook domain model.
//!
//! A [`Hook`] is an immutable value keyed by its name. The same name seen in
//! the desired spec and on the remote scaling group is one logical hook in two
//! states, never two hooks.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Smallest heartbeat timeout the remote API accepts.
pub const MIN_HEARTBEAT_TIMEOUT: HeartbeatTimeout = HeartbeatTimeout::from_secs(30);

/// Largest heartbeat timeout the remote API accepts (48 hours).
pub const MAX_HEARTBEAT_TIMEOUT: HeartbeatTimeout = HeartbeatTimeout::from_secs(172_800);

/// Heartbeat timeout the remote side applies when none is given.
pub const DEFAULT_HEARTBEAT_TIMEOUT: HeartbeatTimeout = HeartbeatTimeout::from_secs(3600);

/// Maximum length of a hook name.
pub const MAX_NAME_LEN: usize = 255;

/// Maximum size of the notification metadata payload in bytes.
pub const MAX_NOTIFICATION_METADATA_LEN: usize = 1023;

/// Instance state transition a hook pauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleTransition {
    #[serde(rename = "autoscaling:EC2_INSTANCE_LAUNCHING")]
    InstanceLaunching,
    #[serde(rename = "autoscaling:EC2_INSTANCE_TERMINATING")]
    InstanceTerminating,
}

impl LifecycleTransition {
    /// Wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InstanceLaunching => "autoscaling:EC2_INSTANCE_LAUNCHING",
            Self::InstanceTerminating => "autoscaling:EC2_INSTANCE_TERMINATING",
        }
    }
}

impl fmt::Display for LifecycleTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleTransition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "autoscaling:EC2_INSTANCE_LAUNCHING" => Ok(Self::InstanceLaunching),
            "autoscaling:EC2_INSTANCE_TERMINATING" => Ok(Self::InstanceTerminating),
            other => Err(Error::invalid_value("lifecycle transition", other)),
        }
    }
}

/// Action taken when the heartbeat timeout elapses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefaultResult {
    #[default]
    Continue,
    Abandon,
}

impl DefaultResult {
    /// Wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Continue => "CONTINUE",
            Self::Abandon => "ABANDON",
        }
    }
}

impl fmt::Display for DefaultResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DefaultResult {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CONTINUE" => Ok(Self::Continue),
            "ABANDON" => Ok(Self::Abandon),
            other => Err(Error::invalid_value("default result", other)),
        }
    }
}

/// Heartbeat timeout with whole-second granularity.
///
/// The remote API transmits seconds, so only whole seconds are representable.
/// Converting a [`Duration`] with a fractional part fails instead of rounding.
///
/// On pool objects it is written as a duration string (`"300s"`, `"5m"`,
/// `"1h30m"`); bare integer seconds are accepted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeartbeatTimeout(Duration);

impl HeartbeatTimeout {
    /// Create a timeout from whole seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// Whole seconds, as sent over the wire.
    pub const fn as_secs(self) -> u64 {
        self.0.as_secs()
    }

    /// The timeout as a [`Duration`].
    pub const fn as_duration(self) -> Duration {
        self.0
    }
}

impl TryFrom<Duration> for HeartbeatTimeout {
    type Error = Error;

    fn try_from(duration: Duration) -> Result<Self> {
        if duration.subsec_nanos() == 0 {
            Ok(Self(duration))
        } else {
            Err(Error::invalid_value(
                "heartbeat timeout",
                format!("{duration:?} (sub-second precision is not supported)"),
            ))
        }
    }
}

impl From<u64> for HeartbeatTimeout {
    fn from(secs: u64) -> Self {
        Self::from_secs(secs)
    }
}

impl From<HeartbeatTimeout> for u64 {
    fn from(timeout: HeartbeatTimeout) -> Self {
        timeout.as_secs()
    }
}

impl fmt::Display for HeartbeatTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.as_secs())
    }
}

impl FromStr for HeartbeatTimeout {
    type Err = Error;

    /// Parse a duration string made of `<number><unit>` terms, units being
    /// `h`, `m`, `s`, `ms`, `us`/`µs` or `ns`. The total must be whole seconds.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::invalid_value("heartbeat timeout", s);
        let input = s.trim();
        if input == "0" {
            return Ok(Self::from_secs(0));
        }
        if input.is_empty() {
            return Err(invalid());
        }

        let mut rest = input;
        let mut total_nanos: u128 = 0;
        while !rest.is_empty() {
            let number_end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .ok_or_else(invalid)?;
            let (number, tail) = rest.split_at(number_end);
            let unit_end = tail
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(tail.len());
            let (unit, next) = tail.split_at(unit_end);

            let unit_nanos: u128 = match unit {
                "h" => 3_600_000_000_000,
                "m" => 60_000_000_000,
                "s" => 1_000_000_000,
                "ms" => 1_000_000,
                "us" | "µs" => 1_000,
                "ns" => 1,
                _ => return Err(invalid()),
            };
            let term = term_nanos(number, unit_nanos).ok_or_else(invalid)?;
            total_nanos = total_nanos.checked_add(term).ok_or_else(invalid)?;
            rest = next;
        }

        if total_nanos.checked_rem(1_000_000_000) != Some(0) {
            return Err(Error::invalid_value(
                "heartbeat timeout",
                format!("{s} (sub-second precision is not supported)"),
            ));
        }
        total_nanos
            .checked_div(1_000_000_000)
            .and_then(|secs| u64::try_from(secs).ok())
            .map(Self::from_secs)
            .ok_or_else(invalid)
    }
}

/// Nanoseconds in one `<number><unit>` term, where `number` may carry a
/// decimal fraction.
fn term_nanos(number: &str, unit_nanos: u128) -> Option<u128> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(unit_nanos)?;
    if !fraction.is_empty() {
        let digits: u128 = fraction.parse().ok()?;
        let scale = 10u128.checked_pow(u32::try_from(fraction.len()).ok()?)?;
        nanos = nanos.checked_add(digits.checked_mul(unit_nanos)?.checked_div(scale)?)?;
    }
    Some(nanos)
}

impl Serialize for HeartbeatTimeout {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HeartbeatTimeout {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct HeartbeatVisitor;

        impl serde::de::Visitor<'_> for HeartbeatVisitor {
            type Value = HeartbeatTimeout;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a duration string such as \"300s\" or whole seconds")
            }

            fn visit_u64<E: serde::de::Error>(self, secs: u64) -> std::result::Result<Self::Value, E> {
                Ok(HeartbeatTimeout::from_secs(secs))
            }

            fn visit_i64<E: serde::de::Error>(self, secs: i64) -> std::result::Result<Self::Value, E> {
                u64::try_from(secs)
                    .map(HeartbeatTimeout::from_secs)
                    .map_err(|_| E::custom(format!("negative heartbeat timeout {secs}")))
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> std::result::Result<Self::Value, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(HeartbeatVisitor)
    }
}

/// A lifecycle hook, desired or observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hook {
    /// Identity key within a scaling group.
    pub name: String,
    pub lifecycle_transition: LifecycleTransition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_result: Option<DefaultResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_timeout: Option<HeartbeatTimeout>,
    #[serde(
        default,
        rename = "notificationTargetARN",
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_target_arn: Option<String>,
    /// Only required when a notification target is set.
    #[serde(default, rename = "roleARN", skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_metadata: Option<String>,
}

impl Hook {
    /// Create a hook with only the required fields.
    pub fn new(name: impl Into<String>, lifecycle_transition: LifecycleTransition) -> Self {
        Self {
            name: name.into(),
            lifecycle_transition,
            default_result: None,
            heartbeat_timeout: None,
            notification_target_arn: None,
            role_arn: None,
            notification_metadata: None,
        }
    }

    /// Set the default result.
    #[must_use]
    pub fn with_default_result(mut self, result: DefaultResult) -> Self {
        self.default_result = Some(result);
        self
    }

    /// Set the heartbeat timeout.
    #[must_use]
    pub fn with_heartbeat_timeout(mut self, timeout: HeartbeatTimeout) -> Self {
        self.heartbeat_timeout = Some(timeout);
        self
    }

    /// Set the notification target.
    #[must_use]
    pub fn with_notification_target(mut self, arn: impl Into<String>) -> Self {
        self.notification_target_arn = Some(arn.into());
        self
    }

    /// Set the role used to publish notifications.
    #[must_use]
    pub fn with_role(mut self, arn: impl Into<String>) -> Self {
        self.role_arn = Some(arn.into());
        self
    }

    /// Set the notification metadata.
    #[must_use]
    pub fn with_notification_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.notification_metadata = Some(metadata.into());
        self
    }

    /// Default result with the remote default applied.
    pub fn effective_default_result(&self) -> DefaultResult {
        self.default_result.unwrap_or_default()
    }

    /// Heartbeat timeout with the remote default applied.
    pub fn effective_heartbeat_timeout(&self) -> HeartbeatTimeout {
        self.heartbeat_timeout.unwrap_or(DEFAULT_HEARTBEAT_TIMEOUT)
    }

    /// Check the hook against the limits the remote API enforces.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHook`] describing the first violated limit.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.len() > MAX_NAME_LEN {
            return Err(Error::invalid_hook(
                &self.name,
                format!("name must be between 1 and {MAX_NAME_LEN} characters"),
            ));
        }

        if !self.name.chars().all(is_name_char) {
            return Err(Error::invalid_hook(
                &self.name,
                "name may only contain letters, digits, '-', '_' and '/'",
            ));
        }

        if let Some(timeout) = self.heartbeat_timeout {
            if timeout < MIN_HEARTBEAT_TIMEOUT || timeout > MAX_HEARTBEAT_TIMEOUT {
                return Err(Error::invalid_hook(
                    &self.name,
                    format!(
                        "heartbeat timeout {timeout} outside [{MIN_HEARTBEAT_TIMEOUT}, {MAX_HEARTBEAT_TIMEOUT}]"
                    ),
                ));
            }
        }

        if let Some(metadata) = &self.notification_metadata {
            if metadata.len() > MAX_NOTIFICATION_METADATA_LEN {
                return Err(Error::invalid_hook(
                    &self.name,
                    format!(
                        "notification metadata is {} bytes, limit is {MAX_NOTIFICATION_METADATA_LEN}",
                        metadata.len()
                    ),
                ));
            }
        }

        if self.notification_target_arn.is_some() && self.role_arn.is_none() {
            return Err(Error::invalid_hook(
                &self.name,
                "roleARN is required when notificationTargetARN is set",
            ));
        }

        Ok(())
    }
}

const fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/')
}
