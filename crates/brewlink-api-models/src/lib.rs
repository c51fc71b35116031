#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared wire DTOs for the brewing controller's JSON command endpoint.
//!
//! The controller exposes a single `POST <root>api` endpoint. Every request
//! carries a command name plus an optional payload, and every response is a
//! `{success, data, message?}` envelope. Each read command has one
//! [`CommandReply`] payload type, so malformed payloads fail at the boundary
//! instead of leaking into client caches.
use std::fmt::{self, Display, Formatter};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Path segment appended to the controller root URL.
pub const API_PATH: &str = "api";

/// Display unit for Celsius temperatures.
pub const CELSIUS_UNIT: &str = "°C";

/// Display unit for Fahrenheit temperatures.
pub const FAHRENHEIT_UNIT: &str = "°F";

/// Read commands understood by the controller and consumed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Fetch the device configuration.
    GetSystemSettings,
    /// Fetch every stored mash and boil schedule.
    GetMashSchedules,
}

impl Command {
    /// Wire name of the command.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetSystemSettings => "GetSystemSettings",
            Self::GetMashSchedules => "GetMashSchedules",
        }
    }
}

impl Display for Command {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Request body posted to the command endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Command to execute.
    pub command: Command,
    /// Command payload; `null` when the command takes no arguments.
    pub data: Value,
}

impl ApiRequest {
    /// Build a request, mapping a missing payload to JSON `null`.
    #[must_use]
    pub fn new(command: Command, data: Option<Value>) -> Self {
        Self {
            command,
            data: data.unwrap_or(Value::Null),
        }
    }
}

/// Response envelope returned by the controller for every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResult {
    /// Whether the controller accepted and executed the command.
    pub success: bool,
    /// Command-specific payload.
    #[serde(default)]
    pub data: Value,
    /// Optional human-readable status or failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiResult {
    /// Successful envelope carrying `data`.
    #[must_use]
    pub const fn ok(data: Value) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    /// Failure envelope with a `null` payload, as synthesised for transport errors.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Value::Null,
            message: Some(message.into()),
        }
    }
}

/// Temperature unit system reported by the controller (`0` = Celsius, `1` = Fahrenheit).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TemperatureScale {
    /// Degrees Celsius.
    #[default]
    Celsius,
    /// Degrees Fahrenheit.
    Fahrenheit,
}

impl TemperatureScale {
    /// Display unit for the scale. Anything but Fahrenheit renders as Celsius.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Fahrenheit => FAHRENHEIT_UNIT,
            Self::Celsius => CELSIUS_UNIT,
        }
    }
}

/// Raised when the controller reports a scale discriminant the client does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown temperature scale {0}")]
pub struct UnknownTemperatureScale(pub u8);

impl TryFrom<u8> for TemperatureScale {
    type Error = UnknownTemperatureScale;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Celsius),
            1 => Ok(Self::Fahrenheit),
            other => Err(UnknownTemperatureScale(other)),
        }
    }
}

impl From<TemperatureScale> for u8 {
    fn from(value: TemperatureScale) -> Self {
        match value {
            TemperatureScale::Celsius => 0,
            TemperatureScale::Fahrenheit => 1,
        }
    }
}

/// Device configuration as reported by `GetSystemSettings`.
///
/// Older firmware omits some fields; those decode to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemSettings {
    /// GPIO of the one-wire temperature bus.
    pub onewire_pin: i32,
    /// GPIO of the first heating element.
    pub heat1_pin: i32,
    /// GPIO of the second heating element.
    pub heat2_pin: i32,
    /// GPIO of the stirrer relay.
    pub stir_pin: i32,
    /// Whether outputs are active-low.
    pub invert_outputs: bool,
    /// MQTT broker URI used for telemetry.
    pub mqtt_uri: String,
    /// Temperature scale used for every displayed value.
    pub temperature_scale: TemperatureScale,
    /// GPIO of the buzzer.
    pub buzzer_pin: i32,
    /// Buzzer duration in seconds.
    pub buzzer_time: i32,
}

/// One temperature step of a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MashStep {
    /// Position of the step; unique and increasing within a schedule.
    pub index: u32,
    /// Display name.
    pub name: String,
    /// Target temperature in the controller's scale.
    pub temperature: f64,
    /// Minutes allowed to reach the target temperature.
    pub step_time: i64,
    /// Minutes to hold the target temperature.
    pub time: i64,
    /// Extend the step until the target is reached.
    pub extend_step_time_if_needed: bool,
}

/// Time-keyed reminder attached to a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Display name.
    pub name: String,
    /// Message spoken or shown when the notification fires.
    #[serde(default)]
    pub message: String,
    /// Minutes from schedule start.
    pub time_from_start: i64,
    /// Absolute firing time (epoch seconds) once a schedule runs.
    #[serde(default)]
    pub time_point: i64,
    /// Whether the buzzer sounds.
    pub buzzer: bool,
    /// Completion flag set while a schedule runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

impl Default for Notification {
    fn default() -> Self {
        Self {
            name: "New Notification".to_string(),
            message: String::new(),
            time_from_start: 0,
            time_point: 0,
            buzzer: true,
            done: Some(false),
        }
    }
}

/// Named mash or boil profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MashSchedule {
    /// Unique schedule name.
    pub name: String,
    /// `true` for boil profiles, `false` for mash profiles.
    #[serde(default)]
    pub boil: bool,
    /// Ephemeral schedule created from an imported recipe.
    #[serde(default)]
    pub temporary: bool,
    /// Temperature steps ordered by index.
    #[serde(default)]
    pub steps: Vec<MashStep>,
    /// Notifications ordered by time point.
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

/// Ordering invariant violated by a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScheduleInvariantError {
    /// Step indices must be unique and strictly increasing.
    #[error("step index not increasing")]
    StepIndexNotIncreasing {
        /// Position of the offending step.
        position: usize,
        /// Index of the preceding step.
        previous: u32,
        /// Index of the offending step.
        index: u32,
    },
    /// Notification time points must not decrease.
    #[error("notification time point decreasing")]
    TimePointDecreasing {
        /// Position of the offending notification.
        position: usize,
        /// Time point of the preceding notification.
        previous: i64,
        /// Time point of the offending notification.
        time_point: i64,
    },
}

impl MashSchedule {
    /// Check the step and notification ordering invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`ScheduleInvariantError`] found, scanning steps
    /// before notifications.
    pub fn validate(&self) -> Result<(), ScheduleInvariantError> {
        for (position, pair) in self.steps.windows(2).enumerate() {
            if pair[1].index <= pair[0].index {
                return Err(ScheduleInvariantError::StepIndexNotIncreasing {
                    position: position + 1,
                    previous: pair[0].index,
                    index: pair[1].index,
                });
            }
        }
        for (position, pair) in self.notifications.windows(2).enumerate() {
            if pair[1].time_point < pair[0].time_point {
                return Err(ScheduleInvariantError::TimePointDecreasing {
                    position: position + 1,
                    previous: pair[0].time_point,
                    time_point: pair[1].time_point,
                });
            }
        }
        Ok(())
    }
}

/// Payload type returned by exactly one read command.
///
/// Binding the command to its reply type means a store can only ever decode
/// a reply with the schema of the command it sent.
pub trait CommandReply: DeserializeOwned {
    /// Command whose successful reply carries this payload.
    const COMMAND: Command;

    /// Decode the `data` field of a successful reply.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error when the payload does not
    /// match the reply shape (including a `null` payload).
    fn decode(data: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(data)
    }
}

impl CommandReply for SystemSettings {
    const COMMAND: Command = Command::GetSystemSettings;
}

impl CommandReply for Vec<MashSchedule> {
    const COMMAND: Command = Command::GetMashSchedules;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(index: u32) -> MashStep {
        MashStep {
            index,
            name: format!("step {index}"),
            temperature: 65.0,
            step_time: 5,
            time: 60,
            extend_step_time_if_needed: false,
        }
    }

    fn notification(time_point: i64) -> Notification {
        Notification {
            time_point,
            ..Notification::default()
        }
    }

    #[test]
    fn request_serialises_missing_payload_as_null() {
        let request = ApiRequest::new(Command::GetSystemSettings, None);
        let encoded = serde_json::to_value(&request).expect("request encodes");
        assert_eq!(encoded, json!({"command": "GetSystemSettings", "data": null}));
    }

    #[test]
    fn result_requires_success_flag() {
        let decoded: Result<ApiResult, _> = serde_json::from_value(json!({"data": {}}));
        assert!(decoded.is_err());

        let decoded: ApiResult =
            serde_json::from_value(json!({"success": false})).expect("envelope decodes");
        assert_eq!(decoded.data, Value::Null);
        assert!(decoded.message.is_none());
    }

    #[test]
    fn failure_envelope_has_null_data() {
        let envelope = ApiResult::failure("connection refused");
        assert!(!envelope.success);
        assert_eq!(envelope.data, Value::Null);
        assert_eq!(envelope.message.as_deref(), Some("connection refused"));
    }

    #[test]
    fn temperature_scale_uses_integer_discriminants() {
        let scale: TemperatureScale = serde_json::from_value(json!(1)).expect("scale decodes");
        assert_eq!(scale, TemperatureScale::Fahrenheit);
        assert_eq!(
            serde_json::to_value(TemperatureScale::Celsius).expect("scale encodes"),
            json!(0)
        );
        assert!(serde_json::from_value::<TemperatureScale>(json!(7)).is_err());
    }

    #[test]
    fn unit_follows_scale() {
        assert_eq!(TemperatureScale::Fahrenheit.unit(), "°F");
        assert_eq!(TemperatureScale::Celsius.unit(), "°C");
    }

    #[test]
    fn system_settings_tolerate_missing_fields() {
        let settings: SystemSettings = serde_json::from_value(json!({
            "onewirePin": 4,
            "heat1Pin": 16,
            "mqttUri": "mqtt://broker"
        }))
        .expect("settings decode");
        assert_eq!(settings.onewire_pin, 4);
        assert_eq!(settings.heat1_pin, 16);
        assert_eq!(settings.temperature_scale, TemperatureScale::Celsius);
        assert_eq!(settings.buzzer_time, 0);
    }

    #[test]
    fn schedules_without_flags_decode_with_defaults() {
        let schedule: MashSchedule = serde_json::from_value(json!({
            "name": "Single infusion",
            "steps": [{
                "index": 0,
                "name": "Mash in",
                "temperature": 66,
                "stepTime": 5,
                "time": 60,
                "extendStepTimeIfNeeded": true
            }]
        }))
        .expect("schedule decodes");
        assert!(!schedule.boil);
        assert!(!schedule.temporary);
        assert!(schedule.notifications.is_empty());
        assert_eq!(schedule.steps[0].step_time, 5);
    }

    #[test]
    fn default_notification_matches_editor_template() {
        let notification = Notification::default();
        assert_eq!(notification.name, "New Notification");
        assert!(notification.buzzer);
        assert_eq!(notification.done, Some(false));
    }

    #[test]
    fn validate_reports_out_of_order_steps() {
        let schedule = MashSchedule {
            name: "broken".into(),
            boil: false,
            temporary: false,
            steps: vec![step(0), step(2), step(2)],
            notifications: vec![],
        };
        assert_eq!(
            schedule.validate(),
            Err(ScheduleInvariantError::StepIndexNotIncreasing {
                position: 2,
                previous: 2,
                index: 2,
            })
        );
    }

    #[test]
    fn validate_reports_decreasing_time_points() {
        let schedule = MashSchedule {
            name: "boil".into(),
            boil: true,
            temporary: false,
            steps: vec![step(0)],
            notifications: vec![notification(10), notification(10), notification(5)],
        };
        assert!(matches!(
            schedule.validate(),
            Err(ScheduleInvariantError::TimePointDecreasing { position: 2, .. })
        ));
    }

    #[test]
    fn reply_types_are_bound_to_their_command() {
        assert_eq!(SystemSettings::COMMAND, Command::GetSystemSettings);
        assert_eq!(<Vec<MashSchedule>>::COMMAND, Command::GetMashSchedules);

        let schedules = <Vec<MashSchedule>>::decode(json!([])).expect("empty list decodes");
        assert!(schedules.is_empty());

        assert!(SystemSettings::decode(Value::Null).is_err());
        assert!(<Vec<MashSchedule>>::decode(json!({"name": "x"})).is_err());
    }
}
