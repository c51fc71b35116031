//! Controller payload fixtures.

use serde_json::{Value, json};

/// Wire value of the Celsius scale.
pub const CELSIUS: u8 = 0;
/// Wire value of the Fahrenheit scale.
pub const FAHRENHEIT: u8 = 1;

/// `GetSystemSettings` data reporting `scale`.
#[must_use]
pub fn system_settings(scale: u8) -> Value {
    json!({
        "onewirePin": 4,
        "heat1Pin": 16,
        "heat2Pin": 17,
        "stirPin": 18,
        "invertOutputs": false,
        "mqttUri": "mqtt://brewengine.local",
        "temperatureScale": scale,
        "buzzerPin": 19,
        "buzzerTime": 2
    })
}

/// `GetMashSchedules` data with one mash and one boil schedule.
#[must_use]
pub fn mash_schedules() -> Value {
    json!([
        {
            "name": "Single infusion",
            "boil": false,
            "steps": [
                {"index": 0, "name": "Mash in", "temperature": 67.5, "stepTime": 5, "time": 60, "extendStepTimeIfNeeded": true},
                {"index": 1, "name": "Mash out", "temperature": 76.25, "stepTime": 5, "time": 10, "extendStepTimeIfNeeded": false}
            ],
            "notifications": [
                {"name": "Add grain", "message": "Dough in", "timeFromStart": 0, "timePoint": 0, "buzzer": true},
                {"name": "Stir", "message": "", "timeFromStart": 30, "timePoint": 1800, "buzzer": false}
            ]
        },
        {
            "name": "Boil",
            "boil": true,
            "steps": [
                {"index": 0, "name": "Boil", "temperature": 100.0, "stepTime": 10, "time": 60, "extendStepTimeIfNeeded": false}
            ],
            "notifications": [
                {"name": "Bittering hops", "message": "", "timeFromStart": 0, "timePoint": 0, "buzzer": true},
                {"name": "Aroma hops", "message": "", "timeFromStart": 55, "timePoint": 3300, "buzzer": true}
            ]
        }
    ])
}

/// Successful result envelope carrying `data`.
#[must_use]
pub fn envelope(data: Value) -> Value {
    json!({ "success": true, "data": data })
}

/// Failed result envelope carrying `message`.
#[must_use]
pub fn rejection(message: &str) -> Value {
    json!({ "success": false, "data": null, "message": message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelopes_carry_success_flag() {
        assert_eq!(envelope(json!([]))["success"], json!(true));
        assert_eq!(rejection("busy")["message"], json!("busy"));
        assert!(rejection("busy")["data"].is_null());
    }

    #[test]
    fn settings_fixture_reports_requested_scale() {
        assert_eq!(system_settings(FAHRENHEIT)["temperatureScale"], json!(1));
        assert_eq!(mash_schedules().as_array().map(Vec::len), Some(2));
    }
}
