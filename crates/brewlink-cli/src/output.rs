//! Output renderers and formatting helpers for CLI commands.

use std::io::Write;

use anyhow::anyhow;
use brewlink_api_models::MashSchedule;
use brewlink_ui::{ClientSettings, ImportedBeer, NotificationGroup, Phase, RemoteState, group_notifications};
use serde::Serialize;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

fn write_json(out: &mut dyn Write, value: &impl Serialize) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    line(out, &text)
}

fn line(out: &mut dyn Write, text: &str) -> CliResult<()> {
    writeln!(out, "{text}").map_err(|err| CliError::failure(anyhow!("failed to write output: {err}")))
}

pub(crate) fn render_settings(
    out: &mut dyn Write,
    state: &RemoteState,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(
            out,
            &json!({
                "settings": state.system_settings,
                "tempUnit": state.temp_unit,
                "schedulesLoaded": state.schedules_loaded,
                "scheduleCount": state.mash_schedules.len(),
                "maxSchedules": state.max_schedules,
                "lastError": state.last_error,
            }),
        ),
        OutputFormat::Text => {
            line(out, &format!("scale: {:?} ({})", state.temperature_scale, state.temp_unit))?;
            if let Some(settings) = &state.system_settings {
                line(
                    out,
                    &format!(
                        "pins: onewire {} heat1 {} heat2 {} stir {} buzzer {}",
                        settings.onewire_pin,
                        settings.heat1_pin,
                        settings.heat2_pin,
                        settings.stir_pin,
                        settings.buzzer_pin
                    ),
                )?;
                line(out, &format!("invert outputs: {}", settings.invert_outputs))?;
                if !settings.mqtt_uri.is_empty() {
                    line(out, &format!("mqtt: {}", settings.mqtt_uri))?;
                }
            }
            if state.schedules_loaded {
                line(
                    out,
                    &format!(
                        "schedules: {}/{}",
                        state.mash_schedules.len(),
                        state.max_schedules
                    ),
                )
            } else {
                let reason = state.last_error.as_deref().unwrap_or("not loaded");
                line(out, &format!("schedules: unavailable ({reason})"))
            }
        }
    }
}

pub(crate) fn render_schedules(
    out: &mut dyn Write,
    schedules: &[MashSchedule],
    grouped: bool,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json if grouped => {
            let view: Vec<_> = schedules
                .iter()
                .map(|schedule| {
                    json!({
                        "name": schedule.name,
                        "boil": schedule.boil,
                        "steps": schedule.steps,
                        "notificationGroups": group_notifications(&schedule.notifications),
                    })
                })
                .collect();
            write_json(out, &view)
        }
        OutputFormat::Json => write_json(out, &schedules),
        OutputFormat::Text => {
            if schedules.is_empty() {
                return line(out, "no schedules");
            }
            for schedule in schedules {
                let kind = if schedule.boil { "boil" } else { "mash" };
                line(
                    out,
                    &format!(
                        "{} [{kind}] {} steps, {} notifications",
                        schedule.name,
                        schedule.steps.len(),
                        schedule.notifications.len()
                    ),
                )?;
                for step in &schedule.steps {
                    line(
                        out,
                        &format!(
                            "  step {}: {} {} for {} min",
                            step.index, step.name, step.temperature, step.time
                        ),
                    )?;
                }
                if grouped {
                    render_groups(out, &group_notifications(&schedule.notifications))?;
                }
            }
            Ok(())
        }
    }
}

fn render_groups(out: &mut dyn Write, groups: &[NotificationGroup]) -> CliResult<()> {
    for group in groups {
        let names: Vec<&str> = group
            .notifications
            .iter()
            .map(|notification| notification.name.as_str())
            .collect();
        line(
            out,
            &format!("  at {} min: {}", group.time_from_start, names.join(", ")),
        )?;
    }
    Ok(())
}

pub(crate) fn render_preferences(
    out: &mut dyn Write,
    settings: &ClientSettings,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(out, settings),
        OutputFormat::Text => {
            line(out, &format!("beep: {} (volume {})", on_off(settings.beep_enabled), settings.beep_volume))?;
            line(
                out,
                &format!(
                    "speech: {} (volume {}, rate {})",
                    on_off(settings.speech_enabled),
                    settings.speech_volume,
                    settings.speech_rate
                ),
            )?;
            line(
                out,
                &format!("voice: {}", settings.voice_uri.as_deref().unwrap_or("default")),
            )?;
            let dark_mode = settings.dark_mode.map_or("system", on_off);
            line(out, &format!("dark mode: {dark_mode}"))
        }
    }
}

pub(crate) fn render_locale(
    out: &mut dyn Write,
    locale: Option<&str>,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(out, &json!({ "locale": locale })),
        OutputFormat::Text => line(out, locale.unwrap_or("undetected")),
    }
}

pub(crate) fn render_import(
    out: &mut dyn Write,
    beer: &ImportedBeer,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let schedules: Vec<MashSchedule> = std::iter::once(beer.mash_schedule())
                .chain(beer.boil_schedule())
                .collect();
            write_json(
                out,
                &json!({
                    "name": beer.display_name(),
                    "mashNotificationsGrouped": beer.grouped(Phase::Mash),
                    "boilNotificationsGrouped": beer.grouped(Phase::Boil),
                    "schedules": schedules,
                }),
            )
        }
        OutputFormat::Text => {
            line(out, &format!("recipe: {}", beer.display_name()))?;
            for (label, phase) in [("mash", Phase::Mash), ("boil", Phase::Boil)] {
                line(
                    out,
                    &format!("{label}: {} steps", beer.steps(phase).len()),
                )?;
                render_groups(out, beer.grouped(phase))?;
            }
            Ok(())
        }
    }
}

const fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewlink_api_models::Notification;

    fn render(f: impl FnOnce(&mut dyn Write) -> CliResult<()>) -> String {
        let mut buffer = Vec::new();
        f(&mut buffer).expect("render succeeds");
        String::from_utf8(buffer).expect("utf-8 output")
    }

    #[test]
    fn settings_text_reports_missing_schedules() {
        let state = RemoteState {
            last_error: Some("controller rejected GetMashSchedules: busy".into()),
            ..RemoteState::default()
        };
        let text = render(|out| render_settings(out, &state, OutputFormat::Text));
        assert!(text.starts_with("scale: Celsius (°C)"));
        assert!(text.contains("schedules: unavailable (controller rejected GetMashSchedules: busy)"));
    }

    #[test]
    fn grouped_schedule_text_lists_notifications_by_time() {
        let schedule = MashSchedule {
            name: "Boil".into(),
            boil: true,
            temporary: false,
            steps: vec![],
            notifications: vec![
                Notification {
                    name: "Bittering".into(),
                    ..Notification::default()
                },
                Notification {
                    name: "Whirlfloc".into(),
                    ..Notification::default()
                },
            ],
        };
        let text = render(|out| render_schedules(out, &[schedule], true, OutputFormat::Text));
        assert!(text.contains("Boil [boil] 0 steps, 2 notifications"));
        assert!(text.contains("  at 0 min: Bittering, Whirlfloc"));
    }

    #[test]
    fn preferences_text_shows_defaults() {
        let text = render(|out| render_preferences(out, &ClientSettings::default(), OutputFormat::Text));
        assert!(text.contains("beep: on (volume 0.5)"));
        assert!(text.contains("voice: default"));
        assert!(text.contains("dark mode: system"));
    }

    #[test]
    fn locale_json_uses_null_when_undetected() {
        let text = render(|out| render_locale(out, None, OutputFormat::Json));
        let value: serde_json::Value = serde_json::from_str(&text).expect("json output");
        assert!(value["locale"].is_null());
    }
}
