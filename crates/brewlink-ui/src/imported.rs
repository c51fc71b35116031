//! Recipes imported from an external document.
//!
//! An [`ImportedBeer`] is a client-only aggregate: it is parsed, inspected and
//! turned into temporary schedules, never sent back as-is. Grouped
//! notification views are derived and recomputed after every edit.

use brewlink_api_models::{MashSchedule, MashStep, Notification};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grouping::group_by;

/// Failure to read a recipe document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// The document is not a recipe.
    #[error("invalid recipe document: {detail}")]
    InvalidDocument {
        /// Decoder error text.
        detail: String,
    },
}

/// Recipe phase a notification belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Mash steps and notifications.
    Mash,
    /// Boil steps and notifications.
    Boil,
}

/// Notifications sharing the same `timeFromStart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationGroup {
    /// Minutes from phase start shared by the group.
    pub time_from_start: i64,
    /// Notifications in document order.
    pub notifications: Vec<Notification>,
}

/// Group `notifications` by `timeFromStart`, keys in first-seen order.
#[must_use]
pub fn group_notifications(notifications: &[Notification]) -> Vec<NotificationGroup> {
    group_by(notifications.iter().cloned(), |notification| {
        notification.time_from_start
    })
    .into_iter()
    .map(|(time_from_start, notifications)| NotificationGroup {
        time_from_start,
        notifications,
    })
    .collect()
}

/// Recipe parsed from an external document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportedBeer {
    name: Option<String>,
    mash_steps: Vec<MashStep>,
    mash_notifications: Vec<Notification>,
    boil_steps: Vec<MashStep>,
    boil_notifications: Vec<Notification>,
    #[serde(skip)]
    mash_notifications_grouped: Vec<NotificationGroup>,
    #[serde(skip)]
    boil_notifications_grouped: Vec<NotificationGroup>,
}

impl ImportedBeer {
    /// Name used for schedules built from an unnamed recipe.
    pub const UNNAMED: &'static str = "Imported recipe";

    /// Parse a recipe document and derive its grouped views.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::InvalidDocument`] when `raw` is not a recipe.
    pub fn from_json(raw: &str) -> Result<Self, ImportError> {
        let mut beer: Self =
            serde_json::from_str(raw).map_err(|err| ImportError::InvalidDocument {
                detail: err.to_string(),
            })?;
        beer.regroup();
        tracing::debug!(
            name = beer.display_name(),
            mash_notifications = beer.mash_notifications.len(),
            boil_notifications = beer.boil_notifications.len(),
            "recipe imported"
        );
        Ok(beer)
    }

    /// Recompute both grouped notification views.
    pub fn regroup(&mut self) {
        self.mash_notifications_grouped = group_notifications(&self.mash_notifications);
        self.boil_notifications_grouped = group_notifications(&self.boil_notifications);
    }

    /// Recipe name, if the document carried one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Recipe name or [`Self::UNNAMED`].
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name().unwrap_or(Self::UNNAMED)
    }

    /// Steps of `phase`.
    #[must_use]
    pub fn steps(&self, phase: Phase) -> &[MashStep] {
        match phase {
            Phase::Mash => &self.mash_steps,
            Phase::Boil => &self.boil_steps,
        }
    }

    /// Notifications of `phase` in document order.
    #[must_use]
    pub fn notifications(&self, phase: Phase) -> &[Notification] {
        match phase {
            Phase::Mash => &self.mash_notifications,
            Phase::Boil => &self.boil_notifications,
        }
    }

    /// Notifications of `phase` grouped by `timeFromStart`.
    #[must_use]
    pub fn grouped(&self, phase: Phase) -> &[NotificationGroup] {
        match phase {
            Phase::Mash => &self.mash_notifications_grouped,
            Phase::Boil => &self.boil_notifications_grouped,
        }
    }

    /// Append a notification to `phase` and refresh its grouping.
    pub fn push_notification(&mut self, phase: Phase, notification: Notification) {
        self.edit_notifications(phase, |notifications| notifications.push(notification));
    }

    /// Edit the notifications of `phase` in place, then refresh its grouping.
    pub fn edit_notifications(&mut self, phase: Phase, edit: impl FnOnce(&mut Vec<Notification>)) {
        match phase {
            Phase::Mash => {
                edit(&mut self.mash_notifications);
                self.mash_notifications_grouped = group_notifications(&self.mash_notifications);
            }
            Phase::Boil => {
                edit(&mut self.boil_notifications);
                self.boil_notifications_grouped = group_notifications(&self.boil_notifications);
            }
        }
    }

    /// Temporary mash schedule built from the recipe.
    #[must_use]
    pub fn mash_schedule(&self) -> MashSchedule {
        MashSchedule {
            name: self.display_name().to_string(),
            boil: false,
            temporary: true,
            steps: self.mash_steps.clone(),
            notifications: self.mash_notifications.clone(),
        }
    }

    /// Temporary boil schedule, `None` when the recipe has no boil phase.
    #[must_use]
    pub fn boil_schedule(&self) -> Option<MashSchedule> {
        if self.boil_steps.is_empty() && self.boil_notifications.is_empty() {
            return None;
        }
        Some(MashSchedule {
            name: format!("{} (boil)", self.display_name()),
            boil: true,
            temporary: true,
            steps: self.boil_steps.clone(),
            notifications: self.boil_notifications.clone(),
        })
    }
}
