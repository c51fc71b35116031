//! Remote state store: process-wide cache of controller settings and schedules.
//!
//! # Design
//! - One instance per app boot, passed to consumers explicitly.
//! - Interior mutability; no borrow is held across an await, so fetches may overlap.
//! - A failed fetch leaves every cached field untouched and returns a typed error.
//! - The settings fetch awaits its schedules cascade before flagging itself loaded.

use std::cell::RefCell;
use std::rc::Rc;

use brewlink_api_models::{CommandReply, MashSchedule, SystemSettings, TemperatureScale};

use crate::error::{StoreError, StoreResult};
use crate::transport::{Transport, WebConn};

/// Upper bound on schedules the client offers to create.
pub const MAX_SCHEDULES: usize = 10;

/// Coarse load state of the system settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing fetched yet and no fetch running.
    Unloaded,
    /// First fetch in flight.
    Loading,
    /// Settings have been loaded at least once (possibly stale).
    Loaded,
}

/// Snapshot of everything the store caches.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteState {
    /// Set once a settings fetch (and its schedules cascade) has completed.
    pub system_settings_loaded: bool,
    /// Set once a schedules fetch has succeeded.
    pub schedules_loaded: bool,
    /// Last successfully fetched settings.
    pub system_settings: Option<SystemSettings>,
    /// Scale reported by the controller.
    pub temperature_scale: TemperatureScale,
    /// Display unit derived from `temperature_scale`.
    pub temp_unit: &'static str,
    /// Controller root URL, set once.
    pub root_url: Option<String>,
    /// Cached schedules, replaced wholesale on every successful fetch.
    pub mash_schedules: Vec<MashSchedule>,
    /// Client-side ceiling on schedule creation.
    pub max_schedules: usize,
    /// Number of fetches currently in flight.
    pub in_flight: u32,
    /// Message of the most recent failure, cleared by the next success.
    pub last_error: Option<String>,
}

impl Default for RemoteState {
    fn default() -> Self {
        let temperature_scale = TemperatureScale::default();
        Self {
            system_settings_loaded: false,
            schedules_loaded: false,
            system_settings: None,
            temperature_scale,
            temp_unit: temperature_scale.unit(),
            root_url: None,
            mash_schedules: Vec::new(),
            max_schedules: MAX_SCHEDULES,
            in_flight: 0,
            last_error: None,
        }
    }
}

impl RemoteState {
    /// Derive the coarse load state.
    #[must_use]
    pub const fn load_state(&self) -> LoadState {
        if self.system_settings_loaded {
            LoadState::Loaded
        } else if self.in_flight > 0 {
            LoadState::Loading
        } else {
            LoadState::Unloaded
        }
    }

    /// Whether the schedule editor may offer to create another schedule.
    #[must_use]
    pub fn can_add_schedule(&self) -> bool {
        self.mash_schedules.len() < self.max_schedules
    }

    fn apply_settings(&mut self, settings: SystemSettings) {
        self.temperature_scale = settings.temperature_scale;
        self.temp_unit = settings.temperature_scale.unit();
        self.system_settings = Some(settings);
    }
}

/// Cache of controller-reported state with its fetch operations.
pub struct RemoteStateStore {
    transport: RefCell<Option<Rc<dyn Transport>>>,
    state: RefCell<RemoteState>,
}

impl Default for RemoteStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RemoteStateStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RemoteStateStore")
            .field("state", &self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl RemoteStateStore {
    /// Create an empty store with no root URL.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transport: RefCell::new(None),
            state: RefCell::new(RemoteState::default()),
        }
    }

    /// Create a store already bound to `transport`.
    #[must_use]
    pub fn with_transport(transport: Rc<dyn Transport>) -> Self {
        let store = Self::new();
        store.bind(transport);
        store
    }

    /// Set the controller root URL and build its [`WebConn`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RootUrlAlreadySet`] when a URL is already bound, or
    /// [`StoreError::Transport`] when the connection cannot be created.
    pub fn set_root_url(&self, root_url: impl Into<String>) -> StoreResult<()> {
        self.ensure_unbound()?;
        let conn = WebConn::new(root_url)?;
        self.bind(Rc::new(conn));
        Ok(())
    }

    /// Bind an arbitrary transport in place of a root URL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RootUrlAlreadySet`] when a transport is already bound.
    pub fn attach(&self, transport: Rc<dyn Transport>) -> StoreResult<()> {
        self.ensure_unbound()?;
        self.bind(transport);
        Ok(())
    }

    fn ensure_unbound(&self) -> StoreResult<()> {
        match self.state.borrow().root_url.as_ref() {
            Some(current) => Err(StoreError::RootUrlAlreadySet {
                current: current.clone(),
            }),
            None => Ok(()),
        }
    }

    fn bind(&self, transport: Rc<dyn Transport>) {
        self.state.borrow_mut().root_url = Some(transport.root_url().to_string());
        *self.transport.borrow_mut() = Some(transport);
    }

    /// Clone of the full cache.
    #[must_use]
    pub fn snapshot(&self) -> RemoteState {
        self.state.borrow().clone()
    }

    /// Configured root URL, if any.
    #[must_use]
    pub fn root_url(&self) -> Option<String> {
        self.state.borrow().root_url.clone()
    }

    /// Whether system settings have been loaded.
    #[must_use]
    pub fn system_settings_loaded(&self) -> bool {
        self.state.borrow().system_settings_loaded
    }

    /// Whether schedules have been loaded.
    #[must_use]
    pub fn schedules_loaded(&self) -> bool {
        self.state.borrow().schedules_loaded
    }

    /// Cached temperature scale.
    #[must_use]
    pub fn temperature_scale(&self) -> TemperatureScale {
        self.state.borrow().temperature_scale
    }

    /// Cached display unit, always consistent with [`Self::temperature_scale`].
    #[must_use]
    pub fn temp_unit(&self) -> &'static str {
        self.state.borrow().temp_unit
    }

    /// Scale and unit read together.
    #[must_use]
    pub fn temperature_display(&self) -> (TemperatureScale, &'static str) {
        let state = self.state.borrow();
        (state.temperature_scale, state.temp_unit)
    }

    /// Last fetched settings.
    #[must_use]
    pub fn system_settings(&self) -> Option<SystemSettings> {
        self.state.borrow().system_settings.clone()
    }

    /// Clone of the cached schedules.
    #[must_use]
    pub fn mash_schedules(&self) -> Vec<MashSchedule> {
        self.state.borrow().mash_schedules.clone()
    }

    /// Borrowed read of the cached schedules.
    ///
    /// `read` must not call back into the store's fetch operations.
    pub fn with_schedules<R>(&self, read: impl FnOnce(&[MashSchedule]) -> R) -> R {
        read(&self.state.borrow().mash_schedules)
    }

    /// Client-side schedule ceiling.
    #[must_use]
    pub fn max_schedules(&self) -> usize {
        self.state.borrow().max_schedules
    }

    /// Whether another schedule may be created.
    #[must_use]
    pub fn can_add_schedule(&self) -> bool {
        self.state.borrow().can_add_schedule()
    }

    /// Coarse load state.
    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.state.borrow().load_state()
    }

    /// Message of the most recent failed fetch.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    /// Fetch system settings, then refresh schedules.
    ///
    /// The scale and unit are written together; `system_settings_loaded` is
    /// set only after the schedules cascade has finished. A failed cascade is
    /// recorded in [`Self::last_error`] but does not fail this call.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RootUrlUnset`] before a root URL is set, or the
    /// transport, rejection or payload error of the settings fetch. No cached
    /// field changes in either case.
    pub async fn get_system_settings(&self) -> StoreResult<()> {
        let settings: SystemSettings = self.request().await?;

        {
            let mut state = self.state.borrow_mut();
            state.apply_settings(settings);
            state.last_error = None;
        }
        tracing::info!(
            scale = ?self.temperature_scale(),
            unit = self.temp_unit(),
            "system settings loaded"
        );

        if let Err(err) = self.get_mash_schedules().await {
            tracing::warn!(error = %err, "schedule refresh after settings load failed");
        }

        self.state.borrow_mut().system_settings_loaded = true;
        Ok(())
    }

    /// Fetch schedules and replace the cached list wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RootUrlUnset`] before a root URL is set, or the
    /// transport, rejection or payload error of the fetch. The cached list is
    /// left untouched on error.
    pub async fn get_mash_schedules(&self) -> StoreResult<()> {
        let schedules: Vec<MashSchedule> = self.request().await?;

        for schedule in &schedules {
            if let Err(err) = schedule.validate() {
                tracing::warn!(schedule = %schedule.name, error = %err, "schedule violates ordering");
            }
        }
        tracing::info!(count = schedules.len(), "mash schedules loaded");

        let mut state = self.state.borrow_mut();
        state.mash_schedules = schedules;
        state.schedules_loaded = true;
        state.last_error = None;
        Ok(())
    }

    async fn request<R: CommandReply>(&self) -> StoreResult<R> {
        let command = R::COMMAND;
        let transport = self.transport.borrow().clone().ok_or_else(|| {
            tracing::warn!(%command, "fetch skipped: controller root URL is not set");
            StoreError::RootUrlUnset
        })?;

        let _in_flight = InFlight::enter(&self.state);
        let result = match transport.send(command, None).await {
            Ok(result) => result,
            Err(err) => return Err(self.record_failure(err.into())),
        };

        if !result.success {
            let message = result
                .message
                .unwrap_or_else(|| "no message provided".to_string());
            return Err(self.record_failure(StoreError::Rejected { command, message }));
        }

        R::decode(result.data).map_err(|err| {
            self.record_failure(StoreError::MalformedPayload {
                command,
                detail: err.to_string(),
            })
        })
    }

    fn record_failure(&self, err: StoreError) -> StoreError {
        tracing::warn!(error = %err, "controller fetch failed; keeping cached state");
        self.state.borrow_mut().last_error = Some(err.to_string());
        err
    }
}

/// Counts a fetch as in flight for as long as it is alive.
struct InFlight<'a> {
    state: &'a RefCell<RemoteState>,
}

impl<'a> InFlight<'a> {
    fn enter(state: &'a RefCell<RemoteState>) -> Self {
        state.borrow_mut().in_flight += 1;
        Self { state }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_celsius_and_unloaded() {
        let store = RemoteStateStore::new();
        assert_eq!(store.temperature_display(), (TemperatureScale::Celsius, "°C"));
        assert_eq!(store.load_state(), LoadState::Unloaded);
        assert_eq!(store.max_schedules(), MAX_SCHEDULES);
        assert!(store.root_url().is_none());
    }

    #[test]
    fn root_url_is_set_once() -> StoreResult<()> {
        let store = RemoteStateStore::new();
        store.set_root_url("http://brewengine/")?;
        assert_eq!(store.root_url().as_deref(), Some("http://brewengine/"));
        assert_eq!(
            store.set_root_url("http://other/"),
            Err(StoreError::RootUrlAlreadySet {
                current: "http://brewengine/".into()
            })
        );
        let other = Rc::new(WebConn::new("http://other/")?);
        assert!(store.attach(other).is_err());
        assert_eq!(store.root_url().as_deref(), Some("http://brewengine/"));
        Ok(())
    }

    #[tokio::test]
    async fn unset_root_url_is_reported_without_mutation() {
        let store = RemoteStateStore::new();
        let before = store.snapshot();
        assert_eq!(store.get_system_settings().await, Err(StoreError::RootUrlUnset));
        assert_eq!(store.get_mash_schedules().await, Err(StoreError::RootUrlUnset));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn can_add_schedule_respects_ceiling() {
        let mut state = RemoteState {
            max_schedules: 1,
            ..RemoteState::default()
        };
        assert!(state.can_add_schedule());
        state.mash_schedules.push(MashSchedule {
            name: "only".into(),
            boil: false,
            temporary: false,
            steps: vec![],
            notifications: vec![],
        });
        assert!(!state.can_add_schedule());
    }

    #[test]
    fn load_state_reports_loading_while_in_flight() {
        let mut state = RemoteState {
            in_flight: 2,
            ..RemoteState::default()
        };
        assert_eq!(state.load_state(), LoadState::Loading);
        state.system_settings_loaded = true;
        assert_eq!(state.load_state(), LoadState::Loaded);
    }
}
