//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the console driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`kemlink_app::Runtime`] orchestration code runs in both production and
//! simulation. When no input is queued, each poll sleeps one virtual second
//! and delivers a tick.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use kemlink_app::{App, AppAction, AppEvent, Driver};
use kemlink_core::{Role, env::Environment};

use crate::{
    invariants::{InvariantRegistry, RoleSnapshot, SystemSnapshot},
    sim_env::{SimEnv, SimInstant},
};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Shared state for event injection and output capture.
#[derive(Default)]
struct SharedState {
    pending_events: VecDeque<AppEvent>,
    idle_ticks: u32,
    renders: usize,
    help_shown: usize,
    status_shown: usize,
    notifications: Vec<String>,
    last_seq: Option<u64>,
    stopped: bool,
}

/// Simulation driver for deterministic testing.
///
/// Clones share the queue and the captured output, so a test can keep a
/// clone for injection after handing the driver to a runtime.
#[derive(Clone)]
pub struct SimDriver {
    env: SimEnv,
    state: Arc<Mutex<SharedState>>,
    invariants: Option<Arc<InvariantRegistry>>,
}

impl SimDriver {
    /// Create a driver over `env` with no idle ticks.
    pub fn new(env: SimEnv) -> Self {
        Self { env, state: Arc::new(Mutex::new(SharedState::default())), invariants: None }
    }

    /// Allow this many input-free polls before the driver reports finished.
    #[must_use]
    pub fn with_idle_ticks(self, ticks: u32) -> Self {
        self.lock().idle_ticks = ticks;
        self
    }

    /// Enable invariant checking on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(Arc::new(registry));
        self
    }

    /// Queue a line of user input.
    pub fn inject_line(&self, line: impl Into<String>) {
        self.lock().pending_events.push_back(AppEvent::Input(line.into()));
    }

    /// Queue a tick without advancing the clock.
    pub fn inject_tick(&self) {
        self.lock().pending_events.push_back(AppEvent::Tick);
    }

    /// Add idle ticks to the budget.
    pub fn add_idle_ticks(&self, ticks: u32) {
        let mut state = self.lock();
        state.idle_ticks = state.idle_ticks.saturating_add(ticks);
    }

    /// Check if there are pending events to process.
    pub fn has_pending(&self) -> bool {
        !self.lock().pending_events.is_empty()
    }

    /// Number of renders so far.
    pub fn renders(&self) -> usize {
        self.lock().renders
    }

    /// Number of times help was shown.
    pub fn help_shown(&self) -> usize {
        self.lock().help_shown
    }

    /// Number of times status was shown.
    pub fn status_shown(&self) -> usize {
        self.lock().status_shown
    }

    /// Every distinct notification message rendered, in order.
    pub fn notifications(&self) -> Vec<String> {
        self.lock().notifications.clone()
    }

    /// True once the runtime called [`Driver::stop`].
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Create a snapshot from App panels for invariant checking.
    ///
    /// The App knows no handshake lineage, so key agreement is not checked
    /// from here.
    pub fn snapshot_from_app(&self, app: &App) -> SystemSnapshot {
        let mut snapshot = SystemSnapshot::empty();
        for role in Role::ALL {
            let panel = app.panel(role);
            *snapshot.role_mut(role) = RoleSnapshot {
                role,
                phase: panel.phase,
                has_material: panel.has_material(),
                has_key: panel.secret_fingerprint.is_some(),
                has_timer: panel.countdown.is_some(),
                overdue: false,
                material_fingerprint: panel.material_fingerprint.clone(),
                key_fingerprint: panel.secret_fingerprint.clone(),
            };
        }
        snapshot
    }

    /// Check invariants against App state.
    pub fn check_invariants(&self, app: &App, context: &str) {
        if let Some(registry) = &self.invariants {
            registry.assert_all(&self.snapshot_from_app(app), context);
        }
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Instant = SimInstant;

    async fn poll_event(&mut self, app: &mut App) -> Result<Vec<AppAction>, Self::Error> {
        let event = {
            let mut state = self.lock();
            match state.pending_events.pop_front() {
                Some(event) => Some(event),
                None if state.idle_ticks > 0 => {
                    state.idle_ticks -= 1;
                    None
                },
                None => return Err(SimDriverError("polled with no input left".into())),
            }
        };

        match event {
            Some(event) => Ok(app.handle(event)),
            None => {
                self.env.sleep(Duration::from_secs(1)).await;
                Ok(app.handle(AppEvent::Tick))
            },
        }
    }

    fn now(&self) -> Self::Instant {
        self.env.now()
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        {
            let mut state = self.lock();
            state.renders += 1;
            if let Some(notification) = app.notification()
                && state.last_seq != Some(notification.seq)
            {
                state.last_seq = Some(notification.seq);
                state.notifications.push(notification.message.clone());
            }
        }
        self.check_invariants(app, "after render");
        Ok(())
    }

    fn show_help(&mut self) -> Result<(), Self::Error> {
        self.lock().help_shown += 1;
        Ok(())
    }

    fn show_status(&mut self, _app: &App) -> Result<(), Self::Error> {
        self.lock().status_shown += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.lock().stopped = true;
    }

    fn is_finished(&self) -> bool {
        let state = self.lock();
        state.pending_events.is_empty() && state.idle_ticks == 0
    }
}

#[cfg(test)]
mod tests {
    use kemlink_core::HandshakePhase;

    use super::*;

    #[test]
    fn inject_line_queues_event() {
        let driver = SimDriver::new(SimEnv::new());
        driver.inject_line("gen");

        assert!(driver.has_pending());
        assert!(!driver.is_finished());
    }

    #[tokio::test]
    async fn idle_poll_ticks_and_advances_clock() {
        let env = SimEnv::new();
        let mut driver = SimDriver::new(env.clone()).with_idle_ticks(2);
        let mut app = App::new(Default::default());

        driver.poll_event(&mut app).await.unwrap();
        driver.poll_event(&mut app).await.unwrap();

        assert_eq!(env.elapsed(), Duration::from_secs(2));
        assert!(driver.is_finished());
        assert!(driver.poll_event(&mut app).await.is_err());
    }

    #[tokio::test]
    async fn poll_event_processes_input() {
        let mut driver = SimDriver::new(SimEnv::new());
        let mut app = App::new(Default::default());
        driver.inject_line("gen");

        let actions = driver.poll_event(&mut app).await.unwrap();
        assert_eq!(actions, vec![AppAction::GenerateKeys]);
    }

    #[test]
    fn render_records_each_notification_once() {
        let mut driver = SimDriver::new(SimEnv::new());
        let mut app = App::new(Default::default());

        app.handle(AppEvent::Input("bogus".into()));
        driver.render(&app).unwrap();
        driver.render(&app).unwrap();

        assert_eq!(driver.renders(), 2);
        assert_eq!(driver.notifications().len(), 1);
    }

    #[test]
    fn panel_snapshot_reflects_phase() {
        let driver = SimDriver::new(SimEnv::new());
        let mut app = App::new(Default::default());
        app.handle(AppEvent::KeysGenerated { public_key: "pk".into(), fingerprint: "fp".into() });

        let snapshot = driver.snapshot_from_app(&app);
        assert_eq!(snapshot.role(Role::A).phase, HandshakePhase::KeysGenerated);
        assert!(snapshot.role(Role::A).has_material);
        assert!(!snapshot.role(Role::B).has_material);
    }
}
