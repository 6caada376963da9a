//! Integration tests for App, Bridge and Runtime behavior.
//!
//! # Oracle Pattern
//!
//! Tests end with oracle checks that verify:
//! - App panels reflect the session's handshake phase
//! - Both roles show the same shared-secret fingerprint after an exchange
//! - Expired or cleared roles are refused by the messaging gate

use std::{collections::VecDeque, convert::Infallible, time::Duration};

use kemlink_app::{
    App, AppAction, AppEvent, Bridge, Driver, NotificationKind, Runtime,
    state::NOTIFICATION_TICKS,
};
use kemlink_core::{
    ErrorKind, ExpirationPolicy, HandshakePhase, Role,
    env::{Environment, test_utils::MockEnv},
};

fn setup() -> (App, Bridge<MockEnv>, MockEnv) {
    let env = MockEnv::new();
    let policy = ExpirationPolicy::default();
    (App::new(policy), Bridge::new(env.clone(), policy), env)
}

/// Process actions from App through Bridge and update App state.
fn process_actions<E: Environment>(app: &mut App, bridge: &mut Bridge<E>, actions: Vec<AppAction>) {
    let mut pending = actions;
    while !pending.is_empty() {
        for action in std::mem::take(&mut pending) {
            if action.is_session_action() {
                for event in bridge.process_app_action(action) {
                    pending.extend(app.handle(event));
                }
            }
        }
    }
}

/// Submit one input line as the user would type it.
fn submit<E: Environment>(app: &mut App, bridge: &mut Bridge<E>, line: &str) {
    let actions = app.handle(AppEvent::Input(line.to_string()));
    process_actions(app, bridge, actions);
}

/// Advance the clock and deliver one tick to both state machines.
fn tick(app: &mut App, bridge: &mut Bridge<MockEnv>, env: &MockEnv, by: Duration) {
    env.advance(by);
    app.handle(AppEvent::Tick);
    for event in bridge.handle_tick(env.now()) {
        let actions = app.handle(event);
        process_actions(app, bridge, actions);
    }
}

fn complete_exchange<E: Environment>(app: &mut App, bridge: &mut Bridge<E>) {
    submit(app, bridge, "gen");
    let public_key = app.panel(Role::A).public_key.clone().unwrap();
    submit(app, bridge, &format!("encap {public_key}"));
    let ciphertext = app.panel(Role::B).ciphertext.clone().unwrap();
    submit(app, bridge, &format!("decap {ciphertext}"));
}

#[test]
fn full_exchange_and_message_round_trip() {
    let (mut app, mut bridge, _) = setup();

    complete_exchange(&mut app, &mut bridge);

    let a = app.panel(Role::A);
    let b = app.panel(Role::B);
    assert_eq!(a.phase, HandshakePhase::SecretDerived);
    assert_eq!(b.phase, HandshakePhase::SecretDerived);
    assert!(a.secret_fingerprint.is_some());
    assert_eq!(a.secret_fingerprint, b.secret_fingerprint);
    assert!(a.countdown.is_some() && b.countdown.is_some());

    submit(&mut app, &mut bridge, "encrypt a Hello, B!");
    let blob = app.panel(Role::A).last_encrypted.clone().unwrap();
    submit(&mut app, &mut bridge, &format!("decrypt b   {blob}  "));

    assert_eq!(app.panel(Role::B).last_decrypted.as_deref(), Some("Hello, B!"));
    let notification = app.notification().unwrap();
    assert_eq!(notification.kind, NotificationKind::Success);
    assert_eq!(notification.message, "Message decrypted successfully!");
}

#[test]
fn messaging_before_exchange_is_refused() {
    let (mut app, mut bridge, _) = setup();

    submit(&mut app, &mut bridge, "encrypt a hi");

    let notification = app.notification().unwrap();
    assert_eq!(notification.kind, NotificationKind::Error);
    assert_eq!(notification.error_kind, Some(ErrorKind::NoKeyEstablished));
}

#[test]
fn decap_before_gen_is_a_validation_error() {
    let (mut app, mut bridge, _) = setup();

    submit(&mut app, &mut bridge, "decap QUJD");

    let notification = app.notification().unwrap();
    assert_eq!(notification.error_kind, Some(ErrorKind::Validation));
    assert_eq!(app.panel(Role::A).phase, HandshakePhase::Empty);
}

#[test]
fn expiry_wipes_only_the_expired_role() {
    let (mut app, mut bridge, env) = setup();
    submit(&mut app, &mut bridge, "expire a 30 seconds");
    complete_exchange(&mut app, &mut bridge);

    for _ in 0..29 {
        tick(&mut app, &mut bridge, &env, Duration::from_secs(1));
    }
    assert_eq!(app.panel(Role::A).phase, HandshakePhase::SecretDerived);

    tick(&mut app, &mut bridge, &env, Duration::from_secs(1));

    assert_eq!(app.panel(Role::A).phase, HandshakePhase::Empty);
    assert!(app.notification().unwrap().message.contains("expired"));
    assert_eq!(app.panel(Role::B).phase, HandshakePhase::SecretDerived);
    assert!(bridge.session().registry().state(Role::A).is_empty());

    submit(&mut app, &mut bridge, "decrypt a AAAA");
    assert_eq!(app.notification().unwrap().error_kind, Some(ErrorKind::NoKeyEstablished));
}

#[test]
fn countdown_tracks_remaining_time() {
    let (mut app, mut bridge, env) = setup();
    submit(&mut app, &mut bridge, "expire b 5 minutes");
    submit(&mut app, &mut bridge, "gen");
    let public_key = app.panel(Role::A).public_key.clone().unwrap();
    submit(&mut app, &mut bridge, &format!("encap {public_key}"));

    tick(&mut app, &mut bridge, &env, Duration::from_secs(61));

    let countdown = app.panel(Role::B).countdown.unwrap();
    assert_eq!(countdown.remaining, Duration::from_secs(239));
    assert_eq!(countdown.to_string(), "03:59");
    assert!(app.notification().unwrap().message.starts_with("User B keys expire in"));
}

#[test]
fn regenerating_keys_replaces_the_timer() {
    let (mut app, mut bridge, env) = setup();

    submit(&mut app, &mut bridge, "gen");
    let first = *bridge.session().registry().timer(Role::A).unwrap();
    let first_key = app.panel(Role::A).public_key.clone();

    env.advance(Duration::from_secs(10));
    submit(&mut app, &mut bridge, "gen");
    let second = *bridge.session().registry().timer(Role::A).unwrap();

    assert_ne!(first.handle, second.handle);
    assert_eq!(second.deadline, first.deadline + Duration::from_secs(10));
    assert_ne!(app.panel(Role::A).public_key, first_key);
}

#[test]
fn stop_then_clear() {
    let (mut app, mut bridge, env) = setup();
    submit(&mut app, &mut bridge, "gen");

    submit(&mut app, &mut bridge, "stop a");
    assert!(app.panel(Role::A).countdown.is_none());
    assert_eq!(app.panel(Role::A).phase, HandshakePhase::KeysGenerated);

    // A stopped role never expires.
    tick(&mut app, &mut bridge, &env, Duration::from_secs(24 * 3600));
    assert_eq!(app.panel(Role::A).phase, HandshakePhase::KeysGenerated);

    submit(&mut app, &mut bridge, "clear a");
    assert_eq!(app.panel(Role::A).phase, HandshakePhase::Empty);
    submit(&mut app, &mut bridge, "clear a");
    assert_eq!(app.notification().unwrap().message, "User A has no keys to clear");
}

#[test]
fn out_of_range_lifetime_is_clamped() {
    let (mut app, mut bridge, _) = setup();

    submit(&mut app, &mut bridge, "expire a 10 s");

    assert_eq!(app.panel(Role::A).setting.value(), 30);
    assert_eq!(bridge.session().policy().get(Role::A).value(), 30);
    assert!(app.notification().unwrap().message.contains("clamped"));
}

/// Driver that replays a fixed script, then idles on ticks.
struct ScriptedDriver {
    env: MockEnv,
    lines: VecDeque<String>,
    idle_ticks: u32,
    renders: usize,
    help_shown: usize,
    status_shown: usize,
    stopped: bool,
}

impl ScriptedDriver {
    fn new(env: MockEnv, lines: &[&str], idle_ticks: u32) -> Self {
        Self {
            env,
            lines: lines.iter().map(ToString::to_string).collect(),
            idle_ticks,
            renders: 0,
            help_shown: 0,
            status_shown: 0,
            stopped: false,
        }
    }
}

impl Driver for ScriptedDriver {
    type Error = Infallible;
    type Instant = std::time::Instant;

    async fn poll_event(&mut self, app: &mut App) -> Result<Vec<AppAction>, Self::Error> {
        if let Some(line) = self.lines.pop_front() {
            return Ok(app.handle(AppEvent::Input(line)));
        }
        self.idle_ticks = self.idle_ticks.saturating_sub(1);
        self.env.sleep(Duration::from_secs(1)).await;
        Ok(app.handle(AppEvent::Tick))
    }

    fn now(&self) -> Self::Instant {
        self.env.now()
    }

    fn render(&mut self, _app: &App) -> Result<(), Self::Error> {
        self.renders += 1;
        Ok(())
    }

    fn show_help(&mut self) -> Result<(), Self::Error> {
        self.help_shown += 1;
        Ok(())
    }

    fn show_status(&mut self, _app: &App) -> Result<(), Self::Error> {
        self.status_shown += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn is_finished(&self) -> bool {
        self.lines.is_empty() && self.idle_ticks == 0
    }
}

#[tokio::test]
async fn runtime_routes_commands_and_ticks() {
    let env = MockEnv::new();
    let driver = ScriptedDriver::new(env.clone(), &["help", "expire a 30 s", "gen", "status"], 0);
    let mut runtime = Runtime::new(driver, env.clone(), ExpirationPolicy::default());

    for _ in 0..4 {
        assert!(!runtime.process_cycle().await.unwrap());
    }

    assert_eq!(runtime.driver().help_shown, 1);
    assert_eq!(runtime.driver().status_shown, 1);
    assert!(runtime.driver().renders >= 2);
    assert_eq!(runtime.app().panel(Role::A).phase, HandshakePhase::KeysGenerated);

    // Idle cycles advance the virtual clock one second each.
    for _ in 0..30 {
        runtime.process_cycle().await.unwrap();
    }
    assert_eq!(runtime.app().panel(Role::A).phase, HandshakePhase::Empty);
    assert_eq!(runtime.bridge().session().phase(Role::A), HandshakePhase::Empty);
}

#[tokio::test]
async fn runtime_quits_on_command() {
    let env = MockEnv::new();
    let driver = ScriptedDriver::new(env.clone(), &["gen", "quit", "gen"], 10);
    let mut runtime = Runtime::new(driver, env, ExpirationPolicy::default());

    assert!(!runtime.process_cycle().await.unwrap());
    assert!(runtime.process_cycle().await.unwrap());
}

#[tokio::test]
async fn runtime_run_stops_when_input_is_exhausted() {
    let env = MockEnv::new();
    let driver = ScriptedDriver::new(env.clone(), &["gen"], NOTIFICATION_TICKS);
    let runtime = Runtime::new(driver, env.clone(), ExpirationPolicy::default());

    runtime.run().await.unwrap();

    assert_eq!(env.elapsed(), Duration::from_secs(u64::from(NOTIFICATION_TICKS)));
}
