//! Full application runtime under simulation.
//!
//! The production [`Runtime`] runs with a [`SimDriver`] and [`SimEnv`], so
//! command parsing, the bridge, countdown rendering and expiry all execute
//! exactly as in the console, but on virtual time.

use std::time::Duration;

use kemlink_app::{NotificationKind, Runtime};
use kemlink_core::{ErrorKind, ExpirationPolicy, HandshakePhase, Role};
use kemlink_harness::{InvariantRegistry, SimDriver, SimEnv};

type SimRuntime = Runtime<SimDriver, SimEnv>;

fn runtime(seed: u64) -> (SimRuntime, SimDriver, SimEnv) {
    let env = SimEnv::with_seed(seed);
    let driver = SimDriver::new(env.clone()).with_invariants(InvariantRegistry::standard());
    let runtime = Runtime::new(driver.clone(), env.clone(), ExpirationPolicy::default());
    (runtime, driver, env)
}

/// Feed one line and run a single cycle.
async fn submit(runtime: &mut SimRuntime, driver: &SimDriver, line: &str) -> bool {
    driver.inject_line(line);
    runtime.process_cycle().await.unwrap()
}

async fn exchange(runtime: &mut SimRuntime, driver: &SimDriver) {
    submit(runtime, driver, "gen").await;
    let public_key = runtime.app().panel(Role::A).public_key.clone().unwrap();
    submit(runtime, driver, &format!("encap {public_key}")).await;
    let ciphertext = runtime.app().panel(Role::B).ciphertext.clone().unwrap();
    submit(runtime, driver, &format!("decap {ciphertext}")).await;
}

#[tokio::test]
async fn console_session_round_trip() {
    let (mut runtime, driver, _) = runtime(1);

    exchange(&mut runtime, &driver).await;
    let a = runtime.app().panel(Role::A);
    let b = runtime.app().panel(Role::B);
    assert_eq!(a.phase, HandshakePhase::SecretDerived);
    assert_eq!(a.secret_fingerprint, b.secret_fingerprint);

    submit(&mut runtime, &driver, "encrypt b see you at noon").await;
    let blob = runtime.app().panel(Role::B).last_encrypted.clone().unwrap();
    submit(&mut runtime, &driver, &format!("decrypt a {blob}")).await;

    assert_eq!(runtime.app().panel(Role::A).last_decrypted.as_deref(), Some("see you at noon"));
    assert_eq!(driver.notifications(), vec![
        "Keys generated successfully! Share the public key with User B.",
        "Encapsulation successful! Send the ciphertext to User A.",
        "Decapsulation successful! Both users now have the same shared secret.",
        "Message encrypted successfully!",
        "Message decrypted successfully!",
    ]);
}

#[tokio::test]
async fn idle_ticks_count_down_and_expire() {
    let (mut runtime, driver, env) = runtime(2);
    submit(&mut runtime, &driver, "expire a 45 s").await;
    exchange(&mut runtime, &driver).await;

    driver.add_idle_ticks(44);
    for _ in 0..44 {
        runtime.process_cycle().await.unwrap();
    }
    let countdown = runtime.app().panel(Role::A).countdown.unwrap();
    assert_eq!(countdown.remaining, Duration::from_secs(1));
    assert_eq!(countdown.to_string(), "00:01");

    driver.add_idle_ticks(1);
    runtime.process_cycle().await.unwrap();

    assert_eq!(env.elapsed(), Duration::from_secs(45));
    assert_eq!(runtime.app().panel(Role::A).phase, HandshakePhase::Empty);
    assert_eq!(runtime.app().panel(Role::B).phase, HandshakePhase::SecretDerived);
    let last = driver.notifications().pop().unwrap();
    assert_eq!(last, "User A key material expired and was wiped; run 'gen' to start over");

    submit(&mut runtime, &driver, "encrypt a too late").await;
    let notification = runtime.app().notification().unwrap();
    assert_eq!(notification.kind, NotificationKind::Error);
    assert_eq!(notification.error_kind, Some(ErrorKind::NoKeyEstablished));
}

#[tokio::test]
async fn warning_is_announced_once() {
    let (mut runtime, driver, _) = runtime(3);
    submit(&mut runtime, &driver, "expire b 5 min").await;
    submit(&mut runtime, &driver, "gen").await;
    let public_key = runtime.app().panel(Role::A).public_key.clone().unwrap();
    submit(&mut runtime, &driver, &format!("encap {public_key}")).await;

    driver.add_idle_ticks(90);
    for _ in 0..90 {
        runtime.process_cycle().await.unwrap();
    }

    let warnings: Vec<_> = driver
        .notifications()
        .into_iter()
        .filter(|message| message.starts_with("User B keys expire in"))
        .collect();
    assert_eq!(warnings, vec!["User B keys expire in 04:59"]);
}

#[tokio::test]
async fn bad_input_is_reported_and_session_survives() {
    let (mut runtime, driver, _) = runtime(4);

    submit(&mut runtime, &driver, "frobnicate").await;
    submit(&mut runtime, &driver, "encap").await;
    submit(&mut runtime, &driver, "decap QUJD").await;
    submit(&mut runtime, &driver, "help").await;
    submit(&mut runtime, &driver, "status").await;

    assert_eq!(driver.help_shown(), 1);
    assert_eq!(driver.status_shown(), 1);
    let errors = driver.notifications();
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(|message| message.starts_with("Error: ")));

    exchange(&mut runtime, &driver).await;
    assert_eq!(runtime.bridge().session().phase(Role::B), HandshakePhase::SecretDerived);
}

#[tokio::test]
async fn run_exits_on_quit_and_stops_driver() {
    let (runtime, driver, _) = runtime(5);
    driver.inject_line("gen");
    driver.inject_line("quit");
    driver.inject_line("gen");

    runtime.run().await.unwrap();

    assert!(driver.is_stopped());
    assert!(driver.has_pending());
}

#[tokio::test]
async fn run_exits_when_input_is_exhausted() {
    let (runtime, driver, env) = runtime(6);
    driver.inject_line("gen");
    driver.add_idle_ticks(3);

    runtime.run().await.unwrap();

    assert!(driver.is_stopped());
    assert_eq!(env.elapsed(), Duration::from_secs(3));
}
