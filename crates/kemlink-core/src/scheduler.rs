//! Per-role expiration timers.
//!
//! The scheduler owns no clock and no background task. A driver feeds it
//! `now` on every cycle and it answers with at most one [`Tick`] per role per
//! period. Deadline checks are exact: a role whose deadline has passed is
//! wiped on the very next poll, whether or not a period boundary was hit.
//!
//! ```text
//! arm(role, d) ──► Armed{deadline = now + d}
//!                      │ poll(now < deadline, tick due) ─► Remaining{..}
//!                      │ poll(now >= deadline)          ─► Expired + clear(role)
//!                      │ disarm(role)                   ─► timer gone, material kept
//! ```

use std::time::Duration;

use tracing::{debug, info};

use crate::{
    Role, SessionRegistry,
    env::Timestamp,
    registry::ArmedTimer,
};

/// Period between remaining-time observations.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Below this much remaining time urgency is at least [`Urgency::Warning`].
pub const WARNING_THRESHOLD: Duration = Duration::from_secs(5 * 60);

/// Below this much remaining time urgency is [`Urgency::Critical`].
pub const CRITICAL_THRESHOLD: Duration = Duration::from_secs(60);

/// Graduated display urgency of a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Urgency {
    /// At least 5 minutes remain.
    Normal,
    /// Between 1 and 5 minutes remain.
    Warning,
    /// Less than 1 minute remains.
    Critical,
}

impl Urgency {
    /// Classify a remaining lifetime.
    pub fn from_remaining(remaining: Duration) -> Self {
        if remaining < CRITICAL_THRESHOLD {
            Self::Critical
        } else if remaining < WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

/// Outcome of evaluating a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Deadline still ahead.
    Remaining {
        /// Time left before the deadline.
        remaining: Duration,
        /// Display urgency for `remaining`.
        urgency: Urgency,
    },
    /// Deadline reached; the role's material has been wiped.
    Expired,
}

/// Pure deadline evaluation.
///
/// `remaining <= 0` is expiry, so `now == deadline` expires.
pub fn tick<I: Timestamp>(deadline: I, now: I) -> Tick {
    if now >= deadline {
        return Tick::Expired;
    }
    let remaining = deadline - now;
    Tick::Remaining { remaining, urgency: Urgency::from_remaining(remaining) }
}

/// Arms, disarms and polls per-role countdowns stored in a
/// [`SessionRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct ExpirationScheduler {
    period: Duration,
}

impl Default for ExpirationScheduler {
    fn default() -> Self {
        Self { period: TICK_PERIOD }
    }
}

impl ExpirationScheduler {
    /// Scheduler with the standard 1-second period.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler with a custom observation period.
    pub fn with_period(period: Duration) -> Self {
        Self { period }
    }

    /// Observation period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start a countdown for `role`, cancelling any existing one.
    ///
    /// The first observation is due one period after `now`.
    pub fn arm<I: Timestamp>(
        &self,
        registry: &mut SessionRegistry<I>,
        role: Role,
        lifetime: Duration,
        now: I,
    ) -> ArmedTimer<I> {
        let replaced = registry.timer(role).map(|t| t.handle);
        let timer = registry.install_timer(role, now + lifetime, now + self.period);

        debug!(
            %role,
            handle = timer.handle.value(),
            ?replaced,
            lifetime_secs = lifetime.as_secs(),
            "expiration timer armed"
        );
        timer
    }

    /// Cancel `role`'s countdown without wiping its material.
    ///
    /// Returns the cancelled timer, or `None` if nothing was armed.
    pub fn disarm<I: Timestamp>(
        &self,
        registry: &mut SessionRegistry<I>,
        role: Role,
    ) -> Option<ArmedTimer<I>> {
        let timer = registry.remove_timer(role)?;
        debug!(%role, handle = timer.handle.value(), "expiration timer disarmed");
        Some(timer)
    }

    /// Evaluate `role`'s countdown at `now`.
    ///
    /// - Deadline reached: wipes the role and returns [`Tick::Expired`],
    ///   regardless of the period
    /// - Observation due: returns [`Tick::Remaining`] and schedules the next
    /// - Otherwise, or if nothing is armed: `None`
    pub fn poll<I: Timestamp>(
        &self,
        registry: &mut SessionRegistry<I>,
        role: Role,
        now: I,
    ) -> Option<Tick> {
        let timer = registry.timer_mut(role)?;

        match tick(timer.deadline, now) {
            Tick::Expired => {
                let handle = timer.handle;
                registry.clear(role);
                info!(%role, handle = handle.value(), "key material expired and wiped");
                Some(Tick::Expired)
            },
            remaining if now >= timer.next_tick => {
                let next = timer.next_tick + self.period;
                // A late driver skips missed observations rather than replaying them
                timer.next_tick = if next > now { next } else { now + self.period };
                Some(remaining)
            },
            Tick::Remaining { .. } => None,
        }
    }

    /// Poll both roles in index order.
    pub fn poll_all<I: Timestamp>(
        &self,
        registry: &mut SessionRegistry<I>,
        now: I,
    ) -> Vec<(Role, Tick)> {
        Role::ALL
            .into_iter()
            .filter_map(|role| self.poll(registry, role, now).map(|tick| (role, tick)))
            .collect()
    }

    /// Current remaining time for `role` without consuming an observation.
    pub fn remaining<I: Timestamp>(
        &self,
        registry: &SessionRegistry<I>,
        role: Role,
        now: I,
    ) -> Option<Duration> {
        let deadline = registry.expiration_deadline(role)?;
        match tick(deadline, now) {
            Tick::Remaining { remaining, .. } => Some(remaining),
            Tick::Expired => Some(Duration::ZERO),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use kemlink_crypto::SymmetricKey;

    use super::*;

    const MIN: Duration = Duration::from_secs(60);

    #[allow(clippy::disallowed_methods)]
    fn origin() -> Instant {
        Instant::now()
    }

    fn keyed_registry() -> SessionRegistry<Instant> {
        let mut registry = SessionRegistry::new();
        for role in Role::ALL {
            registry.set_symmetric_key(role, SymmetricKey::from_bytes([7; 32]));
        }
        registry
    }

    #[test]
    fn urgency_thresholds() {
        assert_eq!(Urgency::from_remaining(10 * MIN), Urgency::Normal);
        assert_eq!(Urgency::from_remaining(5 * MIN), Urgency::Normal);
        assert_eq!(Urgency::from_remaining(5 * MIN - Duration::from_secs(1)), Urgency::Warning);
        assert_eq!(Urgency::from_remaining(MIN), Urgency::Warning);
        assert_eq!(Urgency::from_remaining(Duration::from_secs(59)), Urgency::Critical);
    }

    #[test]
    fn pure_tick_expires_at_the_deadline() {
        let t0 = origin();
        assert_eq!(tick(t0, t0), Tick::Expired);
        assert_eq!(tick(t0, t0 + MIN), Tick::Expired);
        assert_eq!(
            tick(t0 + MIN, t0),
            Tick::Remaining { remaining: MIN, urgency: Urgency::Warning }
        );
    }

    #[test]
    fn arm_sets_deadline_and_first_tick() {
        let t0 = origin();
        let mut registry = keyed_registry();
        let scheduler = ExpirationScheduler::new();

        let timer = scheduler.arm(&mut registry, Role::A, 2 * MIN, t0);

        assert_eq!(timer.deadline, t0 + 2 * MIN);
        assert_eq!(timer.next_tick, t0 + TICK_PERIOD);
        assert_eq!(registry.expiration_deadline(Role::A), Some(t0 + 2 * MIN));
        assert_eq!(registry.expiration_deadline(Role::B), None);
    }

    #[test]
    fn rearming_replaces_rather_than_stacks() {
        let t0 = origin();
        let mut registry = keyed_registry();
        let scheduler = ExpirationScheduler::new();

        let first = scheduler.arm(&mut registry, Role::A, MIN, t0);
        let second = scheduler.arm(&mut registry, Role::A, 3 * MIN, t0 + Duration::from_secs(5));

        assert_ne!(first.handle, second.handle);
        assert_eq!(registry.timer(Role::A), Some(&second));

        // The replaced deadline no longer fires
        let ticks = scheduler.poll(&mut registry, Role::A, t0 + MIN + Duration::from_secs(1));
        assert!(matches!(ticks, Some(Tick::Remaining { .. })));
        assert!(registry.symmetric_key(Role::A).is_some());
    }

    #[test]
    fn poll_emits_once_per_period() {
        let t0 = origin();
        let mut registry = keyed_registry();
        let scheduler = ExpirationScheduler::new();
        scheduler.arm(&mut registry, Role::B, 10 * MIN, t0);

        assert_eq!(scheduler.poll(&mut registry, Role::B, t0), None);
        assert!(scheduler.poll(&mut registry, Role::B, t0 + TICK_PERIOD).is_some());
        assert_eq!(
            scheduler.poll(&mut registry, Role::B, t0 + TICK_PERIOD + Duration::from_millis(500)),
            None
        );
        assert!(scheduler.poll(&mut registry, Role::B, t0 + 2 * TICK_PERIOD).is_some());
    }

    #[test]
    fn late_poll_skips_missed_observations() {
        let t0 = origin();
        let mut registry = keyed_registry();
        let scheduler = ExpirationScheduler::new();
        scheduler.arm(&mut registry, Role::A, 10 * MIN, t0);

        let late = t0 + Duration::from_secs(30);
        assert!(scheduler.poll(&mut registry, Role::A, late).is_some());
        assert_eq!(registry.timer(Role::A).map(|t| t.next_tick), Some(late + TICK_PERIOD));
        assert_eq!(scheduler.poll(&mut registry, Role::A, late), None);
    }

    #[test]
    fn expiry_wipes_only_the_owning_role() {
        let t0 = origin();
        let mut registry = keyed_registry();
        let scheduler = ExpirationScheduler::new();
        scheduler.arm(&mut registry, Role::A, MIN, t0);
        scheduler.arm(&mut registry, Role::B, 10 * MIN, t0);

        let ticks = scheduler.poll_all(&mut registry, t0 + MIN);

        assert!(ticks.contains(&(Role::A, Tick::Expired)));
        assert!(registry.state(Role::A).is_empty());
        assert!(registry.symmetric_key(Role::B).is_some());
        assert_eq!(registry.expiration_deadline(Role::B), Some(t0 + 10 * MIN));
    }

    #[test]
    fn expiry_fires_between_period_boundaries() {
        let t0 = origin();
        let mut registry = keyed_registry();
        let scheduler = ExpirationScheduler::with_period(Duration::from_secs(10));
        scheduler.arm(&mut registry, Role::A, Duration::from_secs(3), t0);

        let result = scheduler.poll(&mut registry, Role::A, t0 + Duration::from_secs(3));

        assert_eq!(result, Some(Tick::Expired));
        assert!(registry.symmetric_key(Role::A).is_none());
    }

    #[test]
    fn expiry_is_terminal_for_the_cycle() {
        let t0 = origin();
        let mut registry = keyed_registry();
        let scheduler = ExpirationScheduler::new();
        scheduler.arm(&mut registry, Role::A, MIN, t0);

        assert_eq!(scheduler.poll(&mut registry, Role::A, t0 + MIN), Some(Tick::Expired));
        assert_eq!(scheduler.poll(&mut registry, Role::A, t0 + 2 * MIN), None);
    }

    #[test]
    fn disarm_keeps_material() {
        let t0 = origin();
        let mut registry = keyed_registry();
        let scheduler = ExpirationScheduler::new();
        scheduler.arm(&mut registry, Role::A, MIN, t0);

        assert!(scheduler.disarm(&mut registry, Role::A).is_some());
        assert!(scheduler.disarm(&mut registry, Role::A).is_none());

        assert!(registry.expiration_deadline(Role::A).is_none());
        assert!(registry.symmetric_key(Role::A).is_some());
        assert_eq!(scheduler.poll(&mut registry, Role::A, t0 + 2 * MIN), None);
        assert!(registry.symmetric_key(Role::A).is_some());
    }

    #[test]
    fn remaining_does_not_consume_observation() {
        let t0 = origin();
        let mut registry = keyed_registry();
        let scheduler = ExpirationScheduler::new();
        scheduler.arm(&mut registry, Role::B, MIN, t0);

        let at = t0 + Duration::from_secs(20);
        assert_eq!(scheduler.remaining(&registry, Role::B, at), Some(Duration::from_secs(40)));
        assert!(scheduler.poll(&mut registry, Role::B, at).is_some());
    }
}
