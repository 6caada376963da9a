//! Fuzz target for the session against its reference model
//!
//! # Strategy
//!
//! - Arbitrary operation sequences: handshake steps with stale, garbage and
//!   blank inputs, messaging with tampering, lifetime changes, stop, clear
//!   and time jumps, with or without a trailing tick
//! - The same sequence runs on the real session and on the model
//!
//! # Invariants
//!
//! - Every operation has the same outcome on both
//! - Phases, countdowns and settings agree after every operation
//! - The standard invariants hold on the real session throughout

#![no_main]

use kemlink_core::ExpirationPolicy;
use kemlink_harness::{InvariantRegistry, ModelSession, Operation, Scenario};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u64, Vec<Operation>)| {
    let (seed, ops) = input;
    let mut model = ModelSession::new(ExpirationPolicy::default());
    let mut real = Scenario::new(seed);
    let invariants = InvariantRegistry::standard();

    for (i, op) in ops.iter().take(64).enumerate() {
        let expected = model.apply(op);
        let actual = real.apply(op);
        assert_eq!(expected, actual, "divergence at operation {i}: {op:?}");
        assert_eq!(model.observable(), real.observable(), "state after operation {i}: {op:?}");

        invariants.assert_all(&real.snapshot(), &format!("after operation {i}: {op:?}"));
    }
});
