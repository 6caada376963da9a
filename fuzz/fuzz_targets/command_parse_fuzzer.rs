//! Fuzz target for console command parsing
//!
//! # Invariants
//!
//! - Parsing arbitrary text never panics
//! - Blank lines are always `Empty`, never a command
//! - Surrounding whitespace never changes the outcome

#![no_main]

use kemlink_app::{Command, InputError};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|line: &str| {
    let result = Command::parse(line);

    if line.trim().is_empty() {
        assert!(matches!(result, Err(InputError::Empty)));
    }

    let padded = format!("  {line}\t");
    assert_eq!(Command::parse(&padded), result);
});
