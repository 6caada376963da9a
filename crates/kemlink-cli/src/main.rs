//! KEM link console entry point.
//!
//! # Usage
//!
//! ```bash
//! # Default lifetimes (15 minutes for both roles)
//! kemlink
//!
//! # Short-lived keys for User A, debug logging on stderr
//! kemlink --expire-a 45 --unit-a seconds --log-level debug
//! ```

use clap::Parser;
use kemlink_app::{Runtime, SystemEnv};
use kemlink_cli::ConsoleDriver;
use kemlink_core::{DurationUnit, ExpirationPolicy, ExpirationSetting, Role};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Two-party ML-KEM key exchange with expiring keys
#[derive(Parser, Debug)]
#[command(name = "kemlink")]
#[command(about = "Interactive ML-KEM key exchange between User A and User B")]
#[command(version)]
struct Args {
    /// Lifetime of User A's key material
    #[arg(long, default_value = "15", allow_negative_numbers = true)]
    expire_a: i64,

    /// Unit of User A's lifetime (seconds, minutes, hours)
    #[arg(long, default_value = "minutes", value_parser = parse_unit)]
    unit_a: DurationUnit,

    /// Lifetime of User B's key material
    #[arg(long, default_value = "15", allow_negative_numbers = true)]
    expire_b: i64,

    /// Unit of User B's lifetime (seconds, minutes, hours)
    #[arg(long, default_value = "minutes", value_parser = parse_unit)]
    unit_b: DurationUnit,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn parse_unit(input: &str) -> Result<DurationUnit, String> {
    DurationUnit::parse(input).ok_or_else(|| format!("unknown unit '{input}'"))
}

fn setting(role: Role, value: i64, unit: DurationUnit) -> ExpirationSetting {
    let setting = ExpirationSetting::new(value, unit);
    if i64::try_from(setting.value()).ok() != Some(value) {
        tracing::warn!(%role, requested = value, effective = %setting, "lifetime clamped");
    }
    setting
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // stdout belongs to the console
    let logs = fmt::layer().with_writer(std::io::stderr);
    tracing_subscriber::registry().with(logs).with(filter).init();

    let policy = ExpirationPolicy::new(
        setting(Role::A, args.expire_a, args.unit_a),
        setting(Role::B, args.expire_b, args.unit_b),
    );
    tracing::info!(a = %policy.get(Role::A), b = %policy.get(Role::B), "kemlink starting");

    let runtime = Runtime::new(ConsoleDriver::stdio(), SystemEnv::new(), policy);
    Ok(runtime.run().await?)
}
