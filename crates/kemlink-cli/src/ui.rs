//! Console rendering
//!
//! Functions that convert App state into output lines. All functions are
//! pure (no I/O), taking state and returning strings, so the console driver
//! only has to write them out.

use kemlink_app::{Notification, NotificationKind, RolePanel, input::USAGE, state::urgency_label};
use kemlink_core::HandshakePhase;

/// Display label of a handshake phase.
pub fn phase_label(phase: HandshakePhase) -> &'static str {
    match phase {
        HandshakePhase::Empty => "no keys",
        HandshakePhase::KeysGenerated => "keys generated",
        HandshakePhase::SecretDerived => "shared secret established",
    }
}

/// Notification headline with its kind tag, then the indented detail.
pub fn notification_lines(notification: &Notification) -> Vec<String> {
    let tag = match notification.kind {
        NotificationKind::Success => "ok",
        NotificationKind::Error => "error",
        NotificationKind::Info => "info",
    };

    let mut lines = vec![format!("[{tag}] {}", notification.message)];
    if let Some(detail) = &notification.detail {
        lines.push(format!("    {detail}"));
    }
    lines
}

/// Multi-line summary of one role.
pub fn panel_lines(panel: &RolePanel) -> Vec<String> {
    let mut lines = vec![format!("{}: {}", panel.role, phase_label(panel.phase))];

    if let Some(fingerprint) = &panel.material_fingerprint {
        let what = if panel.public_key.is_some() { "public key" } else { "ciphertext" };
        lines.push(format!("  {what}: {fingerprint}"));
    }
    if let Some(fingerprint) = &panel.secret_fingerprint {
        lines.push(format!("  shared secret: {fingerprint}"));
    }

    let countdown = match panel.countdown {
        Some(countdown) => {
            format!("expires in {countdown} ({})", urgency_label(countdown.urgency))
        },
        None if panel.has_material() => "no countdown".to_string(),
        None => "idle".to_string(),
    };
    lines.push(format!("  {countdown}, lifetime {}", panel.setting));
    lines
}

/// Command usage, one command per line.
pub fn help_lines() -> Vec<String> {
    let width = USAGE.iter().map(|(command, _)| command.len()).max().unwrap_or(0);
    USAGE.iter().map(|(command, about)| format!("  {command:<width$}  {about}")).collect()
}
