use std::fmt::Write;

use chrono::Utc;
use rand::RngCore;
use serde::Serialize;

use shared_models::ConsultationType;

const BASE36_DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(BASE36_DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

/// Shareable session id: `HS-<base36 millis>-<16 hex chars>`. The random
/// tail makes the id unguessable; the timestamp keeps it roughly sortable.
pub fn generate_session_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut tail = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut tail);
    format!("HS-{}-{}", base36(millis), hex_string(&tail))
}

/// Per-request media access token, 32 random bytes as hex. Never stored;
/// a new one is minted on every issuance.
pub fn media_access_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_string(&bytes)
}

/// What the media channel may carry for a given consultation type. Stands
/// in for a real conferencing provider's room configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MediaCapabilities {
    pub provider: &'static str,
    pub audio_enabled: bool,
    pub video_enabled: bool,
    pub chat_enabled: bool,
}

impl MediaCapabilities {
    pub fn for_type(kind: ConsultationType) -> Self {
        Self {
            provider: "simulated",
            audio_enabled: matches!(kind, ConsultationType::Audio | ConsultationType::Video),
            video_enabled: matches!(kind, ConsultationType::Video),
            chat_enabled: true,
        }
    }
}
