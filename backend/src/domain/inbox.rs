//! Per-user inbox read models.

use serde::Serialize;

use super::{Event, EventCity, MessageState};

/// An event as it appears in one user's inbox.
#[derive(Debug, Clone, PartialEq)]
pub struct UserEvent {
    /// The event.
    pub event: Event,
    /// Folded city, if any.
    pub city: Option<EventCity>,
    /// Image after fallback resolution.
    pub image_url: Option<String>,
    /// The user's attendance answer; `None` when never answered.
    pub going: Option<bool>,
    /// The user's read state.
    pub message_state: MessageState,
}

/// A board whose firmware lags behind the newest release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardFirmwareNotice {
    /// Board serial number.
    pub serial_number: String,
    /// Firmware currently reported by the board.
    pub current_version: Option<String>,
    /// Newest published firmware.
    pub latest_version: String,
}

/// Everything shown on the inbox screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbox {
    /// Visible events, newest publication first.
    pub events: Vec<UserEvent>,
    /// Boards with a pending firmware update.
    pub boards: Vec<BoardFirmwareNotice>,
}
