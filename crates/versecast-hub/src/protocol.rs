use serde::{Deserialize, Serialize};
use versecast_state::{ProjectionState, StatePatch};

/// Default TCP port of the projection hub.
pub const DEFAULT_HUB_PORT: u16 = 7411;

/// Requests sent by clients to the hub.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum HubRequest {
    /// Partial update of a record. The hub merges it into the stored
    /// record and broadcasts the result; patches older than the record
    /// are dropped.
    #[serde(rename = "update")]
    Update { record: String, patch: StatePatch },

    /// Ask for the current record, sent back to this connection only.
    /// Mostly redundant with the catch-up on connect, kept for explicit
    /// re-syncs.
    #[serde(rename = "get")]
    Get { record: String },
}

/// Events pushed by the hub to subscribers.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum HubEvent {
    /// The full record after a committed update (or as catch-up).
    #[serde(rename = "state")]
    State {
        record: String,
        state: ProjectionState,
    },
}

impl HubRequest {
    /// Convert to a JSON line for the wire.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

impl HubEvent {
    /// Convert to a JSON line for the wire.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use versecast_state::PROJECTION_RECORD_ID;

    #[test]
    fn test_update_serialization() {
        let request = HubRequest::Update {
            record: PROJECTION_RECORD_ID.to_string(),
            patch: StatePatch::verse(3).stamped(Utc.timestamp_millis_opt(100).unwrap()),
        };
        let json = request.to_json_line().unwrap();
        assert!(json.contains("\"type\":\"update\""));
        assert!(json.contains("\"verseIndex\":3"));
        assert!(json.ends_with('\n'));
    }

    #[test]
    fn test_state_event_serialization() {
        let event = HubEvent::State {
            record: PROJECTION_RECORD_ID.to_string(),
            state: ProjectionState::idle(),
        };
        let json = event.to_json_line().unwrap();
        assert!(json.contains("\"type\":\"state\""));
        assert!(json.contains(PROJECTION_RECORD_ID));

        let parsed: HubEvent = serde_json::from_str(json.trim()).unwrap();
        let HubEvent::State { state, .. } = parsed;
        assert!(state.is_idle());
    }
}
