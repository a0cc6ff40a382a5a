use crate::components::google_calendar::CalendarItem;
use crate::error::SyncResult;
use serde::{Deserialize, Serialize};

/// Stored form of a calendar event. Empty fields are left out of the document.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct EventRecord {
    /// Event id, used as the storage key rather than stored in the body
    #[serde(skip)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub start_date_time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub end_date_time: String,
}

impl EventRecord {
    /// JSON document body for this record
    pub fn to_document(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<&CalendarItem> for EventRecord {
    fn from(item: &CalendarItem) -> Self {
        Self {
            id: item.id.clone(),
            summary: item.summary.clone().unwrap_or_default(),
            description: item.description.clone().unwrap_or_default(),
            start_date_time: item.start_date_time().unwrap_or_default().to_string(),
            end_date_time: item.end_date_time().unwrap_or_default().to_string(),
        }
    }
}
