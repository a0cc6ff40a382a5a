use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Start or end of a calendar item
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    /// RFC 3339 timestamp, set for timed events
    pub date_time: Option<String>,
    /// `yyyy-mm-dd`, set for all-day events
    pub date: Option<String>,
    pub time_zone: Option<String>,
}

/// Event item as returned by the events.list endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarItem {
    #[serde(default)]
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub updated: Option<String>,
    pub start: Option<EventDateTime>,
    pub end: Option<EventDateTime>,
}

impl CalendarItem {
    /// Timed start of the item, if any
    pub fn start_date_time(&self) -> Option<&str> {
        self.start.as_ref().and_then(|s| s.date_time.as_deref())
    }

    /// Timed end of the item, if any
    pub fn end_date_time(&self) -> Option<&str> {
        self.end.as_ref().and_then(|e| e.date_time.as_deref())
    }
}

/// One page of the events.list response
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventsPage {
    #[serde(default)]
    pub items: Vec<CalendarItem>,
    pub next_page_token: Option<String>,
}

/// Ordering requested from the listing endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderBy {
    /// Ascending last modification time
    #[default]
    #[serde(rename = "updated")]
    Updated,
    /// Ascending start time, only valid with single events
    #[serde(rename = "startTime")]
    StartTime,
}

impl OrderBy {
    /// Value of the `orderBy` query parameter
    pub fn as_query_value(&self) -> &'static str {
        match self {
            OrderBy::Updated => "updated",
            OrderBy::StartTime => "startTime",
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}

impl FromStr for OrderBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "updated" => Ok(OrderBy::Updated),
            "startTime" | "start_time" => Ok(OrderBy::StartTime),
            other => Err(format!("unknown order: {}", other)),
        }
    }
}
