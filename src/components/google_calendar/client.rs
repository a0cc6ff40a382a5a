use super::models::{CalendarItem, EventsPage, OrderBy};
use super::time::updated_min;
use crate::error::{config_error, remote_fetch_error, SyncResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

/// Filters for one events.list request
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub calendar_id: String,
    /// RFC 3339 lower bound on the last modification time
    pub updated_min: String,
    pub order_by: OrderBy,
    pub max_results: u32,
}

impl ListQuery {
    /// Query for items updated within `lookback` before `now`
    pub fn recently_updated(
        calendar_id: &str,
        now: DateTime<Utc>,
        lookback: Duration,
        timezone: &Tz,
        order_by: OrderBy,
        max_results: u32,
    ) -> SyncResult<Self> {
        let updated_min = updated_min(now, lookback, timezone).ok_or_else(|| {
            config_error(&format!(
                "Lookback of {} hours reaches outside the supported date range",
                lookback.num_hours()
            ))
        })?;

        Ok(Self {
            calendar_id: calendar_id.to_string(),
            updated_min,
            order_by,
            max_results,
        })
    }
}

/// Source of calendar items
#[async_trait]
pub trait CalendarReader: Send + Sync {
    /// Fetch a single page of items matching `query`, at most `query.max_results` long
    async fn list_recently_updated_events(&self, query: &ListQuery) -> SyncResult<Vec<CalendarItem>>;
}

/// Google Calendar v3 client authenticated with an API key
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl GoogleCalendarClient {
    /// Create a client for the API rooted at `base_url`
    pub fn new(base_url: &str, api_key: &str) -> SyncResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| remote_fetch_error(&format!("Failed to parse API base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(remote_fetch_error(&format!(
                "API base URL cannot be a base: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| remote_fetch_error(&format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// Build the events.list URL for `query`
    pub fn events_url(&self, query: &ListQuery) -> SyncResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| remote_fetch_error("API base URL cannot be a base"))?
            .pop_if_empty()
            .extend(["calendars", query.calendar_id.as_str(), "events"]);

        url.query_pairs_mut()
            .append_pair("updatedMin", &query.updated_min)
            .append_pair("orderBy", query.order_by.as_query_value())
            .append_pair("singleEvents", "true")
            .append_pair("maxResults", &query.max_results.to_string())
            .append_pair("key", &self.api_key);

        Ok(url)
    }
}

#[async_trait]
impl CalendarReader for GoogleCalendarClient {
    async fn list_recently_updated_events(&self, query: &ListQuery) -> SyncResult<Vec<CalendarItem>> {
        let url = self.events_url(query)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| remote_fetch_error(&format!("Failed to list events: {}", e.without_url())))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(remote_fetch_error(&format!(
                "Failed to list events: HTTP {} - {}",
                status, error_body
            )));
        }

        let page: EventsPage = response
            .json()
            .await
            .map_err(|e| remote_fetch_error(&format!("Failed to parse events response: {}", e)))?;

        if page.next_page_token.is_some() {
            debug!("More events are available; only the first page is mirrored");
        }

        let items = truncate_items(page.items, query.max_results);
        for item in &items {
            log_item(item);
        }

        Ok(items)
    }
}

/// Cap the item list at `max_results`
pub fn truncate_items(mut items: Vec<CalendarItem>, max_results: u32) -> Vec<CalendarItem> {
    items.truncate(usize::try_from(max_results).unwrap_or(usize::MAX));
    items
}

fn log_item(item: &CalendarItem) {
    info!(
        event_id = %item.id,
        summary = item.summary.as_deref().unwrap_or_default(),
        description = item.description.as_deref().unwrap_or_default(),
        start_date_time = item.start_date_time().unwrap_or_default(),
        end_date_time = item.end_date_time().unwrap_or_default(),
        "event"
    );
}
