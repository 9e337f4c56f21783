//! Mood Gardens GraphQL Client
//!
//! HTTP client for the Mood Gardens GraphQL endpoint. Session cookies set by
//! the API are kept in an in-memory jar and replayed on every request, the
//! same way a credentialed browser request would carry them.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::documents;
use super::error::{GraphQlError, GraphQlResult};
use super::types::{DiaryEntry, Garden, User, UserSettings};
use crate::auth::AccountApi;
use crate::config::ApiConfig;
use crate::entries::JournalApi;
use crate::garden::GardenSource;
use crate::period::Period;

/// GraphQL error code the API uses for a missing or expired session
const UNAUTHENTICATED_CODE: &str = "UNAUTHENTICATED";

/// Mood Gardens API client
#[derive(Clone)]
pub struct GraphQlClient {
    http: Client,
    config: ApiConfig,
    cookies: Arc<RwLock<BTreeMap<String, String>>>,
}

impl GraphQlClient {
    /// Create a new client with the given configuration
    pub fn new(config: ApiConfig) -> GraphQlResult<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(GraphQlError::Request)?;

        tracing::debug!(url = %config.graphql_url(), "GraphQL client ready");

        Ok(Self {
            http,
            config,
            cookies: Arc::new(RwLock::new(BTreeMap::new())),
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Snapshot of the session cookies
    pub async fn cookies(&self) -> BTreeMap<String, String> {
        self.cookies.read().await.clone()
    }

    /// Replace the session cookies (e.g. restored from disk)
    pub async fn set_cookies(&self, cookies: BTreeMap<String, String>) {
        *self.cookies.write().await = cookies;
    }

    /// Execute a read-only query, retrying transient failures
    pub async fn query<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        document: &str,
        variables: Value,
    ) -> GraphQlResult<T> {
        let body = GraphQlRequest {
            query: document,
            variables,
        };

        let attempts = self.config.max_retries.max(1);
        let mut last_error = GraphQlError::Unavailable;

        for attempt in 0..attempts {
            if attempt > 0 {
                // Quadratic backoff: 1s, 4s, 9s...
                let delay = std::time::Duration::from_secs((attempt as u64).pow(2));
                tokio::time::sleep(delay).await;
            }

            match self.send(operation, &body).await {
                Ok(data) => return Ok(data),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(operation, attempt, error = %e, "GraphQL query failed, retrying");
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }

    /// Execute a mutation; never retried
    pub async fn mutate<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        document: &str,
        variables: Value,
    ) -> GraphQlResult<T> {
        let body = GraphQlRequest {
            query: document,
            variables,
        };
        self.send(operation, &body).await
    }

    /// Send one request and decode the `data` field
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        body: &GraphQlRequest<'_>,
    ) -> GraphQlResult<T> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let mut request = self
            .http
            .post(self.config.graphql_url())
            .header("x-request-id", &request_id)
            .json(body);

        if let Some(cookie_header) = self.cookie_header().await {
            request = request.header(header::COOKIE, cookie_header);
        }

        let response = request.send().await.map_err(GraphQlError::from_transport)?;
        let status = response.status();

        self.capture_cookies(response.headers()).await;

        tracing::debug!(operation, request_id = %request_id, status = status.as_u16(), "GraphQL response");

        if status == StatusCode::UNAUTHORIZED {
            return Err(GraphQlError::Unauthenticated);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GraphQlError::RateLimited);
        }

        let text = response.text().await.map_err(GraphQlError::from_transport)?;
        let parsed: Result<GraphQlResponse<T>, _> = serde_json::from_str(&text);

        let envelope = match parsed {
            Ok(envelope) => envelope,
            Err(e) => {
                if status.is_success() {
                    return Err(GraphQlError::Decode(e));
                }
                return Err(GraphQlError::Http {
                    status: status.as_u16(),
                    message: status.canonical_reason().unwrap_or("GraphQL error").to_string(),
                });
            }
        };

        if let Some(first) = envelope.errors.first() {
            if envelope.errors.iter().any(|e| e.code() == Some(UNAUTHENTICATED_CODE)) {
                return Err(GraphQlError::Unauthenticated);
            }
            if !status.is_success() {
                return Err(GraphQlError::Http {
                    status: status.as_u16(),
                    message: first.message.clone(),
                });
            }
            return Err(GraphQlError::GraphQl {
                message: first.message.clone(),
                code: first.code().map(str::to_string),
            });
        }

        if !status.is_success() {
            return Err(GraphQlError::Http {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("GraphQL error").to_string(),
            });
        }

        envelope.data.ok_or(GraphQlError::MissingData(operation))
    }

    async fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookies.read().await;
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|(name, value)| cookie::Cookie::new(name.as_str(), value.as_str()).to_string())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Store `Set-Cookie` headers; expired or emptied cookies are dropped
    async fn capture_cookies(&self, headers: &header::HeaderMap) {
        let mut cookies = self.cookies.write().await;

        for value in headers.get_all(header::SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let parsed = match cookie::Cookie::parse(raw.to_string()) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring malformed Set-Cookie header");
                    continue;
                }
            };

            let expired = parsed
                .max_age()
                .map(|age| age <= cookie::time::Duration::ZERO)
                .unwrap_or(false);

            if expired || parsed.value().is_empty() {
                cookies.remove(parsed.name());
            } else {
                cookies.insert(parsed.name().to_string(), parsed.value().to_string());
            }
        }
    }
}

// ============================================
// Request/Response envelopes
// ============================================

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
    #[serde(default)]
    extensions: Option<Value>,
}

impl GraphQlErrorEntry {
    fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.get("code")?.as_str()
    }
}

#[derive(Deserialize)]
struct MeData {
    me: Option<User>,
}

#[derive(Deserialize)]
struct LogoutData {
    logout: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDisplayNameData {
    update_display_name: User,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserSettingsData {
    update_user_settings: UserSettings,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDiaryEntryData {
    create_diary_entry: DiaryEntry,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiaryEntryData {
    diary_entry: Option<DiaryEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaginatedDiaryEntriesData {
    #[serde(default)]
    paginated_diary_entries: Vec<DiaryEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestGenerateGardenData {
    request_generate_garden: Option<Garden>,
}

#[derive(Deserialize)]
struct GardenData {
    garden: Option<Garden>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GardensByMonthData {
    #[serde(default)]
    gardens_by_month: Vec<Garden>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentDiaryDayKeyData {
    current_diary_day_key: String,
}

// ============================================
// Service traits
// ============================================

#[async_trait]
impl GardenSource for GraphQlClient {
    async fn garden(&self, period: Period, period_key: &str) -> GraphQlResult<Option<Garden>> {
        // Single attempt: the watcher's poll loop is the retry strategy
        let body = GraphQlRequest {
            query: documents::GARDEN,
            variables: json!({ "period": period, "periodKey": period_key }),
        };
        let data: GardenData = self.send("garden", &body).await?;
        Ok(data.garden)
    }
}

#[async_trait]
impl AccountApi for GraphQlClient {
    async fn me(&self) -> GraphQlResult<Option<User>> {
        let data: MeData = self.query("me", documents::ME, json!({})).await?;
        Ok(data.me)
    }

    async fn login(&self, email: &str, password: &str) -> GraphQlResult<()> {
        let _: Value = self
            .mutate(
                "login",
                documents::LOGIN,
                json!({ "email": email, "password": password }),
            )
            .await?;
        Ok(())
    }

    async fn register(&self, email: &str, password: &str, display_name: &str) -> GraphQlResult<()> {
        let _: Value = self
            .mutate(
                "register",
                documents::REGISTER,
                json!({ "email": email, "password": password, "displayName": display_name }),
            )
            .await?;
        Ok(())
    }

    async fn logout(&self) -> GraphQlResult<bool> {
        let data: LogoutData = self.mutate("logout", documents::LOGOUT, json!({})).await?;
        Ok(data.logout)
    }

    async fn update_display_name(&self, display_name: &str) -> GraphQlResult<User> {
        let data: UpdateDisplayNameData = self
            .mutate(
                "updateDisplayName",
                documents::UPDATE_DISPLAY_NAME,
                json!({ "displayName": display_name }),
            )
            .await?;
        Ok(data.update_display_name)
    }

    async fn update_user_settings(
        &self,
        timezone: &str,
        day_rollover_hour: u8,
    ) -> GraphQlResult<UserSettings> {
        let data: UpdateUserSettingsData = self
            .mutate(
                "updateUserSettings",
                documents::UPDATE_USER_SETTINGS,
                json!({ "timezone": timezone, "dayRolloverHour": day_rollover_hour }),
            )
            .await?;
        Ok(data.update_user_settings)
    }
}

#[async_trait]
impl JournalApi for GraphQlClient {
    async fn create_diary_entry(&self, text: &str) -> GraphQlResult<DiaryEntry> {
        let data: CreateDiaryEntryData = self
            .mutate(
                "createDiaryEntry",
                documents::CREATE_DIARY_ENTRY,
                json!({ "text": text }),
            )
            .await?;
        Ok(data.create_diary_entry)
    }

    async fn diary_entry(&self, day_key: &str) -> GraphQlResult<Option<DiaryEntry>> {
        let data: DiaryEntryData = self
            .query("diaryEntry", documents::DIARY_ENTRY, json!({ "dayKey": day_key }))
            .await?;
        Ok(data.diary_entry)
    }

    async fn paginated_diary_entries(
        &self,
        limit: u32,
        offset: u32,
    ) -> GraphQlResult<Vec<DiaryEntry>> {
        let data: PaginatedDiaryEntriesData = self
            .query(
                "paginatedDiaryEntries",
                documents::PAGINATED_DIARY_ENTRIES,
                json!({ "limit": limit, "offset": offset }),
            )
            .await?;
        Ok(data.paginated_diary_entries)
    }

    async fn current_diary_day_key(&self) -> GraphQlResult<String> {
        let data: CurrentDiaryDayKeyData = self
            .query("currentDiaryDayKey", documents::CURRENT_DIARY_DAY_KEY, json!({}))
            .await?;
        Ok(data.current_diary_day_key)
    }

    async fn request_generate_garden(
        &self,
        period: Period,
        period_key: Option<&str>,
    ) -> GraphQlResult<Option<Garden>> {
        let data: RequestGenerateGardenData = self
            .mutate(
                "requestGenerateGarden",
                documents::REQUEST_GENERATE_GARDEN,
                json!({ "period": period, "periodKey": period_key }),
            )
            .await?;
        Ok(data.request_generate_garden)
    }

    async fn gardens_by_month(&self, month_key: &str) -> GraphQlResult<Vec<Garden>> {
        let data: GardensByMonthData = self
            .query(
                "gardensByMonth",
                documents::GARDENS_BY_MONTH,
                json!({ "monthKey": month_key }),
            )
            .await?;
        Ok(data.gardens_by_month)
    }
}
