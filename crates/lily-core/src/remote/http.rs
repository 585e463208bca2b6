//! `reqwest` implementation of the remote API.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::wire::{
    convert_all, ApiErrorBody, ExpenseResponse, MeetingNoteResponse, SubmitDayRequest,
};
use super::{RemoteError, RemoteResult, RemoteService};
use crate::error::{Error, Result};
use crate::models::{
    DailyStatus, Expense, ExpenseFilter, ExpenseSummary, MeetingNote, NewExpense, NewMeetingNote,
    RecordId, SummaryPeriod,
};
use crate::session::SessionContext;
use crate::util::{compact_text, is_http_url, normalize_text_option};

/// HTTP client for the hosted expense API
#[derive(Clone)]
pub struct HttpRemoteService {
    base_url: String,
    client: reqwest::Client,
    session: Arc<SessionContext>,
}

impl HttpRemoteService {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: Arc<SessionContext>,
    ) -> Result<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| Error::Config(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            base_url,
            client,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/{path}", self.base_url))
            .header("Accept", "application/json");

        match self.session.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> RemoteResult<Response> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = parse_api_error(status, &body);
        if status.is_client_error() {
            Err(RemoteError::Rejected {
                status: status.as_u16(),
                message,
            })
        } else {
            Err(RemoteError::Unavailable(message))
        }
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> RemoteResult<T> {
        Self::send(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|error| RemoteError::Unavailable(format!("malformed response: {error}")))
    }
}

impl RemoteService for HttpRemoteService {
    async fn create_expense(&self, payload: &NewExpense) -> RemoteResult<Expense> {
        let response: ExpenseResponse =
            Self::send_json(self.request(Method::POST, "expenses").json(payload)).await?;
        response.try_into()
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> RemoteResult<Vec<Expense>> {
        let builder = self
            .request(Method::GET, "expenses")
            .query(&filter.query_pairs());
        let response: Vec<ExpenseResponse> = Self::send_json(builder).await?;
        convert_all(response)
    }

    async fn delete_expense(&self, id: &RecordId) -> RemoteResult<()> {
        let path = format!("expenses/{}", urlencoding::encode(id.as_str()));
        Self::send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn summary(
        &self,
        period: SummaryPeriod,
        date: Option<NaiveDate>,
    ) -> RemoteResult<ExpenseSummary> {
        let mut builder = self.request(Method::GET, &format!("analytics/{}", period.as_str()));
        if let Some(date) = date {
            builder = builder.query(&[("date", date.to_string())]);
        }
        Self::send_json(builder).await
    }

    async fn daily_status(&self) -> RemoteResult<DailyStatus> {
        Self::send_json(self.request(Method::GET, "daily-status")).await
    }

    async fn submit_day(&self, date: Option<NaiveDate>) -> RemoteResult<DailyStatus> {
        let builder = self
            .request(Method::POST, "daily-status/submit")
            .json(&SubmitDayRequest { date });
        Self::send_json(builder).await
    }

    async fn create_meeting_note(&self, payload: &NewMeetingNote) -> RemoteResult<MeetingNote> {
        let response: MeetingNoteResponse =
            Self::send_json(self.request(Method::POST, "meeting-notes").json(payload)).await?;
        response.try_into()
    }

    async fn list_meeting_notes(&self) -> RemoteResult<Vec<MeetingNote>> {
        let response: Vec<MeetingNoteResponse> =
            Self::send_json(self.request(Method::GET, "meeting-notes")).await?;
        convert_all(response)
    }

    async fn get_meeting_note(&self, id: &RecordId) -> RemoteResult<MeetingNote> {
        let path = format!("meeting-notes/{}", urlencoding::encode(id.as_str()));
        let response: MeetingNoteResponse =
            Self::send_json(self.request(Method::GET, &path)).await?;
        response.try_into()
    }

    async fn delete_meeting_note(&self, id: &RecordId) -> RemoteResult<()> {
        let path = format!("meeting-notes/{}", urlencoding::encode(id.as_str()));
        Self::send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn check_transcription(&self, id: &RecordId) -> RemoteResult<MeetingNote> {
        let path = format!(
            "meeting-notes/{}/transcription",
            urlencoding::encode(id.as_str())
        );
        let response: MeetingNoteResponse =
            Self::send_json(self.request(Method::GET, &path)).await?;
        response.try_into()
    }
}

fn transport_error(error: reqwest::Error) -> RemoteError {
    if error.is_timeout() {
        RemoteError::Unavailable("request timed out".to_string())
    } else {
        RemoteError::Unavailable(error.to_string())
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.error.or(payload.message) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_base_url(raw: String) -> Result<String> {
    let base_url = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::Config("API base URL must not be empty".to_string()))?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(Error::Config(
            "API base URL must include http:// or https://".to_string(),
        ))
    }
}
