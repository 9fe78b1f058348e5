//! HTTP implementation of the scheduling backend interface.

use async_trait::async_trait;
use tracing::debug;

use crate::api::{
    AvailabilityResponse, AvailabilitySlot, BookAppointmentRequest, BookAppointmentResponse,
    CareOption, CreateHoldRequest, CreateHoldResponse, ProviderSearchResponse, ProviderSummary,
    ProviderType, ProvidersResponse, SchedulingApi, SearchIntentRequest, SearchIntentResponse,
    VisitMode,
};
use crate::error::ApiError;

/// JSON-over-HTTP client for the scheduling backend.
pub struct HttpSchedulingApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSchedulingApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    /// Read a JSON body, mapping non-2xx statuses to `ApiError::Status`
    /// with the backend's `detail` field when present.
    async fn read_json<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            let detail = match resp.json::<serde_json::Value>().await {
                Ok(body) => body
                    .get("detail")
                    .and_then(|d| d.as_str())
                    .unwrap_or("request rejected")
                    .to_string(),
                Err(_) => "request rejected".to_string(),
            };
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(resp.json::<T>().await?)
    }
}

#[async_trait]
impl SchedulingApi for HttpSchedulingApi {
    async fn search_intent(
        &self,
        req: &SearchIntentRequest,
    ) -> Result<SearchIntentResponse, ApiError> {
        debug!(session_id = %req.session_id, "POST search-intent");
        let resp = self
            .client
            .post(self.api_url("search-intent"))
            .json(req)
            .send()
            .await?;
        Self::read_json(resp).await
    }

    async fn care_options(
        &self,
        visit_reason_code: &str,
        recommended: ProviderType,
    ) -> Result<Vec<CareOption>, ApiError> {
        #[derive(serde::Deserialize)]
        struct Body {
            options: Vec<CareOption>,
        }
        let resp = self
            .client
            .get(self.api_url("care-options"))
            .query(&[
                ("visit_reason_code", visit_reason_code.to_string()),
                ("recommended_provider_type", recommended.to_string()),
            ])
            .send()
            .await?;
        let body: Body = Self::read_json(resp).await?;
        Ok(body.options)
    }

    async fn providers(
        &self,
        provider_type: ProviderType,
        limit: usize,
        mode: Option<VisitMode>,
    ) -> Result<Vec<ProviderSummary>, ApiError> {
        debug!(%provider_type, limit, "GET providers");
        let mut query = vec![
            ("provider_type", provider_type.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(mode) = mode {
            query.push(("mode", mode.to_string()));
        }
        let resp = self
            .client
            .get(self.api_url("providers"))
            .query(&query)
            .send()
            .await?;
        let body: ProvidersResponse = Self::read_json(resp).await?;
        Ok(body.providers)
    }

    async fn provider_search(
        &self,
        query_text: &str,
        limit: usize,
        mode: Option<VisitMode>,
    ) -> Result<ProviderSearchResponse, ApiError> {
        debug!(query = %query_text, "GET provider-search");
        let mut query = vec![
            ("q", query_text.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(mode) = mode {
            query.push(("mode", mode.to_string()));
        }
        let resp = self
            .client
            .get(self.api_url("provider-search"))
            .query(&query)
            .send()
            .await?;
        Self::read_json(resp).await
    }

    async fn availability(
        &self,
        provider_type: ProviderType,
        days: u32,
        mode: VisitMode,
        visit_reason_code: &str,
    ) -> Result<Vec<AvailabilitySlot>, ApiError> {
        let resp = self
            .client
            .get(self.api_url("availability"))
            .query(&[
                ("provider_type", provider_type.to_string()),
                ("days", days.to_string()),
                ("mode", mode.to_string()),
                ("visit_reason_code", visit_reason_code.to_string()),
            ])
            .send()
            .await?;
        let body: AvailabilityResponse = Self::read_json(resp).await?;
        Ok(body.slots)
    }

    async fn create_hold(
        &self,
        req: &CreateHoldRequest,
    ) -> Result<CreateHoldResponse, ApiError> {
        debug!(provider_id = %req.provider_id, start = %req.start, "POST holds");
        let resp = self
            .client
            .post(self.api_url("holds"))
            .json(req)
            .send()
            .await?;
        Self::read_json(resp).await
    }

    async fn book_appointment(
        &self,
        req: &BookAppointmentRequest,
    ) -> Result<BookAppointmentResponse, ApiError> {
        debug!(hold_id = %req.hold_id, "POST appointments");
        let resp = self
            .client
            .post(self.api_url("appointments"))
            .json(req)
            .send()
            .await?;
        Self::read_json(resp).await
    }
}
