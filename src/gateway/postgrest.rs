use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder};
use serde::Deserialize;
use url::Url;

use super::{DataGateway, GatewayError};
use crate::config::GatewayConfig;
use crate::filter::postgrest::to_query_pairs;
use crate::filter::{validate_identifier, Filter, FilterError};
use crate::types::{Caller, Row};

/// Client for the managed backend's PostgREST interface (`/rest/v1/<table>`).
///
/// Requests carry the project key as `apikey`. The bearer token is the
/// caller's own access token when one was presented, so the backend applies
/// its row-level security for that user; otherwise the configured key is
/// used.
pub struct PostgrestGateway {
    client: reqwest::Client,
    rest_url: Url,
    api_key: String,
}

/// Error body returned by PostgREST on non-2xx responses
#[derive(Debug, Default, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

impl PostgrestGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let url = config
            .url
            .as_deref()
            .ok_or(GatewayError::ConfigMissing("SUPABASE_URL"))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or(GatewayError::ConfigMissing("SUPABASE_SERVICE_ROLE_KEY"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            rest_url: Self::rest_base(url)?,
            api_key,
        })
    }

    /// `https://x.supabase.co` → `https://x.supabase.co/rest/v1/`
    fn rest_base(url: &str) -> Result<Url, GatewayError> {
        let mut base = Url::parse(url).map_err(|e| GatewayError::InvalidUrl(format!("{}: {}", url, e)))?;
        if base.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl(url.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("rest/v1/")
            .map_err(|e| GatewayError::InvalidUrl(format!("{}: {}", url, e)))
    }

    fn table_url(&self, table: &str) -> Result<Url, GatewayError> {
        validate_identifier(table).map_err(|e| GatewayError::Query(FilterError::InvalidTableName(e)))?;
        self.rest_url
            .join(table)
            .map_err(|e| GatewayError::InvalidUrl(e.to_string()))
    }

    fn request(&self, method: Method, caller: &Caller, table: &str) -> Result<RequestBuilder, GatewayError> {
        let bearer = caller.access_token.as_deref().unwrap_or(&self.api_key);
        Ok(self
            .client
            .request(method, self.table_url(table)?)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
            .header(header::ACCEPT, "application/json")
            .header("Prefer", "return=representation"))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Vec<Row>, GatewayError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let error: PostgrestErrorBody = serde_json::from_slice(&body).unwrap_or_default();
            let mut message = error
                .message
                .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());
            if let Some(details) = error.details {
                message = format!("{} ({})", message, details);
            }
            if let Some(hint) = error.hint {
                tracing::debug!("PostgREST hint: {}", hint);
            }
            return Err(GatewayError::Backend {
                status: status.as_u16(),
                code: error.code,
                message,
            });
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(vec![]);
        }
        serde_json::from_slice::<Vec<Row>>(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DataGateway for PostgrestGateway {
    fn name(&self) -> &'static str {
        "postgrest"
    }

    async fn select(&self, caller: &Caller, table: &str, filter: &Filter) -> Result<Vec<Row>, GatewayError> {
        let request = self
            .request(Method::GET, caller, table)?
            .query(&to_query_pairs(filter));
        self.execute(request).await
    }

    async fn insert(&self, caller: &Caller, table: &str, record: Row) -> Result<Vec<Row>, GatewayError> {
        let request = self.request(Method::POST, caller, table)?.json(&record);
        self.execute(request).await
    }

    async fn update(
        &self,
        caller: &Caller,
        table: &str,
        filter: &Filter,
        partial: Row,
    ) -> Result<Vec<Row>, GatewayError> {
        let request = self
            .request(Method::PATCH, caller, table)?
            .query(&to_query_pairs(filter))
            .json(&partial);
        self.execute(request).await
    }

    async fn delete(&self, caller: &Caller, table: &str, filter: &Filter) -> Result<Vec<Row>, GatewayError> {
        let request = self
            .request(Method::DELETE, caller, table)?
            .query(&to_query_pairs(filter));
        self.execute(request).await
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        let response = self
            .client
            .get(self.rest_url.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        if response.status().is_server_error() {
            return Err(GatewayError::Backend {
                status: response.status().as_u16(),
                code: None,
                message: "backend health probe failed".to_string(),
            });
        }
        Ok(())
    }
}
