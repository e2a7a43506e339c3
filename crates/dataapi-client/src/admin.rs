//! DevOps administration API.
//!
//! Administration calls use bearer authentication against a separate base
//! URL and pass arguments as query parameters. They share the transport and
//! option layers with Data API commands.

use dataapi_core::{Error, ErrorKind, Result};
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use url::Url;

use crate::client::Client;
use crate::command::{header_value, insert_custom_headers};
use crate::options::ApiOptions;
use crate::transport::HttpRequest;

/// Tracing target for administration calls.
pub const TRACING_TARGET: &str = "dataapi_client::admin";

/// Astra environment, selecting the DevOps API base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DbEnvironment {
    #[default]
    Production,
    Dev,
    Test,
}

impl DbEnvironment {
    /// Base URL of the DevOps API, including the API version.
    pub const fn base_url(&self) -> &'static str {
        match self {
            Self::Production => "https://api.astra.datastax.com/v2",
            Self::Dev => "https://api.dev.cloud.datastax.com/v2",
            Self::Test => "https://api.test.cloud.datastax.com/v2",
        }
    }
}

/// Region classes accepted by [`Admin::find_available_regions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum RegionType {
    /// Serverless and vector regions.
    All,
    Vector,
}

/// Query options for [`Admin::find_available_regions`].
#[derive(Debug, Clone, Default)]
pub struct FindAvailableRegionsOptions {
    /// Only serverless regions are returned when unset.
    pub region_type: Option<RegionType>,
    /// Restrict to regions usable by the caller's organization.
    pub filter_by_org: Option<bool>,
}

impl FindAvailableRegionsOptions {
    #[must_use]
    pub fn with_region_type(mut self, region_type: RegionType) -> Self {
        self.region_type = Some(region_type);
        self
    }

    #[must_use]
    pub fn with_filter_by_org(mut self, filter_by_org: bool) -> Self {
        self.filter_by_org = Some(filter_by_org);
        self
    }

    fn query_pairs(&self) -> Vec<(&'static str, &'static str)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(region_type) = self.region_type {
            pairs.push(("region-type", region_type.into()));
        }
        if let Some(filter_by_org) = self.filter_by_org {
            pairs.push(("filter-by-org", if filter_by_org { "enabled" } else { "disabled" }));
        }
        pairs
    }
}

/// A serverless region offered by the DevOps API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// e.g. `standard` or `premium`.
    #[serde(default)]
    pub classification: String,
    /// `aws`, `gcp` or `azure`.
    #[serde(default)]
    pub cloud_provider: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub enabled: bool,
    /// Identifier used when creating databases.
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "region_type")]
    pub region_type: String,
    #[serde(default)]
    pub reserved_for_qualified_users: bool,
    /// Geographic zone such as `na`, `eu` or `apac`.
    #[serde(default)]
    pub zone: String,
}

#[derive(Deserialize)]
struct DevOpsErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Handle for the DevOps administration API.
///
/// Options are merged as defaults, client, admin.
#[derive(Debug, Clone)]
pub struct Admin {
    client: Client,
    options: Option<ApiOptions>,
    environment: DbEnvironment,
}

impl Admin {
    pub(crate) fn new(client: Client, options: Option<ApiOptions>) -> Self {
        Self {
            client,
            options,
            environment: DbEnvironment::default(),
        }
    }

    /// Targets a non-production environment.
    #[must_use]
    pub fn with_environment(mut self, environment: DbEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> DbEnvironment {
        self.environment
    }

    fn resolve_options(&self) -> ApiOptions {
        ApiOptions::merge([Some(self.client.options()), self.options.as_ref()])
    }

    fn url(&self, path: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let base = self.environment.base_url();
        let mut url = Url::parse(base).map_err(|error| {
            Error::from_source(ErrorKind::Configuration, error)
                .with_message(format!("invalid DevOps API URL: {base}"))
        })?;

        url.path_segments_mut()
            .map_err(|()| Error::configuration(format!("invalid DevOps API URL: {base}")))?
            .pop_if_empty()
            .extend(path);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn headers(options: &ApiOptions) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        let token = options.token();
        if !token.is_empty() {
            let bearer = header_value("Authorization", &format!("Bearer {token}"))?;
            headers.insert(AUTHORIZATION, bearer);
        }
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        insert_custom_headers(&mut headers, options)?;
        Ok(headers)
    }

    /// Sends a request and returns the body of a successful response.
    async fn execute(&self, method: Method, url: Url) -> Result<Vec<u8>> {
        let options = self.resolve_options();

        let mut request = HttpRequest::new(method, url);
        request.headers = Self::headers(&options)?;
        request.timeout = Some(options.request_timeout());
        request.connect_timeout = options.connection_timeout();

        tracing::debug!(
            target: TRACING_TARGET,
            method = %request.method,
            url = %request.url,
            "Executing DevOps request"
        );

        let response = options.transport()?.send(request).await.inspect_err(|error| {
            tracing::warn!(target: TRACING_TARGET, error = %error, "DevOps request failed");
        })?;

        tracing::debug!(
            target: TRACING_TARGET,
            status = response.status,
            "DevOps response received"
        );

        if response.status >= 400 {
            return Err(devops_error(response.status, &response.body));
        }
        Ok(response.body)
    }

    /// Lists the serverless regions available for new databases.
    pub async fn find_available_regions(
        &self,
        options: FindAvailableRegionsOptions,
    ) -> Result<Vec<Region>> {
        let url = self.url(&["regions", "serverless"], &options.query_pairs())?;
        let body = self.execute(Method::GET, url).await?;

        serde_json::from_slice(&body).map_err(|error| {
            let message = format!("failed to parse regions response: {error}");
            Error::from_source(ErrorKind::Serialization, error).with_message(message)
        })
    }
}

fn devops_error(status: u16, body: &[u8]) -> Error {
    let message = serde_json::from_slice::<DevOpsErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());

    Error::transport(format!("DevOps API error (status {status}): {message}"))
        .with_status_code(status)
}
