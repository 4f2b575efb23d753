//! HTTP collaborator for the experiment Data API.

use crate::config::DataApiConfig;
use crate::error::{AnalysisError, Result};
use crate::source::SeriesSource;
use crate::types::{Credential, Sample, Series, SeriesId};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;

const NOT_AUTHORIZED: &str = "Not authorized.";

/// Envelope of a Data API response
#[derive(Debug, Deserialize)]
pub struct DataApiResponse {
    pub status: String,
    #[serde(default)]
    pub data: Vec<Sample>,
}

/// Fetches variable values from the Data API
#[derive(Debug, Clone)]
pub struct DataApiClient {
    config: DataApiConfig,
    http: reqwest::Client,
}

impl DataApiClient {
    pub fn new(config: DataApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnalysisError::OperationFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &DataApiConfig {
        &self.config
    }

    /// URL of the sorted values of one variable
    pub fn values_url(&self, id: SeriesId) -> String {
        self.config.endpoint(&format!(
            "experiments/{}/variables/{}/values?sort[time]=asc",
            id.experiment, id.variable
        ))
    }
}

#[async_trait]
impl SeriesSource for DataApiClient {
    async fn fetch_series(&self, id: SeriesId, credential: &Credential) -> Result<Series> {
        let url = self.values_url(id);
        log::debug!("GET {}", url);

        let mut request = self.http.get(&url).header(ACCEPT, "application/json");
        if !credential.as_str().is_empty() {
            request = request.header(AUTHORIZATION, credential.as_str());
        }

        let response = request.send().await.map_err(|e| {
            AnalysisError::OperationFailed(format!("request for {} failed: {}", id, e))
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            log::warn!("Data API rejected credential for {} ({})", id, status);
            return Err(AnalysisError::AccessForbidden(NOT_AUTHORIZED.to_string()));
        }
        if !status.is_success() {
            return Err(AnalysisError::OperationFailed(format!(
                "Data API returned {} for {}",
                status, id
            )));
        }

        let body = response.json::<DataApiResponse>().await.map_err(|e| {
            AnalysisError::OperationFailed(format!("invalid Data API response for {}: {}", id, e))
        })?;

        series_from_response(body)
    }
}

/// Turn a decoded response into a [`Series`].
///
/// Any status other than `ok` means the credential was not accepted.
pub fn series_from_response(response: DataApiResponse) -> Result<Series> {
    if response.status != "ok" {
        return Err(AnalysisError::AccessForbidden(NOT_AUTHORIZED.to_string()));
    }

    let mut samples = response.data;
    samples.sort_by(|a, b| a.time.total_cmp(&b.time));
    Series::new(samples).map_err(|e| {
        AnalysisError::OperationFailed(format!("Data API returned unusable samples: {}", e))
    })
}
