//! NCBI E-utilities client
//!
//! Endpoints used:
//!   esearch: `<base>/esearch.fcgi` (JSON) for the match count and one page of PMIDs
//!   efetch:  `<base>/efetch.fcgi` (XML) for the full records of those PMIDs

use std::time::Duration;

use litner_core::{SHARED_RUNTIME, ServiceError, build_http_client};
use serde::Deserialize;

use crate::config::EutilsConfig;
use crate::parser::{PubmedArticle, parse_pubmed_xml};

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Total matches for the query, independent of paging
    pub total_count: usize,
    /// PMIDs on this page, in service order
    pub ids: Vec<String>,
}

/// A remote bibliographic search-and-fetch service.
///
/// The acquisition runner only talks to the service through this trait, so
/// tests drive it with in-memory fixtures.
pub trait SearchService {
    /// Run `query`, returning the match count and up to `retmax` ids from `retstart`.
    fn search(&self, query: &str, retstart: usize, retmax: usize)
        -> Result<SearchPage, ServiceError>;

    /// Fetch full records for a batch of ids.
    fn fetch(&self, ids: &[String]) -> Result<Vec<PubmedArticle>, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct EsearchResponse {
    esearchresult: EsearchResult,
}

#[derive(Debug, Deserialize)]
struct EsearchResult {
    count: Option<String>,
    #[serde(default)]
    idlist: Vec<String>,
    #[serde(rename = "ERROR")]
    error: Option<String>,
}

/// Parse an esearch JSON body into a [`SearchPage`]
pub fn parse_esearch(body: &str) -> Result<SearchPage, ServiceError> {
    let parsed: EsearchResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::Malformed(format!("esearch JSON: {e}")))?;
    let result = parsed.esearchresult;

    if let Some(error) = result.error {
        return Err(ServiceError::Malformed(format!("esearch error: {error}")));
    }
    let count = result
        .count
        .ok_or_else(|| ServiceError::Malformed("esearch result has no count".to_string()))?;
    let total_count = count
        .trim()
        .parse()
        .map_err(|_| ServiceError::Malformed(format!("esearch count is not a number: {count}")))?;

    Ok(SearchPage {
        total_count,
        ids: result.idlist,
    })
}

/// Blocking E-utilities client over the shared runtime
pub struct EutilsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    email: Option<String>,
    tool: String,
}

impl std::fmt::Debug for EutilsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EutilsClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("tool", &self.tool)
            .finish_non_exhaustive()
    }
}

impl EutilsClient {
    pub fn new(config: &EutilsConfig) -> anyhow::Result<Self> {
        let client = build_http_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            email: config.email.clone(),
            tool: config.tool.clone(),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}", self.base_url)
    }

    /// Parameters sent with every request
    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("db", "pubmed".to_string()), ("tool", self.tool.clone())];
        if let Some(email) = &self.email {
            params.push(("email", email.clone()));
        }
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ServiceError> {
        SHARED_RUNTIME.handle().block_on(async {
            request
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(ServiceError::from_reqwest)?
                .text()
                .await
                .map_err(ServiceError::from_reqwest)
        })
    }
}

impl SearchService for EutilsClient {
    fn search(
        &self,
        query: &str,
        retstart: usize,
        retmax: usize,
    ) -> Result<SearchPage, ServiceError> {
        let mut params = self.base_params();
        params.push(("term", query.to_string()));
        params.push(("retstart", retstart.to_string()));
        params.push(("retmax", retmax.to_string()));
        params.push(("retmode", "json".to_string()));

        log::debug!("esearch retstart={retstart} retmax={retmax}: {query}");
        let body = self.send(self.client.get(self.endpoint("esearch.fcgi")).query(&params))?;
        parse_esearch(&body)
    }

    fn fetch(&self, ids: &[String]) -> Result<Vec<PubmedArticle>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut params = self.base_params();
        params.push(("id", ids.join(",")));
        params.push(("rettype", "xml".to_string()));
        params.push(("retmode", "xml".to_string()));

        // POST keeps long id lists out of the URL
        log::debug!("efetch {} ids", ids.len());
        let body = self.send(self.client.post(self.endpoint("efetch.fcgi")).form(&params))?;
        parse_pubmed_xml(&body).map_err(|e| ServiceError::Malformed(format!("efetch XML: {e:#}")))
    }
}
