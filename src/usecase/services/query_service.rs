use std::sync::Arc;

use reqwest::Url;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::entities::record::{Collection, Record, RecordId};
use crate::domain::entities::scope::CentreScope;
use crate::domain::entities::view::Page;
use crate::infra::http::envelope::{parse_listing, parse_record, Listing};
use crate::usecase::ports::transport::{
    ApiError, ApiRequest, ApiResponse, Endpoint, HttpMethod, HttpTransport,
};

/// REST client for list and record endpoints, relative to one API base URL.
///
/// No request is ever retried; callers surface the error.
pub struct ApiClient<T: HttpTransport> {
    transport: Arc<T>,
    base_url: Url,
    page_size: u32,
}

impl<T: HttpTransport> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            base_url: self.base_url.clone(),
            page_size: self.page_size,
        }
    }
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn new(transport: Arc<T>, base_url: &str, page_size: u32) -> Result<Self, ApiError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|err| ApiError::Network(format!("invalid api base url {base}: {err}")))?;
        Ok(Self {
            transport,
            base_url,
            page_size: page_size.max(1),
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// List endpoint of a collection, scoped to the centre when the collection is.
    pub fn collection_endpoint<C: Collection>(&self, scope: &CentreScope) -> Endpoint {
        let endpoint = Endpoint::new(C::ENDPOINT);
        match scope.id {
            Some(centre_id) if C::CENTRE_SCOPED => endpoint.with_param("centre", centre_id),
            _ => endpoint,
        }
    }

    pub fn resolve(&self, endpoint: &Endpoint, page: Option<u32>) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(endpoint.path.trim_start_matches('/'))
            .map_err(|err| ApiError::Network(format!("invalid endpoint {}: {err}", endpoint.path)))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in &endpoint.params {
                query.append_pair(key, value);
            }
            if let Some(page) = page {
                query.append_pair("page", &page.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        debug!(method = ?request.method, url = %request.url, "api request");
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            warn!(status = response.status, "api request failed");
            Err(ApiError::Server {
                status: response.status,
                payload: response.body,
            })
        }
    }

    /// One page of a collection.
    pub async fn fetch_page<R: Record>(
        &self,
        endpoint: &Endpoint,
        page_number: u32,
    ) -> Result<Page<R>, ApiError> {
        let page_number = page_number.max(1);
        let url = self.resolve(endpoint, Some(page_number))?;
        let response = self.send(ApiRequest::get(url.as_str())).await?;

        Ok(match parse_listing::<R>(&response.body)? {
            Listing::Envelope(envelope) => {
                let total_count = envelope.count.unwrap_or_else(|| {
                    counted_through(
                        page_number,
                        self.page_size,
                        envelope.results.len(),
                        envelope.next.is_some(),
                    )
                });
                Page::from_envelope(
                    envelope.results,
                    page_number,
                    total_count,
                    self.page_size,
                    envelope.next,
                )
            }
            Listing::Bare(items) => Page::single(items),
        })
    }

    /// Every record of a collection, following `next` until it runs out.
    ///
    /// Records keep server order; nothing is reordered or deduplicated.
    pub async fn fetch_all<R: Record>(&self, endpoint: &Endpoint) -> Result<Vec<R>, ApiError> {
        let mut url = self.resolve(endpoint, None)?;
        let mut records = Vec::new();

        loop {
            let response = self.send(ApiRequest::get(url.as_str())).await?;
            match parse_listing::<R>(&response.body)? {
                Listing::Bare(items) => {
                    records.extend(items);
                    break;
                }
                Listing::Envelope(envelope) => {
                    records.extend(envelope.results);
                    let Some(next) = envelope.next.filter(|next| !next.is_empty()) else {
                        break;
                    };
                    let next_url = url.join(&next).map_err(ApiError::decode)?;
                    if next_url == url {
                        warn!(url = %url, "pagination cursor points at itself");
                        break;
                    }
                    url = next_url;
                }
            }
        }

        debug!(count = records.len(), path = %endpoint.path, "fetched full collection");
        Ok(records)
    }

    pub async fn fetch_one<R: Record>(&self, endpoint: &Endpoint) -> Result<R, ApiError> {
        let url = self.resolve(endpoint, None)?;
        let response = self.send(ApiRequest::get(url.as_str())).await?;
        parse_record(&response.body)
    }

    pub async fn create<C: Collection>(&self, payload: Map<String, Value>) -> Result<C, ApiError> {
        let url = self.resolve(&Endpoint::new(C::create_path()), None)?;
        let response = self
            .send(ApiRequest::with_body(
                HttpMethod::Post,
                url.as_str(),
                Value::Object(payload),
            ))
            .await?;
        parse_record(&response.body)
    }

    pub async fn update<C: Collection>(
        &self,
        id: &RecordId,
        payload: Map<String, Value>,
    ) -> Result<C, ApiError> {
        let url = self.resolve(&Endpoint::new(C::ENDPOINT).item(id), None)?;
        let response = self
            .send(ApiRequest::with_body(
                HttpMethod::Put,
                url.as_str(),
                Value::Object(payload),
            ))
            .await?;
        parse_record(&response.body)
    }

    pub async fn delete<C: Collection>(&self, id: &RecordId) -> Result<(), ApiError> {
        let url = self.resolve(&Endpoint::new(C::ENDPOINT).item(id), None)?;
        self.send(ApiRequest::delete(url.as_str())).await?;
        Ok(())
    }
}

/// Lower bound on a collection's size when an envelope omits `count`: every
/// earlier page is assumed full, and a `next` cursor implies one more record.
fn counted_through(page_number: u32, page_size: u32, on_page: usize, has_next: bool) -> u64 {
    let page_size = u64::from(page_size.max(1));
    let seen = u64::from(page_number.saturating_sub(1)) * page_size + on_page as u64;
    if has_next {
        seen.max(u64::from(page_number) * page_size + 1)
    } else {
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_count_keeps_earlier_pages_reachable() {
        assert_eq!(counted_through(3, 50, 1, false), 101);
        assert_eq!(counted_through(1, 50, 50, true), 51);
        assert_eq!(counted_through(1, 50, 0, false), 0);
    }
}
