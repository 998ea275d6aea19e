//! reqwest-backed client for the bookmark service REST API.

use async_trait::async_trait;
use raindrop_core::{
    AvailableFilters, Collection, CollectionsMergeRequest, ConfigError, FiltersQuery, Highlight,
    HighlightBulkUpdateRequest, ItemResponse, ItemsResponse, ListRaindropsQuery, PageQuery,
    Raindrop, RaindropApi, RaindropBulkUpdate, RaindropConfig, RaindropCreateManyRequest,
    RaindropHighlights, RaindropResult, SuccessResponse, TagDeleteRequest, TagInfo,
    TagRenameRequest, UpstreamError, UserInfo,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Query string for bulk bookmark updates.
#[derive(Debug, Serialize)]
struct BulkUpdateQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    nested: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
}

#[derive(Clone)]
pub struct HttpRaindropClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderMap,
}

impl HttpRaindropClient {
    pub fn new(config: &RaindropConfig) -> RaindropResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| UpstreamError::Request {
                endpoint: config.base_url.clone(),
                reason: e.to_string(),
            })?;

        let auth_header = build_auth_headers(config.api_token.expose_secret())?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> RaindropResult<T> {
        self.request_json::<T, (), ()>(Method::GET, path, None, None)
            .await
    }

    async fn send_json<T, B>(&self, method: Method, path: &str, body: &B) -> RaindropResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_json::<T, B, ()>(method, path, Some(body), None)
            .await
    }

    async fn request_json<T, B, Q>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: Option<&Q>,
    ) -> RaindropResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
        Q: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .request(method, url)
            .headers(self.auth_header.clone());
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|e| UpstreamError::Request {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })?;
        parse_response(path, response).await
    }
}

#[async_trait]
impl RaindropApi for HttpRaindropClient {
    async fn list_collections(&self) -> RaindropResult<ItemsResponse<Collection>> {
        self.get_json("/collections").await
    }

    async fn list_child_collections(&self) -> RaindropResult<ItemsResponse<Collection>> {
        self.get_json("/collections/childrens").await
    }

    async fn get_collection(&self, id: i64) -> RaindropResult<ItemResponse<Collection>> {
        self.get_json(&format!("/collection/{}", id)).await
    }

    async fn create_collection(
        &self,
        collection: &Collection,
    ) -> RaindropResult<ItemResponse<Collection>> {
        self.send_json(Method::POST, "/collection", collection).await
    }

    async fn update_collection(
        &self,
        id: i64,
        collection: &Collection,
    ) -> RaindropResult<ItemResponse<Collection>> {
        self.send_json(Method::PUT, &format!("/collection/{}", id), collection)
            .await
    }

    async fn delete_collection(&self, id: i64) -> RaindropResult<SuccessResponse> {
        self.request_json::<_, (), ()>(Method::DELETE, &format!("/collection/{}", id), None, None)
            .await
    }

    async fn merge_collections(
        &self,
        payload: &CollectionsMergeRequest,
    ) -> RaindropResult<SuccessResponse> {
        self.send_json(Method::PUT, "/collections/merge", payload)
            .await
    }

    async fn list_tags(&self, collection_id: Option<i64>) -> RaindropResult<ItemsResponse<TagInfo>> {
        self.get_json(&tags_path(collection_id)).await
    }

    async fn rename_tags(
        &self,
        collection_id: Option<i64>,
        payload: &TagRenameRequest,
    ) -> RaindropResult<SuccessResponse> {
        self.send_json(Method::PUT, &tags_path(collection_id), payload)
            .await
    }

    async fn delete_tags(
        &self,
        collection_id: Option<i64>,
        payload: &TagDeleteRequest,
    ) -> RaindropResult<SuccessResponse> {
        self.send_json(Method::DELETE, &tags_path(collection_id), payload)
            .await
    }

    async fn get_user(&self) -> RaindropResult<ItemResponse<UserInfo>> {
        self.get_json("/user").await
    }

    async fn get_raindrop(&self, id: i64) -> RaindropResult<ItemResponse<Raindrop>> {
        self.get_json(&format!("/raindrop/{}", id)).await
    }

    async fn create_raindrop(&self, raindrop: &Raindrop) -> RaindropResult<ItemResponse<Raindrop>> {
        self.send_json(Method::POST, "/raindrop", raindrop).await
    }

    async fn update_raindrop(
        &self,
        id: i64,
        raindrop: &Raindrop,
    ) -> RaindropResult<ItemResponse<Raindrop>> {
        self.send_json(Method::PUT, &format!("/raindrop/{}", id), raindrop)
            .await
    }

    async fn delete_raindrop(&self, id: i64) -> RaindropResult<SuccessResponse> {
        self.request_json::<_, (), ()>(Method::DELETE, &format!("/raindrop/{}", id), None, None)
            .await
    }

    async fn list_raindrops(
        &self,
        collection_id: i64,
        query: &ListRaindropsQuery,
    ) -> RaindropResult<ItemsResponse<Raindrop>> {
        self.request_json::<_, (), _>(
            Method::GET,
            &format!("/raindrops/{}", collection_id),
            None,
            Some(query),
        )
        .await
    }

    async fn create_raindrops(
        &self,
        payload: &RaindropCreateManyRequest,
    ) -> RaindropResult<ItemsResponse<Raindrop>> {
        self.send_json(Method::POST, "/raindrops", payload).await
    }

    async fn update_raindrops(
        &self,
        collection_id: i64,
        update: &RaindropBulkUpdate,
        nested: Option<bool>,
        search: Option<&str>,
    ) -> RaindropResult<SuccessResponse> {
        let query = BulkUpdateQuery { nested, search };
        self.request_json(
            Method::PUT,
            &format!("/raindrops/{}", collection_id),
            Some(update),
            Some(&query),
        )
        .await
    }

    async fn list_highlights(&self, query: &PageQuery) -> RaindropResult<ItemsResponse<Highlight>> {
        self.request_json::<_, (), _>(Method::GET, "/highlights", None, Some(query))
            .await
    }

    async fn list_collection_highlights(
        &self,
        collection_id: i64,
        query: &PageQuery,
    ) -> RaindropResult<ItemsResponse<Highlight>> {
        self.request_json::<_, (), _>(
            Method::GET,
            &format!("/highlights/{}", collection_id),
            None,
            Some(query),
        )
        .await
    }

    async fn get_raindrop_highlights(
        &self,
        raindrop_id: i64,
    ) -> RaindropResult<ItemResponse<RaindropHighlights>> {
        self.get_json(&format!("/raindrop/{}", raindrop_id)).await
    }

    async fn update_highlights(
        &self,
        raindrop_id: i64,
        payload: &HighlightBulkUpdateRequest,
    ) -> RaindropResult<ItemResponse<HighlightBulkUpdateRequest>> {
        self.send_json(Method::PUT, &format!("/raindrop/{}", raindrop_id), payload)
            .await
    }

    async fn get_filters(
        &self,
        collection_id: i64,
        query: &FiltersQuery,
    ) -> RaindropResult<AvailableFilters> {
        self.request_json::<_, (), _>(
            Method::GET,
            &format!("/filters/{}", collection_id),
            None,
            Some(query),
        )
        .await
    }
}

fn tags_path(collection_id: Option<i64>) -> String {
    match collection_id {
        Some(id) => format!("/tags/{}", id),
        None => "/tags".to_string(),
    }
}

async fn parse_response<T: DeserializeOwned>(
    endpoint: &str,
    response: reqwest::Response,
) -> RaindropResult<T> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(|e| {
            UpstreamError::Decode {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
            .into()
        });
    }

    let message = response.text().await.unwrap_or_default();
    tracing::warn!(endpoint, status = status.as_u16(), "upstream request failed");
    Err(UpstreamError::Status {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        message,
    }
    .into())
}

fn build_auth_headers(api_token: &str) -> Result<HeaderMap, ConfigError> {
    let mut value =
        HeaderValue::from_str(&format!("Bearer {}", api_token)).map_err(|e| {
            ConfigError::InvalidValue {
                field: "api_token".to_string(),
                value: "[REDACTED]".to_string(),
                reason: e.to_string(),
            }
        })?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}
