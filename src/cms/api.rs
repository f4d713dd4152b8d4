use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

use super::error::CmsError;
use super::types::{BrowseOptions, Post, PostsEnvelope, ReadKey, Tag, TagsEnvelope};

pub const DEFAULT_API_VERSION: &str = "v5.0";

/// Raw Content API operations, one request per call.
///
/// [`GhostApi`] talks HTTP; tests substitute scripted implementations.
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn browse_posts(&self, options: &BrowseOptions) -> Result<Vec<Post>, CmsError>;
    async fn read_post(&self, key: &ReadKey) -> Result<Post, CmsError>;
    async fn browse_tags(&self, options: &BrowseOptions) -> Result<Vec<Tag>, CmsError>;
    async fn read_tag(&self, key: &ReadKey) -> Result<Tag, CmsError>;
}

/// Ghost Content API over HTTP.
///
/// The content key travels as the `key` query parameter, so request URLs
/// are never logged.
pub struct GhostApi {
    client: reqwest::Client,
    base_url: Url,
    key: SecretString,
    version: String,
    timeout: Duration,
}

impl GhostApi {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        key: SecretString,
    ) -> Result<Self, CmsError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            key,
            version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(30),
        })
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, resource: &str, pairs: &[(&str, String)]) -> Result<Url, CmsError> {
        let mut url = self
            .base_url
            .join(&format!("ghost/api/content/{resource}/"))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", self.key.expose_secret());
            for (name, value) in pairs {
                query.append_pair(name, value);
            }
        }
        Ok(url)
    }

    fn read_resource(kind: &str, key: &ReadKey) -> String {
        match key {
            ReadKey::Slug(slug) => format!("{kind}/slug/{slug}"),
            ReadKey::Id(id) => format!("{kind}/{id}"),
        }
    }

    /// Request errors are stripped of their URL: it carries the content key.
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, CmsError> {
        let request = self
            .client
            .get(url)
            .header("Accept-Version", &self.version);

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| CmsError::Timeout)?
            .map_err(|e| CmsError::Network(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CmsError::Network(e.without_url()))?;

        if !status.is_success() {
            return Err(CmsError::from_response(status.as_u16(), &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ContentApi for GhostApi {
    async fn browse_posts(&self, options: &BrowseOptions) -> Result<Vec<Post>, CmsError> {
        let url = self.endpoint("posts", &options.query_pairs())?;
        let envelope: PostsEnvelope = self.get(url).await?;
        Ok(envelope.posts)
    }

    async fn read_post(&self, key: &ReadKey) -> Result<Post, CmsError> {
        let url = self.endpoint(&Self::read_resource("posts", key), &[])?;
        let envelope: PostsEnvelope = self.get(url).await?;
        envelope.posts.into_iter().next().ok_or(CmsError::NotFound)
    }

    async fn browse_tags(&self, options: &BrowseOptions) -> Result<Vec<Tag>, CmsError> {
        let url = self.endpoint("tags", &options.query_pairs())?;
        let envelope: TagsEnvelope = self.get(url).await?;
        Ok(envelope.tags)
    }

    async fn read_tag(&self, key: &ReadKey) -> Result<Tag, CmsError> {
        let url = self.endpoint(&Self::read_resource("tags", key), &[])?;
        let envelope: TagsEnvelope = self.get(url).await?;
        envelope.tags.into_iter().next().ok_or(CmsError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> GhostApi {
        GhostApi::new(reqwest::Client::new(), base, SecretString::from("k3y".to_string())).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_appends_key() {
        let url = api("https://blog.example.com/cms")
            .endpoint("posts", &[("limit", "3".to_string())])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://blog.example.com/cms/ghost/api/content/posts/?key=k3y&limit=3"
        );
    }

    #[test]
    fn test_read_resource_paths() {
        assert_eq!(
            GhostApi::read_resource("posts", &ReadKey::Slug("hello".into())),
            "posts/slug/hello"
        );
        assert_eq!(
            GhostApi::read_resource("tags", &ReadKey::Id("abc123".into())),
            "tags/abc123"
        );
    }

    #[tokio::test]
    async fn test_network_error_does_not_expose_key() {
        // Nothing listens on the discard port.
        let api = GhostApi::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            SecretString::from("TOPSECRETKEY".to_string()),
        )
        .unwrap();

        let err = api.browse_posts(&BrowseOptions::default()).await.unwrap_err();
        assert!(matches!(err, CmsError::Network(_)));
        assert!(!err.to_string().contains("TOPSECRETKEY"), "{err}");
        assert!(!format!("{err:?}").contains("TOPSECRETKEY"));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = GhostApi::new(reqwest::Client::new(), "not a url", SecretString::from("k".to_string()));
        assert!(matches!(result, Err(CmsError::InvalidUrl(_))));
    }
}
