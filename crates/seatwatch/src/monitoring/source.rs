use std::time::Duration;

use reqwest::Url;

use super::domain::{ClassName, SectionSnapshot};

/// Class search returning the current sections of one course for a term.
///
/// Implementations must be side-effect free; any error means "no fresh data for this course
/// this cycle".
#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(
        &self,
        class_name: &ClassName,
        term: &str,
    ) -> Result<Vec<SectionSnapshot>, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("class search request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("class search returned status {0}")]
    Status(u16),
    #[error("class search timed out after {0:?}")]
    Timeout(Duration),
    #[error("class search unavailable: {0}")]
    Unavailable(String),
    #[error("class search url '{0}' cannot take a course path segment")]
    InvalidUrl(String),
}

/// Class search backed by a JSON endpoint at `{base_url}/{class_name}?term={term}`.
#[derive(Debug, Clone)]
pub struct HttpSnapshotSource {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpSnapshotSource {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, FetchError> {
        let raw = base_url.as_ref();
        let base_url = Url::parse(raw).map_err(|err| FetchError::InvalidUrl(format!("{raw}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(raw.to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    /// Course names go in as one percent-encoded path segment.
    fn url_for(&self, class_name: &ClassName) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(class_name.as_str().trim());
        Ok(url)
    }
}

#[async_trait::async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(
        &self,
        class_name: &ClassName,
        term: &str,
    ) -> Result<Vec<SectionSnapshot>, FetchError> {
        let response = self
            .client
            .get(self.url_for(class_name)?)
            .query(&[("term", term)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let sections = response.json::<Vec<SectionSnapshot>>().await?;
        Ok(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_trims_trailing_slash_and_whitespace() {
        let source = HttpSnapshotSource::new("http://search.local/api/", Duration::from_secs(1))
            .expect("client builds");
        let url = source
            .url_for(&ClassName::new(" CSE110 "))
            .expect("url builds");
        assert_eq!(url.as_str(), "http://search.local/api/CSE110");
    }

    #[test]
    fn course_names_are_percent_encoded_as_one_segment() {
        let source = HttpSnapshotSource::new("http://search.local/api", Duration::from_secs(1))
            .expect("client builds");
        let url = source
            .url_for(&ClassName::new("CSE 110/L?x#1"))
            .expect("url builds");
        assert_eq!(url.path(), "/api/CSE%20110%2FL%3Fx%231");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn rejects_base_url_without_path() {
        let err = HttpSnapshotSource::new("mailto:registrar@example.edu", Duration::from_secs(1))
            .expect_err("cannot-be-a-base url");
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }
}
