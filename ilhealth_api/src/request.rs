//! Concrete request descriptions: path segments plus query pairs.

use url::{form_urlencoded, Url};

/// A fully resolved read-only request against the dashboard API.
///
/// Path segments are stored unencoded and percent-encoded when the request is
/// applied to a base URL, so substituted parameter values can contain any
/// characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSpec {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl RequestSpec {
    /// Builds a request from a `/`-separated path relative to the API base.
    pub fn from_path(path: &str) -> Self {
        Self {
            segments: split_path(path),
            query: Vec::new(),
        }
    }

    /// Builds a request from already separated path segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
        }
    }

    /// Appends a query pair.
    pub fn with_query_pair(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// The unencoded relative path, e.g. `content/dashboard/beaches`.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    /// The query string as it is sent, form-encoded, or `None` without pairs.
    pub fn query_string(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }
        Some(
            form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query.iter())
                .finish(),
        )
    }

    /// Appends this request's path segments and query pairs to `base`.
    ///
    /// Returns `None` if `base` cannot carry a path (e.g. `mailto:` URLs).
    pub fn add_to_url(&self, base: &Url) -> Option<Url> {
        let mut url = base.clone();
        {
            let mut path = url.path_segments_mut().ok()?;
            path.pop_if_empty();
            path.extend(self.segments.iter());
        }
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &self.query {
                pairs.append_pair(name, value);
            }
        }
        Some(url)
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
