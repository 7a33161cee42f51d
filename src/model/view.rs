//! Views and navigation routes.

use std::collections::BTreeMap;
use std::fmt;

use url::form_urlencoded;

/// One of the four views the assistant can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    Home,
    Disease,
    Crop,
    Fertilizer,
}

impl ViewId {
    #[cfg(test)]
    pub const ALL: [Self; 4] = [Self::Home, Self::Disease, Self::Crop, Self::Fertilizer];

    /// The route path for this view.
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Disease => "/disease",
            Self::Crop => "/crop",
            Self::Fertilizer => "/fertilizer",
        }
    }

    /// Human-readable title shown above the view.
    pub fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Disease => "Disease Detection",
            Self::Crop => "Crop Recommendation",
            Self::Fertilizer => "Fertilizer Guide",
        }
    }

    /// Resolve a path or a bare view name (`disease`, `/crop`, `home`).
    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim().trim_start_matches('/') {
            "" | "home" => Some(Self::Home),
            "disease" => Some(Self::Disease),
            "crop" => Some(Self::Crop),
            "fertilizer" => Some(Self::Fertilizer),
            _ => None,
        }
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A navigation target: a view plus its query parameters.
///
/// `navigation` identifies the navigation event that produced the route.
/// Two mounts of the same route share it, which is how one-shot query
/// markers avoid firing twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub view: ViewId,
    pub query: BTreeMap<String, String>,
    pub navigation: u64,
}

impl Route {
    /// The route as a URL-style string, e.g. `/disease?camera=true`.
    pub fn to_url(&self) -> String {
        if self.query.is_empty() {
            return self.view.path().to_string();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish();
        format!("{}?{query}", self.view.path())
    }

    /// Parse a URL-style string into a route for the given navigation event.
    ///
    /// The query is percent-decoded. Pairs without `=` are kept with an
    /// empty value.
    pub fn parse(url: &str, navigation: u64) -> Option<Self> {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, query),
            None => (url, ""),
        };
        let view = ViewId::from_path(path)?;
        let query = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Some(Self {
            view,
            query,
            navigation,
        })
    }
}
