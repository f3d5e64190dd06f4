//! Named URL configurations
//!
//! A [`UrlConf`] is a named set of named routes. Sites pick the URL
//! configuration that serves them (`urlconf` in the site table); the
//! dispatcher routes each request through the configuration attached by the
//! site data middleware, and [`RouteTable`] turns route names back into
//! paths for the presentation helpers.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
    routing::MethodRouter,
    Router,
};
use tower::ServiceExt;

use crate::error::WebError;
use crate::state::AppState;

/// Request extension naming the URL configuration that should serve the
/// request instead of the root one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUrlConf(pub String);

/// A route name could not be turned back into a path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Reverse for '{route}' not found: {reason}")]
pub struct NoReverseMatch {
    pub route: String,
    pub reason: String,
}

impl NoReverseMatch {
    fn new(route: &str, reason: impl Into<String>) -> Self {
        Self {
            route: route.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `:name`, a single path segment
    Param(String),
    /// `*name`, the rest of the path
    Wildcard(String),
}

/// Parsed axum route path, used for reversing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    path: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('/')
            .map(|segment| {
                if let Some(name) = segment.strip_prefix(':') {
                    Segment::Param(name.to_string())
                } else if let Some(name) = segment.strip_prefix('*') {
                    Segment::Wildcard(name.to_string())
                } else {
                    Segment::Literal(segment.to_string())
                }
            })
            .collect();

        Self {
            path: path.to_string(),
            segments,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Parameter names in path order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) | Segment::Wildcard(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    fn build<'a>(
        &self,
        route: &str,
        mut value_for: impl FnMut(usize, &str) -> Option<&'a str>,
    ) -> Result<String, NoReverseMatch> {
        let mut parts: Vec<Cow<'_, str>> = Vec::with_capacity(self.segments.len());
        let mut index = 0;

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => parts.push(Cow::Borrowed(text.as_str())),
                Segment::Param(name) | Segment::Wildcard(name) => {
                    let value = value_for(index, name.as_str()).ok_or_else(|| {
                        NoReverseMatch::new(route, format!("missing argument '{}'", name))
                    })?;
                    index += 1;

                    let wildcard = matches!(segment, Segment::Wildcard(_));
                    if value.is_empty() || (!wildcard && value.contains('/')) {
                        return Err(NoReverseMatch::new(
                            route,
                            format!("argument '{}' does not match pattern '{}'", value, self.path),
                        ));
                    }

                    // Wildcards keep their `/` separators
                    parts.push(if wildcard {
                        Cow::Owned(encode_path(value))
                    } else {
                        urlencoding::encode(value)
                    });
                }
            }
        }

        Ok(parts.join("/"))
    }
}

/// Percent-encode every segment of a `/`-separated path.
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Reverse lookup tables for every registered URL configuration.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    root: String,
    confs: HashMap<String, BTreeMap<String, RoutePattern>>,
}

impl RouteTable {
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn contains(&self, urlconf: &str) -> bool {
        self.confs.contains_key(urlconf)
    }

    /// Build the path for `route` with positional arguments.
    /// `urlconf` of `None` means the root configuration.
    pub fn reverse(
        &self,
        urlconf: Option<&str>,
        route: &str,
        args: &[&str],
    ) -> Result<String, NoReverseMatch> {
        let pattern = self.pattern(urlconf, route)?;

        let expected = pattern.params().count();
        if args.len() != expected {
            return Err(NoReverseMatch::new(
                route,
                format!("expected {} arguments, got {}", expected, args.len()),
            ));
        }

        pattern.build(route, |index, _| args.get(index).copied())
    }

    /// Build the path for `route` with keyword arguments.
    pub fn reverse_kwargs(
        &self,
        urlconf: Option<&str>,
        route: &str,
        kwargs: &[(&str, &str)],
    ) -> Result<String, NoReverseMatch> {
        let pattern = self.pattern(urlconf, route)?;

        if let Some((extra, _)) = kwargs
            .iter()
            .find(|(key, _)| !pattern.params().any(|name| name == *key))
        {
            return Err(NoReverseMatch::new(
                route,
                format!("unexpected keyword argument '{}'", extra),
            ));
        }

        pattern.build(route, |_, name| {
            kwargs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
        })
    }

    fn pattern(&self, urlconf: Option<&str>, route: &str) -> Result<&RoutePattern, NoReverseMatch> {
        let urlconf = urlconf.unwrap_or(&self.root);
        self.confs
            .get(urlconf)
            .ok_or_else(|| NoReverseMatch::new(route, format!("unknown URL configuration '{}'", urlconf)))?
            .get(route)
            .ok_or_else(|| NoReverseMatch::new(route, format!("no route named '{}' in '{}'", route, urlconf)))
    }
}

/// A named set of named routes.
pub struct UrlConf {
    name: String,
    patterns: BTreeMap<String, RoutePattern>,
    router: Router<AppState>,
}

impl UrlConf {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            patterns: BTreeMap::new(),
            router: Router::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a named route using axum path syntax (`:param`, `*rest`).
    pub fn route(mut self, name: &str, path: &str, method_router: MethodRouter<AppState>) -> Self {
        self.patterns.insert(name.to_string(), RoutePattern::parse(path));
        self.router = self.router.route(path, method_router);
        self
    }
}

/// All URL configurations of the application, one of them the root.
pub struct UrlConfs {
    root: String,
    confs: Vec<UrlConf>,
}

impl UrlConfs {
    pub fn new(root: UrlConf) -> Self {
        Self {
            root: root.name.clone(),
            confs: vec![root],
        }
    }

    pub fn with(mut self, conf: UrlConf) -> Self {
        self.confs.retain(|existing| existing.name != conf.name);
        self.confs.push(conf);
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Reverse lookup tables, stored in the application state.
    pub fn route_table(&self) -> RouteTable {
        RouteTable {
            root: self.root.clone(),
            confs: self
                .confs
                .iter()
                .map(|conf| (conf.name.clone(), conf.patterns.clone()))
                .collect(),
        }
    }

    pub(crate) fn into_dispatcher(self, state: &AppState) -> UrlDispatcher {
        let routers = self
            .confs
            .into_iter()
            .map(|conf| {
                let router: Router = conf.router.with_state(state.clone());
                (conf.name, router)
            })
            .collect();

        UrlDispatcher {
            root: self.root,
            routers: Arc::new(routers),
        }
    }
}

/// Routes a request through its active URL configuration.
#[derive(Clone)]
pub(crate) struct UrlDispatcher {
    root: String,
    routers: Arc<HashMap<String, Router>>,
}

impl UrlDispatcher {
    pub(crate) async fn dispatch(self, request: Request<Body>) -> Response {
        let name = request
            .extensions()
            .get::<ActiveUrlConf>()
            .map(|active| active.0.clone())
            .unwrap_or_else(|| self.root.clone());

        let Some(router) = self.routers.get(&name).cloned() else {
            return WebError::UnknownUrlConf(name).into_response();
        };

        match router.oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::routing::get;

    fn table() -> RouteTable {
        UrlConfs::new(
            UrlConf::new("root")
                .route("home", "/", get(|| async { "home" }))
                .route("search", "/search/", get(|| async { "search" }))
                .route("article", "/articles/:year/:slug/", get(|| async { "article" }))
                .route("asset", "/files/*path", get(|| async { "asset" })),
        )
        .with(UrlConf::new("alt").route("search", "/find/", get(|| async { "find" })))
        .route_table()
    }

    #[test]
    fn test_reverse_static_routes() {
        let routes = table();
        assert_eq!(routes.reverse(None, "home", &[]).unwrap(), "/");
        assert_eq!(routes.reverse(None, "search", &[]).unwrap(), "/search/");
        assert_eq!(routes.reverse(Some("root"), "search", &[]).unwrap(), "/search/");
        assert_eq!(routes.reverse(Some("alt"), "search", &[]).unwrap(), "/find/");
    }

    #[test]
    fn test_reverse_with_args() {
        let routes = table();
        assert_eq!(
            routes.reverse(None, "article", &["2024", "hello-world"]).unwrap(),
            "/articles/2024/hello-world/"
        );
        assert_eq!(
            routes
                .reverse_kwargs(None, "article", &[("slug", "hello"), ("year", "2023")])
                .unwrap(),
            "/articles/2023/hello/"
        );
        assert_eq!(
            routes.reverse(None, "asset", &["css/site.css"]).unwrap(),
            "/files/css/site.css"
        );
    }

    #[test]
    fn test_reverse_failures() {
        let routes = table();
        assert!(routes.reverse(None, "missing", &[]).is_err());
        assert!(routes.reverse(Some("nope"), "home", &[]).is_err());
        assert!(routes.reverse(Some("alt"), "home", &[]).is_err());
        assert!(routes.reverse(None, "article", &["2024"]).is_err());
        assert!(routes.reverse(None, "article", &["2024", "a/b"]).is_err());
        assert!(routes.reverse(None, "article", &["2024", ""]).is_err());
        assert!(routes.reverse(None, "search", &["extra"]).is_err());
        assert!(routes
            .reverse_kwargs(None, "article", &[("year", "2024")])
            .is_err());
        assert!(routes
            .reverse_kwargs(None, "article", &[("year", "2024"), ("slug", "a"), ("page", "2")])
            .is_err());
    }

    #[test]
    fn test_reverse_percent_encodes_arguments() {
        let routes = table();
        assert_eq!(
            routes.reverse(None, "article", &["2024", "gold rush% ünd?#"]).unwrap(),
            "/articles/2024/gold%20rush%25%20%C3%BCnd%3F%23/"
        );
        assert_eq!(
            routes.reverse(None, "asset", &["img/my logo%.png"]).unwrap(),
            "/files/img/my%20logo%25.png"
        );
    }

    #[test]
    fn test_replacing_urlconf() {
        let routes = UrlConfs::new(UrlConf::new("root").route("a", "/a/", get(|| async { "a" })))
            .with(UrlConf::new("root").route("b", "/b/", get(|| async { "b" })))
            .route_table();
        assert!(routes.reverse(None, "a", &[]).is_err());
        assert_eq!(routes.reverse(None, "b", &[]).unwrap(), "/b/");
    }

    #[test]
    fn test_route_pattern_params() {
        let pattern = RoutePattern::parse("/articles/:year/:slug/");
        assert_eq!(pattern.path(), "/articles/:year/:slug/");
        assert_eq!(pattern.params().collect::<Vec<_>>(), vec!["year", "slug"]);
    }
}
