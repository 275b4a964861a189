//! Redirect search for requests that matched no route.

use crate::routing::RouteSet;
use crate::tree::HttpMethod;

/// Redirect target for an unmatched request, if any.
///
/// Only GET-like requests qualify. The root redirects to the locale root;
/// any other path redirects to the first GET route (in expansion order)
/// whose path is `<its locale>/<requested path>` or lies below it. When the
/// requested path starts with a configured locale that produced no match,
/// the search is repeated without that prefix.
pub fn find_redirect(
    routes: &RouteSet,
    method: HttpMethod,
    path: &str,
    locales: &[String],
    locale: &str,
) -> Option<String> {
    if !method.is_get_like() {
        return None;
    }

    let requested = path.trim_matches('/');
    if requested.is_empty() {
        return Some(format!("/{locale}"));
    }

    if let Some(target) = search(routes, requested) {
        return Some(target);
    }

    let (first, rest) = requested.split_once('/')?;
    if locales.iter().any(|l| l == first) && !rest.is_empty() {
        return search(routes, rest);
    }
    None
}

fn search(routes: &RouteSet, requested: &str) -> Option<String> {
    routes
        .iter()
        .filter(|r| r.is_get() && !r.is_templated())
        .find(|r| {
            r.path
                .strip_prefix(r.locale.as_str())
                .and_then(|p| p.strip_prefix('/'))
                .and_then(|p| p.strip_prefix(requested))
                .is_some_and(|tail| tail.is_empty() || tail.starts_with('/'))
        })
        .map(|r| r.url())
}
