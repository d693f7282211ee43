use once_cell::sync::Lazy;
use regex::Regex;

/// Matches `<host>/problems/<slug>` where the host starts the string or follows `//`.
pub static PROBLEM_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|//)(?P<host>[A-Za-z0-9.-]+(?::\d+)?)/problems/(?P<slug>[^/?#\s]+)").unwrap()
});

/// Collapses every variant of a problem page URL (scheme, locale suffix, trailing path,
/// query string, fragment) to `https://<host>/problems/<slug>`.
///
/// Input that does not point at a problem page is returned unchanged.
pub fn normalize_problem_url(url: &str) -> String {
    match PROBLEM_URL.captures(url) {
        Some(captures) => format!(
            "https://{}/problems/{}",
            &captures["host"], &captures["slug"]
        ),
        None => url.to_string(),
    }
}

/// Extracts the problem slug from a problem page URL.
pub fn problem_slug(url: &str) -> Option<String> {
    PROBLEM_URL
        .captures(url)
        .map(|captures| captures["slug"].to_string())
}
