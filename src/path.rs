//! URL composition for API resource paths.

/// Joins a base endpoint, a relative resource path and pre-encoded query
/// options into a single URL string.
///
/// Exactly one leading and one trailing `/` is stripped from `base` and from
/// `path`. Options are appended in order, the first prefixed with `?` and the
/// rest with `&`. Option values are not escaped.
///
/// # Examples
///
/// ```
/// use envelope_client::compose_url;
///
/// let url = compose_url("http://host/", "/projects/", &["offset=0", "count=5"]);
/// assert_eq!(url, "http://host/projects?offset=0&count=5");
///
/// assert_eq!(compose_url("http://host", "projects/7", &[] as &[&str]), "http://host/projects/7");
/// ```
pub fn compose_url<S: AsRef<str>>(base: &str, path: &str, options: &[S]) -> String {
    let mut url = format!("{}/{}", trim_once(base), trim_once(path));
    url.push_str(&format_options(options));
    url
}

fn trim_once(value: &str) -> &str {
    let value = value.strip_prefix('/').unwrap_or(value);
    value.strip_suffix('/').unwrap_or(value)
}

fn format_options<S: AsRef<str>>(options: &[S]) -> String {
    let mut formatted = String::new();
    for (i, option) in options.iter().enumerate() {
        formatted.push(if i == 0 { '?' } else { '&' });
        formatted.push_str(option.as_ref());
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: &[&str] = &[];

    #[test]
    fn test_compose_strips_separators() {
        assert_eq!(
            compose_url("http://host/", "/projects/", &["offset=0", "count=5"]),
            "http://host/projects?offset=0&count=5"
        );
    }

    #[test]
    fn test_compose_without_options_has_no_question_mark() {
        assert_eq!(compose_url("http://host", "projects", NONE), "http://host/projects");
    }

    #[test]
    fn test_compose_strips_only_one_separator_per_side() {
        assert_eq!(
            compose_url("http://host//", "//projects//", NONE),
            "http://host///projects/"
        );
    }

    #[test]
    fn test_compose_preserves_option_order_and_encoding() {
        assert_eq!(
            compose_url("http://host/api", "issues", &["q=a b", "count=1", "offset=9"]),
            "http://host/api/issues?q=a b&count=1&offset=9"
        );
    }

    #[test]
    fn test_compose_with_owned_options() {
        let options = vec![String::from("offset=10")];
        assert_eq!(
            compose_url("http://host/", "projects", &options),
            "http://host/projects?offset=10"
        );
    }

    #[test]
    fn test_compose_empty_path() {
        assert_eq!(compose_url("http://host/", "", NONE), "http://host/");
    }
}
