//! Root-relative URL rewriting for markup shown outside the host page.

use lol_html::{RewriteStrSettings, element, rewrite_str};
use serde_json::{Map, Value};
use thiserror::Error;

/// Element/attribute pairs whose URLs are rewritten.
const URL_ATTRIBUTES: [(&str, &str); 5] = [
    ("img", "src"),
    ("a", "href"),
    ("script", "src"),
    ("iframe", "src"),
    ("link", "href"),
];

#[derive(Debug, Error)]
#[error("markup could not be rewritten: {message}")]
pub struct AbsolutizeError {
    message: String,
}

/// Prefix every root-relative URL in `html` with `server_address`.
///
/// Values that are already absolute (`#fragment`, `//host`, `scheme:`) and
/// empty values are left alone. Missing attributes are never created.
pub fn absolutize(html: &str, server_address: &str) -> Result<String, AbsolutizeError> {
    let handlers = URL_ATTRIBUTES
        .iter()
        .map(|&(tag, attribute)| {
            element!(tag, move |el| {
                if let Some(value) = el.get_attribute(attribute)
                    && !value.is_empty()
                    && !is_absolute_url(&value)
                {
                    el.set_attribute(attribute, &format!("{server_address}{value}"))?;
                }
                Ok(())
            })
        })
        .collect();

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| AbsolutizeError {
        message: err.to_string(),
    })
}

/// Run [`absolutize`] over every string value of `map`. Other values are
/// left as they are.
pub fn absolutize_payload_strings(
    map: &mut Map<String, Value>,
    server_address: &str,
) -> Result<(), AbsolutizeError> {
    for value in map.values_mut() {
        if let Value::String(html) = value {
            *html = absolutize(html, server_address)?;
        }
    }
    Ok(())
}

/// `#…`, `//…`, or a URI scheme followed by `:`.
pub fn is_absolute_url(url: &str) -> bool {
    if url.starts_with('#') || url.starts_with("//") {
        return true;
    }
    match url.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'.' | b'-'))
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn root_relative_image_gets_server_prefix() {
        let html = absolutize(r#"<img src="/x.png">"#, "http://h/").expect("rewrite");
        assert_eq!(html, r#"<img src="http://h//x.png">"#);
    }

    #[test]
    fn absolute_urls_are_untouched() {
        let input = r##"<a href="http://other/">l</a><a href="#top">t</a><script src="//cdn/x.js"></script><a href="mailto:a@b">m</a>"##;
        assert_eq!(absolutize(input, "http://h").expect("rewrite"), input);
    }

    #[test]
    fn every_listed_pair_is_rewritten() {
        let input = concat!(
            r#"<link href="/s.css"><script src="/s.js"></script>"#,
            r#"<iframe src="/f"></iframe><a href="/p">p</a>"#
        );
        let html = absolutize(input, "https://acos.example").expect("rewrite");
        insta::assert_snapshot!(html, @r#"<link href="https://acos.example/s.css"><script src="https://acos.example/s.js"></script><iframe src="https://acos.example/f"></iframe><a href="https://acos.example/p">p</a>"#);
    }

    #[test]
    fn other_attributes_and_missing_ones_stay_as_they_are() {
        let input = r#"<a name="x">n</a><img alt="/no" data-src="/lazy.png"><div src="/d"></div>"#;
        assert_eq!(absolutize(input, "http://h").expect("rewrite"), input);
    }

    #[test]
    fn payload_strings_are_rewritten_in_place() {
        let mut map = match json!({
            "hint": "<img src=\"/a.png\">",
            "count": 3,
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        absolutize_payload_strings(&mut map, "http://h").expect("rewrite");

        assert_eq!(map["hint"], json!("<img src=\"http://h/a.png\">"));
        assert_eq!(map["count"], json!(3));
    }

    #[test]
    fn scheme_detection() {
        assert!(is_absolute_url("https://x"));
        assert!(is_absolute_url("data:image/png;base64,AA"));
        assert!(is_absolute_url("svn+ssh://x"));
        assert!(!is_absolute_url("/static/a.png"));
        assert!(!is_absolute_url("img/a.png"));
        assert!(!is_absolute_url("/path?x=a:b"));
        assert!(!is_absolute_url(":nothing"));
    }
}
