//! Static-site helpers for serving a store as a website.

/// Key whose presence turns a store root into a website.
pub const INDEX_KEY: &str = "index.html";

/// Insert `<base href="/{store_id}/">` immediately after the opening
/// `<head>` tag so that relative links resolve inside the store.
///
/// The tag match is case-insensitive and tolerates attributes. Documents
/// without a `<head>` tag are returned unchanged.
#[must_use]
pub fn inject_base_href(html: &str, store_id: &str) -> String {
    let Some(insert_at) = head_tag_end(html) else {
        return html.to_owned();
    };
    let base = format!(r#"<base href="/{store_id}/">"#);
    let mut out = String::with_capacity(html.len() + base.len());
    out.push_str(&html[..insert_at]);
    out.push_str(&base);
    out.push_str(&html[insert_at..]);
    out
}

/// Byte offset just past the `>` that closes the first `<head ...>` tag.
fn head_tag_end(html: &str) -> Option<usize> {
    let lower = html.to_ascii_lowercase();
    let mut from = 0;
    while let Some(pos) = lower[from..].find("<head") {
        let start = from + pos;
        let after = start + "<head".len();
        match lower.as_bytes().get(after) {
            Some(b'>') => return Some(after + 1),
            Some(b) if b.is_ascii_whitespace() || *b == b'/' => {
                return lower[after..].find('>').map(|end| after + end + 1);
            }
            // `<header>` and friends
            _ => from = after,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_inject_after_plain_head() {
        let html = "<html><head><title>x</title></head><body></body></html>";
        assert_eq!(
            inject_base_href(html, "abc"),
            r#"<html><head><base href="/abc/"><title>x</title></head><body></body></html>"#
        );
    }

    #[test]
    fn test_should_inject_after_head_with_attributes() {
        let html = r#"<HTML><HEAD lang="en"><meta charset="utf-8"></HEAD></HTML>"#;
        assert_eq!(
            inject_base_href(html, "s1"),
            r#"<HTML><HEAD lang="en"><base href="/s1/"><meta charset="utf-8"></HEAD></HTML>"#
        );
    }

    #[test]
    fn test_should_skip_header_elements() {
        let html = "<header>h</header><head></head>";
        assert_eq!(
            inject_base_href(html, "s"),
            r#"<header>h</header><head><base href="/s/"></head>"#
        );
    }

    #[test]
    fn test_should_leave_document_without_head_unchanged() {
        assert_eq!(inject_base_href("<p>hi</p>", "s"), "<p>hi</p>");
    }
}
