//! HTML bodies of feed items and the channel description

use crate::config::WatchSpec;

/// Escapes the characters that are significant in HTML text and attributes
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn tags_description(repo: &str, tags: &[String]) -> String {
    let mut html = format!(
        "Available tags of <em>{}</em> have changed. Current tags are:<br/><ul>",
        escape_html(repo)
    );
    for tag in tags {
        html.push_str("<li><code>");
        html.push_str(&escape_html(tag));
        html.push_str("</code></li>");
    }
    html.push_str("</ul>");
    html
}

pub fn digest_description(title: &str, digest: &str) -> String {
    format!(
        "Digest of <em>{}</em> has changed. New digest is:<br/><code>{}</code>",
        escape_html(title),
        escape_html(digest)
    )
}

/// Plain-text summary of what the feed watches
pub fn channel_description(watches: &[WatchSpec]) -> String {
    let mut text = String::from("New tags for");
    for watch in watches {
        text.push_str(&format!(
            "\n  - {} ({}): {}",
            watch.repo,
            watch.arch,
            watch.tags.join(", ")
        ));
    }
    text
}
