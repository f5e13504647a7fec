// src/notify/mod.rs
pub mod email;

use crate::error::NotifyError;
use crate::ingest::types::FeedItem;
use crate::store::Article;

/// Delivery boundary: takes (recipient, subject, html body) and delivers.
/// Failure is per recipient; callers decide whether to continue.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), NotifyError>;
}

/// One digest body per subscriber per cycle: an ordered list of linked titles.
pub fn digest_html(articles: &[Article]) -> String {
    let mut body = String::from("<h3>New Articles:</h3><ul>");
    for a in articles {
        let title = if a.title.is_empty() { "Link" } else { a.title.as_str() };
        body.push_str("<li><a href='");
        body.push_str(&html_escape::encode_double_quoted_attribute(&a.url));
        body.push_str("'>");
        body.push_str(&html_escape::encode_text(title));
        body.push_str("</a></li>");
    }
    body.push_str("</ul>");
    body
}

/// One alert body per new feed item.
pub fn feed_item_html(item: &FeedItem) -> String {
    let mut body = String::from("<h3>New Feed Post</h3>");
    if !item.title.is_empty() {
        body.push_str("<p><b>");
        body.push_str(&html_escape::encode_text(&item.title));
        body.push_str("</b></p>");
    }
    if !item.description.is_empty() {
        body.push_str("<p>");
        body.push_str(&html_escape::encode_text(&item.description));
        body.push_str("</p>");
    }
    if !item.link.is_empty() {
        let link = html_escape::encode_double_quoted_attribute(&item.link);
        body.push_str("<p><a href='");
        body.push_str(&link);
        body.push_str("'>");
        body.push_str(&link);
        body.push_str("</a></p>");
    }
    body
}
