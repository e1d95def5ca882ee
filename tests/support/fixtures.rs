//! Catalog response documents shaped like the live BiblioCommons endpoints.

#![allow(dead_code)]

use bibliophile_core::WantedBook;

/// One search result.
pub struct ResultItem<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub call_number: Option<&'a str>,
    pub link: Option<&'a str>,
}

impl<'a> ResultItem<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            author: "Anonymous",
            call_number: None,
            link: None,
        }
    }

    pub fn call_number(mut self, call_number: &'a str) -> Self {
        self.call_number = Some(call_number);
        self
    }

    pub fn link(mut self, link: &'a str) -> Self {
        self.link = Some(link);
        self
    }

    fn to_xml(&self) -> String {
        let call = self
            .call_number
            .map(|c| format!("<b>Call #:</b> {c}<br/>"))
            .unwrap_or_default();
        let link = self
            .link
            .map(|l| format!("<link>{l}</link>"))
            .unwrap_or_default();
        format!(
            "<item><title>{title}</title>{link}<description><![CDATA[\
<div class=\"jacketCoverDiv\"><img src=\"/books/1s/2.jpg\"/></div>\
<b>Author:</b> <a href=\"/search\">{author}</a><br/>{call}\
<b>Description:</b><p>About {title}.</p>]]></description></item>",
            title = self.title,
            author = self.author,
        )
    }
}

/// An RSS search response listing `items` in order.
pub fn rss_response(items: &[ResultItem<'_>]) -> String {
    let items: String = items.iter().map(ResultItem::to_xml).collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<rss version=\"2.0\"><channel><title>Search</title><link>https://example.org/</link>\
<description>Results</description>{items}</channel></rss>"
    )
}

/// A full record response whose branch call number is `call_number`.
pub fn full_record_response(call_number: &str) -> String {
    serde_json::json!({
        "html": format!(
            "<div class=\"holdings\"><div testid=\"callnum_branch\"><span class=\"label\">Call #</span><span class=\"value\">{call_number}</span></div></div>"
        )
    })
    .to_string()
}

/// `count` books with distinct ISBNs, titled `Book 0`, `Book 1`, ...
pub fn wanted_books(count: usize) -> Vec<WantedBook> {
    (0..count)
        .map(|i| WantedBook::new(Some(format!("97800000{i:05}").as_str()), format!("Book {i}"), "Author"))
        .collect()
}
