//! Parsers for the catalog's undocumented documents.
//!
//! Two failure tiers are kept apart on purpose. A missing optional field
//! (author, call number, description, cover) is ordinary data sparsity and
//! becomes `None` or an empty string. A missing container (no RSS channel, no
//! `html` payload, no call number element in a full record) is structural drift
//! and becomes a named [`CatalogError`].

use std::sync::LazyLock;

use html_escape::decode_html_entities;
use rss::{Channel, Item};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use url::Url;

use crate::cover::higher_quality_cover;
use crate::diagnostics::Diagnostics;
use crate::error::CatalogError;

use super::CatalogRecord;
use super::utils::{compile_static_selector, element_text, non_blank};

/// Path prefix of a full record link: `/item/show/<digits>_<slug>`.
pub const ITEM_PATH_PREFIX: &str = "/item/show/";

/// Test identifier of the element holding the branch call number in a full record.
pub const CALL_NUMBER_TEST_ID: &str = "callnum_branch";

const AUTHOR_LABEL: &str = "Author:";
const CALL_NUMBER_LABEL: &str = "Call #:";
const DESCRIPTION_LABEL: &str = "Description:";

static LABEL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("b"));
static LABEL_OR_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("b, a"));
static LABEL_OR_PARAGRAPH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("b, p"));
static THUMBNAIL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("div.jacketCoverDiv img"));
static CALL_NUMBER_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    compile_static_selector(&format!(
        "[testid=\"{CALL_NUMBER_TEST_ID}\"], [data-testid=\"{CALL_NUMBER_TEST_ID}\"]"
    ))
});
static VALUE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("span.value"));

/// Parses one search response into records, in the order the channel lists them.
///
/// Items without a title are skipped with a warning; their siblings are kept.
///
/// # Errors
///
/// Returns [`CatalogError::MalformedResponse`] when the body is not an RSS channel.
pub fn parse_search_response(
    body: &str,
    context: &str,
    diagnostics: &dyn Diagnostics,
) -> Result<Vec<CatalogRecord>, CatalogError> {
    let channel = Channel::read_from(body.as_bytes())
        .map_err(|e| CatalogError::malformed_response(context, &e.to_string()))?;

    Ok(channel
        .items()
        .iter()
        .filter_map(|item| {
            let record = record_from_item(item, diagnostics);
            if record.is_none() {
                diagnostics.warn(&format!(
                    "Skipping untitled result in {context} (link: {})",
                    item.link().unwrap_or("none")
                ));
            }
            record
        })
        .collect())
}

/// Extracts a record from one RSS `<item>`. Returns `None` only when the title is missing.
///
/// The item's `<description>` is escaped HTML with `<b>` labels; each labelled
/// field is looked up independently.
#[must_use]
pub fn record_from_item(item: &Item, diagnostics: &dyn Diagnostics) -> Option<CatalogRecord> {
    // The feed double-escapes titles (`&amp;#39;`); only entities are decoded, `<...>` is kept as text.
    let title = item
        .title()
        .and_then(|title| non_blank(&decode_html_entities(title)))?;
    let fragment = Html::parse_fragment(item.description().unwrap_or_default());

    let cover_image = fragment
        .select(&THUMBNAIL_SELECTOR)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(|src| higher_quality_cover(src, diagnostics));

    Some(CatalogRecord {
        title,
        author: element_after_label(&fragment, &LABEL_OR_LINK_SELECTOR, AUTHOR_LABEL, "a")
            .and_then(|author| non_blank(&author)),
        description: element_after_label(
            &fragment,
            &LABEL_OR_PARAGRAPH_SELECTOR,
            DESCRIPTION_LABEL,
            "p",
        )
        .unwrap_or_default(),
        call_number: text_after_label(&fragment, CALL_NUMBER_LABEL),
        cover_image,
        full_record_link: item.link().and_then(non_blank),
    })
}

#[derive(Debug, Deserialize)]
struct FullRecordPayload {
    html: Option<String>,
}

/// Reads the branch call number out of a full record response.
///
/// The endpoint answers JSON whose `html` field holds a fragment; the call
/// number is the `span.value` inside the element tagged `callnum_branch`.
///
/// # Errors
///
/// Returns [`CatalogError::MalformedDetailResponse`] when any level of that
/// structure is missing or the value is blank.
pub fn parse_call_number(body: &str, item_id: u64) -> Result<String, CatalogError> {
    let payload: FullRecordPayload = serde_json::from_str(body).map_err(|e| {
        CatalogError::malformed_detail(item_id, &format!("response is not JSON: {e}"))
    })?;
    let Some(html) = payload.html else {
        return Err(CatalogError::malformed_detail(
            item_id,
            "JSON has no 'html' field",
        ));
    };

    let fragment = Html::parse_fragment(&html);
    let Some(container) = fragment.select(&CALL_NUMBER_SELECTOR).next() else {
        return Err(CatalogError::malformed_detail(
            item_id,
            &format!("no element tagged '{CALL_NUMBER_TEST_ID}'"),
        ));
    };
    let Some(value) = container.select(&VALUE_SELECTOR).next() else {
        return Err(CatalogError::malformed_detail(
            item_id,
            &format!("'{CALL_NUMBER_TEST_ID}' has no value element"),
        ));
    };

    non_blank(&element_text(&value))
        .ok_or_else(|| CatalogError::malformed_detail(item_id, "call number value is empty"))
}

/// Extracts the numeric item identifier from a full record link.
///
/// `https://seattle.bibliocommons.com/item/show/2837203030_moby_dick` yields
/// `2837203030`. Bare paths are accepted as well.
///
/// # Errors
///
/// Returns [`CatalogError::UnstableApi`] when the path no longer starts with
/// `/item/show/`, or the slug no longer starts with a run of digits.
pub fn extract_item_id(link: &str) -> Result<u64, CatalogError> {
    let path = match Url::parse(link) {
        Ok(url) => url.path().to_string(),
        Err(_) => link.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    if !path.starts_with(ITEM_PATH_PREFIX) {
        return Err(CatalogError::unstable_api(
            link,
            "full record link no longer starts with /item/show/",
        ));
    }

    let slug = path.rsplit('/').next().unwrap_or_default();
    let item_id = slug.split('_').next().unwrap_or_default();
    if item_id.is_empty() || !item_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CatalogError::unstable_api(
            link,
            "item slug no longer starts with a numeric id",
        ));
    }

    item_id
        .parse()
        .map_err(|_| CatalogError::unstable_api(link, "numeric item id is out of range"))
}

/// Text of the first `target` element following the `<b>` carrying `label`.
fn element_after_label(
    fragment: &Html,
    candidates: &Selector,
    label: &str,
    target: &str,
) -> Option<String> {
    let mut label_seen = false;
    for element in fragment.select(candidates) {
        let name = element.value().name();
        if !label_seen {
            label_seen = name == "b" && element_text(&element) == label;
        } else if name == target {
            return Some(element_text(&element));
        }
    }
    None
}

/// The text node directly after the `<b>` carrying `label`.
fn text_after_label(fragment: &Html, label: &str) -> Option<String> {
    let label: ElementRef<'_> = fragment
        .select(&LABEL_SELECTOR)
        .find(|element| element_text(element) == label)?;
    label
        .next_sibling()
        .and_then(|node| node.value().as_text().and_then(|text| non_blank(text)))
}
