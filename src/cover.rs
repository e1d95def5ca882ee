//! Cover image references: swap a thumbnail for its large variant.
//!
//! Two naming conventions are understood: Goodreads-style paths
//! (`/books/<slug><size>/<id>.jpg`) and the Syndetics jacket service the
//! catalog embeds in search results (`index.aspx?isbn=<isbn>/<size>C.GIF`).

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::catalog::utils::compile_static_regex;
use crate::diagnostics::Diagnostics;

/// Path prefix of the placeholder served when a book has no known cover.
pub const NO_PHOTO_PREFIX: &str = "/assets/nophoto";

/// Goodreads-style thumbnail path: `/books/<slug><size>/<id>.jpg`, size one of s/m/l.
static THUMBNAIL_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"^/books/(?P<slug>\d*)(?P<size>[sml])/(?P<id>\d*)\.jpg$")
});

/// Syndetics size code inside the `isbn` query value: `SC`, `MC` or `LC`.
static SYNDETICS_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?i)^(?P<isbn>[^/]*/)(?P<size>[sml])(?P<ext>c\.(?:gif|jpg))$")
});

const SYNDETICS_HOST_SUFFIX: &str = "syndetics.com";

/// Rewrites a cover image reference to the large variant.
///
/// Accepts absolute URLs or bare paths. The "no photo" placeholder and any
/// reference that does not follow the thumbnail convention come back unchanged;
/// the latter also emits a warning, since it means the naming scheme drifted.
/// Applying this to its own output returns the same value.
#[must_use]
pub fn higher_quality_cover(image_url: &str, diagnostics: &dyn Diagnostics) -> String {
    match Url::parse(image_url) {
        Ok(mut parsed) => {
            if parsed
                .host_str()
                .is_some_and(|host| host.ends_with(SYNDETICS_HOST_SUFFIX))
            {
                return larger_syndetics(&parsed, diagnostics)
                    .unwrap_or_else(|| image_url.to_string());
            }
            let Some(larger_path) = larger_path(parsed.path(), diagnostics) else {
                return image_url.to_string();
            };
            parsed.set_path(&larger_path);
            parsed.to_string()
        }
        Err(_) => {
            let split_at = image_url.find(['?', '#']).unwrap_or(image_url.len());
            let (path, suffix) = image_url.split_at(split_at);
            match larger_path(path, diagnostics) {
                Some(larger_path) => format!("{larger_path}{suffix}"),
                None => image_url.to_string(),
            }
        }
    }
}

fn larger_syndetics(url: &Url, diagnostics: &dyn Diagnostics) -> Option<String> {
    let mut found = false;
    let mut pairs = Vec::new();
    for (key, value) in url.query_pairs() {
        let value = if key.eq_ignore_ascii_case("isbn") {
            let Some(caps) = SYNDETICS_SIZE_RE.captures(&value) else {
                warn_format_changed(diagnostics, url.as_str());
                return None;
            };
            found = true;
            format!("{}L{}", &caps["isbn"], &caps["ext"])
        } else {
            value.into_owned()
        };
        pairs.push((key.into_owned(), value));
    }
    if !found {
        warn_format_changed(diagnostics, url.as_str());
        return None;
    }

    let mut larger = url.clone();
    larger.query_pairs_mut().clear().extend_pairs(pairs);
    Some(larger.to_string())
}

fn larger_path(path: &str, diagnostics: &dyn Diagnostics) -> Option<String> {
    if path.starts_with(NO_PHOTO_PREFIX) {
        return None;
    }

    let Some(caps) = THUMBNAIL_PATH_RE.captures(path) else {
        warn_format_changed(diagnostics, path);
        return None;
    };

    Some(format!("/books/{}l/{}.jpg", &caps["slug"], &caps["id"]))
}

fn warn_format_changed(diagnostics: &dyn Diagnostics, reference: &str) {
    diagnostics.warn(&format!(
        "Cover image format changed! ({reference}) Returning original quality image."
    ));
}
