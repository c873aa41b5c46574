//! Extraction of trainer entries from the friend-code listing markup.
//!
//! The page is parsed into a DOM tree and queried with CSS selectors. Every
//! entry container is handled on its own: a missing sub-element degrades that
//! field to its sentinel and never affects the other entries on the page.

use std::sync::LazyLock;

use pogo_core::{
    normalize_friend_code, FriendRecord, Team, NO_CODE, UNKNOWN_LEVEL, UNKNOWN_LOCATION,
    UNKNOWN_NAME,
};
use regex::Regex;
use scraper::node::Element;
use scraper::{ElementRef, Html, Selector};

/// Class-token fragment that marks an entry container.
const CONTAINER_MARKER: &str = "comment-bubble";

/// Links under this path point at trainer profiles, not locations.
const TRAINER_PROFILE_PREFIX: &str = "/trainer";

static CONTAINER_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[class*="comment-bubble"]"#).expect("valid container selector")
});
static NAME_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6, header").expect("valid name selector")
});
static CODE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong").expect("valid code selector"));
static CONTENT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[class*="content"]"#).expect("valid content selector")
});
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("valid anchor selector"));
static LEVEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blevel\s*:?\s*([0-9]+)").expect("valid level regex"));

/// Parses `markup` and returns one candidate per entry container, in
/// document order.
///
/// Empty or unparseable markup yields an empty vector. Containers nested
/// inside another container are part of their parent entry and are not
/// reported separately.
#[must_use]
pub fn extract_friend_records(markup: &str) -> Vec<FriendRecord> {
    if markup.trim().is_empty() {
        return Vec::new();
    }

    let document = Html::parse_document(markup);
    let records: Vec<FriendRecord> = document
        .select(&CONTAINER_SELECTOR)
        .filter(|el| !has_container_ancestor(*el))
        .map(extract_record)
        .collect();

    tracing::debug!(count = records.len(), "extracted candidate records");
    records
}

fn extract_record(container: ElementRef<'_>) -> FriendRecord {
    FriendRecord {
        name: extract_name(container),
        level: extract_level(container),
        code: extract_code(container),
        location: extract_location(container),
        team: extract_team(container),
    }
}

/// Class tokens are read from the raw attribute so document order is kept.
fn extract_team(container: ElementRef<'_>) -> Team {
    let classes = container.value().attr("class").unwrap_or_default();
    Team::from_class_tokens(classes.split_whitespace())
}

fn extract_name(container: ElementRef<'_>) -> String {
    container
        .select(&NAME_SELECTOR)
        .next()
        .map(collapsed_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_NAME.to_owned())
}

fn extract_level(container: ElementRef<'_>) -> String {
    let text = container.text().collect::<Vec<_>>().join(" ");
    LEVEL_RE
        .captures(&text)
        .map_or_else(|| UNKNOWN_LEVEL.to_owned(), |caps| caps[1].to_owned())
}

/// Takes the first `<strong>` in the entry. A 4-4-4 digit group inside it is
/// normalised; anything else is kept verbatim so the reconciler can reject it.
fn extract_code(container: ElementRef<'_>) -> String {
    let Some(strong) = container.select(&CODE_SELECTOR).next() else {
        return NO_CODE.to_owned();
    };
    let text = collapsed_text(strong);
    if text.is_empty() {
        return NO_CODE.to_owned();
    }
    normalize_friend_code(&text).unwrap_or(text)
}

fn extract_location(container: ElementRef<'_>) -> String {
    let scope = container
        .select(&CONTENT_SELECTOR)
        .next()
        .unwrap_or(container);

    let places: Vec<String> = scope
        .select(&ANCHOR_SELECTOR)
        .filter(|a| {
            a.value()
                .attr("href")
                .is_none_or(|href| !is_trainer_profile(href))
        })
        .map(collapsed_text)
        .filter(|s| !s.is_empty())
        .collect();

    if places.is_empty() {
        UNKNOWN_LOCATION.to_owned()
    } else {
        places.join(", ")
    }
}

fn collapsed_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_container(element: &Element) -> bool {
    element.classes().any(|c| c.contains(CONTAINER_MARKER))
}

fn has_container_ancestor(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(|node| node.value().as_element())
        .any(is_container)
}

/// Whether `href` points at a trainer profile, for relative
/// (`/trainer/ash`), protocol-relative and absolute links alike.
fn is_trainer_profile(href: &str) -> bool {
    let href = href.trim();
    let without_authority = if let Some((_, rest)) = href.split_once("://") {
        Some(rest)
    } else {
        href.strip_prefix("//")
    };
    let path = match without_authority {
        Some(rest) => rest.find('/').map_or("", |i| &rest[i..]),
        None => href,
    };
    path.starts_with(TRAINER_PROFILE_PREFIX)
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
