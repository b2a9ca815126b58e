//! Ordered CSS-selector strategies shared by the HTML providers.
//!
//! Each field is looked up with a list of alternative selectors; the first one
//! that yields non-empty text wins.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

use crate::models::current_year;

static YEAR: OnceLock<Regex> = OnceLock::new();
static NUMBER: OnceLock<Regex> = OnceLock::new();

fn year_pattern() -> &'static Regex {
    YEAR.get_or_init(|| Regex::new(r"\d{4}").expect("valid year pattern"))
}

fn number_pattern() -> &'static Regex {
    NUMBER.get_or_init(|| Regex::new(r"\d+").expect("valid number pattern"))
}

/// Collapse an element's text nodes into a single trimmed line
pub(crate) fn element_text(elem: &ElementRef) -> String {
    elem.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First element matched by any of the selectors, tried in order
pub(crate) fn first_match<'a>(elem: &ElementRef<'a>, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|raw| {
        let selector = Selector::parse(raw).ok()?;
        elem.select(&selector).next()
    })
}

/// Text of the first selector that yields non-empty text
pub(crate) fn first_text(elem: &ElementRef, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|raw| {
        let selector = Selector::parse(raw).ok()?;
        elem.select(&selector)
            .map(|found| element_text(&found))
            .find(|text| !text.is_empty())
    })
}

/// Record elements from the first selector that matches anything
pub(crate) fn first_records<'a>(document: &'a Html, selectors: &[&str]) -> Vec<ElementRef<'a>> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let records: Vec<_> = document.select(&selector).collect();
        if !records.is_empty() {
            tracing::debug!(selector = raw, count = records.len(), "matched records");
            return records;
        }
    }
    Vec::new()
}

/// Earliest year accepted as a publication year
pub(crate) const EARLIEST_YEAR: i32 = 1900;

/// The first four-digit run that is a plausible publication year
///
/// Accepts `EARLIEST_YEAR` through next year, so counts such as "1500" in
/// a result row are not mistaken for a year.
pub(crate) fn find_year(text: &str) -> Option<i32> {
    let latest = current_year() + 1;
    year_pattern()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<i32>().ok())
        .find(|year| (EARLIEST_YEAR..=latest).contains(year))
}

/// The first run of digits in the text
pub(crate) fn find_number(text: &str) -> Option<u32> {
    number_pattern()
        .find(text)
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// Strip every four-digit run from the text
pub(crate) fn strip_years(text: &str) -> String {
    year_pattern().replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = r#"
        <div class="row">
            <span class="empty">   </span>
            <span class="title"> Graph <b>Neural</b>   Networks </span>
            <a class="link" href="/detail/1">x</a>
        </div>"#;

    #[test]
    fn test_first_text_skips_empty_strategies() {
        let html = Html::parse_fragment(ROW);
        let root = html.root_element();
        assert_eq!(
            first_text(&root, &["span.missing", "span.empty", "span.title"]),
            Some("Graph Neural Networks".to_string())
        );
        assert_eq!(first_text(&root, &["span.missing"]), None);
    }

    #[test]
    fn test_first_match_ignores_invalid_selectors() {
        let html = Html::parse_fragment(ROW);
        let root = html.root_element();
        let link = first_match(&root, &["a[[", "a.link"]).unwrap();
        assert_eq!(link.value().attr("href"), Some("/detail/1"));
    }

    #[test]
    fn test_first_records_fallback() {
        let html = Html::parse_document("<ul><li class='item'>a</li><li class='item'>b</li></ul>");
        assert_eq!(first_records(&html, &["tr.row", "li.item"]).len(), 2);
        assert!(first_records(&html, &["tr.row"]).is_empty());
    }

    #[test]
    fn test_numbers_and_years() {
        assert_eq!(find_year("Nature, 2015 - nature.com"), Some(2015));
        assert_eq!(find_year("no year"), None);
        assert_eq!(find_year("被引 1500 次"), None);
        assert_eq!(find_year("下载 1500 次 发表于 2016 年"), Some(2016));
        assert_eq!(find_year("1899"), None);
        assert_eq!(find_year(&(current_year() + 1).to_string()), Some(current_year() + 1));
        assert_eq!(find_year(&(current_year() + 2).to_string()), None);
        assert_eq!(find_number("Cited by 1234"), Some(1234));
        assert_eq!(find_number("被引 56 次"), Some(56));
        assert_eq!(strip_years("Nature, 2015").trim(), "Nature,");
    }
}
