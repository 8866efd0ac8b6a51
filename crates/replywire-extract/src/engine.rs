//! Extraction engine — applies a selector set to a page snapshot and
//! returns the newest matching message text.
//!
//! Extraction never faults: every failure mode (no match, bad selector,
//! malformed query) comes back as a soft `ScrapeResult` so the polling loop
//! keeps running.

use std::collections::HashMap;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector as CssSelector};
use tracing::debug;

use crate::path;
use crate::types::{ScrapeResult, Selector, SelectorKind};

/// Class markers identifying self-authored messages. Elements carrying one
/// of these anywhere in their ancestry are skipped so the operator's own
/// replies are never relayed back out as new input.
const SELF_AUTHORED_MARKERS: &[&str] = &["outgoing", "self", "sent"];

/// Conventional locations for a counterpart identifier. Best-effort;
/// absence is not an error.
const AUXILIARY_LOCATORS: &[&str] = &[
    "[data-address]",
    ".sender-address",
    ".conversation-participant",
];

/// Apply the selector set to an HTML snapshot.
///
/// CSS matches union into one result list and path-query matches into
/// another; the newest (last in document order) incoming match with
/// non-empty text wins.
pub fn extract(html: &str, selectors: &[Selector]) -> ScrapeResult {
    if selectors.is_empty() {
        return ScrapeResult::miss("no selectors provided");
    }

    let doc = Html::parse_document(html);

    let mut css_matches: Vec<ElementRef<'_>> = Vec::new();
    let mut path_matches: Vec<ElementRef<'_>> = Vec::new();
    for selector in selectors {
        match selector.kind() {
            SelectorKind::Css => {
                let parsed = match CssSelector::parse(selector.expression()) {
                    Ok(p) => p,
                    Err(e) => {
                        debug!("CSS selector '{}' failed to parse: {}", selector.expression(), e);
                        return ScrapeResult::miss(format!(
                            "invalid CSS selector '{}': {}",
                            selector.expression(),
                            e
                        ));
                    }
                };
                css_matches.extend(doc.select(&parsed));
            }
            SelectorKind::PathQuery => match path::evaluate(&doc, selector.expression()) {
                Ok(els) => path_matches.extend(els),
                Err(e) => {
                    debug!("path query '{}' failed: {}", selector.expression(), e);
                    return ScrapeResult::miss(format!("path query failed: {}", e));
                }
            },
        }
    }

    let order = document_order(&doc);
    let mut candidates: Vec<(usize, ElementRef<'_>)> = css_matches
        .into_iter()
        .chain(path_matches)
        .filter(|el| !is_self_authored(el))
        .filter_map(|el| order.get(&el.id()).map(|pos| (*pos, el)))
        .collect();
    candidates.sort_by_key(|(pos, _)| *pos);
    candidates.dedup_by_key(|(pos, _)| *pos);

    let newest = candidates
        .iter()
        .rev()
        .map(|(_, el)| element_text(el))
        .find(|text| !text.is_empty());

    match newest {
        Some(text) => {
            let auxiliary = extract_auxiliary(&doc);
            ScrapeResult::matched(text, auxiliary)
        }
        None => ScrapeResult::miss("No elements matched the provided selectors"),
    }
}

/// Trimmed text content; input/textarea controls fall back to their value.
fn element_text(el: &ElementRef<'_>) -> String {
    let text = el.text().collect::<String>().trim().to_string();
    if !text.is_empty() {
        return text;
    }
    if matches!(el.value().name(), "input" | "textarea") {
        if let Some(value) = el.value().attr("value") {
            return value.trim().to_string();
        }
    }
    text
}

fn is_self_authored(el: &ElementRef<'_>) -> bool {
    let marked = |candidate: &ElementRef<'_>| {
        candidate
            .value()
            .classes()
            .any(|class| SELF_AUTHORED_MARKERS.contains(&class))
    };
    if marked(el) {
        return true;
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| marked(&ancestor))
}

fn extract_auxiliary(doc: &Html) -> Option<String> {
    for locator in AUXILIARY_LOCATORS {
        let Ok(selector) = CssSelector::parse(locator) else {
            continue;
        };
        if let Some(el) = doc.select(&selector).next() {
            let raw = el.text().collect::<String>();
            let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            if !normalized.is_empty() {
                return Some(normalized);
            }
        }
    }
    None
}

fn document_order(doc: &Html) -> HashMap<NodeId, usize> {
    doc.tree
        .root()
        .descendants()
        .enumerate()
        .map(|(pos, node)| (node.id(), pos))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_match_wins() {
        let html = r#"
            <div class="msg">hi</div>
            <div class="msg">hi</div>
            <div class="msg">bye</div>
        "#;
        let result = extract(html, &[Selector::css(".msg")]);
        assert!(result.ok);
        assert_eq!(result.text.as_deref(), Some("bye"));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let html = r#"<p class="msg">  hello there  </p>"#;
        let selectors = [Selector::css(".msg")];
        let first = extract(html, &selectors);
        let second = extract(html, &selectors);
        assert_eq!(first.text, second.text);
        assert_eq!(first.text.as_deref(), Some("hello there"));
    }

    #[test]
    fn test_self_authored_messages_are_skipped() {
        let html = r#"
            <div class="msg">question</div>
            <div class="msg outgoing">my reply</div>
            <ul class="sent"><li class="msg">also mine</li></ul>
        "#;
        let result = extract(html, &[Selector::css(".msg")]);
        assert_eq!(result.text.as_deref(), Some("question"));
    }

    #[test]
    fn test_input_value_fallback() {
        let html = r#"<input class="msg" value=" draft text ">"#;
        let result = extract(html, &[Selector::css(".msg")]);
        assert_eq!(result.text.as_deref(), Some("draft text"));
    }

    #[test]
    fn test_auxiliary_token() {
        let html = r#"
            <span class="sender-address">  +1 555 0100 </span>
            <div class="msg">hey</div>
        "#;
        let result = extract(html, &[Selector::css(".msg")]);
        assert_eq!(result.auxiliary.as_deref(), Some("+1 555 0100"));
    }

    #[test]
    fn test_auxiliary_absence_is_not_an_error() {
        let result = extract(r#"<div class="msg">hey</div>"#, &[Selector::css(".msg")]);
        assert!(result.ok);
        assert!(result.auxiliary.is_none());
    }

    #[test]
    fn test_no_match_is_soft_failure() {
        let result = extract("<div>other</div>", &[Selector::css(".msg")]);
        assert!(!result.ok);
        assert!(result.text.is_none());
        assert!(result.error.is_some());
    }

    #[test]
    fn test_empty_only_matches_are_a_miss() {
        let result = extract(r#"<div class="msg">   </div>"#, &[Selector::css(".msg")]);
        assert!(!result.ok);
    }

    #[test]
    fn test_invalid_selector_is_soft_failure() {
        let result = extract("<div></div>", &[Selector::css(":::nope")]);
        assert!(!result.ok);
        assert!(result.error.unwrap().contains("invalid CSS selector"));
    }

    #[test]
    fn test_no_selectors_is_soft_failure() {
        let result = extract("<div></div>", &[]);
        assert!(!result.ok);
    }

    #[test]
    fn test_css_and_path_union_by_document_order() {
        let html = r#"
            <div class="msg">from css</div>
            <section><p>from path</p></section>
        "#;
        let selectors = [Selector::css(".msg"), Selector::path_query("//section/p")];
        let result = extract(html, &selectors);
        // The path match appears later in document order.
        assert_eq!(result.text.as_deref(), Some("from path"));
    }

    #[test]
    fn test_empty_newest_falls_back_to_earlier_match() {
        let html = r#"
            <div class="msg">real text</div>
            <div class="msg"></div>
        "#;
        let result = extract(html, &[Selector::css(".msg")]);
        assert_eq!(result.text.as_deref(), Some("real text"));
    }
}
