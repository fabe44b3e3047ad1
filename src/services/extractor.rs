use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{
    domain::{DataType, ExtractedRecord},
    error::ScrapeError,
    services::FetchedPage,
};

pub fn compile_selector(raw: &str) -> Result<Selector, ScrapeError> {
    if raw.trim().is_empty() {
        return Err(ScrapeError::BadRequest(
            "selector must be a non-empty string".to_string(),
        ));
    }
    Selector::parse(raw)
        .map_err(|e| ScrapeError::BadRequest(format!("invalid selector {:?}: {}", raw, e)))
}

pub fn compile_selectors(raw: &[String]) -> Result<Vec<Selector>, ScrapeError> {
    raw.iter().map(|s| compile_selector(s)).collect()
}

/// Evaluate every selector against the page. With data types present, each
/// match yields one record per requested type; without them, each match
/// yields one composite record combining its text and every attribute.
/// Record order: selector order, then document order, then type order.
pub fn extract(
    page: &FetchedPage,
    selectors: &[Selector],
    data_types: &[DataType],
) -> Vec<ExtractedRecord> {
    let title_selector = Selector::parse("title").unwrap();
    let document = Html::parse_document(&page.body);

    let mut records: Vec<ExtractedRecord> = Vec::new();
    for selector in selectors {
        for element in document.select(selector) {
            if data_types.is_empty() {
                if let Some(content) = combined_content(&element) {
                    records.push(ExtractedRecord {
                        data_type: "all".to_string(),
                        content,
                    });
                }
                continue;
            }

            for data_type in data_types {
                if let Some(content) =
                    typed_content(&element, data_type, &title_selector, &page.url)
                {
                    records.push(ExtractedRecord {
                        data_type: data_type.tag().to_string(),
                        content,
                    });
                }
            }
        }
    }
    records
}

fn typed_content(
    element: &ElementRef,
    data_type: &DataType,
    title_selector: &Selector,
    base: &Url,
) -> Option<String> {
    match data_type {
        DataType::Text => Some(element_text(element)),
        DataType::Title => Some(
            element
                .select(title_selector)
                .next()
                .map(|title| element_text(&title))
                .unwrap_or_default(),
        ),
        // Absent href still yields an empty record so positions line up
        // with the other requested types.
        DataType::Link => Some(
            element
                .attr("href")
                .map(|href| resolve_url(base, href))
                .unwrap_or_default(),
        ),
        DataType::Attribute(name) => element.attr(name).map(|value| value.to_string()),
    }
}

fn combined_content(element: &ElementRef) -> Option<String> {
    let mut pieces: Vec<String> = Vec::new();

    let text = element_text(element);
    if !text.is_empty() {
        pieces.push(format!("Text: {}", text));
    }
    for (name, value) in element.value().attrs() {
        pieces.push(format!("{}: {}", capitalize(name), value));
    }
    if let Some(href) = element.attr("href") {
        pieces.push(format!("Href: {}", href));
    }

    match pieces.is_empty() {
        true => None,
        false => Some(pieces.join(" ")),
    }
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn resolve_url(base: &Url, href: &str) -> String {
    match base.join(href) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => href.to_string(),
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// First anchor, in document order, whose resolved href contains the
/// fragment as a substring. No match means no next page.
pub fn find_next_page(page: &FetchedPage, fragment: &str) -> Option<Url> {
    let anchor_selector = Selector::parse("a[href]").unwrap();
    let document = Html::parse_document(&page.body);

    document
        .select(&anchor_selector)
        .filter_map(|anchor| anchor.attr("href"))
        .filter_map(|href| page.url.join(href).ok())
        .find(|resolved| resolved.as_str().contains(fragment))
}

/// Distinct tag names of the matched elements, first-seen order. Empty
/// exactly when the selector matched nothing.
pub fn matched_tag_names(page: &FetchedPage, selector: &Selector) -> Vec<String> {
    let document = Html::parse_document(&page.body);

    document
        .select(selector)
        .map(|element| element.value().name().to_string())
        .unique()
        .collect()
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::{compile_selector, compile_selectors, extract, find_next_page, matched_tag_names};
    use crate::{
        domain::{DataType, ExtractedRecord},
        services::FetchedPage,
    };

    fn page(body: &str) -> FetchedPage {
        FetchedPage {
            url: Url::parse("https://example.com/list/1").unwrap(),
            body: body.to_string(),
        }
    }

    fn record(data_type: &str, content: &str) -> ExtractedRecord {
        ExtractedRecord {
            data_type: data_type.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn text_href_and_attribute_extraction() {
        let page = page(r#"<html><body><a href="/x" data-id="7">hi</a></body></html>"#);
        let selectors = compile_selectors(&["a".to_string()]).unwrap();
        let types = vec![
            DataType::Text,
            DataType::Link,
            DataType::Attribute("data-id".to_string()),
        ];

        let records = extract(&page, &selectors, &types);

        assert_eq!(
            records,
            vec![
                record("text", "hi"),
                record("link", "https://example.com/x"),
                record("data-id", "7"),
            ]
        );
    }

    #[test]
    fn missing_attribute_is_skipped_but_missing_href_is_empty() {
        let page = page(r#"<html><body><a href="/x">one</a><a>two</a></body></html>"#);
        let selectors = compile_selectors(&["a".to_string()]).unwrap();
        let types = vec![
            DataType::Link,
            DataType::Attribute("data-id".to_string()),
        ];

        let records = extract(&page, &selectors, &types);

        assert_eq!(
            records,
            vec![record("link", "https://example.com/x"), record("link", "")]
        );
    }

    #[test]
    fn title_type_reads_first_title_descendant() {
        let page = page(
            r#"<html><head><title>Page One</title></head><body><p>x</p></body></html>"#,
        );
        let selectors = compile_selectors(&["html".to_string()]).unwrap();

        let records = extract(&page, &selectors, &[DataType::Title]);

        assert_eq!(records, vec![record("title", "Page One")]);
    }

    #[test]
    fn title_type_without_descendant_yields_empty_string() {
        let page = page(r#"<html><body><p>x</p></body></html>"#);
        let selectors = compile_selectors(&["p".to_string()]).unwrap();

        let records = extract(&page, &selectors, &[DataType::Title]);

        assert_eq!(records, vec![record("title", "")]);
    }

    #[test]
    fn zero_matches_yield_empty_result() {
        let page = page(r#"<html><body><p>x</p></body></html>"#);
        let selectors = compile_selectors(&[".missing".to_string()]).unwrap();

        let records = extract(&page, &selectors, &[DataType::Text]);

        assert!(records.is_empty());
    }

    #[test]
    fn records_are_ordered_by_match_then_requested_type() {
        let page = page(
            r#"<html><body><a href="/1">one</a><a href="/2">two</a></body></html>"#,
        );
        let selectors = compile_selectors(&["a".to_string()]).unwrap();
        let types = vec![DataType::Text, DataType::Link];

        let records = extract(&page, &selectors, &types);

        assert_eq!(
            records,
            vec![
                record("text", "one"),
                record("link", "https://example.com/1"),
                record("text", "two"),
                record("link", "https://example.com/2"),
            ]
        );
    }

    #[test]
    fn no_data_types_produces_composite_records() {
        let page = page(r#"<html><body><a href="/x" rel="next">hi</a></body></html>"#);
        let selectors = compile_selectors(&["a".to_string()]).unwrap();

        let records = extract(&page, &selectors, &[]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data_type, "all");
        assert_eq!(records[0].content, "Text: hi Href: /x Rel: next Href: /x");
    }

    #[test]
    fn composite_mode_skips_bare_elements() {
        let page = page(r#"<html><body><span></span><span id="s">x</span></body></html>"#);
        let selectors = compile_selectors(&["span".to_string()]).unwrap();

        let records = extract(&page, &selectors, &[]);

        assert_eq!(records, vec![record("all", "Text: x Id: s")]);
    }

    #[test]
    fn next_page_picks_first_anchor_containing_fragment() {
        let page = page(
            r#"<html><body>
                <a href="/about">about</a>
                <a href="/page/2">next</a>
                <a href="/page/3">later</a>
            </body></html>"#,
        );

        let next = find_next_page(&page, "/page/");

        assert_eq!(
            next.map(|u| u.to_string()),
            Some("https://example.com/page/2".to_string())
        );
    }

    #[test]
    fn next_page_resolves_relative_hrefs() {
        let page = page(r#"<html><body><a href="2?p=1">next</a></body></html>"#);

        let next = find_next_page(&page, "p=1");

        assert_eq!(
            next.map(|u| u.to_string()),
            Some("https://example.com/list/2?p=1".to_string())
        );
    }

    #[test]
    fn no_matching_anchor_means_no_next_page() {
        let page = page(r#"<html><body><a href="/about">about</a></body></html>"#);

        assert!(find_next_page(&page, "/page/").is_none());
    }

    #[test]
    fn matched_tag_names_deduplicate_in_first_seen_order() {
        let page = page(
            r#"<html><body><div class="c">
                <p>one</p><span>x</span><p>two</p>
            </div></body></html>"#,
        );
        let selector = compile_selector("div.c p, div.c span").unwrap();

        let names = matched_tag_names(&page, &selector);

        assert_eq!(names, vec!["p".to_string(), "span".to_string()]);
    }

    #[test]
    fn empty_and_invalid_selectors_are_rejected() {
        assert!(compile_selector("  ").is_err());
        assert!(compile_selector("p[").is_err());
        assert!(compile_selector("a[href]").is_ok());
    }
}
