use crate::core::extractor::TextBlock;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];
const TEAM_CONTAINER_KEYWORDS: &[&str] = &["team", "staff", "people", "membri", "persone"];
const CARD_KEYWORDS: &[&str] = &["member", "person", "card", "profile", "membro"];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Everything the website source needs from one HTML page. Owned, so the
/// parsed document never lives across an await point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    pub text: String,
    pub mailto: Vec<String>,
    pub tel: Vec<String>,
    pub footer: String,
    pub team: Vec<TextBlock>,
}

pub fn parse_page(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        text: visible_text(document.root_element()),
        mailto: link_targets(&document, "mailto:"),
        tel: link_targets(&document, "tel:"),
        footer: footer_text(&document),
        team: team_blocks(&document),
    }
}

/// Text of `element` minus scripts and styles, whitespace collapsed. Text
/// nodes are joined with newlines so block boundaries survive.
pub fn visible_text(element: ElementRef<'_>) -> String {
    text_pieces(element).join("\n")
}

fn text_pieces(element: ElementRef<'_>) -> Vec<String> {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|e| SKIPPED_TAGS.contains(&e.name()))
            });
            if hidden {
                return None;
            }
            let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!collapsed.is_empty()).then_some(collapsed)
        })
        .collect()
}

fn link_targets(document: &Html, scheme: &str) -> Vec<String> {
    let links = selector("a[href]");
    let mut seen = HashSet::new();
    document
        .select(&links)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| {
            let href = href.trim();
            let prefix = href.get(..scheme.len())?;
            if !prefix.eq_ignore_ascii_case(scheme) {
                return None;
            }
            let target = href[scheme.len()..]
                .trim_start_matches("//")
                .split('?')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            (!target.is_empty()).then_some(target)
        })
        .filter(|target| seen.insert(target.clone()))
        .collect()
}

fn footer_text(document: &Html) -> String {
    let footers = selector(r#"footer, [id*="footer"], [class*="footer"]"#);
    let mut pieces: Vec<String> = Vec::new();
    for footer in document.select(&footers) {
        // nested matches repeat their parent's text
        let nested = footer
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| footers.matches(&a));
        if !nested {
            pieces.push(visible_text(footer));
        }
    }
    pieces.join("\n")
}

fn class_contains(element: &ElementRef<'_>, keywords: &[&str]) -> bool {
    element
        .value()
        .attr("class")
        .map(str::to_lowercase)
        .is_some_and(|class| keywords.iter().any(|k| class.contains(k)))
}

/// Name/detail pairs from team listings: a container whose class mentions
/// team or staff, holding cards whose class mentions member, person, card or
/// profile. The first heading-like element of a card is its label.
pub fn team_blocks(document: &Html) -> Vec<TextBlock> {
    let containers = selector("div[class], section[class], ul[class]");
    let cards = selector("div[class], article[class], li[class]");
    let names = selector("h2, h3, h4, h5, strong, span");
    let roles = selector("p[class], span[class], div[class]");
    let mut blocks = Vec::new();

    for container in document
        .select(&containers)
        .filter(|c| class_contains(c, TEAM_CONTAINER_KEYWORDS))
    {
        for card in container
            .select(&cards)
            .filter(|c| class_contains(c, CARD_KEYWORDS))
        {
            let Some(label) = card
                .select(&names)
                .map(|e| text_pieces(e).join(" "))
                .find(|t| !t.is_empty())
            else {
                continue;
            };

            let role = card
                .select(&roles)
                .find(|e| class_contains(e, &["role", "ruolo", "position", "title", "job"]))
                .map(|e| text_pieces(e).join(" "));

            let mut details: Vec<String> = role.into_iter().collect();
            let mut label_skipped = false;
            for piece in text_pieces(card) {
                if !label_skipped && piece == label {
                    label_skipped = true;
                    continue;
                }
                if !details.contains(&piece) {
                    details.push(piece);
                }
            }

            blocks.push(TextBlock::new(label, details.join("\n")));
        }
    }

    blocks
}

/// One organic result of the HTML search endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchHit {
    pub fn text(&self) -> String {
        format!("{}\n{}", self.title, self.snippet)
    }
}

pub fn search_hits(html: &str) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let results = selector(".result");
    let titles = selector(".result__a");
    let snippets = selector(".result__snippet");

    document
        .select(&results)
        .filter_map(|result| {
            let title = result.select(&titles).next()?;
            let url = title
                .value()
                .attr("href")
                .map(resolve_result_url)
                .unwrap_or_default();
            let snippet = result
                .select(&snippets)
                .next()
                .map(|s| text_pieces(s).join(" "))
                .unwrap_or_default();

            Some(SearchHit {
                title: text_pieces(title).join(" "),
                url,
                snippet,
            })
        })
        .collect()
}

/// Result links may be wrapped in a redirect carrying the target in `uddg`.
fn resolve_result_url(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    match Url::parse(&absolute) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, target)| target.into_owned())
            .unwrap_or(absolute),
        Err(_) => absolute,
    }
}

/// Search results page in the shape `search_hits` reads.
#[cfg(test)]
pub(crate) fn results_page(hits: &[(&str, &str, &str)]) -> String {
    let results: String = hits
        .iter()
        .map(|(url, title, snippet)| {
            format!(
                r#"<div class="result"><a class="result__a" href="{}">{}</a><a class="result__snippet">{}</a></div>"#,
                url, title, snippet
            )
        })
        .collect();
    format!(r#"<html><body><div class="results">{}</div></body></html>"#, results)
}
