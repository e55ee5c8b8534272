use lazy_static::lazy_static;
use scraper::{Html, Selector};

use super::ExtractConfig;

pub const ELLIPSIS: char = '…';

lazy_static! {
    static ref NON_CONTENT: Selector = Selector::parse("script, style, nav, header, footer").unwrap();
    static ref PARAGRAPH: Selector = Selector::parse("p").unwrap();
}

/// Turn raw markup into a short plain text excerpt.
///
/// Scripts, styles and page chrome (nav, header, footer) are detached from the
/// document first. The first `max_paragraphs` paragraphs are then considered
/// and those longer than `min_paragraph_length` characters are joined with a
/// space. Output longer than `max_length` is cut there and gets an ellipsis.
/// An empty string means the page had nothing worth quoting.
pub fn extract_text(html: &str, config: &ExtractConfig) -> String {
    let mut document = Html::parse_document(html);

    let removed: Vec<_> = document.select(&NON_CONTENT).map(|el| el.id()).collect();
    for id in removed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    // detached nodes stay in the arena, so walk from the live root
    let paragraphs: Vec<String> = document
        .root_element()
        .select(&PARAGRAPH)
        .take(config.max_paragraphs)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|text| text.chars().count() > config.min_paragraph_length)
        .collect();

    truncate(paragraphs.join(" "), config.max_length)
}

fn truncate(text: String, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text;
    }
    let mut cut: String = text.chars().take(max_length).collect();
    cut.push(ELLIPSIS);
    cut
}
