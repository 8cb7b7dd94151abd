use scraper::{Html, Selector};

/// Trimmed text of the first match; `None` when nothing matches or the text is blank.
pub fn select_text(doc: &Html, sel: &Selector) -> Option<String> {
    let node = doc.select(sel).next()?;
    let text = node.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() { None } else { Some(text.to_string()) }
}

pub fn select_attr(doc: &Html, sel: &Selector, attr: &str) -> Option<String> {
    let node = doc.select(sel).next()?;
    let value = node.value().attr(attr)?.trim();
    if value.is_empty() { None } else { Some(value.to_string()) }
}

/// Protocol-relative urls (`//host/...`) get an `https:` scheme; everything else is kept.
pub fn fix_poster_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    }
}
