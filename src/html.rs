use anyhow::{Result, anyhow};
use scraper::{ElementRef, Selector};

pub fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css:?}: {e:?}"))
}

/// Direct element children, skipping text and comment nodes.
pub fn element_children<'a>(el: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap).collect()
}

/// Element text with whitespace runs collapsed.
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a displayed number such as `55.3%`, `1,204` or ` 7 `.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw
        .trim()
        .trim_end_matches('%')
        .replace(',', "")
        .trim()
        .to_string();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::parse_number;

    #[test]
    fn parse_number_handles_display_forms() {
        assert_eq!(parse_number("55.3%"), Some(55.3));
        assert_eq!(parse_number("1,204"), Some(1204.0));
        assert_eq!(parse_number(" 7 "), Some(7.0));
        assert_eq!(parse_number("-"), None);
    }
}
