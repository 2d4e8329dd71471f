use anyhow::Result;
use scraper::{ElementRef, Html};

use crate::html::{element_children, parse_number, selector, text_of};
use crate::model::{EntityKey, PlayerId, StatKind, StatTable, TeamName};

/// Parses a saved stats page into one table per statistic block.
///
/// Each block holds a header `div` (label in its last child) and a list of `li`
/// rows. Player rows link to `/player/<id>`; team rows carry the team name in
/// their second child. The value is always the last child.
pub fn parse_stats_page(html: &str, kind: StatKind) -> Result<Vec<StatTable>> {
    let document = Html::parse_document(html);
    let block_sel = selector("#stats-page-widget-react > div > div")?;
    let item_sel = selector("li")?;
    let link_sel = selector("a[href*=\"player/\"]")?;

    let mut tables = Vec::new();
    for block in document.select(&block_sel) {
        let Some(header) = element_children(block)
            .into_iter()
            .find(|el| el.value().name() == "div")
        else {
            continue;
        };
        let label = element_children(header)
            .last()
            .map(|el| text_of(*el))
            .unwrap_or_else(|| text_of(header));
        if label.is_empty() {
            continue;
        }

        let mut entries = Vec::new();
        for item in block.select(&item_sel) {
            let parsed = match kind {
                StatKind::Player => player_entry(item, &link_sel),
                StatKind::Team => team_entry(item),
            };
            match parsed {
                Some(entry) => entries.push(entry),
                None => log::debug!("{label}: unreadable row {:?}", text_of(item)),
            }
        }
        tables.push(StatTable { label, entries });
    }
    Ok(tables)
}

fn player_entry(item: ElementRef<'_>, link_sel: &scraper::Selector) -> Option<(EntityKey, f64)> {
    let href = item.select(link_sel).next()?.value().attr("href")?;
    let id = href
        .split("player/")
        .nth(1)?
        .split(|c: char| !c.is_ascii_digit())
        .next()?
        .parse::<i64>()
        .ok()?;
    let value = parse_number(&text_of(*element_children(item).last()?))?;
    Some((EntityKey::Player(PlayerId(id)), value))
}

fn team_entry(item: ElementRef<'_>) -> Option<(EntityKey, f64)> {
    let children = element_children(item);
    let name = TeamName::new(&text_of(*children.get(1)?)).ok()?;
    let value = parse_number(&text_of(*children.last()?))?;
    Some((EntityKey::Team(name), value))
}
