use anyhow::{Context, Result};
use chrono::NaiveDate;
use scraper::{ElementRef, Html};

use crate::html::{selector, text_of};
use crate::model::{Gameweek, MatchResult, Season, TeamName};

/// Parses the scores page into played matches.
///
/// Rows without a `h - a` score (fixtures not played yet) are skipped, as are
/// rows whose date or team labels cannot be read.
pub fn parse_results_page(html: &str, season: &Season) -> Result<Vec<MatchResult>> {
    let document = Html::parse_document(html);
    let round_sel = selector("div.scores-page div[class*=\"games-round-container\"]")?;
    let row_sel = selector("div.current-round-details-view div[class*=\"current-round-details-row\"]")?;
    let label_sel = selector("label")?;

    let mut out = Vec::new();
    for round in document.select(&round_sel) {
        for row in round.select(&row_sel) {
            let Some(gameweek) = gameweek_from_classes(row) else {
                log::debug!("results row without a round class skipped");
                continue;
            };
            let labels = row.select(&label_sel).map(text_of).collect::<Vec<_>>();
            match parse_result_row(&labels, season, gameweek) {
                Ok(Some(result)) => out.push(result),
                Ok(None) => {}
                Err(err) => log::warn!("results row {labels:?} skipped: {err:#}"),
            }
        }
    }
    Ok(out)
}

/// The round number is carried by a class like `game-round-3`.
fn gameweek_from_classes(row: ElementRef<'_>) -> Option<Gameweek> {
    row.value().classes().find_map(|class| {
        let parts = class.split('-').collect::<Vec<_>>();
        if parts.len() < 3 {
            return None;
        }
        let n = parts.last()?.parse::<i64>().ok()?;
        Gameweek::new(n).ok()
    })
}

fn parse_result_row(
    labels: &[String],
    season: &Season,
    gameweek: Gameweek,
) -> Result<Option<MatchResult>> {
    let [date, day, kickoff, teams, score, stadium, ..] = labels else {
        return Ok(None);
    };
    let Some((home_score, away_score)) = parse_score(score) else {
        return Ok(None);
    };
    let date = NaiveDate::parse_from_str(date.trim(), "%d.%m.%y")
        .with_context(|| format!("bad match date {date:?}"))?;
    let (home, away) = teams
        .split_once(" - ")
        .with_context(|| format!("bad teams label {teams:?}"))?;

    Ok(Some(MatchResult {
        season: season.clone(),
        gameweek,
        date,
        day: day.trim().to_string(),
        kickoff: kickoff.trim().to_string(),
        home_team: TeamName::new(home)?,
        away_team: TeamName::new(away)?,
        home_score,
        away_score,
        stadium: stadium.trim().to_string(),
    }))
}

fn parse_score(raw: &str) -> Option<(u32, u32)> {
    let (home, away) = raw.trim().split_once('-')?;
    Some((home.trim().parse().ok()?, away.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::parse_score;

    #[test]
    fn parse_score_requires_both_sides() {
        assert_eq!(parse_score("2 - 1"), Some((2, 1)));
        assert_eq!(parse_score(" 0 - 0 "), Some((0, 0)));
        assert_eq!(parse_score("20:30"), None);
        assert_eq!(parse_score("- "), None);
    }
}
