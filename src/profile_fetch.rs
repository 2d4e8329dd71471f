use chrono::NaiveDate;
use scraper::Html;

use crate::error::ProfileError;
use crate::html::{selector, text_of};
use crate::model::{PlayerId, PlayerInfo, Position, TeamName};

/// Parses a player page.
///
/// The header reads `Name | Number`; the details block reads
/// `Team: X | Position: p | Date of birth: dd.mm.yy` (parts in any order).
pub fn parse_profile_page(html: &str, pid: PlayerId) -> Result<PlayerInfo, ProfileError> {
    let malformed = |reason: String| ProfileError::Malformed { pid, reason };

    let document = Html::parse_document(html);
    let header_sel = selector(".player-page .player-header").map_err(|e| malformed(e.to_string()))?;
    let details_sel = selector(".player-page .player-details").map_err(|e| malformed(e.to_string()))?;

    let header = document
        .select(&header_sel)
        .next()
        .map(text_of)
        .ok_or_else(|| malformed("missing name header".to_string()))?;
    let details = document
        .select(&details_sel)
        .next()
        .map(text_of)
        .ok_or_else(|| malformed("missing details block".to_string()))?;

    let mut header_parts = header.split(" | ");
    let name = header_parts
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| malformed("empty player name".to_string()))?
        .to_string();
    let shirt_number = header_parts.next().and_then(|n| n.trim().parse::<u32>().ok());

    let field = |prefix: &str| {
        details
            .split(" | ")
            .find_map(|part| part.trim().strip_prefix(prefix).map(str::trim))
            .filter(|v| !v.is_empty())
    };

    let team = field("Team:").ok_or_else(|| malformed("missing team".to_string()))?;
    let team = TeamName::new(team).map_err(|e| malformed(e.to_string()))?;
    let position_label =
        field("Position:").ok_or_else(|| malformed("missing position".to_string()))?;
    let position = Position::from_label(position_label)
        .ok_or_else(|| malformed(format!("unknown position {position_label:?}")))?;
    let dob = field("Date of birth:").ok_or_else(|| malformed("missing date of birth".to_string()))?;
    let date_of_birth = NaiveDate::parse_from_str(dob, "%d.%m.%y")
        .map_err(|e| malformed(format!("bad date of birth {dob:?}: {e}")))?;

    Ok(PlayerInfo {
        pid,
        name,
        shirt_number,
        team,
        position,
        date_of_birth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(header: &str, details: &str) -> String {
        format!(
            r#"<html><body><div class="player-page"><div class="player-header">{header}</div>
            <div class="player-details col-xs-12">{details}</div></div></body></html>"#
        )
    }

    #[test]
    fn parses_full_profile() {
        let html = page(
            "Dor Peretz | 8",
            "Team: Maccabi Tel Aviv | Position: mid-fielder | Date of birth: 17.05.95",
        );
        let info = parse_profile_page(&html, PlayerId(42)).unwrap();
        assert_eq!(info.name, "Dor Peretz");
        assert_eq!(info.shirt_number, Some(8));
        assert_eq!(info.team.as_str(), "Maccabi Tel Aviv");
        assert_eq!(info.position, Position::Midfielder);
        assert_eq!(info.date_of_birth, NaiveDate::from_ymd_opt(1995, 5, 17).unwrap());
    }

    #[test]
    fn missing_position_is_malformed() {
        let html = page("Someone | 3", "Team: Hapoel Hadera | Date of birth: 01.01.99");
        let err = parse_profile_page(&html, PlayerId(9)).unwrap_err();
        assert!(matches!(err, ProfileError::Malformed { pid: PlayerId(9), .. }));
    }

    #[test]
    fn empty_page_is_malformed() {
        let err = parse_profile_page("<html></html>", PlayerId(1)).unwrap_err();
        assert!(matches!(err, ProfileError::Malformed { .. }));
    }
}
