use std::collections::HashMap;

use crate::error::{Result, SyncError};
use crate::store::{Store, Table};

pub const RESERVED_COLUMNS: &[&str] = &["pid", "team", "season", "gameweek", "rowid"];

/// Turns a scraped statistic label into a column identifier.
///
/// Lowercases, maps every run of non-alphanumeric characters to a single
/// underscore and trims underscores at both ends. Identifiers that would start
/// with a digit get a `stat_` prefix. Returns `None` when nothing usable is left.
pub fn canonicalize(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    if out.is_empty() {
        return None;
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert_str(0, "stat_");
    }
    Some(out)
}

/// True for identifiers produced by [`canonicalize`]; used before splicing a
/// column name into SQL.
pub fn is_canonical(ident: &str) -> bool {
    !ident.is_empty()
        && !ident.starts_with(|c: char| c.is_ascii_digit() || c == '_')
        && !ident.ends_with('_')
        && !ident.contains("__")
        && ident
            .chars()
            .all(|c| c == '_' || (c.is_alphanumeric() && !c.is_uppercase()))
}

/// Whether two labels name the same statistic: case and whitespace
/// differences are ignored, anything else is a distinct name.
pub fn same_statistic(a: &str, b: &str) -> bool {
    label_identity(a) == label_identity(b)
}

fn label_identity(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Remembers which label produced each column so two different statistics can
/// never be folded into one column.
#[derive(Debug, Default, Clone)]
pub struct ColumnRegistry {
    by_column: HashMap<String, String>,
}

impl ColumnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the labels that created the table's columns in
    /// earlier runs.
    pub fn load(store: &Store, table: Table) -> Result<Self> {
        let mut registry = Self::new();
        for (_, label) in store.stat_labels(table)? {
            registry.register(&label)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, raw: &str) -> Result<String> {
        let column =
            canonicalize(raw).ok_or_else(|| SyncError::InvalidStatName(raw.to_string()))?;
        if RESERVED_COLUMNS.contains(&column.as_str()) {
            return Err(SyncError::InvalidStatName(raw.to_string()));
        }
        let identity = label_identity(raw);
        match self.by_column.get(&column) {
            Some(existing) if label_identity(existing) != identity => {
                Err(SyncError::ColumnCollision {
                    first: existing.clone(),
                    second: raw.to_string(),
                    column,
                })
            }
            Some(_) => Ok(column),
            None => {
                self.by_column.insert(column.clone(), raw.to_string());
                Ok(column)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_column.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_column.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOCABULARY: &[&str] = &[
        "Minutes",
        "Goals",
        "Assists",
        "Passes",
        "Accurate Passes",
        "Key Passes",
        "Shots",
        "Shots On Target",
        "Yellow Cards",
        "Red Cards",
        "Saves",
        "Ball Possession",
        "Attacks From Left",
        "Attacks From Center",
        "Attacks From Right",
        "Corners",
        "Offsides",
        "Fouls",
    ];

    #[test]
    fn case_and_spacing_do_not_matter() {
        assert_eq!(canonicalize("Ball Possession").as_deref(), Some("ball_possession"));
        assert_eq!(canonicalize("ball possession").as_deref(), Some("ball_possession"));
        assert_eq!(canonicalize("  Ball   Possession ").as_deref(), Some("ball_possession"));
    }

    #[test]
    fn punctuation_and_digits() {
        assert_eq!(canonicalize("Pass %").as_deref(), Some("pass"));
        assert_eq!(canonicalize("1v1 Duels").as_deref(), Some("stat_1v1_duels"));
        assert_eq!(canonicalize(" - "), None);
    }

    #[test]
    fn vocabulary_is_collision_free() {
        let mut registry = ColumnRegistry::new();
        for label in VOCABULARY {
            let column = registry.register(label).unwrap();
            assert!(is_canonical(&column), "{column}");
        }
        assert_eq!(registry.len(), VOCABULARY.len());
    }

    #[test]
    fn respelled_label_maps_to_same_column() {
        let mut registry = ColumnRegistry::new();
        let a = registry.register("Key Passes").unwrap();
        let b = registry.register("key  passes").unwrap();
        assert_eq!(a, b);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn distinct_labels_colliding_are_rejected() {
        let mut registry = ColumnRegistry::new();
        registry.register("Shots-on target").unwrap();
        let err = registry.register("Shots on target").unwrap_err();
        assert!(matches!(err, SyncError::ColumnCollision { .. }));
    }

    #[test]
    fn key_columns_are_reserved() {
        let mut registry = ColumnRegistry::new();
        assert!(registry.register("Season").is_err());
        assert!(registry.register("Team").is_err());
    }
}
