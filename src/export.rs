use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::store::{Store, Table};

#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub match_results: usize,
    pub player_stats: usize,
    pub team_stats: usize,
    pub player_info: usize,
}

enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

/// Dumps the four tables into one workbook, one worksheet per table, with the
/// column names as the header row.
pub fn export_tables(store: &Store, path: &Path) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    let mut report = ExportReport::default();

    for table in Table::ALL {
        let (header, rows) = read_table(store, table)?;
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name(table))?;
        write_header(sheet, &header)?;
        write_rows(sheet, &rows)?;

        let count = rows.len();
        match table {
            Table::MatchResults => report.match_results = count,
            Table::PlayerStats => report.player_stats = count,
            Table::TeamStats => report.team_stats = count,
            Table::PlayerInfo => report.player_info = count,
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(report)
}

fn sheet_name(table: Table) -> &'static str {
    match table {
        Table::MatchResults => "MatchResults",
        Table::PlayerStats => "PlayerStats",
        Table::TeamStats => "TeamStats",
        Table::PlayerInfo => "PlayerInfo",
    }
}

fn read_table(store: &Store, table: Table) -> Result<(Vec<String>, Vec<Vec<Cell>>)> {
    let header = store.columns(table)?;
    let quoted = header
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = store
        .conn()
        .prepare(&format!("SELECT {quoted} FROM {} ORDER BY rowid", table.name()))
        .with_context(|| format!("prepare export of {}", table.name()))?;
    let width = header.len();
    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|idx| {
                    Ok(match row.get_ref(idx)? {
                        ValueRef::Null => Cell::Empty,
                        ValueRef::Integer(v) => Cell::Number(v as f64),
                        ValueRef::Real(v) => Cell::Number(v),
                        ValueRef::Text(v) => Cell::Text(String::from_utf8_lossy(v).into_owned()),
                        ValueRef::Blob(_) => Cell::Empty,
                    })
                })
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok((header, rows))
}

fn write_header(worksheet: &mut Worksheet, header: &[String]) -> Result<()> {
    for (col_idx, name) in header.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, name)?;
    }
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        let xlsx_row = row_idx as u32 + 1;
        for (col_idx, cell) in row.iter().enumerate() {
            let col = col_idx as u16;
            match cell {
                Cell::Empty => {}
                Cell::Number(v) => {
                    worksheet.write_number(xlsx_row, col, *v)?;
                }
                Cell::Text(v) => {
                    worksheet.write_string(xlsx_row, col, v)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_workbook_with_dynamic_columns() {
        let store = Store::in_memory().unwrap();
        store
            .conn()
            .execute_batch(
                r#"
                ALTER TABLE teams_stats_by_gw ADD COLUMN corners REAL DEFAULT 0;
                INSERT INTO teams_stats_by_gw (team, season, gameweek, corners)
                VALUES ('Maccabi Haifa', '19/20', 1, 6);
                "#,
            )
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.xlsx");

        let report = export_tables(&store, &path).unwrap();
        assert_eq!(report.team_stats, 1);
        assert_eq!(report.match_results, 0);
        assert!(path.exists());

        let (header, _) = read_table(&store, Table::TeamStats).unwrap();
        assert_eq!(header.last().map(String::as_str), Some("corners"));
    }
}
