use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use ipl_stats::columns::{ColumnRegistry, canonicalize};
use ipl_stats::fake_source::FakeLeague;
use ipl_stats::model::{Gameweek, Season, StatKind};
use ipl_stats::sheet::StatSheet;
use ipl_stats::source::StatsSource;
use ipl_stats::stats_fetch::parse_stats_page;
use ipl_stats::store::Store;
use ipl_stats::upsert::upsert_sheet;

const STAT_LABELS: &[&str] = &[
    "Minutes",
    "Shots On Target",
    "Attacks From Left",
    "Ball Possession",
    "1st Half Goals",
    "Yellow  Cards",
];

const PLAYER_STATS_HTML: &str = include_str!("../tests/fixtures/player_stats.html");

fn bench_canonicalize(c: &mut Criterion) {
    c.bench_function("canonicalize_labels", |b| {
        b.iter(|| {
            for label in STAT_LABELS {
                black_box(canonicalize(black_box(label)));
            }
        })
    });
}

fn bench_stats_page_parse(c: &mut Criterion) {
    c.bench_function("stats_page_parse", |b| {
        b.iter(|| {
            let tables = parse_stats_page(black_box(PLAYER_STATS_HTML), StatKind::Player).unwrap();
            black_box(tables.len());
        })
    });
}

fn bench_upsert_sheet(c: &mut Criterion) {
    let season = Season::new("19/20").unwrap();
    let gameweek = Gameweek::new(3).unwrap();
    let mut league = FakeLeague::new(1, season.clone(), vec![gameweek]).unwrap();
    let tables = league
        .stat_tables(StatKind::Player, &season, gameweek)
        .unwrap();
    let mut registry = ColumnRegistry::new();
    let sheet =
        StatSheet::assemble(StatKind::Player, season, gameweek, tables, &mut registry).unwrap();

    let mut store = Store::in_memory().unwrap();
    c.bench_function("upsert_sheet_existing_rows", |b| {
        b.iter(|| {
            let summary = upsert_sheet(&mut store, black_box(&sheet)).unwrap();
            black_box(summary.cells_updated);
        })
    });
}

criterion_group!(
    benches,
    bench_canonicalize,
    bench_stats_page_parse,
    bench_upsert_sheet
);
criterion_main!(benches);
