//! Integration tests for merging source tables from fixture files.

use game_catalog::catalog::table::{read_source_table, write_catalog};
use game_catalog::catalog::{CatalogMerger, Source};
use game_catalog::commands::{MergeCommand, MergeInputs};
use game_catalog::config::Config;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn inputs() -> MergeInputs {
    MergeInputs {
        steam: fixture("steam.csv"),
        metacritic: fixture("metacritic.csv"),
        epic: fixture("epic.csv"),
    }
}

#[test]
fn test_merged_table_contents() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("merged.csv");

    MergeCommand::new(Config::default(), inputs())
        .with_output(Some(output.clone()))
        .execute()
        .unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(
        lines,
        vec![
            "name,steam_price,epic_price,metascore,steam_url,epic_url",
            "Hades,\"₺199,99\",null,93,https://store.steampowered.com/app/1145360/Hades/,null",
            "Dota 2,null,null,null,null,null",
            "Cyberpunk 2077: Ultimate Edition,\"₺1.299,00\",\"₺1.099,00\",86,\
             https://store.steampowered.com/app/1091500/,https://store.epicgames.com/tr/p/cyberpunk-2077",
            "Portal 2,₺52,null,95,https://store.steampowered.com/app/620/Portal_2/,null",
            "Stardew Valley,₺57,null,null,https://store.steampowered.com/app/413150/,null",
        ]
    );
}

#[test]
fn test_merge_output_is_byte_identical_across_runs() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");

    let steam = read_source_table(&fixture("steam.csv"), Source::Steam).unwrap();
    let metacritic = read_source_table(&fixture("metacritic.csv"), Source::Metacritic).unwrap();
    let epic = read_source_table(&fixture("epic.csv"), Source::Epic).unwrap();

    let merger = CatalogMerger::new(90);
    write_catalog(&first, &merger.merge(&steam, &metacritic, &epic)).unwrap();
    write_catalog(&second, &merger.merge(&steam, &metacritic, &epic)).unwrap();

    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[test]
fn test_non_numeric_score_reads_as_null() {
    let records = read_source_table(&fixture("metacritic.csv"), Source::Metacritic).unwrap();
    let upcoming = records.iter().find(|r| r.display_name() == "Upcoming Game").unwrap();
    assert_eq!(upcoming.score(), None);
}

#[test]
fn test_priced_only_drops_unpriced_rows() {
    let entries = MergeCommand::new(Config::default(), inputs()).priced_only(true).merge().unwrap();

    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Hades", "Cyberpunk 2077: Ultimate Edition", "Portal 2", "Stardew Valley"]
    );
}

#[test]
fn test_strict_threshold_disables_fuzzy_matches() {
    let config = Config { threshold: 100, ..Config::default() };
    let entries = MergeCommand::new(config, inputs()).merge().unwrap();

    // subset titles still score 100
    let cyberpunk = entries.iter().find(|e| e.name.starts_with("Cyberpunk")).unwrap();
    assert_eq!(cyberpunk.score, Some(86));

    let stardew = entries.iter().find(|e| e.name == "Stardew Valley").unwrap();
    assert_eq!(stardew.score, None);
    assert_eq!(stardew.price(Source::Epic), None);
}
