//! Output formatting for catalog entries and run reports (table, JSON, markdown, CSV).

use crate::catalog::merge::OFFER_SOURCES;
use crate::catalog::models::{CatalogEntry, Source};
use crate::catalog::table::catalog_to_csv;
use crate::collect::RunReport;
use crate::config::OutputFormat;
use serde_json::json;

const NAME_WIDTH: usize = 40;

/// Formats results for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats merged catalog entries.
    pub fn format_entries(&self, entries: &[CatalogEntry]) -> String {
        if entries.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => catalog_to_csv(entries),
                _ => "No games in catalog.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(entries).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => self.table_entries(entries),
            OutputFormat::Markdown => self.markdown_entries(entries),
            OutputFormat::Csv => catalog_to_csv(entries),
        }
    }

    /// Formats the summary of a collection run.
    pub fn format_report(&self, report: &RunReport) -> String {
        let rows = report_rows(report);

        match self.format {
            OutputFormat::Json => {
                let value = json!({
                    "source": report.source,
                    "success": report.is_success(),
                    "termination": report.termination.to_string(),
                    "items_collected": report.items_collected,
                    "pages_processed": report.pages_processed,
                    "duplicates_skipped": report.duplicates_skipped,
                    "filtered_out": report.filtered_out,
                    "excluded": report.excluded,
                    "extraction_errors": report.extraction_errors,
                    "validation_errors": report.validation_errors,
                    "fetch_retries": report.fetch_retries,
                });
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Table => {
                let mut lines = vec![format!("{:<20} {}", "Source:", report.source)];
                lines.extend(
                    rows.iter().map(|(_, label, value)| format!("{:<20} {}", label, value)),
                );
                lines.join("\n")
            }
            OutputFormat::Markdown => {
                let mut lines = vec![format!("## {} collection", report.source), String::new()];
                lines.extend(rows.iter().map(|(_, label, value)| {
                    format!("- **{}** {}", label.trim_end_matches(':'), value)
                }));
                lines.join("\n")
            }
            OutputFormat::Csv => {
                let mut lines =
                    vec!["field,value".to_string(), format!("source,{}", report.source)];
                lines.extend(
                    rows.iter().map(|(key, _, value)| format!("{},{}", key, csv_escape(value))),
                );
                lines.join("\n")
            }
        }
    }

    fn table_entries(&self, entries: &[CatalogEntry]) -> String {
        let price_width = 12;
        let score_width = 5;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<NAME_WIDTH$}  {:>price_width$}  {:>price_width$}  {:>score_width$}",
            "Name", "Steam", "Epic", "Score"
        ));
        lines.push(format!(
            "{:-<NAME_WIDTH$}  {:-<price_width$}  {:-<price_width$}  {:-<score_width$}",
            "", "", "", ""
        ));

        for entry in entries {
            lines.push(format!(
                "{:<NAME_WIDTH$}  {:>price_width$}  {:>price_width$}  {:>score_width$}",
                truncate(&entry.name, NAME_WIDTH),
                entry.price(Source::Steam).unwrap_or("-"),
                entry.price(Source::Epic).unwrap_or("-"),
                score_text(entry),
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} games", entries.len()));

        lines.join("\n")
    }

    fn markdown_entries(&self, entries: &[CatalogEntry]) -> String {
        let mut lines = Vec::new();

        lines.push("| Name | Steam | Epic | Score |".to_string());
        lines.push("|------|-------|------|-------|".to_string());

        for entry in entries {
            let cells: Vec<String> = OFFER_SOURCES
                .iter()
                .map(|source| match (entry.price(*source), entry.url(*source)) {
                    (Some(price), Some(url)) => format!("[{}]({})", price, url),
                    (Some(price), None) => price.to_string(),
                    _ => String::new(),
                })
                .collect();

            lines.push(format!(
                "| {} | {} | {} | {} |",
                entry.name.replace('|', "\\|"),
                cells[0],
                cells[1],
                entry.score.map(|s| s.to_string()).unwrap_or_default()
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} games*", entries.len()));

        lines.join("\n")
    }
}

fn report_rows(report: &RunReport) -> Vec<(&'static str, &'static str, String)> {
    vec![
        ("items_collected", "Items collected:", report.items_collected.to_string()),
        ("pages_processed", "Pages processed:", report.pages_processed.to_string()),
        ("termination", "Stopped:", report.termination.to_string()),
        ("duplicates_skipped", "Duplicates skipped:", report.duplicates_skipped.to_string()),
        ("filtered_out", "Filtered out:", report.filtered_out.to_string()),
        ("excluded", "Excluded:", report.excluded.to_string()),
        ("extraction_errors", "Extraction errors:", report.extraction_errors.to_string()),
        ("validation_errors", "Validation errors:", report.validation_errors.to_string()),
        ("fetch_retries", "Fetch retries:", report.fetch_retries.to_string()),
    ]
}

fn score_text(entry: &CatalogEntry) -> String {
    entry.score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Shortens to `width` characters, ending with "..." when cut.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let head: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::models::Offer;
    use crate::collect::Termination;
    use std::collections::BTreeMap;

    fn make_entry() -> CatalogEntry {
        let mut offers = BTreeMap::new();
        offers.insert(
            Source::Steam,
            Offer {
                price: Some("₺199,99".to_string()),
                url: Some("https://s/hades".to_string()),
            },
        );
        offers.insert(Source::Epic, Offer::absent());
        CatalogEntry { name: "Hades".to_string(), offers, score: Some(93) }
    }

    fn make_long_entry() -> CatalogEntry {
        CatalogEntry {
            name: "Ölümsüz Savaşçılar: Gölgelerin Yükselişi ve Kayıp Krallığın Sırları".to_string(),
            offers: BTreeMap::new(),
            score: None,
        }
    }

    fn make_report() -> RunReport {
        RunReport {
            source: Source::Steam,
            items_collected: 50,
            pages_processed: 1,
            termination: Termination::TargetReached,
            duplicates_skipped: 2,
            filtered_out: 3,
            excluded: 12,
            extraction_errors: 0,
            validation_errors: 1,
            fetch_retries: 0,
        }
    }

    #[test]
    fn test_json_entries() {
        let output = Formatter::new(OutputFormat::Json).format_entries(&[make_entry()]);
        assert!(output.contains("\"name\": \"Hades\""));
        assert!(output.contains("\"score\": 93"));

        let parsed: Vec<CatalogEntry> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0], make_entry());
    }

    #[test]
    fn test_empty_entries() {
        assert_eq!(Formatter::new(OutputFormat::Json).format_entries(&[]), "[]");
        assert_eq!(Formatter::new(OutputFormat::Table).format_entries(&[]), "No games in catalog.");
        assert!(Formatter::new(OutputFormat::Csv).format_entries(&[]).starts_with("name,"));
    }

    #[test]
    fn test_table_entries() {
        let output = Formatter::new(OutputFormat::Table).format_entries(&[make_entry()]);
        assert!(output.contains("Name"));
        assert!(output.contains("Hades"));
        assert!(output.contains("₺199,99"));
        assert!(output.contains("93"));
        assert!(output.contains("Total: 1 games"));
    }

    #[test]
    fn test_table_truncates_multibyte_names() {
        let output = Formatter::new(OutputFormat::Table).format_entries(&[make_long_entry()]);
        assert!(output.contains("..."));
        assert!(!output.contains("Sırları"));
    }

    #[test]
    fn test_markdown_entries() {
        let output = Formatter::new(OutputFormat::Markdown).format_entries(&[make_entry()]);
        assert!(output.contains("| Name | Steam | Epic | Score |"));
        assert!(output.contains("| Hades | [₺199,99](https://s/hades) |  | 93 |"));
        assert!(output.contains("*1 games*"));
    }

    #[test]
    fn test_csv_entries() {
        let output = Formatter::new(OutputFormat::Csv).format_entries(&[make_entry()]);
        let mut lines = output.lines();
        assert_eq!(lines.next(), Some("name,steam_price,epic_price,metascore,steam_url,epic_url"));
        assert_eq!(lines.next(), Some("Hades,\"₺199,99\",null,93,https://s/hades,null"));
    }

    #[test]
    fn test_report_table() {
        let output = Formatter::new(OutputFormat::Table).format_report(&make_report());
        assert!(output.contains("steam"));
        assert!(output.contains("Items collected:"));
        assert!(output.contains("target reached"));
    }

    #[test]
    fn test_report_json() {
        let output = Formatter::new(OutputFormat::Json).format_report(&make_report());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["source"], "steam");
        assert_eq!(value["success"], true);
        assert_eq!(value["items_collected"], 50);
        assert_eq!(value["excluded"], 12);
        assert_eq!(value["termination"], "target reached");
    }

    #[test]
    fn test_report_csv_and_markdown() {
        let csv = Formatter::new(OutputFormat::Csv).format_report(&make_report());
        assert!(csv.starts_with("field,value\nsource,steam"));
        assert!(csv.contains("termination,target reached"));

        let md = Formatter::new(OutputFormat::Markdown).format_report(&make_report());
        assert!(md.starts_with("## steam collection"));
        assert!(md.contains("- **Items collected** 50"));
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("simple"), "simple");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
