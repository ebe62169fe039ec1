/*!
 * Tests for CSV feed processing
 */

use std::collections::HashMap;

use feedtrans::app_config::CsvConfig;
use feedtrans::csv_processor::{CsvProcessor, slugify};

use crate::common::sample_feed;

fn processor() -> CsvProcessor {
    CsvProcessor::new(&CsvConfig::default())
}

#[test]
fn test_parse_should_extract_nonempty_source_cells_with_row_indices() {
    let data = sample_feed(&[
        ("title", "Red sweater"),
        ("title", ""),
        ("body_html", "<p>Soft wool</p>"),
    ]);
    let document = processor().parse(&data).unwrap();

    assert_eq!(document.rows.len(), 4); // header + 3 rows
    assert_eq!(document.source_texts.len(), 2);
    assert_eq!(document.source_texts[0].row_index, 1);
    assert_eq!(document.source_texts[0].text, "Red sweater");
    assert_eq!(document.source_texts[1].row_index, 3);
}

#[test]
fn test_parse_with_short_rows_should_pad_to_target_column() {
    let data = b"\"a\",\"b\"\n\"c\",\"d\"\n".to_vec();
    let document = processor().parse(&data).unwrap();
    assert!(document.rows.iter().all(|r| r.len() >= 8));
}

#[test]
fn test_insert_translations_should_fill_target_column() {
    let data = sample_feed(&[("title", "Red sweater"), ("title", "Blue sweater")]);
    let mut document = processor().parse(&data).unwrap();

    let mut translations = HashMap::new();
    translations.insert(1usize, "Pull rouge".to_string());
    translations.insert(2usize, "Pull bleu".to_string());
    processor().insert_translations(&mut document.rows, &translations);

    assert_eq!(document.rows[1][7], "Pull rouge");
    assert_eq!(document.rows[2][7], "Pull bleu");
}

#[test]
fn test_normalize_handles_with_collision_should_append_suffix() {
    let data = sample_feed(&[("handle", "x"), ("handle", "y"), ("title", "z")]);
    let mut document = processor().parse(&data).unwrap();

    // Two distinct translations that normalize to the same slug
    let mut translations = HashMap::new();
    translations.insert(1usize, "Blue Backpack!".to_string());
    translations.insert(2usize, "Blue  Backpack".to_string());
    translations.insert(3usize, "Blue Backpack".to_string());
    processor().insert_translations(&mut document.rows, &translations);
    processor().normalize_handles(&mut document.rows);

    assert_eq!(document.rows[1][7], "blue-backpack");
    assert_eq!(document.rows[2][7], "blue-backpack-001");
    // Non-handle rows are left alone
    assert_eq!(document.rows[3][7], "Blue Backpack");
}

#[test]
fn test_slugify_should_fold_accents_and_collapse_runs() {
    assert_eq!(slugify("Pull Noël Enfants"), "pull-noel-enfants");
    assert_eq!(slugify("  Été -- chaud!  "), "ete-chaud");
    assert_eq!(slugify("Größe 42"), "grosse-42");
    assert_eq!(slugify("ŒUF à la coque"), "oeuf-a-la-coque");
}

#[test]
fn test_generate_csv_should_quote_every_field() {
    let rows = vec![
        vec!["a".to_string(), "b".to_string()],
        vec!["c,d".to_string(), "e\nf".to_string()],
    ];
    let content = processor().generate_csv(&rows).unwrap();
    assert!(content.starts_with("\"a\",\"b\""));
    assert!(content.contains("\"c,d\""));
    assert!(content.contains("\"e\nf\""));
}

#[test]
fn test_split_if_oversized_under_limit_should_return_single_part() {
    let parts = processor().split_if_oversized("feed_fr.csv", "\"a\"\n\"b\"\n", 1024);
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].name, "feed_fr.csv");
}

#[test]
fn test_split_if_oversized_should_split_on_record_boundaries() {
    let header = "\"h1\",\"h2\"\n";
    let mut content = String::from(header);
    for i in 0..100 {
        content.push_str(&format!("\"row {}\",\"{}\"\n", i, "x".repeat(50)));
    }

    let parts = processor().split_if_oversized("feed_fr.csv", &content, 1000);
    assert!(parts.len() > 1);
    for part in &parts {
        assert!(part.content.starts_with(header));
        assert!(part.name.contains("part"));
        // Every part parses as valid CSV on its own
        assert!(processor().parse(part.content.as_bytes()).is_ok());
    }

    // No rows lost across the split
    let total_rows: usize = parts
        .iter()
        .map(|p| p.content.lines().count() - 1)
        .sum();
    assert_eq!(total_rows, 100);
}

#[test]
fn test_split_if_oversized_should_not_split_inside_quoted_field() {
    let header = "\"h\"\n";
    let mut content = String::from(header);
    // Rows with embedded newlines inside quoted fields
    for i in 0..50 {
        content.push_str(&format!("\"line one {}\nline two\"\n", i));
    }

    let parts = processor().split_if_oversized("feed_fr.csv", &content, 300);
    assert!(parts.len() > 1);
    for part in &parts {
        let document = processor().parse(part.content.as_bytes()).unwrap();
        for row in document.rows.iter().skip(1) {
            assert!(row[0].contains("line two"), "record was split mid-field");
        }
    }
}
