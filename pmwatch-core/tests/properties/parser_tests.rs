//! Property tests for the output parsers

use proptest::prelude::*;

use pmwatch_core::parser::{
    ServiceListParser, parse_cpu_cell, parse_memory_bytes, parse_uptime_cell,
};

/// The canonical column set of the tabular service listing
const COLUMNS: [(&str, &str, &str); 7] = [
    ("id", "0", "1"),
    ("name", "api", "worker"),
    ("version", "2.1.0", "1.0.3"),
    ("status", "online", "stopped"),
    ("cpu", "1.5%", "0%"),
    ("mem", "512.4mb", "0b"),
    ("uptime", "14D", "0"),
];

/// Renders a two-row service table with the columns in the given order
fn render_table(order: &[usize], pad: usize) -> String {
    let spaces = " ".repeat(pad);
    let mut header = String::from("|");
    let mut row_a = String::from("|");
    let mut row_b = String::from("|");
    for &i in order {
        let (name, a, b) = COLUMNS[i];
        header.push_str(&format!(" {name}{spaces} |"));
        row_a.push_str(&format!(" {a}{spaces} |"));
        row_b.push_str(&format!(" {b}{spaces} |"));
    }
    format!("{header}\n{row_a}\n{row_b}\n")
}

proptest! {
    /// Property: parsing is independent of column order and cell padding
    #[test]
    fn table_parse_is_column_order_independent(
        order in Just((0..COLUMNS.len()).collect::<Vec<_>>()).prop_shuffle(),
        pad in 0usize..8,
    ) {
        let canonical_order: Vec<usize> = (0..COLUMNS.len()).collect();
        let canonical = ServiceListParser::parse_table(&render_table(&canonical_order, 1))
            .expect("canonical fixture parses");

        let shuffled = ServiceListParser::parse_table(&render_table(&order, pad))
            .expect("shuffled fixture parses");

        prop_assert_eq!(canonical, shuffled);
    }

    /// Property: noise lines around the table never change the records
    #[test]
    fn table_parse_ignores_surrounding_noise(
        noise_before in "[a-zA-Z0-9 .:()\\[\\]]{0,60}",
        noise_after in "[a-zA-Z0-9 .:()\\[\\]]{0,60}",
    ) {
        let order: Vec<usize> = (0..COLUMNS.len()).collect();
        let table = render_table(&order, 1);
        let clean = ServiceListParser::parse_table(&table).expect("clean table parses");

        let noisy = format!("{noise_before}\n{table}{noise_after}\n");
        let parsed = ServiceListParser::parse_table(&noisy).expect("noisy table parses");

        prop_assert_eq!(clean, parsed);
    }

    /// Property: whole mebibyte values scale exactly
    #[test]
    fn memory_mb_values_scale_exactly(mb in 0u64..1_000_000) {
        let parsed = parse_memory_bytes(&format!("{mb}mb"));
        prop_assert_eq!(parsed, Some(mb * 1024 * 1024));
    }

    /// Property: memory parsing never yields a negative-equivalent value
    #[test]
    fn memory_parse_never_underflows(value in -1_000_000.0f64..1_000_000.0, suffix in prop::sample::select(vec!["b", "kb", "mb", "gb"])) {
        if let Some(bytes) = parse_memory_bytes(&format!("{value}{suffix}")) {
            // u64 by construction, but the clamp must hold for negatives
            if value < 0.0 {
                prop_assert_eq!(bytes, 0);
            }
        }
    }

    /// Property: decimal comma and decimal point parse identically
    #[test]
    fn cpu_locale_separators_agree(whole in 0u32..100, frac in 0u32..100) {
        let with_point = parse_cpu_cell(&format!("{whole}.{frac:02}%"));
        let with_comma = parse_cpu_cell(&format!("{whole},{frac:02}%"));
        prop_assert_eq!(with_point, with_comma);
        prop_assert!(with_point.is_some());
    }

    /// Property: uptime suffixes convert with their exact factors
    #[test]
    fn uptime_suffix_factors(value in 0u64..10_000) {
        prop_assert_eq!(parse_uptime_cell(&format!("{value}s")), Some(value));
        prop_assert_eq!(parse_uptime_cell(&format!("{value}m")), Some(value * 60));
        prop_assert_eq!(parse_uptime_cell(&format!("{value}h")), Some(value * 3_600));
        prop_assert_eq!(parse_uptime_cell(&format!("{value}d")), Some(value * 86_400));
    }
}
