// src/extractors/tables.rs

// --- Imports ---
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

/// A table linearized to rows of data-cell strings, order preserved.
pub type Table = Vec<Vec<String>>;

// --- CSS Selectors (Lazy Static) ---
static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table").expect("Failed to compile TABLE_SELECTOR")
});

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr").expect("Failed to compile ROW_SELECTOR")
});

static DATA_CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("td").expect("Failed to compile DATA_CELL_SELECTOR")
});

/// Linearizes every tabular structure in the document into a grid of cell
/// strings. Only data cells are collected (header cells excluded); a row
/// without data cells becomes an empty row, preserved positionally so row
/// indices stay meaningful.
pub fn extract_tables(html: &str) -> Vec<Table> {
    let document = Html::parse_document(html);
    document
        .select(&TABLE_SELECTOR)
        .map(|table| {
            table
                .select(&ROW_SELECTOR)
                .map(|row| {
                    row.select(&DATA_CELL_SELECTOR)
                        .map(|cell| cell.text().collect::<String>().trim().to_owned())
                        .collect()
                })
                .collect()
        })
        .collect()
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_cells_collected_in_order() {
        let html = r#"<table>
            <tr><td>Earned</td><td>18.5%</td></tr>
            <tr><td>Target</td><td>20%</td></tr>
        </table>"#;
        let tables = extract_tables(html);
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0],
            vec![vec!["Earned", "18.5%"], vec!["Target", "20%"]]
        );
    }

    #[test]
    fn test_header_row_preserved_as_empty() {
        let html = r#"<table>
            <tr><th>Metric</th><th>Payout</th></tr>
            <tr><td>Award earned</td><td>35%</td></tr>
        </table>"#;
        let tables = extract_tables(html);
        assert_eq!(tables[0].len(), 2);
        assert!(tables[0][0].is_empty());
        assert_eq!(tables[0][1], vec!["Award earned", "35%"]);
    }

    #[test]
    fn test_multiple_tables_all_extracted() {
        let html = "<table><tr><td>a</td></tr></table><table><tr><td>b</td></tr></table>";
        let tables = extract_tables(html);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0][0], vec!["a"]);
        assert_eq!(tables[1][0], vec!["b"]);
    }

    #[test]
    fn test_nested_markup_inside_cell_flattened() {
        let html = "<table><tr><td> <b>Earned</b> <i>18.5%</i> of target </td></tr></table>";
        let tables = extract_tables(html);
        assert_eq!(tables[0][0], vec!["Earned 18.5% of target"]);
    }

    #[test]
    fn test_tableless_document_yields_nothing() {
        assert!(extract_tables("<p>no tables here</p>").is_empty());
    }
}
