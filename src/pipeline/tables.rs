//! Markdown table extraction.
//!
//! Extraction engines emit GFM pipe tables inside the Markdown stream.
//! Spreadsheet renderers (and anything else downstream that wants cells, not
//! prose) need them back as structured rows. The parsing is deliberately
//! forgiving: OCR output rarely produces perfectly aligned tables, so any
//! paragraph with enough pipes is treated as tabular and salvaged row by row.

use crate::converter::DocumentTable;

/// A paragraph needs at least this many pipes to be considered a table.
const MIN_PIPES: usize = 3;

/// Minimum data rows (header + one body row) for a block to count.
const MIN_ROWS: usize = 2;

/// Recover all pipe tables from a Markdown document.
pub fn extract_tables(markdown: &str) -> Vec<DocumentTable> {
    markdown.split("\n\n").filter_map(parse_block).collect()
}

fn parse_block(block: &str) -> Option<DocumentTable> {
    if block.matches('|').count() < MIN_PIPES {
        return None;
    }

    let rows: Vec<Vec<String>> = block
        .trim()
        .lines()
        .filter(|line| !is_separator_row(line))
        .filter_map(parse_row)
        .collect();

    if rows.len() < MIN_ROWS {
        return None;
    }
    Some(DocumentTable { rows })
}

/// `|---|:---:|` style alignment rows carry no cell data.
fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

fn parse_row(line: &str) -> Option<Vec<String>> {
    if !line.contains('|') {
        return None;
    }
    let cells: Vec<String> = line
        .split('|')
        .map(|cell| cell.trim().to_string())
        .filter(|cell| !cell.is_empty())
        .collect();
    if cells.is_empty() {
        None
    } else {
        Some(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_simple_table() {
        let md = "Intro text.\n\n| Item | Qty |\n|------|-----|\n| Pen | 2 |\n| Ink | 5 |\n\nOutro.";
        let tables = extract_tables(md);
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].rows,
            vec![
                vec!["Item".to_string(), "Qty".to_string()],
                vec!["Pen".to_string(), "2".to_string()],
                vec!["Ink".to_string(), "5".to_string()],
            ]
        );
        assert_eq!(tables[0].column_count(), 2);
    }

    #[test]
    fn separator_rows_are_dropped() {
        let md = "| A | B |\n|:--|--:|\n| 1 | 2 |";
        let tables = extract_tables(md);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 2);
    }

    #[test]
    fn prose_is_not_a_table() {
        let md = "Just a paragraph.\n\nAnother | with one pipe.";
        assert!(extract_tables(md).is_empty());
    }

    #[test]
    fn header_only_block_is_not_a_table() {
        let md = "| lonely | header |\n|--------|--------|";
        assert!(extract_tables(md).is_empty());
    }

    #[test]
    fn multiple_tables_in_one_document() {
        let md = "\
| A | B |\n| 1 | 2 |\n\ntext between\n\n| X | Y | Z |\n| 9 | 8 | 7 |";
        let tables = extract_tables(md);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1].column_count(), 3);
    }

    #[test]
    fn cells_are_trimmed() {
        let md = "|  Tên hàng  |  Thành tiền |\n|   Giấy A4  |  120 000    |";
        let tables = extract_tables(md);
        assert_eq!(tables[0].rows[0][0], "Tên hàng");
        assert_eq!(tables[0].rows[1][1], "120 000");
    }
}
