use crate::models::{BlockType, BoundingBox, OcrBlock, OcrPage, Segment};
use std::collections::{HashMap, HashSet};

/// Rebuilds a linear, reading-order document from the flat block graph
/// the OCR service returns for one page.
///
/// Tables are expanded from CELL geometry into row-major grids; LINE
/// blocks that fall inside any table's bounding box are dropped, since
/// the engine reports the same text a second time as free lines.
pub struct LayoutReconstructor;

impl LayoutReconstructor {
    pub fn reconstruct(page: &OcrPage) -> Vec<Segment> {
        let block_map: HashMap<&str, &OcrBlock> = page
            .blocks
            .iter()
            .map(|b| (b.id.as_str(), b))
            .collect();

        let table_boxes: Vec<BoundingBox> = page
            .blocks
            .iter()
            .filter(|b| b.block_type == BlockType::Table)
            .map(|b| b.bounding_box)
            .collect();

        // Stable sort keeps the service's order for blocks at equal height.
        let mut sorted: Vec<&OcrBlock> = page.blocks.iter().collect();
        sorted.sort_by(|a, b| {
            a.bounding_box
                .top
                .partial_cmp(&b.bounding_box.top)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut segments = Vec::new();
        let mut rendered_tables: HashSet<&str> = HashSet::new();

        for block in sorted {
            match block.block_type {
                BlockType::Table => {
                    if rendered_tables.insert(block.id.as_str()) {
                        segments.push(Segment::Table(Self::extract_table(block, &block_map)));
                    }
                }
                BlockType::Line => {
                    let inside_table = table_boxes
                        .iter()
                        .any(|tb| block.bounding_box.overlaps(tb));
                    if !inside_table {
                        if let Some(text) = &block.text {
                            segments.push(Segment::Text(text.clone()));
                        }
                    }
                }
                _ => {}
            }
        }

        segments
    }

    /// Expands a TABLE block into a dense grid. Cell content is the
    /// space-joined text of its child WORD blocks; grid positions with
    /// no cell become empty strings.
    fn extract_table(table: &OcrBlock, block_map: &HashMap<&str, &OcrBlock>) -> Vec<Vec<String>> {
        let mut cells: HashMap<(usize, usize), String> = HashMap::new();
        let mut max_row = 0;
        let mut max_col = 0;

        for cid in &table.child_ids {
            let Some(cell) = block_map.get(cid.as_str()) else {
                continue;
            };
            if cell.block_type != BlockType::Cell {
                continue;
            }
            let (Some(r), Some(c)) = (cell.row_index, cell.column_index) else {
                continue;
            };
            max_row = max_row.max(r);
            max_col = max_col.max(c);
            cells.insert((r, c), Self::child_word_text(cell, block_map));
        }

        (1..=max_row)
            .map(|r| {
                (1..=max_col)
                    .map(|c| cells.get(&(r, c)).cloned().unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    fn child_word_text(block: &OcrBlock, block_map: &HashMap<&str, &OcrBlock>) -> String {
        let words: Vec<&str> = block
            .child_ids
            .iter()
            .filter_map(|cid| block_map.get(cid.as_str()))
            .filter(|b| b.block_type == BlockType::Word)
            .filter_map(|b| b.text.as_deref())
            .collect();
        words.join(" ")
    }

    /// Renders segments to the textual form the LLM prompts consume:
    /// tables bracketed with [TABLE]/[/TABLE], cells joined with " | ".
    pub fn render(segments: &[Segment]) -> String {
        let mut out: Vec<String> = Vec::new();
        for segment in segments {
            match segment {
                Segment::Text(text) => out.push(text.clone()),
                Segment::Table(rows) => {
                    out.push("\n[TABLE]".to_string());
                    for row in rows {
                        out.push(row.join(" | "));
                    }
                    out.push("[/TABLE]\n".to_string());
                }
            }
        }
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(left: f64, top: f64, width: f64, height: f64) -> BoundingBox {
        BoundingBox {
            left,
            top,
            width,
            height,
        }
    }

    fn word(id: &str, text: &str) -> OcrBlock {
        OcrBlock {
            id: id.to_string(),
            block_type: BlockType::Word,
            text: Some(text.to_string()),
            bounding_box: BoundingBox::default(),
            child_ids: vec![],
            row_index: None,
            column_index: None,
        }
    }

    fn cell(id: &str, row: usize, col: usize, word_ids: &[&str]) -> OcrBlock {
        OcrBlock {
            id: id.to_string(),
            block_type: BlockType::Cell,
            text: None,
            bounding_box: BoundingBox::default(),
            child_ids: word_ids.iter().map(|s| s.to_string()).collect(),
            row_index: Some(row),
            column_index: Some(col),
        }
    }

    fn line(id: &str, text: &str, bb: BoundingBox) -> OcrBlock {
        OcrBlock {
            id: id.to_string(),
            block_type: BlockType::Line,
            text: Some(text.to_string()),
            bounding_box: bb,
            child_ids: vec![],
            row_index: None,
            column_index: None,
        }
    }

    fn two_by_two_page() -> OcrPage {
        let table = OcrBlock {
            id: "t1".to_string(),
            block_type: BlockType::Table,
            text: None,
            bounding_box: bbox(0.1, 0.3, 0.8, 0.3),
            child_ids: vec!["c11", "c12", "c21", "c22"]
                .into_iter()
                .map(String::from)
                .collect(),
            row_index: None,
            column_index: None,
        };
        OcrPage {
            blocks: vec![
                table,
                cell("c11", 1, 1, &["w1"]),
                cell("c12", 1, 2, &["w2"]),
                cell("c21", 2, 1, &["w3"]),
                cell("c22", 2, 2, &["w4", "w5"]),
                word("w1", "Date"),
                word("w2", "Balance"),
                word("w3", "01-01-2024"),
                word("w4", "1200"),
                word("w5", "EUR"),
            ],
        }
    }

    #[test]
    fn test_table_expands_to_grid() {
        let segments = LayoutReconstructor::reconstruct(&two_by_two_page());
        assert_eq!(segments.len(), 1);
        let Segment::Table(rows) = &segments[0] else {
            panic!("expected a table segment");
        };
        assert_eq!(
            rows,
            &vec![
                vec!["Date".to_string(), "Balance".to_string()],
                vec!["01-01-2024".to_string(), "1200 EUR".to_string()],
            ]
        );
    }

    #[test]
    fn test_line_inside_table_is_suppressed() {
        let mut page = two_by_two_page();
        page.blocks
            .push(line("l1", "Date", bbox(0.15, 0.35, 0.2, 0.05)));
        page.blocks
            .push(line("l2", "Statement of Account", bbox(0.1, 0.05, 0.5, 0.05)));

        let segments = LayoutReconstructor::reconstruct(&page);
        assert_eq!(segments.len(), 2);
        assert_eq!(
            segments[0],
            Segment::Text("Statement of Account".to_string())
        );
        assert!(matches!(segments[1], Segment::Table(_)));
    }

    #[test]
    fn test_reading_order_is_top_to_bottom() {
        let page = OcrPage {
            blocks: vec![
                line("a", "footer", bbox(0.1, 0.9, 0.3, 0.04)),
                line("b", "header", bbox(0.1, 0.05, 0.3, 0.04)),
                line("c", "middle", bbox(0.1, 0.5, 0.3, 0.04)),
            ],
        };
        let segments = LayoutReconstructor::reconstruct(&page);
        assert_eq!(
            segments,
            vec![
                Segment::Text("header".to_string()),
                Segment::Text("middle".to_string()),
                Segment::Text("footer".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_grid_positions_are_empty() {
        let table = OcrBlock {
            id: "t1".to_string(),
            block_type: BlockType::Table,
            text: None,
            bounding_box: bbox(0.1, 0.1, 0.8, 0.2),
            child_ids: vec!["c11".to_string(), "c22".to_string()],
            row_index: None,
            column_index: None,
        };
        let page = OcrPage {
            blocks: vec![
                table,
                cell("c11", 1, 1, &["w1"]),
                cell("c22", 2, 2, &["w2"]),
                word("w1", "only"),
                word("w2", "diagonal"),
            ],
        };
        let segments = LayoutReconstructor::reconstruct(&page);
        let Segment::Table(rows) = &segments[0] else {
            panic!("expected a table segment");
        };
        assert_eq!(rows[0], vec!["only".to_string(), String::new()]);
        assert_eq!(rows[1], vec![String::new(), "diagonal".to_string()]);
    }

    #[test]
    fn test_render_brackets_tables() {
        let segments = vec![
            Segment::Text("intro".to_string()),
            Segment::Table(vec![vec!["a".to_string(), "b".to_string()]]),
        ];
        let text = LayoutReconstructor::render(&segments);
        assert!(text.contains("[TABLE]"));
        assert!(text.contains("a | b"));
        assert!(text.contains("[/TABLE]"));
    }
}
