use crate::models::Segment;

/// Footnote-ish words that mark an interrupting text line as belonging
/// to the statement table it follows rather than ending it.
const CONTINUATION_KEYWORDS: [&str; 7] =
    ["batch", "cr", "dr", "interest", "balance", "tax", "deposit"];

/// Re-joins tables that OCR split across captions, footnotes, or page
/// boundaries.
///
/// Scan state is the currently open table. Table segments concatenate
/// into it; a text segment containing a continuation keyword is folded
/// onto the open table's last row as an extra unlabeled cell; any other
/// text closes the table. A best-effort heuristic, not a guarantee.
pub struct TableMerger;

impl TableMerger {
    pub fn merge(segments: Vec<Segment>) -> Vec<Segment> {
        let mut merged = Vec::new();
        let mut open_table: Option<Vec<Vec<String>>> = None;

        for segment in segments {
            match segment {
                Segment::Table(rows) => match open_table.as_mut() {
                    Some(table) => table.extend(rows),
                    None => open_table = Some(rows),
                },
                Segment::Text(text) => {
                    let continuation = open_table.is_some() && Self::is_continuation(&text);
                    if continuation {
                        let table = open_table.as_mut().unwrap();
                        match table.last_mut() {
                            Some(row) => row.push(text),
                            // A table that arrived with zero rows still
                            // accepts the caption as its first row.
                            None => table.push(vec![text]),
                        }
                    } else {
                        if let Some(table) = open_table.take() {
                            merged.push(Segment::Table(table));
                        }
                        merged.push(Segment::Text(text));
                    }
                }
            }
        }

        if let Some(table) = open_table {
            merged.push(Segment::Table(table));
        }

        merged
    }

    fn is_continuation(text: &str) -> bool {
        let lowered = text.to_lowercase();
        CONTINUATION_KEYWORDS.iter().any(|k| lowered.contains(k))
    }
}
