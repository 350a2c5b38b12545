// Timeline Module
// Holds the ordered lines of a race file for sequential replay.

use std::path::Path;

/// One non-empty line of a race file, with its position in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineEntry<'a> {
    /// Zero-based position among the replayable records
    pub index: usize,
    /// One-based line number in the source file
    pub line_number: usize,
    pub line: &'a str,
    /// Raw line of the preceding record, `None` for the first record
    pub previous: Option<&'a str>,
}

/// Ordered, immutable sequence of race file lines.
///
/// Empty and whitespace-only lines are dropped at load time, which also
/// covers the trailing empty line left by a final newline.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    /// (line number, line) pairs in replay order
    lines: Vec<(usize, String)>,
}

impl Timeline {
    /// Load a timeline from a race file on disk
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from_text(&content))
    }

    /// Build a timeline from the full text of a race file
    pub fn from_text(content: &str) -> Self {
        let lines = content
            .split('\n')
            .enumerate()
            .map(|(i, line)| (i + 1, line.strip_suffix('\r').unwrap_or(line)))
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(number, line)| (number, line.to_string()))
            .collect();
        Self { lines }
    }

    /// Number of replayable records
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get the record at `index` together with its predecessor
    pub fn entry(&self, index: usize) -> Option<TimelineEntry<'_>> {
        let (line_number, line) = self.lines.get(index)?;
        let previous = index
            .checked_sub(1)
            .and_then(|prev| self.lines.get(prev))
            .map(|(_, line)| line.as_str());

        Some(TimelineEntry {
            index,
            line_number: *line_number,
            line,
            previous,
        })
    }

    /// Iterate over all records in replay order
    pub fn entries(&self) -> impl Iterator<Item = TimelineEntry<'_>> {
        (0..self.len()).filter_map(move |index| self.entry(index))
    }
}
