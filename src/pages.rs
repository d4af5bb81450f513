use std::collections::BTreeSet;

/// Which pages of the document to export.
///
/// Parsed once per conversion request from the free-text page field and never
/// mutated afterwards. Indices are 0-based; the user types 1-based numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelection {
    All,
    Pages(BTreeSet<usize>),
}

impl PageSelection {
    /// Parse a comma-separated list of 1-based page numbers, e.g. "1,3,5".
    ///
    /// Tokens that are not purely ASCII digits are dropped rather than
    /// rejected (so "2,x,4" selects pages 2 and 4). "0" is dropped too since
    /// there is no page before page 1. An empty string, or a string with no
    /// surviving token, means every page.
    pub fn parse(spec: &str) -> Self {
        let pages: BTreeSet<usize> = spec
            .split(',')
            .filter(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()))
            .filter_map(|t| t.parse::<usize>().ok())
            .filter(|&n| n >= 1)
            .map(|n| n - 1)
            .collect();

        if pages.is_empty() {
            PageSelection::All
        } else {
            PageSelection::Pages(pages)
        }
    }

    /// Whether the page at 0-based position `span_index` within the
    /// rasterized span should be written out.
    pub fn keeps(&self, span_index: usize) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Pages(pages) => pages.contains(&span_index),
        }
    }

    /// Smallest and largest selected index, when the selection is explicit.
    pub fn bounds(&self) -> Option<(usize, usize)> {
        match self {
            PageSelection::All => None,
            PageSelection::Pages(pages) => {
                let min = *pages.iter().next()?;
                let max = *pages.iter().next_back()?;
                Some((min, max))
            }
        }
    }
}
