//! Page selection and bounds filtering.

/// Which pages of a document to extract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Every page in the document.
    #[default]
    All,
    /// An explicit set of 1-indexed page numbers.
    Explicit(Vec<usize>),
}

impl PageSelection {
    pub fn explicit(pages: impl IntoIterator<Item = usize>) -> Self {
        Self::Explicit(pages.into_iter().collect())
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }

    /// Resolve against a document's page count: ascending, deduplicated,
    /// with out-of-range numbers silently dropped. An explicit selection
    /// that resolves to nothing is the caller's `NoValidPages` condition.
    pub fn resolve(&self, page_count: usize) -> Vec<usize> {
        match self {
            Self::All => (1..=page_count).collect(),
            Self::Explicit(pages) => {
                let mut valid: Vec<usize> = pages
                    .iter()
                    .copied()
                    .filter(|p| (1..=page_count).contains(p))
                    .collect();
                valid.sort_unstable();
                valid.dedup();
                valid
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_resolves_to_every_page() {
        assert_eq!(PageSelection::All.resolve(3), vec![1, 2, 3]);
        assert!(PageSelection::All.resolve(0).is_empty());
    }

    #[test]
    fn out_of_range_pages_are_silently_dropped() {
        let sel = PageSelection::explicit([1, 9999]);
        assert_eq!(sel.resolve(5), vec![1]);
    }

    #[test]
    fn entirely_out_of_range_resolves_empty() {
        let sel = PageSelection::explicit([9999]);
        assert!(sel.resolve(5).is_empty());
        let sel = PageSelection::explicit([0]);
        assert!(sel.resolve(5).is_empty());
    }

    #[test]
    fn resolution_sorts_and_dedupes() {
        let sel = PageSelection::explicit([3, 1, 3, 2]);
        assert_eq!(sel.resolve(5), vec![1, 2, 3]);
    }
}
