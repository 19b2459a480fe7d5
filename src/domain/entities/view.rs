use crate::domain::entities::record::Record;

pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Sort after a header click: same field flips, a new field starts ascending.
    pub fn toggled(current: Option<&SortSpec>, field: &str) -> Self {
        match current {
            Some(spec) if spec.field == field => Self {
                field: spec.field.clone(),
                direction: spec.direction.flipped(),
            },
            _ => Self::asc(field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFilter {
    pub field: String,
    pub term: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter {
    pub field: String,
    pub value: bool,
}

/// Conjunction of optional predicates; an empty filter keeps every record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSpec {
    pub search: Option<TextFilter>,
    pub category: Option<CategoryFilter>,
    pub status: Option<StatusFilter>,
}

impl FilterSpec {
    pub fn search(mut self, field: impl Into<String>, term: impl Into<String>) -> Self {
        self.search = Some(TextFilter {
            field: field.into(),
            term: term.into(),
        });
        self
    }

    pub fn category(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.category = Some(CategoryFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn status(mut self, field: impl Into<String>, value: bool) -> Self {
        self.status = Some(StatusFilter {
            field: field.into(),
            value,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        let search_inactive = self
            .search
            .as_ref()
            .map_or(true, |filter| filter.term.is_empty());
        let category_inactive = self
            .category
            .as_ref()
            .map_or(true, |filter| filter.value.is_empty());
        search_inactive && category_inactive && self.status.is_none()
    }
}

/// A window over a server-side ordered collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub page_number: u32,
    pub total_count: u64,
    pub page_size: u32,
    pub total_pages: u32,
    pub next: Option<String>,
}

impl<R: Record> Page<R> {
    pub fn from_envelope(
        items: Vec<R>,
        page_number: u32,
        total_count: u64,
        page_size: u32,
        next: Option<String>,
    ) -> Self {
        let page_size = page_size.max(1);
        Self {
            items,
            page_number: page_number.max(1),
            total_count,
            page_size,
            total_pages: total_pages(total_count, page_size),
            next,
        }
    }

    /// Unpaginated responses are one full page, whatever their length.
    pub fn single(items: Vec<R>) -> Self {
        let total_count = items.len() as u64;
        let page_size = u32::try_from(items.len()).unwrap_or(u32::MAX).max(1);
        Self {
            items,
            page_number: 1,
            total_count,
            page_size,
            total_pages: 1,
            next: None,
        }
    }
}

pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let pages = total_count.div_ceil(u64::from(page_size.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX)
}
