//! Filtering, sorting and pagination over a record snapshot
//!
//! Everything here is pure: functions take the full collection plus explicit
//! parameters and return a new derived sequence. Callers compose them as
//! filter, then sort, then paginate, and take the total count from the
//! filtered and sorted (pre-pagination) result. `derive_view` does exactly that.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::Book;

/// Page sizes offered to the user
pub const PAGE_SIZE_OPTIONS: [usize; 5] = [3, 6, 9, 12, 18];

/// Page size used until the user picks another
pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Sort key used when no sort is selected
pub const DEFAULT_SORT_KEY: &str = "title";

/// Filter predicates; empty strings are inactive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Case-insensitive substring over title, author, category and status
    pub search_query: String,
    /// Exact category match
    pub category: String,
    /// Year prefix
    pub year: String,
    /// Case-insensitive ISBN substring
    pub isbn: String,
}

impl BookFilter {
    pub fn is_empty(&self) -> bool {
        self.search_query.trim().is_empty()
            && self.category.trim().is_empty()
            && self.year.trim().is_empty()
            && self.isbn.trim().is_empty()
    }

    /// Whether `book` satisfies every active predicate
    pub fn matches(&self, book: &Book) -> bool {
        let search = self.search_query.trim().to_lowercase();
        let category = self.category.trim();
        let year = self.year.trim();
        let isbn = self.isbn.trim().to_lowercase();

        let matches_search = search.is_empty()
            || [
                book.title.as_str(),
                book.author.as_str(),
                book.category_str(),
                book.status_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&search));

        let matches_category = category.is_empty() || book.category_str() == category;

        let matches_year = year.is_empty() || book.year.as_deref().unwrap_or("").starts_with(year);

        let matches_isbn = isbn.is_empty()
            || book
                .isbn
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .contains(&isbn);

        matches_search && matches_category && matches_year && matches_isbn
    }
}

/// Keep the records matching every active predicate, in their incoming order
pub fn filter_books(books: &[Book], filter: &BookFilter) -> Vec<Book> {
    books
        .iter()
        .filter(|book| filter.matches(book))
        .cloned()
        .collect()
}

/// Field a view can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Author,
    Year,
    Category,
    Status,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Author => "author",
            SortField::Year => "year",
            SortField::Category => "category",
            SortField::Status => "status",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "title" => Some(SortField::Title),
            "author" => Some(SortField::Author),
            "year" => Some(SortField::Year),
            "category" => Some(SortField::Category),
            "status" => Some(SortField::Status),
            _ => None,
        }
    }
}

/// Direction of a two-axis sort gesture; `Neutral` means "no sort selected"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    Desc,
    #[default]
    Neutral,
}

impl SortDirection {
    /// Parse `"asc"`, `"desc"` or anything else as neutral
    pub fn parse(s: &str) -> Self {
        match s {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => SortDirection::Neutral,
        }
    }
}

/// A parsed sort key such as `title` or `year-desc`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(field: SortField) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub fn desc(field: SortField) -> Self {
        Self {
            field,
            descending: true,
        }
    }

    /// Parse the string vocabulary; unknown keys yield `None`
    pub fn parse(key: &str) -> Option<Self> {
        match key.strip_suffix("-desc") {
            Some(field) => SortField::parse(field).map(Self::desc),
            None => SortField::parse(key).map(Self::asc),
        }
    }

    fn compare(self, a: &Book, b: &Book) -> Ordering {
        let ordering = match self.field {
            SortField::Title => locale_cmp(&a.title, &b.title),
            SortField::Author => locale_cmp(&a.author, &b.author),
            SortField::Year => year_number(a).cmp(&year_number(b)),
            SortField::Category => locale_cmp(a.category_str(), b.category_str()),
            SortField::Status => locale_cmp(a.status_str(), b.status_str()),
        };
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "{}-desc", self.field.as_str())
        } else {
            f.write_str(self.field.as_str())
        }
    }
}

/// Stable sort over a copy; unknown keys leave the order unchanged
pub fn sort_books(books: &[Book], key: &str) -> Vec<Book> {
    match SortKey::parse(key) {
        Some(key) => sort_books_by(books, key),
        None => books.to_vec(),
    }
}

/// Stable sort over a copy by a parsed key
pub fn sort_books_by(books: &[Book], key: SortKey) -> Vec<Book> {
    let mut sorted = books.to_vec();
    sorted.sort_by(|a, b| key.compare(a, b));
    sorted
}

/// Translate a (field, direction) sort gesture into a sort key string
pub fn compute_sort_key(active: &str, direction: SortDirection, default_key: &str) -> String {
    match direction {
        SortDirection::Neutral => default_key.to_string(),
        SortDirection::Desc => format!("{}-desc", active),
        SortDirection::Asc => active.to_string(),
    }
}

/// The `[page_index * page_size, page_index * page_size + page_size)` window
///
/// Out-of-range pages and a zero page size yield an empty slice.
pub fn paginate<T>(items: &[T], page_index: usize, page_size: usize) -> &[T] {
    let Some(start) = page_index.checked_mul(page_size) else {
        return &[];
    };
    if page_size == 0 || start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Number of pages needed to show `total` items
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

/// Every input of the derived view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewParams {
    pub filter: BookFilter,
    pub sort_key: String,
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            filter: BookFilter::default(),
            sort_key: DEFAULT_SORT_KEY.to_string(),
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewParams {
    /// True when anything differs from a fresh, unfiltered, title-sorted view
    pub fn has_active_filters(&self) -> bool {
        !self.filter.search_query.trim().is_empty()
            || !self.filter.category.trim().is_empty()
            || !self.filter.year.trim().is_empty()
            || !self.filter.isbn.trim().is_empty()
            || self.sort_key != DEFAULT_SORT_KEY
    }

    /// Back to defaults, keeping the chosen page size
    pub fn reset(&mut self) {
        *self = Self {
            page_size: self.page_size,
            ..Self::default()
        };
    }
}

/// The visible page plus the pre-pagination count
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedView {
    pub visible: Vec<Book>,
    pub total_count: usize,
    pub page_index: usize,
    pub page_size: usize,
}

impl DerivedView {
    pub fn page_count(&self) -> usize {
        page_count(self.total_count, self.page_size)
    }
}

/// Filter, sort, then paginate
pub fn derive_view(books: &[Book], params: &ViewParams) -> DerivedView {
    let filtered = filter_books(books, &params.filter);
    let sorted = sort_books(&filtered, &params.sort_key);
    let visible = paginate(&sorted, params.page_index, params.page_size).to_vec();

    DerivedView {
        visible,
        total_count: sorted.len(),
        page_index: params.page_index,
        page_size: params.page_size,
    }
}

/// Distinct non-empty categories present in the collection, sorted
pub fn available_categories(books: &[Book]) -> Vec<String> {
    let categories: BTreeSet<&str> = books
        .iter()
        .map(Book::category_str)
        .filter(|c| !c.is_empty())
        .collect();
    categories.into_iter().map(str::to_string).collect()
}

/// Compare strings the way a reader expects: accents and case only break ties
///
/// On a tie, lowercase sorts before uppercase, then unaccented before accented.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| case_key(a).cmp(&case_key(b)))
        .then_with(|| a.cmp(b))
}

fn strip_marks(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfkd().filter(|c| !is_combining_mark(*c))
}

fn collation_key(s: &str) -> String {
    strip_marks(s).flat_map(char::to_lowercase).collect()
}

/// Case-swapped form, so lowercase orders first
fn case_key(s: &str) -> String {
    strip_marks(s)
        .flat_map(|c| -> Box<dyn Iterator<Item = char>> {
            if c.is_lowercase() {
                Box::new(c.to_uppercase())
            } else if c.is_uppercase() {
                Box::new(c.to_lowercase())
            } else {
                Box::new(std::iter::once(c))
            }
        })
        .collect()
}

/// Leading integer of the year field; anything else counts as 0
fn year_number(book: &Book) -> i64 {
    let Some(year) = book.year.as_deref() else {
        return 0;
    };
    let trimmed = year.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}
