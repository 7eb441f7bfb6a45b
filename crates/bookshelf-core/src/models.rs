//! Data models for Bookshelf
//!
//! Defines the catalog record (`Book`), its write-path inputs (`NewBook`,
//! `BookPatch`) and the small closed vocabularies attached to a record
//! (`Category`, `ReadingStatus`).
//!
//! Records are serialized as camelCase JSON so seed resources and arrays
//! persisted by earlier versions load unchanged. Read paths are lenient:
//! stored data may predate validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::warn;

/// Placeholder cover shown for records without an inline image
pub const DEFAULT_COVER_IMAGE: &str =
    "https://images.unsplash.com/photo-1481627834876-b7833e8f5570?w=400&h=600&fit=crop&crop=center";

/// A single catalog record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Opaque unique identifier, assigned at creation
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    /// Publication year; usually four digits but legacy values are kept as-is
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_text"
    )]
    pub year: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_text"
    )]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Inline-encoded image (data URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_status"
    )]
    pub status: Option<ReadingStatus>,
}

impl Book {
    /// Materialize a record from write-path input and a freshly assigned id
    pub fn from_new(id: impl Into<String>, new: NewBook) -> Self {
        Self {
            id: id.into(),
            title: new.title,
            author: new.author,
            year: new.year,
            isbn: new.isbn,
            description: new.description,
            category: new.category,
            cover_image: new.cover_image,
            status: new.status,
        }
    }

    /// The cover image, or the shared placeholder when none is set
    pub fn cover_or_default(&self) -> &str {
        match self.cover_image.as_deref() {
            Some(cover) if !cover.is_empty() => cover,
            _ => DEFAULT_COVER_IMAGE,
        }
    }

    /// Category display string, empty when unset
    pub fn category_str(&self) -> &str {
        self.category.as_ref().map(Category::as_str).unwrap_or("")
    }

    /// Status display string, empty when unset
    pub fn status_str(&self) -> &str {
        self.status.map(ReadingStatus::as_str).unwrap_or("")
    }
}

/// A record before it has been assigned an id
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReadingStatus>,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Self::default()
        }
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<Category>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_cover_image(mut self, cover_image: impl Into<String>) -> Self {
        self.cover_image = Some(cover_image.into());
        self
    }

    pub fn with_status(mut self, status: ReadingStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// A shallow partial update
///
/// `None` leaves a field untouched. For optional record fields the inner
/// option distinguishes "set" (`Some(Some(v))`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<Option<String>>,
    pub isbn: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub category: Option<Option<Category>>,
    pub cover_image: Option<Option<String>>,
    pub status: Option<Option<ReadingStatus>>,
}

impl BookPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn year(mut self, year: Option<String>) -> Self {
        self.year = Some(year);
        self
    }

    pub fn isbn(mut self, isbn: Option<String>) -> Self {
        self.isbn = Some(isbn);
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn category(mut self, category: Option<Category>) -> Self {
        self.category = Some(category);
        self
    }

    pub fn cover_image(mut self, cover_image: Option<String>) -> Self {
        self.cover_image = Some(cover_image);
        self
    }

    pub fn status(mut self, status: Option<ReadingStatus>) -> Self {
        self.status = Some(status);
        self
    }

    /// True when applying this patch would change nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the present fields over `book`; the id is never touched
    pub fn apply(&self, book: &mut Book) {
        if let Some(ref title) = self.title {
            book.title = title.clone();
        }
        if let Some(ref author) = self.author {
            book.author = author.clone();
        }
        if let Some(ref year) = self.year {
            book.year = year.clone();
        }
        if let Some(ref isbn) = self.isbn {
            book.isbn = isbn.clone();
        }
        if let Some(ref description) = self.description {
            book.description = description.clone();
        }
        if let Some(ref category) = self.category {
            book.category = category.clone();
        }
        if let Some(ref cover_image) = self.cover_image {
            book.cover_image = cover_image.clone();
        }
        if let Some(status) = self.status {
            book.status = status;
        }
    }
}

/// Display tone used to color-code categories and statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Primary,
    Accent,
    Warn,
}

/// Book category: one of the predefined values or free text
///
/// `Other` is the sentinel a form offers to switch to custom text entry; it is
/// also a legitimate stored value in its own right.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Fiction,
    Science,
    History,
    Biography,
    Other,
    Custom(String),
}

impl Category {
    /// Predefined categories, in the order a form offers them
    pub const PREDEFINED: [Category; 5] = [
        Category::Fiction,
        Category::Science,
        Category::History,
        Category::Biography,
        Category::Other,
    ];

    /// The sentinel select value
    pub const OTHER: &'static str = "Other";

    pub fn as_str(&self) -> &str {
        match self {
            Category::Fiction => "Fiction",
            Category::Science => "Science",
            Category::History => "History",
            Category::Biography => "Biography",
            Category::Other => Self::OTHER,
            Category::Custom(name) => name,
        }
    }

    pub fn is_predefined(&self) -> bool {
        !matches!(self, Category::Custom(_))
    }

    pub fn tone(&self) -> Tone {
        match self {
            Category::Science | Category::Other => Tone::Accent,
            Category::History => Tone::Warn,
            Category::Fiction | Category::Biography | Category::Custom(_) => Tone::Primary,
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Fiction" => Category::Fiction,
            "Science" => Category::Science,
            "History" => Category::History,
            "Biography" => Category::Biography,
            "Other" => Category::Other,
            _ => Category::Custom(s),
        }
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reading progress of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadingStatus {
    #[serde(rename = "Want to Read")]
    WantToRead,
    #[serde(rename = "Currently Reading")]
    CurrentlyReading,
    #[serde(rename = "Read")]
    Read,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [
        ReadingStatus::WantToRead,
        ReadingStatus::CurrentlyReading,
        ReadingStatus::Read,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReadingStatus::WantToRead => "Want to Read",
            ReadingStatus::CurrentlyReading => "Currently Reading",
            ReadingStatus::Read => "Read",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            ReadingStatus::WantToRead => Tone::Accent,
            ReadingStatus::CurrentlyReading => Tone::Primary,
            ReadingStatus::Read => Tone::Warn,
        }
    }

    /// Material icon name for the status
    pub fn icon(status: Option<Self>) -> &'static str {
        match status {
            Some(ReadingStatus::WantToRead) => "bookmark_border",
            Some(ReadingStatus::CurrentlyReading) => "auto_stories",
            Some(ReadingStatus::Read) => "check_circle",
            None => "book",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no reading status
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown reading status: '{0}' (expected 'Want to Read', 'Currently Reading' or 'Read')")]
pub struct UnknownStatus(pub String);

impl FromStr for ReadingStatus {
    type Err = UnknownStatus;

    /// Accepts the display labels as well as kebab/snake spellings, any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| if c == '-' || c == '_' { ' ' } else { c })
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "want to read" => Ok(ReadingStatus::WantToRead),
            "currently reading" => Ok(ReadingStatus::CurrentlyReading),
            "read" => Ok(ReadingStatus::Read),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Accept strings, numbers or null for free-form text fields
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Unknown status strings are read as "no status" rather than failing the record
fn lenient_status<'de, D>(deserializer: D) -> Result<Option<ReadingStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) if s.is_empty() => None,
        Some(serde_json::Value::String(s)) => match s.parse() {
            Ok(status) => Some(status),
            Err(e) => {
                warn!("Ignoring stored status: {}", e);
                None
            }
        },
        Some(other) => {
            warn!("Ignoring non-string stored status: {}", other);
            None
        }
    })
}
