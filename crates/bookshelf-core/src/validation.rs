//! Field validation for the write path
//!
//! Validators are plain functions from a candidate value to
//! `Result<(), ValidationError>`. They hold no state and know nothing about the
//! collection. `BookForm` bundles them for a whole record the way an edit form
//! would, including the "Other" category sentinel.

use std::fmt;

use chrono::Datelike;
use thiserror::Error;

use crate::models::{Book, BookPatch, Category, NewBook, ReadingStatus};

/// Earliest accepted publication year
pub const MIN_YEAR: i32 = 1000;

/// Minimum title length, in characters
pub const TITLE_MIN_LENGTH: usize = 2;

/// ISBN length bounds, hyphens included
pub const ISBN_MIN_LENGTH: usize = 10;
pub const ISBN_MAX_LENGTH: usize = 17;

/// Form fields that can fail validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Author,
    Year,
    Isbn,
    Description,
    Category,
    CustomCategory,
    CoverImage,
}

impl Field {
    /// Human-readable label used in messages
    pub fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Author => "Author",
            Field::Year => "Year",
            Field::Isbn => "ISBN",
            Field::Description => "Description",
            Field::Category => "Category",
            Field::CustomCategory => "Custom Category",
            Field::CoverImage => "Cover Image",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single field-level failure; `Display` is the user-facing message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: Field },

    #[error("{field} must be at least {min} characters")]
    MinLength { field: Field, min: usize },

    #[error("Year must be 4 digits")]
    InvalidYear,

    #[error("Year must be between 1000 and current year")]
    InvalidYearRange,

    #[error("ISBN must be 10-17 digits with optional hyphens")]
    InvalidIsbn,
}

impl ValidationError {
    /// Stable machine-readable name of the failure
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::Required { .. } => "required",
            ValidationError::MinLength { .. } => "minlength",
            ValidationError::InvalidYear => "invalidYear",
            ValidationError::InvalidYearRange => "invalidYearRange",
            ValidationError::InvalidIsbn => "invalidIsbn",
        }
    }

    /// The field this failure belongs to
    pub fn field(&self) -> Field {
        match self {
            ValidationError::Required { field } | ValidationError::MinLength { field, .. } => {
                *field
            }
            ValidationError::InvalidYear | ValidationError::InvalidYearRange => Field::Year,
            ValidationError::InvalidIsbn => Field::Isbn,
        }
    }
}

/// Validate an optional year against the current calendar year
pub fn validate_year(value: &str) -> Result<(), ValidationError> {
    validate_year_at(value, chrono::Local::now().year())
}

/// Validate an optional year: four ASCII digits within `[1000, current_year]`
pub fn validate_year_at(value: &str, current_year: i32) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }

    if value.len() != 4 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidYear);
    }

    let year: i32 = value.parse().map_err(|_| ValidationError::InvalidYear)?;
    if !(MIN_YEAR..=current_year).contains(&year) {
        return Err(ValidationError::InvalidYearRange);
    }

    Ok(())
}

/// Validate an optional ISBN: 10 to 17 characters, digits and hyphens only
pub fn validate_isbn(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }

    let len = value.chars().count();
    let well_formed = (ISBN_MIN_LENGTH..=ISBN_MAX_LENGTH).contains(&len)
        && value.chars().all(|c| c.is_ascii_digit() || c == '-');

    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::InvalidIsbn)
    }
}

/// Fail when the value is empty or only whitespace
pub fn validate_required(field: Field, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required { field })
    } else {
        Ok(())
    }
}

/// Fail when a non-empty value is shorter than `min` characters
///
/// Empty values pass; pair with `validate_required` when the field is mandatory.
pub fn validate_min_length(field: Field, value: &str, min: usize) -> Result<(), ValidationError> {
    if !value.is_empty() && value.chars().count() < min {
        Err(ValidationError::MinLength { field, min })
    } else {
        Ok(())
    }
}

/// Every failing field of a form, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// First failure recorded for `field`, if any
    pub fn for_field(&self, field: Field) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field() == field)
    }

    fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(e) = result {
            self.0.push(e);
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Two-field form representation of a category
///
/// A predefined category is selected directly. A custom one is entered as the
/// "Other" sentinel plus free text. Custom text is only demanded when "Other"
/// was picked in the form; a record already stored as plain "Other" keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryChoice {
    pub select: String,
    pub custom: String,
    /// Set when the user chose "Other" and must now name the category
    pub custom_required: bool,
}

impl CategoryChoice {
    /// A fresh selection, as made in the form
    pub fn pick(select: impl Into<String>) -> Self {
        let select = select.into();
        Self {
            custom_required: select.trim() == Category::OTHER,
            select,
            custom: String::new(),
        }
    }

    /// "Other" with the given custom text
    pub fn custom(text: impl Into<String>) -> Self {
        Self {
            select: Category::OTHER.to_string(),
            custom: text.into(),
            custom_required: true,
        }
    }

    pub fn from_category(category: Option<&Category>) -> Self {
        match category {
            None => Self::default(),
            Some(Category::Custom(name)) if name.is_empty() => Self::default(),
            Some(Category::Custom(name)) => Self::custom(name.clone()),
            Some(predefined) => Self {
                select: predefined.as_str().to_string(),
                custom: String::new(),
                custom_required: false,
            },
        }
    }

    /// Whether the custom text field is in play
    pub fn wants_custom(&self) -> bool {
        self.select.trim() == Category::OTHER
    }

    /// Resolve back to a category; errors only when custom text is required but missing
    pub fn into_category(self) -> Result<Option<Category>, ValidationError> {
        let select = self.select.trim();
        if select.is_empty() {
            return Ok(None);
        }
        if select == Category::OTHER {
            let custom = self.custom.trim();
            if !custom.is_empty() {
                return Ok(Some(Category::from(custom)));
            }
            if self.custom_required {
                return Err(ValidationError::Required {
                    field: Field::CustomCategory,
                });
            }
            return Ok(Some(Category::Other));
        }
        Ok(Some(Category::from(select)))
    }
}

/// Editable form data for one record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub year: String,
    pub isbn: String,
    pub description: String,
    pub category: CategoryChoice,
    pub cover_image: String,
    pub status: Option<ReadingStatus>,
}

impl BookForm {
    /// Populate a form for editing an existing record
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year.clone().unwrap_or_default(),
            isbn: book.isbn.clone().unwrap_or_default(),
            description: book.description.clone().unwrap_or_default(),
            category: CategoryChoice::from_category(book.category.as_ref()),
            cover_image: book.cover_image.clone().unwrap_or_default(),
            status: book.status,
        }
    }

    /// Run every field validator, collecting all failures
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.validate_at(chrono::Local::now().year())
    }

    pub fn validate_at(&self, current_year: i32) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title_required = validate_required(Field::Title, &self.title);
        let title_ok = title_required.is_ok();
        errors.check(title_required);
        if title_ok {
            errors.check(validate_min_length(
                Field::Title,
                self.title.trim(),
                TITLE_MIN_LENGTH,
            ));
        }
        errors.check(validate_required(Field::Author, &self.author));
        errors.check(validate_year_at(self.year.trim(), current_year));
        errors.check(validate_isbn(self.isbn.trim()));

        let category_required = validate_required(Field::Category, &self.category.select);
        let category_ok = category_required.is_ok();
        errors.check(category_required);
        if category_ok {
            errors.check(self.category.clone().into_category().map(|_| ()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and produce input for `add`
    pub fn into_new_book(self) -> Result<NewBook, ValidationErrors> {
        self.into_new_book_at(chrono::Local::now().year())
    }

    pub fn into_new_book_at(self, current_year: i32) -> Result<NewBook, ValidationErrors> {
        self.validate_at(current_year)?;
        let category = self.category.into_category().ok().flatten();
        Ok(NewBook {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            year: non_empty(self.year),
            isbn: non_empty(self.isbn),
            description: non_empty(self.description),
            category,
            cover_image: non_empty(self.cover_image),
            status: self.status,
        })
    }

    /// Validate and produce a patch overwriting every field of an existing record
    pub fn into_patch(self) -> Result<BookPatch, ValidationErrors> {
        self.into_patch_at(chrono::Local::now().year())
    }

    pub fn into_patch_at(self, current_year: i32) -> Result<BookPatch, ValidationErrors> {
        let new = self.into_new_book_at(current_year)?;
        Ok(BookPatch {
            title: Some(new.title),
            author: Some(new.author),
            year: Some(new.year),
            isbn: Some(new.isbn),
            description: Some(new.description),
            category: Some(new.category),
            cover_image: Some(new.cover_image),
            status: Some(new.status),
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> BookForm {
        BookForm {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            year: "1965".to_string(),
            isbn: "978-0441172719".to_string(),
            category: CategoryChoice::pick("Fiction"),
            ..BookForm::default()
        }
    }

    #[test]
    fn test_year_shape() {
        assert_eq!(validate_year_at("202X", 2024), Err(ValidationError::InvalidYear));
        assert_eq!(validate_year_at("99", 2024), Err(ValidationError::InvalidYear));
        assert_eq!(validate_year_at("500 BC", 2024), Err(ValidationError::InvalidYear));
        assert_eq!(validate_year_at("", 2024), Ok(()));
    }

    #[test]
    fn test_year_range() {
        assert_eq!(validate_year_at("1800", 2024), Ok(()));
        assert_eq!(validate_year_at("1000", 2024), Ok(()));
        assert_eq!(validate_year_at("2024", 2024), Ok(()));
        assert_eq!(
            validate_year_at("0999", 2024),
            Err(ValidationError::InvalidYearRange)
        );
        assert_eq!(
            validate_year_at("2025", 2024),
            Err(ValidationError::InvalidYearRange)
        );
    }

    #[test]
    fn test_year_uses_clock() {
        assert_eq!(validate_year("1925"), Ok(()));
        assert_eq!(validate_year("9999"), Err(ValidationError::InvalidYearRange));
    }

    #[test]
    fn test_isbn() {
        assert_eq!(validate_isbn("978-0-74-327356-5"), Ok(()));
        assert_eq!(validate_isbn("9780743273565"), Ok(()));
        assert_eq!(validate_isbn(""), Ok(()));
        assert_eq!(validate_isbn("abc"), Err(ValidationError::InvalidIsbn));
        assert_eq!(validate_isbn("123456789"), Err(ValidationError::InvalidIsbn));
        assert_eq!(
            validate_isbn("978-0-74-327356-5-1"),
            Err(ValidationError::InvalidIsbn)
        );
        assert_eq!(validate_isbn("012345678X"), Err(ValidationError::InvalidIsbn));
    }

    #[test]
    fn test_error_kinds_and_messages() {
        assert_eq!(ValidationError::InvalidYear.kind(), "invalidYear");
        assert_eq!(ValidationError::InvalidYearRange.kind(), "invalidYearRange");
        assert_eq!(ValidationError::InvalidIsbn.kind(), "invalidIsbn");

        let required = ValidationError::Required { field: Field::Title };
        assert_eq!(required.kind(), "required");
        assert_eq!(required.to_string(), "Title is required");

        let short = ValidationError::MinLength {
            field: Field::Title,
            min: 2,
        };
        assert_eq!(short.kind(), "minlength");
        assert_eq!(short.to_string(), "Title must be at least 2 characters");
    }

    #[test]
    fn test_required_and_min_length() {
        assert!(validate_required(Field::Author, "   ").is_err());
        assert!(validate_required(Field::Author, "A").is_ok());
        assert!(validate_min_length(Field::Title, "A", 2).is_err());
        assert!(validate_min_length(Field::Title, "", 2).is_ok());
        // Counted in characters, not bytes
        assert!(validate_min_length(Field::Title, "é", 2).is_err());
    }

    #[test]
    fn test_form_valid() {
        let new = valid_form().into_new_book_at(2024).unwrap();
        assert_eq!(new.title, "Dune");
        assert_eq!(new.category, Some(Category::Fiction));
        assert!(new.description.is_none());
        assert!(new.cover_image.is_none());
    }

    #[test]
    fn test_form_collects_all_errors() {
        let form = BookForm {
            title: "D".to_string(),
            year: "19x5".to_string(),
            isbn: "abc".to_string(),
            ..BookForm::default()
        };

        let errors = form.validate_at(2024).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert_eq!(errors.for_field(Field::Title).unwrap().kind(), "minlength");
        assert_eq!(errors.for_field(Field::Author).unwrap().kind(), "required");
        assert_eq!(errors.for_field(Field::Year).unwrap().kind(), "invalidYear");
        assert_eq!(errors.for_field(Field::Isbn).unwrap().kind(), "invalidIsbn");
        assert_eq!(errors.for_field(Field::Category).unwrap().kind(), "required");
    }

    #[test]
    fn test_custom_category_required_with_sentinel() {
        let mut form = valid_form();
        form.category = CategoryChoice::pick("Other");
        form.category.custom = " ".to_string();
        let errors = form.validate_at(2024).unwrap_err();
        assert_eq!(
            errors.for_field(Field::CustomCategory),
            Some(&ValidationError::Required {
                field: Field::CustomCategory
            })
        );

        form.category.custom = "Poetry".to_string();
        let new = form.into_new_book_at(2024).unwrap();
        assert_eq!(new.category, Some(Category::Custom("Poetry".to_string())));
    }

    #[test]
    fn test_category_choice_round_trip() {
        let custom = Category::Custom("Poetry".to_string());
        let choice = CategoryChoice::from_category(Some(&custom));
        assert!(choice.wants_custom());
        assert_eq!(choice.custom, "Poetry");
        assert_eq!(choice.into_category().unwrap(), Some(custom));

        let choice = CategoryChoice::from_category(Some(&Category::History));
        assert_eq!(choice.select, "History");
        assert!(choice.custom.is_empty());
        assert_eq!(choice.into_category().unwrap(), Some(Category::History));

        assert_eq!(
            CategoryChoice::from_category(None).into_category().unwrap(),
            None
        );
    }

    #[test]
    fn test_stored_other_survives_edit() {
        let book = Book::from_new(
            "5",
            NewBook::new("The Art of War", "Sun Tzu")
                .with_year("500 BC")
                .with_category(Category::Other),
        );

        let mut form = BookForm::from_book(&book);
        assert!(form.category.wants_custom());
        assert!(!form.category.custom_required);

        form.title = "The Art of War (Giles)".to_string();
        form.year = "1910".to_string();
        let patch = form.clone().into_patch_at(2024).unwrap();
        assert_eq!(patch.category, Some(Some(Category::Other)));

        // Choosing "Other" again in the form does demand the custom text
        form.category = CategoryChoice::pick("Other");
        let errors = form.validate_at(2024).unwrap_err();
        assert!(errors.for_field(Field::CustomCategory).is_some());
    }

    #[test]
    fn test_form_from_book_and_patch() {
        let book = Book::from_new(
            "42",
            NewBook::new("Leaves of Grass", "Walt Whitman")
                .with_year("1855")
                .with_category("Poetry"),
        );

        let form = BookForm::from_book(&book);
        assert_eq!(form.category.select, "Other");
        assert_eq!(form.category.custom, "Poetry");
        assert_eq!(form.year, "1855");

        let patch = form.into_patch_at(2024).unwrap();
        let mut edited = book.clone();
        patch.apply(&mut edited);
        assert_eq!(edited, book);
    }
}
