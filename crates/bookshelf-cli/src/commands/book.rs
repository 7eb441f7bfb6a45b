//! Book command handlers

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use bookshelf_core::query::{
    available_categories, compute_sort_key, SortDirection, SortField, DEFAULT_SORT_KEY,
};
use bookshelf_core::{
    derive_view, Book, BookFilter, BookForm, BookStore, Category, CategoryChoice, Config,
    Notifier, ReadingStatus, ViewParams,
};

use crate::cover::encode_cover;
use crate::editor::{confirm, edit_text};
use crate::output::Output;

/// Filter, sort and paging flags for `list`
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Match title, author, category or status
    #[arg(short, long)]
    pub search: Option<String>,
    /// Exact category
    #[arg(short, long)]
    pub category: Option<String>,
    /// Year prefix (e.g. 19 or 1984)
    #[arg(short, long)]
    pub year: Option<String>,
    /// ISBN fragment
    #[arg(long)]
    pub isbn: Option<String>,
    /// Sort by title, author, year, category or status
    #[arg(long)]
    pub sort: Option<String>,
    /// Reverse the sort
    #[arg(long, requires = "sort")]
    pub desc: bool,
    /// Page number, starting at 1
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub page: u64,
    /// Books per page (default from config)
    #[arg(long)]
    pub page_size: Option<usize>,
}

impl ListArgs {
    /// Translate flags into view parameters
    pub fn into_params(self, default_page_size: usize) -> Result<ViewParams> {
        let sort_key = match self.sort.as_deref() {
            None => DEFAULT_SORT_KEY.to_string(),
            Some(field) => {
                if SortField::parse(field).is_none() {
                    bail!(
                        "Unknown sort field: '{}'\n\
                         Valid fields: title, author, year, category, status",
                        field
                    );
                }
                let direction = if self.desc {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                };
                compute_sort_key(field, direction, DEFAULT_SORT_KEY)
            }
        };

        Ok(ViewParams {
            filter: BookFilter {
                search_query: self.search.unwrap_or_default(),
                category: self.category.unwrap_or_default(),
                year: self.year.unwrap_or_default(),
                isbn: self.isbn.unwrap_or_default(),
            },
            sort_key,
            page_index: self.page.saturating_sub(1) as usize,
            page_size: self.page_size.unwrap_or(default_page_size),
        })
    }
}

/// Field flags shared by `add` and `edit`
#[derive(Args, Debug, Clone, Default)]
pub struct BookArgs {
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub author: Option<String>,
    /// Four-digit publication year
    #[arg(short, long)]
    pub year: Option<String>,
    #[arg(long)]
    pub isbn: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Fiction, Science, History, Biography, Other, or any custom name
    #[arg(short, long)]
    pub category: Option<String>,
    /// Custom category name (implies --category Other)
    #[arg(long)]
    pub custom_category: Option<String>,
    /// Image file to embed as the cover
    #[arg(long, value_name = "PATH")]
    pub cover: Option<PathBuf>,
    /// Want to Read, Currently Reading or Read
    #[arg(long)]
    pub status: Option<String>,
}

impl BookArgs {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.year.is_none()
            && self.isbn.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.custom_category.is_none()
            && self.cover.is_none()
            && self.status.is_none()
    }

    /// Overwrite the form fields that were given on the command line
    pub fn apply_to(self, form: &mut BookForm) -> Result<()> {
        if let Some(title) = self.title {
            form.title = title;
        }
        if let Some(author) = self.author {
            form.author = author;
        }
        if let Some(year) = self.year {
            form.year = year;
        }
        if let Some(isbn) = self.isbn {
            form.isbn = isbn;
        }
        if let Some(description) = self.description {
            form.description = description;
        }
        if let Some(choice) = category_choice(self.category, self.custom_category) {
            form.category = choice;
        }
        if let Some(path) = self.cover {
            form.cover_image = encode_cover(&path)?;
        }
        if let Some(status) = self.status {
            form.status = parse_status(&status)?;
        }
        Ok(())
    }
}

/// Map the two category flags onto the form's select/custom pair
///
/// A category name outside the predefined set is treated as custom text.
fn category_choice(category: Option<String>, custom: Option<String>) -> Option<CategoryChoice> {
    match (category, custom) {
        (None, None) => None,
        (None, Some(custom)) => Some(CategoryChoice::custom(custom)),
        (Some(select), custom) => {
            let select = Category::PREDEFINED
                .iter()
                .find(|c| c.as_str().eq_ignore_ascii_case(select.trim()))
                .map(|c| c.as_str().to_string())
                .unwrap_or(select);
            if !select.is_empty() && !Category::from(select.trim()).is_predefined() {
                return Some(CategoryChoice::custom(select));
            }
            let mut choice = CategoryChoice::pick(select);
            choice.custom = custom.unwrap_or_default();
            Some(choice)
        }
    }
}

/// Parse a status flag; empty or "none" clears it
fn parse_status(value: &str) -> Result<Option<ReadingStatus>> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    Ok(Some(value.parse()?))
}

/// List books
pub fn list(store: &BookStore, args: ListArgs, config: &Config, output: &Output) -> Result<()> {
    let params = args.into_params(config.page_size)?;
    let view = derive_view(&store.snapshot(), &params);
    output.print_view(&view, params.has_active_filters());
    Ok(())
}

/// Show a single book
pub fn show(store: &BookStore, id: &str, output: &Output) -> Result<()> {
    let book = resolve_book(store, id)?;
    output.print_book(&book);
    Ok(())
}

/// Add a book from command-line fields
pub fn add(store: &BookStore, fields: BookArgs, notifier: &Notifier, output: &Output) -> Result<()> {
    let mut form = BookForm::default();
    fields.apply_to(&mut form)?;

    let new_book = match form.into_new_book() {
        Ok(new_book) => new_book,
        Err(errors) => {
            notifier.error("Please fill in all required fields correctly");
            return Err(errors).context("Book not added");
        }
    };

    let id = store.add(new_book);
    notifier.success("Book added successfully");

    let book = resolve_book(store, &id)?;
    output.print_book(&book);
    Ok(())
}

/// Edit a book
pub fn edit(
    store: &BookStore,
    id: &str,
    fields: BookArgs,
    edit_description: bool,
    notifier: &Notifier,
    output: &Output,
) -> Result<()> {
    let book = resolve_book(store, id)?;
    let mut form = BookForm::from_book(&book);

    if fields.is_empty() && !edit_description && output.should_prompt() {
        prompt_form(&mut form)?;
    } else {
        fields.apply_to(&mut form)?;
    }

    if edit_description {
        form.description = edit_text(&form.description)?.trim_end().to_string();
    }

    let patch = match form.into_patch() {
        Ok(patch) => patch,
        Err(errors) => {
            notifier.error("Please fill in all required fields correctly");
            return Err(errors).context("Book not updated");
        }
    };

    if !store.update(&book.id, &patch) {
        bail!("Book not found: {}", id);
    }
    notifier.success("Book updated successfully");

    let updated = resolve_book(store, &book.id)?;
    output.print_book(&updated);
    Ok(())
}

/// Delete a book
pub fn delete(
    store: &BookStore,
    id: &str,
    force: bool,
    notifier: &Notifier,
    output: &Output,
) -> Result<()> {
    let book = resolve_book(store, id)?;

    if output.should_prompt() && !force {
        println!("Delete book: {} - {}", short_id(&book.id), book.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.delete(&book.id);
    notifier.success("Book deleted successfully");
    Ok(())
}

/// Discard local changes and reload the seed records
pub async fn reset(
    store: &BookStore,
    force: bool,
    notifier: &Notifier,
    output: &Output,
) -> Result<()> {
    if output.should_prompt() && !force {
        println!("This removes every book you added and undoes all edits.");
        if !confirm("Reset the catalog?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.reset_to_seed().await;
    notifier.info(format!("Catalog reset to {} books", store.len()));
    Ok(())
}

/// List categories in use with their book counts
pub fn categories(store: &BookStore, output: &Output) -> Result<()> {
    let books = store.snapshot();

    let mut counts: BTreeMap<String, usize> = available_categories(&books)
        .into_iter()
        .map(|c| (c, 0))
        .collect();
    for book in &books {
        if let Some(count) = counts.get_mut(book.category_str()) {
            *count += 1;
        }
    }

    let categories: Vec<(String, usize)> = counts.into_iter().collect();
    output.print_categories(&categories);
    Ok(())
}

/// Find a book by full ID or unique prefix
fn resolve_book(store: &BookStore, id: &str) -> Result<Book> {
    if let Some(book) = store.get(id) {
        return Ok(book);
    }

    let books = store.snapshot();
    let matches: Vec<_> = books.iter().filter(|b| b.id.starts_with(id)).collect();

    match matches.len() {
        0 => bail!("No book found matching: {}", id),
        1 => Ok(matches[0].clone()),
        _ => {
            eprintln!("Multiple books match '{}':", id);
            for book in &matches {
                eprintln!("  {} - {}", book.id, book.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Walk through every field, keeping the current value on Enter
fn prompt_form(form: &mut BookForm) -> Result<()> {
    println!("Press Enter to keep current value, or type new value.\n");

    if let Some(title) = prompt_with_default("Title", &form.title)? {
        form.title = title;
    }
    if let Some(author) = prompt_with_default("Author", &form.author)? {
        form.author = author;
    }
    if let Some(year) = prompt_with_default("Year", &form.year)? {
        form.year = year;
    }
    if let Some(isbn) = prompt_with_default("ISBN", &form.isbn)? {
        form.isbn = isbn;
    }

    let current_category = if form.category.wants_custom() && !form.category.custom.is_empty() {
        form.category.custom.clone()
    } else {
        form.category.select.clone()
    };
    if let Some(category) = prompt_with_default("Category", &current_category)? {
        if let Some(choice) = category_choice(Some(category), None) {
            form.category = choice;
        }
    }
    if form.category.custom_required && form.category.custom.trim().is_empty() {
        if let Some(custom) = prompt_with_default("Custom Category", "")? {
            form.category.custom = custom;
        }
    }

    let current_status = form.status.map(|s| s.as_str()).unwrap_or("");
    if let Some(status) = prompt_with_default("Status", current_status)? {
        form.status = parse_status(&status)?;
    }

    Ok(())
}

/// Prompt with a default value, returns None if user keeps default
fn prompt_with_default(prompt: &str, default: &str) -> Result<Option<String>> {
    use std::io::{self, Write};

    if default.is_empty() {
        print!("{}: ", prompt);
    } else {
        print!("{} [{}]: ", prompt, default);
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.is_empty() {
        Ok(None)
    } else {
        Ok(Some(input.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_core::seed::SeedLoader;
    use bookshelf_core::storage::{BookStorage, MemoryStore};
    use bookshelf_core::NotificationKind;

    use crate::output::OutputFormat;

    async fn seeded_store() -> BookStore {
        let store = BookStore::new(BookStorage::new(MemoryStore::new()), SeedLoader::default());
        store.initialize().await;
        store
    }

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    fn dune() -> BookArgs {
        BookArgs {
            title: Some("Dune".to_string()),
            author: Some("Frank Herbert".to_string()),
            year: Some("1965".to_string()),
            category: Some("Fiction".to_string()),
            status: Some("want-to-read".to_string()),
            ..BookArgs::default()
        }
    }

    #[test]
    fn test_list_args_defaults() {
        let params = ListArgs {
            page: 1,
            ..ListArgs::default()
        }
        .into_params(6)
        .unwrap();

        assert_eq!(params, ViewParams::default());
        assert!(!params.has_active_filters());
    }

    #[test]
    fn test_list_args_sort_and_page() {
        let params = ListArgs {
            sort: Some("year".to_string()),
            desc: true,
            page: 3,
            page_size: Some(9),
            ..ListArgs::default()
        }
        .into_params(6)
        .unwrap();

        assert_eq!(params.sort_key, "year-desc");
        assert_eq!(params.page_index, 2);
        assert_eq!(params.page_size, 9);
    }

    #[test]
    fn test_list_args_rejects_unknown_sort() {
        let result = ListArgs {
            sort: Some("pages".to_string()),
            page: 1,
            ..ListArgs::default()
        }
        .into_params(6);

        assert!(result.is_err());
    }

    #[test]
    fn test_category_choice() {
        assert_eq!(category_choice(None, None), None);

        let predefined = category_choice(Some("Science".to_string()), None).unwrap();
        assert_eq!(predefined.select, "Science");
        assert!(!predefined.wants_custom());

        let any_case = category_choice(Some("history".to_string()), None).unwrap();
        assert_eq!(any_case.select, "History");

        let custom = category_choice(Some("Fantasy".to_string()), None).unwrap();
        assert_eq!(custom.select, "Other");
        assert_eq!(custom.custom, "Fantasy");

        let implied = category_choice(None, Some("Poetry".to_string())).unwrap();
        assert!(implied.wants_custom());
        assert_eq!(implied.custom, "Poetry");
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(
            parse_status("currently-reading").unwrap(),
            Some(ReadingStatus::CurrentlyReading)
        );
        assert_eq!(parse_status("none").unwrap(), None);
        assert!(parse_status("abandoned").is_err());
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("1"), "1");
        assert_eq!(short_id("0f8e2a1c-9b7d-4c2e-8a55-1d2f3e4a5b6c"), "0f8e2a1c");
    }

    #[tokio::test]
    async fn test_add_validates_and_notifies() {
        let store = seeded_store().await;
        let notifier = Notifier::new();

        add(&store, dune(), &notifier, &quiet()).unwrap();

        let first = &store.snapshot()[0];
        assert_eq!(first.title, "Dune");
        assert_eq!(first.status, Some(ReadingStatus::WantToRead));
        assert_eq!(notifier.snapshot()[0].kind, NotificationKind::Success);
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_form() {
        let store = seeded_store().await;
        let notifier = Notifier::new();

        let fields = BookArgs {
            year: Some("19".to_string()),
            ..dune()
        };
        let err = add(&store, fields, &notifier, &quiet()).unwrap_err();

        assert!(format!("{:#}", err).contains("Year must be 4 digits"));
        assert_eq!(store.len(), 8);
        assert_eq!(notifier.snapshot()[0].kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn test_edit_with_flags() {
        let store = seeded_store().await;
        let notifier = Notifier::new();

        let fields = BookArgs {
            title: Some("The Great Gatsby (Annotated)".to_string()),
            ..BookArgs::default()
        };
        edit(&store, "1", fields, false, &notifier, &quiet()).unwrap();

        let book = store.get("1").unwrap();
        assert_eq!(book.title, "The Great Gatsby (Annotated)");
        assert_eq!(book.author, "F. Scott Fitzgerald");
    }

    #[tokio::test]
    async fn test_edit_keeps_plain_other_category() {
        let store = seeded_store().await;
        let notifier = Notifier::new();
        assert_eq!(store.get("5").unwrap().category, Some(Category::Other));

        let fields = BookArgs {
            title: Some("The Art of War (Giles)".to_string()),
            year: Some("1910".to_string()),
            ..BookArgs::default()
        };
        edit(&store, "5", fields, false, &notifier, &quiet()).unwrap();

        let book = store.get("5").unwrap();
        assert_eq!(book.title, "The Art of War (Giles)");
        assert_eq!(book.year.as_deref(), Some("1910"));
        assert_eq!(book.category, Some(Category::Other));
        assert_eq!(notifier.snapshot()[0].kind, NotificationKind::Success);
    }

    #[tokio::test]
    async fn test_edit_to_other_needs_custom_name() {
        let store = seeded_store().await;
        let notifier = Notifier::new();

        let fields = BookArgs {
            category: Some("other".to_string()),
            ..BookArgs::default()
        };
        let err = edit(&store, "1", fields, false, &notifier, &quiet()).unwrap_err();

        assert!(format!("{:#}", err).contains("Custom Category is required"));
        assert_eq!(store.get("1").unwrap().category, Some(Category::Fiction));
    }

    #[tokio::test]
    async fn test_delete_by_prefix() {
        let store = seeded_store().await;
        let notifier = Notifier::new();
        add(&store, dune(), &notifier, &quiet()).unwrap();
        let id = store.snapshot()[0].id.clone();

        delete(&store, short_id(&id), false, &notifier, &quiet()).unwrap();

        assert!(store.get(&id).is_none());
        assert_eq!(store.len(), 8);
    }

    #[tokio::test]
    async fn test_resolve_unknown_id() {
        let store = seeded_store().await;
        assert!(resolve_book(&store, "missing").is_err());
    }
}
