//! Seed records
//!
//! The bootstrap collection comes from a static JSON resource (a URL or a
//! local file). When that fails the built-in list of eight records is used.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Book, Category};

/// Fetch timeout for remote seed resources
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors fetching a seed resource; always recovered by the built-in list
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Seed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Seed resource returned HTTP {0}")]
    Status(u16),

    #[error("Failed to read seed file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Seed resource is not a record array: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where the bootstrap records come from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SeedSource {
    /// GET a JSON array over HTTP
    Url(String),
    /// Read a JSON array from disk
    File(PathBuf),
    /// The compiled-in list only
    #[default]
    Builtin,
}

/// Loads the seed set
#[derive(Debug, Clone, Default)]
pub struct SeedLoader {
    source: SeedSource,
}

impl SeedLoader {
    pub fn new(source: SeedSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &SeedSource {
        &self.source
    }

    /// Fetch from the configured source, reporting failure
    pub async fn fetch(&self) -> Result<Vec<Book>, SeedError> {
        match &self.source {
            SeedSource::Url(url) => fetch_url(url).await,
            SeedSource::File(path) => {
                let content =
                    tokio::fs::read_to_string(path)
                        .await
                        .map_err(|source| SeedError::Io {
                            path: path.clone(),
                            source,
                        })?;
                Ok(serde_json::from_str(&content)?)
            }
            SeedSource::Builtin => Ok(builtin_seed()),
        }
    }

    /// Fetch, falling back to the built-in list on any failure
    pub async fn load(&self) -> Vec<Book> {
        match self.fetch().await {
            Ok(books) => {
                debug!("Loaded {} seed records from {:?}", books.len(), self.source);
                books
            }
            Err(e) => {
                warn!("Seed fetch failed, using built-in records: {}", e);
                builtin_seed()
            }
        }
    }
}

async fn fetch_url(url: &str) -> Result<Vec<Book>, SeedError> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(concat!("bookshelf/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(SeedError::Status(response.status().as_u16()));
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// The hardcoded fallback seed, ids "1" through "8"
pub fn builtin_seed() -> Vec<Book> {
    let seed = [
        (
            "1",
            "The Great Gatsby",
            "F. Scott Fitzgerald",
            "1925",
            "9780743273565",
            "A classic American novel set in the Jazz Age, exploring themes of wealth, love, and the American Dream.",
            Category::Fiction,
        ),
        (
            "2",
            "A Brief History of Time",
            "Stephen Hawking",
            "1988",
            "9780553380163",
            "A landmark volume in science writing by one of the great minds of our time, exploring the universe and its mysteries.",
            Category::Science,
        ),
        (
            "3",
            "Sapiens: A Brief History of Humankind",
            "Yuval Noah Harari",
            "2011",
            "9780062316097",
            "An exploration of how Homo sapiens came to dominate the world, examining the cognitive, agricultural, and scientific revolutions.",
            Category::History,
        ),
        (
            "4",
            "Becoming",
            "Michelle Obama",
            "2018",
            "9781524763138",
            "An intimate memoir by the former First Lady, sharing her journey from childhood to the White House.",
            Category::Biography,
        ),
        (
            "5",
            "The Art of War",
            "Sun Tzu",
            "500 BC",
            "9781590309637",
            "An ancient Chinese military treatise that has influenced military thinking, business strategy, and beyond.",
            Category::Other,
        ),
        (
            "6",
            "1984",
            "George Orwell",
            "1949",
            "9780451524935",
            "A dystopian social science fiction novel that explores totalitarianism and surveillance.",
            Category::Fiction,
        ),
        (
            "7",
            "Cosmos",
            "Carl Sagan",
            "1980",
            "9780345539434",
            "A comprehensive exploration of the universe, from the smallest particles to the largest galaxies.",
            Category::Science,
        ),
        (
            "8",
            "The Diary of a Young Girl",
            "Anne Frank",
            "1947",
            "9780553577129",
            "The diary of a young Jewish girl hiding from the Nazis during World War II.",
            Category::Biography,
        ),
    ];

    seed.into_iter()
        .map(
            |(id, title, author, year, isbn, description, category)| Book {
                id: id.to_string(),
                title: title.to_string(),
                author: author.to_string(),
                year: Some(year.to_string()),
                isbn: Some(isbn.to_string()),
                description: Some(description.to_string()),
                category: Some(category),
                cover_image: None,
                status: None,
            },
        )
        .collect()
}

/// One-shot local HTTP responder for seed tests
#[cfg(test)]
pub(crate) mod test_http {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Answer the first request with `status` and `body`, returning the URL
    ///
    /// With a gate, the response is held back until the gate fires or its
    /// sender is dropped.
    pub(crate) async fn serve_once(
        status: u16,
        body: &str,
        gate: Option<oneshot::Receiver<()>>,
    ) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body = body.to_string();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            if let Some(gate) = gate {
                let _ = gate.await;
            }

            let response = format!(
                "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}/books.json", addr)
    }
}

#[cfg(test)]
mod tests {
    use super::test_http::serve_once;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_seed_shape() {
        let seed = builtin_seed();
        assert_eq!(seed.len(), 8);

        let ids: Vec<&str> = seed.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4", "5", "6", "7", "8"]);

        let art_of_war = &seed[4];
        assert_eq!(art_of_war.year.as_deref(), Some("500 BC"));
        assert_eq!(art_of_war.category, Some(Category::Other));
    }

    #[tokio::test]
    async fn test_builtin_source() {
        let loader = SeedLoader::default();
        assert_eq!(loader.fetch().await.unwrap(), builtin_seed());
    }

    #[tokio::test]
    async fn test_file_source() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("books.json");
        std::fs::write(
            &path,
            r#"[{"id": "s1", "title": "Dune", "author": "Frank Herbert", "year": "1965", "category": "Fiction"}]"#,
        )
        .unwrap();

        let loader = SeedLoader::new(SeedSource::File(path));
        let books = loader.fetch().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Dune");
        assert_eq!(books[0].category, Some(Category::Fiction));
    }

    #[tokio::test]
    async fn test_missing_file_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let loader = SeedLoader::new(SeedSource::File(temp_dir.path().join("absent.json")));

        assert!(matches!(loader.fetch().await, Err(SeedError::Io { .. })));
        assert_eq!(loader.load().await, builtin_seed());
    }

    #[tokio::test]
    async fn test_malformed_file_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("books.json");
        std::fs::write(&path, "<html>not found</html>").unwrap();

        let loader = SeedLoader::new(SeedSource::File(path));
        assert!(matches!(loader.fetch().await, Err(SeedError::Parse(_))));
        assert_eq!(loader.load().await.len(), 8);
    }

    #[tokio::test]
    async fn test_unreachable_url_falls_back() {
        // Port 9 (discard) is not expected to serve HTTP
        let loader = SeedLoader::new(SeedSource::Url("http://127.0.0.1:9/books.json".to_string()));
        assert!(loader.fetch().await.is_err());
        assert_eq!(loader.load().await, builtin_seed());
    }

    #[tokio::test]
    async fn test_url_source() {
        let url = serve_once(
            200,
            r#"[{"id": "s1", "title": "Dune", "author": "Frank Herbert", "year": 1965}]"#,
            None,
        )
        .await;

        let books = SeedLoader::new(SeedSource::Url(url)).fetch().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].year.as_deref(), Some("1965"));
    }

    #[tokio::test]
    async fn test_error_status_falls_back() {
        let url = serve_once(404, "<html>not found</html>", None).await;
        let loader = SeedLoader::new(SeedSource::Url(url));
        assert!(matches!(loader.fetch().await, Err(SeedError::Status(404))));

        let url = serve_once(500, "[]", None).await;
        let loader = SeedLoader::new(SeedSource::Url(url));
        assert_eq!(loader.load().await, builtin_seed());
    }
}
