use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use bookstore_db::{Collection, DbError};

use super::models::{Book, NewBook, UpdateBookRequest};

/// Optional listing filters; all are conjunctive on top of the base
/// in-stock requirement.
#[derive(Debug, Default, Clone)]
pub struct BookFilter {
    pub category: Option<String>,
    pub author: Option<String>,
    pub min_rating: Option<f64>,
}

/// One page of listing results.
#[derive(Debug)]
pub struct BookPage {
    pub books: Vec<Book>,
    pub total_pages: u64,
    pub current_page: u64,
}

/// Book catalog: persistence plus filtered, paginated retrieval.
///
/// Results come back in insertion order, which makes pagination stable in
/// the absence of concurrent writes.
#[derive(Clone)]
pub struct BookCatalog {
    books: Arc<Collection<Book>>,
}

impl BookCatalog {
    pub fn new() -> Self {
        Self {
            books: Collection::new()
                .with_unique_index("book_title", |book: &Book| book.title.clone())
                .into_shared(),
        }
    }

    fn matches(filter: &BookFilter, book: &Book) -> bool {
        // Out-of-stock books are never listed.
        book.stock > 0
            && filter
                .category
                .as_deref()
                .is_none_or(|category| book.category == category)
            && filter
                .author
                .as_deref()
                .is_none_or(|author| book.author_name == author)
            && filter
                .min_rating
                .is_none_or(|min_rating| book.rating >= min_rating)
    }

    /// List matching books. `page` and `limit` must both be >= 1.
    ///
    /// The skip offset saturates, so absurdly large page numbers yield an
    /// empty page instead of wrapping back into the collection.
    pub async fn list(&self, filter: &BookFilter, page: u64, limit: u64) -> BookPage {
        let total = self.books.count(|book| Self::matches(filter, book)).await as u64;

        let skip = page.saturating_sub(1).saturating_mul(limit);
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let books = self
            .books
            .find(
                |book| Self::matches(filter, book),
                skip,
                usize::try_from(limit).unwrap_or(usize::MAX),
            )
            .await;

        BookPage {
            books,
            total_pages: total.div_ceil(limit),
            current_page: page,
        }
    }

    pub async fn get(&self, id: Uuid) -> Option<Book> {
        self.books.find_by_id(id).await
    }

    pub async fn find_by_title(&self, title: &str) -> Option<Book> {
        self.books.find_one(|book| book.title == title).await
    }

    pub async fn create(&self, new: NewBook) -> Result<Book, DbError> {
        let book = Book {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            price: new.price,
            stock: new.stock,
            category: new.category,
            author_name: new.author_name,
            rating: new.rating,
            publish_date: OffsetDateTime::now_utc(),
        };
        self.books.insert(book).await
    }

    /// Merge every provided patch field into the stored record.
    pub async fn update(&self, id: Uuid, patch: UpdateBookRequest) -> Result<Book, DbError> {
        self.books
            .update_by_id(id, move |book| {
                if let Some(title) = patch.title {
                    book.title = title;
                }
                if let Some(description) = patch.description {
                    book.description = Some(description);
                }
                if let Some(price) = patch.price {
                    book.price = price;
                }
                if let Some(stock) = patch.stock {
                    book.stock = stock;
                }
                if let Some(category) = patch.category {
                    book.category = category;
                }
                if let Some(author_name) = patch.author_name {
                    book.author_name = author_name;
                }
                if let Some(rating) = patch.rating {
                    book.rating = rating;
                }
                if let Some(publish_date) = patch.publish_date {
                    book.publish_date = publish_date;
                }
            })
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        self.books.delete_by_id(id).await
    }
}

impl Default for BookCatalog {
    fn default() -> Self {
        Self::new()
    }
}
