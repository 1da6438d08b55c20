use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use bookstore_db::Document;

/// Catalog entry for a single book.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub category: String,
    pub author_name: String,
    pub rating: f64,
    pub publish_date: OffsetDateTime,
}

impl Document for Book {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Creation request body. Required strings default to empty and required
/// numbers to `None` so every violation is reported in one pass.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub rating: Option<f64>,
}

/// Validated creation payload, ready for the catalog.
#[derive(Debug)]
pub struct NewBook {
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub category: String,
    pub author_name: String,
    pub rating: f64,
}

/// Partial update: any provided field overwrites the stored one, including
/// stock and publish date. The merge is deliberately unrestricted.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub category: Option<String>,
    pub author_name: Option<String>,
    pub rating: Option<f64>,
    pub publish_date: Option<OffsetDateTime>,
}

/// Query string for the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub author: Option<String>,
    pub rating: Option<f64>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookListResponse {
    pub books: Vec<Book>,
    pub total_pages: u64,
    pub current_page: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBookResponse {
    pub new_book: Book,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
