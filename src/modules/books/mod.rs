pub mod models;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use bookstore_auth::{AuthUser, TokenService};
use bookstore_authz::{authorize, Action};
use bookstore_db::DbError;
use bookstore_http::{require_auth, ApiError, FieldError};
use bookstore_kernel::{InitCtx, Module};

use models::{
    Book, BookListResponse, CreateBookRequest, CreatedBookResponse, ListQuery, MessageResponse,
    NewBook, UpdateBookRequest,
};
use store::{BookCatalog, BookFilter};

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_PAGE_SIZE: u64 = 10;
const DEFAULT_STOCK: i64 = 10;

const TITLE_MIN_CHARS: usize = 2;
const TITLE_MAX_CHARS: usize = 100;
const DESCRIPTION_MAX_CHARS: usize = 500;

/// Shared state for the books module.
#[derive(Clone)]
pub struct BooksState {
    pub catalog: BookCatalog,
    pub tokens: Arc<TokenService>,
}

/// Books module: public catalog reads, admin-gated mutations.
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(state: BooksState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        let protected = Router::new()
            .route("/", post(create_book))
            .route("/{book_id}", patch(update_book).delete(delete_book))
            .route_layer(middleware::from_fn_with_state(
                self.state.tokens.clone(),
                require_auth,
            ));

        Router::new()
            .route("/", get(list_books))
            .route("/{book_id}", get(get_book))
            .merge(protected)
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Get all books",
                        "tags": ["Books"],
                        "parameters": [
                            { "in": "query", "name": "category", "schema": { "type": "string" } },
                            { "in": "query", "name": "author", "schema": { "type": "string" } },
                            { "in": "query", "name": "rating", "schema": { "type": "number" },
                              "description": "Minimum rating" },
                            { "in": "query", "name": "page", "schema": { "type": "integer", "default": 1 } },
                            { "in": "query", "name": "limit", "schema": { "type": "integer", "default": 10 } }
                        ],
                        "responses": {
                            "200": { "description": "Paginated list of in-stock books" }
                        }
                    },
                    "post": {
                        "summary": "Create a new book",
                        "tags": ["Books"],
                        "security": [{ "bearerAuth": [] }],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateBook" }
                                }
                            }
                        },
                        "responses": {
                            "200": { "description": "The book was successfully created" },
                            "400": { "description": "Book already exists" },
                            "401": { "description": "Unauthorized or invalid input" },
                            "403": { "description": "Admin role required" }
                        }
                    }
                },
                "/{bookId}": {
                    "get": {
                        "summary": "Get a book by ID",
                        "tags": ["Books"],
                        "parameters": [
                            { "in": "path", "name": "bookId", "required": true,
                              "schema": { "type": "string" } }
                        ],
                        "responses": {
                            "200": { "description": "The requested book" },
                            "404": { "description": "Book not found" }
                        }
                    },
                    "patch": {
                        "summary": "Update a book",
                        "tags": ["Books"],
                        "security": [{ "bearerAuth": [] }],
                        "parameters": [
                            { "in": "path", "name": "bookId", "required": true,
                              "schema": { "type": "string" } }
                        ],
                        "responses": {
                            "200": { "description": "The book was successfully updated" },
                            "403": { "description": "Admin role required" },
                            "404": { "description": "Book not found" }
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "security": [{ "bearerAuth": [] }],
                        "parameters": [
                            { "in": "path", "name": "bookId", "required": true,
                              "schema": { "type": "string" } }
                        ],
                        "responses": {
                            "200": { "description": "The book was successfully deleted" },
                            "403": { "description": "Admin role required" },
                            "404": { "description": "Book not found" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "CreateBook": {
                        "type": "object",
                        "required": ["title", "price", "category", "authorName", "rating"],
                        "properties": {
                            "title": { "type": "string", "minLength": 2, "maxLength": 100 },
                            "description": { "type": "string", "maxLength": 500 },
                            "price": { "type": "number", "minimum": 0 },
                            "stock": { "type": "integer", "default": 10, "minimum": 0 },
                            "category": { "type": "string" },
                            "authorName": { "type": "string" },
                            "rating": { "type": "number", "minimum": 0, "maximum": 5 }
                        },
                        "example": {
                            "title": "Malgudi Days",
                            "description": "A collection of short stories",
                            "price": 500,
                            "stock": 100,
                            "category": "Fiction",
                            "authorName": "R.K. Narayan",
                            "rating": 4.5
                        }
                    }
                }
            }
        }))
    }
}

/// Create a new instance of the books module
pub fn create_module(state: BooksState) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(state))
}

fn book_not_found() -> ApiError {
    ApiError::not_found("Could not find a book by this id")
}

/// Unparseable ids behave like unknown ids.
fn parse_book_id(book_id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(book_id).map_err(|_| book_not_found())
}

/// GET /api/books
async fn list_books(
    State(state): State<BooksState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<BookListResponse>, ApiError> {
    let page = query.page.unwrap_or(DEFAULT_PAGE).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);

    let filter = BookFilter {
        category: query.category,
        author: query.author,
        min_rating: query.rating,
    };

    let page = state.catalog.list(&filter, page, limit).await;

    Ok(Json(BookListResponse {
        books: page.books,
        total_pages: page.total_pages,
        current_page: page.current_page,
    }))
}

/// GET /api/books/{bookId}
async fn get_book(
    State(state): State<BooksState>,
    Path(book_id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    let id = parse_book_id(&book_id)?;
    let book = state.catalog.get(id).await.ok_or_else(book_not_found)?;
    Ok(Json(book))
}

/// POST /api/books
async fn create_book(
    State(state): State<BooksState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateBookRequest>,
) -> Result<Json<CreatedBookResponse>, ApiError> {
    authorize(user.role, Action::CreateBook)
        .map_err(|_| ApiError::forbidden("Only admin can add books"))?;

    let new = validate_create(req)
        .map_err(|errors| ApiError::validation(errors, StatusCode::UNAUTHORIZED))?;

    // Advisory pre-check; the title index is authoritative at insert time.
    if state.catalog.find_by_title(&new.title).await.is_some() {
        return Err(ApiError::duplicate("Book already exists"));
    }

    let book = state.catalog.create(new).await.map_err(|err| match err {
        DbError::UniqueViolation { .. } => ApiError::duplicate("Book already exists"),
        other => ApiError::Internal(other.into()),
    })?;

    tracing::info!(book_id = %book.id, title = %book.title, "book created");

    Ok(Json(CreatedBookResponse { new_book: book }))
}

/// PATCH /api/books/{bookId}
async fn update_book(
    State(state): State<BooksState>,
    Extension(user): Extension<AuthUser>,
    Path(book_id): Path<String>,
    Json(patch): Json<UpdateBookRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    authorize(user.role, Action::UpdateBook)
        .map_err(|_| ApiError::forbidden("Only admin can update books"))?;

    let id = parse_book_id(&book_id)?;

    match state.catalog.update(id, patch).await {
        Ok(book) => {
            tracing::info!(book_id = %book.id, "book updated");
            Ok(Json(MessageResponse {
                message: "Successfully updated the book".to_string(),
            }))
        }
        Err(DbError::NotFound) => Err(book_not_found()),
        Err(DbError::UniqueViolation { .. }) => Err(ApiError::duplicate("Book already exists")),
    }
}

/// DELETE /api/books/{bookId}
async fn delete_book(
    State(state): State<BooksState>,
    Extension(user): Extension<AuthUser>,
    Path(book_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    authorize(user.role, Action::DeleteBook)
        .map_err(|_| ApiError::forbidden("Only admin can delete books"))?;

    let id = parse_book_id(&book_id)?;

    match state.catalog.delete(id).await {
        Ok(()) => {
            tracing::info!(book_id = %id, "book deleted");
            Ok(Json(MessageResponse {
                message: "Successfully deleted the book".to_string(),
            }))
        }
        Err(DbError::NotFound) => Err(book_not_found()),
        Err(other) => Err(ApiError::Internal(other.into())),
    }
}

fn validate_create(req: CreateBookRequest) -> Result<NewBook, Vec<FieldError>> {
    let mut errors = Vec::new();

    let title_chars = req.title.chars().count();
    if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&title_chars) {
        errors.push(FieldError::new(
            "title",
            "Title must be between 2 to 100 characters",
        ));
    }
    if let Some(description) = &req.description {
        if description.chars().count() > DESCRIPTION_MAX_CHARS {
            errors.push(FieldError::new(
                "description",
                "Description cannot exceed 500 characters",
            ));
        }
    }
    match req.price {
        Some(price) if price >= 0.0 => {}
        _ => errors.push(FieldError::new(
            "price",
            "Price not included or invalid price given",
        )),
    }
    if req.category.trim().is_empty() {
        errors.push(FieldError::new("category", "Category is required"));
    }
    if req.author_name.trim().is_empty() {
        errors.push(FieldError::new("authorName", "Author is required"));
    }
    match req.rating {
        Some(rating) if (0.0..=5.0).contains(&rating) => {}
        _ => errors.push(FieldError::new(
            "rating",
            "Rating must be between 0 and 5",
        )),
    }
    if let Some(stock) = req.stock {
        if stock < 0 {
            errors.push(FieldError::new("stock", "Stock cannot be negative"));
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewBook {
        title: req.title,
        description: req.description,
        price: req.price.unwrap_or_default(),
        stock: req.stock.unwrap_or(DEFAULT_STOCK),
        category: req.category,
        author_name: req.author_name,
        rating: req.rating.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request},
        response::Response,
    };
    use bookstore_auth::Role;
    use std::collections::HashSet;
    use tower::ServiceExt;

    fn test_state() -> BooksState {
        BooksState {
            catalog: BookCatalog::new(),
            tokens: Arc::new(TokenService::new("test-secret")),
        }
    }

    fn router(state: &BooksState) -> Router {
        BooksModule::new(state.clone()).routes()
    }

    fn token_for(state: &BooksState, role: Role) -> String {
        state.tokens.issue(Uuid::new_v4(), role, 3600).unwrap()
    }

    fn new_book(title: &str, category: &str, author: &str, rating: f64, stock: i64) -> NewBook {
        NewBook {
            title: title.to_string(),
            description: None,
            price: 500.0,
            stock,
            category: category.to_string(),
            author_name: author.to_string(),
            rating,
        }
    }

    async fn seed(state: &BooksState, title: &str, stock: i64) -> Book {
        state
            .catalog
            .create(new_book(title, "Fiction", "R.K. Narayan", 4.5, stock))
            .await
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn json_req(
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn malgudi_days() -> serde_json::Value {
        json!({
            "title": "Malgudi Days",
            "description": "A collection of short stories",
            "price": 500,
            "stock": 100,
            "category": "Fiction",
            "authorName": "R.K. Narayan",
            "rating": 4.5
        })
    }

    #[tokio::test]
    async fn list_never_returns_out_of_stock_books() {
        let state = test_state();
        seed(&state, "In Stock", 3).await;
        seed(&state, "Sold Out", 0).await;

        let response = router(&state).oneshot(get_req("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let books = body["books"].as_array().unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0]["title"], "In Stock");
    }

    #[tokio::test]
    async fn list_applies_filters() {
        let state = test_state();
        state
            .catalog
            .create(new_book("A", "Fiction", "Narayan", 4.5, 5))
            .await
            .unwrap();
        state
            .catalog
            .create(new_book("B", "Poetry", "Narayan", 3.0, 5))
            .await
            .unwrap();
        state
            .catalog
            .create(new_book("C", "Fiction", "Other", 2.0, 5))
            .await
            .unwrap();

        let app = router(&state);

        let by_category = body_json(
            app.clone()
                .oneshot(get_req("/?category=Fiction"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(by_category["books"].as_array().unwrap().len(), 2);

        let by_author = body_json(
            app.clone()
                .oneshot(get_req("/?author=Narayan"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(by_author["books"].as_array().unwrap().len(), 2);

        // Rating filter is a lower bound and combines with the others.
        let combined = body_json(
            app.oneshot(get_req("/?category=Fiction&rating=3"))
                .await
                .unwrap(),
        )
        .await;
        let books = combined["books"].as_array().unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0]["title"], "A");
    }

    #[tokio::test]
    async fn pagination_covers_all_books_exactly_once() {
        let state = test_state();
        for i in 0..5 {
            seed(&state, &format!("Book {i}"), 5).await;
        }

        let app = router(&state);
        let first = body_json(app.clone().oneshot(get_req("/?limit=2")).await.unwrap()).await;
        assert_eq!(first["totalPages"], 3);
        assert_eq!(first["currentPage"], 1);

        let mut seen = HashSet::new();
        for page in 1..=3 {
            let body = body_json(
                app.clone()
                    .oneshot(get_req(&format!("/?limit=2&page={page}")))
                    .await
                    .unwrap(),
            )
            .await;
            for book in body["books"].as_array().unwrap() {
                assert!(seen.insert(book["id"].as_str().unwrap().to_string()));
            }
        }
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn list_defaults_to_first_page_of_ten() {
        let state = test_state();
        for i in 0..12 {
            seed(&state, &format!("Book {i}"), 5).await;
        }

        let body = body_json(router(&state).oneshot(get_req("/")).await.unwrap()).await;
        assert_eq!(body["books"].as_array().unwrap().len(), 10);
        assert_eq!(body["totalPages"], 2);
        assert_eq!(body["currentPage"], 1);
        // Insertion order makes the first page deterministic.
        assert_eq!(body["books"][0]["title"], "Book 0");
    }

    #[tokio::test]
    async fn extreme_pagination_values_yield_empty_page() {
        let state = test_state();
        for i in 0..3 {
            seed(&state, &format!("Book {i}"), 5).await;
        }

        let app = router(&state);

        // u64::MAX page: the skip offset must saturate, not wrap.
        let response = app
            .clone()
            .oneshot(get_req(&format!("/?page={}&limit=10", u64::MAX)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["books"].as_array().unwrap().is_empty());
        assert_eq!(body["totalPages"], 1);

        // u64::MAX limit on page 1 still returns everything exactly once.
        let body = body_json(
            app.oneshot(get_req(&format!("/?page=1&limit={}", u64::MAX)))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["books"].as_array().unwrap().len(), 3);
        assert_eq!(body["totalPages"], 1);
    }

    #[tokio::test]
    async fn get_book_by_id() {
        let state = test_state();
        let book = seed(&state, "Malgudi Days", 5).await;

        let app = router(&state);
        let response = app
            .clone()
            .oneshot(get_req(&format!("/{}", book.id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["title"], "Malgudi Days");

        let missing = app
            .clone()
            .oneshot(get_req(&format!("/{}", Uuid::new_v4())))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        // Unparseable ids behave like unknown ids.
        let garbage = app.oneshot(get_req("/not-a-uuid")).await.unwrap();
        assert_eq!(garbage.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_requires_token() {
        let state = test_state();
        let response = router(&state)
            .oneshot(json_req("POST", "/", None, malgudi_days()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn mutations_are_forbidden_for_regular_users() {
        let state = test_state();
        let book = seed(&state, "Existing", 5).await;
        let token = token_for(&state, Role::User);
        let app = router(&state);

        let create = app
            .clone()
            .oneshot(json_req("POST", "/", Some(&token), malgudi_days()))
            .await
            .unwrap();
        assert_eq!(create.status(), StatusCode::FORBIDDEN);

        let update = app
            .clone()
            .oneshot(json_req(
                "PATCH",
                &format!("/{}", book.id),
                Some(&token),
                json!({"price": 1.0}),
            ))
            .await
            .unwrap();
        assert_eq!(update.status(), StatusCode::FORBIDDEN);

        let delete = app
            .oneshot(json_req(
                "DELETE",
                &format!("/{}", book.id),
                Some(&token),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(delete.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_creates_book_with_defaults() {
        let state = test_state();
        let token = token_for(&state, Role::Admin);

        let response = router(&state)
            .oneshot(json_req(
                "POST",
                "/",
                Some(&token),
                json!({
                    "title": "Malgudi Days",
                    "price": 500,
                    "category": "Fiction",
                    "authorName": "R.K. Narayan",
                    "rating": 4.5
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let book = &body["newBook"];
        assert_eq!(book["title"], "Malgudi Days");
        assert_eq!(book["stock"], 10);
        assert_eq!(book["description"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn duplicate_title_is_rejected() {
        let state = test_state();
        let token = token_for(&state, Role::Admin);
        let app = router(&state);

        let first = app
            .clone()
            .oneshot(json_req("POST", "/", Some(&token), malgudi_days()))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(json_req("POST", "/", Some(&token), malgudi_days()))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
        let body = body_json(second).await;
        assert_eq!(body["errors"][0]["message"], "Book already exists");
    }

    #[tokio::test]
    async fn create_reports_every_violation() {
        let state = test_state();
        let token = token_for(&state, Role::Admin);

        let response = router(&state)
            .oneshot(json_req(
                "POST",
                "/",
                Some(&token),
                json!({
                    "title": "x",
                    "price": -1,
                    "category": "",
                    "authorName": "",
                    "rating": 9
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["errors"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn admin_patches_arbitrary_fields() {
        let state = test_state();
        let book = seed(&state, "Original", 5).await;
        let token = token_for(&state, Role::Admin);
        let app = router(&state);

        // Stock is patchable like any other field.
        let response = app
            .clone()
            .oneshot(json_req(
                "PATCH",
                &format!("/{}", book.id),
                Some(&token),
                json!({"price": 250.0, "stock": 0}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Successfully updated the book");

        let stored = state.catalog.get(book.id).await.unwrap();
        assert_eq!(stored.price, 250.0);
        assert_eq!(stored.stock, 0);
    }

    #[tokio::test]
    async fn patch_to_existing_title_is_rejected() {
        let state = test_state();
        seed(&state, "Taken", 5).await;
        let book = seed(&state, "Renamable", 5).await;
        let token = token_for(&state, Role::Admin);

        let response = router(&state)
            .oneshot(json_req(
                "PATCH",
                &format!("/{}", book.id),
                Some(&token),
                json!({"title": "Taken"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn patch_unknown_book_is_not_found() {
        let state = test_state();
        let token = token_for(&state, Role::Admin);

        let response = router(&state)
            .oneshot(json_req(
                "PATCH",
                &format!("/{}", Uuid::new_v4()),
                Some(&token),
                json!({"price": 1.0}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_deletes_book() {
        let state = test_state();
        let book = seed(&state, "Doomed", 5).await;
        let token = token_for(&state, Role::Admin);
        let app = router(&state);

        let response = app
            .clone()
            .oneshot(json_req(
                "DELETE",
                &format!("/{}", book.id),
                Some(&token),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Successfully deleted the book");

        assert!(state.catalog.get(book.id).await.is_none());

        let again = app
            .oneshot(json_req(
                "DELETE",
                &format!("/{}", book.id),
                Some(&token),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(again.status(), StatusCode::NOT_FOUND);
    }
}
