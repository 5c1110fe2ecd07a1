//! Catalog service: products and categories.
//!
//! Product writes go out as multipart forms because they may carry an image.
//! Deletion is split in two typed steps ([`PendingDeletion`] then
//! [`ConfirmedDeletion`]) so nothing can be deleted without a confirmation
//! having been asked for.

use std::path::Path;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tracing::instrument;
use vunjabei_core::{Category, CategoryId, Price, Product, ProductId};

use crate::api::{ApiClient, Listing};
use crate::error::{ClientError, Result};
use crate::guards::SubmitGuard;

/// An image file to attach to a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read an image from disk. The content type follows the file extension.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidInput` if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ClientError::InvalidInput(format!("Cannot read image {}: {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();
        let mime = mime_for(&file_name);
        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }

    fn to_part(&self) -> Result<Part> {
        Ok(Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(self.mime)?)
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Input of the product create and edit forms.
///
/// Kept intact on failure so it can be corrected and submitted again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub category: Option<CategoryId>,
    pub price: Price,
    pub quantity: u32,
    /// New image; `None` keeps the current one on edit.
    pub image: Option<ImageUpload>,
}

impl ProductForm {
    /// Form pre-filled from an existing product, for editing.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            category: product.category,
            price: product.price,
            quantity: product.quantity,
            image: None,
        }
    }

    /// Check the form before it is sent.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidInput` if the name is blank.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "Product name is required.".to_string(),
            ));
        }
        Ok(())
    }

    fn to_multipart(&self) -> Result<Form> {
        let mut form = Form::new()
            .text("name", self.name.trim().to_string())
            .text(
                "category",
                self.category.map(|id| id.to_string()).unwrap_or_default(),
            )
            .text("price", self.price.amount().to_string())
            .text("quantity", self.quantity.to_string());
        if let Some(image) = &self.image {
            form = form.part("image", image.to_part()?);
        }
        Ok(form)
    }
}

/// A record that can go through the two-step delete.
pub trait Deletable {
    /// Endpoint of this record.
    fn endpoint(&self) -> String;
    /// Question asked before deleting.
    fn prompt(&self) -> &'static str;
    /// Name shown in the prompt and logs.
    fn label(&self) -> String;
}

impl Deletable for Product {
    fn endpoint(&self) -> String {
        format!("products/{}/", self.id)
    }

    fn prompt(&self) -> &'static str {
        "Are you sure you want to delete this product?"
    }

    fn label(&self) -> String {
        format!("{} (#{})", self.name, self.id)
    }
}

impl Deletable for Category {
    fn endpoint(&self) -> String {
        format!("categories/{}/", self.id)
    }

    fn prompt(&self) -> &'static str {
        "Are you sure you want to delete this category?"
    }

    fn label(&self) -> String {
        format!("{} (#{})", self.name, self.id)
    }
}

/// First step of a delete: the record, loaded so the prompt can name it.
#[derive(Debug, Clone)]
#[must_use = "nothing is deleted until the deletion is confirmed"]
pub struct PendingDeletion<R> {
    record: R,
}

/// A deletion the user has agreed to.
#[derive(Debug, Clone)]
#[must_use = "pass this to the catalog service to delete the record"]
pub struct ConfirmedDeletion<R> {
    record: R,
}

impl<R: Deletable> PendingDeletion<R> {
    #[must_use]
    pub const fn record(&self) -> &R {
        &self.record
    }

    /// Confirmation question, e.g. "Are you sure you want to delete this product?"
    #[must_use]
    pub fn prompt(&self) -> &'static str {
        self.record.prompt()
    }

    /// The user answered yes.
    pub fn confirm(self) -> ConfirmedDeletion<R> {
        ConfirmedDeletion {
            record: self.record,
        }
    }

    /// The user answered no; nothing happens.
    pub fn cancel(self) -> R {
        self.record
    }
}

impl<R> ConfirmedDeletion<R> {
    #[must_use]
    pub const fn record(&self) -> &R {
        &self.record
    }
}

#[derive(Serialize)]
struct CategoryBody<'a> {
    name: &'a str,
}

/// Catalog operations.
#[derive(Debug, Clone)]
pub struct CatalogService {
    api: ApiClient,
    submit: SubmitGuard,
}

impl CatalogService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            submit: SubmitGuard::new(),
        }
    }

    /// The submission gate shared by product and category writes.
    #[must_use]
    pub const fn submit_guard(&self) -> &SubmitGuard {
        &self.submit
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// All products, in backend order.
    ///
    /// # Errors
    ///
    /// Returns a transport or backend error.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Listing<Product>> {
        self.api.get_listing("products/", &[]).await
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the product no longer exists.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        self.api
            .get(&format!("products/{id}/"), &[])
            .await
            .map_err(|e| not_found_as(e, format!("product #{id}")))
    }

    /// Products with fewer than ten units in stock.
    ///
    /// # Errors
    ///
    /// Returns a transport or backend error.
    #[instrument(skip(self))]
    pub async fn low_stock(&self) -> Result<Listing<Product>> {
        self.api.get_listing("products/low_stock/", &[]).await
    }

    /// Products in one category.
    ///
    /// # Errors
    ///
    /// Returns a transport or backend error.
    #[instrument(skip(self))]
    pub async fn by_category(&self, category: CategoryId) -> Result<Listing<Product>> {
        let category = category.to_string();
        self.api
            .get_listing("products/by_category/", &[("category_id", category.as_str())])
            .await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// - `ClientError::InvalidInput` if the form is incomplete
    /// - `ClientError::SubmissionInFlight` if another write is running
    /// - `ClientError::Validation` with per-field messages if the backend
    ///   rejects the form
    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn create_product(&self, form: &ProductForm) -> Result<Product> {
        form.validate()?;
        let _submission = self.submit.begin()?;
        let product: Product = self
            .api
            .send_multipart(Method::POST, "products/", form.to_multipart()?)
            .await?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// As [`Self::create_product`], plus `ClientError::NotFound` if the
    /// product was deleted meanwhile.
    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn update_product(&self, id: ProductId, form: &ProductForm) -> Result<Product> {
        form.validate()?;
        let _submission = self.submit.begin()?;
        let product: Product = self
            .api
            .send_multipart(Method::PUT, &format!("products/{id}/"), form.to_multipart()?)
            .await
            .map_err(|e| not_found_as(e, format!("product #{id}")))?;
        tracing::info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    /// Load a product and start its deletion.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the product no longer exists.
    pub async fn request_product_deletion(&self, id: ProductId) -> Result<PendingDeletion<Product>> {
        Ok(PendingDeletion {
            record: self.get_product(id).await?,
        })
    }

    /// Delete a confirmed product. Returns the deleted record.
    ///
    /// # Errors
    ///
    /// Returns a transport or backend error.
    pub async fn delete_product(&self, deletion: ConfirmedDeletion<Product>) -> Result<Product> {
        self.delete_record(deletion).await
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns a transport or backend error.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Listing<Category>> {
        self.api.get_listing("categories/", &[]).await
    }

    /// One category.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the category no longer exists.
    #[instrument(skip(self))]
    pub async fn get_category(&self, id: CategoryId) -> Result<Category> {
        self.api
            .get(&format!("categories/{id}/"), &[])
            .await
            .map_err(|e| not_found_as(e, format!("category #{id}")))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidInput` for a blank name, or the backend's
    /// validation error.
    #[instrument(skip(self))]
    pub async fn create_category(&self, name: &str) -> Result<Category> {
        let name = category_name(name)?;
        let _submission = self.submit.begin()?;
        let category: Category = self
            .api
            .send_json(Method::POST, "categories/", &CategoryBody { name })
            .await?;
        tracing::info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    /// Rename a category.
    ///
    /// # Errors
    ///
    /// As [`Self::create_category`], plus `ClientError::NotFound`.
    #[instrument(skip(self))]
    pub async fn rename_category(&self, id: CategoryId, name: &str) -> Result<Category> {
        let name = category_name(name)?;
        let _submission = self.submit.begin()?;
        self.api
            .send_json(Method::PUT, &format!("categories/{id}/"), &CategoryBody { name })
            .await
            .map_err(|e| not_found_as(e, format!("category #{id}")))
    }

    /// Load a category and start its deletion.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the category no longer exists.
    pub async fn request_category_deletion(
        &self,
        id: CategoryId,
    ) -> Result<PendingDeletion<Category>> {
        Ok(PendingDeletion {
            record: self.get_category(id).await?,
        })
    }

    /// Delete a confirmed category. Its products stay, uncategorized.
    ///
    /// # Errors
    ///
    /// Returns a transport or backend error.
    pub async fn delete_category(&self, deletion: ConfirmedDeletion<Category>) -> Result<Category> {
        self.delete_record(deletion).await
    }

    #[instrument(skip_all, fields(record = %deletion.record.label()))]
    async fn delete_record<R: Deletable>(&self, deletion: ConfirmedDeletion<R>) -> Result<R> {
        let record = deletion.record;
        self.api
            .delete(&record.endpoint())
            .await
            .map_err(|e| not_found_as(e, record.label()))?;
        tracing::info!("Deleted");
        Ok(record)
    }
}

fn category_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ClientError::InvalidInput(
            "Category name is required.".to_string(),
        ));
    }
    Ok(name)
}

/// Name the missing record in a `NotFound` error.
fn not_found_as(err: ClientError, what: String) -> ClientError {
    match err {
        ClientError::NotFound(_) => ClientError::NotFound(what),
        other => other,
    }
}
