//! Product and category commands.

use std::path::PathBuf;

use vunjabei_client::{CatalogService, ImageUpload, ProductForm};
use vunjabei_core::{CategoryId, Price, ProductId, Route};

use super::{App, CliError, confirm, load};
use crate::render;

/// Product fields as typed on the command line.
pub struct ProductInput {
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    pub category: Option<CategoryId>,
    pub image: Option<PathBuf>,
}

/// Turn command-line fields into a form, reading the image file if given.
pub async fn form(input: ProductInput) -> Result<ProductForm, CliError> {
    let image = match input.image {
        Some(path) => Some(ImageUpload::from_path(path).await?),
        None => None,
    };
    Ok(ProductForm {
        name: input.name,
        category: input.category,
        price: input.price,
        quantity: input.quantity,
        image,
    })
}

pub async fn list(app: &App, category: Option<CategoryId>) -> Result<(), CliError> {
    app.enter_either(Route::AdminProducts, Route::CustomerProducts)?;
    let catalog = CatalogService::new(app.api.clone());
    let products = match category {
        Some(id) => load("products", catalog.by_category(id)).await?,
        None => load("products", catalog.list_products()).await?,
    };
    render::products(&products);
    Ok(())
}

pub async fn show(app: &App, id: ProductId) -> Result<(), CliError> {
    app.enter_either(Route::AdminProducts, Route::CustomerProduct(id))?;
    let catalog = CatalogService::new(app.api.clone());
    let product = load("product", catalog.get_product(id)).await?;
    render::product(&product);
    Ok(())
}

pub async fn low_stock(app: &App) -> Result<(), CliError> {
    app.enter(Route::AdminProducts)?;
    let catalog = CatalogService::new(app.api.clone());
    let products = load("low-stock products", catalog.low_stock()).await?;
    render::products(&products);
    Ok(())
}

pub async fn create(app: &App, form: &ProductForm) -> Result<(), CliError> {
    app.enter(Route::AdminProducts)?;
    let product = CatalogService::new(app.api.clone())
        .create_product(form)
        .await?;
    render::message(&format!("Created product #{}.", product.id));
    render::product(&product);
    Ok(())
}

pub async fn update(app: &App, id: ProductId, form: &ProductForm) -> Result<(), CliError> {
    app.enter(Route::AdminProducts)?;
    let product = CatalogService::new(app.api.clone())
        .update_product(id, form)
        .await?;
    render::message(&format!("Updated product #{}.", product.id));
    render::product(&product);
    Ok(())
}

/// Delete a product after confirmation (skipped with `--yes`).
pub async fn delete(app: &App, id: ProductId, yes: bool) -> Result<(), CliError> {
    app.enter(Route::AdminProducts)?;
    let catalog = CatalogService::new(app.api.clone());
    let pending = catalog.request_product_deletion(id).await?;

    render::product(pending.record());
    if !yes && !confirm(pending.prompt())? {
        let product = pending.cancel();
        render::message(&format!("Kept {}.", product.name));
        return Ok(());
    }

    let deleted = catalog.delete_product(pending.confirm()).await?;
    render::message(&format!("Deleted {}.", deleted.name));
    Ok(())
}

pub async fn list_categories(app: &App) -> Result<(), CliError> {
    app.enter_either(Route::AdminProducts, Route::CustomerProducts)?;
    let catalog = CatalogService::new(app.api.clone());
    let categories = load("categories", catalog.list_categories()).await?;
    render::categories(&categories);
    Ok(())
}

pub async fn create_category(app: &App, name: &str) -> Result<(), CliError> {
    app.enter(Route::AdminProducts)?;
    let category = CatalogService::new(app.api.clone())
        .create_category(name)
        .await?;
    render::message(&format!("Created category {} (#{}).", category.name, category.id));
    Ok(())
}

pub async fn rename_category(app: &App, id: CategoryId, name: &str) -> Result<(), CliError> {
    app.enter(Route::AdminProducts)?;
    let category = CatalogService::new(app.api.clone())
        .rename_category(id, name)
        .await?;
    render::message(&format!("Renamed category #{} to {}.", category.id, category.name));
    Ok(())
}

pub async fn delete_category(app: &App, id: CategoryId, yes: bool) -> Result<(), CliError> {
    app.enter(Route::AdminProducts)?;
    let catalog = CatalogService::new(app.api.clone());
    let pending = catalog.request_category_deletion(id).await?;

    if !yes && !confirm(pending.prompt())? {
        render::message(&format!("Kept {}.", pending.cancel().name));
        return Ok(());
    }

    let deleted = catalog.delete_category(pending.confirm()).await?;
    render::message(&format!("Deleted category {}.", deleted.name));
    Ok(())
}
