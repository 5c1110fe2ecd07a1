//! Product and category management against the mock backend.

#![allow(clippy::unwrap_used)]

mod common;

use rust_decimal::Decimal;
use vunjabei_client::{CatalogService, ClientError, ImageUpload, ProductForm};
use vunjabei_core::{Price, ProductId};

use common::Fixture;

fn kitenge(category: Option<vunjabei_core::CategoryId>) -> ProductForm {
    ProductForm {
        name: "Kitenge Shirt".to_string(),
        category,
        price: Price::new(Decimal::new(25_000, 0)).unwrap(),
        quantity: 12,
        image: None,
    }
}

#[tokio::test]
async fn test_created_product_appears_in_listing() {
    let fx = Fixture::new().await;
    let category = fx.backend.add_category("Shirts");
    let sessions = fx.signed_in("admin").await;
    let catalog = CatalogService::new(sessions.api().clone());

    let created = catalog.create_product(&kitenge(Some(category))).await.unwrap();

    assert_eq!(created.name, "Kitenge Shirt");
    assert_eq!(created.category_name.as_deref(), Some("Shirts"));
    assert_eq!(created.price.display(), "TSh 25,000.00");

    let listing = catalog.list_products().await.unwrap();
    let listed = listing.iter().find(|p| p.id == created.id).unwrap();
    assert_eq!(listed, &created);
}

#[tokio::test]
async fn test_product_image_is_uploaded() {
    let fx = Fixture::new().await;
    let sessions = fx.signed_in("admin").await;
    let catalog = CatalogService::new(sessions.api().clone());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kanga.png");
    std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

    let mut form = kitenge(None);
    form.image = Some(ImageUpload::from_path(&path).await.unwrap());
    let created = catalog.create_product(&form).await.unwrap();

    assert!(created.image.as_ref().unwrap().ends_with("product_images/kanga.png"));
    assert_eq!(created.category_label(), "New");
}

#[tokio::test]
async fn test_backend_field_errors_reach_the_form() {
    let fx = Fixture::new().await;
    let sessions = fx.signed_in("admin").await;
    let catalog = CatalogService::new(sessions.api().clone());

    let mut form = kitenge(Some(vunjabei_core::CategoryId::new(999)));
    form.name = "Kanga".to_string();
    let err = catalog.create_product(&form).await.unwrap_err();

    assert!(matches!(err, ClientError::Validation { .. }));
    let fields = err.field_errors().unwrap();
    assert_eq!(
        fields.get("category").unwrap(),
        &vec!["Invalid pk - object does not exist.".to_string()]
    );
    assert!(!catalog.submit_guard().is_busy());
}

#[tokio::test]
async fn test_blank_name_is_rejected_locally() {
    let fx = Fixture::new().await;
    let sessions = fx.signed_in("admin").await;
    let catalog = CatalogService::new(sessions.api().clone());

    let mut form = kitenge(None);
    form.name = "  ".to_string();
    let err = catalog.create_product(&form).await.unwrap_err();

    assert_eq!(err.to_string(), "Product name is required.");
    assert_eq!(fx.backend.hits("products"), 0);
}

#[tokio::test]
async fn test_second_submission_is_refused_while_busy() {
    let fx = Fixture::new().await;
    let sessions = fx.signed_in("admin").await;
    let catalog = CatalogService::new(sessions.api().clone());

    let held = catalog.submit_guard().begin().unwrap();
    let err = catalog.create_product(&kitenge(None)).await.unwrap_err();
    assert!(matches!(err, ClientError::SubmissionInFlight));
    assert_eq!(fx.backend.hits("products"), 0);

    drop(held);
    catalog.create_product(&kitenge(None)).await.unwrap();
    assert_eq!(fx.backend.hits("products"), 1);
}

#[tokio::test]
async fn test_update_keeps_image_and_changes_stock() {
    let fx = Fixture::new().await;
    let id = fx.backend.add_product("Kanga", 8_000, 3, None);
    let sessions = fx.signed_in("admin").await;
    let catalog = CatalogService::new(sessions.api().clone());

    let product = catalog.get_product(id).await.unwrap();
    let mut form = ProductForm::from_product(&product);
    form.quantity = 40;
    let updated = catalog.update_product(id, &form).await.unwrap();

    assert_eq!(updated.quantity, 40);
    assert_eq!(updated.name, "Kanga");
    assert_eq!(fx.backend.product_quantity(id), Some(40));
}

#[tokio::test]
async fn test_delete_goes_through_confirmation() {
    let fx = Fixture::new().await;
    let id = fx.backend.add_product("Kanga", 8_000, 3, None);
    let sessions = fx.signed_in("admin").await;
    let catalog = CatalogService::new(sessions.api().clone());

    let pending = catalog.request_product_deletion(id).await.unwrap();
    assert_eq!(pending.prompt(), "Are you sure you want to delete this product?");

    // Cancelling hands the record back and leaves the product in place.
    let kept = pending.cancel();
    assert_eq!(kept.id, id);
    assert!(fx.backend.product_exists(id));

    let pending = catalog.request_product_deletion(id).await.unwrap();
    let deleted = catalog.delete_product(pending.confirm()).await.unwrap();
    assert_eq!(deleted.name, "Kanga");
    assert!(!fx.backend.product_exists(id));

    let err = catalog.get_product(id).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
    assert_eq!(
        err.user_message(),
        format!("Unable to load product #{id}. It may have been removed.")
    );
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let fx = Fixture::new().await;
    let sessions = fx.signed_in("alice").await;
    let catalog = CatalogService::new(sessions.api().clone());

    let err = catalog.get_product(ProductId::new(404)).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn test_paginated_listing_is_accepted() {
    let fx = Fixture::new().await;
    fx.backend.add_product("Kanga", 8_000, 3, None);
    fx.backend.add_product("Kikoi", 15_000, 20, None);
    fx.backend.paginate_products(true);
    let sessions = fx.signed_in("alice").await;

    let listing = CatalogService::new(sessions.api().clone())
        .list_products()
        .await
        .unwrap();

    assert_eq!(listing.len(), 2);
    assert_eq!(listing.count, Some(2));
    let names: Vec<&str> = listing.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Kanga", "Kikoi"]);
}

#[tokio::test]
async fn test_low_stock_and_category_filters() {
    let fx = Fixture::new().await;
    let shirts = fx.backend.add_category("Shirts");
    let wraps = fx.backend.add_category("Wraps");
    fx.backend.add_product("Kitenge Shirt", 25_000, 30, Some(shirts));
    fx.backend.add_product("Kanga", 8_000, 3, Some(wraps));
    fx.backend.add_product("Kikoi", 15_000, 0, Some(wraps));
    let sessions = fx.signed_in("admin").await;
    let catalog = CatalogService::new(sessions.api().clone());

    let low: Vec<String> = catalog
        .low_stock()
        .await
        .unwrap()
        .into_items()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(low, ["Kanga", "Kikoi"]);

    let in_wraps = catalog.by_category(wraps).await.unwrap();
    assert_eq!(in_wraps.len(), 2);
    assert!(in_wraps.iter().all(|p| p.category == Some(wraps)));
}

#[tokio::test]
async fn test_category_lifecycle() {
    let fx = Fixture::new().await;
    let sessions = fx.signed_in("admin").await;
    let catalog = CatalogService::new(sessions.api().clone());

    let category = catalog.create_category("Vitenge").await.unwrap();
    let product = fx
        .backend
        .add_product("Kitenge Dress", 40_000, 5, Some(category.id));

    let renamed = catalog.rename_category(category.id, "Dresses").await.unwrap();
    assert_eq!(renamed.name, "Dresses");
    let listed = catalog.get_product(product).await.unwrap();
    assert_eq!(listed.category_label(), "Dresses");

    let pending = catalog.request_category_deletion(category.id).await.unwrap();
    catalog.delete_category(pending.confirm()).await.unwrap();

    assert!(catalog.list_categories().await.unwrap().is_empty());
    let orphan = catalog.get_product(product).await.unwrap();
    assert_eq!(orphan.category, None);
    assert_eq!(orphan.category_label(), "New");
}
