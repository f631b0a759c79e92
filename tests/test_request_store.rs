//! Integration tests for the request store.
//!
//! Tests cover:
//! - Creating, listing and deleting requests
//! - Status workflow and rejected transitions
//! - Image upload, measurement and cleanup
//! - Reference sizes seeded by the migration
//! - Persistence across reopen

mod common;

use common::*;

#[tokio::test]
async fn test_create_and_retrieve_request() -> anyhow::Result<()> {
    // 1. Create test store
    let (store, _temp_dir) = create_test_store().await;

    // 2. Add request
    let request = store.add_request(&make_new_request("Kim")).await?;
    assert!(request.id > 0, "Request should have positive ID");
    assert_eq!(request.customer_name, "Kim");
    assert_eq!(request.phone, "010-1234-5678");
    assert_eq!(request.status, RequestStatus::Uploaded);
    assert!(request.memo.is_none());

    // 3. Fetch by id
    let fetched = store.get_request(request.id).await?.expect("Request should exist");
    assert_eq!(fetched.customer_name, "Kim");
    assert_eq!(fetched.created_at, request.created_at);

    // 4. Unknown id
    assert!(store.get_request(request.id + 100).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_requests_listed_newest_first() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_test_store().await;

    let first = store.add_request(&make_new_request("First")).await?;
    let second = store.add_request(&make_new_request("Second")).await?;

    let requests = store.get_requests().await?;
    let ids: Vec<i64> = requests.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    Ok(())
}

#[tokio::test]
async fn test_status_workflow() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_test_store().await;
    let request = store.add_request(&make_new_request("Lee")).await?;

    // 1. uploaded -> analyzed -> quoted
    let analyzed = store
        .update_request(&request, &RequestUpdate { status: Some(RequestStatus::Analyzed), memo: None })
        .await?;
    assert_eq!(analyzed.status, RequestStatus::Analyzed);

    let quoted = store
        .update_request(
            &analyzed,
            &RequestUpdate {
                status: Some(RequestStatus::Quoted),
                memo: Some(Some("sent by mail".to_string())),
            },
        )
        .await?;
    assert_eq!(quoted.status, RequestStatus::Quoted);
    assert_eq!(quoted.memo.as_deref(), Some("sent by mail"));

    // 2. Memo-only update keeps the status
    let cleared = store
        .update_request(&quoted, &RequestUpdate { status: None, memo: Some(None) })
        .await?;
    assert_eq!(cleared.status, RequestStatus::Quoted);
    assert!(cleared.memo.is_none());

    // 3. Reset is always allowed
    let reset = store
        .update_request(&cleared, &RequestUpdate { status: Some(RequestStatus::Uploaded), memo: None })
        .await?;
    assert_eq!(reset.status, RequestStatus::Uploaded);

    Ok(())
}

#[tokio::test]
async fn test_invalid_transition_rejected() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_test_store().await;
    let request = store.add_request(&make_new_request("Park")).await?;

    // Cannot quote before measuring
    let result = store
        .update_request(&request, &RequestUpdate { status: Some(RequestStatus::Quoted), memo: None })
        .await;
    assert!(result.is_err(), "uploaded -> quoted should be rejected");

    // Stored status is unchanged
    let stored = store.get_request(request.id).await?.expect("Request should exist");
    assert_eq!(stored.status, RequestStatus::Uploaded);

    Ok(())
}

#[test]
fn test_transition_table() {
    use RequestStatus::*;
    let allowed = [
        (Uploaded, Analyzed),
        (Analyzed, Analyzed),
        (Analyzed, Quoted),
        (Quoted, Analyzed),
        (Uploaded, Uploaded),
        (Analyzed, Uploaded),
        (Quoted, Uploaded),
    ];
    for from in [Uploaded, Analyzed, Quoted] {
        for to in [Uploaded, Analyzed, Quoted] {
            assert_eq!(
                from.can_transition_to(to),
                allowed.contains(&(from, to)),
                "{from} -> {to}"
            );
        }
    }
}

#[test]
fn test_status_labels() -> anyhow::Result<()> {
    assert_eq!("analyzed".parse::<RequestStatus>()?, RequestStatus::Analyzed);
    assert!("shipped".parse::<RequestStatus>().is_err());
    // Stored rows only ever hold the plain codes
    assert!("견적완료".parse::<RequestStatus>().is_err());
    assert_eq!(RequestStatus::Quoted.to_string(), "quoted");

    assert_eq!(RequestStatus::from_import_label("자료업로드")?, RequestStatus::Uploaded);
    assert_eq!(RequestStatus::from_import_label("분석완료")?, RequestStatus::Analyzed);
    assert_eq!(RequestStatus::from_import_label("견적완료")?, RequestStatus::Quoted);
    assert_eq!(RequestStatus::from_import_label("quoted")?, RequestStatus::Quoted);
    assert!(RequestStatus::from_import_label("shipped").is_err());
    Ok(())
}

#[tokio::test]
async fn test_import_legacy_request() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_test_store().await;

    // 1. Import a record with a legacy status label
    let imported = store.import_request(&make_new_request("Baek"), "견적완료").await?;
    assert_eq!(imported.status, RequestStatus::Quoted);

    // 2. It reads back with the current code and follows the normal workflow
    let stored = store.get_request(imported.id).await?.expect("Request should exist");
    assert_eq!(stored.status, RequestStatus::Quoted);
    let reopened = store
        .update_request(&stored, &RequestUpdate { status: Some(RequestStatus::Analyzed), memo: None })
        .await?;
    assert_eq!(reopened.status, RequestStatus::Analyzed);

    // 3. Unknown labels are rejected without inserting anything
    assert!(store.import_request(&make_new_request("Nam"), "shipped").await.is_err());
    assert_eq!(store.get_requests().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_images_are_copied_and_measured() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_test_store().await;
    let request = store.add_request(&make_new_request("Choi")).await?;
    let photo = create_window_photo();

    // 1. Add image; the store keeps its own copy
    let image = store.add_image(&request, &make_new_image(&photo, "frame", "A4")).await?;
    assert_eq!(image.request_id, request.id);
    assert_eq!(image.location_type, "frame");
    assert_eq!(image.reference_type, "A4");
    assert!(!image.is_measured());
    assert!(image.image_path.is_file());
    assert_ne!(image.image_path, photo.path());
    assert_eq!(image.image_path.extension(), photo.path().extension());

    // 2. Record dimensions
    let measured = store
        .set_image_dimensions(&image, Dimensions { width: 1200.0, height: 900.0 })
        .await?;
    assert!(measured.is_measured());
    assert_eq!(measured.width, Some(1200.0));

    // 3. Listing returns images in upload order
    let second = store.add_image(&request, &make_new_image(&photo, "sash", "CREDIT_CARD")).await?;
    let images = store.get_images(&request).await?;
    let ids: Vec<i64> = images.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![image.id, second.id]);

    let by_id = store.get_image_by_id(second.id).await?.expect("Image should exist");
    assert_eq!(by_id.location_type, "sash");
    assert!(store.get_image_by_id(second.id + 100).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_delete_request_removes_images() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_test_store().await;
    let request = store.add_request(&make_new_request("Jung")).await?;
    let photo = create_window_photo();
    let image = store.add_image(&request, &make_new_image(&photo, "frame", "A4")).await?;
    let stored_path = image.image_path.clone();
    assert!(stored_path.exists());

    store.delete_request(request.clone()).await?;

    assert!(store.get_request(request.id).await?.is_none());
    assert!(store.get_image_by_id(image.id).await?.is_none());
    assert!(!stored_path.exists(), "Stored image file should be deleted");
    // The caller's original is untouched
    assert!(photo.path().exists());

    Ok(())
}

#[tokio::test]
async fn test_add_image_missing_source_fails() -> anyhow::Result<()> {
    let (store, temp_dir) = create_test_store().await;
    let request = store.add_request(&make_new_request("Han")).await?;

    let missing = NewImage {
        source_path: temp_dir.path().join("nope.jpg"),
        location_type: "frame".to_string(),
        reference_type: "A4".to_string(),
    };
    assert!(store.add_image(&request, &missing).await.is_err());
    assert!(store.get_images(&request).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_reference_table_seeded() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_test_store().await;

    let table = store.get_reference_table().await?;
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(ReferenceType::A4), Some(&ReferenceSpec::standard(ReferenceType::A4)));
    assert_eq!(
        table.get(ReferenceType::CreditCard),
        Some(&ReferenceSpec::standard(ReferenceType::CreditCard))
    );

    Ok(())
}

#[tokio::test]
async fn test_reference_spec_upsert() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_test_store().await;

    let letter = ReferenceSpec {
        reference_type: ReferenceType::A4,
        real_width: 279.4,
        real_height: 215.9,
        unit: Unit::Millimeter,
    };
    store.set_reference_spec(&letter).await?;

    let table = store.get_reference_table().await?;
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(ReferenceType::A4), Some(&letter));

    Ok(())
}

#[tokio::test]
async fn test_store_persists_across_reopen() -> anyhow::Result<()> {
    let temp_dir = tempfile::TempDir::new()?;
    let path = temp_dir.path().join("store");

    // 1. Create and populate
    let store = RequestDb::open(&path).await?;
    let request = store.add_request(&make_new_request("Yoon")).await?;
    store.close().await;

    // 2. Reopen and read back
    let store = RequestDb::open(&path).await?;
    let fetched = store.get_request(request.id).await?.expect("Request should survive reopen");
    assert_eq!(fetched.customer_name, "Yoon");
    store.close().await;

    Ok(())
}

#[tokio::test]
async fn test_corrupt_store_rejected() -> anyhow::Result<()> {
    let temp_dir = tempfile::TempDir::new()?;
    let path = temp_dir.path().join("store");
    std::fs::create_dir_all(path.join("images"))?;

    // images/ without a database
    assert!(RequestDb::open(&path).await.is_err());

    Ok(())
}
