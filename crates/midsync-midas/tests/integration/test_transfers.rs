//! Integration tests for uploads and downloads
//!
//! Verifies the two-step upload handshake, recursive folder uploads and
//! downloads, and server path resolution against a wiremock server.

use midsync_core::domain::{FolderId, ItemId, ServerPath};
use midsync_core::ports::IRemoteStore;
use midsync_midas::{download, upload, MidasRemoteStore};
use wiremock::matchers::{body_bytes, query_param};

use crate::common;

// ============================================================================
// Uploads
// ============================================================================

#[tokio::test]
async fn test_upload_file_two_step_handshake() {
    let (server, client) = common::setup_midas_mock().await;
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("scan.nrrd");
    std::fs::write(&file, b"voxel data").unwrap();

    common::api("midas.upload.generatetoken")
        .and(query_param("itemid", "40"))
        .and(query_param("filename", "scan.nrrd"))
        .and(query_param("token", common::TOKEN))
        .respond_with(common::ok(serde_json::json!({ "token": "upload-token-9" })))
        .expect(1)
        .mount(&server)
        .await;
    common::api("midas.upload.perform")
        .and(query_param("uploadtoken", "upload-token-9"))
        .and(query_param("itemid", "40"))
        .and(query_param("length", "10"))
        .and(body_bytes(b"voxel data".to_vec()))
        .respond_with(common::ok(serde_json::json!({ "item_id": "40", "name": "scan.nrrd" })))
        .expect(1)
        .mount(&server)
        .await;

    upload::upload_file(
        &client,
        &common::session(),
        &ItemId::new("40").unwrap(),
        &file,
        upload::INITIAL_UPLOAD_NOTE,
    )
    .await
    .expect("upload failed");
}

#[tokio::test]
async fn test_upload_missing_file_fails_before_network() {
    let (server, client) = common::setup_midas_mock().await;

    common::api("midas.upload.generatetoken")
        .respond_with(common::ok(serde_json::json!({ "token": "t" })))
        .expect(0)
        .mount(&server)
        .await;

    let result = upload::upload_file(
        &client,
        &common::session(),
        &ItemId::new("40").unwrap(),
        std::path::Path::new("/definitely/not/here.txt"),
        upload::INITIAL_UPLOAD_NOTE,
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_upload_tree_creates_folders_and_items() {
    let (server, client) = common::setup_midas_mock().await;
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("run1");
    std::fs::create_dir_all(root.join("sub")).unwrap();
    std::fs::create_dir_all(root.join(".git")).unwrap();
    std::fs::write(root.join("a.txt"), b"a").unwrap();
    std::fs::write(root.join("sub").join("b.txt"), b"b").unwrap();
    std::fs::write(root.join(".git").join("HEAD"), b"ref").unwrap();
    std::fs::write(root.join(".hidden"), b"h").unwrap();

    common::api("midas.folder.create")
        .and(query_param("name", "run1"))
        .and(query_param("parentid", "5"))
        .respond_with(common::ok(serde_json::json!({ "folder_id": "100", "name": "run1" })))
        .expect(1)
        .mount(&server)
        .await;
    common::api("midas.folder.create")
        .and(query_param("name", "sub"))
        .and(query_param("parentid", "100"))
        .respond_with(common::ok(serde_json::json!({ "folder_id": "101", "name": "sub" })))
        .expect(1)
        .mount(&server)
        .await;
    common::api("midas.folder.create")
        .and(query_param("name", ".git"))
        .respond_with(common::ok(serde_json::json!({ "folder_id": "999", "name": ".git" })))
        .expect(0)
        .mount(&server)
        .await;
    common::api("midas.item.create")
        .and(query_param("name", "a.txt"))
        .and(query_param("parentid", "100"))
        .respond_with(common::ok(serde_json::json!({ "item_id": "200", "name": "a.txt" })))
        .expect(1)
        .mount(&server)
        .await;
    common::api("midas.item.create")
        .and(query_param("name", "b.txt"))
        .and(query_param("parentid", "101"))
        .respond_with(common::ok(serde_json::json!({ "item_id": "201", "name": "b.txt" })))
        .expect(1)
        .mount(&server)
        .await;
    common::mount_upload_handshake(&server).await;

    let uploaded = upload::upload_tree(
        &client,
        &common::session(),
        &root,
        &FolderId::new("5").unwrap(),
    )
    .await
    .expect("tree upload failed");

    assert_eq!(uploaded, 2);
}

#[tokio::test]
async fn test_store_upload_folder_resolves_destination() {
    let (server, client) = common::setup_midas_mock().await;
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("batch");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("x.txt"), b"x").unwrap();

    common::api("midas.community.get")
        .and(query_param("name", "Lab"))
        .respond_with(common::ok(serde_json::json!({
            "community_id": "2", "name": "Lab", "folder_id": "8"
        })))
        .mount(&server)
        .await;
    common::mount_children(
        &server,
        "8",
        serde_json::json!([{ "folder_id": "9", "name": "Public" }]),
        serde_json::json!([]),
    )
    .await;
    common::api("midas.folder.create")
        .and(query_param("name", "batch"))
        .and(query_param("parentid", "9"))
        .respond_with(common::ok(serde_json::json!({ "folder_id": "50", "name": "batch" })))
        .expect(1)
        .mount(&server)
        .await;
    common::api("midas.item.create")
        .and(query_param("name", "x.txt"))
        .and(query_param("parentid", "50"))
        .respond_with(common::ok(serde_json::json!({ "item_id": "60", "name": "x.txt" })))
        .expect(1)
        .mount(&server)
        .await;
    common::mount_upload_handshake(&server).await;

    let store = MidasRemoteStore::new(client);
    store
        .upload_folder(
            &common::session(),
            &root,
            &ServerPath::new("/communities/Lab/Public").unwrap(),
        )
        .await
        .expect("upload_folder failed");
}

// ============================================================================
// Downloads
// ============================================================================

#[tokio::test]
async fn test_download_item_streams_content() {
    let (server, client) = common::setup_midas_mock().await;
    let tmp = tempfile::tempdir().unwrap();

    let content: Vec<u8> = (0..65_536).map(|i| (i % 251) as u8).collect();
    common::mount_item_download(&server, "20", &content).await;

    let dest = tmp.path().join("blob.bin");
    let written = download::download_item(
        &client,
        &common::session(),
        &ItemId::new("20").unwrap(),
        &dest,
    )
    .await
    .unwrap();

    assert_eq!(written, 65_536);
    assert_eq!(std::fs::read(&dest).unwrap(), content);
}

#[tokio::test]
async fn test_download_item_failure_envelope() {
    let (server, client) = common::setup_midas_mock().await;
    let tmp = tempfile::tempdir().unwrap();

    common::api("midas.item.download")
        .respond_with(common::fail(-151, "Invalid policy"))
        .mount(&server)
        .await;

    let dest = tmp.path().join("blob.bin");
    let result = download::download_item(
        &client,
        &common::session(),
        &ItemId::new("20").unwrap(),
        &dest,
    )
    .await;

    assert!(matches!(result, Err(midsync_midas::MidasError::Forbidden(_))));
    assert!(!dest.exists());
}

/// Serves one response announcing 1000 bytes, sends 10 and hangs up
async fn serve_truncated_body() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\n\
                  Content-Type: application/octet-stream\r\n\
                  Content-Length: 1000\r\n\r\n\
                  0123456789",
            )
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_download_item_interrupted_leaves_no_file() {
    let client = midsync_midas::client::MidasClient::new(serve_truncated_body().await);
    let tmp = tempfile::tempdir().unwrap();

    let dest = tmp.path().join("blob.bin");
    let result = download::download_item(
        &client,
        &common::session(),
        &ItemId::new("20").unwrap(),
        &dest,
    )
    .await;

    assert!(
        matches!(result, Err(midsync_midas::MidasError::Network(_))),
        "got {result:?}"
    );
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_store_download_folder_recreates_tree() {
    let (server, client) = common::setup_midas_mock().await;
    let tmp = tempfile::tempdir().unwrap();

    common::api("midas.user.get")
        .and(query_param("firstname", "Jane"))
        .and(query_param("lastname", "Doe"))
        .respond_with(common::ok(serde_json::json!({
            "user_id": "4", "firstname": "Jane", "lastname": "Doe", "folder_id": "3"
        })))
        .mount(&server)
        .await;
    common::mount_children(
        &server,
        "3",
        serde_json::json!([{ "folder_id": "10", "name": "Public" }]),
        serde_json::json!([]),
    )
    .await;
    common::mount_children(
        &server,
        "10",
        serde_json::json!([
            { "folder_id": "11", "name": "sub" },
            { "folder_id": "12", "name": ".trash" }
        ]),
        serde_json::json!([{ "item_id": "20", "name": "a.txt" }]),
    )
    .await;
    common::mount_children(
        &server,
        "11",
        serde_json::json!([]),
        serde_json::json!([{ "item_id": "21", "name": "b.txt" }]),
    )
    .await;
    common::mount_item_download(&server, "20", b"alpha").await;
    common::mount_item_download(&server, "21", b"beta").await;

    let store = MidasRemoteStore::new(client);
    store
        .download_folder(
            &common::session(),
            &ServerPath::new("/users/Jane_Doe/Public").unwrap(),
            tmp.path(),
        )
        .await
        .expect("download_folder failed");

    assert_eq!(std::fs::read(tmp.path().join("a.txt")).unwrap(), b"alpha");
    assert_eq!(std::fs::read(tmp.path().join("sub").join("b.txt")).unwrap(), b"beta");
    assert!(!tmp.path().join(".trash").exists());
}

#[tokio::test]
async fn test_download_folder_unknown_segment() {
    let (server, client) = common::setup_midas_mock().await;
    let tmp = tempfile::tempdir().unwrap();

    common::api("midas.user.get")
        .respond_with(common::ok(serde_json::json!({
            "user_id": "4", "firstname": "Jane", "lastname": "Doe", "folder_id": "3"
        })))
        .mount(&server)
        .await;
    common::mount_children(&server, "3", serde_json::json!([]), serde_json::json!([])).await;

    let store = MidasRemoteStore::new(client);
    let err = store
        .download_folder(
            &common::session(),
            &ServerPath::new("/users/Jane_Doe/Private").unwrap(),
            tmp.path(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<midsync_midas::MidasError>(),
        Some(midsync_midas::MidasError::NotFound(_))
    ));
}
