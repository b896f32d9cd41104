use std::time::Duration;

use serde_json::Value;

use crate::helpers::{Script, image_form, spawn_app};

fn quiet_script() -> Script {
    Script::Succeed {
        text: "unused".into(),
        delay: Duration::ZERO,
    }
}

#[tokio::test]
async fn upload_stages_batch_in_order() {
    let app = spawn_app(quiet_script()).await;

    let form = image_form(&[
        ("breakfast.jpg", b"jpg-bytes".as_slice()),
        ("lunch.png", b"png-bytes".as_slice()),
    ]);
    let resp = app
        .client
        .post(app.url("/api/v1/uploads"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["files"][0]["filename"], "breakfast.jpg");
    assert_eq!(body["files"][0]["content_type"], "image/jpeg");
    assert_eq!(body["files"][1]["filename"], "lunch.png");
    assert_eq!(body["files"][1]["content_type"], "image/png");

    assert_eq!(
        std::fs::read(app.staged_path("breakfast.jpg")).unwrap(),
        b"jpg-bytes"
    );
    assert_eq!(
        std::fs::read(app.staged_path("lunch.png")).unwrap(),
        b"png-bytes"
    );

    // The listing reflects the same batch, same order.
    let resp = app
        .client
        .get(app.url("/api/v1/uploads"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["files"][0]["filename"], "breakfast.jpg");
    assert_eq!(body["files"][1]["filename"], "lunch.png");
}

#[tokio::test]
async fn second_upload_replaces_first_batch() {
    let app = spawn_app(quiet_script()).await;

    let resp = app
        .client
        .post(app.url("/api/v1/uploads"))
        .multipart(image_form(&[("old.jpg", b"old".as_slice())]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = app
        .client
        .post(app.url("/api/v1/uploads"))
        .multipart(image_form(&[
            ("new-1.webp", b"n1".as_slice()),
            ("new-2.heic", b"n2".as_slice()),
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let body: Value = app
        .client
        .get(app.url("/api/v1/uploads"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["files"][0]["filename"], "new-1.webp");
    assert_eq!(body["files"][1]["filename"], "new-2.heic");

    assert!(!app.staged_path("old.jpg").exists());
}

#[tokio::test]
async fn upload_rejects_unsupported_file_type() {
    let app = spawn_app(quiet_script()).await;

    let resp = app
        .client
        .post(app.url("/api/v1/uploads"))
        .multipart(image_form(&[
            ("meal.jpg", b"ok".as_slice()),
            ("notes.pdf", b"%PDF-".as_slice()),
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 415);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "UNSUPPORTED_MEDIA_TYPE");
    assert!(body["message"].as_str().unwrap().contains("notes.pdf"));

    // The rejected batch never reached the staging area.
    let body: Value = app
        .client
        .get(app.url("/api/v1/uploads"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn upload_rejects_duplicate_filenames() {
    let app = spawn_app(quiet_script()).await;

    let resp = app
        .client
        .post(app.url("/api/v1/uploads"))
        .multipart(image_form(&[
            ("meal.jpg", b"first".as_slice()),
            ("meal.jpg", b"second".as_slice()),
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn upload_rejects_path_traversal_filename() {
    let app = spawn_app(quiet_script()).await;

    let resp = app
        .client
        .post(app.url("/api/v1/uploads"))
        .multipart(image_form(&[("..secret.jpg", b"x".as_slice())]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn upload_rejects_empty_form() {
    let app = spawn_app(quiet_script()).await;

    let resp = app
        .client
        .post(app.url("/api/v1/uploads"))
        .multipart(reqwest::multipart::Form::new().text("unrelated", "x"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
