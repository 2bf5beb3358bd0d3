use std::path::{Path, PathBuf};

use axum::http::StatusCode;
use axum_test::TestServer;
use doxysearch::api::create_router;
use doxysearch::db::Database;
use doxysearch::models::*;

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/html/search")
}

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db);
    TestServer::new(app).expect("Failed to create test server")
}

async fn import_fixtures(server: &TestServer) -> DocSet {
    server
        .post("/api/v1/docsets")
        .json(&ImportDocSetInput {
            name: "spacimac".to_string(),
            path: fixture_dir().display().to_string(),
        })
        .await
        .json::<DocSet>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();

        let response = server.get("/api/v1/health").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}

mod docsets {
    use super::*;

    #[tokio::test]
    async fn import_creates_then_replaces() {
        let server = setup();
        let request = ImportDocSetInput {
            name: "spacimac".to_string(),
            path: fixture_dir().display().to_string(),
        };

        let response = server.post("/api/v1/docsets").json(&request).await;
        response.assert_status(StatusCode::CREATED);
        let created: DocSet = response.json();

        let response = server.post("/api/v1/docsets").json(&request).await;
        response.assert_status_ok();
        let replaced: DocSet = response.json();
        assert_eq!(replaced.id, created.id);

        let docsets: Vec<DocSet> = server.get("/api/v1/docsets").await.json();
        assert_eq!(docsets.len(), 1);
        assert_eq!(docsets[0].name, "spacimac");
    }

    #[tokio::test]
    async fn import_rejects_a_directory_without_fragments() {
        let server = setup();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let response = server
            .post("/api/v1/docsets")
            .json(&ImportDocSetInput {
                name: "empty".to_string(),
                path: dir.path().display().to_string(),
            })
            .await;

        response.assert_status_bad_request();
        assert!(response.text().contains("Failed to load search index"));
    }

    #[tokio::test]
    async fn get_and_stats() {
        let server = setup();
        let docset = import_fixtures(&server).await;

        let response = server.get(&format!("/api/v1/docsets/{}", docset.id)).await;
        response.assert_status_ok();
        assert_eq!(response.json::<DocSet>().name, "spacimac");

        let response = server
            .get(&format!("/api/v1/docsets/{}/stats", docset.id))
            .await;
        response.assert_status_ok();
        let stats: DocSetStats = response.json();
        let entries: Vec<_> = stats
            .categories
            .iter()
            .map(|c| (c.category, c.entries))
            .collect();
        assert_eq!(entries, vec![(Category::All, 8), (Category::Functions, 12)]);
    }

    #[tokio::test]
    async fn delete_removes_the_docset() {
        let server = setup();
        let docset = import_fixtures(&server).await;

        server
            .delete(&format!("/api/v1/docsets/{}", docset.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .get(&format!("/api/v1/docsets/{}", docset.id))
            .await
            .assert_status_not_found();
        server
            .delete(&format!("/api/v1/docsets/{}", docset.id))
            .await
            .assert_status_not_found();
    }
}

mod entries {
    use super::*;

    #[tokio::test]
    async fn search_returns_prefix_matches() {
        let server = setup();
        let docset = import_fixtures(&server).await;

        let response = server
            .get(&format!("/api/v1/docsets/{}/search", docset.id))
            .add_query_param("q", "Mat")
            .await;

        response.assert_status_ok();
        let entries: Vec<Entry> = response.json();
        let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["material", "materialid", "materialofinstance"]);
    }

    #[tokio::test]
    async fn search_filters_by_category() {
        let server = setup();
        let docset = import_fixtures(&server).await;

        let response = server
            .get(&format!("/api/v1/docsets/{}/search", docset.id))
            .add_query_param("q", "sky")
            .add_query_param("category", "functions")
            .add_query_param("limit", 2)
            .await;

        response.assert_status_ok();
        let entries: Vec<Entry> = response.json();
        let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["skybox", "skyboxrenderer"]);
    }

    #[tokio::test]
    async fn search_rejects_unknown_category() {
        let server = setup();
        let docset = import_fixtures(&server).await;

        let response = server
            .get(&format!("/api/v1/docsets/{}/search", docset.id))
            .add_query_param("q", "sky")
            .add_query_param("category", "widgets")
            .await;

        response.assert_status_bad_request();
        assert!(response.text().contains("Unknown category"));
    }

    #[tokio::test]
    async fn search_in_unknown_docset_is_not_found() {
        let server = setup();

        server
            .get(&format!("/api/v1/docsets/{}/search", uuid::Uuid::new_v4()))
            .add_query_param("q", "sky")
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn get_entry_returns_every_link() {
        let server = setup();
        let docset = import_fixtures(&server).await;

        let response = server
            .get(&format!("/api/v1/docsets/{}/entries/material", docset.id))
            .await;

        response.assert_status_ok();
        let entry: Entry = response.json();
        assert_eq!(entry.symbols[0].label, "Material");
        assert_eq!(entry.link_count(), 8);

        server
            .get(&format!("/api/v1/docsets/{}/entries/material", docset.id))
            .add_query_param("category", "functions")
            .await
            .assert_status_not_found();
    }
}

mod fragments {
    use super::*;

    #[tokio::test]
    async fn serves_the_fragment_as_imported() {
        let server = setup();
        let docset = import_fixtures(&server).await;
        let original = std::fs::read_to_string(fixture_dir().join("functions_c.js"))
            .expect("Failed to read fixture");

        let response = server
            .get(&format!("/api/v1/docsets/{}/fragments/functions_c.js", docset.id))
            .await;

        response.assert_status_ok();
        assert_eq!(response.text(), original);
    }

    #[tokio::test]
    async fn unknown_fragments_are_not_found() {
        let server = setup();
        let docset = import_fixtures(&server).await;

        server
            .get(&format!("/api/v1/docsets/{}/fragments/all_0.js", docset.id))
            .await
            .assert_status_not_found();
        server
            .get(&format!("/api/v1/docsets/{}/fragments/search.js", docset.id))
            .await
            .assert_status_not_found();
    }
}
