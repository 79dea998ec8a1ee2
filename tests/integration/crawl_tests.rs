//! Integration tests for the crawler
//!
//! These tests use wiremock to serve PubMed-shaped HTML and drive the
//! full cycle end-to-end: listing pages, detail pages, archive and checkpoint.

use pubmed_crawler::config::HttpConfig;
use pubmed_crawler::crawler::CrawlEngine;
use pubmed_crawler::fetch::HttpSource;
use pubmed_crawler::query::SearchFilters;
use pubmed_crawler::record::Provenance;
use pubmed_crawler::storage::{open_archive, ArchiveStore};
use pubmed_crawler::{CrawlerError, FetchError, StreamError};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates an HTTP source pointed at the mock server
fn create_source(server: &MockServer) -> Arc<HttpSource> {
    let config = HttpConfig {
        base_url: format!("{}/", server.uri()),
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_email: "test@example.com".to_string(),
        timeout_secs: 5,
    };
    Arc::new(HttpSource::new(&config).expect("Failed to build source"))
}

/// Renders a result listing; `short_authors` is false for "cited by" pages
fn listing_page(total: usize, ids: &[&str], short_authors: bool) -> String {
    let mut html = format!(
        r#"<html><body><div class="results-amount"><h3><span class="value">{}</span> results</h3></div>"#,
        total
    );
    for id in ids {
        html.push_str(&format!(
            r#"<article class="full-docsum"><div class="docsum-content">
                <a class="docsum-title" data-article-id="{id}" href="/{id}/">Article {id}</a>
                <span class="docsum-authors full-authors">Smith J, Author{id} K.</span>"#,
            id = id
        ));
        if short_authors {
            html.push_str(r#"<span class="docsum-authors short-authors">Smith J, et al.</span>"#);
        }
        html.push_str(
            r#"<span class="docsum-journal-citation full-journal-citation">Nature. 2021.</span>
            </div></article>"#,
        );
    }
    html.push_str("</body></html>");
    html
}

fn detail_page(id: &str) -> String {
    format!(
        r#"<html><body>
        <h1 class="heading-title">Article {id}</h1>
        <button id="full-view-journal-trigger">Nature</button>
        <span class="cit">2021 Mar;5(2):10-20.</span>
        <div class="authors-list">John Smith <sup>1</sup>, Kate Author <sup>2</sup></div>
        <div class="abstract-content"><p>Abstract of article {id}.</p></div>
        <a title="Free full text at PubMed Central" href="https://www.ncbi.nlm.nih.gov/pmc/articles/PMC{id}/">PMC</a>
        </body></html>"#,
        id = id
    )
}

async fn mount_search_page(server: &MockServer, term: &str, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("term", term))
        .and(query_param("page", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_cited_by_page(server: &MockServer, id: &str, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("linkname", "pubmed_pubmed_citedin"))
        .and(query_param("from_uid", id))
        .and(query_param("page", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Serves the detail page of `id`, which must be requested exactly once
async fn mount_detail(server: &MockServer, id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page(id))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_search_archives_to_sqlite() {
    let server = MockServer::start().await;
    mount_search_page(&server, "crispr", 1, listing_page(3, &["101", "102"], true)).await;
    mount_search_page(&server, "crispr", 2, listing_page(3, &["103"], true)).await;
    for id in ["101", "102", "103"] {
        mount_detail(&server, id).await;
    }

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("archive.db");
    let mut engine = CrawlEngine::with_archive(create_source(&server), &db_path).unwrap();

    let report = engine
        .search_for("crispr", 100, &SearchFilters::default())
        .await
        .expect("Search failed");

    assert_eq!(report.added, vec!["101", "102", "103"]);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.failed, 0);

    let archive = open_archive(&db_path).unwrap();
    assert_eq!(archive.count_entries().unwrap(), 3);

    let entry = archive.load_entry("102").unwrap().expect("Entry missing");
    assert_eq!(entry.title, "Article 102");
    assert_eq!(entry.authors, "Smith J, Author102 K.");
    assert_eq!(entry.citation, "Nature. 2021.");
    assert_eq!(
        entry.abstract_text.as_deref(),
        Some("Abstract of article 102.")
    );
    assert_eq!(
        entry.full_text_ref.as_deref(),
        Some("https://www.ncbi.nlm.nih.gov/pmc/articles/PMC102/")
    );
    assert_eq!(entry.found_by, vec![Provenance::query("crispr")]);
}

#[tokio::test]
async fn test_overlapping_searches_fetch_each_detail_once() {
    let server = MockServer::start().await;
    mount_search_page(&server, "alpha", 1, listing_page(2, &["1", "2"], true)).await;
    mount_search_page(&server, "beta", 1, listing_page(2, &["2", "3"], true)).await;
    for id in ["1", "2", "3"] {
        mount_detail(&server, id).await;
    }

    let dir = TempDir::new().unwrap();
    let archive_dir = dir.path().join("archive");
    let mut engine = CrawlEngine::with_archive(create_source(&server), &archive_dir).unwrap();
    let filters = SearchFilters::default();

    engine.search_for("alpha", 10, &filters).await.unwrap();
    let report = engine.search_for("beta", 10, &filters).await.unwrap();

    assert_eq!(report.added, vec!["3"]);
    assert_eq!(report.deduplicated, 1);

    let meta = std::fs::read_to_string(archive_dir.join("2.meta")).unwrap();
    assert!(meta.starts_with("id: 2\ntitle: Article 2\n"));
    assert!(meta.ends_with("found_by:\n - alpha\n - beta\n"));
    assert_eq!(
        std::fs::read_to_string(archive_dir.join("2.txt")).unwrap(),
        "Abstract of article 2."
    );
}

#[tokio::test]
async fn test_citation_crawl_follows_new_records() {
    let server = MockServer::start().await;
    mount_cited_by_page(&server, "500", 1, listing_page(2, &["501", "502"], false)).await;
    mount_cited_by_page(&server, "501", 1, listing_page(1, &["502"], false)).await;
    mount_cited_by_page(&server, "502", 1, listing_page(0, &[], false)).await;
    for id in ["501", "502"] {
        mount_detail(&server, id).await;
    }

    let mut engine = CrawlEngine::new(create_source(&server));
    let report = engine.crawl_citations("500", 10, 2).await.unwrap();

    assert_eq!(report.added, vec!["501", "502"]);
    assert_eq!(report.deduplicated, 1);

    let entry = engine.state().entry("502").unwrap();
    assert_eq!(
        entry.found_by,
        vec![Provenance::cited_by("500"), Provenance::cited_by("501")]
    );
    assert_eq!(entry.authors, "Smith J, Author502 K.");
}

#[tokio::test]
async fn test_missing_detail_page_is_skipped() {
    let server = MockServer::start().await;
    mount_search_page(&server, "gaps", 1, listing_page(3, &["1", "2", "3"], true)).await;
    mount_detail(&server, "1").await;
    mount_detail(&server, "3").await;
    // No mock for /2/: wiremock answers 404

    let mut engine = CrawlEngine::new(create_source(&server));
    let report = engine
        .search_for("gaps", 10, &SearchFilters::default())
        .await
        .unwrap();

    assert_eq!(report.added, vec!["1", "3"]);
    assert_eq!(report.failed_ids, vec!["2"]);
    assert!(!engine.state().is_known("2"));
}

#[tokio::test]
async fn test_server_error_aborts_with_page_context() {
    let server = MockServer::start().await;
    mount_search_page(&server, "flaky", 1, listing_page(4, &["1", "2"], true)).await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("term", "flaky"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_detail(&server, "1").await;
    mount_detail(&server, "2").await;

    let mut engine = CrawlEngine::new(create_source(&server));
    let err = engine
        .search_for("flaky", 10, &SearchFilters::default())
        .await
        .unwrap_err();

    match err {
        CrawlerError::Traversal { report, source } => {
            assert_eq!(report.added, vec!["1", "2"]);
            assert_eq!(source.page(), 2);
            assert!(source.query().contains("flaky"));
            assert!(matches!(
                source,
                StreamError::Transport {
                    source: FetchError::Status { status: 500, .. },
                    ..
                }
            ));
        }
        other => panic!("Unexpected error: {}", other),
    }
    assert_eq!(engine.state().len(), 2);
}

#[tokio::test]
async fn test_requests_identify_the_crawler() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-agent", "TestBot/1.0.0 (+mailto:test@example.com)"))
        .and(query_param("term", "ua"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(0, &[], true)))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = CrawlEngine::new(create_source(&server));
    let report = engine
        .search_for("ua", 10, &SearchFilters::default())
        .await
        .unwrap();
    assert_eq!(report.processed, 0);
}

#[tokio::test]
async fn test_checkpoint_resume_skips_known_records() {
    let dir = TempDir::new().unwrap();
    let archive_path = dir.path().join("archive.sqlite");
    let checkpoint = dir.path().join("crawl.checkpoint.json");

    {
        let server = MockServer::start().await;
        mount_search_page(&server, "first", 1, listing_page(2, &["1", "2"], true)).await;
        mount_detail(&server, "1").await;
        mount_detail(&server, "2").await;

        let mut engine = CrawlEngine::with_archive(create_source(&server), &archive_path).unwrap();
        engine
            .search_for("first", 10, &SearchFilters::default())
            .await
            .unwrap();
        engine.save_checkpoint(&checkpoint).unwrap();
    }

    let server = MockServer::start().await;
    mount_search_page(&server, "second", 1, listing_page(2, &["2", "3"], true)).await;
    mount_detail(&server, "3").await;

    let mut engine = CrawlEngine::resume(&checkpoint, create_source(&server)).unwrap();
    assert_eq!(engine.state().len(), 2);

    let report = engine
        .search_for("second", 10, &SearchFilters::default())
        .await
        .unwrap();
    assert_eq!(report.added, vec!["3"]);

    let archive = engine.archive().expect("Archive not reopened");
    assert_eq!(archive.count_entries().unwrap(), 3);
    assert_eq!(
        archive.load_entry("2").unwrap().unwrap().found_by,
        vec![Provenance::query("first"), Provenance::query("second")]
    );
}

#[tokio::test]
async fn test_separate_runs_keep_found_by_history() {
    let dir = TempDir::new().unwrap();
    let archive_dir = dir.path().join("archive");

    for term in ["first", "second"] {
        let server = MockServer::start().await;
        mount_search_page(&server, term, 1, listing_page(1, &["1"], true)).await;
        mount_detail(&server, "1").await;

        // A fresh engine each time: nothing is resumed
        let mut engine = CrawlEngine::with_archive(create_source(&server), &archive_dir).unwrap();
        let report = engine
            .search_for(term, 10, &SearchFilters::default())
            .await
            .unwrap();
        assert_eq!(report.added, vec!["1"]);
    }

    let meta = std::fs::read_to_string(archive_dir.join("1.meta")).unwrap();
    assert!(meta.ends_with("found_by:\n - first\n - second\n"));

    let archive = open_archive(&archive_dir).unwrap();
    assert_eq!(
        archive.load_entry("1").unwrap().unwrap().found_by,
        vec![Provenance::query("first"), Provenance::query("second")]
    );
}
