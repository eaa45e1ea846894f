//! Daily summaries posted to a live gateway

mod common;

use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;

use common::TableEmbedder;
use health_rag::config::DailyIngestConfig;
use health_rag::ingestion::{DaySummary, SummaryUploader, UploadReport};
use health_rag::providers::{EmbeddingProvider, InMemoryVectorStore, VectorStoreProvider};
use health_rag::server::{GatewayServer, GatewayState};
use health_rag::RagConfig;

/// Serve a gateway on an ephemeral port; returns its `/ingest` URL
async fn spawn_gateway(embedder: TableEmbedder) -> (String, Arc<InMemoryVectorStore>) {
    let store = Arc::new(InMemoryVectorStore::new());
    let state = GatewayState::new(
        &RagConfig::default(),
        store.clone() as Arc<dyn VectorStoreProvider>,
        Arc::new(embedder) as Arc<dyn EmbeddingProvider>,
    );
    let router = GatewayServer::new(RagConfig::default(), state).build_router();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}/ingest", addr), store)
}

fn summaries(count: usize) -> Vec<DaySummary> {
    (0..count)
        .map(|i| DaySummary {
            user_id: format!("u{}", i),
            date: "2024-03-01".to_string(),
            text: format!("summary {}", i),
        })
        .collect()
}

fn uploader(url: String, batch_size: usize, max_concurrent: usize) -> SummaryUploader {
    SummaryUploader::from_config(&DailyIngestConfig {
        api_url: url,
        batch_size,
        max_concurrent,
        max_attempts: 1,
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_batches_reach_the_gateway() {
    let (url, store) = spawn_gateway(TableEmbedder::new(2).with_fallback(vec![1.0, 0.0])).await;

    let report = uploader(url, 2, 2).upload(&summaries(5)).await;

    assert_eq!(
        report,
        UploadReport {
            batches: 3,
            sent: 5,
            failed: 0
        }
    );
    assert_eq!(store.len(), 5);

    let stored = store.nearest(&[1.0, 0.0], 10).await.unwrap();
    let mut users: Vec<String> = stored
        .iter()
        .map(|obj| {
            let meta: Value = serde_json::from_str(&obj.meta).unwrap();
            assert_eq!(meta["type"], "daily_summary");
            assert_eq!(meta["date"], "2024-03-01");
            meta["user_id"].as_str().unwrap().to_string()
        })
        .collect();
    users.sort();
    assert_eq!(users, vec!["u0", "u1", "u2", "u3", "u4"]);
}

#[tokio::test]
async fn test_gateway_failures_are_counted() {
    // Only "summary 1" has a vector; the gateway answers 500 for the rest
    let (url, store) = spawn_gateway(TableEmbedder::new(2).with("summary 1", vec![0.0, 1.0])).await;

    let report = uploader(url, 10, 3).upload(&summaries(3)).await;

    assert_eq!(report.batches, 1);
    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(store.len(), 1);
}
