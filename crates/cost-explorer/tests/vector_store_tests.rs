//! Integration tests for embeddings, Pinecone upserts and the vector sink.

use cost_explorer::output::{dispatch, OutputContext, OutputFormat, VectorTarget};
use cost_explorer::query::Granularity;
use cost_explorer::report::{Metric, ServiceRecord};
use cost_explorer::vector::{
    attach_embeddings, OpenAiEmbeddings, Pinecone, UpsertPipeline, VectorItem, VectorStore,
};
use cost_explorer::ExplorerError;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn items(n: usize) -> Vec<VectorItem> {
    (0..n)
        .map(|i| {
            VectorItem::new(format!("id-{i}"), format!("text {i}"))
                .with_metadata("metric", "UnblendedCost")
                .with_embedding(vec![i as f32, 0.5])
        })
        .collect()
}

fn batch_ids(request: &Request) -> Vec<String> {
    let body: Value = serde_json::from_slice(&request.body).unwrap();
    body["vectors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap().to_string())
        .collect()
}

/// Embedding response with one vector per input text.
fn embeddings_for(request: &Request) -> ResponseTemplate {
    let body: Value = serde_json::from_slice(&request.body).unwrap();
    let data: Vec<Value> = body["input"]
        .as_array()
        .unwrap()
        .iter()
        .enumerate()
        .map(|(i, _)| json!({"object": "embedding", "index": i, "embedding": [i as f32, 1.0]}))
        .collect();
    ResponseTemplate::new(200).set_body_json(json!({"object": "list", "data": data}))
}

#[tokio::test]
async fn test_pinecone_upsert_request_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .and(header("Api-Key", "pc-test"))
        .and(header("content-type", "application/json"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"upsertedCount": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let store = Pinecone::new(server.uri(), "pc-test").unwrap();
    store.upsert_batch(&items(2)).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body["vectors"][1],
        json!({"id": "id-1", "values": [1.0, 0.5], "metadata": {"metric": "UnblendedCost"}})
    );
}

#[tokio::test]
async fn test_any_2xx_is_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let store = Pinecone::new(server.uri(), "pc-test").unwrap();
    assert!(store.upsert_batch(&items(1)).await.is_ok());
}

#[tokio::test]
async fn test_thirty_items_second_batch_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(ResponseTemplate::new(500).set_body_string("index unavailable"))
        .mount(&server)
        .await;

    let store = Pinecone::new(server.uri(), "pc-test").unwrap();
    let items = items(30);
    let err = UpsertPipeline::new(&store).upsert(&items).await.unwrap_err();

    match &err {
        ExplorerError::Upsert {
            status,
            message,
            confirmed,
        } => {
            assert_eq!(*status, Some(500));
            assert_eq!(message, "index unavailable");
            assert_eq!(*confirmed, 25);
        }
        other => panic!("expected upsert error, got {other:?}"),
    }

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let first = batch_ids(&requests[0]);
    let second = batch_ids(&requests[1]);
    assert_eq!(first.len(), 25);
    assert_eq!(second.len(), 5);

    let sent: Vec<String> = first.into_iter().chain(second).collect();
    let expected: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
    assert_eq!(sent, expected);
}

#[tokio::test]
async fn test_thirty_items_all_succeed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let store = Pinecone::new(server.uri(), "pc-test").unwrap();
    let count = UpsertPipeline::new(&store).upsert(&items(30)).await.unwrap();
    assert_eq!(count, 30);
}

#[tokio::test]
async fn test_openai_embeddings_request_and_alignment() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("Authorization", "Bearer sk-test"))
        .respond_with(embeddings_for)
        .expect(2)
        .mount(&server)
        .await;

    let generator = OpenAiEmbeddings::new(server.uri(), "sk-test", "text-embedding-3-small").unwrap();
    let mut items: Vec<VectorItem> = (0..27)
        .map(|i| VectorItem::new(format!("id-{i}"), format!("text {i}")))
        .collect();
    attach_embeddings(&generator, &mut items).await.unwrap();

    // Second chunk restarts at index 0.
    assert_eq!(items[0].embedding, Some(vec![0.0, 1.0]));
    assert_eq!(items[24].embedding, Some(vec![24.0, 1.0]));
    assert_eq!(items[26].embedding, Some(vec![1.0, 1.0]));

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "text-embedding-3-small");
    assert_eq!(body["input"].as_array().unwrap().len(), 25);
}

#[tokio::test]
async fn test_embedding_count_mismatch_is_alignment_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"index": 0, "embedding": [0.1, 0.2]}]
        })))
        .mount(&server)
        .await;

    let generator = OpenAiEmbeddings::new(server.uri(), "sk-test", "m").unwrap();
    let mut items: Vec<VectorItem> = (0..3)
        .map(|i| VectorItem::new(format!("id-{i}"), format!("text {i}")))
        .collect();
    let err = attach_embeddings(&generator, &mut items).await.unwrap_err();

    assert!(matches!(
        err,
        ExplorerError::EmbeddingAlignment {
            expected: 3,
            actual: 1
        }
    ));
    assert!(items.iter().all(|i| i.embedding.is_none()));
}

#[tokio::test]
async fn test_vector_sink_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(embeddings_for)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let records = vec![ServiceRecord {
        keys: vec!["Amazon EC2".into()],
        start: "2024-01-01".into(),
        end: "2024-02-01".into(),
        metrics: vec![
            Metric {
                name: "UnblendedCost".into(),
                amount_text: "12.5".into(),
                amount: 12.5,
                unit: "USD".into(),
            },
            Metric {
                name: "UsageQuantity".into(),
                amount_text: "730".into(),
                amount: 730.0,
                unit: "Hrs".into(),
            },
        ],
    }];

    let generator = OpenAiEmbeddings::new(server.uri(), "sk-test", "m").unwrap();
    let store = Pinecone::new(server.uri(), "pc-test").unwrap();
    let mut out: Vec<u8> = Vec::new();

    dispatch(
        OutputFormat::VectorStore,
        &records,
        OutputContext {
            granularity: Granularity::Monthly,
            out: &mut out,
            vector: Some(VectorTarget {
                embeddings: &generator,
                store: &store,
            }),
        },
    )
    .await
    .unwrap();

    assert_eq!(String::from_utf8(out).unwrap().trim(), "Upserted 2 vectors");

    let upserts: Vec<Request> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/vectors/upsert")
        .collect();
    let body: Value = serde_json::from_slice(&upserts[0].body).unwrap();
    let vectors = body["vectors"].as_array().unwrap();
    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0]["metadata"]["key_0"], "Amazon EC2");
    assert_eq!(vectors[0]["metadata"]["granularity"], "MONTHLY");
    assert_eq!(vectors[0]["id"].as_str().unwrap().len(), 40);
}

#[tokio::test]
async fn test_duplicate_embedding_indices_are_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"index": 0, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [0.5, 1.0]},
                {"index": 1, "embedding": [1.0, 1.0]}
            ]
        })))
        .mount(&server)
        .await;

    let generator = OpenAiEmbeddings::new(server.uri(), "sk-test", "m").unwrap();
    let mut items: Vec<VectorItem> = (0..3)
        .map(|i| VectorItem::new(format!("id-{i}"), format!("text {i}")))
        .collect();
    let err = attach_embeddings(&generator, &mut items).await.unwrap_err();

    assert!(matches!(
        err,
        ExplorerError::EmbeddingOrder {
            position: 1,
            index: 0
        }
    ));
    assert!(items.iter().all(|i| i.embedding.is_none()));
}

#[tokio::test]
async fn test_out_of_range_embedding_index_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"index": 0, "embedding": [0.0, 1.0]},
                {"index": 5, "embedding": [1.0, 1.0]}
            ]
        })))
        .mount(&server)
        .await;

    let generator = OpenAiEmbeddings::new(server.uri(), "sk-test", "m").unwrap();
    let mut items: Vec<VectorItem> = (0..2)
        .map(|i| VectorItem::new(format!("id-{i}"), format!("text {i}")))
        .collect();
    let err = attach_embeddings(&generator, &mut items).await.unwrap_err();

    assert!(matches!(
        err,
        ExplorerError::EmbeddingOrder {
            position: 1,
            index: 5
        }
    ));
}

#[tokio::test]
async fn test_vector_sink_with_no_records_makes_no_calls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(embeddings_for)
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let generator = OpenAiEmbeddings::new(server.uri(), "sk-test", "m").unwrap();
    let store = Pinecone::new(server.uri(), "pc-test").unwrap();
    let mut out: Vec<u8> = Vec::new();

    dispatch(
        OutputFormat::VectorStore,
        &[],
        OutputContext {
            granularity: Granularity::Daily,
            out: &mut out,
            vector: Some(VectorTarget {
                embeddings: &generator,
                store: &store,
            }),
        },
    )
    .await
    .unwrap();

    assert_eq!(String::from_utf8(out).unwrap().trim(), "Upserted 0 vectors");
    assert!(server.received_requests().await.unwrap().is_empty());
}
