//! API route handlers for the gateway.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use super::server::AppState;

/// Reply to `POST /chat`.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub context_used: Vec<String>,
}

/// Reply to `POST /upload`.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub total_docs: usize,
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "asklyn-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Answer a chat message: retrieve context, then compose the reply.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(body) = body.map_err(|e| {
        tracing::debug!("Chat body rejected: {e}");
        ApiError::InvalidJson
    })?;

    let message = body["message"].as_str().unwrap_or("");
    if message.is_empty() {
        return Err(ApiError::NoMessage);
    }

    let context = {
        let kb = state.knowledge.read().await;
        state.retriever.retrieve(&kb, message)
    };
    let response = state.composer.compose(message, &context);
    tracing::info!("💬 Chat answered with {} context document(s)", context.len());

    Ok(Json(ChatResponse {
        response,
        context_used: context,
    }))
}

/// Append an uploaded text file, whole, to the knowledge base.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Upload body rejected: {e}");
        ApiError::NoFilePart
    })?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        // A part without a filename attribute is a plain form field, not a file.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or(ApiError::NoFilePart)?;
    if filename.is_empty() {
        return Err(ApiError::NoSelectedFile);
    }
    let text = std::str::from_utf8(&bytes)
        .map_err(|_| ApiError::InvalidEncoding)?
        .to_string();

    let total_docs = state.knowledge.write().await.append(text);
    tracing::info!(
        "📄 Assimilated '{}' ({} bytes), {} document(s) total",
        filename,
        bytes.len(),
        total_docs
    );

    Ok(Json(UploadResponse {
        message: format!("File {filename} assimilated into Knowledge Base."),
        total_docs,
    }))
}

// ---- Knowledge Base API ----

/// Document count.
pub async fn knowledge_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let kb = state.knowledge.read().await;
    Json(serde_json::json!({ "total_docs": kb.len() }))
}

/// Scored retrieval, for inspecting what `/chat` would see.
pub async fn knowledge_search(
    State(state): State<Arc<AppState>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::InvalidJson)?;

    let query = body["query"].as_str().unwrap_or("");
    if query.is_empty() {
        return Err(ApiError::NoMessage);
    }
    let limit = body["limit"]
        .as_u64()
        .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
        .unwrap_or_else(|| state.retriever.top_k());

    let results = {
        let kb = state.knowledge.read().await;
        state.retriever.search(&kb, query, limit)
    };
    Ok(Json(serde_json::json!({
        "query": query,
        "count": results.len(),
        "results": results,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::build_router;
    use asklyn_core::config::AskLynConfig;
    use asklyn_knowledge::KnowledgeStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    const BOUNDARY: &str = "asklyn-test-boundary";

    fn test_state() -> State<Arc<AppState>> {
        State(Arc::new(AppState::new(AskLynConfig::default())))
    }

    fn test_app() -> axum::Router {
        build_router(AppState::new(AskLynConfig::default()))
    }

    fn multipart_body(field: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
        let disposition = match filename {
            Some(name) => format!("form-data; name=\"{field}\"; filename=\"{name}\""),
            None => format!("form-data; name=\"{field}\""),
        };
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: text/plain\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ---- Health ----

    #[tokio::test]
    async fn test_health_check() {
        let json = health_check(test_state()).await.0;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "asklyn-gateway");
    }

    #[tokio::test]
    async fn test_dashboard_page() {
        let resp = test_app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("/chat"));
    }

    // ---- Chat ----

    #[tokio::test]
    async fn test_chat_rag_question() {
        let body = Json(serde_json::json!({"message": "What is RAG?"}));
        let resp = chat(test_state(), Ok(body)).await.unwrap().0;

        assert!(!resp.context_used.is_empty());
        assert!(resp.context_used.len() <= 2);
        assert!(
            resp.context_used
                .iter()
                .any(|doc| doc.starts_with("RAG stands for Retrieval-Augmented Generation"))
        );
        assert!(resp.response.contains("'What is RAG?'"));
        for doc in &resp.context_used {
            assert!(resp.response.contains(doc.as_str()));
        }
    }

    #[tokio::test]
    async fn test_chat_without_matches() {
        let body = Json(serde_json::json!({"message": "cats"}));
        let resp = chat(test_state(), Ok(body)).await.unwrap().0;
        assert!(resp.context_used.is_empty());
        assert!(resp.response.contains("No specific context found."));
    }

    #[tokio::test]
    async fn test_chat_empty_message() {
        let resp = test_app()
            .oneshot(json_request("/chat", serde_json::json!({"message": ""})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(resp).await, serde_json::json!({"error": "No message provided"}));
    }

    #[tokio::test]
    async fn test_chat_missing_or_non_string_message() {
        for body in [serde_json::json!({}), serde_json::json!({"message": 42})] {
            let result = chat(test_state(), Ok(Json(body))).await;
            assert!(matches!(result, Err(ApiError::NoMessage)));
        }
    }

    #[tokio::test]
    async fn test_chat_invalid_json() {
        let req = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = test_app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(resp).await["error"], "Invalid JSON body");
    }

    #[tokio::test]
    async fn test_chat_over_http() {
        let resp = test_app()
            .oneshot(json_request("/chat", serde_json::json!({"message": "upload files"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = read_json(resp).await;
        assert!(json["response"].is_string());
        assert_eq!(json["context_used"].as_array().unwrap().len(), 1);
    }

    // ---- Upload ----

    #[tokio::test]
    async fn test_upload_then_chat_finds_document() {
        let app = test_app();

        let resp = app
            .clone()
            .oneshot(upload_request(multipart_body("file", Some("cats.txt"), b"Lyn loves cats.")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = read_json(resp).await;
        assert_eq!(json["total_docs"], 5);
        assert_eq!(json["message"], "File cats.txt assimilated into Knowledge Base.");

        let resp = app
            .oneshot(json_request("/chat", serde_json::json!({"message": "cats"})))
            .await
            .unwrap();
        let json = read_json(resp).await;
        assert_eq!(json["context_used"], serde_json::json!(["Lyn loves cats."]));
    }

    #[tokio::test]
    async fn test_upload_missing_file_part() {
        let resp = test_app()
            .oneshot(upload_request(multipart_body("notes", Some("a.txt"), b"hello")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(resp).await, serde_json::json!({"error": "No file part"}));
    }

    #[tokio::test]
    async fn test_upload_not_multipart() {
        let resp = test_app()
            .oneshot(json_request("/upload", serde_json::json!({"file": "x"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(resp).await["error"], "No file part");
    }

    #[tokio::test]
    async fn test_upload_empty_filename() {
        let resp = test_app()
            .oneshot(upload_request(multipart_body("file", Some(""), b"hello")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(resp).await["error"], "No selected file");
    }

    #[tokio::test]
    async fn test_upload_file_field_without_filename() {
        let state = AppState::new(AskLynConfig::default());
        let knowledge = state.knowledge.clone();
        let resp = build_router(state)
            .oneshot(upload_request(multipart_body("file", None, b"hello")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(resp).await, serde_json::json!({"error": "No file part"}));
        assert_eq!(knowledge.read().await.len(), 4);
    }

    #[tokio::test]
    async fn test_knowledge_search_huge_limit() {
        let body = Json(serde_json::json!({"query": "AskLyn", "limit": u64::MAX}));
        let json = knowledge_search(test_state(), Ok(body)).await.unwrap().0;
        let count = json["count"].as_u64().unwrap();
        assert!(count >= 1 && count <= 4);
    }

    #[tokio::test]
    async fn test_upload_invalid_utf8() {
        let state = AppState::new(AskLynConfig::default());
        let knowledge = state.knowledge.clone();
        let resp = build_router(state)
            .oneshot(upload_request(multipart_body("file", Some("blob.bin"), &[0xff, 0xfe, 0x00])))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(resp).await["error"], "Uploaded file is not valid UTF-8 text");
        assert_eq!(knowledge.read().await.len(), 4);
    }

    #[tokio::test]
    async fn test_upload_too_large() {
        let mut config = AskLynConfig::default();
        config.gateway.max_upload_bytes = 64;
        let app = build_router(AppState::new(config));

        let resp = app
            .oneshot(upload_request(multipart_body("file", Some("big.txt"), &[b'a'; 1024])))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_concurrent_uploads_are_all_counted() {
        let app = test_app();
        let mut handles = Vec::new();
        for i in 0..16 {
            let app = app.clone();
            handles.push(tokio::spawn(async move {
                let content = format!("note number {i}");
                app.oneshot(upload_request(multipart_body(
                    "file",
                    Some("note.txt"),
                    content.as_bytes(),
                )))
                .await
                .unwrap()
                .status()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), StatusCode::OK);
        }

        let resp = app
            .oneshot(Request::get("/api/v1/knowledge/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(read_json(resp).await["total_docs"], 20);
    }

    // ---- Knowledge Base API ----

    #[tokio::test]
    async fn test_knowledge_stats() {
        let state = Arc::new(AppState::with_store(
            AskLynConfig::default(),
            KnowledgeStore::with_documents(["one", "two"]),
        ));
        let json = knowledge_stats(State(state)).await.0;
        assert_eq!(json["total_docs"], 2);
    }

    #[tokio::test]
    async fn test_knowledge_search_scores() {
        let body = Json(serde_json::json!({"query": "Who is the creator of AskLyn?", "limit": 4}));
        let json = knowledge_search(test_state(), Ok(body)).await.unwrap().0;

        let results = json["results"].as_array().unwrap();
        assert_eq!(json["count"], results.len());
        assert_eq!(results[0]["index"], 1);
        let scores: Vec<f64> = results.iter().map(|r| r["score"].as_f64().unwrap()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert!(scores.iter().all(|&s| s > 0.1));
    }

    #[tokio::test]
    async fn test_knowledge_search_empty_query() {
        let body = Json(serde_json::json!({"query": ""}));
        let result = knowledge_search(test_state(), Ok(body)).await;
        assert!(matches!(result, Err(ApiError::NoMessage)));
    }

    #[tokio::test]
    async fn test_empty_store_chat() {
        let state = Arc::new(AppState::with_store(
            AskLynConfig::default(),
            KnowledgeStore::new(),
        ));
        let body = Json(serde_json::json!({"message": "What is RAG?"}));
        let resp = chat(State(state), Ok(body)).await.unwrap().0;
        assert!(resp.context_used.is_empty());
    }
}
