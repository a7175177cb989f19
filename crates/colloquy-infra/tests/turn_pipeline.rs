//! Full turn pipeline against the real store, vault, and client: SQLite
//! persistence, filesystem attachments, and a stub HTTP endpoint.

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use colloquy_core::store::ConversationStore;
use colloquy_core::store::service::ConversationService;
use colloquy_infra::completion::HttpCompletionClient;
use colloquy_infra::sqlite::{DatabasePool, SqliteConversationStore};
use colloquy_infra::vault::FsAttachmentVault;
use colloquy_types::config::EndpointConfig;
use colloquy_types::message::AttachmentKind;

type Service =
    ConversationService<SqliteConversationStore, FsAttachmentVault, HttpCompletionClient>;

async fn service_for(addr: std::net::SocketAddr) -> (Service, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    let pool = DatabasePool::new(&url).await.unwrap();

    let store = SqliteConversationStore::new(pool);
    let vault = FsAttachmentVault::new(dir.path().to_path_buf());
    let client = HttpCompletionClient::new(EndpointConfig {
        base_url: format!("http://{addr}"),
        timeout_secs: 10,
        ..EndpointConfig::default()
    })
    .unwrap();

    (ConversationService::new(store, vault, client), dir)
}

/// Read one full HTTP request (headers + content-length body).
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed mid-request");
        buf.extend_from_slice(&chunk[..n]);

        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = headers
            .lines()
            .find_map(|line| {
                line.to_ascii_lowercase()
                    .strip_prefix("content-length:")
                    .map(|v| v.trim().parse::<usize>().unwrap())
            })
            .unwrap_or(0);
        let total = header_end + 4 + content_length;
        while buf.len() < total {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed mid-body");
            buf.extend_from_slice(&chunk[..n]);
        }
        return String::from_utf8_lossy(&buf[..total]).to_string();
    }
}

async fn respond(stream: &mut TcpStream, content_type: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await.unwrap();
    stream.flush().await.unwrap();
}

#[tokio::test]
async fn test_text_turn_persists_user_then_assistant() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (request_tx, request_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        respond(
            &mut stream,
            "application/json",
            r#"{"choices":[{"message":{"content":"I can help with that."}}]}"#,
        )
        .await;
        let _ = request_tx.send(request);
    });

    let (svc, _dir) = service_for(addr).await;
    let session = svc.create_session("local", None).await.unwrap();

    let outcome = svc
        .submit_turn(&session.id, "Can you help?", vec![])
        .await
        .unwrap();
    assert_eq!(outcome.user.sequence, 1);
    assert_eq!(outcome.assistant.as_ref().unwrap().sequence, 2);

    let messages = svc.store().list_messages(&session.id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].is_from_user);
    assert_eq!(messages[1].content, "I can help with that.");

    // No images, so the plain JSON endpoint was used.
    let request = request_rx.await.unwrap();
    assert!(request.starts_with("POST /v2/chat/completions "));

    // First user message titled the session.
    let session = svc.store().get_session(&session.id).await.unwrap().unwrap();
    assert_eq!(session.title.as_deref(), Some("Can you help?"));
}

#[tokio::test]
async fn test_image_turn_streams_with_two_part_content() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (request_tx, request_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let body = "data: {\"text\":\"A cat\"}\n\ndata: {\"text\":\" photo.\"}\n\ndata: [DONE]\n\n";
        respond(&mut stream, "text/event-stream", body).await;
        let _ = request_tx.send(request);
    });

    let (svc, _dir) = service_for(addr).await;
    let session = svc.create_session("local", None).await.unwrap();

    let reference = svc.store_attachment(&[0x89, 0x50, 0x4e, 0x47], "png").await.unwrap();
    assert_eq!(reference.kind, AttachmentKind::Image);

    let outcome = svc
        .submit_turn(&session.id, "what is this?", vec![reference.clone()])
        .await
        .unwrap();
    assert_eq!(outcome.assistant.as_ref().unwrap().content, "A cat photo.");
    assert_eq!(outcome.user.attachment_refs, vec![reference]);

    let request = request_rx.await.unwrap();
    assert!(request.starts_with("POST /v1/chat/completions "));
    let body = request.split("\r\n\r\n").nth(1).unwrap();
    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    let content = &json["messages"][0]["content"];
    assert_eq!(content.as_array().unwrap().len(), 2);
    assert_eq!(content[0]["type"], "text");
    assert_eq!(content[0]["text"], "what is this?");
    assert_eq!(content[1]["type"], "image");
    assert!(content[1]["image_base64"].is_string());
}

#[tokio::test]
async fn test_delete_session_removes_stored_attachment_file() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_request(&mut stream).await;
        let body = "data: {\"text\":\"noted\"}\n\ndata: [DONE]\n\n";
        respond(&mut stream, "text/event-stream", body).await;
    });

    let (svc, dir) = service_for(addr).await;
    let session = svc.create_session("local", None).await.unwrap();

    let reference = svc.store_attachment(&[1, 2, 3], "png").await.unwrap();
    let file_path = dir.path().join(&reference.path);
    assert!(file_path.exists());

    svc.submit_turn(&session.id, "keep this", vec![reference])
        .await
        .unwrap();

    svc.delete_session(&session.id).await.unwrap();
    assert!(!file_path.exists());
    assert!(svc.store().get_session(&session.id).await.unwrap().is_none());
}
