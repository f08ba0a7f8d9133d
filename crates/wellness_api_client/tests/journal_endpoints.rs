use secrecy::SecretString;
use wellness_api_client::http_client::ReqwestWellnessClient;
use wellness_api_client::{
    BackendError, ConversationEdit, ConversationRequest, WellnessBackend,
};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ReqwestWellnessClient {
    ReqwestWellnessClient::with_token(&server.uri(), Some(SecretString::new("tok".into())))
}

#[tokio::test]
async fn start_conversation_posts_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/journal/journal/conversation"))
        .and(body_json(serde_json::json!({"message": "Slept badly"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "conversation_id": "c-1",
            "reply": "What kept you up?"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client(&server)
        .start_conversation(&ConversationRequest {
            conversation_id: None,
            message: "Slept badly".into(),
        })
        .await
        .expect("reply");
    assert_eq!(reply["conversation_id"], "c-1");
}

#[tokio::test]
async fn continue_conversation_carries_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/journal/journal/conversation"))
        .and(body_json(serde_json::json!({
            "conversation_id": "c-1",
            "message": "Too much coffee"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"done": true})))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client(&server)
        .start_conversation(&ConversationRequest {
            conversation_id: Some("c-1".into()),
            message: "Too much coffee".into(),
        })
        .await
        .expect("reply");
    assert_eq!(reply["done"], true);
}

#[tokio::test]
async fn blank_message_is_rejected_locally() {
    let server = MockServer::start().await;
    let err = client(&server)
        .start_conversation(&ConversationRequest {
            conversation_id: None,
            message: "   ".into(),
        })
        .await
        .expect_err("blank");
    assert!(matches!(err, BackendError::InvalidInput(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn edit_conversation_uses_patch() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v2/journal/journal/conversation"))
        .and(body_json(serde_json::json!({
            "conversation_id": "c-1",
            "message_index": 2,
            "message": "Actually, tea"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client(&server)
        .edit_conversation(&ConversationEdit {
            conversation_id: "c-1".into(),
            message_index: 2,
            message: "Actually, tea".into(),
        })
        .await
        .expect("edit");
    assert_eq!(reply["ok"], true);
}

#[tokio::test]
async fn journal_by_day_formats_date() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/journal/journal/by-day"))
        .and(query_param("date", "2024-01-05"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"entries": []})))
        .expect(1)
        .mount(&server)
        .await;

    let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
    let day = client(&server).get_journal_by_day(date).await.expect("day");
    assert!(day["entries"].is_array());
}

#[tokio::test]
async fn monthly_summary_returns_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/journal/journal/summary/month"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "days": {"2024-01-05": "calm"}
        })))
        .mount(&server)
        .await;

    let summary = client(&server).get_monthly_summary().await.expect("summary");
    assert_eq!(summary["days"]["2024-01-05"], "calm");
}
