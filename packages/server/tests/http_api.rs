//! HTTP API integration tests.
//!
//! Tests for REST API endpoints (health check, room list, room details).

mod fixtures;
use fixtures::{TestServer, WsClient};
use mamalink_server::infrastructure::dto::websocket::{
    ClientEvent, RegisterPayload, ServerEvent, StartConversationPayload,
};

async fn open_room(server: &TestServer) -> (WsClient, String) {
    let mut doctor = WsClient::connect(&server.ws_url()).await;
    doctor
        .send(&ClientEvent::Register(RegisterPayload {
            user_id: "doctor123".to_string(),
            role: "doctor".to_string(),
        }))
        .await;
    doctor
        .send(&ClientEvent::StartConversation(StartConversationPayload {
            target_user_id: "patient456".to_string(),
        }))
        .await;
    let ServerEvent::ConversationStarted(payload) = doctor.recv().await else {
        panic!("expected conversationStarted");
    };
    (doctor, payload.room_id)
}

#[tokio::test]
async fn test_health_endpoint() {
    // テスト項目: /api/health エンドポイントが正常に動作する
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // when (操作):
    let response = client
        .get(format!("{}/api/health", server.base_url()))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_rooms_list_endpoint() {
    // テスト項目: /api/rooms エンドポイントが開始済みの会話を返す
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let (_doctor, room_id) = open_room(&server).await;

    // when (操作):
    let response = client
        .get(format!("{}/api/rooms", server.base_url()))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let rooms = body.as_array().expect("Response should be an array");
    assert_eq!(rooms.len(), 1);

    let room = &rooms[0];
    assert_eq!(room["id"], room_id.as_str());
    assert_eq!(room["participants"][0], "doctor123");
    assert_eq!(room["participants"][1], "patient456");
    assert_eq!(room["message_count"], 0);
    assert!(room["created_at"].is_string());
}

#[tokio::test]
async fn test_room_detail_endpoint_success() {
    // テスト項目: /api/rooms/{room_id} エンドポイントが参加者のオンライン状態を返す
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let (_doctor, room_id) = open_room(&server).await;

    // when (操作):
    let response = client
        .get(format!("{}/api/rooms/{}", server.base_url(), room_id))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["id"], room_id.as_str());
    let participants = body["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 2);
    assert_eq!(participants[0]["user_id"], "doctor123");
    assert_eq!(participants[0]["online"], true);
    assert_eq!(participants[0]["role"], "doctor");
    assert!(participants[0]["connected_at"].as_str().unwrap().contains('T'));
    assert_eq!(participants[1]["user_id"], "patient456");
    assert_eq!(participants[1]["online"], false);
    assert!(participants[1].get("role").is_none());
    assert!(participants[1].get("connected_at").is_none());
    assert_eq!(body["unread_count"], 0);
}

#[tokio::test]
async fn test_room_detail_endpoint_not_found() {
    // テスト項目: /api/rooms/{room_id} エンドポイントが存在しないルームに対して404を返す
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // when (操作):
    let response = client
        .get(format!("{}/api/rooms/nonexistent", server.base_url()))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 404);
}
