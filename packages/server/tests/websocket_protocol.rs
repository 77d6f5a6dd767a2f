//! WebSocket protocol integration tests.
//!
//! Drives the relay with two raw clients (a doctor and a patient) and checks
//! the event vocabulary end to end.

mod fixtures;
use fixtures::{TestServer, WsClient};
use mamalink_server::infrastructure::dto::websocket::{
    ClientEvent, MarkAsReadPayload, NoticePayload, RegisterPayload, RoomPayload,
    SendMessagePayload, ServerEvent, StartConversationPayload,
};

async fn register(server: &TestServer, user_id: &str, role: &str) -> WsClient {
    let mut client = WsClient::connect(&server.ws_url()).await;
    client
        .send(&ClientEvent::Register(RegisterPayload {
            user_id: user_id.to_string(),
            role: role.to_string(),
        }))
        .await;
    // register has no acknowledgement; a failing history request confirms it was processed
    client
        .send(&ClientEvent::GetMessageHistory(RoomPayload {
            room_id: "unknown-room".to_string(),
        }))
        .await;
    assert!(matches!(client.recv().await, ServerEvent::Error(_)));
    client
}

async fn start(client: &mut WsClient, target: &str) -> String {
    client
        .send(&ClientEvent::StartConversation(StartConversationPayload {
            target_user_id: target.to_string(),
        }))
        .await;
    match client.recv().await {
        ServerEvent::ConversationStarted(payload) => payload.room_id,
        other => panic!("expected conversationStarted, got {other:?}"),
    }
}

/// Both sides start the room; the doctor's `user-joined` notice is consumed.
async fn open_room(doctor: &mut WsClient, patient: &mut WsClient) -> String {
    let room_id = start(doctor, "patient456").await;
    let patient_room = start(patient, "doctor123").await;
    assert_eq!(room_id, patient_room);
    assert!(matches!(doctor.recv().await, ServerEvent::UserJoined(_)));
    room_id
}

fn send_event(room_id: &str, content: &str, receiver: &str, nonce: Option<&str>) -> ClientEvent {
    ClientEvent::SendMessage(SendMessagePayload {
        room_id: room_id.to_string(),
        content: content.to_string(),
        receiver_id: receiver.to_string(),
        client_nonce: nonce.map(str::to_string),
    })
}

#[tokio::test]
async fn test_both_sides_share_one_room_and_see_join() {
    // テスト項目: 双方が会話を開始すると同じルームになり、先に参加した側に user-joined が届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut doctor = register(&server, "doctor123", "doctor").await;
    let mut patient = register(&server, "patient456", "patient").await;

    // when (操作):
    let doctor_room = start(&mut doctor, "patient456").await;
    // patient はまだルームに参加していないので通知は届かない
    patient.expect_silence(200).await;
    let patient_room = start(&mut patient, "doctor123").await;

    // then (期待する結果):
    assert_eq!(doctor_room, patient_room);
    assert_eq!(
        doctor.recv().await,
        ServerEvent::UserJoined(NoticePayload {
            message: "patient456 joined the conversation".to_string()
        })
    );
    patient.expect_silence(200).await;
}

#[tokio::test]
async fn test_send_echoes_to_sender_and_delivers_to_receiver() {
    // テスト項目: 送信したメッセージは送信者にエコーされ、受信者に届く（nonce 付き）
    // given (前提条件):
    let server = TestServer::start().await;
    let mut doctor = register(&server, "doctor123", "doctor").await;
    let mut patient = register(&server, "patient456", "patient").await;
    let room_id = open_room(&mut doctor, &mut patient).await;

    // when (操作):
    doctor
        .send(&send_event(&room_id, "Any swelling today?", "patient456", Some("n-1")))
        .await;

    // then (期待する結果):
    let ServerEvent::NewMessage(echo) = doctor.recv().await else {
        panic!("expected echo");
    };
    let ServerEvent::NewMessage(delivered) = patient.recv().await else {
        panic!("expected delivery");
    };
    assert_eq!(echo, delivered);
    assert_eq!(echo.sender_id, "doctor123");
    assert_eq!(echo.content, "Any swelling today?");
    assert_eq!(echo.client_nonce.as_deref(), Some("n-1"));
    assert!(!echo.is_read);
}

#[tokio::test]
async fn test_third_user_room_stays_separate() {
    // テスト項目: 第三者とのルームのイベントは、そのルームに参加するまで配送されない
    // given (前提条件): doctor123 と patient456 が会話中
    let server = TestServer::start().await;
    let mut doctor = register(&server, "doctor123", "doctor").await;
    let mut patient = register(&server, "patient456", "patient").await;
    let room_id = open_room(&mut doctor, &mut patient).await;
    let mut nurse = register(&server, "nurse1", "doctor").await;

    // when (操作): nurse1 が doctor123 とのルームを開き、メッセージを送る
    let nurse_room = start(&mut nurse, "doctor123").await;
    nurse
        .send(&send_event(&nurse_room, "Lab results are in", "doctor123", None))
        .await;
    let _echo = nurse.recv().await;
    patient
        .send(&send_event(&room_id, "Feeling better", "doctor123", None))
        .await;
    let _patient_echo = patient.recv().await;

    // then (期待する結果): doctor123 には patient456 のメッセージだけが届く
    assert_ne!(room_id, nurse_room);
    let ServerEvent::NewMessage(delivered) = doctor.recv().await else {
        panic!("expected delivery from patient456");
    };
    assert_eq!(delivered.sender_id, "patient456");
    assert_eq!(delivered.content, "Feeling better");
    doctor.expect_silence(200).await;

    // doctor123 が nurse1 のルームに参加すると、そのルームの履歴とイベントが届く
    let resumed = start(&mut doctor, "nurse1").await;
    assert_eq!(resumed, nurse_room);
    assert!(matches!(nurse.recv().await, ServerEvent::UserJoined(_)));
    doctor
        .send(&ClientEvent::GetMessageHistory(RoomPayload {
            room_id: nurse_room.clone(),
        }))
        .await;
    let ServerEvent::MessageHistory(history) = doctor.recv().await else {
        panic!("expected messageHistory");
    };
    assert_eq!(history.messages.len(), 1);
    assert_eq!(history.messages[0].sender_id, "nurse1");
}

#[tokio::test]
async fn test_system_id_is_reserved() {
    // テスト項目: システム用の ID での登録や会話開始は拒否される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut impostor = WsClient::connect(&server.ws_url()).await;
    let mut doctor = register(&server, "doctor123", "doctor").await;

    // when (操作):
    impostor
        .send(&ClientEvent::Register(RegisterPayload {
            user_id: "system".to_string(),
            role: "doctor".to_string(),
        }))
        .await;
    let rejected = impostor.recv().await;
    doctor
        .send(&ClientEvent::StartConversation(StartConversationPayload {
            target_user_id: "system".to_string(),
        }))
        .await;
    let refused = doctor.recv().await;

    // then (期待する結果):
    let ServerEvent::Error(NoticePayload { message }) = rejected else {
        panic!("expected error, got {rejected:?}");
    };
    assert!(message.contains("reserved"));
    assert!(matches!(refused, ServerEvent::Error(_)));
    // 拒否された接続は未登録のまま
    impostor
        .send(&ClientEvent::StartConversation(StartConversationPayload {
            target_user_id: "doctor123".to_string(),
        }))
        .await;
    assert!(matches!(impostor.recv().await, ServerEvent::Error(_)));
}

#[tokio::test]
async fn test_history_and_read_receipts() {
    // テスト項目: 履歴取得と既読通知が往復する
    // given (前提条件):
    let server = TestServer::start().await;
    let mut doctor = register(&server, "doctor123", "doctor").await;
    let mut patient = register(&server, "patient456", "patient").await;
    let room_id = open_room(&mut doctor, &mut patient).await;
    doctor
        .send(&send_event(&room_id, "Take your iron supplement", "patient456", None))
        .await;
    let _echo = doctor.recv().await;
    let ServerEvent::NewMessage(delivered) = patient.recv().await else {
        panic!("expected delivery");
    };

    // when (操作): patient が既読を送り、履歴を取得する
    patient
        .send(&ClientEvent::MarkAsRead(MarkAsReadPayload {
            room_id: room_id.clone(),
            message_ids: vec![delivered.id.clone()],
        }))
        .await;
    let doctor_receipt = doctor.recv().await;
    let patient_receipt = patient.recv().await;
    patient
        .send(&ClientEvent::GetMessageHistory(RoomPayload {
            room_id: room_id.clone(),
        }))
        .await;

    // then (期待する結果):
    for receipt in [doctor_receipt, patient_receipt] {
        let ServerEvent::MessagesRead(payload) = receipt else {
            panic!("expected messagesRead");
        };
        assert_eq!(payload.message_ids, vec![delivered.id.clone()]);
    }
    let ServerEvent::MessageHistory(history) = patient.recv().await else {
        panic!("expected messageHistory");
    };
    assert_eq!(history.messages.len(), 1);
    assert_eq!(history.messages[0].id, delivered.id);
    assert!(history.messages[0].is_read);
}

#[tokio::test]
async fn test_events_before_register_are_rejected() {
    // テスト項目: register 前のイベントには error が返される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut client = WsClient::connect(&server.ws_url()).await;

    // when (操作):
    client
        .send(&ClientEvent::StartConversation(StartConversationPayload {
            target_user_id: "patient456".to_string(),
        }))
        .await;

    // then (期待する結果):
    assert!(matches!(client.recv().await, ServerEvent::Error(_)));
}

#[tokio::test]
async fn test_invalid_requests_produce_error_events() {
    // テスト項目: 不正なリクエストは送信者にのみ error として返される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut doctor = register(&server, "doctor123", "doctor").await;
    let mut patient = register(&server, "patient456", "patient").await;
    let room_id = open_room(&mut doctor, &mut patient).await;

    // when (操作): 空白のみのメッセージ、不正な JSON、未知のルームの履歴
    doctor.send(&send_event(&room_id, "   ", "patient456", None)).await;
    let blank = doctor.recv().await;
    doctor.send_raw("not json").await;
    let malformed = doctor.recv().await;
    doctor
        .send(&ClientEvent::GetMessageHistory(RoomPayload {
            room_id: "no-such-room".to_string(),
        }))
        .await;
    let unknown = doctor.recv().await;

    // then (期待する結果):
    assert!(matches!(blank, ServerEvent::Error(_)));
    assert!(matches!(malformed, ServerEvent::Error(_)));
    assert!(matches!(unknown, ServerEvent::Error(_)));
    patient.expect_silence(200).await;
}

#[tokio::test]
async fn test_disconnect_notifies_counterpart() {
    // テスト項目: 切断すると相手に user-left が届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut doctor = register(&server, "doctor123", "doctor").await;
    let mut patient = register(&server, "patient456", "patient").await;
    let _room_id = open_room(&mut doctor, &mut patient).await;

    // when (操作):
    doctor.close().await;

    // then (期待する結果):
    assert_eq!(
        patient.recv().await,
        ServerEvent::UserLeft(NoticePayload {
            message: "doctor123 left the conversation".to_string()
        })
    );
}

#[tokio::test]
async fn test_reregistration_replaces_previous_connection() {
    // テスト項目: 同じユーザーが再登録すると新しい接続が有効になり、古い接続の切断は通知されない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut patient = register(&server, "patient456", "patient").await;
    let mut first = register(&server, "doctor123", "doctor").await;
    let room_id = open_room(&mut first, &mut patient).await;

    // when (操作): doctor が再接続する
    let mut second = register(&server, "doctor123", "doctor").await;
    let second_room = start(&mut second, "patient456").await;
    let _joined_again = patient.recv().await;
    patient
        .send(&send_event(&room_id, "Still there?", "doctor123", None))
        .await;

    // then (期待する結果):
    assert_eq!(room_id, second_room);
    let ServerEvent::NewMessage(message) = second.recv().await else {
        panic!("expected delivery on the new connection");
    };
    assert_eq!(message.content, "Still there?");
    let _echo = patient.recv().await;
    first.close().await;
    patient.expect_silence(200).await;
}
