// ============================================================================
// Message and conversation endpoint tests
// ============================================================================
//
// - POST /api/messages/                                  send + fan-out
// - GET  /api/messages/conversation/{id}                 full history
// - GET  /api/messages/conversation/{id}/before          cursor page
// - GET  /api/conversations/user/{id}                    user index
//
// ============================================================================


use messenger_types::api::{ConversationSnapshot, ErrorBody, MessageRecord, PartialFanoutBody};
use reqwest::StatusCode;
use serde_json::json;
use test_utils::spawn_app;
use uuid::Uuid;

async fn conversations_of(app: &test_utils::TestApp, user_id: Uuid) -> Vec<ConversationSnapshot> {
    let resp = app.get(&format!("/api/conversations/user/{}", user_id)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.unwrap()
}

async fn messages_of(app: &test_utils::TestApp, conversation_id: Uuid) -> Vec<MessageRecord> {
    let resp = app
        .get(&format!("/api/messages/conversation/{}", conversation_id))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.unwrap()
}

async fn messages_before(
    app: &test_utils::TestApp,
    conversation_id: Uuid,
    cursor: &str,
) -> reqwest::Response {
    app.client
        .get(format!(
            "{}/api/messages/conversation/{}/before",
            app.address, conversation_id
        ))
        .query(&[("timestamp", cursor)])
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;
    let resp = app.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_send_fans_out_to_every_participant() {
    let app = spawn_app().await;
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let m1 = app.send(c, a, "hello", Some(vec![a, b])).await;
    assert_eq!(m1.conversation_id, c);
    assert_eq!(m1.sender_id, a);
    assert_eq!(m1.message_text, "hello");

    let messages = messages_of(&app, c).await;
    assert_eq!(messages, vec![m1.clone()]);

    for user in [a, b] {
        let convs = conversations_of(&app, user).await;
        assert_eq!(convs.len(), 1);
        assert_eq!(convs[0].user_id, user);
        assert_eq!(convs[0].conversation_id, c);
        assert_eq!(convs[0].last_message_preview, "hello");
        assert_eq!(convs[0].last_activity, m1.message_timestamp);

        let mut participants = convs[0].participant_ids.clone();
        participants.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(participants, expected);
    }
}

#[tokio::test]
async fn test_send_without_roster_indexes_sender_only() {
    let app = spawn_app().await;
    let (sender, other, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    app.send(c, sender, "first", Some(vec![sender, other])).await;
    let m2 = app.send(c, sender, "second", None).await;

    let sender_convs = conversations_of(&app, sender).await;
    assert_eq!(sender_convs.len(), 2);
    assert_eq!(sender_convs[0].last_activity, m2.message_timestamp);
    assert_eq!(sender_convs[0].participant_ids, vec![sender]);

    // The earlier roster is not carried forward.
    let other_convs = conversations_of(&app, other).await;
    assert_eq!(other_convs.len(), 1);
    assert_eq!(other_convs[0].last_message_preview, "first");
}

#[tokio::test]
async fn test_empty_roster_means_sender() {
    let app = spawn_app().await;
    let (sender, c) = (Uuid::new_v4(), Uuid::new_v4());

    app.send(c, sender, "solo", Some(vec![])).await;

    let convs = conversations_of(&app, sender).await;
    assert_eq!(convs.len(), 1);
    assert_eq!(convs[0].participant_ids, vec![sender]);
}

#[tokio::test]
async fn test_preview_is_truncated_but_message_is_not() {
    let app = spawn_app().await;
    let (sender, c) = (Uuid::new_v4(), Uuid::new_v4());
    let text: String = "abcdefghij".repeat(15);

    let m = app.send(c, sender, &text, None).await;
    assert_eq!(m.message_text, text);

    let convs = conversations_of(&app, sender).await;
    assert_eq!(convs[0].last_message_preview, text[..100]);

    let messages = messages_of(&app, c).await;
    assert_eq!(messages[0].message_text, text);
}

#[tokio::test]
async fn test_history_is_newest_first_and_cursor_is_exclusive() {
    let app = spawn_app().await;
    let (sender, c) = (Uuid::new_v4(), Uuid::new_v4());

    let m1 = app.send(c, sender, "one", None).await;
    let m2 = app.send(c, sender, "two", None).await;

    let all = messages_of(&app, c).await;
    assert_eq!(all, vec![m2.clone(), m1.clone()]);

    let resp = messages_before(&app, c, &m2.message_timestamp.to_rfc3339()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let older: Vec<MessageRecord> = resp.json().await.unwrap();
    assert_eq!(older, vec![m1.clone()]);

    let resp = messages_before(&app, c, &m1.message_timestamp.to_rfc3339()).await;
    let none: Vec<MessageRecord> = resp.json().await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_before_is_subset_of_full_history() {
    let app = spawn_app().await;
    let (sender, c) = (Uuid::new_v4(), Uuid::new_v4());

    for i in 0..5 {
        app.send(c, sender, &format!("m{}", i), None).await;
    }

    let all = messages_of(&app, c).await;
    assert!(all.windows(2).all(|w| w[0].message_timestamp >= w[1].message_timestamp));

    let cursor = all[2].message_timestamp;
    let resp = messages_before(&app, c, &cursor.to_rfc3339()).await;
    let page: Vec<MessageRecord> = resp.json().await.unwrap();

    let expected: Vec<MessageRecord> = all
        .iter()
        .filter(|m| m.message_timestamp < cursor)
        .cloned()
        .collect();
    assert_eq!(page, expected);
    assert_eq!(page.len(), 2);
}

#[tokio::test]
async fn test_conversation_list_is_most_recent_first() {
    let app = spawn_app().await;
    let user = Uuid::new_v4();
    let (c1, c2, c3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    app.send(c1, user, "a", None).await;
    app.send(c2, user, "b", None).await;
    app.send(c1, user, "c", None).await;
    app.send(c3, user, "d", None).await;

    let convs = conversations_of(&app, user).await;
    let ids: Vec<Uuid> = convs.iter().map(|s| s.conversation_id).collect();
    assert_eq!(ids, vec![c3, c1, c2, c1]);
    assert!(convs.windows(2).all(|w| w[0].last_activity >= w[1].last_activity));
}

#[tokio::test]
async fn test_unknown_ids_return_empty_lists() {
    let app = spawn_app().await;
    assert!(conversations_of(&app, Uuid::new_v4()).await.is_empty());
    assert!(messages_of(&app, Uuid::new_v4()).await.is_empty());
}

#[tokio::test]
async fn test_malformed_identifiers_are_client_errors() {
    let app = spawn_app().await;

    let resp = app.get("/api/conversations/user/not-a-uuid").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = resp.json().await.unwrap();
    assert_eq!(body.code, "INVALID_INPUT");

    let resp = app.get("/api/messages/conversation/12345").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bad_cursor_is_rejected() {
    let app = spawn_app().await;
    let c = Uuid::new_v4();

    let resp = messages_before(&app, c, "last tuesday").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = resp.json().await.unwrap();
    assert_eq!(body.code, "INVALID_INPUT");

    let resp = app
        .get(&format!("/api/messages/conversation/{}/before", c))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_send_body_is_client_error() {
    let app = spawn_app().await;

    let resp = app
        .post_message(json!({
            "conversation_id": Uuid::new_v4(),
            "message_text": "missing sender",
        }))
        .await;
    assert!(resp.status().is_client_error());
    let body: ErrorBody = resp.json().await.unwrap();
    assert_eq!(body.code, "INVALID_INPUT");

    let resp = app
        .post_message(json!({
            "conversation_id": "nope",
            "sender_id": Uuid::new_v4(),
            "message_text": "bad id",
        }))
        .await;
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn test_partial_fanout_is_reported() {
    let app = spawn_app().await;
    let (sender, unlucky, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    app.state
        .db
        .with_conn_mut(|conn| {
            conn.execute_batch(&format!(
                "CREATE TRIGGER reject_user BEFORE INSERT ON user_conversations
                 WHEN NEW.user_id = '{}'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
                unlucky
            ))?;
            Ok(())
        })
        .unwrap();

    let resp = app
        .post_message(json!({
            "conversation_id": c,
            "sender_id": sender,
            "message_text": "hi",
            "participant_ids": [sender, unlucky],
        }))
        .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: PartialFanoutBody = resp.json().await.unwrap();
    assert_eq!(body.code, "PARTIAL_FANOUT");
    assert_eq!(body.failed_user_ids, vec![unlucky]);

    // Message and the successful index row remain.
    assert_eq!(messages_of(&app, c).await, vec![body.message]);
    assert_eq!(conversations_of(&app, sender).await.len(), 1);
    assert!(conversations_of(&app, unlucky).await.is_empty());
}

#[tokio::test]
async fn test_store_failure_is_server_error() {
    let app = spawn_app().await;
    app.state
        .db
        .with_conn_mut(|conn| {
            conn.execute_batch("DROP TABLE messages_by_conversation;")?;
            Ok(())
        })
        .unwrap();

    let resp = app.get(&format!("/api/messages/conversation/{}", Uuid::new_v4())).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = resp.json().await.unwrap();
    assert_eq!(body.code, "STORE_ERROR");
}
