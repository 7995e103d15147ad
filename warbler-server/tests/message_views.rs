mod common;

use axum::http::StatusCode;
use common::{body_text, location, TestApp};
use warbler_server::db::repositories::{FollowRepository, LikeRepository, MessageRepository};

#[tokio::test]
async fn test_add_message() {
    let app = TestApp::new();
    let user = app.create_user("testuser");
    let cookie = app.login_cookie(user.id);

    let response = app
        .post_form("/messages/new", &[("text", "Hello")], Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/users/{}", user.id));

    let messages = MessageRepository::new(app.state.db.pool.clone())
        .list_by_user(user.id, 10)
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "Hello");
}

#[tokio::test]
async fn test_add_message_validation() {
    let app = TestApp::new();
    let user = app.create_user("testuser");
    let cookie = app.login_cookie(user.id);
    let too_long = "x".repeat(141);

    let response = app
        .post_form("/messages/new", &[("text", too_long.as_str())], Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response)
        .await
        .contains("Field cannot be longer than 140 characters."));

    let count = MessageRepository::new(app.state.db.pool.clone())
        .count_by_user(user.id)
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_add_message_is_stored_trimmed() {
    let app = TestApp::new();
    let user = app.create_user("testuser");
    let cookie = app.login_cookie(user.id);
    let padded = format!("{}  ", "x".repeat(140));

    let response = app
        .post_form("/messages/new", &[("text", padded.as_str())], Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let messages = MessageRepository::new(app.state.db.pool.clone())
        .list_by_user(user.id, 10)
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "x".repeat(140));
}

#[tokio::test]
async fn test_non_numeric_message_ids_are_not_found() {
    let app = TestApp::new();
    let user = app.create_user("testuser");
    let cookie = app.login_cookie(user.id);

    let response = app.get("/messages/xyz", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("<h1>404</h1>"));

    let response = app
        .post_form("/messages/xyz/delete", &[], Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("<h1>404</h1>"));
}

#[tokio::test]
async fn test_show_message() {
    let app = TestApp::new();
    let user = app.create_user("testuser");
    let message = MessageRepository::new(app.state.db.pool.clone())
        .create(user.id, "a test message")
        .unwrap();

    let response = app.get(&format!("/messages/{}", message.id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("a test message"));
    assert!(html.contains("@testuser"));

    let response = app.get("/messages/999999", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_message() {
    let app = TestApp::new();
    let user = app.create_user("testuser");
    let messages = MessageRepository::new(app.state.db.pool.clone());
    let message = messages.create(user.id, "a test message").unwrap();
    let cookie = app.login_cookie(user.id);

    let response = app
        .post_form(&format!("/messages/{}/delete", message.id), &[], Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/users/{}", user.id));

    assert!(messages.get_by_id(message.id).unwrap().is_none());
}

#[tokio::test]
async fn test_only_author_can_delete_message() {
    let app = TestApp::new();
    let author = app.create_user("author");
    let other = app.create_user("other");
    let messages = MessageRepository::new(app.state.db.pool.clone());
    let message = messages.create(author.id, "mine").unwrap();

    let uri = format!("/messages/{}/delete", message.id);

    let response = app
        .post_form(&uri, &[], Some(&app.login_cookie(other.id)))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = app.post_form(&uri, &[], None).await;
    assert_eq!(location(&response), "/");

    assert!(messages.get_by_id(message.id).unwrap().is_some());

    let response = app
        .post_form("/messages/999999/delete", &[], Some(&app.login_cookie(author.id)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_home_timeline() {
    let app = TestApp::new();
    let reader = app.create_user("reader");
    let followed = app.create_user("followed");
    let stranger = app.create_user("stranger");

    let messages = MessageRepository::new(app.state.db.pool.clone());
    messages.create(reader.id, "from the reader").unwrap();
    messages.create(followed.id, "from someone followed").unwrap();
    messages.create(stranger.id, "from a stranger").unwrap();
    FollowRepository::new(app.state.db.pool.clone())
        .follow(reader.id, followed.id)
        .unwrap();

    let response = app.get("/", Some(&app.login_cookie(reader.id))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("from the reader"));
    assert!(html.contains("from someone followed"));
    assert!(!html.contains("from a stranger"));
}

#[tokio::test]
async fn test_likes_page_lists_liked_messages() {
    let app = TestApp::new();
    let author = app.create_user("author");
    let fan = app.create_user("fan");
    let message = MessageRepository::new(app.state.db.pool.clone())
        .create(author.id, "worth liking")
        .unwrap();
    LikeRepository::new(app.state.db.pool.clone())
        .toggle(fan.id, message.id)
        .unwrap();

    let response = app
        .get(&format!("/users/{}/likes", fan.id), Some(&app.login_cookie(fan.id)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("worth liking"));
}
