//! 批次调度与回滚测试

mod common;

use common::{build_courier, configured, fast_options, stub_email, stub_sms};
use courier::MessageQueue;
use courier_errors::AppError;
use courier_ports::{Message, MessageStatus, MessageStore, MessageType};

#[tokio::test]
async fn test_empty_queue_is_a_successful_no_op() {
    let t = configured();

    t.courier.dispatch_queue().await.unwrap();

    assert_eq!(t.store.next_messages_calls(), 1);
    assert!(t.store.inner.messages().await.is_empty());
    assert!(t.sms.sent().is_empty());
    assert!(t.email.sent().is_empty());
}

#[tokio::test]
async fn test_missing_smtp_host_fails_without_touching_store() {
    let t = build_courier("", "https://sms.example.com/send", fast_options());
    t.courier.queue_sms(&stub_sms("+12065550101", "hi")).await.unwrap();

    let err = t.courier.dispatch_queue().await.unwrap_err();

    assert!(matches!(err, AppError::ConfigurationMissing(_)));
    assert_eq!(t.store.next_messages_calls(), 0);
    assert_eq!(t.store.statuses(), vec![MessageStatus::Queued]);
}

#[tokio::test]
async fn test_missing_sms_host_fails_without_touching_store() {
    let t = build_courier("smtp.example.com", "", fast_options());

    let err = t.courier.dispatch_queue().await.unwrap_err();

    assert!(matches!(err, AppError::ConfigurationMissing(_)));
    assert_eq!(t.store.next_messages_calls(), 0);
}

#[tokio::test]
async fn test_batch_is_delivered_in_order() {
    let t = configured();
    for i in 0..3 {
        t.courier
            .queue_sms(&stub_sms(&format!("+1206555010{i}"), &format!("message {i}")))
            .await
            .unwrap();
    }

    t.courier.dispatch_queue().await.unwrap();

    let bodies: Vec<_> = t.sms.sent().into_iter().map(|s| s.body).collect();
    assert_eq!(bodies, vec!["message 0", "message 1", "message 2"]);
    assert_eq!(t.store.statuses(), vec![MessageStatus::Sent; 3]);
    assert!(t.sms.sent().iter().all(|s| s.from == "+15550000000"));
}

#[tokio::test]
async fn test_failure_rolls_back_from_failing_message() {
    let t = configured();
    for i in 0..5 {
        t.courier
            .queue_sms(&stub_sms(&format!("+1206555010{i}"), &format!("message {i}")))
            .await
            .unwrap();
    }
    t.sms.fail_for("+12065550102");

    let err = t.courier.dispatch_queue().await.unwrap_err();

    assert!(matches!(err, AppError::TransportFailure(_)));
    assert_eq!(
        t.store.statuses(),
        vec![
            MessageStatus::Sent,
            MessageStatus::Sent,
            MessageStatus::Queued,
            MessageStatus::Queued,
            MessageStatus::Queued,
        ]
    );
    assert_eq!(t.sms.sent().len(), 2);

    // 退回的消息可以被再次领取，并保持原有顺序
    t.sms.recover();
    t.courier.dispatch_queue().await.unwrap();
    assert_eq!(t.store.statuses(), vec![MessageStatus::Sent; 5]);
    let bodies: Vec<_> = t.sms.sent().into_iter().map(|s| s.body).collect();
    assert_eq!(
        bodies,
        vec!["message 0", "message 1", "message 2", "message 3", "message 4"]
    );
}

#[tokio::test]
async fn test_failed_sent_write_requeues_delivered_message() {
    let t = configured();
    let first = t.courier.queue_sms(&stub_sms("+12065550100", "a")).await.unwrap();
    let second = t.courier.queue_sms(&stub_sms("+12065550101", "b")).await.unwrap();
    t.store.fail_sent_write_for(second);

    let err = t.courier.dispatch_queue().await.unwrap_err();

    assert!(matches!(err, AppError::Store(_)));
    // 第二条已经送达，但状态写入失败，会在重试时再次发送
    assert_eq!(t.sms.sent().len(), 2);
    assert_eq!(t.store.status_of(&first), Some(MessageStatus::Sent));
    assert_eq!(t.store.status_of(&second), Some(MessageStatus::Queued));
}

#[tokio::test]
async fn test_failed_requeue_is_not_escalated() {
    let t = configured();
    t.courier.queue_sms(&stub_sms("+12065550100", "a")).await.unwrap();
    let stuck = t.courier.queue_sms(&stub_sms("+12065550101", "b")).await.unwrap();
    t.sms.fail_for("+12065550100");
    t.store.fail_requeue_write_for(stuck);

    let err = t.courier.dispatch_queue().await.unwrap_err();

    // 返回的是原始投递错误，而不是回滚写入的错误
    assert!(matches!(err, AppError::TransportFailure(_)));
    assert_eq!(t.store.statuses(), vec![MessageStatus::Queued; 2]);
}

#[tokio::test]
async fn test_email_dispatch_includes_html_alternative() {
    let t = configured();
    t.courier
        .queue_email(&stub_email("user@example.com", "Welcome", "Hello"))
        .await
        .unwrap();

    t.courier.dispatch_queue().await.unwrap();

    let sent = t.email.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "user@example.com");
    assert_eq!(sent[0].subject, "Welcome");
    assert_eq!(sent[0].text_body, "Hello");
    assert_eq!(sent[0].html_body.as_deref(), Some("<p>Hello</p>"));
    assert_eq!(sent[0].from_name.as_deref(), Some("Courier"));
    assert_eq!(sent[0].headers.get("X-Courier").map(String::as_str), Some("test"));
}

#[tokio::test]
async fn test_email_with_broken_payload_falls_back_to_plaintext() {
    let t = configured();
    let message = Message::new(
        MessageType::Email,
        "user@example.com",
        "Subject",
        "Plain body",
        "stub",
        b"not json".to_vec(),
    );
    t.store.add_message(&message).await.unwrap();

    t.courier.dispatch_queue().await.unwrap();

    let sent = t.email.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text_body, "Plain body");
    assert!(sent[0].html_body.is_none());
}

#[tokio::test]
async fn test_sms_with_broken_payload_is_a_dispatch_failure() {
    let t = configured();
    let message = Message::new(
        MessageType::Phone,
        "+12065550101",
        "",
        "Plain body",
        "sms_code",
        b"not json".to_vec(),
    );
    t.store.add_message(&message).await.unwrap();

    let err = t.courier.dispatch_queue().await.unwrap_err();

    assert!(matches!(err, AppError::Serialization(_)));
    assert!(t.sms.sent().is_empty());
    assert_eq!(t.store.statuses(), vec![MessageStatus::Queued]);
}

#[tokio::test]
async fn test_sms_with_unknown_template_type_fails() {
    let t = configured();
    let message = Message::new(
        MessageType::Phone,
        "+12065550101",
        "",
        "body",
        "password_reset",
        b"{}".to_vec(),
    );
    t.store.add_message(&message).await.unwrap();

    let err = t.courier.dispatch_queue().await.unwrap_err();
    assert!(matches!(err, AppError::TemplateResolution(_)));
}

#[tokio::test]
async fn test_batch_size_bounds_each_dispatch() {
    let mut options = fast_options();
    options.batch_size = 2;
    let t = build_courier("smtp.example.com", "https://sms.example.com/send", options);
    for i in 0..3 {
        t.courier
            .queue_sms(&stub_sms("+12065550101", &format!("message {i}")))
            .await
            .unwrap();
    }

    t.courier.dispatch_queue().await.unwrap();

    assert_eq!(t.sms.sent().len(), 2);
    assert_eq!(
        t.store.statuses(),
        vec![MessageStatus::Sent, MessageStatus::Sent, MessageStatus::Queued]
    );
}
