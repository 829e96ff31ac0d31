//! tests/dispatch_tests.rs
//! Pruebas del envío masivo contra un transporte falso.

#[cfg(test)]
mod tests {
    use actix_rt::test;
    use serde_json::json;
    use std::{sync::Arc, time::Duration};

    use crate::config::recipients::RecipientList;
    use crate::errors::DispatchError;
    use crate::models::notification_model::SuccessPolicy;
    use crate::services::dispatch_service::{acknowledged_message_id, DispatchService};
    use crate::services::message_formatter::format_attendance_message;
    use crate::tests::{sample_record, FakeReply, FakeTransport};

    fn service(transport: Arc<FakeTransport>, recipients: &[&str]) -> DispatchService {
        DispatchService::new(transport, RecipientList::new(recipients.iter().copied()))
    }

    #[test]
    async fn half_success_is_overall_success() {
        let transport = Arc::new(
            FakeTransport::acking()
                .reply("+510000000A", FakeReply::Ack("wamid.A"))
                .reply("+510000000B", FakeReply::Rejected("recipient not on allow list")),
        );
        let dispatcher = service(transport.clone(), &["+510000000A", "+510000000B"]);

        let batch = dispatcher.dispatch(&sample_record(), None).await.unwrap();

        assert_eq!(batch.total_recipients, 2);
        assert_eq!(batch.success_count, 1);
        assert_eq!(batch.failure_count, 1);
        assert_eq!(batch.success_rate_percent, 50.0);
        assert!(batch.overall_success);
        assert_eq!(batch.successes[0].recipient, "+510000000A");
        assert_eq!(batch.successes[0].message_id.as_deref(), Some("wamid.A"));
        assert_eq!(batch.failures[0].recipient, "+510000000B");
        assert!(batch.failures[0]
            .error
            .as_deref()
            .unwrap()
            .contains("recipient not on allow list"));
        assert_eq!(transport.calls().len(), 2);
    }

    #[test]
    async fn every_recipient_gets_exactly_one_attempt() {
        let recipients = ["+1001", "+1002", "+1003", "+1004", "+1005", "+1006", "+1007"];
        let transport = Arc::new(
            FakeTransport::acking()
                .reply("+1002", FakeReply::Rejected("boom"))
                .reply("+1004", FakeReply::Panic)
                .reply("+1005", FakeReply::Raw(json!({ "error": "weird" })))
                .reply("+1006", FakeReply::Raw(json!(null))),
        );
        let dispatcher = service(transport.clone(), &recipients).with_max_concurrency(3);

        let batch = dispatcher.dispatch(&sample_record(), None).await.unwrap();

        assert_eq!(batch.successes.len() + batch.failures.len(), batch.total_recipients);
        assert_eq!(batch.total_recipients, recipients.len());
        assert_eq!(batch.success_count, 3);
        assert_eq!(batch.failure_count, 4);
        assert!(!batch.overall_success);

        let mut called: Vec<String> = transport.calls().into_iter().map(|c| c.recipient).collect();
        called.sort();
        assert_eq!(called, recipients.to_vec());

        // el orden de la lista se conserva dentro de cada grupo
        let failed: Vec<&str> = batch.failures.iter().map(|o| o.recipient.as_str()).collect();
        assert_eq!(failed, vec!["+1002", "+1004", "+1005", "+1006"]);
        assert_eq!(batch.failures[1].error.as_deref(), Some("transport call panicked"));
        assert!(batch.failures[2]
            .error
            .as_deref()
            .unwrap()
            .starts_with("unexpected provider response"));
    }

    #[test]
    async fn timed_out_send_is_a_recipient_failure() {
        let transport = Arc::new(
            FakeTransport::acking()
                .with_timeout(Duration::from_millis(50))
                .reply("+2002", FakeReply::Hang),
        );
        let dispatcher = service(transport, &["+2001", "+2002"]);

        let batch = dispatcher.dispatch(&sample_record(), None).await.unwrap();

        assert_eq!(batch.success_count, 1);
        assert_eq!(batch.failures[0].recipient, "+2002");
        assert!(batch.failures[0].error.as_deref().unwrap().contains("timed out"));
        assert!(batch.overall_success);
    }

    #[test]
    async fn all_failures_means_zero_rate() {
        let transport = Arc::new(
            FakeTransport::acking()
                .reply("+3001", FakeReply::Rejected("nope"))
                .reply("+3002", FakeReply::Rejected("nope")),
        );
        let dispatcher = service(transport, &["+3001", "+3002"]);

        let batch = dispatcher.dispatch(&sample_record(), None).await.unwrap();

        assert_eq!(batch.success_count, 0);
        assert_eq!(batch.success_rate_percent, 0.0);
        assert!(!batch.overall_success);
    }

    #[test]
    async fn zero_threshold_still_needs_one_success() {
        let transport = Arc::new(FakeTransport::acking().reply("+4001", FakeReply::Rejected("x")));
        let dispatcher = service(transport, &["+4001"]).with_policy(SuccessPolicy {
            min_success_rate_percent: 0.0,
        });

        let batch = dispatcher.dispatch(&sample_record(), None).await.unwrap();
        assert!(!batch.overall_success);
    }

    #[test]
    async fn stricter_threshold_is_honoured() {
        let transport = Arc::new(FakeTransport::acking().reply("+5002", FakeReply::Rejected("x")));
        let dispatcher = service(transport, &["+5001", "+5002", "+5003"]).with_policy(
            SuccessPolicy {
                min_success_rate_percent: 75.0,
            },
        );

        let batch = dispatcher.dispatch(&sample_record(), None).await.unwrap();
        assert_eq!(batch.success_count, 2);
        assert!(!batch.overall_success);
    }

    #[test]
    async fn empty_recipient_list_fails_fast() {
        let transport = Arc::new(FakeTransport::acking());
        let dispatcher = service(transport.clone(), &[]);

        let err = dispatcher
            .dispatch(&sample_record(), Some(&[]))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::NoRecipients));
        assert!(err.to_string().contains("empty"));
        assert!(transport.calls().is_empty());
    }

    #[test]
    async fn explicit_recipients_override_defaults() {
        let transport = Arc::new(FakeTransport::acking());
        let dispatcher = service(transport.clone(), &["+6001"]);
        let explicit = vec!["+7001".to_string(), "+7002".to_string()];

        let batch = dispatcher
            .dispatch(&sample_record(), Some(&explicit))
            .await
            .unwrap();

        assert_eq!(batch.total_recipients, 2);
        let called: Vec<String> = transport.calls().into_iter().map(|c| c.recipient).collect();
        assert!(!called.contains(&"+6001".to_string()));
    }

    #[test]
    async fn unavailable_transport_is_a_setup_error() {
        let transport = Arc::new(FakeTransport::acking().unavailable());
        let dispatcher = service(transport.clone(), &["+8001", "+8002"]);

        let err = dispatcher.dispatch(&sample_record(), None).await.unwrap_err();

        assert!(matches!(err, DispatchError::TransportUnavailable(_)));
        assert!(transport.calls().is_empty());
    }

    #[test]
    async fn unformattable_record_is_a_setup_error() {
        let transport = Arc::new(FakeTransport::acking());
        let dispatcher = service(transport.clone(), &["+9001"]);
        let mut record = sample_record();
        record.role = String::new();

        let err = dispatcher.dispatch(&record, None).await.unwrap_err();

        assert!(matches!(err, DispatchError::Format(_)));
        assert!(err.to_string().contains("role"));
        assert!(transport.calls().is_empty());
    }

    #[test]
    async fn text_send_reuses_one_formatted_body() {
        let transport = Arc::new(FakeTransport::acking());
        let dispatcher = service(transport.clone(), &["+1111", "+2222"]);
        let record = sample_record();

        let batch = dispatcher.dispatch(&record, None).await.unwrap();

        assert!(!batch.has_photo);
        let expected = format_attendance_message(&record).unwrap();
        for call in transport.calls() {
            assert_eq!(call.kind, "text");
            assert_eq!(call.body, expected);
            assert!(call.recipient.starts_with('+'));
        }
    }

    #[test]
    async fn photo_is_sent_as_image_with_caption() {
        let transport = Arc::new(FakeTransport::acking());
        let dispatcher = service(transport.clone(), &["+51999888777"]);
        let mut record = sample_record();
        record.photo = Some("https://cdn.example.com/a.jpg".to_string());

        let batch = dispatcher.dispatch(&record, None).await.unwrap();

        assert!(batch.has_photo);
        assert_eq!(batch.photo_url.as_deref(), Some("https://cdn.example.com/a.jpg"));
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, "image");
        assert_eq!(calls[0].recipient, "51999888777");
        assert_eq!(calls[0].image_url.as_deref(), Some("https://cdn.example.com/a.jpg"));
        assert_eq!(calls[0].body, format_attendance_message(&record).unwrap());
        // el resultado guarda la dirección original
        assert_eq!(batch.successes[0].recipient, "+51999888777");
    }

    #[test]
    async fn status_masks_recipients() {
        let transport = Arc::new(FakeTransport::acking());
        let dispatcher = service(transport, &["+51987654321", "+14155550123"]).with_debug_mode(true);

        let status = dispatcher.status();

        assert_eq!(status.recipient_count, 2);
        assert_eq!(status.masked_recipients, vec!["********4321", "********0123"]);
        assert!(status.debug_mode);
        assert_eq!(status.transport, "fake");
    }

    #[test]
    async fn acknowledgement_requires_message_id() {
        assert_eq!(
            acknowledged_message_id(&json!({ "messages": [{ "id": "wamid.X" }] })).as_deref(),
            Some("wamid.X")
        );
        assert_eq!(acknowledged_message_id(&json!({ "messages": [] })), None);
        assert_eq!(acknowledged_message_id(&json!({ "messages": [{}] })), None);
        assert_eq!(acknowledged_message_id(&json!({ "error": {} })), None);
        assert_eq!(acknowledged_message_id(&json!(null)), None);
    }
}
