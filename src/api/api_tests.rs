#[cfg(test)]
mod router_tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use chrono::NaiveDate;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::api::{app_state::AppState, create_router};
    use crate::chatbot::{Chatbot, Corpus, FALLBACK_MESSAGE};
    use crate::clock::FixedClock;
    use crate::config::config::AppConfig;
    use crate::observability::AppMetrics;
    use crate::sms::{DisabledSms, MessageStatus, MockSmsSender, SentMessage, SmsSender};
    use crate::storage::Repositories;

    struct TestApp {
        router: Router,
        repositories: Repositories,
    }

    fn accepting_sms() -> MockSmsSender {
        let mut sms = MockSmsSender::new();
        sms.expect_send().returning(|to, _| {
            Ok(SentMessage {
                sid: format!("SM{}", to.trim_start_matches('+')),
                status: Some("queued".into()),
            })
        });
        sms.expect_status().returning(|sid| {
            Ok(MessageStatus {
                sid: sid.to_string(),
                status: "delivered".into(),
                price: None,
                date_sent: None,
            })
        });
        sms
    }

    fn test_app(sms: Arc<dyn SmsSender>) -> TestApp {
        let config = AppConfig::development();
        let corpus = Corpus::from_json(include_str!("../../data/corpus.json")).unwrap();
        let chatbot = Chatbot::from_corpus(corpus, config.chatbot.similarity_threshold);
        let repositories = Repositories::in_memory();
        let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 10, 19).unwrap());

        let state = AppState::new(
            &config,
            &repositories,
            Arc::new(chatbot),
            sms,
            Arc::new(AppMetrics::default()),
            Arc::new(clock),
        );
        TestApp {
            router: create_router(state),
            repositories,
        }
    }

    impl TestApp {
        async fn call(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let body = match body {
                Some(json) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(json.to_string())
                }
                None => Body::empty(),
            };

            let response = self
                .router
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
        }

        /// Register a user and return (token, user id).
        async fn register(&self, username: &str, phone: Option<&str>) -> (String, String) {
            let (status, body) = self
                .call(
                    "POST",
                    "/api/v1/auth/register",
                    None,
                    Some(json!({
                        "first_name": "Awa",
                        "last_name": "Traoré",
                        "username": username,
                        "country": "Burkina Faso",
                        "phone_number": phone,
                        "password": "secret123",
                        "confirm_password": "secret123",
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            (
                body["token"].as_str().unwrap().to_string(),
                body["user"]["id"].as_str().unwrap().to_string(),
            )
        }

        /// Grant admin and log in again so the token carries the role.
        async fn promote(&self, username: &str, user_id: &str) -> String {
            let mut user = self
                .repositories
                .users
                .get_by_id(user_id)
                .await
                .unwrap()
                .unwrap();
            user.is_admin = true;
            self.repositories.users.update(user_id, &user).await.unwrap();

            let (status, body) = self
                .call(
                    "POST",
                    "/api/v1/auth/login",
                    None,
                    Some(json!({"username": username, "password": "secret123"})),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            body["token"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn test_register_login_me_logout() {
        let app = test_app(Arc::new(DisabledSms));
        let (token, user_id) = app.register("awa", Some("+22670123456")).await;

        let (status, me) = app.call("GET", "/api/v1/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], user_id.as_str());
        assert_eq!(me["phone_verified"], false);
        assert!(me.get("password_hash").is_none());

        let (status, _) = app.call("POST", "/api/v1/auth/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.call("GET", "/api/v1/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_and_login_errors() {
        let app = test_app(Arc::new(DisabledSms));
        app.register("awa", None).await;

        let (status, body) = app
            .call(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "first_name": "A", "last_name": "B", "username": "awa",
                    "country": "BF", "password": "x", "confirm_password": "x",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, _) = app
            .call(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "first_name": "A", "last_name": "B", "username": "other",
                    "country": "BF", "password": "x", "confirm_password": "y",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .call(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"username": "awa", "password": "wrong"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["message"].as_str().unwrap().contains("incorrect"));
    }

    #[tokio::test]
    async fn test_protected_routes_need_token() {
        let app = test_app(Arc::new(DisabledSms));
        for (method, uri) in [
            ("POST", "/api/v1/chat"),
            ("GET", "/api/v1/chat/history"),
            ("GET", "/api/v1/history"),
            ("GET", "/api/v1/reminders"),
            ("GET", "/api/v1/notifications"),
        ] {
            let (status, _) = app.call(method, uri, None, Some(json!({}))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_chat_due_date_conversation() {
        let app = test_app(Arc::new(DisabledSms));
        let (token, _) = app.register("awa", None).await;

        let (status, reply) = app
            .call(
                "POST",
                "/api/v1/chat",
                Some(&token),
                Some(json!({"message": "Calculer ma date d'accouchement"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["intent"], "Savoir_approximation_grossesse");

        let (_, reply) = app
            .call(
                "POST",
                "/api/v1/chat",
                Some(&token),
                Some(json!({"message": "01/01/2025"})),
            )
            .await;
        let text = reply["response"].as_str().unwrap();
        assert!(text.contains("27 March 2024"));
        assert!(text.contains("29 semaines"));

        let (_, reply) = app
            .call("POST", "/api/v1/chat", Some(&token), Some(json!({"message": "zzz"})))
            .await;
        assert_eq!(reply["response"], FALLBACK_MESSAGE);

        let (status, history) = app
            .call("GET", "/api/v1/chat/history", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let history = history.as_array().unwrap();
        assert_eq!(history.len(), 6);
        assert_eq!(history[0]["is_from_user"], true);
        assert_eq!(history[0]["content"], "Calculer ma date d'accouchement");
        assert_eq!(history[1]["is_from_user"], false);
        assert_eq!(history[0]["timestamp"], "2024-10-19 00:00:00");
    }

    #[tokio::test]
    async fn test_chat_rejects_missing_or_blank_message() {
        let app = test_app(Arc::new(DisabledSms));
        let (token, _) = app.register("awa", None).await;

        let (status, body) = app.call("POST", "/api/v1/chat", Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("Message non fourni"));

        let (status, _) = app
            .call("POST", "/api/v1/chat", Some(&token), Some(json!({"message": "   "})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_history_record_and_page() {
        let app = test_app(Arc::new(DisabledSms));
        let (token, _) = app.register("awa", None).await;

        for i in 0..3 {
            let (status, body) = app
                .call(
                    "POST",
                    "/api/v1/history",
                    Some(&token),
                    Some(json!({
                        "user_message": format!("question {i}"),
                        "bot_reply": "réponse",
                        "detected_intent": "salutation",
                        "confidence": 0.9,
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["success"], true);
        }

        let (status, page) = app
            .call("GET", "/api/v1/history?page=1&per_page=2", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 3);
        assert_eq!(page["pages"], 2);
        assert_eq!(page["page"], 1);
        assert_eq!(page["data"].as_array().unwrap().len(), 2);

        let (status, _) = app
            .call("GET", "/api/v1/history?page=0", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, page) = app
            .call(
                "GET",
                "/api/v1/history?page=18446744073709551615&per_page=2",
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(page["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_otp_errors() {
        let app = test_app(Arc::new(DisabledSms));

        let (status, _) = app
            .call("POST", "/api/v1/otp/send", None, Some(json!({"phone_number": "+22670123456"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .call(
                "POST",
                "/api/v1/otp/send",
                None,
                Some(json!({"phone_number": "70123456", "user_id": "u1"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .call(
                "POST",
                "/api/v1/otp/send",
                None,
                Some(json!({"phone_number": "+22670123456", "user_id": "u1"})),
            )
            .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "SMS_UNAVAILABLE");

        let (status, body) = app
            .call("POST", "/api/v1/otp/verify", None, Some(json!({"user_id": "u1", "code": "123456"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        assert_eq!(body["message"], "Code OTP invalide");

        for _ in 1..AppConfig::development().otp.max_attempts {
            app.call("POST", "/api/v1/otp/verify", None, Some(json!({"user_id": "u1", "code": "123456"})))
                .await;
        }
        let (status, body) = app
            .call("POST", "/api/v1/otp/verify", None, Some(json!({"user_id": "u1", "code": "123456"})))
            .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["code"], "RATE_LIMITED");
    }

    #[tokio::test]
    async fn test_reminder_create_list_send() {
        let app = test_app(Arc::new(accepting_sms()));
        let (token, _) = app.register("awa", Some("+22670123456")).await;

        let (status, created) = app
            .call(
                "POST",
                "/api/v1/reminders",
                Some(&token),
                Some(json!({"title": "Visite prénatale", "remind_at": "2024-11-02T09:00:00"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["reminder_id"].as_str().unwrap().to_string();

        let (status, _) = app
            .call(
                "POST",
                "/api/v1/reminders",
                Some(&token),
                Some(json!({"title": "Vaccin", "remind_at": "demain"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, listed) = app.call("GET", "/api/v1/reminders", Some(&token), None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["status"], "pending");

        let (status, sent) = app
            .call("POST", &format!("/api/v1/reminders/{id}/send"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sent["sid"], "SM22670123456");

        let (_, listed) = app.call("GET", "/api/v1/reminders", Some(&token), None).await;
        assert_eq!(listed[0]["status"], "sent");

        let (other, _) = app.register("fati", None).await;
        let (status, _) = app
            .call("POST", &format!("/api/v1/reminders/{id}/send"), Some(&other), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_notifications_permissions() {
        let app = test_app(Arc::new(accepting_sms()));
        let (alice, alice_id) = app.register("alice", Some("+22670000001")).await;
        let (bob, bob_id) = app.register("bob", Some("+22670000002")).await;

        let (status, _) = app
            .call(
                "POST",
                "/api/v1/notifications/send",
                Some(&alice),
                Some(json!({"title": "t", "content": "c", "user_id": bob_id})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .call(
                "POST",
                "/api/v1/notifications/broadcast",
                Some(&alice),
                Some(json!({"user_ids": [bob_id], "title": "t", "content": "c"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let admin = app.promote("alice", &alice_id).await;
        let (status, summary) = app
            .call(
                "POST",
                "/api/v1/notifications/broadcast",
                Some(&admin),
                Some(json!({"user_ids": [bob_id, "ghost"], "title": "Campagne", "content": "Vaccination"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["message"], "1 envoyées, 1 échouées");
        assert_eq!(summary["success"], false);

        let (_, listed) = app.call("GET", "/api/v1/notifications", Some(&bob), None).await;
        let notification_id = listed[0]["id"].as_str().unwrap().to_string();

        let (status, _) = app
            .call("PUT", &format!("/api/v1/notifications/{notification_id}/read"), Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .call("PUT", &format!("/api/v1/notifications/{notification_id}/read"), Some(&bob), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .call("GET", "/api/v1/sms/SM22670000002/status", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "delivered");

        let (status, _) = app
            .call("GET", "/api/v1/sms/SM22670000002/status", Some(&bob), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_sms_test_route() {
        let app = test_app(Arc::new(accepting_sms()));
        let (token, _) = app.register("awa", Some("+22670123456")).await;

        let (status, body) = app.call("POST", "/api/v1/sms/test", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (_, listed) = app.call("GET", "/api/v1/notifications", Some(&token), None).await;
        assert_eq!(listed[0]["title"], "Test SMS");
    }
}
