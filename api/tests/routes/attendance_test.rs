#[cfg(test)]
mod tests {
    use crate::helpers::{TestApp, bearer, json_request, make_app};
    use api::auth::Role;
    use axum::{body::Body, http::{Request, StatusCode}};
    use db::models::{attendance_record, teacher};
    use sea_orm::{EntityTrait, PaginatorTrait};
    use serde_json::{Value, json};
    use serial_test::serial;
    use std::time::Duration;

    const FP: &str = "fp-device-alpha-0001";
    const OTHER_FP: &str = "fp-device-bravo-0002";

    struct Classroom {
        teacher_token: String,
        session_id: i64,
        code: String,
    }

    async fn open_session(app: &TestApp, teacher_token: &str) -> (i64, String) {
        let (status, _, json) = app
            .send(json_request(
                "POST",
                "/api/teacher/sessions",
                Some(teacher_token),
                Some(json!({"subject": "Networks", "expiry_minutes": 5})),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let session = &json["data"]["session"];
        (
            session["id"].as_i64().unwrap(),
            session["code"].as_str().unwrap().to_owned(),
        )
    }

    async fn classroom(app: &TestApp) -> Classroom {
        let teacher = teacher::Model::create(&app.db, "Ada", "ada@college.edu", "secret123", "CSE")
            .await
            .unwrap();
        let teacher_token = bearer(teacher.id, Role::Teacher);
        let (session_id, code) = open_session(app, &teacher_token).await;
        Classroom {
            teacher_token,
            session_id,
            code,
        }
    }

    async fn register_student(app: &TestApp, roll: &str) -> (i64, String) {
        let (status, _, json) = app
            .send(json_request(
                "POST",
                "/api/auth/student/register",
                None,
                Some(json!({
                    "name": "Student",
                    "roll_number": roll,
                    "email": format!("{roll}@college.edu"),
                    "department": "CSE",
                    "year": 2
                })),
            ))
            .await;
        assert!(status.is_success());
        (
            json["data"]["account"]["id"].as_i64().unwrap(),
            json["data"]["token"].as_str().unwrap().to_owned(),
        )
    }

    fn mark_request(token: &str, code: &str, fingerprint: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/attendance/mark")
            .header("x-forwarded-for", "198.51.100.20")
            .header("Authorization", format!("Bearer {token}"))
            .header("content-type", "application/json")
            .header("user-agent", "Mozilla/5.0 (Linux; Android 14) Chrome/126.0");
        if let Some(fp) = fingerprint {
            builder = builder.header("x-device-fingerprint", fp);
        }
        builder
            .body(Body::from(json!({ "session_code": code }).to_string()))
            .unwrap()
    }

    async fn mark(app: &TestApp, token: &str, code: &str, fingerprint: Option<&str>) -> (StatusCode, Value) {
        let (status, _, json) = app.send(mark_request(token, code, fingerprint)).await;
        (status, json)
    }

    #[tokio::test]
    #[serial]
    async fn student_marks_once_then_hits_cooldown() {
        let app = make_app().await;
        let room = classroom(&app).await;
        let (_, token) = register_student(&app, "21CS001").await;

        let (status, json) = mark(&app, &token, &room.code, Some(FP)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["message"], "Attendance marked successfully!");
        assert_eq!(json["data"]["subject"], "Networks");
        assert_eq!(json["data"]["status"], "present");
        assert_eq!(json["data"]["total_attendance_in_session"], 1);

        tokio::time::sleep(Duration::from_millis(60)).await;

        let (status, json) = mark(&app, &token, &room.code, Some(FP)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["data"]["reason"], "cooldown_active");
        let remaining = json["data"]["cooldown_remaining"].as_u64().unwrap();
        assert!(remaining > 3500 && remaining <= 3600);
        assert_eq!(json["data"]["cooldown_remaining_minutes"], 60);

        let (status, _, json) = app
            .send(json_request("GET", "/api/attendance/token-status", Some(&token), None))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["has_token"], false);
        assert!(json["data"]["cooldown_remaining"].as_u64().unwrap() > 0);

        let count = attendance_record::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    #[serial]
    async fn rapid_double_submit_is_deduplicated() {
        let app = make_app().await;
        let room = classroom(&app).await;
        let (_, token) = register_student(&app, "21CS002").await;

        let (first, _) = mark(&app, &token, &room.code, Some(FP)).await;
        let (second, json) = mark(&app, &token, &room.code, Some(FP)).await;

        assert_eq!(first, StatusCode::CREATED);
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["data"]["reason"], "duplicate_request");
    }

    #[tokio::test]
    #[serial]
    async fn second_device_is_rejected_after_cooldown_reset() {
        let app = make_app().await;
        let room = classroom(&app).await;
        let (student_id, token) = register_student(&app, "21CS003").await;

        let (status, _) = mark(&app, &token, &room.code, Some(FP)).await;
        assert_eq!(status, StatusCode::CREATED);

        app.tokens.reset_cooldown(student_id).await.unwrap();
        let (_, code) = open_session(&app, &room.teacher_token).await;

        let (status, json) = mark(&app, &token, &code, Some(OTHER_FP)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["data"]["reason"], "device_mismatch");

        tokio::time::sleep(Duration::from_millis(60)).await;
        let (status, _) = mark(&app, &token, &code, Some(FP)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    #[serial]
    async fn ended_session_cannot_be_scanned() {
        let app = make_app().await;
        let room = classroom(&app).await;
        let (_, token) = register_student(&app, "21CS004").await;

        let (status, _, _) = app
            .send(json_request(
                "PUT",
                &format!("/api/teacher/sessions/{}/end", room.session_id),
                Some(&room.teacher_token),
                None,
            ))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = mark(&app, &token, &room.code, Some(FP)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["data"]["reason"], "session_not_found");

        // a rejected scan leaves the student's token intact
        let (_, _, json) = app
            .send(json_request("GET", "/api/attendance/token-status", Some(&token), None))
            .await;
        assert_eq!(json["data"]["has_token"], true);
    }

    #[tokio::test]
    #[serial]
    async fn unknown_code_is_not_found() {
        let app = make_app().await;
        let (_, token) = register_student(&app, "21CS005").await;

        let (status, json) = mark(&app, &token, "no-such-session", Some(FP)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["data"]["reason"], "session_not_found");
    }

    #[tokio::test]
    #[serial]
    async fn missing_fingerprint_or_code_is_a_validation_error() {
        let app = make_app().await;
        let room = classroom(&app).await;
        let (_, token) = register_student(&app, "21CS006").await;

        let (status, json) = mark(&app, &token, &room.code, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Device fingerprint is required");

        let (status, json) = mark(&app, &token, "   ", Some(FP)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Session code is required");
    }

    #[tokio::test]
    #[serial]
    async fn malformed_body_is_rejected_in_envelope() {
        let app = make_app().await;
        let (_, token) = register_student(&app, "21CS010").await;

        let broken = Request::builder()
            .method("POST")
            .uri("/api/attendance/mark")
            .header("x-forwarded-for", "198.51.100.21")
            .header("Authorization", format!("Bearer {token}"))
            .header("content-type", "application/json")
            .header("x-device-fingerprint", FP)
            .body(Body::from("{\"session_code\": "))
            .unwrap();
        let (status, _, json) = app.send(broken).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["data"]["reason"], "validation_error");

        let plain = Request::builder()
            .method("POST")
            .uri("/api/attendance/mark")
            .header("x-forwarded-for", "198.51.100.21")
            .header("Authorization", format!("Bearer {token}"))
            .header("x-device-fingerprint", FP)
            .body(Body::from("session_code=abc"))
            .unwrap();
        let (status, _, json) = app.send(plain).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["data"]["reason"], "validation_error");
        assert!(json["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[tokio::test]
    #[serial]
    async fn mark_requires_a_student_token() {
        let app = make_app().await;
        let room = classroom(&app).await;

        let (status, _, json) = app
            .send(json_request(
                "POST",
                "/api/attendance/mark",
                None,
                Some(json!({"session_code": room.code})),
            ))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);

        let (status, json) = mark(&app, &room.teacher_token, &room.code, Some(FP)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["message"], "Access denied. Students only.");
    }

    #[tokio::test]
    #[serial]
    async fn store_outage_fails_closed() {
        let app = make_app().await;
        let room = classroom(&app).await;
        let (_, token) = register_student(&app, "21CS007").await;

        app.store.set_available(false);
        let (status, json) = mark(&app, &token, &room.code, Some(FP)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Internal server error");

        let count = attendance_record::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    #[serial]
    async fn sixth_attempt_in_a_minute_is_rate_limited() {
        let app = make_app().await;
        let (_, token) = register_student(&app, "21CS008").await;

        for expected_remaining in (0..5).rev() {
            let (status, headers, _) = app.send(mark_request(&token, "", Some(FP))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(headers["x-ratelimit-remaining"], expected_remaining.to_string().as_str());
        }

        let (status, headers, json) = app.send(mark_request(&token, "", Some(FP))).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["data"]["reason"], "rate_limited");
        assert_eq!(json["message"], "Too many attendance attempts. Please wait a minute.");
        assert_eq!(headers["x-ratelimit-limit"], "5");
    }

    #[tokio::test]
    #[serial]
    async fn history_lists_own_marks() {
        let app = make_app().await;
        let room = classroom(&app).await;
        let (_, token) = register_student(&app, "21CS009").await;

        let (status, _) = mark(&app, &token, &room.code, Some(FP)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _, json) = app
            .send(json_request("GET", "/api/attendance/me", Some(&token), None))
            .await;
        assert_eq!(status, StatusCode::OK);
        let entries = json["data"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["subject"], "Networks");
        assert_eq!(entries[0]["session_code"], room.code.as_str());
        assert_eq!(entries[0]["teacher_name"], "Ada");
    }
}
