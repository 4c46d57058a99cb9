#[cfg(test)]
mod tests {
    use crate::helpers::{TestApp, bearer, json_request, make_app};
    use api::auth::Role;
    use axum::{body::Body, http::{Request, StatusCode}};
    use chrono::{DateTime, Utc};
    use db::models::{
        student::{self, NewStudent},
        teacher,
    };
    use serde_json::{Value, json};
    use serial_test::serial;

    async fn seed_teacher(app: &TestApp, email: &str) -> String {
        let teacher = teacher::Model::create(&app.db, "Ada", email, "secret123", "CSE")
            .await
            .unwrap();
        bearer(teacher.id, Role::Teacher)
    }

    async fn create_session(app: &TestApp, token: &str, body: Value) -> (StatusCode, Value) {
        let (status, _, json) = app
            .send(json_request("POST", "/api/teacher/sessions", Some(token), Some(body)))
            .await;
        (status, json)
    }

    async fn scan(app: &TestApp, roll: &str, code: &str) -> StatusCode {
        let student = student::Model::create(
            &app.db,
            NewStudent {
                name: "Student".into(),
                roll_number: roll.into(),
                email: format!("{roll}@college.edu"),
                department: "CSE".into(),
                year: 2,
                section: None,
            },
        )
        .await
        .unwrap();

        let req = Request::builder()
            .method("POST")
            .uri("/api/attendance/mark")
            .header("x-forwarded-for", format!("198.51.100.{}", student.id))
            .header("Authorization", format!("Bearer {}", bearer(student.id, Role::Student)))
            .header("content-type", "application/json")
            .header("x-device-fingerprint", format!("fingerprint-{roll}"))
            .body(Body::from(json!({ "session_code": code }).to_string()))
            .unwrap();
        app.send(req).await.0
    }

    #[tokio::test]
    #[serial]
    async fn create_session_returns_code_and_qr() {
        let app = make_app().await;
        let token = seed_teacher(&app, "ada@college.edu").await;

        let (status, json) = create_session(
            &app,
            &token,
            json!({"subject": "Networks", "year": 2, "section": "A", "expiry_minutes": 10}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["message"], "Session created successfully");

        let session = &json["data"]["session"];
        assert_eq!(session["subject"], "Networks");
        assert_eq!(session["department"], "CSE");
        assert_eq!(session["active"], true);
        assert_eq!(session["code"].as_str().unwrap().len(), 36);
        assert!(json["data"]["qr_svg"].as_str().unwrap().contains("<svg"));

        let created: DateTime<Utc> = session["created_at"].as_str().unwrap().parse().unwrap();
        let expires: DateTime<Utc> = session["expires_at"].as_str().unwrap().parse().unwrap();
        assert!((595..=600).contains(&(expires - created).num_seconds()));
    }

    #[tokio::test]
    #[serial]
    async fn create_session_uses_default_expiry() {
        let app = make_app().await;
        let token = seed_teacher(&app, "ada@college.edu").await;

        let (status, json) = create_session(&app, &token, json!({"subject": "Compilers"})).await;
        assert_eq!(status, StatusCode::CREATED);

        let session = &json["data"]["session"];
        let created: DateTime<Utc> = session["created_at"].as_str().unwrap().parse().unwrap();
        let expires: DateTime<Utc> = session["expires_at"].as_str().unwrap().parse().unwrap();
        assert!((295..=300).contains(&(expires - created).num_seconds()));
    }

    #[tokio::test]
    #[serial]
    async fn create_session_validates_input() {
        let app = make_app().await;
        let token = seed_teacher(&app, "ada@college.edu").await;

        let (status, json) = create_session(&app, &token, json!({"subject": ""})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Subject is required");

        let (status, json) =
            create_session(&app, &token, json!({"subject": "Networks", "expiry_minutes": 2000})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "expiry_minutes must be between 1 and 1440");
    }

    #[tokio::test]
    #[serial]
    async fn teacher_routes_reject_students() {
        let app = make_app().await;

        let (status, _, json) = app
            .send(json_request(
                "GET",
                "/api/teacher/sessions",
                Some(&bearer(1, Role::Student)),
                None,
            ))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["message"], "Access denied. Teachers only.");
    }

    #[tokio::test]
    #[serial]
    async fn active_sessions_carry_live_count_until_ended() {
        let app = make_app().await;
        let token = seed_teacher(&app, "ada@college.edu").await;
        let (_, json) = create_session(&app, &token, json!({"subject": "Networks"})).await;
        let id = json["data"]["session"]["id"].as_i64().unwrap();
        let code = json["data"]["session"]["code"].as_str().unwrap().to_owned();

        assert_eq!(scan(&app, "21CS101", &code).await, StatusCode::CREATED);
        assert_eq!(scan(&app, "21CS102", &code).await, StatusCode::CREATED);

        let (status, _, json) = app
            .send(json_request("GET", "/api/teacher/sessions/active", Some(&token), None))
            .await;
        assert_eq!(status, StatusCode::OK);
        let active = json["data"].as_array().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0]["id"], id);
        assert_eq!(active[0]["attendance_count"], 2);

        let (status, _, json) = app
            .send(json_request(
                "GET",
                &format!("/api/teacher/sessions/{id}/attendance"),
                Some(&token),
                None,
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        let entries = json["data"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["student"]["roll_number"], "21CS101");
        assert_eq!(entries[0]["status"], "present");

        let (status, _, json) = app
            .send(json_request("PUT", &format!("/api/teacher/sessions/{id}/end"), Some(&token), None))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["active"], false);

        let (_, _, json) = app
            .send(json_request("GET", "/api/teacher/sessions/active", Some(&token), None))
            .await;
        assert!(json["data"].as_array().unwrap().is_empty());

        let (_, _, json) = app
            .send(json_request("GET", "/api/teacher/sessions", Some(&token), None))
            .await;
        let recent = json["data"].as_array().unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0]["attendance_count"], 2);
    }

    #[tokio::test]
    #[serial]
    async fn teachers_cannot_touch_each_others_sessions() {
        let app = make_app().await;
        let owner = seed_teacher(&app, "ada@college.edu").await;
        let other = seed_teacher(&app, "alan@college.edu").await;
        let (_, json) = create_session(&app, &owner, json!({"subject": "Networks"})).await;
        let id = json["data"]["session"]["id"].as_i64().unwrap();

        for (method, uri) in [
            ("PUT", format!("/api/teacher/sessions/{id}/end")),
            ("GET", format!("/api/teacher/sessions/{id}/attendance")),
            ("GET", format!("/api/teacher/sessions/{id}/qr")),
        ] {
            let (status, _, _) = app.send(json_request(method, &uri, Some(&other), None)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        }
    }

    #[tokio::test]
    #[serial]
    async fn qr_regenerates_only_while_live() {
        let app = make_app().await;
        let token = seed_teacher(&app, "ada@college.edu").await;
        let (_, json) = create_session(&app, &token, json!({"subject": "Networks"})).await;
        let id = json["data"]["session"]["id"].as_i64().unwrap();
        let expires_at = json["data"]["session"]["expires_at"].clone();

        let uri = format!("/api/teacher/sessions/{id}/qr");
        let (status, _, json) = app.send(json_request("GET", &uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["data"]["qr_svg"].as_str().unwrap().contains("<svg"));
        assert_eq!(json["data"]["expires_at"], expires_at);

        app.send(json_request("PUT", &format!("/api/teacher/sessions/{id}/end"), Some(&token), None))
            .await;

        let (status, _, _) = app.send(json_request("GET", &uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
