#[cfg(test)]
mod tests {
    use crate::helpers::{bearer, json_request, make_app};
    use api::auth::Role;
    use axum::http::StatusCode;
    use db::models::{
        admin::{self, AdminRole},
        teacher,
    };
    use serde_json::json;
    use serial_test::serial;

    fn registration(roll: &str, email: &str) -> serde_json::Value {
        json!({
            "name": "Grace Hopper",
            "roll_number": roll,
            "email": email,
            "department": "CSE",
            "year": 2,
            "section": "A"
        })
    }

    #[tokio::test]
    #[serial]
    async fn teacher_login_success_and_bad_password() {
        let app = make_app().await;
        teacher::Model::create(&app.db, "Ada", "ada@college.edu", "secret123", "CSE")
            .await
            .unwrap();

        let (status, _, json) = app
            .send(json_request(
                "POST",
                "/api/auth/teacher/login",
                None,
                Some(json!({"email": "ada@college.edu", "password": "secret123"})),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Login successful");
        assert!(json["data"]["token"].as_str().is_some());
        assert_eq!(json["data"]["account"]["email"], "ada@college.edu");
        assert!(json["data"]["account"].get("password_hash").is_none());

        let (status, _, json) = app
            .send(json_request(
                "POST",
                "/api/auth/teacher/login",
                None,
                Some(json!({"email": "ada@college.edu", "password": "wrong"})),
            ))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Invalid credentials");
    }

    #[tokio::test]
    #[serial]
    async fn teacher_login_rejects_malformed_email() {
        let app = make_app().await;

        let (status, _, json) = app
            .send(json_request(
                "POST",
                "/api/auth/teacher/login",
                None,
                Some(json!({"email": "not-an-email", "password": "x"})),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["data"]["reason"], "validation_error");
        assert_eq!(json["message"], "Invalid email format");
    }

    #[tokio::test]
    #[serial]
    async fn admin_login_success() {
        let app = make_app().await;
        admin::Model::create(&app.db, "Root", "root@college.edu", "adminpass", AdminRole::SuperAdmin)
            .await
            .unwrap();

        let (status, _, json) = app
            .send(json_request(
                "POST",
                "/api/auth/admin/login",
                None,
                Some(json!({"email": "root@college.edu", "password": "adminpass"})),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Admin login successful");
    }

    #[tokio::test]
    #[serial]
    async fn student_register_then_login_by_roll_number() {
        let app = make_app().await;

        let (status, _, json) = app
            .send(json_request(
                "POST",
                "/api/auth/student/register",
                None,
                Some(registration("21cs042", "grace@college.edu")),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["message"], "Registration successful");
        assert_eq!(json["data"]["account"]["roll_number"], "21CS042");
        let id = json["data"]["account"]["id"].as_i64().unwrap();

        let (status, _, json) = app
            .send(json_request(
                "POST",
                "/api/auth/student/register",
                None,
                Some(registration("21CS042", "other@college.edu")),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Student already registered. Logged in.");
        assert_eq!(json["data"]["account"]["id"], id);
    }

    #[tokio::test]
    #[serial]
    async fn student_register_validates_year() {
        let app = make_app().await;
        let mut body = registration("21CS043", "linus@college.edu");
        body["year"] = json!(7);

        let (status, _, json) = app
            .send(json_request("POST", "/api/auth/student/register", None, Some(body)))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Year must be between 1 and 4");
    }

    #[tokio::test]
    #[serial]
    async fn me_returns_account_for_each_role() {
        let app = make_app().await;
        let teacher = teacher::Model::create(&app.db, "Ada", "ada@college.edu", "secret123", "CSE")
            .await
            .unwrap();
        let token = bearer(teacher.id, Role::Teacher);

        let (status, _, json) = app
            .send(json_request("GET", "/api/auth/me", Some(&token), None))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["role"], "teacher");
        assert_eq!(json["data"]["user"]["name"], "Ada");
    }

    #[tokio::test]
    #[serial]
    async fn me_requires_a_token() {
        let app = make_app().await;

        let (status, _, json) = app.send(json_request("GET", "/api/auth/me", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "No token provided. Access denied.");

        let (status, _, _) = app
            .send(json_request("GET", "/api/auth/me", Some("garbage"), None))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[serial]
    async fn auth_routes_are_rate_limited() {
        let app = make_app().await;
        let body = json!({"email": "nobody@college.edu", "password": "x"});

        for _ in 0..10 {
            let (status, headers, _) = app
                .send(json_request("POST", "/api/auth/teacher/login", None, Some(body.clone())))
                .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(headers["x-ratelimit-limit"], "10");
        }

        let (status, headers, json) = app
            .send(json_request("POST", "/api/auth/teacher/login", None, Some(body)))
            .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["data"]["reason"], "rate_limited");
        assert_eq!(headers["x-ratelimit-remaining"], "0");
    }
}
