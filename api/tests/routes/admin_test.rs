#[cfg(test)]
mod tests {
    use crate::helpers::{TestApp, bearer, json_request, make_app};
    use api::auth::Role;
    use axum::http::StatusCode;
    use chrono::Utc;
    use db::models::{
        admin::{self, AdminRole},
        attendance_session,
        student::{self, DeviceDetails, NewStudent},
        teacher,
    };
    use serde_json::json;
    use serial_test::serial;
    use services::{
        attendance_service::{AttendanceService, MarkOutcome, MarkRequest},
        session_service::{CreateSession, SessionService},
    };

    const FP: &str = "fp-device-alpha-0001";

    struct Marked {
        admin_token: String,
        student: student::Model,
        session: attendance_session::Model,
        outcome: MarkOutcome,
    }

    /// One student marked into one live session, seeded through the services.
    async fn marked(app: &TestApp) -> Marked {
        let admin = admin::Model::create(&app.db, "Root", "root@college.edu", "adminpass", AdminRole::Admin)
            .await
            .unwrap();
        let teacher = teacher::Model::create(&app.db, "Ada", "ada@college.edu", "secret123", "CSE")
            .await
            .unwrap();
        let student = student::Model::create(
            &app.db,
            NewStudent {
                name: "Grace".into(),
                roll_number: "21CS042".into(),
                email: "grace@college.edu".into(),
                department: "CSE".into(),
                year: 2,
                section: Some("A".into()),
            },
        )
        .await
        .unwrap();

        let created = SessionService::create(
            &app.db,
            &app.tokens,
            &teacher,
            CreateSession {
                subject: "Networks".into(),
                ..CreateSession::default()
            },
            5,
            Utc::now(),
        )
        .await
        .unwrap();

        let outcome = AttendanceService::mark(
            &app.db,
            &app.tokens,
            MarkRequest {
                student: &student,
                session_code: &created.session.code,
                fingerprint: Some(FP),
                device: DeviceDetails::default(),
            },
            Utc::now(),
        )
        .await
        .unwrap();

        Marked {
            admin_token: bearer(admin.id, Role::Admin),
            student,
            session: created.session,
            outcome,
        }
    }

    #[tokio::test]
    #[serial]
    async fn admin_routes_require_admin_role() {
        let app = make_app().await;
        let m = marked(&app).await;

        let (status, _, json) = app
            .send(json_request(
                "GET",
                &format!("/api/admin/students/{}", m.student.id),
                Some(&bearer(m.student.id, Role::Student)),
                None,
            ))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["message"], "Admin access required");
    }

    #[tokio::test]
    #[serial]
    async fn student_details_show_cooldown_and_device() {
        let app = make_app().await;
        let m = marked(&app).await;

        let (status, _, json) = app
            .send(json_request(
                "GET",
                &format!("/api/admin/students/{}", m.student.id),
                Some(&m.admin_token),
                None,
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        let data = &json["data"];
        assert_eq!(data["student"]["roll_number"], "21CS042");
        assert_eq!(data["attendance"].as_array().unwrap().len(), 1);
        assert_eq!(data["token_history"].as_array().unwrap().len(), 1);
        assert!(data["token_cooldown"].as_u64().unwrap() > 0);
        assert_eq!(data["bound_device"], FP);

        let (status, _, _) = app
            .send(json_request("GET", "/api/admin/students/9999", Some(&m.admin_token), None))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn resets_clear_cooldown_and_device() {
        let app = make_app().await;
        let m = marked(&app).await;
        let base = format!("/api/admin/students/{}", m.student.id);

        let (status, _, json) = app
            .send(json_request("POST", &format!("{base}/reset-token"), Some(&m.admin_token), None))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Token cooldown reset for 21CS042");
        assert!(app.tokens.has_available_token(m.student.id).await);

        let (status, _, _) = app
            .send(json_request("POST", &format!("{base}/reset-device"), Some(&m.admin_token), None))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, _, json) = app.send(json_request("GET", &base, Some(&m.admin_token), None)).await;
        assert!(json["data"]["bound_device"].is_null());
        assert!(json["data"]["student"]["device_fingerprint"].is_null());
        assert_eq!(json["data"]["token_cooldown"], 0);
    }

    #[tokio::test]
    #[serial]
    async fn delete_attendance_then_missing_record() {
        let app = make_app().await;
        let m = marked(&app).await;
        let uri = format!("/api/admin/attendance/{}", m.outcome.attendance_id);

        let (status, _, json) = app.send(json_request("DELETE", &uri, Some(&m.admin_token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Attendance record deleted");

        let (status, _, json) = app.send(json_request("DELETE", &uri, Some(&m.admin_token), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Record not found");
    }

    #[tokio::test]
    #[serial]
    async fn delete_student_removes_account_and_keys() {
        let app = make_app().await;
        let m = marked(&app).await;
        let uri = format!("/api/admin/students/{}", m.student.id);

        let (status, _, json) = app.send(json_request("DELETE", &uri, Some(&m.admin_token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Student 21CS042 deleted");

        let (status, _, _) = app.send(json_request("GET", &uri, Some(&m.admin_token), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(app.tokens.bound_device(m.student.id).await.unwrap(), None);
    }

    #[tokio::test]
    #[serial]
    async fn force_end_ignores_ownership() {
        let app = make_app().await;
        let m = marked(&app).await;

        let (status, _, json) = app
            .send(json_request(
                "PUT",
                &format!("/api/admin/sessions/{}/force-end", m.session.id),
                Some(&m.admin_token),
                None,
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["active"], false);
        assert!(app.tokens.cached_session(&m.session.code).await.unwrap().is_none());
    }

    #[tokio::test]
    #[serial]
    async fn store_stats_and_flush() {
        let app = make_app().await;
        let m = marked(&app).await;

        let (status, _, json) = app
            .send(json_request("GET", "/api/admin/store", Some(&m.admin_token), None))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["token_cooldowns"], 1);
        assert_eq!(json["data"]["device_locks"], 1);
        assert_eq!(json["data"]["cached_sessions"], 1);

        let (status, _, json) = app
            .send(json_request(
                "POST",
                "/api/admin/store/flush",
                Some(&m.admin_token),
                Some(json!({"type": "everything"})),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["message"],
            "Invalid type. Use: tokens, devices, sessions, ratelimits, all"
        );

        let (status, _, json) = app
            .send(json_request(
                "POST",
                "/api/admin/store/flush",
                Some(&m.admin_token),
                Some(json!({"type": "tokens"})),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["flushed"], "tokens");
        assert_eq!(json["data"]["keys_deleted"], 1);
        assert!(app.tokens.has_available_token(m.student.id).await);

        let (status, _, json) = app
            .send(json_request(
                "POST",
                "/api/admin/store/flush",
                Some(&m.admin_token),
                Some(json!({"type": "all"})),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["flushed"], "all");

        let (_, _, json) = app
            .send(json_request("GET", "/api/admin/store", Some(&m.admin_token), None))
            .await;
        assert_eq!(json["data"]["total_keys"], 0);
    }
}
