#[cfg(test)]
mod tests {
    use crate::helpers::{json_request, make_app};
    use axum::http::StatusCode;
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    async fn health_reports_both_stores() {
        let app = make_app().await;

        let (status, _, json) = app.send(json_request("GET", "/api/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["status"], "OK");
        assert_eq!(json["data"]["database"], "up");
        assert_eq!(json["data"]["store"], "up");
        assert_eq!(json["message"], "Health check passed");
    }

    #[tokio::test]
    #[serial]
    async fn health_stays_ok_when_store_is_down() {
        let app = make_app().await;
        app.store.set_available(false);

        let (status, _, json) = app.send(json_request("GET", "/api/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["store"], "down");
        assert_eq!(json["data"]["database"], "up");
    }
}
