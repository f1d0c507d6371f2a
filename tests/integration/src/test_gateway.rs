//! Fixed-endpoint integration tests: welcome, health, discovery, CORS.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::Value;

    use crate::{client, url};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_welcome_document() {
        let resp = client().get(url("/")).send().await.expect("GET /");

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("json body");
        assert!(body["message"].is_string());
        assert!(body["endpoints"].is_object());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_health() {
        for path in ["/health", "/_health"] {
            let resp = client().get(url(path)).send().await.expect("GET health");

            assert_eq!(resp.status(), StatusCode::OK);
            let body: Value = resp.json().await.expect("json body");
            assert_eq!(body["status"], "running");
            assert!(body["datalayer"].is_boolean());
        }
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_donation_address() {
        let resp = client()
            .get(url("/.well-known"))
            .send()
            .await
            .expect("GET /.well-known");

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("json body");
        assert!(body["donation_address"].as_str().is_some_and(|a| !a.is_empty()));
        assert!(body.get("xch_address").is_some());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_attach_cors_and_request_id_headers() {
        let resp = client().get(url("/health")).send().await.expect("GET");

        let headers = resp.headers();
        assert_eq!(
            headers
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_preflight() {
        let resp = client()
            .request(reqwest::Method::OPTIONS, url("/anything/at/all"))
            .send()
            .await
            .expect("OPTIONS");

        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_writes() {
        let resp = client()
            .post(url("/some-store/key"))
            .body("x")
            .send()
            .await
            .expect("POST");

        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(resp.headers().contains_key("allow"));
    }
}
