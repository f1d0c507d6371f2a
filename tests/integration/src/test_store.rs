//! Store-backed integration tests. Need `WEB2_TEST_STORE_ID`.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::Value;

    use crate::{client, test_store_id, url};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_keys_on_request() {
        let Some(store) = test_store_id() else {
            return;
        };

        let resp = client()
            .get(url(&format!("/{store}?showKeys=true")))
            .send()
            .await
            .expect("GET store keys");

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("json body");
        assert!(body.is_array());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_every_listed_key() {
        let Some(store) = test_store_id() else {
            return;
        };
        let keys: Vec<String> = client()
            .get(url(&format!("/{store}?showKeys=true")))
            .send()
            .await
            .expect("GET store keys")
            .json()
            .await
            .expect("key list");

        for key in keys.iter().filter(|k| !k.contains(".part")).take(10) {
            let resp = client()
                .get(url(&format!("/{store}/{key}")))
                .send()
                .await
                .expect("GET key");
            assert_eq!(resp.status(), StatusCode::OK, "key {key}");
        }
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_redirect_missing_key_to_store_root() {
        let Some(store) = test_store_id() else {
            return;
        };

        let resp = client()
            .get(url(&format!("/{store}/definitely-not-a-key.txt")))
            .send()
            .await
            .expect("GET missing key");

        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            resp.headers()
                .get("location")
                .and_then(|v| v.to_str().ok()),
            Some(format!("/{store}").as_str())
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_redirect_foreign_referrer_into_store() {
        let Some(store) = test_store_id() else {
            return;
        };

        let resp = client()
            .get(url(&format!("/{store}/app.js")))
            .header("referer", "http://elsewhere.example")
            .send()
            .await
            .expect("GET with referrer");

        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            resp.headers()
                .get("location")
                .and_then(|v| v.to_str().ok()),
            Some(format!("http://elsewhere.example/{store}/app.js").as_str())
        );
    }
}
