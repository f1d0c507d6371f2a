//! Response builders for the gateway's fixed documents and outcomes.

use http::StatusCode;
use http::header::{CONTENT_TYPE, LOCATION};
use serde_json::{Value, json};

use crate::body::GatewayResponseBody;

/// Error message returned when a store cannot be read.
pub const STORE_UNAVAILABLE_MESSAGE: &str =
    "Can not retrieve data or it doesn't exist on this node";

/// Greeting in the welcome document.
pub const WELCOME_MESSAGE: &str = "Welcome to the Chia DataLayer Web2 Gateway";

/// Build a response with a JSON body.
#[must_use]
pub fn json_response(status: StatusCode, value: &Value) -> http::Response<GatewayResponseBody> {
    http::Response::builder()
        .status(status)
        .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(GatewayResponseBody::from_json(value))
        .expect("static JSON response should be valid")
}

/// Build a JSON `{"error": message}` response.
#[must_use]
pub fn json_error(status: StatusCode, message: &str) -> http::Response<GatewayResponseBody> {
    json_response(status, &json!({ "error": message }))
}

/// Build a `301 Moved Permanently` redirect to `location`.
///
/// A location that is not a valid header value degrades to `500`.
#[must_use]
pub fn redirect(location: &str) -> http::Response<GatewayResponseBody> {
    http::Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(LOCATION, location)
        .body(GatewayResponseBody::empty())
        .unwrap_or_else(|_| json_error(StatusCode::INTERNAL_SERVER_ERROR, "invalid redirect target"))
}

/// Build a `200` HTML page.
#[must_use]
pub fn html_response(html: String) -> http::Response<GatewayResponseBody> {
    http::Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, mime::TEXT_HTML.as_ref())
        .body(GatewayResponseBody::from_string(html))
        .expect("static HTML response should be valid")
}

/// The discovery document served at `/`.
#[must_use]
pub fn welcome_response() -> http::Response<GatewayResponseBody> {
    json_response(
        StatusCode::OK,
        &json!({
            "message": WELCOME_MESSAGE,
            "endpoints": {
                "/.well-known": "Returns the public deposit address of the node",
                "/:storeId": "Returns all keys in the store",
                "/:storeId/:key": "Returns the value of the key in the store",
            },
        }),
    )
}

/// Deposit and donation addresses served at `/.well-known`.
#[must_use]
pub fn well_known_response(
    deposit_address: Option<&str>,
    donation_address: &str,
) -> http::Response<GatewayResponseBody> {
    json_response(
        StatusCode::OK,
        &json!({
            "xch_address": deposit_address,
            "donation_address": donation_address,
        }),
    )
}

/// Liveness document; `datalayer` reports whether the store answers.
#[must_use]
pub fn health_response(datalayer: bool) -> http::Response<GatewayResponseBody> {
    json_response(
        StatusCode::OK,
        &json!({ "status": "running", "datalayer": datalayer }),
    )
}

/// `405` for anything but `GET`, `HEAD` and `OPTIONS`.
#[must_use]
pub fn method_not_allowed(method: &http::Method) -> http::Response<GatewayResponseBody> {
    let mut response = json_error(
        StatusCode::METHOD_NOT_ALLOWED,
        &format!("method {method} is not supported; the gateway is read-only"),
    );
    response.headers_mut().insert(
        http::header::ALLOW,
        http::HeaderValue::from_static("GET, HEAD, OPTIONS"),
    );
    response
}

/// Produce a CORS preflight response.
#[must_use]
pub fn cors_preflight_response() -> http::Response<GatewayResponseBody> {
    http::Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, HEAD, OPTIONS")
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Max-Age", "86400")
        .body(GatewayResponseBody::empty())
        .expect("static CORS response should be valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(resp: &'a http::Response<GatewayResponseBody>, name: &str) -> Option<&'a str> {
        resp.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_should_build_permanent_redirect() {
        let resp = redirect("/abc");
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(header(&resp, "Location"), Some("/abc"));
    }

    #[test]
    fn test_should_degrade_invalid_redirect_target() {
        let resp = redirect("/abc\nx");
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_should_build_json_error() {
        let resp = json_error(StatusCode::INTERNAL_SERVER_ERROR, STORE_UNAVAILABLE_MESSAGE);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(header(&resp, "Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_should_build_cors_preflight() {
        let resp = cors_preflight_response();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(header(&resp, "Access-Control-Allow-Origin"), Some("*"));
        assert!(resp.headers().contains_key("Access-Control-Allow-Methods"));
    }

    #[test]
    fn test_should_advertise_allowed_methods() {
        let resp = method_not_allowed(&http::Method::POST);
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(header(&resp, "Allow"), Some("GET, HEAD, OPTIONS"));
    }
}
