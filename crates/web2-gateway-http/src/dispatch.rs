//! Classification to response framing.

use http::StatusCode;
use http::header::CONTENT_TYPE;
use tracing::error;
use web2_gateway_core::Classification;

use crate::body::GatewayResponseBody;
use crate::response::json_error;

/// Write one `200` response for a classified value.
///
/// JSON is re-serialized; files and images carry their MIME type; opaque
/// values go out without a content type.
#[must_use]
pub fn classification_response(classification: Classification) -> http::Response<GatewayResponseBody> {
    let content_type = classification.content_type().map(str::to_owned);
    let body = match classification {
        Classification::Json(value) => GatewayResponseBody::from_json(&value),
        Classification::InlineImage { bytes, .. }
        | Classification::TypedFile { bytes, .. }
        | Classification::Opaque(bytes) => GatewayResponseBody::from_bytes(bytes),
    };

    let mut builder = http::Response::builder().status(StatusCode::OK);
    if let Some(content_type) = content_type.as_deref() {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    builder.body(body).unwrap_or_else(|e| {
        error!(error = %e, ?content_type, "could not frame resolved value");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "invalid content type")
    })
}
