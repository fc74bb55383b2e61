use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{Response, StatusCode, Version};

use crate::error::CacheError;

const MAX_HEADERS: usize = 64;

/// Serialize a response into its wire format: status line, headers,
/// blank line, body.
///
/// The dump is exactly what [`read_response`] parses back. The version
/// is always written as HTTP/1.1; status and headers are preserved
/// verbatim.
pub fn dump_response(res: &Response<Bytes>) -> Vec<u8> {
    let status = res.status();
    let mut out = Vec::with_capacity(res.body().len() + 256);

    out.extend_from_slice(b"HTTP/1.1 ");
    out.extend_from_slice(status.as_str().as_bytes());
    out.push(b' ');
    out.extend_from_slice(status.canonical_reason().unwrap_or("").as_bytes());
    out.extend_from_slice(b"\r\n");

    for (name, value) in res.headers() {
        out.extend_from_slice(name.as_str().as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(res.body());

    out
}

/// Parse a stored dump back into a response.
///
/// Failure here means the stored bytes are no longer a valid HTTP
/// response; it is surfaced as corruption, not as a miss.
pub fn read_response(raw: &[u8]) -> Result<Response<Bytes>, CacheError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut parsed = httparse::Response::new(&mut headers);

    let body_offset = match parsed.parse(raw) {
        Ok(httparse::Status::Complete(offset)) => offset,
        Ok(httparse::Status::Partial) => {
            return Err(CacheError::Corrupt(
                "stored response is truncated".to_string(),
            ));
        }
        Err(e) => {
            return Err(CacheError::Corrupt(format!(
                "stored response does not parse: {e}"
            )));
        }
    };

    let code = parsed
        .code
        .ok_or_else(|| CacheError::Corrupt("stored response has no status code".to_string()))?;
    let status = StatusCode::from_u16(code)
        .map_err(|e| CacheError::Corrupt(format!("invalid status code {code}: {e}")))?;

    let mut builder = Response::builder().status(status).version(Version::HTTP_11);
    for h in parsed.headers.iter() {
        let name = HeaderName::from_bytes(h.name.as_bytes())
            .map_err(|e| CacheError::Corrupt(format!("invalid header name '{}': {e}", h.name)))?;
        let value = HeaderValue::from_bytes(h.value)
            .map_err(|e| CacheError::Corrupt(format!("invalid value for header '{}': {e}", h.name)))?;
        builder = builder.header(name, value);
    }

    builder
        .body(Bytes::copy_from_slice(&raw[body_offset..]))
        .map_err(|e| CacheError::Corrupt(format!("rebuilding stored response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> Response<Bytes> {
        Response::builder()
            .status(StatusCode::OK)
            .header("etag", "\"e1\"")
            .header("cache-control", "max-age=60")
            .header("content-type", "text/plain")
            .body(Bytes::from_static(b"hello world"))
            .unwrap()
    }

    #[test]
    fn test_dump_and_read_round_trip() {
        let original = sample_response();
        let raw = dump_response(&original);
        let replayed = read_response(&raw).unwrap();

        assert_eq!(replayed.status(), original.status());
        assert_eq!(replayed.headers(), original.headers());
        assert_eq!(replayed.body(), original.body());
    }

    #[test]
    fn test_dump_starts_with_status_line() {
        let raw = dump_response(&sample_response());
        assert!(raw.starts_with(b"HTTP/1.1 200 OK\r\n"));
    }

    #[test]
    fn test_empty_body_round_trip() {
        let original = Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header("etag", "\"e1\"")
            .body(Bytes::new())
            .unwrap();
        let replayed = read_response(&dump_response(&original)).unwrap();

        assert_eq!(replayed.status(), StatusCode::NOT_MODIFIED);
        assert!(replayed.body().is_empty());
    }

    #[test]
    fn test_garbage_is_corrupt() {
        assert!(matches!(
            read_response(b"not an http response at all"),
            Err(CacheError::Corrupt(_))
        ));
    }

    #[test]
    fn test_truncated_head_is_corrupt() {
        assert!(matches!(
            read_response(b"HTTP/1.1 200 OK\r\ncontent-type: text"),
            Err(CacheError::Corrupt(_))
        ));
    }
}
