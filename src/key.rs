use http::Request;

/// Derive the canonical cache key for a request.
///
/// The key is `METHOD + "#" + full request URI`. The separator keeps
/// `GET /x` and `PUT /x` apart; the full URI, query string included, is
/// used verbatim with no host or path normalization. Two requests that
/// differ only in their headers share a key.
pub fn request_key<B>(req: &Request<B>) -> String {
    format!("{}#{}", req.method(), req.uri())
}
