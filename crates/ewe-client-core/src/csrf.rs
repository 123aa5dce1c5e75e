//! CSRF header policy for outbound requests

pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Name of the hidden input the server renders the token into
pub const CSRF_INPUT_NAME: &str = "csrfmiddlewaretoken";

const SAFE_METHODS: [&str; 4] = ["GET", "HEAD", "OPTIONS", "TRACE"];

/// Methods that never change server state
pub fn is_safe_method(method: &str) -> bool {
    SAFE_METHODS
        .iter()
        .any(|safe| safe.eq_ignore_ascii_case(method.trim()))
}

/// Whether a request must carry the CSRF header
pub fn requires_token(method: &str, same_origin: bool) -> bool {
    same_origin && !is_safe_method(method)
}

/// Header to attach, if any
pub fn header_for<'a>(
    method: &str,
    same_origin: bool,
    token: Option<&'a str>,
) -> Option<(&'static str, &'a str)> {
    if !requires_token(method, same_origin) {
        return None;
    }
    token
        .filter(|t| !t.is_empty())
        .map(|t| (CSRF_HEADER, t))
}
