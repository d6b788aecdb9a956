//! Endpoint URL construction

/// Strip trailing slashes so endpoints can be appended without doubling them.
///
/// ```
/// use haream::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://openrouter.ai/api/v1//"), "https://openrouter.ai/api/v1");
/// ```
pub fn normalize_base_url(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// The chat-completions endpoint below `base_url`.
///
/// ```
/// use haream::utils::url::chat_completions_url;
///
/// assert_eq!(
///     chat_completions_url("https://openrouter.ai/api/v1/"),
///     "https://openrouter.ai/api/v1/chat/completions"
/// );
/// ```
pub fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", normalize_base_url(base_url.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_any_number_of_trailing_slashes() {
        assert_eq!(normalize_base_url("http://127.0.0.1:9000"), "http://127.0.0.1:9000");
        assert_eq!(normalize_base_url("http://127.0.0.1:9000///"), "http://127.0.0.1:9000");
        assert_eq!(normalize_base_url("///"), "");
    }

    #[test]
    fn builds_chat_endpoint() {
        assert_eq!(
            chat_completions_url(" http://localhost:8080/v1 "),
            "http://localhost:8080/v1/chat/completions"
        );
    }
}
