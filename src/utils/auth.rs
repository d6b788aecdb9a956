//! Authentication and attribution headers for chat requests

/// Attach the bearer credential plus the `HTTP-Referer` / `X-Title` pair the
/// OpenRouter API uses to attribute traffic to an application.
pub fn add_auth_headers(
    request: reqwest::RequestBuilder,
    api_key: &str,
    referer: &str,
    app_title: &str,
) -> reqwest::RequestBuilder {
    request
        .header("Authorization", format!("Bearer {api_key}"))
        .header("HTTP-Referer", referer)
        .header("X-Title", app_title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_bearer_and_attribution_headers() {
        let client = reqwest::Client::new();
        let request = client.post("https://example.com/chat/completions");

        let built = add_auth_headers(request, "test-key", "https://example.com", "Tester")
            .build()
            .expect("request should build");

        let headers = built.headers();
        assert_eq!(headers["authorization"], "Bearer test-key");
        assert_eq!(headers["http-referer"], "https://example.com");
        assert_eq!(headers["x-title"], "Tester");
    }
}
