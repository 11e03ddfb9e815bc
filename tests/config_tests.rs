use bosun::config;

#[test]
fn test_sanitize_base_url_removes_trailing_slash() {
    assert_eq!(
        config::sanitize_base_url("https://api.example.com/developers/"),
        "https://api.example.com/developers"
    );
}

#[test]
fn test_sanitize_base_url_no_trailing_slash() {
    assert_eq!(
        config::sanitize_base_url("https://api.example.com/developers"),
        "https://api.example.com/developers"
    );
}

#[test]
fn test_sanitize_base_url_multiple_trailing_slashes() {
    assert_eq!(
        config::sanitize_base_url("https://api.example.com///"),
        "https://api.example.com"
    );
}

#[test]
fn test_sanitize_base_url_trims_whitespace() {
    assert_eq!(
        config::sanitize_base_url("  https://api.example.com/  "),
        "https://api.example.com"
    );
}

#[test]
fn test_sanitize_base_url_empty_string_falls_back() {
    assert_eq!(
        config::sanitize_base_url(""),
        config::FALLBACK_API_BASE_URL
    );
}

#[test]
fn test_sanitize_base_url_whitespace_only_falls_back() {
    assert_eq!(
        config::sanitize_base_url("   "),
        config::FALLBACK_API_BASE_URL
    );
}

#[test]
fn test_host_of_strips_scheme_and_path() {
    assert_eq!(config::host_of("https://api.example.com/v1"), "api.example.com");
}

#[test]
fn test_host_of_keeps_port() {
    assert_eq!(config::host_of("http://127.0.0.1:5000"), "127.0.0.1:5000");
}

#[test]
fn test_host_of_without_scheme() {
    assert_eq!(config::host_of("api.example.com/v1/regions"), "api.example.com");
}
