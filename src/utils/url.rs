//! Endpoint construction for provider base URLs.
//!
//! Base URLs come from config files and may carry trailing slashes; these
//! helpers keep the joined endpoint free of doubled separators.

/// Join a base URL and an endpoint path with exactly one `/` between them.
///
/// ```
/// use chatrelay::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.x.ai/v1/", "/chat/completions"),
///     "https://api.x.ai/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let endpoint = endpoint.trim_start_matches('/');
    format!("{base}/{endpoint}")
}

/// Gemini addresses models as `models/{model}:{method}`. A model given with
/// its `models/` prefix is accepted as well.
pub fn model_method_url(base_url: &str, model: &str, method: &str) -> String {
    let model = model.trim_start_matches("models/");
    construct_api_url(base_url, &format!("models/{model}:{method}"))
}
