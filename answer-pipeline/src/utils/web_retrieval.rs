use common::error::AppError;
use dom_smoothie::{Article, Readability, TextMode};
use serde::Deserialize;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};
use tracing::{info, warn};
use url::Url;

use crate::pipeline::RetrievedDocument;

/// Response shape of a SearxNG-compatible `/search?format=json` endpoint.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    url: String,
}

/// Retrieve up to `top_n` cleaned documents for a search query.
///
/// A failing search request is an error; a failing individual source is
/// skipped with a warning. When nothing is retrievable the result is an
/// empty vec, by contract.
pub async fn retrieve_top_documents(
    http: &reqwest::Client,
    search_base_url: &str,
    search_query: &str,
    top_n: usize,
) -> Result<Vec<RetrievedDocument>, AppError> {
    let search_url = format!("{}/search", search_base_url.trim_end_matches('/'));
    let response = http
        .get(search_url)
        .query(&[("q", search_query), ("format", "json")])
        .send()
        .await?
        .error_for_status()?
        .json::<SearchResponse>()
        .await?;

    let mut documents = Vec::with_capacity(top_n);
    for hit in response.results {
        if documents.len() >= top_n {
            break;
        }
        let url = match parse_source_url(&hit.url) {
            Ok(url) => url,
            Err(e) => {
                warn!(url = %hit.url, error = %e, "skipping search hit with unusable URL");
                continue;
            }
        };
        match fetch_document(http, &url).await {
            Ok(Some(document)) => documents.push(document),
            Ok(None) => warn!(url = %url, "skipping source without readable text"),
            Err(e) => warn!(url = %url, error = %e, "skipping unreachable source"),
        }
    }

    info!(
        search_query,
        retrieved = documents.len(),
        "retrieved source documents"
    );
    Ok(documents)
}

fn parse_source_url(raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw)
        .map_err(|_| AppError::Validation(format!("invalid source URL: {raw}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(AppError::Validation(format!(
            "unsupported URL scheme '{scheme}'"
        ))),
    }
}

async fn fetch_document(
    http: &reqwest::Client,
    url: &Url,
) -> Result<Option<RetrievedDocument>, AppError> {
    let retry_strategy = ExponentialBackoff::from_millis(100).map(jitter).take(3);

    let raw_html = Retry::spawn(retry_strategy, || async {
        http.get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    })
    .await?;

    let text = extract_readable_text(raw_html)?;
    if text.is_empty() {
        return Ok(None);
    }

    Ok(Some(RetrievedDocument {
        source: url.clone(),
        text,
    }))
}

/// Strip markup, scripts and boilerplate down to the article text.
fn extract_readable_text(raw_html: String) -> Result<String, AppError> {
    let config = dom_smoothie::Config {
        text_mode: TextMode::Markdown,
        ..Default::default()
    };
    let mut readability = Readability::new(raw_html, None, Some(config))?;
    let article: Article = readability.parse()?;
    Ok(normalize_whitespace(&article.text_content))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https_sources_only() {
        assert!(parse_source_url("https://example.com/page").is_ok());
        assert!(parse_source_url("http://example.com/page").is_ok());
        assert!(parse_source_url("ftp://example.com/file").is_err());
        assert!(parse_source_url("not a url").is_err());
    }

    #[test]
    fn normalizes_runs_of_whitespace() {
        assert_eq!(
            normalize_whitespace("  spread \n\n across\t lines  "),
            "spread across lines"
        );
    }

    #[test]
    fn search_response_tolerates_missing_results() {
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());

        let parsed: SearchResponse = serde_json::from_str(
            r#"{"results":[{"url":"https://example.com","title":"Example"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.results.len(), 1);
    }
}
