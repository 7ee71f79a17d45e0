//! Sequential article page scraper.
//!
//! For each article returned by the news API:
//!
//! 1. ask the [`RobotsCache`] whether the page may be fetched,
//! 2. wait out the request delay (the configured delay or the site's
//!    `Crawl-delay`, whichever is longer),
//! 3. GET the page once; anything other than `200 OK` is a missing body,
//! 4. concatenate the text of every element matching the CSS selector.
//!
//! There is no retry. The output always has one row per input article.

use crate::config::PipelineConfig;
use crate::models::{Article, ArticleMeta};
use crate::robots::RobotsCache;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::error::Error;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Parse a CSS selector, turning the borrowed parse error into an owned one.
pub fn parse_selector(selector: &str) -> Result<Selector, Box<dyn Error>> {
    Selector::parse(selector).map_err(|e| format!("invalid CSS selector {selector:?}: {e}").into())
}

/// Concatenate the text of all elements in `html` matching `selector`.
///
/// Each element's text is whitespace-normalised; elements are joined with a
/// newline. Returns `None` when nothing matched or all matches were empty.
pub fn extract_body(html: &str, selector: &Selector) -> Option<String> {
    let document = Html::parse_document(html);
    let paragraphs: Vec<String> = document
        .select(selector)
        .map(|element| {
            element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| !text.is_empty())
        .collect();

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n"))
    }
}

/// Fetch a single article page and extract its body.
///
/// Returns `Ok(None)` for any status other than `200 OK`.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_article(
    client: &Client,
    url: &str,
    selector: &Selector,
) -> Result<Option<String>, Box<dyn Error>> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if status != StatusCode::OK {
        warn!(%status, "Non-200 response; body left missing");
        return Ok(None);
    }

    let html = resp.text().await?;
    let body = extract_body(&html, selector);
    match &body {
        Some(text) => info!(bytes = text.len(), "Parsed article"),
        None => warn!(html_bytes = html.len(), "Selector matched no text"),
    }
    Ok(body)
}

/// Scrape every article in order, one request at a time.
///
/// # Errors
///
/// Only an invalid selector is an error; per-page failures become a missing
/// body on that row.
#[instrument(level = "info", skip_all, fields(count = metas.len()))]
pub async fn fetch_articles(
    client: &Client,
    metas: Vec<ArticleMeta>,
    cfg: &PipelineConfig,
    robots: &mut RobotsCache,
) -> Result<Vec<Article>, Box<dyn Error>> {
    let selector = parse_selector(&cfg.selector)?;
    let base_delay = Duration::from_millis(cfg.delay_ms);
    let mut requested_any = false;
    let mut articles = Vec::with_capacity(metas.len());

    for (i, meta) in metas.into_iter().enumerate() {
        if !robots.paths_allowed(&meta.url).await {
            warn!(index = i, url = %meta.url, "Disallowed by robots.txt; skipping");
            articles.push(Article::from_meta(meta, None));
            continue;
        }

        if requested_any {
            let delay = robots
                .crawl_delay(&meta.url)
                .map_or(base_delay, |crawl| crawl.max(base_delay));
            debug!(?delay, "Pausing before next request");
            sleep(delay).await;
        }
        requested_any = true;

        let body = match fetch_article(client, &meta.url, &selector).await {
            Ok(body) => body,
            Err(e) => {
                error!(index = i, url = %meta.url, error = %e, "Article fetch failed");
                None
            }
        };
        articles.push(Article::from_meta(meta, body));
    }

    let with_body = articles.iter().filter(|a| a.body.is_some()).count();
    info!(
        total = articles.len(),
        with_body,
        missing = articles.len() - with_body,
        "Fetched article contents"
    );
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SELECTOR;
    use crate::robots::RobotsPolicy;
    use chrono::Utc;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    type Hits = Arc<Mutex<Vec<(String, Instant)>>>;

    /// Minimal HTTP/1.1 server: `/robots.txt` and `/missing*` are 404,
    /// everything else serves [`PAGE`]. Records each request path and arrival time.
    async fn serve_pages() -> (SocketAddr, Hits) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits: Hits = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&hits);

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let request = String::from_utf8_lossy(&buf);
                    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                    log.lock().unwrap().push((path.clone(), Instant::now()));

                    let (status, body) = if path == "/robots.txt" || path.starts_with("/missing") {
                        ("404 Not Found", "not found")
                    } else {
                        ("200 OK", PAGE)
                    };
                    let response = format!(
                        "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        (addr, hits)
    }

    fn meta(url: String) -> ArticleMeta {
        ArticleMeta {
            url,
            published: Utc::now(),
            author: None,
            title: "T".to_string(),
            section: None,
        }
    }

    const PAGE: &str = r#"
        <html><body>
          <h1>Headline that is not body</h1>
          <div class="article-body-commercial-selector">
            <p>First   paragraph
               spans lines.</p>
            <p>Second <a href="/x">linked</a> paragraph.</p>
            <p>   </p>
          </div>
          <div class="related"><p>Related content</p></div>
        </body></html>"#;

    #[test]
    fn test_extract_body_concatenates_matching_paragraphs() {
        let selector = parse_selector(DEFAULT_SELECTOR).unwrap();
        let body = extract_body(PAGE, &selector).unwrap();
        assert_eq!(
            body,
            "First paragraph spans lines.\nSecond linked paragraph."
        );
    }

    #[test]
    fn test_extract_body_no_match() {
        let selector = parse_selector("div.missing p").unwrap();
        assert_eq!(extract_body(PAGE, &selector), None);
    }

    #[test]
    fn test_extract_body_only_empty_matches() {
        let selector = parse_selector("p").unwrap();
        assert_eq!(extract_body("<p> </p><p>\n</p>", &selector), None);
    }

    #[test]
    fn test_parse_selector_invalid() {
        let err = parse_selector("div[").unwrap_err();
        assert!(err.to_string().contains("invalid CSS selector"));
    }

    #[tokio::test]
    async fn test_fetch_articles_keeps_disallowed_rows_without_requests() {
        let client = Client::new();
        let mut robots = RobotsCache::new(client.clone(), "news_sentiment");
        robots.insert("https://blocked.example", RobotsPolicy::DisallowAll);

        let metas = vec![
            ArticleMeta {
                url: "https://blocked.example/a".to_string(),
                published: Utc::now(),
                author: None,
                title: "A".to_string(),
                section: None,
            },
            ArticleMeta {
                url: "https://blocked.example/b".to_string(),
                published: Utc::now(),
                author: Some("B. Writer".to_string()),
                title: "B".to_string(),
                section: None,
            },
        ];

        let articles = fetch_articles(&client, metas, &PipelineConfig::default(), &mut robots)
            .await
            .unwrap();
        assert_eq!(articles.len(), 2);
        assert!(articles.iter().all(|a| a.body.is_none()));
        assert_eq!(articles[1].author.as_deref(), Some("B. Writer"));
    }

    #[tokio::test]
    async fn test_fetch_articles_rejects_bad_selector() {
        let client = Client::new();
        let mut robots = RobotsCache::new(client.clone(), "news_sentiment");
        let cfg = PipelineConfig {
            selector: "p[".to_string(),
            ..PipelineConfig::default()
        };
        assert!(fetch_articles(&client, vec![], &cfg, &mut robots).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_article_status_handling() {
        let (addr, _) = serve_pages().await;
        let client = Client::new();
        let selector = parse_selector(DEFAULT_SELECTOR).unwrap();

        let body = fetch_article(&client, &format!("http://{addr}/world/story"), &selector)
            .await
            .unwrap();
        assert_eq!(
            body.as_deref(),
            Some("First paragraph spans lines.\nSecond linked paragraph.")
        );

        let body = fetch_article(&client, &format!("http://{addr}/missing"), &selector)
            .await
            .unwrap();
        assert_eq!(body, None);
    }

    #[tokio::test]
    async fn test_fetch_articles_rows_and_delay() {
        let (addr, hits) = serve_pages().await;
        let client = Client::new();
        let mut robots = RobotsCache::new(client.clone(), "news_sentiment");
        let cfg = PipelineConfig {
            delay_ms: 300,
            ..PipelineConfig::default()
        };

        let metas = vec![
            meta(format!("http://{addr}/a")),
            meta(format!("http://{addr}/missing/b")),
            meta(format!("http://{addr}/c")),
        ];
        let started = Instant::now();
        let articles = fetch_articles(&client, metas, &cfg, &mut robots).await.unwrap();

        assert_eq!(articles.len(), 3);
        assert!(articles[0].body.is_some());
        assert_eq!(articles[1].body, None);
        assert!(articles[2].body.is_some());
        assert_eq!(articles[1].url, format!("http://{addr}/missing/b"));

        let hits = hits.lock().unwrap();
        let pages: Vec<&(String, Instant)> =
            hits.iter().filter(|(path, _)| path != "/robots.txt").collect();
        assert_eq!(pages.len(), 3);
        assert_eq!(hits.iter().filter(|(path, _)| path == "/robots.txt").count(), 1);
        for pair in pages.windows(2) {
            assert!(pair[1].1.duration_since(pair[0].1) >= Duration::from_millis(300));
        }
        // No pause before the first page request
        assert!(pages[0].1.duration_since(started) < Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_fetch_articles_network_error_keeps_row() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::new();
        let mut robots = RobotsCache::new(client.clone(), "news_sentiment");
        robots.insert(&format!("http://{addr}"), RobotsPolicy::AllowAll);

        let articles = fetch_articles(
            &client,
            vec![meta(format!("http://{addr}/gone"))],
            &PipelineConfig::default(),
            &mut robots,
        )
        .await
        .unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].body, None);
    }
}
