use crate::{SearchError, TrackCatalog};
use async_trait::async_trait;
use guess_that_song_core::{urls, SearchConfig, Track, TrackPool};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Client for an iTunes-compatible `/search` endpoint.
pub struct ItunesCatalog {
    http: reqwest::Client,
    base_url: String,
    media: String,
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<RawResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResult {
    track_id: Option<u64>,
    track_name: Option<String>,
    artist_name: Option<String>,
    collection_name: Option<String>,
    preview_url: Option<String>,
}

impl RawResult {
    fn into_track(self) -> Option<Track> {
        let id = self.track_id?;
        let preview_url = self.preview_url.filter(|u| !u.trim().is_empty())?;
        Some(Track {
            id,
            title: self
                .track_name
                .unwrap_or_else(|| "Unknown Title".to_string()),
            artist: self
                .artist_name
                .unwrap_or_else(|| "Unknown Artist".to_string()),
            album: self.collection_name,
            preview_url,
        })
    }
}

impl ItunesCatalog {
    pub fn new(cfg: &SearchConfig) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.clone(),
            media: cfg.media.clone(),
            limit: cfg.limit,
        })
    }

    pub fn search_url(&self, term: &str) -> Result<Url, SearchError> {
        Ok(urls::search_url(
            &self.base_url,
            term,
            &self.media,
            self.limit,
        )?)
    }
}

fn parse_results(body: &[u8]) -> Result<Vec<Track>, SearchError> {
    let parsed: SearchResponse = serde_json::from_slice(body)?;
    Ok(parsed
        .results
        .into_iter()
        .filter_map(RawResult::into_track)
        .collect())
}

#[async_trait]
impl TrackCatalog for ItunesCatalog {
    fn name(&self) -> &'static str {
        "itunes"
    }

    async fn search(&self, term: &str) -> Result<TrackPool, SearchError> {
        // The term goes out exactly as typed; only an all-blank one is refused.
        if term.trim().is_empty() {
            return Err(SearchError::EmptyTerm);
        }

        let url = self.search_url(term)?;
        debug!(%url, "searching catalog");

        let response = self.http.get(url).send().await.map_err(|err| {
            warn!(error=%err, "search request failed");
            SearchError::Transport(err)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "search endpoint returned an error status");
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|err| {
            warn!(error=%err, "failed reading search response body");
            SearchError::Transport(err)
        })?;
        let candidates = parse_results(&body).map_err(|err| {
            warn!(error=%err, "search response was not usable");
            err
        })?;

        let pool = TrackPool::new(candidates)?;
        info!(term, playable = pool.len(), "search returned playable tracks");
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_results, ItunesCatalog};
    use crate::{SearchError, TrackCatalog};
    use guess_that_song_core::SearchConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn result_json(id: u64, preview: Option<&str>) -> String {
        match preview {
            Some(url) => format!(
                r#"{{"wrapperType":"track","trackId":{id},"trackName":"Song {id}","artistName":"Band","collectionName":"Album","previewUrl":"{url}"}}"#
            ),
            None => format!(r#"{{"wrapperType":"track","trackId":{id},"trackName":"Song {id}","artistName":"Band"}}"#),
        }
    }

    fn body_with(results: &[String]) -> String {
        format!(
            r#"{{"resultCount":{},"results":[{}]}}"#,
            results.len(),
            results.join(",")
        )
    }

    /// Serves a single canned HTTP response and hands back the raw request.
    async fn serve_once(status_line: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "{status_line}\r\nContent-Type: text/javascript; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    fn catalog(base_url: String) -> ItunesCatalog {
        ItunesCatalog::new(&SearchConfig {
            base_url,
            timeout_ms: 5_000,
            ..SearchConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn parse_skips_results_without_preview_or_id() {
        let body = body_with(&[
            result_json(1, Some("https://example.com/1.m4a")),
            result_json(2, None),
            result_json(3, Some("")),
            r#"{"wrapperType":"collection","collectionName":"Album","previewUrl":"https://example.com/c.m4a"}"#.to_string(),
            result_json(4, Some("https://example.com/4.m4a")),
        ]);

        let tracks = parse_results(body.as_bytes()).unwrap();
        let ids: Vec<u64> = tracks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(tracks[0].album.as_deref(), Some("Album"));
    }

    #[test]
    fn parse_fills_missing_names() {
        let body = r#"{"results":[{"trackId":9,"previewUrl":"https://example.com/9.m4a"}]}"#;
        let tracks = parse_results(body.as_bytes()).unwrap();
        assert_eq!(tracks[0].title, "Unknown Title");
        assert_eq!(tracks[0].artist, "Unknown Artist");
    }

    #[test]
    fn parse_rejects_non_json_and_missing_results() {
        assert!(matches!(
            parse_results(b"<html>oops</html>"),
            Err(SearchError::Decode(_))
        ));
        assert!(matches!(
            parse_results(br#"{"errorMessage":"Invalid value(s) for key(s)"}"#),
            Err(SearchError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn search_sends_one_encoded_request_and_builds_pool() {
        let results: Vec<String> = (1..=40)
            .map(|id| result_json(id, Some(&format!("https://example.com/{id}.m4a"))))
            .chain(std::iter::once(result_json(41, None)))
            .collect();
        let (base, server) = serve_once("HTTP/1.1 200 OK", body_with(&results)).await;

        let pool = catalog(base).search("Pop & Soul").await.unwrap();
        assert_eq!(pool.len(), 40);

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap_or_default();
        assert_eq!(
            request_line,
            "GET /search?term=Pop%20%26%20Soul&media=music&limit=50 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn search_reports_too_few_playable_tracks() {
        let body = body_with(&[
            result_json(1, Some("https://example.com/1.m4a")),
            result_json(2, Some("https://example.com/2.m4a")),
            result_json(3, None),
        ]);
        let (base, server) = serve_once("HTTP/1.1 200 OK", body).await;

        let err = catalog(base).search("Rock").await.unwrap_err();
        assert!(err.is_insufficient());
        assert!(matches!(err, SearchError::NotEnoughTracks { found: 2, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn search_maps_error_status() {
        let (base, server) = serve_once("HTTP/1.1 503 Service Unavailable", String::new()).await;

        let err = catalog(base).search("Jazz").await.unwrap_err();
        assert!(matches!(err, SearchError::Status(503)));
        assert!(!err.is_insufficient());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn search_maps_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = catalog(format!("http://{addr}"))
            .search("Jazz")
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Transport(_)));
    }

    #[tokio::test]
    async fn search_rejects_blank_term_without_request() {
        let err = catalog("http://127.0.0.1:9".to_string())
            .search("   ")
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::EmptyTerm));
    }

    #[tokio::test]
    async fn search_sends_term_untrimmed() {
        let results: Vec<String> = (1..=3)
            .map(|id| result_json(id, Some(&format!("https://example.com/{id}.m4a"))))
            .collect();
        let (base, server) = serve_once("HTTP/1.1 200 OK", body_with(&results)).await;

        catalog(base).search(" Pop ").await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /search?term=%20Pop%20&media=music&limit=50 HTTP/1.1"));
    }
}
