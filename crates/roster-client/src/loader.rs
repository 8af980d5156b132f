use async_trait::async_trait;
use reqwest::Url;
use roster_types::{ApiUser, UserId};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("bad status: HTTP {0}")]
    Status(u16),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("load was superseded before it finished")]
    Superseded,
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::Status(404))
    }
}

/// Where users come from. The daemon talks to [`RemoteLoader`]; anything
/// else implementing this can stand in for it.
#[async_trait]
pub trait UserSource: Send + Sync {
    /// One request for the whole list. The parsed body is returned as is;
    /// shaping it into records is the store's job.
    async fn fetch_all(&self) -> Result<Value, LoadError>;

    /// One request for a single user.
    async fn fetch_one(&self, id: &UserId) -> Result<ApiUser, LoadError>;

    fn base_url(&self) -> &str;
}

/// HTTP client for `GET /users` and `GET /users/{id}`.
///
/// Every call is a single attempt: no retry, no timeout, no caching.
pub struct RemoteLoader {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteLoader {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn users_url(&self, id: Option<&UserId>) -> Result<Url, LoadError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| LoadError::InvalidUrl(e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| LoadError::InvalidUrl(self.base_url.clone()))?;
            segments.pop_if_empty().push("users");
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<Value, LoadError> {
        debug!("GET {}", url);
        let response = self.http.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("GET {} failed: HTTP {}", url, status);
            return Err(LoadError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl UserSource for RemoteLoader {
    async fn fetch_all(&self) -> Result<Value, LoadError> {
        let url = self.users_url(None)?;
        self.get_json(url).await
    }

    async fn fetch_one(&self, id: &UserId) -> Result<ApiUser, LoadError> {
        let url = self.users_url(Some(id))?;
        let body = self.get_json(url).await?;
        Ok(serde_json::from_value(body)?)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves `status` + `body` to every connection and records request lines.
    async fn serve(status: &'static str, body: &'static str) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_server = Arc::clone(&seen);

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&request);
                let request_line = request.lines().next().unwrap_or("").to_string();
                seen_by_server.lock().unwrap().push(request_line);

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (format!("http://{}", addr), seen)
    }

    #[tokio::test]
    async fn test_fetch_all_returns_body_unmodified() {
        let body = r#"[{"id":1,"name":"Leanne Graham","email":"Sincere@april.biz","company":{"name":"Romaguera-Crona"}},{"id":2,"name":"Ervin Howell","email":"Shanna@melissa.tv"}]"#;
        let (base_url, seen) = serve("200 OK", body).await;
        let loader = RemoteLoader::new(format!("{}/", base_url));

        let users = loader.fetch_all().await.unwrap();

        assert_eq!(users, serde_json::from_str::<Value>(body).unwrap());
        assert_eq!(seen.lock().unwrap().as_slice(), ["GET /users HTTP/1.1"]);
    }

    #[tokio::test]
    async fn test_fetch_one_parses_user() {
        let body = r#"{"id":3,"name":"Clementine Bauch","email":"Nathan@yesenia.net","phone":"1-463-123-4447","website":"ramiro.info","address":{"street":"Douglas Extension","suite":"Suite 847","city":"McKenziehaven","zipcode":"59590-4157"}}"#;
        let (base_url, seen) = serve("200 OK", body).await;
        let loader = RemoteLoader::new(base_url);

        let user = loader.fetch_one(&UserId::from("3")).await.unwrap();

        assert_eq!(user.id, Some(UserId::from("3")));
        assert_eq!(user.name, "Clementine Bauch");
        assert_eq!(user.website.as_deref(), Some("ramiro.info"));
        assert_eq!(seen.lock().unwrap().as_slice(), ["GET /users/3 HTTP/1.1"]);
    }

    #[tokio::test]
    async fn test_non_success_status_is_load_error() {
        let (base_url, _) = serve("404 Not Found", "{}").await;
        let loader = RemoteLoader::new(base_url);

        let err = loader.fetch_one(&UserId::from("999")).await.unwrap_err();
        assert!(err.is_not_found());

        let (base_url, _) = serve("500 Internal Server Error", "oops").await;
        let loader = RemoteLoader::new(base_url);
        let err = loader.fetch_all().await.unwrap_err();
        assert!(matches!(err, LoadError::Status(500)));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_garbage_body_is_decode_error() {
        let (base_url, _) = serve("200 OK", "<html>").await;
        let loader = RemoteLoader::new(base_url);
        assert!(matches!(
            loader.fetch_all().await,
            Err(LoadError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let loader = RemoteLoader::new(format!("http://{}", addr));
        assert!(matches!(
            loader.fetch_all().await,
            Err(LoadError::Transport(_))
        ));
    }

    #[test]
    fn test_id_is_path_escaped() {
        let loader = RemoteLoader::new("http://example.test/api/");
        let url = loader.users_url(Some(&UserId::from("a/b c"))).unwrap();
        assert_eq!(url.as_str(), "http://example.test/api/users/a%2Fb%20c");
    }
}
