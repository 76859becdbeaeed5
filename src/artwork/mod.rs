//! Artwork download with bounded retries and a bundled fallback.
//!
//! Cover art is cosmetic, so [`ArtworkFetcher::fetch`] never fails: after the
//! last attempt it hands back the placeholder shipped in `assets/`.

use image::DynamicImage;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Placeholder shown when no cover could be downloaded.
pub const FALLBACK_PNG: &[u8] = include_bytes!("../../assets/fallback.png");

static FALLBACK: LazyLock<Artwork> = LazyLock::new(|| {
    let image = image::load_from_memory(FALLBACK_PNG)
        .unwrap_or_else(|_| DynamicImage::new_luma8(75, 75));
    Artwork {
        bytes: Arc::from(FALLBACK_PNG),
        image: Arc::new(image),
    }
});

/// Encoded cover bytes together with their decoded image.
#[derive(Clone)]
pub struct Artwork {
    bytes: Arc<[u8]>,
    image: Arc<DynamicImage>,
}

impl Artwork {
    pub fn decode(bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let image = image::load_from_memory(&bytes)?;
        Ok(Self {
            bytes: Arc::from(bytes),
            image: Arc::new(image),
        })
    }

    pub fn fallback() -> Self {
        FALLBACK.clone()
    }

    #[cfg(test)]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn is_fallback(&self) -> bool {
        *self.bytes == *FALLBACK_PNG
    }
}

impl PartialEq for Artwork {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl std::fmt::Debug for Artwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artwork")
            .field("bytes", &self.bytes.len())
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("undecodable image: {0}")]
    Decode(#[from] image::ImageError),
}

#[derive(Debug, Clone)]
pub struct ArtworkFetcher {
    http: reqwest::Client,
    policy: RetryPolicy,
    cache: Arc<Mutex<LruCache<String, Artwork>>>,
}

impl ArtworkFetcher {
    const CACHE_ENTRIES: usize = 64;

    pub fn new(http: reqwest::Client) -> Self {
        Self::with_policy(http, RetryPolicy::default())
    }

    pub fn with_policy(http: reqwest::Client, policy: RetryPolicy) -> Self {
        let cap = NonZeroUsize::new(Self::CACHE_ENTRIES).unwrap_or(NonZeroUsize::MIN);
        Self {
            http,
            policy,
            cache: Arc::new(Mutex::new(LruCache::new(cap))),
        }
    }

    /// Fetch the image at `url`, falling back to the bundled placeholder once
    /// every attempt has failed.
    pub async fn fetch(&self, url: &str) -> Artwork {
        if let Some(hit) = self.cached(url) {
            debug!(url, "artwork cache hit");
            return hit;
        }

        debug!(url, "fetching artwork");
        for attempt in 1..=self.policy.attempts {
            match self.attempt(url).await {
                Ok(artwork) => {
                    if let Ok(mut cache) = self.cache.lock() {
                        cache.put(url.to_string(), artwork.clone());
                    }
                    return artwork;
                }
                Err(e) => warn!(url, attempt, "artwork fetch failed: {e}"),
            }
        }

        error!(
            url,
            attempts = self.policy.attempts,
            "all artwork attempts failed, using fallback image"
        );
        Artwork::fallback()
    }

    async fn attempt(&self, url: &str) -> Result<Artwork, AttemptError> {
        let request = async {
            let response = self.http.get(url).send().await?.error_for_status()?;
            Ok::<_, reqwest::Error>(response.bytes().await?)
        };
        let body = tokio::time::timeout(self.policy.timeout, request)
            .await
            .map_err(|_| AttemptError::Timeout(self.policy.timeout))??;
        Ok(Artwork::decode(body.to_vec())?)
    }

    fn cached(&self, url: &str) -> Option<Artwork> {
        self.cache.lock().ok()?.get(url).cloned()
    }
}

/// Loopback HTTP responder shared by the network tests.
#[cfg(test)]
pub(crate) mod test_http {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[derive(Debug, Clone)]
    pub struct Reply {
        pub status: u16,
        pub body: Vec<u8>,
    }

    impl Reply {
        pub fn ok(body: impl Into<Vec<u8>>) -> Self {
            Self { status: 200, body: body.into() }
        }

        pub fn error(status: u16) -> Self {
            Self { status, body: Vec::new() }
        }
    }

    /// Serve `respond(request_index, raw_request)` for every incoming
    /// connection. Returns the base URL and a request counter.
    pub async fn serve<F>(respond: F) -> (String, Arc<AtomicUsize>)
    where
        F: Fn(usize, &str) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let respond = Arc::new(respond);

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let respond = respond.clone();
                tokio::spawn(async move {
                    let request = read_request(&mut stream).await;
                    let reply = respond(n, &request);
                    let head = format!(
                        "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        reply.status,
                        reply.body.len()
                    );
                    let _ = stream.write_all(head.as_bytes()).await;
                    let _ = stream.write_all(&reply.body).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        (format!("http://{addr}"), hits)
    }

    /// Accept connections and never answer. Returns the base URL and a
    /// connection counter.
    pub async fn stall() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                held.push(stream);
            }
        });

        (format!("http://{addr}"), accepted)
    }

    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}
