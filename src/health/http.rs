// ABOUTME: HTTP health probe against a published host port on loopback.
// ABOUTME: Any 2xx response counts as healthy; connect and protocol errors do not.

use super::Probe;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Empty;
use hyper::Request;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

/// Probes `http://127.0.0.1:{port}{path}` with a GET request.
pub struct HttpProbe {
    port: u16,
    path: String,
}

impl HttpProbe {
    pub fn new(port: u16, path: impl Into<String>) -> Self {
        Self {
            port,
            path: path.into(),
        }
    }

    async fn request(&self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let addr = format!("127.0.0.1:{}", self.port);
        let stream = TcpStream::connect(&addr).await?;
        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("health probe connection error: {e}");
            }
        });

        let request = Request::builder()
            .uri(self.path.as_str())
            .header(hyper::header::HOST, addr)
            .body(Empty::<Bytes>::new())?;

        let response = sender.send_request(request).await?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn check(&self) -> bool {
        match self.request().await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::debug!(port = self.port, path = %self.path, "health probe failed: {e}");
                false
            }
        }
    }
}
