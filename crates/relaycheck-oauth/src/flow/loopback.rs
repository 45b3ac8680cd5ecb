//! Loopback redirect receiver for installed applications.

use std::net::SocketAddr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

const SUCCESS_PAGE: &str = "<html><body><h1>Authorization complete</h1>\
<p>You may close this window and return to the terminal.</p></body></html>";

const FAILURE_PAGE: &str = "<html><body><h1>Authorization failed</h1>\
<p>Return to the terminal for details.</p></body></html>";

/// Listens on `127.0.0.1` for the provider's redirect after consent.
#[derive(Debug)]
pub struct LoopbackReceiver {
    listener: TcpListener,
    addr: SocketAddr,
}

impl LoopbackReceiver {
    /// Binds an ephemeral port on the loopback interface.
    ///
    /// # Errors
    ///
    /// Returns an error if no port can be bound.
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;
        debug!(%addr, "loopback receiver listening");
        Ok(Self { listener, addr })
    }

    /// The redirect URI to register with the authorization request.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Waits for the redirect and returns its authorization code.
    ///
    /// Requests that carry none of `code`, `state` or `error` (a browser
    /// asking for `/favicon.ico`, say) get a 404 and are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessDenied`] if the user declined,
    /// [`Error::StateMismatch`] if `state` differs from `expected_state`,
    /// or an I/O error.
    pub async fn wait_for_code(&self, expected_state: &str) -> Result<String> {
        loop {
            let (mut socket, peer) = self.listener.accept().await?;
            let (reader, mut writer) = socket.split();

            let mut reader = BufReader::new(reader);
            let mut request_line = String::new();
            reader.read_line(&mut request_line).await?;
            skip_headers(&mut reader).await?;
            debug!(%peer, request = request_line.trim_end(), "redirect request");

            let Some(outcome) = parse_redirect(&request_line, expected_state) else {
                respond(&mut writer, "404 Not Found", "").await;
                continue;
            };

            let page = if outcome.is_ok() { SUCCESS_PAGE } else { FAILURE_PAGE };
            respond(&mut writer, "200 OK", page).await;
            return outcome;
        }
    }
}

async fn skip_headers<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 || line.trim_end().is_empty() {
            return Ok(());
        }
    }
}

async fn respond<W: AsyncWrite + Unpin>(writer: &mut W, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\n\
Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    if let Err(e) = writer.write_all(response.as_bytes()).await {
        warn!("failed to answer redirect request: {e}");
    }
    let _ = writer.shutdown().await;
}

/// Interprets the request line of a redirect.
///
/// Returns `None` when the request is not a redirect at all.
pub(crate) fn parse_redirect(request_line: &str, expected_state: &str) -> Option<Result<String>> {
    let mut parts = request_line.split_whitespace();
    let target = match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) if target.starts_with('/') => target,
        _ => return None,
    };

    let url = Url::parse(&format!("http://127.0.0.1{target}")).ok()?;
    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut description = String::new();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => description = value.into_owned(),
            _ => {}
        }
    }

    if code.is_none() && state.is_none() && error.is_none() {
        return None;
    }

    if let Some(error) = error {
        return Some(Err(if error == "access_denied" {
            Error::AccessDenied
        } else {
            Error::oauth_error(error, description)
        }));
    }

    if state.as_deref() != Some(expected_state) {
        return Some(Err(Error::StateMismatch));
    }

    Some(code.filter(|c| !c.is_empty()).ok_or(Error::MissingCode))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpStream;

    #[test]
    fn test_parse_code() {
        let line = "GET /?state=s1&code=4%2F0Adeu&scope=x HTTP/1.1\r\n";
        assert_eq!(parse_redirect(line, "s1").unwrap().unwrap(), "4/0Adeu");
    }

    #[test]
    fn test_parse_state_mismatch() {
        let line = "GET /?state=other&code=abc HTTP/1.1\r\n";
        assert!(matches!(
            parse_redirect(line, "s1"),
            Some(Err(Error::StateMismatch))
        ));
    }

    #[test]
    fn test_parse_access_denied() {
        let line = "GET /?error=access_denied&state=s1 HTTP/1.1\r\n";
        assert!(matches!(
            parse_redirect(line, "s1"),
            Some(Err(Error::AccessDenied))
        ));
    }

    #[test]
    fn test_parse_missing_code() {
        let line = "GET /?state=s1 HTTP/1.1\r\n";
        assert!(matches!(
            parse_redirect(line, "s1"),
            Some(Err(Error::MissingCode))
        ));
    }

    #[test]
    fn test_parse_ignores_unrelated_requests() {
        assert!(parse_redirect("GET /favicon.ico HTTP/1.1\r\n", "s1").is_none());
        assert!(parse_redirect("POST /?code=a&state=s1 HTTP/1.1\r\n", "s1").is_none());
        assert!(parse_redirect("", "s1").is_none());
    }

    async fn send(addr: SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_wait_for_code_skips_favicon() {
        let receiver = LoopbackReceiver::bind().await.unwrap();
        let addr = receiver.addr;
        assert!(receiver.redirect_uri().starts_with("http://127.0.0.1:"));

        let browser = tokio::spawn(async move {
            let favicon = send(addr, "GET /favicon.ico HTTP/1.1\r\nHost: x\r\n\r\n").await;
            let redirect = send(addr, "GET /?code=abc&state=s1 HTTP/1.1\r\nHost: x\r\n\r\n").await;
            (favicon, redirect)
        });

        let code = receiver.wait_for_code("s1").await.unwrap();
        assert_eq!(code, "abc");

        let (favicon, redirect) = browser.await.unwrap();
        assert!(favicon.starts_with("HTTP/1.1 404"));
        assert!(redirect.starts_with("HTTP/1.1 200"));
        assert!(redirect.contains("Authorization complete"));
    }

    #[tokio::test]
    async fn test_wait_for_code_denied() {
        let receiver = LoopbackReceiver::bind().await.unwrap();
        let addr = receiver.addr;

        let browser = tokio::spawn(async move {
            send(addr, "GET /?error=access_denied&state=s1 HTTP/1.1\r\n\r\n").await
        });

        let err = receiver.wait_for_code("s1").await.unwrap_err();
        assert!(matches!(err, Error::AccessDenied));
        assert!(browser.await.unwrap().contains("Authorization failed"));
    }
}
