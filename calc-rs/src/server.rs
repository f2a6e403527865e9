//! HTTP server for the web calculator.
//!
//! Serves the UI's static files from a root directory and exposes the
//! arithmetic core at `GET /api/evaluate`, so the browser never carries its
//! own copy of the operations.
//!
//! Each accepted connection runs in its own [`tokio::spawn`]ed task and
//! handles exactly one request (`Connection: close`).
//!
//! | Request | Response |
//! |---------|----------|
//! | `GET /` | `index.html` |
//! | `GET /<path>` | file under the root; `404` if missing or escaping the root |
//! | `GET /api/evaluate?op=add&a=2&b=3` | `{"ok":true,"operation":"add","result":5.0,"display":"5"}` |
//! | `GET /api/evaluate?op=div&a=1&b=0` | `400` `{"ok":false,"error":"divide_by_zero","message":…}` |
//! | other methods | `405` |

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::display::{format_rounded, DEFAULT_PRECISION};
use crate::error::CalcError;
use crate::eval;
use crate::op;

/// Upper bound on the request line plus headers.
const MAX_HEAD_BYTES: usize = 16 * 1024;

/// How much of an oversized request is read and discarded after the 400.
const DRAIN_BYTES: u64 = 1024 * 1024;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

// ── Response ──────────────────────────────────────────────────────────────────

/// A complete HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.as_bytes().to_vec(),
        }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(e) => {
                warn!(error = %e, "cannot encode response");
                Self::text(500, "500 - Internal Server Error")
            }
        }
    }

    fn not_found() -> Self {
        Self::text(404, "404 - File Not Found")
    }

    /// Serialise status line, headers and (unless `head_only`) the body.
    pub fn to_bytes(&self, head_only: bool) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            self.status,
            reason(self.status),
            self.content_type,
            self.body.len(),
        );
        if self.status == 405 {
            out.push_str("Allow: GET, HEAD\r\n");
        }
        out.push_str("\r\n");
        let mut bytes = out.into_bytes();
        if !head_only {
            bytes.extend_from_slice(&self.body);
        }
        bytes
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        _ => "Internal Server Error",
    }
}

/// MIME type for a file path, by extension.
pub fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        _ => "text/plain",
    }
}

// ── Routing ───────────────────────────────────────────────────────────────────

/// Produce the response for one request.  No socket involved.
pub async fn respond(root: &Path, method: &str, target: &str) -> Response {
    if method != "GET" && method != "HEAD" {
        return Response::text(405, "405 - Method Not Allowed");
    }

    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    if path == "/api/evaluate" {
        return api_evaluate(query);
    }

    match resolve_static(root, path) {
        Some(file) => serve_file(&file).await,
        None => Response::not_found(),
    }
}

/// Map a request path to a file under `root`.
///
/// Returns `None` for undecodable paths and for any path containing `..`,
/// a root, or a prefix component, so nothing outside `root` is reachable.
pub fn resolve_static(root: &Path, path: &str) -> Option<PathBuf> {
    let decoded = percent_decode(path)?;
    let mut relative = decoded.trim_start_matches('/').to_owned();
    if relative.is_empty() || relative.ends_with('/') {
        relative.push_str("index.html");
    }

    let relative = Path::new(&relative);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(relative))
}

async fn serve_file(file: &Path) -> Response {
    match tokio::fs::read(file).await {
        Ok(body) => Response {
            status: 200,
            content_type: content_type(file),
            body,
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => Response::not_found(),
        Err(e) => {
            warn!(path = %file.display(), error = %e, "cannot read file");
            Response::text(500, "500 - Internal Server Error")
        }
    }
}

/// Decode `%XX` escapes.  Returns `None` on a malformed escape or non-UTF-8.
fn percent_decode(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = s.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

// ── /api/evaluate ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EvalQuery {
    op: String,
    a: Option<String>,
    b: Option<String>,
}

#[derive(Debug, Serialize)]
struct EvalOk {
    ok: bool,
    operation: &'static str,
    result: f64,
    display: String,
}

#[derive(Debug, Serialize)]
struct EvalErr {
    ok: bool,
    error: &'static str,
    message: String,
}

fn bad_request(message: String) -> Response {
    Response::json(
        400,
        &EvalErr {
            ok: false,
            error: "bad_request",
            message,
        },
    )
}

fn api_evaluate(query: &str) -> Response {
    let q: EvalQuery = match serde_urlencoded::from_str(query) {
        Ok(q) => q,
        Err(e) => return bad_request(e.to_string()),
    };
    let operands: Vec<String> = match (q.a, q.b) {
        (None, Some(_)) => return bad_request("operand 'b' given without 'a'".to_owned()),
        (a, b) => a.into_iter().chain(b).collect(),
    };

    let outcome = op::resolve(&q.op)
        .and_then(|op| eval::evaluate_with(op, &operands).map(|result| (op, result)));
    match outcome {
        Ok((op, result)) => Response::json(
            200,
            &EvalOk {
                ok: true,
                operation: op.name(),
                result,
                display: format_rounded(result, DEFAULT_PRECISION),
            },
        ),
        Err(e) => {
            debug!(op = %q.op, ?operands, error = %e, "api evaluation failed");
            Response::json(400, &api_error(&e))
        }
    }
}

fn api_error(e: &CalcError) -> EvalErr {
    EvalErr {
        ok: false,
        error: e.kind(),
        message: e.to_string(),
    }
}

// ── Server ────────────────────────────────────────────────────────────────────

/// A bound, not yet running, server.
pub struct Server {
    listener: TcpListener,
    root: Arc<PathBuf>,
}

impl Server {
    /// Bind to `addr` and serve files from `root`.
    ///
    /// A missing root is only logged: the API keeps working and file
    /// requests answer `404`.
    pub async fn bind(addr: SocketAddr, root: impl Into<PathBuf>) -> Result<Self, ServeError> {
        let root = root.into();
        if !root.is_dir() {
            warn!(root = %root.display(), "static root is not a directory");
        }
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServeError::Bind { addr, source })?;
        Ok(Self {
            listener,
            root: Arc::new(root),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> Result<(), ServeError> {
        self.run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Serve until `shutdown` completes.  In-flight connections are not awaited.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<(), ServeError> {
        info!(addr = %self.local_addr()?, root = %self.root.display(), "serving");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let root = Arc::clone(&self.root);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, &root).await {
                                    debug!(%peer, error = %e, "connection error");
                                }
                            });
                        }
                        // Usually transient (e.g. out of file descriptors).
                        Err(e) => warn!(error = %e, "accept failed"),
                    }
                }
                _ = &mut shutdown => break,
            }
        }
        info!("server stopped");
        Ok(())
    }
}

/// Read one request from `stream`, answer it, and close.
pub async fn handle_connection(stream: TcpStream, root: &Path) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    // One byte past the limit tells an oversized head from one that fits exactly.
    let mut reader = BufReader::new(reader.take(MAX_HEAD_BYTES as u64 + 1));

    let Some(request_line) = read_head(&mut reader).await? else {
        warn!(limit = MAX_HEAD_BYTES, "request head too large");
        writer
            .write_all(&Response::text(400, "400 - Bad Request").to_bytes(false))
            .await?;
        writer.shutdown().await?;
        // Closing with unread input would reset the connection under the reply.
        let mut rest = reader.into_inner().into_inner().take(DRAIN_BYTES);
        tokio::io::copy(&mut rest, &mut tokio::io::sink()).await?;
        return Ok(());
    };

    let mut parts = request_line.split_whitespace();
    let (response, head_only) = match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(target), Some(version)) if version.starts_with("HTTP/") => {
            let response = respond(root, method, target).await;
            info!(method, target, status = response.status, "request");
            (response, method == "HEAD")
        }
        _ => (Response::text(400, "400 - Bad Request"), false),
    };

    writer.write_all(&response.to_bytes(head_only)).await?;
    writer.shutdown().await
}

/// Read the request line and skip the headers up to the blank line.
///
/// Returns `None` once more than [`MAX_HEAD_BYTES`] have been read without
/// finishing the head; `reader` should be limited to one byte past that so a
/// client that never sends a newline cannot grow the buffer.  The body, if
/// any, is left unread.
async fn read_head<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut request_line = Vec::new();
    let mut total = reader.read_until(b'\n', &mut request_line).await?;

    let mut header = Vec::new();
    while total <= MAX_HEAD_BYTES && request_line.ends_with(b"\n") {
        header.clear();
        let n = reader.read_until(b'\n', &mut header).await?;
        total += n;
        if n == 0 || matches!(header.as_slice(), b"\r\n" | b"\n") {
            break;
        }
    }

    if total > MAX_HEAD_BYTES {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&request_line).into_owned()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn json(resp: &Response) -> serde_json::Value {
        serde_json::from_slice(&resp.body).unwrap()
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type(Path::new("index.html")), "text/html");
        assert_eq!(content_type(Path::new("a/style.css")), "text/css");
        assert_eq!(content_type(Path::new("app.js")), "text/javascript");
        assert_eq!(content_type(Path::new("data.json")), "application/json");
        assert_eq!(content_type(Path::new("README")), "text/plain");
    }

    #[test]
    fn static_paths() {
        let root = Path::new("/srv");
        assert_eq!(resolve_static(root, "/"), Some(PathBuf::from("/srv/index.html")));
        assert_eq!(resolve_static(root, "/app.js"), Some(PathBuf::from("/srv/app.js")));
        assert_eq!(
            resolve_static(root, "/docs/"),
            Some(PathBuf::from("/srv/docs/index.html"))
        );
        assert_eq!(
            resolve_static(root, "/my%20file.txt"),
            Some(PathBuf::from("/srv/my file.txt"))
        );
    }

    #[test]
    fn static_paths_cannot_escape_root() {
        let root = Path::new("/srv");
        assert_eq!(resolve_static(root, "/../etc/passwd"), None);
        assert_eq!(resolve_static(root, "/a/../../etc/passwd"), None);
        assert_eq!(resolve_static(root, "/%2e%2e/etc/passwd"), None);
        assert_eq!(resolve_static(root, "//etc/passwd"), Some(PathBuf::from("/srv/etc/passwd")));
        assert_eq!(resolve_static(root, "/bad%zzescape"), None);
    }

    #[test]
    fn percent_decoding() {
        assert_eq!(percent_decode("a%2Bb").as_deref(), Some("a+b"));
        assert_eq!(percent_decode("%E2%88%9A").as_deref(), Some("√"));
        assert_eq!(percent_decode("%4"), None);
        assert_eq!(percent_decode("%FF"), None);
    }

    #[test]
    fn response_bytes() {
        let r = Response::text(404, "404 - File Not Found");
        let s = String::from_utf8(r.to_bytes(false)).unwrap();
        assert!(s.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(s.contains("Content-Length: 20\r\n"));
        assert!(s.ends_with("\r\n\r\n404 - File Not Found"));

        let head = String::from_utf8(r.to_bytes(true)).unwrap();
        assert!(head.ends_with("\r\n\r\n"));
    }

    #[test]
    fn api_success() {
        let r = api_evaluate("op=add&a=2&b=3");
        assert_eq!(r.status, 200);
        assert_eq!(r.content_type, "application/json");
        let v = json(&r);
        assert_eq!(v["ok"], true);
        assert_eq!(v["operation"], "add");
        assert_eq!(v["result"], 5.0);
        assert_eq!(v["display"], "5");
    }

    #[test]
    fn api_symbols_must_be_escaped() {
        let v = json(&api_evaluate("op=%2B&a=7&b=8"));
        assert_eq!(v["operation"], "add");
        assert_eq!(v["result"], 15.0);
        let v = json(&api_evaluate("op=%E2%88%9A&a=81"));
        assert_eq!(v["operation"], "sqrt");
        assert_eq!(v["result"], 9.0);
    }

    #[test]
    fn api_display_is_rounded() {
        let v = json(&api_evaluate("op=add&a=0.1&b=0.2"));
        assert_eq!(v["display"], "0.3");
    }

    #[test]
    fn api_errors() {
        let r = api_evaluate("op=divide&a=10&b=0");
        assert_eq!(r.status, 400);
        let v = json(&r);
        assert_eq!(v["ok"], false);
        assert_eq!(v["error"], "divide_by_zero");
        assert_eq!(v["message"], "Division by zero is not allowed");

        assert_eq!(json(&api_evaluate("op=foo&a=1&b=2"))["error"], "unknown_operation");
        assert_eq!(json(&api_evaluate("op=sqrt&a=4&b=1"))["error"], "arity_mismatch");
        assert_eq!(json(&api_evaluate("op=add&a=x&b=1"))["error"], "invalid_operand");
        assert_eq!(json(&api_evaluate("a=1&b=2"))["error"], "bad_request");
    }

    #[test]
    fn api_second_operand_needs_first() {
        let r = api_evaluate("op=sqrt&b=9");
        assert_eq!(r.status, 400);
        assert_eq!(json(&r)["error"], "bad_request");
        assert_eq!(json(&api_evaluate("op=add&b=1"))["error"], "bad_request");
        // `a` alone still reaches the arity check.
        assert_eq!(json(&api_evaluate("op=add&a=1"))["error"], "arity_mismatch");
        assert_eq!(json(&api_evaluate("op=sqrt&a=9"))["result"], 3.0);
    }

    // ── request head ──────────────────────────────────────────────────────────

    fn limited(bytes: &[u8]) -> BufReader<tokio::io::Take<&[u8]>> {
        BufReader::new(bytes.take(MAX_HEAD_BYTES as u64 + 1))
    }

    #[tokio::test]
    async fn head_skips_headers() {
        let raw = b"GET /a HTTP/1.1\r\nHost: x\r\nAccept: */*\r\n\r\nbody";
        let line = read_head(&mut limited(raw)).await.unwrap();
        assert_eq!(line.as_deref(), Some("GET /a HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn head_without_newline_is_bounded() {
        let mut raw = b"GET /".to_vec();
        raw.extend(std::iter::repeat(b'A').take(MAX_HEAD_BYTES * 4));
        assert_eq!(read_head(&mut limited(&raw)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn head_with_oversized_headers() {
        let mut raw = b"GET / HTTP/1.1\r\n".to_vec();
        for _ in 0..(MAX_HEAD_BYTES / 64 + 1) {
            raw.extend_from_slice(format!("X-Fill: {}\r\n", "a".repeat(54)).as_bytes());
        }
        raw.extend_from_slice(b"\r\n");
        assert!(raw.len() > MAX_HEAD_BYTES);
        assert_eq!(read_head(&mut limited(&raw)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn head_just_under_limit() {
        let mut raw = b"GET / HTTP/1.1\r\n".to_vec();
        let fill = MAX_HEAD_BYTES - raw.len() - "X: \r\n\r\n".len();
        raw.extend_from_slice(format!("X: {}\r\n\r\n", "a".repeat(fill)).as_bytes());
        assert_eq!(raw.len(), MAX_HEAD_BYTES);
        let line = read_head(&mut limited(&raw)).await.unwrap();
        assert_eq!(line.as_deref(), Some("GET / HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn head_invalid_utf8_is_lossy() {
        let line = read_head(&mut limited(b"GET /\xff HTTP/1.1\r\n\r\n")).await.unwrap();
        assert_eq!(line.as_deref(), Some("GET /\u{fffd} HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn respond_rejects_other_methods() {
        let r = respond(Path::new("/nonexistent"), "POST", "/").await;
        assert_eq!(r.status, 405);
        assert!(String::from_utf8(r.to_bytes(true)).unwrap().contains("Allow: GET, HEAD"));
    }

    #[tokio::test]
    async fn respond_serves_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>calc</h1>").unwrap();

        let r = respond(dir.path(), "GET", "/").await;
        assert_eq!(r.status, 200);
        assert_eq!(r.content_type, "text/html");
        assert_eq!(r.body, b"<h1>calc</h1>");

        let r = respond(dir.path(), "GET", "/missing.js").await;
        assert_eq!(r.status, 404);
        assert_eq!(r.body, b"404 - File Not Found");
    }
}
