//! Development preview server.
//!
//! Binds a [`RequestHandler`] chain to HTTP with `tiny_http`. Requests are
//! handed to a fixed-size `rayon` pool so a slow render does not hold up the
//! rest of the page. The chain the CLI builds is
//!
//! ```text
//! ThumbnailProxy ──wraps──► StaticFiles(source_dir)
//! ```
//!
//! Handler errors become `500 Internal Server Error` with the error text as
//! the body.

use crate::config::ServeConfig;
use crate::host::{HandlerError, Request, RequestHandler, Response};
use crate::proxy::resolve_request_path;
use std::io::Cursor;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("cannot listen on {addr}: {message}")]
    Bind { addr: String, message: String },
    #[error("cannot start request workers: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("cannot install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// A request the handler chain failed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailure {
    pub path: String,
    pub error: String,
}

/// Serves files under a root directory; everything else is 404.
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl RequestHandler for StaticFiles {
    fn call(&self, request: &Request) -> Result<Response, HandlerError> {
        let Some(mut path) = resolve_request_path(&self.root, &request.path) else {
            return Ok(Response::not_found());
        };
        if path.is_dir() {
            path.push("index.html");
        }
        if !path.is_file() {
            return Ok(Response::not_found());
        }

        let body = std::fs::read(&path)?;
        let mime = mime_guess::from_path(&path).first_or_octet_stream();
        Ok(Response::new(200)
            .with_header("Content-Type", mime.as_ref())
            .with_header("Content-Length", &body.len().to_string())
            .with_body(body))
    }
}

/// A bound listener, not yet accepting requests.
pub struct Server {
    http: Arc<tiny_http::Server>,
    addr: SocketAddr,
}

impl Server {
    pub fn bind(config: &ServeConfig) -> Result<Self, ServeError> {
        let addr = format!("{}:{}", config.interface, config.port);
        let bind_error = |message: String| ServeError::Bind {
            addr: addr.clone(),
            message,
        };
        let http = tiny_http::Server::http(&addr).map_err(|e| bind_error(e.to_string()))?;
        let local = http
            .server_addr()
            .to_ip()
            .ok_or_else(|| bind_error("not an IP listener".into()))?;
        Ok(Self {
            http: Arc::new(http),
            addr: local,
        })
    }

    /// The address actually bound (resolves port 0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Handle that stops [`run`](Self::run) via `unblock()`.
    pub fn shutdown_handle(&self) -> Arc<tiny_http::Server> {
        Arc::clone(&self.http)
    }

    /// Make Ctrl-C end [`run`](Self::run) instead of the process.
    ///
    /// Installs the process-wide handler, so it succeeds once per process.
    pub fn stop_on_ctrlc(&self) -> Result<(), ServeError> {
        let stop = self.shutdown_handle();
        ctrlc::set_handler(move || stop.unblock())?;
        Ok(())
    }

    /// Accept requests until the server is unblocked.
    pub fn run(
        self,
        handler: Arc<dyn RequestHandler>,
        workers: usize,
        failures: Option<Sender<RequestFailure>>,
    ) -> Result<(), ServeError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("serve-{i}"))
            .build()?;

        for request in self.http.incoming_requests() {
            let handler = Arc::clone(&handler);
            let failures = failures.clone();
            pool.spawn(move || respond(request, handler.as_ref(), failures.as_ref()));
        }
        Ok(())
    }
}

fn respond(
    request: tiny_http::Request,
    handler: &dyn RequestHandler,
    failures: Option<&Sender<RequestFailure>>,
) {
    let req = Request {
        method: request.method().to_string(),
        path: request.url().to_string(),
    };
    let response = handler.call(&req).unwrap_or_else(|e| {
        if let Some(tx) = failures {
            tx.send(RequestFailure {
                path: req.path.clone(),
                error: e.to_string(),
            })
            .ok();
        }
        Response::new(500)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(e.to_string().into_bytes())
    });

    // tiny_http writes Content-Length from the body length itself
    let headers = response
        .headers
        .iter()
        .filter(|(name, _)| !name.eq_ignore_ascii_case("content-length"))
        .filter_map(|(name, value)| {
            tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
        })
        .collect();
    let length = response.body.len();
    let reply = tiny_http::Response::new(
        tiny_http::StatusCode(response.status),
        headers,
        Cursor::new(response.body),
        Some(length),
        None,
    )
    .with_chunked_threshold(usize::MAX);
    // Client hung up; nothing to report
    request.respond(reply).ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use tempfile::TempDir;

    #[test]
    fn static_files_serves_existing_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("style.css"), b"body {}").unwrap();

        let response = StaticFiles::new(tmp.path())
            .call(&Request::get("/style.css"))
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.header("Content-Type"), Some("text/css"));
        assert_eq!(response.body, b"body {}");
    }

    #[test]
    fn static_files_serves_directory_index() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("blog")).unwrap();
        fs::write(tmp.path().join("blog/index.html"), b"<p>hi</p>").unwrap();

        let response = StaticFiles::new(tmp.path())
            .call(&Request::get("/blog/"))
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.header("Content-Type"), Some("text/html"));
    }

    #[test]
    fn static_files_missing_is_404() {
        let tmp = TempDir::new().unwrap();
        let response = StaticFiles::new(tmp.path())
            .call(&Request::get("/nope.png"))
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[test]
    fn static_files_rejects_traversal() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        fs::create_dir_all(&root).unwrap();
        fs::write(tmp.path().join("secret.txt"), b"secret").unwrap();

        let response = StaticFiles::new(&root)
            .call(&Request::get("/../secret.txt"))
            .unwrap();
        assert_eq!(response.status, 404);
    }

    fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        write!(
            stream,
            "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
        )
        .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).unwrap();
        raw
    }

    #[test]
    fn server_maps_handler_errors_to_500() {
        let config = ServeConfig {
            port: 0,
            ..ServeConfig::default()
        };
        let server = Server::bind(&config).unwrap();
        let addr = server.addr();
        let stop = server.shutdown_handle();

        let handler: Arc<dyn RequestHandler> =
            Arc::new(|request: &Request| -> Result<Response, HandlerError> {
                if request.path == "/boom" {
                    Err(HandlerError::Io(std::io::Error::other("kaboom")))
                } else {
                    Ok(Response::new(200).with_body(b"fine".to_vec()))
                }
            });
        let (tx, rx) = std::sync::mpsc::channel();
        let running = std::thread::spawn(move || server.run(handler, 2, Some(tx)));

        let ok = get(addr, "/ok");
        assert!(ok.starts_with("HTTP/1.1 200"), "{ok}");
        assert!(ok.ends_with("fine"));

        let failed = get(addr, "/boom");
        assert!(failed.starts_with("HTTP/1.1 500"), "{failed}");
        assert!(failed.contains("kaboom"));

        let failure = rx.recv().unwrap();
        assert_eq!(failure.path, "/boom");

        stop.unblock();
        running.join().unwrap().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn ctrl_c_stops_the_accept_loop() {
        let config = ServeConfig {
            port: 0,
            ..ServeConfig::default()
        };
        let server = Server::bind(&config).unwrap();
        server.stop_on_ctrlc().unwrap();
        let handler: Arc<dyn RequestHandler> = Arc::new(StaticFiles::new("."));
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || done_tx.send(server.run(handler, 1, None)).unwrap());

        let status = std::process::Command::new("kill")
            .args(["-INT", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let result = done_rx
            .recv_timeout(std::time::Duration::from_secs(10))
            .expect("run should return after Ctrl-C");
        assert!(result.is_ok());

        // Only one handler per process
        let second = Server::bind(&config).unwrap();
        assert!(matches!(second.stop_on_ctrlc(), Err(ServeError::Signal(_))));
    }
}
