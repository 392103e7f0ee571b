//! Behaviour of the dispatcher as seen from a route handler.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rstest::rstest;
use waypost::{
    Dispatcher, HandlerError, HttpError, INTERNAL_REASON, Method, Outcome, Request, Status,
};

const ALBUMS: &[u8] =
    br#"[{"id":1,"title":"A Love Supreme","artist":"John Coltrane","price":9.99}]"#;

/// Collects everything the fmt subscriber writes on the current thread.
#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        (capture, tracing::subscriber::set_default(subscriber))
    }

    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn decode_reason(body: &[u8]) -> String {
    serde_json::from_slice(body).expect("reason is a JSON string")
}

#[rstest]
#[case("GET")]
#[case("PUT")]
#[case("DELETE")]
#[case("post")]
#[case("BREW")]
#[tokio::test]
async fn method_mismatch_is_405_and_skips_handler(#[case] method: &str) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let dispatcher = Dispatcher::new(Method::Post, move |_req: Request| {
        seen.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, HandlerError>(b"1".to_vec()) }
    });

    let res = dispatcher.call(Request::new(method, "/items/add")).await;

    assert_eq!(res.status(), Status::MethodNotAllowed);
    assert_eq!(res.body(), br#""Method Not Allowed""#);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn matching_method_invokes_handler_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let dispatcher = Dispatcher::new(Method::Post, move |_req: Request| {
        seen.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, HandlerError>(b"1".to_vec()) }
    });

    let res = dispatcher.call(Request::new("POST", "/items/add")).await;

    assert_eq!(res.status(), Status::Ok);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn success_payload_is_sent_verbatim() {
    async fn albums(_req: Request) -> Outcome {
        Ok(ALBUMS.to_vec())
    }

    let res = Dispatcher::new(Method::Get, albums)
        .call(Request::new("GET", "/albums"))
        .await;

    assert_eq!(res.status(), Status::Ok);
    assert_eq!(res.body(), ALBUMS);
    assert_eq!(res.header("content-type"), Some("application/json"));
}

#[rstest]
#[case(Status::BadRequest, "Missing Title in request body")]
#[case(Status::NotFound, "Album not found")]
#[case(Status::Conflict, "Title \"taken\" already exists")]
#[case(Status::ServiceUnavailable, "Try again later")]
#[tokio::test]
async fn classified_failure_keeps_status_and_reason(#[case] status: Status, #[case] reason: &'static str) {
    let dispatcher = Dispatcher::new(Method::Post, move |_req: Request| async move {
        Err::<Vec<u8>, _>(HandlerError::from(HttpError::new(status, reason)))
    });

    let res = dispatcher.call(Request::new("POST", "/items/add")).await;

    assert_eq!(res.status(), status);
    assert_eq!(decode_reason(res.body()), reason);
}

#[tokio::test]
async fn unclassified_failure_is_generic_500_and_logged_once() {
    async fn broken(_req: Request) -> Outcome {
        let fault = anyhow::anyhow!("dial tcp 10.0.0.7:3306: connection refused");
        Err(fault.context("list todo items").into())
    }
    let (logs, _guard) = LogCapture::install();

    let res = Dispatcher::new(Method::Get, broken)
        .call(Request::new("GET", "/items"))
        .await;

    assert_eq!(res.status(), Status::InternalServerError);
    assert_eq!(decode_reason(res.body()), INTERNAL_REASON);
    assert!(!String::from_utf8_lossy(res.body()).contains("refused"));

    let logs = logs.contents();
    assert_eq!(logs.matches("connection refused").count(), 1, "{logs}");
    assert!(logs.contains("list todo items"), "{logs}");
}

#[rstest]
#[case(anyhow::anyhow!("password authentication failed for user admin"))]
#[case(anyhow::Error::new(io::Error::other("disk full")))]
#[case(anyhow::anyhow!(""))]
#[tokio::test]
async fn unclassified_detail_never_leaks(#[case] fault: anyhow::Error) {
    let fault = Arc::new(Mutex::new(Some(fault)));
    let dispatcher = Dispatcher::new(Method::Get, move |_req: Request| {
        let fault = fault.lock().unwrap().take();
        async move {
            match fault {
                Some(e) => Err(HandlerError::Unclassified(e)),
                None => Ok(Vec::new()),
            }
        }
    });

    let res = dispatcher.call(Request::new("GET", "/items")).await;

    assert_eq!(res.status(), Status::InternalServerError);
    assert_eq!(res.body(), br#""Internal Server Error""#);
}

#[tokio::test]
async fn one_log_line_per_request_with_method_path_status() {
    async fn albums(_req: Request) -> Outcome {
        Ok(ALBUMS.to_vec())
    }
    let (logs, _guard) = LogCapture::install();
    let dispatcher = Dispatcher::new(Method::Get, albums);

    dispatcher.call(Request::new("GET", "/albums")).await;
    dispatcher.call(Request::new("DELETE", "/albums")).await;

    let logs = logs.contents();
    let lines: Vec<&str> = logs.lines().collect();
    assert_eq!(lines.len(), 2, "{logs}");
    assert!(lines[0].contains("method=GET") && lines[0].contains("path=/albums") && lines[0].contains("status=200"));
    assert!(lines[1].contains("method=DELETE") && lines[1].contains("status=405"));
}

#[tokio::test]
async fn repeated_get_is_idempotent() {
    async fn albums(_req: Request) -> Outcome {
        Ok(ALBUMS.to_vec())
    }
    let dispatcher = Dispatcher::new(Method::Get, albums);

    let first = dispatcher.call(Request::new("GET", "/albums")).await;
    let second = dispatcher.call(Request::new("GET", "/albums")).await;

    assert_eq!(first.status(), second.status());
    assert_eq!(first.body(), second.body());
}
