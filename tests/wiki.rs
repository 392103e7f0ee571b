//! The wiki driven through its router against a temporary directory.

use std::sync::Arc;

use tempfile::TempDir;
use waypost::wiki::{self, PageStore};
use waypost::{Request, Router, Status};

fn app() -> (TempDir, Router) {
    let dir = tempfile::tempdir().expect("temp dir");
    let router = wiki::routes(Arc::new(PageStore::new(dir.path()))).expect("routes register");
    (dir, router)
}

fn body(res: &waypost::Response) -> String {
    String::from_utf8_lossy(res.body()).into_owned()
}

#[tokio::test]
async fn missing_page_redirects_to_editor() {
    let (_dir, app) = app();
    let res = app.handle(Request::new("GET", "/view/FrontPage")).await;
    assert_eq!(res.status(), Status::Found);
    assert_eq!(res.header("location"), Some("/edit/FrontPage"));
}

#[tokio::test]
async fn editor_for_new_page_is_empty_form() {
    let (_dir, app) = app();
    let res = app.handle(Request::new("GET", "/edit/FrontPage")).await;
    assert_eq!(res.status(), Status::Ok);
    let html = body(&res);
    assert!(html.contains(r#"action="/save/FrontPage""#));
    assert!(html.contains("></textarea>"));
}

#[tokio::test]
async fn save_then_view_shows_escaped_text() {
    let (dir, app) = app();
    let res = app
        .handle(
            Request::new("POST", "/save/FrontPage")
                .with_header("content-type", "application/x-www-form-urlencoded")
                .with_body("body=Hello+%3Cb%3Eworld%3C%2Fb%3E"),
        )
        .await;
    assert_eq!(res.status(), Status::Found);
    assert_eq!(res.header("location"), Some("/view/FrontPage"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("FrontPage.txt")).unwrap(),
        "Hello <b>world</b>"
    );

    let res = app.handle(Request::new("GET", "/view/FrontPage")).await;
    assert_eq!(res.status(), Status::Ok);
    assert!(body(&res).contains("Hello &lt;b&gt;world&lt;/b&gt;"));

    let res = app.handle(Request::new("GET", "/edit/FrontPage")).await;
    assert!(body(&res).contains(">Hello &lt;b&gt;world&lt;/b&gt;</textarea>"));
}

#[tokio::test]
async fn invalid_title_is_404() {
    let (dir, app) = app();
    for (method, path) in [("GET", "/view/no-dashes"), ("POST", "/save/..%2Fescape"), ("GET", "/edit/a.b")] {
        let res = app.handle(Request::new(method, path).with_body("body=x")).await;
        assert_eq!(res.status(), Status::NotFound, "{path}");
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn unknown_action_is_404() {
    let (_dir, app) = app();
    let res = app.handle(Request::new("GET", "/delete/FrontPage")).await;
    assert_eq!(res.status(), Status::NotFound);
}

#[tokio::test]
async fn get_on_save_is_405_and_keeps_the_page() {
    let (dir, app) = app();
    let res = app
        .handle(Request::new("POST", "/save/Home").with_body("body=important"))
        .await;
    assert_eq!(res.status(), Status::Found);

    let res = app.handle(Request::new("GET", "/save/Home")).await;
    assert_eq!(res.status(), Status::MethodNotAllowed);
    assert_eq!(res.header("allow"), Some("POST"));
    assert_eq!(std::fs::read_to_string(dir.path().join("Home.txt")).unwrap(), "important");

    let res = app.handle(Request::new("GET", "/view/Home")).await;
    assert!(body(&res).contains("<div>important</div>"));
}

#[tokio::test]
async fn view_and_edit_are_get_only() {
    let (dir, app) = app();
    for (method, path) in [("DELETE", "/edit/Home"), ("POST", "/view/Home"), ("PUT", "/edit/Home")] {
        let res = app.handle(Request::new(method, path)).await;
        assert_eq!(res.status(), Status::MethodNotAllowed, "{method} {path}");
        assert_eq!(res.header("allow"), Some("GET"));
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
