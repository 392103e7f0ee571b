//! File-backed wiki.
//!
//! Each page is `<dir>/<title>.txt`. Titles are restricted to ASCII letters
//! and digits, which also keeps them from escaping `dir`.
//!
//! | Route | Reply |
//! |---|---|
//! | `GET /view/{title}` | the page, or `302` to `/edit/{title}` when it does not exist |
//! | `GET /edit/{title}` | an edit form, empty for a new page |
//! | `POST /save/{title}` | stores the form's `body` field, then `302` to `/view/{title}` |
//!
//! Any other method on these paths is `405`.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tracing::{error, info};

use crate::error::{Error, HttpError};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// A validated page title.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageTitle(String);

impl PageTitle {
    pub fn parse(raw: &str) -> Result<Self, HttpError> {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Ok(Self(raw.to_owned()))
        } else {
            Err(HttpError::not_found("404 page not found"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub title: PageTitle,
    pub body: Vec<u8>,
}

/// Pages stored as text files in one directory.
#[derive(Clone, Debug)]
pub struct PageStore {
    dir: PathBuf,
}

impl PageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, title: &PageTitle) -> PathBuf {
        self.dir.join(format!("{title}.txt"))
    }

    /// `Ok(None)` when the page has never been saved.
    pub async fn load(&self, title: &PageTitle) -> io::Result<Option<Page>> {
        match tokio::fs::read(self.path(title)).await {
            Ok(body) => Ok(Some(Page { title: title.clone(), body })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Writes the page, readable and writable by the owner only.
    pub async fn save(&self, page: &Page) -> io::Result<()> {
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(self.path(&page.title)).await?;
        file.write_all(&page.body).await?;
        file.flush().await
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn render_view(page: &Page) -> String {
    let title = escape_html(page.title.as_str());
    let body = escape_html(&String::from_utf8_lossy(&page.body));
    format!(
        "<h1>{title}</h1>\n\n<p>[<a href=\"/edit/{title}\">edit</a>]</p>\n\n<div>{body}</div>\n"
    )
}

fn render_edit(page: &Page) -> String {
    let title = escape_html(page.title.as_str());
    let body = escape_html(&String::from_utf8_lossy(&page.body));
    format!(
        "<h1>Editing {title}</h1>\n\n\
         <form action=\"/save/{title}\" method=\"POST\">\n\
         <div><textarea name=\"body\" rows=\"20\" cols=\"80\">{body}</textarea></div>\n\
         <div><input type=\"submit\" value=\"Save\"></div>\n\
         </form>\n"
    )
}

fn title_of(req: &Request) -> Result<PageTitle, HttpError> {
    PageTitle::parse(req.param("title").unwrap_or_default())
}

fn internal_error() -> HttpError {
    HttpError::new(Status::InternalServerError, Status::InternalServerError.reason())
}

/// `/view/{title}`
pub async fn view(store: &PageStore, req: Request) -> Result<Response, HttpError> {
    let title = title_of(&req)?;
    match store.load(&title).await {
        Ok(Some(page)) => {
            info!(%title, "viewing page");
            Ok(Response::html(render_view(&page)))
        }
        Ok(None) => {
            info!(%title, "page not found, redirecting to editor");
            Ok(Response::redirect(&format!("/edit/{title}")))
        }
        Err(e) => {
            error!(%title, error = %e, "loading page");
            Err(internal_error())
        }
    }
}

/// `/edit/{title}`
pub async fn edit(store: &PageStore, req: Request) -> Result<Response, HttpError> {
    let title = title_of(&req)?;
    let page = match store.load(&title).await {
        Ok(Some(page)) => page,
        Ok(None) => Page { title: title.clone(), body: Vec::new() },
        Err(e) => {
            error!(%title, error = %e, "loading page");
            return Err(internal_error());
        }
    };
    info!(%title, "editing page");
    Ok(Response::html(render_edit(&page)))
}

/// `/save/{title}`
pub async fn save(store: &PageStore, req: Request) -> Result<Response, HttpError> {
    let title = title_of(&req)?;
    let body = req.form_value("body").unwrap_or_default();
    let page = Page { title: title.clone(), body: body.into_bytes() };

    if let Err(e) = store.save(&page).await {
        error!(%title, error = %e, "saving page");
        return Err(internal_error());
    }
    info!(%title, bytes = page.body.len(), "page saved");
    Ok(Response::redirect(&format!("/view/{title}")))
}

pub fn routes(store: Arc<PageStore>) -> Result<Router, Error> {
    let viewing = Arc::clone(&store);
    let editing = Arc::clone(&store);
    let saving = store;

    Router::new()
        .route_only(Method::Get, "/view/{title}", move |req: Request| {
            let store = Arc::clone(&viewing);
            async move { view(&store, req).await }
        })?
        .route_only(Method::Get, "/edit/{title}", move |req: Request| {
            let store = Arc::clone(&editing);
            async move { edit(&store, req).await }
        })?
        .route_only(Method::Post, "/save/{title}", move |req: Request| {
            let store = Arc::clone(&saving);
            async move { save(&store, req).await }
        })
}
