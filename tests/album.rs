//! The album catalogue over HTTP.

use std::sync::Arc;

use rstest::{fixture, rstest};
use waypost::album::{self, Album, Catalogue, MemoryAlbumStore};
use waypost::{Request, Router, Status};

#[fixture]
fn app() -> Router {
    let store = MemoryAlbumStore::with_albums(vec![Album {
        id: 1,
        title: "A Love Supreme".into(),
        artist: "John Coltrane".into(),
        price: 9.99,
    }]);
    album::routes(Catalogue::new(Arc::new(store))).expect("routes register")
}

#[rstest]
#[tokio::test]
async fn albums_by_artist_as_json(app: Router) {
    let res = app.handle(Request::new("GET", "/artists/John%20Coltrane/albums")).await;
    assert_eq!(res.status(), Status::Ok);
    assert_eq!(
        res.body(),
        br#"[{"id":1,"title":"A Love Supreme","artist":"John Coltrane","price":9.99}]"#
    );
}

#[rstest]
#[case("/albums/1", Status::Ok)]
#[case("/albums/99", Status::NotFound)]
#[case("/albums/one", Status::BadRequest)]
#[tokio::test]
async fn album_by_id(app: Router, #[case] path: &str, #[case] expected: Status) {
    let res = app.handle(Request::new("GET", path)).await;
    assert_eq!(res.status(), expected);
}

#[rstest]
#[tokio::test]
async fn add_album_then_fetch(app: Router) {
    let res = app
        .handle(Request::new("POST", "/albums").with_body(
            r#"{"title":"Bla","artist":"Who Cares","price":199.99}"#,
        ))
        .await;
    assert_eq!(res.status(), Status::Ok);
    assert_eq!(res.body(), b"2");

    let res = app.handle(Request::new("GET", "/albums/2")).await;
    let album: Album = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(album.artist, "Who Cares");
}

#[rstest]
#[tokio::test]
async fn add_album_requires_artist(app: Router) {
    let res = app
        .handle(Request::new("POST", "/albums").with_body(r#"{"title":"Bla","artist":" ","price":1.0}"#))
        .await;
    assert_eq!(res.status(), Status::BadRequest);
    assert_eq!(res.body(), br#""Missing Artist in request body""#);
}
