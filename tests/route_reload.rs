//! Live routes reload: snapshot isolation and watcher-driven swaps.

use std::sync::Arc;
use std::time::Duration;

use foldserve::http::Request;
use foldserve::resolver::{FileNode, MemoryResolver};
use foldserve::routing::{shared_routes, RequestMapper, Response, ResponseErrorCode, RouteSet, Verb};
use reqwest::StatusCode;

mod common;

const RELOAD_TIMEOUT: Duration = Duration::from_secs(10);

#[test]
fn test_in_flight_request_keeps_its_snapshot() {
    let resolver = MemoryResolver::new(vec![
        FileNode::dir("Pictures", vec![FileNode::file("cat.jpg", "meow")]),
        FileNode::dir("Documents", vec![FileNode::file("index.html", "<h1>docs</h1>")]),
    ]);
    let routes = shared_routes(RouteSet::parse(Some(
        br#"{"routes": [{"path": "/pet", "resource": "Pictures/cat.jpg"}]}"#,
    )));
    let mapper = RequestMapper::default();
    let request = Request::with_method(Verb::Get, "/pet", &resolver).unwrap();

    // A request that loaded its snapshot before the swap...
    let in_flight = routes.load_full();
    routes.store(Arc::new(RouteSet::parse(Some(
        br#"{"routes": [{"path": "/pet", "resource": "Documents"}]}"#,
    ))));

    // ...completes against the old routes.
    assert_eq!(
        mapper.map(&request, &resolver, &in_flight),
        Response::Success("/Pictures/cat.jpg".into())
    );
    // The next request sees the new ones.
    assert_eq!(
        mapper.map(&request, &resolver, &routes.load()),
        Response::Success("/Documents/index.html".into())
    );

    routes.store(Arc::new(RouteSet::empty()));
    assert_eq!(
        mapper.map(&request, &resolver, &routes.load()),
        Response::Failure(ResponseErrorCode::NotFound)
    );
}

#[tokio::test]
async fn test_routes_file_changes_are_picked_up() {
    let root = common::fixture_root();
    let (mut session, base) = common::start_session(root.path()).await;
    let client = common::client();
    assert!(session.routes().unwrap().is_empty());

    let res = client.post(format!("{base}/cat")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    common::write_routes(
        root.path(),
        r#"{"routes": [{"method": "POST", "path": "/cat", "resource": "Pictures/cat.jpg"}]}"#,
    );
    let reloaded = common::eventually(RELOAD_TIMEOUT, || {
        session.routes().is_some_and(|routes| routes.len() == 1)
    })
    .await;
    assert!(reloaded, "routes file was not reloaded");

    let res = client.post(format!("{base}/cat")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Replace wholesale: the old rule disappears, the new one takes effect.
    common::write_routes(
        root.path(),
        r#"{"routes": [{"method": "GET", "path": "/docs", "resource": "Documents"}]}"#,
    );
    let reloaded = common::eventually(RELOAD_TIMEOUT, || {
        session
            .routes()
            .is_some_and(|routes| routes.len() == 1 && routes.routes()[0].pattern() == "/docs")
    })
    .await;
    assert!(reloaded, "replacement routes were not published");

    let res = client.post(format!("{base}/cat")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = client.get(format!("{base}/docs")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "<h1>docs</h1>");

    session.stop().await;
}

#[tokio::test]
async fn test_removed_routes_file_clears_routes() {
    let root = common::fixture_root();
    common::write_routes(
        root.path(),
        r#"{"routes": [{"path": "/pet", "resource": "Pictures/cat.jpg"}]}"#,
    );
    let (mut session, _) = common::start_session(root.path()).await;
    assert_eq!(session.routes().unwrap().len(), 1);

    std::fs::remove_file(root.path().join("routes.json")).unwrap();
    let cleared = common::eventually(RELOAD_TIMEOUT, || {
        session.routes().is_some_and(|routes| routes.is_empty())
    })
    .await;
    assert!(cleared, "routes were not cleared after the file was removed");

    session.stop().await;
}

#[tokio::test]
async fn test_malformed_document_serves_without_routes() {
    let root = common::fixture_root();
    std::fs::write(root.path().join("routes.json"), "{ this is not json").unwrap();
    let (mut session, base) = common::start_session(root.path()).await;

    assert!(session.routes().unwrap().is_empty());
    let res = common::client()
        .get(format!("{base}/Pictures/cat.jpg"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    session.stop().await;
}
