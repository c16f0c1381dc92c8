pub(crate) async fn service_worker() -> axum::response::Response {
    const SW_CONTENT: &str = include_str!("../static/sw.js");
    axum::response::Response::builder()
        .status(200)
        .header("content-type", "application/javascript")
        .header("cache-control", "no-cache")
        .body(SW_CONTENT.into())
        .unwrap()
}

pub(crate) async fn push_client_script() -> axum::response::Response {
    const CLIENT_JS_CONTENT: &str = include_str!("../static/push-client.js");
    axum::response::Response::builder()
        .status(200)
        .header("content-type", "application/javascript")
        .header("cache-control", "no-cache")
        .body(CLIENT_JS_CONTENT.into())
        .unwrap()
}

pub(crate) async fn subscribe_page() -> axum::response::Response {
    const PAGE_CONTENT: &str = include_str!("../static/subscribe.html");
    axum::response::Response::builder()
        .status(200)
        .header("content-type", "text/html; charset=utf-8")
        .header("cache-control", "no-cache")
        .body(PAGE_CONTENT.into())
        .unwrap()
}
