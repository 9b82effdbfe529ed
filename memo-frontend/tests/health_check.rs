mod common;

use common::TestApp;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get_json("/health").await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body["service"], "memo-frontend");
    assert_eq!(body["status"], "ok");
}
