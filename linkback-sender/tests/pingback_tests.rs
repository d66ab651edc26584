// End-to-end pingback behaviour against mock targets, including log output

use linkback_sender::{
    EndpointResult, FailureReason, LinkbackEvent, LinkbackRequest, PingbackOutcome,
    PingbackSender, SenderConfig,
};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::subscriber::DefaultGuard;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const SOURCE: &str = "https://a.example/posts/hello";

// ============================================================================
// Log capture
// ============================================================================

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

fn lines_at<'a>(logs: &'a str, level: &'a str) -> Vec<&'a str> {
    logs.lines().filter(|line| line.contains(level)).collect()
}

// ============================================================================
// Helpers
// ============================================================================

fn sender_with_timeout(timeout: Duration) -> PingbackSender {
    PingbackSender::new(SenderConfig::linkback().with_timeout(timeout)).unwrap()
}

fn sender() -> PingbackSender {
    sender_with_timeout(Duration::from_secs(2))
}

fn target(server: &MockServer) -> String {
    format!("{}/article", server.uri())
}

async fn mount_xmlrpc(server: &MockServer, body: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/xmlrpc.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

const SUCCESS_BODY: &str = r#"<?xml version="1.0"?>
<methodResponse>
  <params><param><value><string>Pingback registered</string></value></param></params>
</methodResponse>"#;

const FAULT_BODY: &str = r#"<?xml version="1.0"?>
<methodResponse>
  <fault><value><struct>
    <member><name>faultCode</name><value><int>17</int></value></member>
    <member><name>faultString</name><value><string>The source URL does not contain a link to the target URL.</string></value></member>
  </struct></value></fault>
</methodResponse>"#;

// ============================================================================
// Discovery
// ============================================================================

#[tokio::test]
async fn test_header_wins_over_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Pingback", "https://example.org/xmlrpc.php")
                .insert_header("content-type", "text/html")
                .set_body_string(
                    r#"<html><head><link rel="pingback" href="https://elsewhere.example/rpc"></head></html>"#,
                ),
        )
        .mount(&mock_server)
        .await;

    let result = sender().discover_endpoint(&target(&mock_server)).await;
    assert_eq!(
        result,
        EndpointResult::Found("https://example.org/xmlrpc.php".to_string())
    );
}

#[tokio::test]
async fn test_link_element_when_no_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><link rel="pingback" href="https://example.org/xmlrpc.php"></head></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let result = sender().discover_endpoint(&target(&mock_server)).await;
    assert_eq!(
        result,
        EndpointResult::Found("https://example.org/xmlrpc.php".to_string())
    );
}

#[tokio::test]
async fn test_relative_link_element_resolves_against_target() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><link rel="pingback" href="/xmlrpc.php"></head></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let result = sender().discover_endpoint(&target(&mock_server)).await;
    assert_eq!(
        result,
        EndpointResult::Found(format!("{}/xmlrpc.php", mock_server.uri()))
    );
}

#[tokio::test]
async fn test_no_signal_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><head><title>Hi</title></head></html>"),
        )
        .mount(&mock_server)
        .await;

    let result = sender().discover_endpoint(&target(&mock_server)).await;
    assert_eq!(result, EndpointResult::NotFound);
}

#[tokio::test]
async fn test_timeout_is_not_found_and_logged() {
    let (logs, _guard) = capture_logs();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Pingback", "https://example.org/xmlrpc.php")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let result = sender_with_timeout(Duration::from_millis(300))
        .discover_endpoint(&target(&mock_server))
        .await;
    assert_eq!(result, EndpointResult::NotFound);

    let logs = logs.contents();
    let warnings = lines_at(&logs, "WARN");
    assert_eq!(warnings.len(), 1, "logs were:\n{}", logs);
    assert!(warnings[0].contains(&target(&mock_server)));
    assert!(warnings[0].contains("channel=linkback_pingback"));
}

#[tokio::test]
async fn test_http_error_is_not_found_and_logged() {
    let (logs, _guard) = capture_logs();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = sender().discover_endpoint(&target(&mock_server)).await;
    assert_eq!(result, EndpointResult::NotFound);

    let logs = logs.contents();
    let warnings = lines_at(&logs, "WARN");
    assert_eq!(warnings.len(), 1, "logs were:\n{}", logs);
    assert!(warnings[0].contains("404 Not Found"));
    assert!(warnings[0].contains(&target(&mock_server)));
}

#[tokio::test]
async fn test_invalid_url_is_not_found_and_logged() {
    let (logs, _guard) = capture_logs();

    let result = sender().discover_endpoint("not a url").await;
    assert_eq!(result, EndpointResult::NotFound);

    let logs = logs.contents();
    let warnings = lines_at(&logs, "WARN");
    assert_eq!(warnings.len(), 1, "logs were:\n{}", logs);
    assert!(warnings[0].contains("not a url"));
}

#[tokio::test]
async fn test_redirect_is_followed_and_relative_link_uses_final_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("Location", format!("{}/new/article", mock_server.uri())),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><link rel="pingback" href="xmlrpc.php"></head></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = sender()
        .discover_endpoint(&format!("{}/old", mock_server.uri()))
        .await;
    assert_eq!(
        result,
        EndpointResult::Found(format!("{}/new/xmlrpc.php", mock_server.uri()))
    );
}

#[tokio::test]
async fn test_redirect_loop_is_not_found_and_logged() {
    let (logs, _guard) = capture_logs();
    let mock_server = MockServer::start().await;
    let looping = format!("{}/loop", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", looping.as_str()))
        .mount(&mock_server)
        .await;

    let result = sender().discover_endpoint(&looping).await;
    assert_eq!(result, EndpointResult::NotFound);

    let logs = logs.contents();
    let warnings = lines_at(&logs, "WARN");
    assert_eq!(warnings.len(), 1, "logs were:\n{}", logs);
    assert!(warnings[0].contains(&looping));
}

// ============================================================================
// Sending
// ============================================================================

#[tokio::test]
async fn test_no_endpoint_skips_xmlrpc() {
    let (logs, _guard) = capture_logs();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_xmlrpc(&mock_server, SUCCESS_BODY, 0).await;

    let request = LinkbackRequest::new(SOURCE, &target(&mock_server)).unwrap();
    let outcome = sender().send(&request).await;

    assert_eq!(outcome, PingbackOutcome::Failure(FailureReason::NoEndpoint));
    assert!(!sender().send_pingback(SOURCE, &target(&mock_server)).await);
    assert!(lines_at(&logs.contents(), "ERROR").is_empty());
}

#[tokio::test]
async fn test_successful_pingback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Pingback", format!("{}/xmlrpc.php", mock_server.uri())),
        )
        .mount(&mock_server)
        .await;
    mount_xmlrpc(&mock_server, SUCCESS_BODY, 1).await;

    let ok = sender().send_pingback(SOURCE, &target(&mock_server)).await;
    assert!(ok);
}

#[tokio::test]
async fn test_fault_is_failure_and_logged_as_error() {
    let (logs, _guard) = capture_logs();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><head><link rel="pingback" href="{}/xmlrpc.php"></head></html>"#,
            mock_server.uri()
        )))
        .mount(&mock_server)
        .await;
    mount_xmlrpc(&mock_server, FAULT_BODY, 1).await;

    let request = LinkbackRequest::new(SOURCE, &target(&mock_server)).unwrap();
    let outcome = sender().send(&request).await;

    assert_eq!(
        outcome,
        PingbackOutcome::Failure(FailureReason::Remote {
            code: 17,
            description: "The source URL does not contain a link to the target URL.".to_string(),
        })
    );

    let logs = logs.contents();
    let errors = lines_at(&logs, "ERROR");
    assert_eq!(errors.len(), 1, "logs were:\n{}", logs);
    let line = errors[0];
    assert!(line.contains(SOURCE));
    assert!(line.contains(&target(&mock_server)));
    assert!(line.contains("Error 17"));
    assert!(line.contains("The source URL does not contain a link to the target URL."));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_failure() {
    let mock_server = MockServer::start().await;

    // Nothing listens on port 9 of the loopback interface
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("X-Pingback", "http://127.0.0.1:9/xmlrpc.php"),
        )
        .mount(&mock_server)
        .await;

    let request = LinkbackRequest::new(SOURCE, &target(&mock_server)).unwrap();
    let outcome = sender().send(&request).await;

    match outcome {
        PingbackOutcome::Failure(FailureReason::Remote { code, .. }) => assert_eq!(code, -32300),
        other => panic!("expected transport failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_vinculum_identity_on_the_wire() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .and(wiremock::matchers::header(
            "user-agent",
            "Drupal Pingback (+http://drupal.org/project/vinculum)",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Pingback", format!("{}/xmlrpc.php", mock_server.uri())),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/xmlrpc.php"))
        .and(wiremock::matchers::header(
            "user-agent",
            "Drupal Pingback (+http://drupal.org/project/vinculum)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(SUCCESS_BODY))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sender = PingbackSender::new(SenderConfig::vinculum()).unwrap();
    assert!(sender.send_pingback(SOURCE, &target(&mock_server)).await);
}

#[tokio::test]
async fn test_custom_identity_filters_events_and_tags_logs() {
    let (logs, _guard) = capture_logs();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = SenderConfig::linkback()
        .with_event_name("newsroom_send")
        .with_channel("newsroom_pingback");
    let sender = PingbackSender::new(config).unwrap();
    assert_eq!(sender.subscribed_event(), "newsroom_send");
    assert_eq!(sender.config().channel, "newsroom_pingback");

    let request = LinkbackRequest::new(SOURCE, &target(&mock_server)).unwrap();

    let ignored = LinkbackEvent::new("linkback_send", request.clone());
    assert_eq!(sender.on_send(&ignored).await, None);

    let handled = LinkbackEvent::new("newsroom_send", request);
    assert_eq!(
        sender.on_send(&handled).await,
        Some(PingbackOutcome::Failure(FailureReason::NoEndpoint))
    );

    let logs = logs.contents();
    let warnings = lines_at(&logs, "WARN");
    assert_eq!(warnings.len(), 1, "logs were:\n{}", logs);
    assert!(warnings[0].contains("channel=newsroom_pingback"));
}
