use pdfchat_telemetry::{LogFormat, TelemetryError, TelemetryOptions, init_with_options};

#[tokio::test]
async fn subscriber_installs_once() {
    let options = TelemetryOptions::new("pdfchat-test").with_format(LogFormat::Json);
    init_with_options(options.clone()).unwrap();

    let _guard = pdfchat_telemetry::chat_span("default", true).entered();
    tracing::info!("inside chat span");

    assert!(matches!(init_with_options(options), Err(TelemetryError::Install(_))));
}
