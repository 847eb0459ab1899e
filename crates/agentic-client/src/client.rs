use agentic_core::RunAgentInput;
use reqwest::header::ACCEPT;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::errors::ConnectionError;
use crate::session::StreamSession;

/// Opens run streams against one endpoint.
#[derive(Clone, Debug)]
pub struct StreamClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl StreamClient {
    pub fn new(config: ClientConfig) -> Result<Self, ConnectionError> {
        config
            .validate()
            .map_err(|e| ConnectionError::Build(e.to_string()))?;
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ConnectionError::Build(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends the run request and returns a session over its event stream.
    ///
    /// Fails once, without retry, when the connection cannot be established
    /// or the server answers with a non-success status.
    pub async fn open(&self, input: &RunAgentInput) -> Result<StreamSession, ConnectionError> {
        let endpoint = &self.config.endpoint;
        debug!(
            endpoint = %endpoint,
            thread_id = input.thread_id.as_deref().unwrap_or(""),
            run_id = input.run_id.as_deref().unwrap_or(""),
            "opening event stream"
        );

        let mut request = self
            .http
            .post(endpoint)
            .header(ACCEPT, "text/event-stream")
            .json(input);
        if let Some(token) = &self.config.auth_token {
            request = request.header(
                self.config.auth_header.as_str(),
                format!("{} {}", self.config.auth_scheme, token),
            );
        }

        let response = request.send().await.map_err(|e| ConnectionError::Send {
            endpoint: endpoint.clone(),
            message: e.to_string(),
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ConnectionError::Status {
                status: status.as_u16(),
                body,
            });
        }
        info!(endpoint = %endpoint, "event stream connected");

        Ok(StreamSession::spawn(
            response.bytes_stream(),
            self.config.buffer_size,
            self.config.read_timeout,
            self.config.decode_failure,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStep;
    use agentic_core::AbortSignal;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        format!("http://{addr}/agentic")
    }

    #[tokio::test]
    async fn non_success_status_is_a_connection_error() {
        let app = Router::new().route(
            "/agentic",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
        );
        let endpoint = serve(app).await;
        let client =
            StreamClient::new(ClientConfig::default().endpoint(endpoint)).expect("client");
        let err = client
            .open(&RunAgentInput::new("t", "r"))
            .await
            .expect_err("status");
        assert_eq!(
            err,
            ConnectionError::Status {
                status: 503,
                body: "busy".into()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_connection_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        let client = StreamClient::new(
            ClientConfig::default().endpoint(format!("http://{addr}/agentic")),
        )
        .expect("client");
        let err = client
            .open(&RunAgentInput::new("t", "r"))
            .await
            .expect_err("refused");
        assert!(matches!(err, ConnectionError::Send { .. }));
    }

    #[tokio::test]
    async fn sends_bearer_token_and_accept_header() {
        let app = Router::new().route(
            "/agentic",
            post(|headers: HeaderMap| async move {
                let header = |name: &str| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string()
                };
                let event = serde_json::json!({
                    "type": "CUSTOM",
                    "name": "headers",
                    "value": [header("authorization"), header("accept")],
                });
                format!("data: {event}\n\n")
            }),
        );
        let endpoint = serve(app).await;
        let client = StreamClient::new(
            ClientConfig::default()
                .endpoint(endpoint)
                .auth_token("secret"),
        )
        .expect("client");
        let mut session = client
            .open(&RunAgentInput::new("t", "r"))
            .await
            .expect("open");
        let step = session
            .next(&mut AbortSignal::never())
            .await
            .expect("step");
        let SessionStep::Event(agentic_core::Event::Custom(custom)) = &step else {
            panic!("unexpected step {step:?}");
        };
        assert_eq!(
            custom.value,
            serde_json::json!(["Bearer secret", "text/event-stream"])
        );
        assert_eq!(
            session.next(&mut AbortSignal::never()).await,
            Ok(SessionStep::Ended)
        );
    }
}
