use agentic_core::ids::{generate_run_id, generate_thread_id};
use agentic_core::{
    AbortSignal, DisplayLine, EventType, Message, ProjectError, ProjectionStyle, RunAgentInput,
    project,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::client::StreamClient;
use crate::errors::ChatError;
use crate::session::SessionStep;

/// What the chat driver hands to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatUpdate {
    Line(DisplayLine),
    /// Something the user should see that is not part of the run output.
    Notice(String),
}

/// How a chat run ended when no error was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// The stream closed after `RUN_FINISHED`.
    Finished,
    /// The stream closed without `RUN_FINISHED`.
    Ended,
    Cancelled,
    /// The remote reported `RUN_ERROR`.
    RunFailed {
        message: String,
        code: Option<String>,
    },
}

/// Run payload for a single user message, with fresh thread and run ids.
pub fn build_run_input(text: &str) -> RunAgentInput {
    RunAgentInput::new(generate_thread_id(), generate_run_id())
        .with_message(&Message::user("msg-1", text))
}

/// Streams one run for `text`, forwarding projected lines to `updates`.
///
/// Stops early (as cancelled) when the front end drops its receiver.
pub async fn run_chat(
    client: &StreamClient,
    text: &str,
    style: &ProjectionStyle,
    updates: &mpsc::Sender<ChatUpdate>,
    cancel: &mut AbortSignal,
) -> Result<ChatOutcome, ChatError> {
    let input = build_run_input(text);
    let mut session = client.open(&input).await?;
    let mut finished = false;
    loop {
        let event = match session.next(cancel).await? {
            SessionStep::Event(event) => event,
            SessionStep::Skipped(err) => {
                if !emit(updates, ChatUpdate::Notice(format!("Skipped event: {err}"))).await {
                    return Ok(ChatOutcome::Cancelled);
                }
                continue;
            }
            SessionStep::Ended => {
                info!(finished, "run stream closed");
                return Ok(if finished {
                    ChatOutcome::Finished
                } else {
                    ChatOutcome::Ended
                });
            }
            SessionStep::Cancelled => {
                info!("run cancelled");
                return Ok(ChatOutcome::Cancelled);
            }
        };
        finished |= event.event_type() == EventType::RunFinished;

        let delivered = match project(&event, style) {
            Ok(lines) => {
                let mut delivered = true;
                for line in lines {
                    delivered = emit(updates, ChatUpdate::Line(line)).await;
                    if !delivered {
                        break;
                    }
                }
                delivered
            }
            Err(ProjectError::RunFailed { message, code }) => {
                warn!(%message, ?code, "run reported an error");
                let notice = match &code {
                    Some(code) => format!("Run failed ({code}): {message}"),
                    None => format!("Run failed: {message}"),
                };
                emit(updates, ChatUpdate::Notice(notice)).await;
                return Ok(ChatOutcome::RunFailed { message, code });
            }
            Err(err @ ProjectError::Unsupported(_)) => {
                emit(updates, ChatUpdate::Notice(err.to_string())).await
            }
        };
        if !delivered {
            return Ok(ChatOutcome::Cancelled);
        }
    }
}

async fn emit(updates: &mpsc::Sender<ChatUpdate>, update: ChatUpdate) -> bool {
    updates.send(update).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::errors::ConnectionError;
    use agentic_core::abort_pair;
    use agentic_server::config::ServerConfig;
    use axum::Router;
    use axum::routing::post;
    use std::time::Duration;

    const HAIKU_ARGS: &str = r#"{"japanese":["エーアイの","橋つなぐ道","コパキット"],"english":["From AI's realm","A bridge-road linking us—","CopilotKit."]}"#;

    async fn serve(app: Router) -> StreamClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        StreamClient::new(ClientConfig::default().endpoint(format!("http://{addr}/agentic")))
            .expect("client")
    }

    async fn serve_orchestrator(step_delay: Duration) -> StreamClient {
        let config = ServerConfig::default().step_delay(step_delay);
        serve(agentic_server::routes::router(config)).await
    }

    fn drain(rx: &mut mpsc::Receiver<ChatUpdate>) -> Vec<ChatUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update);
        }
        updates
    }

    fn line(text: &str) -> ChatUpdate {
        ChatUpdate::Line(DisplayLine {
            text: text.to_string(),
            color: None,
        })
    }

    #[test]
    fn run_input_carries_one_user_message() {
        let input = build_run_input("hello");
        assert!(input.thread_id.as_deref().is_some_and(|id| id.starts_with("thread-")));
        assert!(input.run_id.as_deref().is_some_and(|id| id.starts_with("run-")));
        assert_eq!(
            input.messages,
            vec![serde_json::json!({"id": "msg-1", "role": "user", "content": "hello"})]
        );
        assert!(input.tools.is_empty());
    }

    #[tokio::test]
    async fn full_run_against_the_server_projects_every_event() {
        let client = serve_orchestrator(Duration::ZERO).await;
        let (tx, mut rx) = mpsc::channel(32);
        let outcome = run_chat(
            &client,
            "write a haiku",
            &ProjectionStyle::default(),
            &tx,
            &mut AbortSignal::never(),
        )
        .await
        .expect("chat");
        assert_eq!(outcome, ChatOutcome::Finished);
        assert_eq!(
            drain(&mut rx),
            vec![
                line("Assistant: Run started"),
                line(&format!("Tool Call: generate_haiku - {HAIKU_ARGS}")),
                line("Assistant: Run finished"),
            ]
        );
    }

    #[tokio::test]
    async fn cancelling_mid_run_stops_cleanly() {
        let client = serve_orchestrator(Duration::from_secs(5)).await;
        let (tx, mut rx) = mpsc::channel(32);
        let (handle, mut cancel) = abort_pair();
        let chat = tokio::spawn(async move {
            run_chat(
                &client,
                "hi",
                &ProjectionStyle::default(),
                &tx,
                &mut cancel,
            )
            .await
        });
        let first = rx.recv().await.expect("first line");
        assert_eq!(first, line("Assistant: Run started"));
        handle.abort();
        let outcome = tokio::time::timeout(Duration::from_secs(2), chat)
            .await
            .expect("cancelled promptly")
            .expect("join")
            .expect("chat");
        assert_eq!(outcome, ChatOutcome::Cancelled);
    }

    #[tokio::test]
    async fn run_error_and_unsupported_events_become_notices() {
        let body = concat!(
            "data: {\"type\":\"RUN_STARTED\",\"threadId\":\"t\",\"runId\":\"r\"}\n\n",
            "data: {\"type\":\"STEP_STARTED\",\"stepName\":\"plan\"}\n\n",
            "data: {\"type\":\"RUN_ERROR\",\"message\":\"quota\",\"code\":\"E42\"}\n\n",
            "data: {\"type\":\"RUN_FINISHED\",\"threadId\":\"t\",\"runId\":\"r\"}\n\n",
        );
        let client = serve(Router::new().route("/agentic", post(move || async move { body }))).await;
        let (tx, mut rx) = mpsc::channel(32);
        let outcome = run_chat(
            &client,
            "hi",
            &ProjectionStyle::default(),
            &tx,
            &mut AbortSignal::never(),
        )
        .await
        .expect("chat");
        assert_eq!(
            outcome,
            ChatOutcome::RunFailed {
                message: "quota".into(),
                code: Some("E42".into())
            }
        );
        assert_eq!(
            drain(&mut rx),
            vec![
                line("Assistant: Run started"),
                ChatUpdate::Notice("event type STEP_STARTED is not yet supported".into()),
                ChatUpdate::Notice("Run failed (E42): quota".into()),
            ]
        );
    }

    #[tokio::test]
    async fn malformed_frame_ends_the_chat_with_an_error() {
        let body = "data: {\"type\":\"RUN_STARTED\"}\n\n";
        let client = serve(Router::new().route("/agentic", post(move || async move { body }))).await;
        let (tx, _rx) = mpsc::channel(32);
        let err = run_chat(
            &client,
            "hi",
            &ProjectionStyle::default(),
            &tx,
            &mut AbortSignal::never(),
        )
        .await
        .expect_err("schema mismatch");
        assert!(matches!(
            err,
            ChatError::Session(crate::errors::SessionError::EventProcessing(_))
        ));
    }

    #[tokio::test]
    async fn connection_failure_is_reported_once() {
        let client = StreamClient::new(
            ClientConfig::default().endpoint("http://127.0.0.1:9/agentic"),
        )
        .expect("client");
        let (tx, _rx) = mpsc::channel(1);
        let err = run_chat(
            &client,
            "hi",
            &ProjectionStyle::default(),
            &tx,
            &mut AbortSignal::never(),
        )
        .await
        .expect_err("refused");
        assert!(matches!(err, ChatError::Connection(ConnectionError::Send { .. })));
    }
}
