use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use agentic_client::{
    ChatError, ChatOutcome, ChatUpdate, ClientConfig, DecodeFailurePolicy, StreamClient, run_chat,
};
use agentic_core::observability::{ConsoleTarget, init_observability_with};
use agentic_core::{AbortHandle, ProjectionStyle, abort_pair};
use anyhow::Context as _;
use clap::Parser;
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;

#[derive(Parser, Debug)]
#[command(
    name = "agentic-client",
    version,
    about = "Stream an agent run and print it line by line"
)]
struct Cli {
    /// Run endpoint URL (overrides AGENTIC_ENDPOINT).
    #[arg(long)]
    endpoint: Option<String>,

    /// Send one message, print the run and exit.
    #[arg(short, long)]
    message: Option<String>,

    /// Skip frames that fail to decode instead of ending the run.
    #[arg(long)]
    skip_bad_frames: bool,

    /// Print without ANSI colours.
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_observability_with(ConsoleTarget::Stderr);

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::from_env().context("invalid client configuration")?;
    if let Some(endpoint) = cli.endpoint {
        config = config.endpoint(endpoint);
    }
    if cli.skip_bad_frames {
        config = config.decode_failure(DecodeFailurePolicy::Skip);
    }
    let client = StreamClient::new(config)?;
    let style = if cli.no_color {
        ProjectionStyle::default()
    } else {
        ProjectionStyle::colored()
    };

    let interrupts = Interrupts::default();
    let listener = interrupts.listen();
    let (tx, rx) = mpsc::channel(64);
    let printer = tokio::spawn(print_updates(rx));
    let result = match cli.message {
        Some(text) => headless(&client, &text, &style, &tx, &interrupts).await,
        None => interactive(&client, &style, &tx, &interrupts).await,
    };
    listener.abort();
    drop(tx);
    printer.await.context("printer task failed")?;
    result
}

/// Front end actor: the only writer to stdout.
async fn print_updates(mut rx: mpsc::Receiver<ChatUpdate>) {
    while let Some(update) = rx.recv().await {
        match update {
            ChatUpdate::Line(line) => println!("{}", line.render()),
            ChatUpdate::Notice(notice) => println!("[{notice}]"),
        }
    }
}

/// Routes Ctrl-C: cancels the run in flight, or tells an idle prompt to exit.
///
/// One listener lives for the whole process, so Ctrl-C keeps working between
/// runs.
#[derive(Clone, Default)]
struct Interrupts {
    in_flight: Arc<Mutex<Option<AbortHandle>>>,
    idle_quit: Arc<Notify>,
}

impl Interrupts {
    fn listen(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                this.interrupt();
            }
        })
    }

    fn interrupt(&self) {
        match self.take_run() {
            Some(handle) => handle.abort(),
            None => self.idle_quit.notify_one(),
        }
    }

    fn begin_run(&self, handle: AbortHandle) {
        if let Ok(mut slot) = self.in_flight.lock() {
            *slot = Some(handle);
        }
    }

    fn take_run(&self) -> Option<AbortHandle> {
        self.in_flight.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Runs one chat; Ctrl-C while it is in flight aborts it.
async fn chat_once(
    client: &StreamClient,
    text: &str,
    style: &ProjectionStyle,
    tx: &mpsc::Sender<ChatUpdate>,
    interrupts: &Interrupts,
) -> Result<ChatOutcome, ChatError> {
    let (handle, mut cancel) = abort_pair();
    interrupts.begin_run(handle);
    let outcome = run_chat(client, text, style, tx, &mut cancel).await;
    interrupts.take_run();
    outcome
}

async fn headless(
    client: &StreamClient,
    text: &str,
    style: &ProjectionStyle,
    tx: &mpsc::Sender<ChatUpdate>,
    interrupts: &Interrupts,
) -> anyhow::Result<()> {
    match chat_once(client, text, style, tx, interrupts).await? {
        ChatOutcome::RunFailed { message, code } => match code {
            Some(code) => anyhow::bail!("run failed ({code}): {message}"),
            None => anyhow::bail!("run failed: {message}"),
        },
        ChatOutcome::Finished | ChatOutcome::Ended | ChatOutcome::Cancelled => Ok(()),
    }
}

async fn interactive(
    client: &StreamClient,
    style: &ProjectionStyle,
    tx: &mpsc::Sender<ChatUpdate>,
    interrupts: &Interrupts,
) -> anyhow::Result<()> {
    eprintln!(
        "Type a message and press Enter. Ctrl-C cancels a run; at the prompt, Ctrl-C, Ctrl-D or /quit exits."
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = interrupts.idle_quit.notified() => break,
        };
        let Some(line) = line else {
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" {
            break;
        }
        let notice = match chat_once(client, text, style, tx, interrupts).await {
            Ok(ChatOutcome::Cancelled) => Some("Run cancelled".to_string()),
            Ok(ChatOutcome::Ended) => Some("Stream closed before the run finished".to_string()),
            Ok(ChatOutcome::Finished | ChatOutcome::RunFailed { .. }) => None,
            Err(err) => Some(format!("Error: {err}")),
        };
        if let Some(notice) = notice {
            let _ = tx.send(ChatUpdate::Notice(notice)).await;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt as _;

    #[test]
    fn interrupt_cancels_the_run_in_flight_only() {
        let interrupts = Interrupts::default();
        let (handle, signal) = abort_pair();
        interrupts.begin_run(handle);

        interrupts.interrupt();
        assert!(signal.is_aborted());
        assert!(interrupts.idle_quit.notified().now_or_never().is_none());
    }

    #[test]
    fn interrupt_at_an_idle_prompt_requests_exit() {
        let interrupts = Interrupts::default();
        interrupts.interrupt();
        assert!(interrupts.idle_quit.notified().now_or_never().is_some());
    }

    #[test]
    fn finished_run_no_longer_receives_interrupts() {
        let interrupts = Interrupts::default();
        let (handle, signal) = abort_pair();
        interrupts.begin_run(handle);
        interrupts.take_run();

        interrupts.interrupt();
        assert!(!signal.is_aborted());
        assert!(interrupts.idle_quit.notified().now_or_never().is_some());
    }
}
