//! Self-adjusting long-polling loop
//!
//! [`HttpClient::poll`](crate::HttpClient::poll) spawns a task that
//! repeatedly issues a GET to one URL. When the response payload is
//! unchanged from the previous cycle the interval grows by the configured
//! multiplier (clamped to `max_timeout`); a changed payload holds the
//! interval; a genuine failure resets the loop and retries at
//! `min_timeout`. Optional limits stop the loop after a total call count
//! (`max_calls`) or after a streak of unchanged responses (`auto_stop`).
//!
//! Exactly one request is in flight per loop at any time, and the success
//! or failure callback for a cycle always runs before the next cycle's
//! timer is armed. The returned [`PollHandle`] can restart the loop
//! (immediate new request from any state) or cancel it (no further
//! requests are issued once `cancel` returns).

pub mod config;
mod session;

use reqwest::Method;
use tokio::sync::mpsc;
use tokio::time;

use crate::cancel::CancelSource;
use crate::client::config::{RequestConfig, RequestDescriptor};
use crate::client::response::HttpResponse;
use crate::client::HttpClient;
use crate::errors::{HttpollError, Result};
pub use config::{MapSource, PollConfig};
use session::{Cycle, PollSession};

enum Command {
    Restart(Option<String>),
}

/// External control over a running poll loop.
///
/// Dropping the handle does not stop the loop; only `cancel`, `max_calls`,
/// or `auto_stop` do.
pub struct PollHandle {
    commands: mpsc::UnboundedSender<Command>,
    source: CancelSource,
}

impl PollHandle {
    /// Reset the session (logging `message` when given) and issue a new
    /// request immediately, bypassing any pending timer or in-flight
    /// request. Works from any state, including after a terminal stop.
    pub fn restart(&self, message: Option<&str>) {
        let _ = self
            .commands
            .send(Command::Restart(message.map(str::to_string)));
    }

    /// Stop the loop (logging `message` when given) and cancel any
    /// in-flight transport operation. Once this returns, no further
    /// request will be issued.
    pub fn cancel(&self, message: Option<&str>) {
        if let Some(message) = message {
            tracing::info!("{message}");
        }
        self.source.cancel(None);
    }
}

#[derive(Debug, Clone, Copy)]
enum State {
    /// Timer armed for the next request.
    Scheduled(time::Duration),
    /// Request issued, awaiting settlement.
    InFlight,
    /// Terminally stopped for this run; only restart or cancel leave this.
    Idle,
    /// Loop finished.
    Done,
}

struct Poller<S, F> {
    client: HttpClient,
    url: String,
    headers: MapSource,
    params: MapSource,
    session: PollSession,
    on_success: S,
    on_failure: F,
    source: CancelSource,
    commands: mpsc::UnboundedReceiver<Command>,
}

pub(crate) fn spawn<S, F>(
    client: HttpClient,
    url: String,
    config: PollConfig,
    on_success: S,
    on_failure: F,
) -> PollHandle
where
    S: FnMut(HttpResponse) + Send + 'static,
    F: FnMut(HttpollError) + Send + 'static,
{
    let source = CancelSource::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let session = PollSession::new(&config);
    let run_at_once = config.run_at_once;
    let poller = Poller {
        client,
        url,
        headers: config.headers,
        params: config.params,
        session,
        on_success,
        on_failure,
        source: source.clone(),
        commands: rx,
    };
    tokio::spawn(poller.run(run_at_once));
    PollHandle {
        commands: tx,
        source,
    }
}

/// Next control command; parks forever once the handle is gone so a
/// detached loop keeps polling instead of spinning on a closed channel.
async fn next_command(commands: &mut mpsc::UnboundedReceiver<Command>) -> Command {
    loop {
        match commands.recv().await {
            Some(command) => return command,
            None => futures::future::pending::<()>().await,
        }
    }
}

impl<S, F> Poller<S, F>
where
    S: FnMut(HttpResponse) + Send + 'static,
    F: FnMut(HttpollError) + Send + 'static,
{
    async fn run(mut self, run_at_once: bool) {
        let mut state = if run_at_once {
            State::InFlight
        } else {
            State::Scheduled(self.session.interval())
        };

        loop {
            state = match state {
                State::Scheduled(delay) => {
                    tokio::select! {
                        biased;
                        () = self.source.cancelled() => State::Done,
                        command = next_command(&mut self.commands) => self.apply(command),
                        () = time::sleep(delay) => State::InFlight,
                    }
                }
                State::InFlight => {
                    // The request future owns its own client clone so the
                    // select can also borrow the command channel.
                    let descriptor = self.descriptor();
                    let client = self.client.clone();
                    let request = async move { client.send(descriptor).await };
                    tokio::pin!(request);
                    tokio::select! {
                        biased;
                        () = self.source.cancelled() => State::Done,
                        command = next_command(&mut self.commands) => self.apply(command),
                        result = &mut request => self.settle(result),
                    }
                }
                State::Idle => {
                    tokio::select! {
                        biased;
                        () = self.source.cancelled() => State::Done,
                        command = self.commands.recv() => match command {
                            Some(command) => self.apply(command),
                            // Stopped and unreachable: nothing left to do.
                            None => State::Done,
                        },
                    }
                }
                State::Done => return,
            };
        }
    }

    fn apply(&mut self, command: Command) -> State {
        match command {
            Command::Restart(message) => {
                self.session.reset(message.as_deref());
                State::InFlight
            }
        }
    }

    fn descriptor(&self) -> RequestDescriptor {
        let mut config = RequestConfig::new();
        config.headers = self.headers.resolve();
        config.params = self.params.resolve().into_iter().collect();
        RequestDescriptor::simple(Method::GET, &self.url, Some(config))
    }

    fn settle(&mut self, result: Result<HttpResponse>) -> State {
        match result {
            Ok(response) => {
                let cycle = self.session.on_response(response.fingerprint());
                (self.on_success)(response);
                match cycle {
                    Cycle::Schedule(delay) => State::Scheduled(delay),
                    Cycle::Stop => State::Idle,
                }
            }
            // A cancelled request ends the loop silently: no callback,
            // no reschedule.
            Err(err) if err.is_cancel() => State::Done,
            Err(err) => {
                let cycle = self.session.on_failure();
                (self.on_failure)(err);
                match cycle {
                    Cycle::Schedule(delay) => State::Scheduled(delay),
                    Cycle::Stop => State::Idle,
                }
            }
        }
    }
}
