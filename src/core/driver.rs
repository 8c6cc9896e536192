//! Background actor that owns a [`ConversionSession`] and talks to the rate provider.
//!
//! Inputs arrive over a channel. Amount edits are debounced before anything is
//! fetched; currency changes are applied immediately. Fetches run as detached
//! tasks and report back through an internal channel, where the session drops
//! any result that no longer matches the current inputs.

use super::currency::RateTableProvider;
use super::rates::RateTable;
use super::session::{ConversionSession, ConversionStatus, FetchTicket, InputOutcome};
use super::theme::Theme;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    Base(String),
    Target(String),
    Amount(String),
    Swap,
    Retry,
    ToggleTheme,
    Quit,
}

/// Everything the view needs to render one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub base: String,
    pub target: String,
    pub amount: f64,
    pub status: ConversionStatus,
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    State(SessionSnapshot),
    /// Input was refused; the state is unchanged.
    Notice(String),
}

fn snapshot(session: &ConversionSession, theme: Theme) -> SessionSnapshot {
    SessionSnapshot {
        base: session.base().to_string(),
        target: session.target().to_string(),
        amount: session.amount(),
        status: session.status().clone(),
        theme,
    }
}

type FetchResult = (FetchTicket, Result<RateTable>);

fn spawn_fetch<P>(provider: &Arc<P>, ticket: FetchTicket, result_tx: &Sender<FetchResult>)
where
    P: RateTableProvider + ?Sized + 'static,
{
    let provider = Arc::clone(provider);
    let result_tx = result_tx.clone();
    tokio::spawn(async move {
        let result = provider.fetch_table().await;
        let _ = result_tx.send((ticket, result)).await;
    });
}

/// Re-derives from the held table if possible, otherwise issues a fetch.
fn refresh<P>(session: &mut ConversionSession, provider: &Arc<P>, result_tx: &Sender<FetchResult>)
where
    P: RateTableProvider + ?Sized + 'static,
{
    if !session.recompute_locally() {
        let ticket = session.begin_fetch();
        spawn_fetch(provider, ticket, result_tx);
    }
}

/// Runs until a `Quit` input arrives or the input channel closes.
pub async fn run_session_actor<P>(
    provider: Arc<P>,
    mut session: ConversionSession,
    mut theme: Theme,
    debounce: Duration,
    mut input_rx: Receiver<SessionInput>,
    update_tx: Sender<SessionUpdate>,
) where
    P: RateTableProvider + ?Sized + 'static,
{
    let (result_tx, mut result_rx) = mpsc::channel::<FetchResult>(16);
    let mut pending_fetch: Option<Instant> = None;

    let ticket = session.begin_fetch();
    spawn_fetch(&provider, ticket, &result_tx);
    let _ = update_tx
        .send(SessionUpdate::State(snapshot(&session, theme)))
        .await;

    loop {
        let deadline = pending_fetch.unwrap_or_else(Instant::now);

        tokio::select! {
            input = input_rx.recv() => {
                let Some(input) = input else {
                    break;
                };
                debug!(?input, "Session input");

                let (outcome, currency_changed) = match input {
                    SessionInput::Quit => break,
                    SessionInput::ToggleTheme => {
                        theme = theme.toggle();
                        (InputOutcome::Changed, false)
                    }
                    SessionInput::Retry => {
                        pending_fetch = None;
                        let ticket = session.retry();
                        spawn_fetch(&provider, ticket, &result_tx);
                        (InputOutcome::Changed, false)
                    }
                    SessionInput::Amount(text) => {
                        let outcome = session.set_amount(&text);
                        if outcome == InputOutcome::Changed && !session.recompute_locally() {
                            session.mark_pending();
                            pending_fetch = Some(Instant::now() + debounce);
                        }
                        (outcome, false)
                    }
                    SessionInput::Base(code) => (session.set_base(&code), true),
                    SessionInput::Target(code) => (session.set_target(&code), true),
                    SessionInput::Swap => (session.swap(), true),
                };

                let update = match outcome {
                    InputOutcome::Rejected(message) => SessionUpdate::Notice(message),
                    InputOutcome::Unchanged => continue,
                    InputOutcome::Changed => {
                        if currency_changed {
                            pending_fetch = None;
                            refresh(&mut session, &provider, &result_tx);
                        }
                        SessionUpdate::State(snapshot(&session, theme))
                    }
                };
                if update_tx.send(update).await.is_err() {
                    break;
                }
            }
            Some((ticket, result)) = result_rx.recv() => {
                if session.complete(&ticket, result)
                    && update_tx
                        .send(SessionUpdate::State(snapshot(&session, theme)))
                        .await
                        .is_err()
                {
                    break;
                }
            }
            _ = sleep_until(deadline), if pending_fetch.is_some() => {
                pending_fetch = None;
                refresh(&mut session, &provider, &result_tx);
                if update_tx
                    .send(SessionUpdate::State(snapshot(&session, theme)))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }
    }

    info!("Conversion session closed");
}
