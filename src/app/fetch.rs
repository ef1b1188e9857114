//! Async glue between the UI loop and the Overpass client.
//!
//! Each trigger spawns one tokio task that runs the query and sends its
//! outcome, tagged with the issuing ticket, over an unbounded channel. The UI
//! loop drains the channel every tick and hands outcomes to
//! [`AppState::apply_fetch`](super::state::AppState::apply_fetch), which drops
//! anything superseded. There is no cancellation; a stale task simply runs to
//! completion and its result is discarded at the apply step.

use tokio::sync::mpsc;
use tracing::debug;

use super::state::FetchTicket;
use crate::net::http::HttpClient;
use crate::overpass::OverpassApi;
use crate::types::overpass::OverpassElement;

/// Outcome of one spawned fetch. Errors arrive pre-rendered as the message
/// string the state stores.
#[derive(Debug)]
pub struct FetchOutcome {
    pub ticket: FetchTicket,
    pub result: Result<Vec<OverpassElement>, String>,
}

pub type OutcomeSender = mpsc::UnboundedSender<FetchOutcome>;
pub type OutcomeReceiver = mpsc::UnboundedReceiver<FetchOutcome>;

pub fn outcome_channel() -> (OutcomeSender, OutcomeReceiver) {
    mpsc::unbounded_channel()
}

/// Run the area query for `term` on a background task and deliver the outcome.
///
/// Both flows go through here: the drill-down reuses the cemetery query with
/// the selected cemetery's name as the area, and the state filters the
/// response down to graves when applying it.
pub fn spawn_fetch<C>(api: OverpassApi<C>, ticket: FetchTicket, term: String, tx: OutcomeSender)
where
    C: HttpClient + 'static,
{
    tokio::spawn(async move {
        let result = api
            .fetch_cemeteries_in_area(&term)
            .await
            .map_err(|e| e.to_string());
        if tx.send(FetchOutcome { ticket, result }).is_err() {
            debug!(?ticket, "dropping fetch outcome, receiver gone");
        }
    });
}
