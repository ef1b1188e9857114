//! Session state for the two fetch flows: the area search and the per-cemetery
//! grave drill-down.
//!
//! All mutation happens on the UI task. Each flow follows the same shape,
//! `Idle -> Loading -> {Success | Failed}`, and is re-entrant: a new trigger
//! returns to Loading and overwrites whatever came before. Every fetch is
//! issued a [`FetchTicket`] carrying a per-flow sequence number; an outcome is
//! applied only if its number is still the latest issued, so a slow superseded
//! request can never overwrite newer state.

use tracing::debug;

use crate::overpass::GRAVE_AMENITY;
use crate::types::overpass::OverpassElement;

/// At most this many cemeteries are listed.
pub const LIST_CAP: usize = 10;

/// Which fetch flow an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Cemeteries,
    Graves,
}

/// Handed out when a flow enters Loading. The outcome of the spawned fetch
/// must present the same ticket to be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub flow: Flow,
    pub seq: u64,
}

/// How key input is currently interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Browsing,
    EditingArea,
}

/// Central state container, the single source of truth for the session.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Current search term; changes only on explicit submission.
    pub area: String,
    /// Edit buffer for the search bar, committed into `area` on submit.
    pub area_input: String,
    pub input_mode: InputMode,

    /// Cemeteries from the last successful area search.
    pub cemeteries: Vec<OverpassElement>,
    pub loading: bool,
    pub error: Option<String>,
    /// Distinguishes an empty result from "not fetched yet".
    pub cemeteries_loaded: bool,
    /// Cursor into the visible portion of `cemeteries`.
    pub cursor: usize,

    /// The cemetery whose graves are shown in the modal, if any.
    pub selected: Option<OverpassElement>,
    pub graves: Vec<OverpassElement>,
    pub graves_loading: bool,
    pub graves_error: Option<String>,

    // Latest-issued sequence number per flow. Outcomes carrying an older
    // number are stale and get discarded.
    cemeteries_seq: u64,
    graves_seq: u64,
}

impl AppState {
    pub fn new(area: &str) -> Self {
        Self {
            area: area.to_string(),
            area_input: area.to_string(),
            ..Self::default()
        }
    }

    /// Start the area-search flow for `area`. Clears the previous error,
    /// raises the loading flag, and issues a fresh ticket.
    pub fn begin_area_search(&mut self, area: String) -> FetchTicket {
        self.area = area;
        self.loading = true;
        self.error = None;
        self.cemeteries_seq += 1;
        FetchTicket {
            flow: Flow::Cemeteries,
            seq: self.cemeteries_seq,
        }
    }

    /// Start the drill-down flow for the cemetery under the cursor.
    ///
    /// Returns the ticket plus the query term: the cemetery's `name` tag, or
    /// the current area when the element is unnamed. Reusing the name as an
    /// Overpass area is an approximation of a real bounding query.
    pub fn begin_selection(&mut self) -> Option<(FetchTicket, String)> {
        let element = self.visible_cemeteries().get(self.cursor)?.clone();
        let term = element.name().unwrap_or(&self.area).to_string();

        self.selected = Some(element);
        self.graves = Vec::new();
        self.graves_loading = true;
        self.graves_error = None;
        self.graves_seq += 1;

        let ticket = FetchTicket {
            flow: Flow::Graves,
            seq: self.graves_seq,
        };
        Some((ticket, term))
    }

    /// Apply a fetch outcome, unless its ticket has been superseded.
    pub fn apply_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<OverpassElement>, String>,
    ) {
        let latest = match ticket.flow {
            Flow::Cemeteries => self.cemeteries_seq,
            Flow::Graves => self.graves_seq,
        };
        if ticket.seq != latest {
            debug!(?ticket, latest, "discarding stale fetch outcome");
            return;
        }

        match ticket.flow {
            Flow::Cemeteries => {
                self.loading = false;
                match result {
                    Ok(elements) => {
                        self.cemeteries = elements;
                        self.cemeteries_loaded = true;
                        self.clamp_cursor();
                    }
                    Err(message) => self.error = Some(message),
                }
            }
            Flow::Graves => {
                self.graves_loading = false;
                match result {
                    Ok(elements) => {
                        // The drill-down reuses the cemetery query, so the
                        // response mixes amenity values; keep only graves.
                        self.graves = elements
                            .into_iter()
                            .filter(|e| e.tag("amenity") == Some(GRAVE_AMENITY))
                            .collect();
                    }
                    Err(message) => self.graves_error = Some(message),
                }
            }
        }
    }

    /// Dismiss the graves modal. Only `selected` is cleared; the sub-state
    /// fields are reset by the next selection's entry into Loading.
    pub fn close_modal(&mut self) {
        self.selected = None;
    }

    pub fn modal_open(&self) -> bool {
        self.selected.is_some()
    }

    /// The portion of `cemeteries` shown in the list.
    pub fn visible_cemeteries(&self) -> &[OverpassElement] {
        &self.cemeteries[..self.cemeteries.len().min(LIST_CAP)]
    }

    pub fn move_cursor_down(&mut self) {
        let len = self.visible_cemeteries().len();
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor + 1) % len;
    }

    pub fn move_cursor_up(&mut self) {
        let len = self.visible_cemeteries().len();
        if len == 0 {
            return;
        }
        if self.cursor == 0 {
            self.cursor = len - 1;
        } else {
            self.cursor -= 1;
        }
    }

    pub fn start_area_edit(&mut self) {
        self.area_input = self.area.clone();
        self.input_mode = InputMode::EditingArea;
    }

    pub fn cancel_area_edit(&mut self) {
        self.area_input = self.area.clone();
        self.input_mode = InputMode::Browsing;
    }

    pub fn push_input_char(&mut self, c: char) {
        self.area_input.push(c);
    }

    pub fn pop_input_char(&mut self) {
        self.area_input.pop();
    }

    /// Commit the edit buffer and kick off a new area search. A blank buffer
    /// leaves the current area untouched.
    pub fn submit_area_edit(&mut self) -> Option<FetchTicket> {
        self.input_mode = InputMode::Browsing;
        let submitted = self.area_input.trim().to_string();
        if submitted.is_empty() {
            self.area_input = self.area.clone();
            return None;
        }
        Some(self.begin_area_search(submitted))
    }

    fn clamp_cursor(&mut self) {
        let len = self.visible_cemeteries().len();
        if len == 0 {
            self.cursor = 0;
        } else {
            self.cursor = self.cursor.min(len - 1);
        }
    }
}
