//! Terminal lifecycle and the main event loop.
//!
//! Raw mode and the alternate screen are acquired on entry and restored on
//! drop, so a panic or early return still leaves the terminal usable. The
//! loop drains fetch outcomes, redraws, then polls for key input with a short
//! timeout.

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use crate::app::fetch::{outcome_channel, spawn_fetch, OutcomeSender};
use crate::app::state::{AppState, InputMode};
use crate::net::http::HttpClient;
use crate::overpass::OverpassApi;
use crate::ui;

const TICK_RATE: Duration = Duration::from_millis(50);

struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Tui {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }

    fn restore(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Run the interactive session until the user quits.
pub async fn run<C>(api: OverpassApi<C>, initial_area: String) -> color_eyre::Result<()>
where
    C: HttpClient + Clone + 'static,
{
    let mut tui = Tui::new()?;
    let mut state = AppState::new(&initial_area);
    let (tx, mut rx) = outcome_channel();

    // Startup behavior: run the area search once with the initial area.
    let ticket = state.begin_area_search(initial_area);
    spawn_fetch(api.clone(), ticket, state.area.clone(), tx.clone());

    loop {
        while let Ok(outcome) = rx.try_recv() {
            state.apply_fetch(outcome.ticket, outcome.result);
        }

        tui.terminal.draw(|frame| ui::draw(frame, &state))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(key.code, &mut state, &api, &tx) {
                    break;
                }
            }
        }
    }

    info!("session ended");
    Ok(())
}

/// Apply one key press to the state, spawning fetches for triggers.
/// Returns true when the user quits.
fn handle_key<C>(
    code: KeyCode,
    state: &mut AppState,
    api: &OverpassApi<C>,
    tx: &OutcomeSender,
) -> bool
where
    C: HttpClient + Clone + 'static,
{
    if state.input_mode == InputMode::EditingArea {
        match code {
            KeyCode::Enter => {
                if let Some(ticket) = state.submit_area_edit() {
                    spawn_fetch(api.clone(), ticket, state.area.clone(), tx.clone());
                }
            }
            KeyCode::Esc => state.cancel_area_edit(),
            KeyCode::Backspace => state.pop_input_char(),
            KeyCode::Char(c) => state.push_input_char(c),
            _ => {}
        }
        return false;
    }

    if state.modal_open() {
        if matches!(code, KeyCode::Esc | KeyCode::Char('q')) {
            state.close_modal();
        }
        return false;
    }

    match code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('/') => state.start_area_edit(),
        KeyCode::Down | KeyCode::Char('j') => state.move_cursor_down(),
        KeyCode::Up | KeyCode::Char('k') => state.move_cursor_up(),
        KeyCode::Enter => {
            if let Some((ticket, term)) = state.begin_selection() {
                spawn_fetch(api.clone(), ticket, term, tx.clone());
            }
        }
        _ => {}
    }
    false
}

// Key handling is exercised directly; the loop itself needs a real terminal.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::fetch::OutcomeReceiver;
    use crate::net::http::tests::MockHttpClient;

    fn fixture() -> (AppState, OverpassApi<MockHttpClient>, OutcomeSender, OutcomeReceiver) {
        let api = OverpassApi::new(MockHttpClient::default());
        let (tx, rx) = outcome_channel();
        (AppState::new("London"), api, tx, rx)
    }

    #[tokio::test]
    async fn test_quit_from_browsing_only() {
        let (mut state, api, tx, _rx) = fixture();
        assert!(handle_key(KeyCode::Char('q'), &mut state, &api, &tx));

        state.start_area_edit();
        assert!(!handle_key(KeyCode::Char('q'), &mut state, &api, &tx));
        assert_eq!(state.area_input, "Londonq");
    }

    #[tokio::test]
    async fn test_submit_edit_spawns_search() {
        let (mut state, api, tx, mut rx) = fixture();
        handle_key(KeyCode::Char('/'), &mut state, &api, &tx);
        for _ in 0.."London".len() {
            handle_key(KeyCode::Backspace, &mut state, &api, &tx);
        }
        for c in "Paris".chars() {
            handle_key(KeyCode::Char(c), &mut state, &api, &tx);
        }
        handle_key(KeyCode::Enter, &mut state, &api, &tx);

        assert_eq!(state.area, "Paris");
        assert!(state.loading);
        let outcome = rx.recv().await.unwrap();
        state.apply_fetch(outcome.ticket, outcome.result);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_esc_closes_modal_before_quit() {
        let (mut state, api, tx, mut rx) = fixture();
        let ticket = state.begin_area_search("London".into());
        state.apply_fetch(
            ticket,
            Ok(vec![crate::types::overpass::OverpassElement {
                element_type: crate::types::overpass::ElementType::Way,
                id: 1,
                tags: std::collections::HashMap::new(),
            }]),
        );

        handle_key(KeyCode::Enter, &mut state, &api, &tx);
        assert!(state.modal_open());
        let outcome = rx.recv().await.unwrap();
        state.apply_fetch(outcome.ticket, outcome.result);

        assert!(!handle_key(KeyCode::Esc, &mut state, &api, &tx));
        assert!(!state.modal_open());
        assert!(handle_key(KeyCode::Char('q'), &mut state, &api, &tx));
    }
}
