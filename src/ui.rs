//! Terminal rendering: search bar, cemetery list, status line, graves modal.
//!
//! Everything here is a pure function of [`AppState`]; the loop in `tui`
//! redraws the whole frame each tick. Only the label helpers carry tests.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::state::{AppState, InputMode};
use crate::types::overpass::OverpassElement;

/// Render the full UI for the current state.
pub fn draw(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // search bar
            Constraint::Min(3),    // cemetery list
            Constraint::Length(1), // status line
        ])
        .split(frame.size());

    render_search_bar(frame, state, chunks[0]);
    render_cemetery_list(frame, state, chunks[1]);
    render_status_line(frame, state, chunks[2]);

    if state.modal_open() {
        render_graves_modal(frame, state);
    }
}

fn render_search_bar(frame: &mut Frame, state: &AppState, area: Rect) {
    let editing = state.input_mode == InputMode::EditingArea;
    let (text, border_style) = if editing {
        (
            state.area_input.as_str(),
            Style::default().fg(Color::Yellow),
        )
    } else {
        (state.area.as_str(), Style::default())
    };

    let bar = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Area "),
    );
    frame.render_widget(bar, area);

    if editing {
        // Place the cursor after the edit buffer, clipped to the bar.
        let x = area.x + 1 + state.area_input.len().min(area.width.saturating_sub(2) as usize) as u16;
        frame.set_cursor(x, area.y + 1);
    }
}

fn render_cemetery_list(frame: &mut Frame, state: &AppState, area: Rect) {
    let title = format!(" Cemeteries in {} ", state.area);
    let block = Block::default().borders(Borders::ALL).title(title);

    if state.loading {
        frame.render_widget(Paragraph::new("Loading...").block(block), area);
        return;
    }
    if let Some(message) = &state.error {
        let error = Paragraph::new(Line::from(vec![
            Span::styled("Error: ", Style::default().fg(Color::Red)),
            Span::raw(message.as_str()),
        ]))
        .wrap(Wrap { trim: true })
        .block(block);
        frame.render_widget(error, area);
        return;
    }
    if state.cemeteries_loaded && state.cemeteries.is_empty() {
        frame.render_widget(Paragraph::new("No cemeteries found.").block(block), area);
        return;
    }

    let items: Vec<ListItem> = state
        .visible_cemeteries()
        .iter()
        .map(|element| ListItem::new(cemetery_label(element)))
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    if !state.cemeteries.is_empty() {
        list_state.select(Some(state.cursor));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_status_line(frame: &mut Frame, state: &AppState, area: Rect) {
    let hints = if state.modal_open() {
        "Esc: close"
    } else if state.input_mode == InputMode::EditingArea {
        "Enter: search  Esc: cancel"
    } else {
        "j/k: navigate  Enter: graves  /: edit area  q: quit"
    };
    let status = Paragraph::new(hints).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(status, area);
}

fn render_graves_modal(frame: &mut Frame, state: &AppState) {
    let Some(selected) = &state.selected else {
        return;
    };
    let area = centered_rect(60, 60, frame.size());
    let title = format!(
        " Graves in {} ",
        selected.name().unwrap_or("Unnamed cemetery")
    );
    let block = Block::default().borders(Borders::ALL).title(title);

    let body: Vec<Line> = if state.graves_loading {
        vec![Line::from("Loading graves...")]
    } else if let Some(message) = &state.graves_error {
        vec![Line::from(vec![
            Span::styled("Error: ", Style::default().fg(Color::Red)),
            Span::raw(message.as_str()),
        ])]
    } else if state.graves.is_empty() {
        vec![Line::from("No graves found in this cemetery.")]
    } else {
        state
            .graves
            .iter()
            .map(|grave| Line::from(format!("- {}", grave_label(grave))))
            .collect()
    };

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(body).wrap(Wrap { trim: true }).block(block),
        area,
    );
}

/// Centered rect taking the given percentage of `r` in each dimension.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// List row for a cemetery: name plus its OSM type and id.
pub fn cemetery_label(element: &OverpassElement) -> String {
    format!(
        "{} (type: {}, id: {})",
        element.name().unwrap_or("Unnamed cemetery"),
        element.element_type,
        element.id
    )
}

/// Modal row for a grave.
pub fn grave_label(element: &OverpassElement) -> String {
    match element.name() {
        Some(name) => name.to_string(),
        None => format!("Grave {}", element.id),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::types::overpass::ElementType;

    fn element(id: i64, element_type: ElementType, name: Option<&str>) -> OverpassElement {
        let mut tags = HashMap::new();
        if let Some(name) = name {
            tags.insert("name".to_string(), name.to_string());
        }
        OverpassElement {
            element_type,
            id,
            tags,
        }
    }

    #[test]
    fn test_cemetery_label_with_name() {
        let e = element(123, ElementType::Way, Some("Abney Park"));
        assert_eq!(cemetery_label(&e), "Abney Park (type: way, id: 123)");
    }

    #[test]
    fn test_cemetery_label_unnamed() {
        let e = element(7, ElementType::Relation, None);
        assert_eq!(cemetery_label(&e), "Unnamed cemetery (type: relation, id: 7)");
    }

    #[test]
    fn test_grave_label_falls_back_to_id() {
        let named = element(1, ElementType::Node, Some("Karl Marx"));
        let unnamed = element(42, ElementType::Node, None);
        assert_eq!(grave_label(&named), "Karl Marx");
        assert_eq!(grave_label(&unnamed), "Grave 42");
    }

    #[test]
    fn test_centered_rect_fits_inside_parent() {
        let parent = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(60, 60, parent);
        assert!(inner.width <= parent.width);
        assert!(inner.height <= parent.height);
        assert!(inner.x >= parent.x && inner.y >= parent.y);
    }
}
