use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::models::Client;
use crate::store::SelectionStore;
use crate::ui::{format_currency, format_date};

const CARD_COLUMNS: usize = 3;
const CARD_HEIGHT: u16 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Table,
    Cards,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Table => ViewMode::Cards,
            ViewMode::Cards => ViewMode::Table,
        }
    }
}

fn checkbox(selected: bool) -> &'static str {
    if selected { "[x]" } else { "[ ]" }
}

pub fn render_client_table<B: Backend>(
    frame: &mut Frame<B>,
    area: Rect,
    title: &str,
    clients: &[&Client],
    selection: &SelectionStore,
    table_state: &mut TableState,
) {
    let header_cells = ["", "Name", "Company valuation", "Salary", "Created", "Updated"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells)
        .style(Style::default())
        .height(1)
        .bottom_margin(1);

    let rows = clients.iter().map(|client| {
        Row::new(vec![
            Cell::from(checkbox(selection.is_client_selected(client.id))),
            Cell::from(client.name.clone()),
            Cell::from(format_currency(client.company_valuation)),
            Cell::from(format_currency(client.salary)),
            Cell::from(format_date(client.created_at)),
            Cell::from(format_date(client.updated_at)),
        ])
        .height(1)
    });

    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .widths(&[
            Constraint::Length(4),
            Constraint::Percentage(26),
            Constraint::Percentage(20),
            Constraint::Percentage(18),
            Constraint::Percentage(14),
            Constraint::Percentage(14),
        ]);

    frame.render_stateful_widget(table, area, table_state);
}

/// Lays the clients out as a grid of cards, scrolled so the highlighted
/// card stays visible.
pub fn render_client_cards<B: Backend>(
    frame: &mut Frame<B>,
    area: Rect,
    title: &str,
    clients: &[&Client],
    selection: &SelectionStore,
    highlighted: Option<usize>,
) {
    let outer = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    if clients.is_empty() || inner.height < CARD_HEIGHT {
        return;
    }

    let visible_rows = (inner.height / CARD_HEIGHT) as usize;
    let highlighted_row = highlighted.unwrap_or(0) / CARD_COLUMNS;
    let first_row = highlighted_row.saturating_sub(visible_rows.saturating_sub(1));

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
        .split(inner);

    for (slot, row_area) in row_areas.iter().enumerate() {
        let row = first_row + slot;
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, CARD_COLUMNS as u32); CARD_COLUMNS])
            .split(*row_area);

        for (col, cell) in cells.iter().enumerate() {
            let index = row * CARD_COLUMNS + col;
            let Some(client) = clients.get(index) else {
                return;
            };
            let is_highlighted = highlighted == Some(index);
            let border = if is_highlighted {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let card = Paragraph::new(vec![
                Spans::from(Span::styled(
                    client.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Spans::from(format!("Salary: {}", format_currency(client.salary))),
                Spans::from(format!(
                    "Company: {}",
                    format_currency(client.company_valuation)
                )),
                Spans::from(format!("Since {}", format_date(client.created_at))),
            ])
            .block(
                Block::default()
                    .title(format!(
                        "{} #{}",
                        checkbox(selection.is_client_selected(client.id)),
                        client.id
                    ))
                    .borders(Borders::ALL)
                    .border_style(border),
            );
            frame.render_widget(card, *cell);
        }
    }
}

/// Keeps a cursor inside a list of `len` items, wrapping at both ends.
pub fn step(current: Option<usize>, len: usize, forward: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let next = match current {
        Some(i) if i >= len => len - 1,
        Some(i) if forward => {
            if i >= len - 1 {
                0
            } else {
                i + 1
            }
        }
        Some(i) => {
            if i == 0 {
                len - 1
            } else {
                i - 1
            }
        }
        None => 0,
    };
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_wraps_and_clamps() {
        assert_eq!(step(None, 0, true), None);
        assert_eq!(step(None, 3, true), Some(0));
        assert_eq!(step(Some(2), 3, true), Some(0));
        assert_eq!(step(Some(0), 3, false), Some(2));
        assert_eq!(step(Some(7), 3, true), Some(2));
    }

    #[test]
    fn view_mode_toggles() {
        assert_eq!(ViewMode::default().toggled(), ViewMode::Cards);
        assert_eq!(ViewMode::Cards.toggled(), ViewMode::Table);
    }
}
