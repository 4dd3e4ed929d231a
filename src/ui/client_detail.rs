use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::models::{Client, ClientId};
use crate::ui::{centered_rect, format_currency, format_date};

pub enum ClientDetailAction {
    Back,
    Edit(ClientId),
    ToggleSelection(ClientId),
}

/// A snapshot of the requested client, or `None` when it could not be found.
pub struct ClientDetailState {
    requested: ClientId,
    client: Option<Client>,
}

impl ClientDetailState {
    pub fn new(requested: ClientId, client: Option<Client>) -> Self {
        Self { requested, client }
    }

    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }
}

fn info_line(label: &str, value: String) -> Spans<'static> {
    Spans::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::Yellow)),
        Span::raw(value),
    ])
}

pub fn render_client_detail<B: Backend>(
    frame: &mut Frame<B>,
    state: &mut ClientDetailState,
    selected: bool,
) {
    let Some(client) = &state.client else {
        let popup = Paragraph::new(vec![
            Spans::from(""),
            Spans::from(Span::styled(
                "Client not found",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Spans::from(""),
            Spans::from(format!("No client with id {} exists.", state.requested)),
            Spans::from(""),
            Spans::from("<Esc> Back to the list"),
        ])
        .block(Block::default().title("Not found").borders(Borders::ALL));
        frame.render_widget(popup, centered_rect(50, 30, frame.size()));
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(6),
                Constraint::Length(5),
                Constraint::Min(1),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(frame.size());

    let title = Paragraph::new(Spans::from(Span::styled(
        format!("Client details: {}", client.name),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    let profile = Paragraph::new(vec![
        info_line("Id", client.id.to_string()),
        info_line("Name", client.name.clone()),
        info_line("Salary", format_currency(client.salary)),
        info_line("Company valuation", format_currency(client.company_valuation)),
    ])
    .block(Block::default().title("Profile").borders(Borders::ALL));
    frame.render_widget(profile, chunks[1]);

    let audit = Paragraph::new(vec![
        info_line("Created", format_date(client.created_at)),
        info_line("Last updated", format_date(client.updated_at)),
        info_line("Selected", if selected { "yes" } else { "no" }.to_string()),
    ])
    .block(Block::default().title("Record").borders(Borders::ALL));
    frame.render_widget(audit, chunks[2]);

    let help = Paragraph::new("<E> Edit client | <Space> Select/Unselect | <Esc> Back")
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help, chunks[4]);
}

pub fn handle_key(state: &ClientDetailState, key: KeyCode) -> Option<ClientDetailAction> {
    match key {
        KeyCode::Char('q') | KeyCode::Esc => Some(ClientDetailAction::Back),
        KeyCode::Char('e') => state.client().map(|c| ClientDetailAction::Edit(c.id)),
        KeyCode::Char(' ') => state.client().map(|c| ClientDetailAction::ToggleSelection(c.id)),
        _ => None,
    }
}

pub fn handle_input(state: &ClientDetailState) -> Result<Option<ClientDetailAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(state, key.code));
    }
    Ok(None)
}
