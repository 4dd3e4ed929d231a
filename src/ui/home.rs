use anyhow::Result;
use chrono::Local;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::workspace::Workspace;

pub enum HomeAction {
    Clients,
    SelectedClients,
    ClearSelection,
    Logout,
    Quit,
}

#[derive(Default)]
pub struct HomeState {
    notice: Option<String>,
}

impl HomeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }
}

pub fn render_home<B: Backend>(frame: &mut Frame<B>, state: &mut HomeState, workspace: &Workspace) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(4),
                Constraint::Length(5),
                Constraint::Min(6),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(frame.size());

    let user = workspace.session.user().unwrap_or_default();
    let header = Paragraph::new(vec![
        Spans::from(Span::styled(
            "Dashboard",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Spans::from(if workspace.is_local() {
            format!("Hello {user}, welcome back! (local mode)")
        } else {
            format!("Hello {user}, welcome back!")
        }),
    ])
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    render_stats(frame, chunks[1], workspace);

    let selected = workspace.selection.len();
    let actions: Vec<ListItem> = [
        "<C> Manage clients: view, edit and add clients".to_string(),
        format!("<S> Selected clients: review marked clients ({selected})"),
        if workspace.selection.is_empty() {
            "<X> Clear selection (nothing selected)".to_string()
        } else {
            "<X> Clear selection: unmark every selected client".to_string()
        },
        "<L> Log out".to_string(),
    ]
    .into_iter()
    .map(|line| ListItem::new(Spans::from(line)))
    .collect();
    let actions =
        List::new(actions).block(Block::default().title("Quick actions").borders(Borders::ALL));
    frame.render_widget(actions, chunks[2]);

    let footer = match &state.notice {
        Some(notice) => Paragraph::new(notice.as_str()).style(Style::default().fg(Color::Red)),
        None => Paragraph::new("<Q> Quit").style(Style::default().fg(Color::Gray)),
    };
    frame.render_widget(footer.block(Block::default().borders(Borders::TOP)), chunks[3]);
}

fn render_stats<B: Backend>(frame: &mut Frame<B>, area: Rect, workspace: &Workspace) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3].as_ref())
        .split(area);

    let stats = [
        ("Total clients", workspace.clients.pagination().total_clients.to_string()),
        ("Selected clients", workspace.selection.len().to_string()),
        ("Today", Local::now().format("%d/%m/%Y").to_string()),
    ];

    for ((label, value), cell) in stats.into_iter().zip(cards.iter()) {
        let widget = Paragraph::new(Spans::from(Span::styled(
            value,
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .block(Block::default().title(label).borders(Borders::ALL));
        frame.render_widget(widget, *cell);
    }
}

pub fn handle_key(state: &mut HomeState, key: KeyCode) -> Option<HomeAction> {
    state.notice = None;
    match key {
        KeyCode::Char('c') => Some(HomeAction::Clients),
        KeyCode::Char('s') => Some(HomeAction::SelectedClients),
        KeyCode::Char('x') => Some(HomeAction::ClearSelection),
        KeyCode::Char('l') => Some(HomeAction::Logout),
        KeyCode::Char('q') | KeyCode::Esc => Some(HomeAction::Quit),
        _ => None,
    }
}

pub fn handle_input(state: &mut HomeState) -> Result<Option<HomeAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(state, key.code));
    }
    Ok(None)
}
