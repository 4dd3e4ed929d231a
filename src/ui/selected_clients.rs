use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, TableState},
    Frame,
};

use crate::models::{Client, ClientId};
use crate::ui::clients::render_delete_confirmation;
use crate::ui::components::client_views::{
    render_client_cards, render_client_table, step, ViewMode,
};
use crate::workspace::Workspace;

#[derive(Default)]
pub struct SelectedClientsState {
    table_state: TableState,
    view: ViewMode,
    show_delete_confirmation: bool,
    notice: Option<String>,
}

impl SelectedClientsState {
    pub fn new() -> Self {
        let mut table_state = TableState::default();
        table_state.select(Some(0));
        Self {
            table_state,
            ..Self::default()
        }
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    fn highlighted<'a>(&self, clients: &'a [Client]) -> Option<&'a Client> {
        let i = self.table_state.selected()?;
        clients.get(i.min(clients.len().checked_sub(1)?))
    }
}

pub enum SelectedClientsAction {
    Back,
    Remove(ClientId),
    ClearAll,
    ViewClient(ClientId),
    Edit(ClientId),
    Delete(ClientId),
}

pub fn render_selected_clients<B: Backend>(
    frame: &mut Frame<B>,
    state: &mut SelectedClientsState,
    workspace: &Workspace,
) {
    let size = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1), Constraint::Length(3)].as_ref())
        .split(size);

    let snapshots = workspace.selection.selected_clients();
    let visible: Vec<&Client> = snapshots.iter().collect();
    let cursor = state
        .highlighted(snapshots)
        .and_then(|c| visible.iter().position(|v| v.id == c.id));
    state.table_state.select(cursor.or(Some(0)));

    let title = format!("Selected clients ({})", visible.len());
    if visible.is_empty() {
        let empty =
            Paragraph::new("No clients selected. Mark clients with <Space> on the client list.")
                .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(empty, chunks[0]);
    } else {
        match state.view {
            ViewMode::Table => render_client_table(
                frame,
                chunks[0],
                &title,
                &visible,
                &workspace.selection,
                &mut state.table_state,
            ),
            ViewMode::Cards => render_client_cards(
                frame,
                chunks[0],
                &title,
                &visible,
                &workspace.selection,
                cursor,
            ),
        }
    }

    if let Some(notice) = state.notice.as_deref().or(workspace.clients.error()) {
        let notice = Paragraph::new(notice).style(Style::default().fg(Color::Red));
        frame.render_widget(notice, chunks[1]);
    }

    let buttons = Paragraph::new(concat!(
        "<Enter> Details | <E> Edit | <D> Delete | <R> Unselect | <C> Clear selection | ",
        "<V> Cards/Table | <Esc> Back",
    ))
    .block(Block::default().borders(Borders::TOP))
    .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[2]);

    if state.show_delete_confirmation {
        if let Some(client) = state.highlighted(snapshots) {
            render_delete_confirmation(frame, size, &client.name);
        }
    }
}

pub fn handle_key(
    state: &mut SelectedClientsState,
    clients: &[Client],
    key: KeyCode,
) -> Option<SelectedClientsAction> {
    let highlighted = state.highlighted(clients).map(|c| c.id);

    if state.show_delete_confirmation {
        match key {
            KeyCode::Char('y') => {
                state.show_delete_confirmation = false;
                return highlighted.map(SelectedClientsAction::Delete);
            }
            KeyCode::Char('n') | KeyCode::Char('q') | KeyCode::Esc => {
                state.show_delete_confirmation = false
            }
            _ => {}
        }
        return None;
    }

    state.notice = None;
    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(SelectedClientsAction::Back),
        KeyCode::Char('r') => return highlighted.map(SelectedClientsAction::Remove),
        KeyCode::Char('e') => return highlighted.map(SelectedClientsAction::Edit),
        KeyCode::Char('d') => state.show_delete_confirmation = highlighted.is_some(),
        KeyCode::Char('c') if !clients.is_empty() => {
            return Some(SelectedClientsAction::ClearAll);
        }
        KeyCode::Enter => return highlighted.map(SelectedClientsAction::ViewClient),
        KeyCode::Char('v') => state.view = state.view.toggled(),
        KeyCode::Down => {
            let next = step(state.table_state.selected(), clients.len(), true);
            state.table_state.select(next);
        }
        KeyCode::Up => {
            let next = step(state.table_state.selected(), clients.len(), false);
            state.table_state.select(next);
        }
        _ => {}
    }
    None
}

pub fn handle_input(
    state: &mut SelectedClientsState,
    clients: &[Client],
) -> Result<Option<SelectedClientsAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(state, clients, key.code));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(id: i64) -> Client {
        Client {
            id: ClientId(id),
            name: format!("Client {id}"),
            salary: 1.0,
            company_valuation: 1.0,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn remove_targets_the_highlighted_snapshot() {
        let clients = vec![client(4), client(9)];
        let mut state = SelectedClientsState::new();

        handle_key(&mut state, &clients, KeyCode::Up);
        match handle_key(&mut state, &clients, KeyCode::Char('r')) {
            Some(SelectedClientsAction::Remove(id)) => assert_eq!(id, ClientId(9)),
            _ => panic!("expected a removal"),
        }
    }

    #[test]
    fn edit_targets_the_highlighted_snapshot() {
        let clients = vec![client(4), client(9)];
        let mut state = SelectedClientsState::new();

        match handle_key(&mut state, &clients, KeyCode::Char('e')) {
            Some(SelectedClientsAction::Edit(id)) => assert_eq!(id, ClientId(4)),
            _ => panic!("expected an edit"),
        }
    }

    #[test]
    fn delete_waits_for_confirmation() {
        let clients = vec![client(4), client(9)];
        let mut state = SelectedClientsState::new();

        handle_key(&mut state, &clients, KeyCode::Down);
        assert!(handle_key(&mut state, &clients, KeyCode::Char('d')).is_none());
        assert!(state.show_delete_confirmation);
        // Other keys are swallowed by the popup.
        assert!(handle_key(&mut state, &clients, KeyCode::Char('e')).is_none());

        match handle_key(&mut state, &clients, KeyCode::Char('y')) {
            Some(SelectedClientsAction::Delete(id)) => assert_eq!(id, ClientId(9)),
            _ => panic!("expected a deletion"),
        }
        assert!(!state.show_delete_confirmation);
    }

    #[test]
    fn declining_the_delete_keeps_the_client() {
        let clients = vec![client(4)];
        let mut state = SelectedClientsState::new();

        handle_key(&mut state, &clients, KeyCode::Char('d'));
        assert!(handle_key(&mut state, &clients, KeyCode::Char('n')).is_none());
        assert!(!state.show_delete_confirmation);
        assert!(handle_key(&mut state, &clients, KeyCode::Char('q')).is_some());
    }

    #[test]
    fn empty_selection_offers_nothing_to_act_on() {
        let mut state = SelectedClientsState::new();
        assert!(handle_key(&mut state, &[], KeyCode::Char('d')).is_none());
        assert!(!state.show_delete_confirmation);
        assert!(handle_key(&mut state, &[], KeyCode::Char('e')).is_none());
        assert!(handle_key(&mut state, &[], KeyCode::Char('r')).is_none());
        assert!(handle_key(&mut state, &[], KeyCode::Char('c')).is_none());
        assert!(handle_key(&mut state, &[], KeyCode::Enter).is_none());
    }
}
