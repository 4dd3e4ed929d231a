use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Spans,
    widgets::{Block, Borders, Clear, Paragraph, TableState},
    Frame,
};

use crate::models::{Client, ClientId};
use crate::store::{Pagination, SelectionStore};
use crate::ui::centered_rect;
use crate::ui::components::client_views::{
    render_client_cards, render_client_table, step, ViewMode,
};
use crate::workspace::Workspace;

// Represents the state of the client list screen
#[derive(Default)]
pub struct ClientsState {
    table_state: TableState,
    view: ViewMode,
    search: String,
    searching: bool,
    show_delete_confirmation: bool,
    notice: Option<String>,
}

impl ClientsState {
    pub fn new() -> Self {
        let mut table_state = TableState::default();
        table_state.select(Some(0));
        Self {
            table_state,
            ..Self::default()
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn toggle_delete_confirmation(&mut self) {
        self.show_delete_confirmation = !self.show_delete_confirmation;
    }

    fn cursor(&self, len: usize) -> Option<usize> {
        match self.table_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        }
    }

    fn highlighted<'a>(&self, visible: &[&'a Client]) -> Option<&'a Client> {
        self.cursor(visible.len()).and_then(|i| visible.get(i).copied())
    }
}

pub enum ClientAction {
    Back,
    NewClient,
    EditClient(ClientId),
    DeleteClient(ClientId),
    ViewClient(ClientId),
    ToggleSelection(ClientId),
    SelectAllVisible,
    ChangePage(u32),
    SelectedClients,
}

/// Marks every visible client, or unmarks them all when they are already
/// all marked.
pub fn toggle_all_visible(selection: &mut SelectionStore, visible: &[&Client]) {
    let all_selected =
        !visible.is_empty() && visible.iter().all(|c| selection.is_client_selected(c.id));
    for client in visible {
        if all_selected {
            selection.remove_selected_client(client.id);
        } else {
            selection.add_selected_client((*client).clone());
        }
    }
}

pub fn render_clients<B: Backend>(
    frame: &mut Frame<B>,
    state: &mut ClientsState,
    workspace: &Workspace,
) {
    let size = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
            Constraint::Length(3),
        ].as_ref())
        .split(size);

    let visible = workspace.clients.search(&state.search);
    let cursor = state.cursor(visible.len());
    state.table_state.select(cursor);

    let search_title = if state.searching { "Search (typing)" } else { "Search </>" };
    let search_style = if state.searching {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let search = Paragraph::new(state.search.as_str()).block(
        Block::default()
            .title(search_title)
            .borders(Borders::ALL)
            .border_style(search_style),
    );
    frame.render_widget(search, chunks[0]);

    let title = format!(
        "Clients ({}) | {} selected",
        visible.len(),
        workspace.selection.len()
    );
    if workspace.clients.clients().is_empty() && !workspace.clients.is_loading() {
        let empty = Paragraph::new("No clients yet. Press <N> to add one.")
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(empty, chunks[1]);
    } else if visible.is_empty() {
        let empty = Paragraph::new(format!("No client matches \"{}\".", state.search))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(empty, chunks[1]);
    } else {
        match state.view {
            ViewMode::Table => render_client_table(
                frame,
                chunks[1],
                &title,
                &visible,
                &workspace.selection,
                &mut state.table_state,
            ),
            ViewMode::Cards => render_client_cards(
                frame,
                chunks[1],
                &title,
                &visible,
                &workspace.selection,
                cursor,
            ),
        }
    }

    render_status(frame, chunks[2], state, workspace);

    let buttons_text = if state.highlighted(&visible).is_some() {
        concat!(
            "<N> New | <E> Edit | <D> Delete | <Enter> Details | <Space> Select | ",
            "<A> Select all | <V> Cards/Table | <S> Selected | <Left/Right> Page | <Esc> Back",
        )
    } else {
        "<N> New Client | <V> Cards/Table | <S> Selected | <Left/Right> Page | <Esc> Back"
    };
    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[3]);

    if state.show_delete_confirmation {
        if let Some(client) = state.highlighted(&visible) {
            render_delete_confirmation(frame, size, &client.name);
        }
    }
}

fn render_status<B: Backend>(
    frame: &mut Frame<B>,
    area: Rect,
    state: &ClientsState,
    workspace: &Workspace,
) {
    let Pagination { current_page, total_pages, .. } = workspace.clients.pagination();
    let mut line = format!(
        "Page {current_page} of {total_pages} | {} per page",
        workspace.page_size()
    );
    let mut style = Style::default().fg(Color::Gray);

    if workspace.clients.is_loading() {
        line.push_str(" | Loading...");
    }
    if let Some(error) = state.notice.as_deref().or(workspace.clients.error()) {
        line.push_str(&format!(" | {error}"));
        style = Style::default().fg(Color::Red);
    }
    frame.render_widget(Paragraph::new(line).style(style), area);
}

pub(crate) fn render_delete_confirmation<B: Backend>(
    frame: &mut Frame<B>,
    size: Rect,
    name: &str,
) {
    let popup_area = centered_rect(50, 20, size);

    let popup = Paragraph::new(vec![
        Spans::from(""),
        Spans::from(format!("Are you sure you want to delete {name}?")),
        Spans::from(""),
        Spans::from("This cannot be undone."),
        Spans::from(""),
        Spans::from("<Y> Yes  <N> No"),
    ])
    .block(Block::default().title("Confirm Delete").borders(Borders::ALL))
    .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup, popup_area);
}

pub fn handle_key(
    state: &mut ClientsState,
    visible: &[&Client],
    pagination: Pagination,
    key: KeyCode,
) -> Option<ClientAction> {
    if state.searching {
        match key {
            KeyCode::Char(c) => state.search.push(c),
            KeyCode::Backspace => {
                state.search.pop();
            }
            KeyCode::Enter | KeyCode::Esc => state.searching = false,
            _ => {}
        }
        state.table_state.select(Some(0));
        return None;
    }

    if state.show_delete_confirmation {
        match key {
            KeyCode::Char('y') => {
                state.toggle_delete_confirmation();
                return state.highlighted(visible).map(|c| ClientAction::DeleteClient(c.id));
            }
            KeyCode::Char('n') | KeyCode::Char('q') | KeyCode::Esc => {
                state.toggle_delete_confirmation()
            }
            _ => {}
        }
        return None;
    }

    state.notice = None;
    let highlighted = state.highlighted(visible).map(|c| c.id);
    match key {
        KeyCode::Char('q') | KeyCode::Esc => {
            if state.search.is_empty() {
                return Some(ClientAction::Back);
            }
            state.search.clear();
        }
        KeyCode::Char('/') => state.searching = true,
        KeyCode::Char('n') => return Some(ClientAction::NewClient),
        KeyCode::Char('v') => state.view = state.view.toggled(),
        KeyCode::Char('s') => return Some(ClientAction::SelectedClients),
        KeyCode::Char('a') => return Some(ClientAction::SelectAllVisible),
        KeyCode::Char('e') => return highlighted.map(ClientAction::EditClient),
        KeyCode::Char(' ') => return highlighted.map(ClientAction::ToggleSelection),
        KeyCode::Enter => return highlighted.map(ClientAction::ViewClient),
        KeyCode::Char('d') => {
            if highlighted.is_some() {
                state.toggle_delete_confirmation();
            }
        }
        KeyCode::Down => {
            let next = step(state.table_state.selected(), visible.len(), true);
            state.table_state.select(next);
        }
        KeyCode::Up => {
            let next = step(state.table_state.selected(), visible.len(), false);
            state.table_state.select(next);
        }
        KeyCode::Left if pagination.current_page > 1 => {
            state.table_state.select(Some(0));
            return Some(ClientAction::ChangePage(pagination.current_page - 1));
        }
        KeyCode::Right if pagination.current_page < pagination.total_pages => {
            state.table_state.select(Some(0));
            return Some(ClientAction::ChangePage(pagination.current_page + 1));
        }
        _ => {}
    }
    None
}

pub fn handle_input(
    state: &mut ClientsState,
    visible: &[&Client],
    pagination: Pagination,
) -> Result<Option<ClientAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(state, visible, pagination, key.code));
    }
    Ok(None)
}
