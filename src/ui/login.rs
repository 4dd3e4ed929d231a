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

use crate::store::MAX_NAME_LEN;
use crate::ui::centered_rect;

pub enum LoginAction {
    Submit(String),
    Quit,
}

#[derive(Default)]
pub struct LoginState {
    name: String,
    error: Option<String>,
}

impl LoginState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }
}

pub fn render_login<B: Backend>(frame: &mut Frame<B>, state: &mut LoginState) {
    let area = centered_rect(60, 40, frame.size());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(2),
                Constraint::Min(1),
            ]
            .as_ref(),
        )
        .split(area);

    frame.render_widget(
        Block::default().title("Client Console").borders(Borders::ALL),
        area,
    );

    let intro = Paragraph::new(vec![
        Spans::from(Span::styled(
            "Client Console",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Spans::from("Enter your name to continue"),
    ]);
    frame.render_widget(intro, chunks[0]);

    let input_style = if state.error.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let input = Paragraph::new(format!("{}|", state.name))
        .block(Block::default().title("Name").borders(Borders::ALL).border_style(input_style));
    frame.render_widget(input, chunks[1]);

    if let Some(error) = &state.error {
        let message = Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red));
        frame.render_widget(message, chunks[2]);
    }

    let help =
        Paragraph::new("Enter - Sign in | Esc - Quit").style(Style::default().fg(Color::Gray));
    frame.render_widget(help, chunks[3]);
}

pub fn handle_key(state: &mut LoginState, key: KeyCode) -> Option<LoginAction> {
    match key {
        KeyCode::Esc => return Some(LoginAction::Quit),
        KeyCode::Enter => return Some(LoginAction::Submit(state.name.clone())),
        KeyCode::Char(c) => {
            if state.name.chars().count() < MAX_NAME_LEN {
                state.name.push(c);
            }
            state.error = None;
        }
        KeyCode::Backspace => {
            state.name.pop();
            state.error = None;
        }
        _ => {}
    }
    None
}

pub fn handle_input(state: &mut LoginState) -> Result<Option<LoginAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(state, key.code));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(state: &mut LoginState, text: &str) {
        for c in text.chars() {
            handle_key(state, KeyCode::Char(c));
        }
    }

    #[test]
    fn enter_submits_what_was_typed() {
        let mut state = LoginState::new();
        type_text(&mut state, "Alx");
        handle_key(&mut state, KeyCode::Backspace);
        match handle_key(&mut state, KeyCode::Enter) {
            Some(LoginAction::Submit(name)) => assert_eq!(name, "Al"),
            _ => panic!("expected a submit"),
        }
    }

    #[test]
    fn input_is_capped_and_typing_clears_the_error() {
        let mut state = LoginState::new();
        type_text(&mut state, &"x".repeat(60));
        assert_eq!(state.name.len(), MAX_NAME_LEN);

        state.set_error("Name must be at least 2 characters");
        handle_key(&mut state, KeyCode::Backspace);
        assert_eq!(state.error, None);
    }
}
