use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::models::{Client, ClientDraft, ClientId, FieldErrors};

pub enum ClientWizardAction {
    Cancel,
    Save(Option<ClientId>, ClientDraft),
}

#[derive(Clone, PartialEq, Copy, Debug)]
pub enum ClientField {
    Name,
    Salary,
    CompanyValuation,
}

impl ClientField {
    fn label(self) -> &'static str {
        match self {
            ClientField::Name => "Name",
            ClientField::Salary => "Salary",
            ClientField::CompanyValuation => "Company valuation",
        }
    }

    fn key(self) -> &'static str {
        match self {
            ClientField::Name => "name",
            ClientField::Salary => "salary",
            ClientField::CompanyValuation => "companyValuation",
        }
    }
}

const FIELDS: [ClientField; 3] = [
    ClientField::Name,
    ClientField::Salary,
    ClientField::CompanyValuation,
];

pub struct ClientWizardState {
    pub client_id: Option<ClientId>,
    pub name: String,
    pub salary: String,
    pub company_valuation: String,
    pub current_field: ClientField,
    pub editing: bool,
    pub errors: FieldErrors,
    pub api_error: Option<String>,
}

impl ClientWizardState {
    pub fn new() -> Self {
        Self {
            client_id: None,
            name: String::new(),
            salary: String::new(),
            company_valuation: String::new(),
            current_field: ClientField::Name,
            editing: false,
            errors: FieldErrors::default(),
            api_error: None,
        }
    }

    pub fn from_existing(client: &Client) -> Self {
        Self {
            client_id: Some(client.id),
            name: client.name.clone(),
            salary: client.salary.to_string(),
            company_valuation: client.company_valuation.to_string(),
            ..Self::new()
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            ClientField::Name => ClientField::Salary,
            ClientField::Salary => ClientField::CompanyValuation,
            ClientField::CompanyValuation => ClientField::Name,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            ClientField::Name => ClientField::CompanyValuation,
            ClientField::Salary => ClientField::Name,
            ClientField::CompanyValuation => ClientField::Salary,
        };
    }

    fn value(&self, field: ClientField) -> &str {
        match field {
            ClientField::Name => &self.name,
            ClientField::Salary => &self.salary,
            ClientField::CompanyValuation => &self.company_valuation,
        }
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let numeric = self.current_field != ClientField::Name;
        let field_value = match self.current_field {
            ClientField::Name => &mut self.name,
            ClientField::Salary => &mut self.salary,
            ClientField::CompanyValuation => &mut self.company_valuation,
        };

        match key {
            KeyCode::Char(c) if !numeric || c.is_ascii_digit() || c == '.' || c == ',' => {
                field_value.push(c);
            }
            KeyCode::Backspace => {
                field_value.pop();
            }
            _ => {}
        }
        self.errors = FieldErrors::default();
    }

    /// Builds the request body. Unreadable amounts become zero here and are
    /// reported by `amount_errors`.
    pub fn to_draft(&self) -> ClientDraft {
        ClientDraft {
            name: self.name.trim().to_string(),
            salary: parse_amount(&self.salary).unwrap_or(0.0),
            company_valuation: parse_amount(&self.company_valuation).unwrap_or(0.0),
        }
    }

    fn amount_errors(&self, errors: &mut FieldErrors) {
        let amounts = [("salary", &self.salary), ("companyValuation", &self.company_valuation)];
        for (field, input) in amounts {
            if !input.trim().is_empty() && parse_amount(input).is_none() {
                errors.insert(field, "Enter an amount such as 1.234,56");
            }
        }
    }
}

/// Reads plain numbers (`2500.5`) as well as Brazilian notation
/// (`R$ 1.234,56`, `1.234.567`).
fn parse_amount(input: &str) -> Option<f64> {
    let digits = input.trim().trim_start_matches("R$").trim();
    let normalized = if digits.contains(',') {
        digits.replace('.', "").replace(',', ".")
    } else if digits.matches('.').count() > 1 {
        digits.replace('.', "")
    } else {
        digits.to_string()
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn render_client_wizard<B: Backend>(f: &mut Frame<B>, state: &mut ClientWizardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title_text = if state.client_id.is_none() {
        "New Client"
    } else {
        "Edit Client"
    };

    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1]);

    let banner = match &state.api_error {
        Some(message) => Paragraph::new(format!("Could not save client: {message}"))
            .style(Style::default().fg(Color::Red)),
        None => Paragraph::new(""),
    };
    f.render_widget(banner.block(Block::default().borders(Borders::ALL)), chunks[2]);

    let help_text = if state.editing {
        "Enter - Save field | Esc - Cancel editing"
    } else {
        "Enter - Edit field | Up/Down - Navigate fields | S - Save client | Esc - Cancel"
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[3]);
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &mut ClientWizardState, area: Rect) {
    let items: Vec<ListItem> = FIELDS
        .iter()
        .map(|&field| {
            let value = state.value(field);
            let is_current = field == state.current_field;
            let label_style = if is_current {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };

            let mut lines = vec![if is_current && state.editing {
                Spans::from(vec![
                    Span::styled(format!("{}: ", field.label()), label_style),
                    Span::styled(
                        format!("{value}|"),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                Spans::from(vec![
                    Span::styled(format!("{}: ", field.label()), label_style),
                    Span::raw(value.to_string()),
                ])
            }];
            if let Some(message) = state.errors.get(field.key()) {
                lines.push(Spans::from(Span::styled(
                    format!("  {message}"),
                    Style::default().fg(Color::Red),
                )));
            }

            ListItem::new(lines)
        })
        .collect();

    let form_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Client Details"));

    f.render_widget(form_list, area);
}

pub fn handle_key(state: &mut ClientWizardState, key: KeyCode) -> Option<ClientWizardAction> {
    match key {
        KeyCode::Esc => {
            if state.editing {
                state.toggle_editing();
            } else {
                return Some(ClientWizardAction::Cancel);
            }
        }
        KeyCode::Enter => state.toggle_editing(),
        KeyCode::Up if !state.editing => state.previous_field(),
        KeyCode::Down | KeyCode::Tab if !state.editing => state.next_field(),
        KeyCode::Char('s') if !state.editing => {
            let draft = state.to_draft();
            let mut errors = draft.validate().err().unwrap_or_default();
            state.amount_errors(&mut errors);
            if errors.is_empty() {
                return Some(ClientWizardAction::Save(state.client_id, draft));
            }
            state.errors = errors;
        }
        _ if state.editing => state.edit_current_field(key),
        _ => {}
    }
    None
}

pub fn handle_input(state: &mut ClientWizardState) -> Result<Option<ClientWizardAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(state, key.code));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_accept_brazilian_grouping() {
        assert_eq!(parse_amount("1.234,56"), Some(1234.56));
        assert_eq!(parse_amount("R$ 2.500,00"), Some(2500.0));
        assert_eq!(parse_amount("1.234.567"), Some(1234567.0));
        assert_eq!(parse_amount("2500.5"), Some(2500.5));
        assert_eq!(parse_amount("12abc"), None);
        assert_eq!(parse_amount("1,2,3"), None);
    }

    #[test]
    fn grouped_amounts_save() {
        let mut state = ClientWizardState::new();
        state.name = "Ana".into();
        state.salary = "1.234,56".into();
        state.company_valuation = "R$ 10.000,00".into();

        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(ClientWizardAction::Save(None, draft)) => {
                assert_eq!(draft.salary, 1234.56);
                assert_eq!(draft.company_valuation, 10000.0);
            }
            _ => panic!("expected a save"),
        }
    }

    #[test]
    fn unreadable_amount_is_not_reported_as_zero() {
        let mut state = ClientWizardState::new();
        state.name = "Ana".into();
        state.salary = "12abc".into();
        state.company_valuation = "5000".into();

        assert!(handle_key(&mut state, KeyCode::Char('s')).is_none());
        assert_eq!(state.errors.get("salary"), Some("Enter an amount such as 1.234,56"));
        assert!(state.errors.get("companyValuation").is_none());
    }

    fn type_into(state: &mut ClientWizardState, text: &str) {
        handle_key(state, KeyCode::Enter);
        for c in text.chars() {
            handle_key(state, KeyCode::Char(c));
        }
        handle_key(state, KeyCode::Enter);
    }

    #[test]
    fn invalid_form_shows_errors_instead_of_saving() {
        let mut state = ClientWizardState::new();
        type_into(&mut state, "Ana");

        assert!(handle_key(&mut state, KeyCode::Char('s')).is_none());
        assert!(state.errors.get("salary").is_some());
        assert!(state.errors.get("name").is_none());
    }

    #[test]
    fn complete_form_saves_a_parsed_draft() {
        let mut state = ClientWizardState::new();
        type_into(&mut state, "Ana");
        handle_key(&mut state, KeyCode::Down);
        type_into(&mut state, "3500,50");
        handle_key(&mut state, KeyCode::Down);
        type_into(&mut state, "12x0000");

        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(ClientWizardAction::Save(None, draft)) => {
                assert_eq!(draft.name, "Ana");
                assert_eq!(draft.salary, 3500.5);
                assert_eq!(draft.company_valuation, 120000.0);
            }
            _ => panic!("expected a save"),
        }
    }

    #[test]
    fn editing_keeps_the_client_id() {
        let client = Client {
            id: ClientId(8),
            name: "Hugo".into(),
            salary: 10.0,
            company_valuation: 20.0,
            created_at: None,
            updated_at: None,
        };
        let mut state = ClientWizardState::from_existing(&client);
        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(ClientWizardAction::Save(Some(id), draft)) => {
                assert_eq!(id, ClientId(8));
                assert_eq!(
                    draft,
                    ClientDraft {
                        name: "Hugo".into(),
                        salary: 10.0,
                        company_valuation: 20.0,
                    }
                );
            }
            _ => panic!("expected a save"),
        }
    }
}
