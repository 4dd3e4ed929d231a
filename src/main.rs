mod api;
mod config;
mod models;
mod router;
mod store;
mod ui;
mod workspace;

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use anyhow::{Context, Result};
use crossterm::{
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
};
use tracing_subscriber::EnvFilter;
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::api::{ClientService, HttpClientApi};
use crate::config::Config;
use crate::models::{Client, ClientId};
use crate::router::{guard, Route};
use crate::store::persist::{FileStorage, MemoryStorage};
use crate::ui::{
    client_detail::{self, ClientDetailAction, ClientDetailState, render_client_detail},
    client_wizard::{self, ClientWizardAction, ClientWizardState, render_client_wizard},
    clients::{self, ClientAction, ClientsState, render_clients, toggle_all_visible},
    home::{self, HomeAction, HomeState, render_home},
    login::{self, LoginAction, LoginState, render_login},
    selected_clients::{self, SelectedClientsAction, SelectedClientsState, render_selected_clients},
};
use crate::workspace::{Backend as ClientBackend, Workspace, WorkspaceError};

// Represents the current screen in the app
enum AppScreen {
    Login,
    Home,
    Clients,
    ClientWizard,
    SelectedClients,
    ClientDetail,
}

// Main application state
struct AppState {
    workspace: Workspace,
    screen: AppScreen,
    login_state: Option<LoginState>,
    home_state: Option<HomeState>,
    clients_state: Option<ClientsState>,
    client_wizard_state: Option<ClientWizardState>,
    selected_clients_state: Option<SelectedClientsState>,
    client_detail_state: Option<ClientDetailState>,
}

impl AppState {
    fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            screen: AppScreen::Login,
            login_state: None,
            home_state: None,
            clients_state: None,
            client_wizard_state: None,
            selected_clients_state: None,
            client_detail_state: None,
        }
    }
}

fn init_tracing(config: &Config) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_file())
        .with_context(|| format!("opening log file {}", config.log_file().display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .try_init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::init()?;
    println!("Initializing client console...");

    let storage = FileStorage::open(&config.state_dir)?;
    init_tracing(&config)?;

    let backend = if config.local_mode {
        ClientBackend::Local
    } else {
        let api = HttpClientApi::new(config.api_base_url.clone())?;
        tracing::info!(base_url = api.base_url(), "using remote client service");
        ClientBackend::Remote(ClientService::new(Box::new(api)))
    };
    let workspace = if config.ephemeral {
        tracing::info!("ephemeral run, state files are left untouched");
        Workspace::open(backend, config.page_size, MemoryStorage::new())
    } else {
        Workspace::open(backend, config.page_size, storage)
    };

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app_state = AppState::new(workspace);

    // Start on the dashboard; the guard sends us to login without a session
    navigate(&mut app_state, Route::Home).await;

    let result = run_app(&mut terminal, &mut app_state).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(error = %err, "client console stopped");
        println!("Error: {}", err);
    }

    println!("Thanks for using Client Console!");

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app_state: &mut AppState) -> Result<()> {
    loop {
        terminal.draw(|f| {
            let workspace = &app_state.workspace;
            match app_state.screen {
                AppScreen::Login => {
                    if let Some(state) = &mut app_state.login_state {
                        render_login(f, state);
                    }
                }
                AppScreen::Home => {
                    if let Some(state) = &mut app_state.home_state {
                        render_home(f, state, workspace);
                    }
                }
                AppScreen::Clients => {
                    if let Some(state) = &mut app_state.clients_state {
                        render_clients(f, state, workspace);
                    }
                }
                AppScreen::ClientWizard => {
                    if let Some(state) = &mut app_state.client_wizard_state {
                        render_client_wizard(f, state);
                    }
                }
                AppScreen::SelectedClients => {
                    if let Some(state) = &mut app_state.selected_clients_state {
                        render_selected_clients(f, state, workspace);
                    }
                }
                AppScreen::ClientDetail => {
                    if let Some(state) = &mut app_state.client_detail_state {
                        let selected = state
                            .client()
                            .is_some_and(|c| workspace.selection.is_client_selected(c.id));
                        render_client_detail(f, state, selected);
                    }
                }
            }
        })?;

        let should_quit = match app_state.screen {
            AppScreen::Login => handle_login_screen(app_state).await?,
            AppScreen::Home => handle_home_screen(app_state).await?,
            AppScreen::Clients => handle_clients_screen(app_state).await?,
            AppScreen::ClientWizard => handle_client_wizard_screen(app_state).await?,
            AppScreen::SelectedClients => handle_selected_clients_screen(app_state).await?,
            AppScreen::ClientDetail => handle_client_detail_screen(app_state).await?,
        };

        if should_quit {
            break;
        }
    }

    Ok(())
}

/// Moves to `route` once the session guard has had its say, building the
/// screen state the route needs.
async fn navigate(app_state: &mut AppState, route: Route) {
    let route = guard(route, &app_state.workspace.session);
    match route {
        Route::Login => {
            app_state.login_state = Some(LoginState::new());
            app_state.screen = AppScreen::Login;
        }
        Route::Home => {
            let mut state = HomeState::new();
            if let Err(err) = app_state.workspace.load_dashboard_totals().await {
                state.set_notice(format!("Could not count clients: {err}"));
            }
            app_state.home_state = Some(state);
            app_state.screen = AppScreen::Home;
        }
        Route::Clients => {
            // Reuse the list screen (search, cursor) when coming back to it.
            if app_state.clients_state.is_none() {
                let page = app_state.workspace.clients.pagination().current_page;
                // A failed fetch is reported through the store's error.
                let _ = app_state.workspace.load_page(page).await;
                app_state.clients_state = Some(ClientsState::new());
            }
            app_state.screen = AppScreen::Clients;
        }
        Route::SelectedClients => {
            app_state.selected_clients_state = Some(SelectedClientsState::new());
            app_state.screen = AppScreen::SelectedClients;
        }
        Route::ClientDetail(id) => {
            let client = app_state.workspace.find_client(id).await;
            app_state.client_detail_state = Some(ClientDetailState::new(id, client));
            app_state.screen = AppScreen::ClientDetail;
        }
    }
}

/// The form edits shared state, so it sits behind the same guard as the
/// client list.
async fn open_client_wizard(app_state: &mut AppState, client_id: Option<ClientId>) {
    if guard(Route::Clients, &app_state.workspace.session) != Route::Clients {
        navigate(app_state, Route::Login).await;
        return;
    }

    let state = match client_id {
        None => ClientWizardState::new(),
        Some(id) => match app_state.workspace.find_client(id).await {
            Some(client) => ClientWizardState::from_existing(&client),
            None => {
                if let Some(list) = app_state.clients_state.as_mut() {
                    list.set_notice(format!("Client {id} not found"));
                }
                navigate(app_state, Route::Clients).await;
                return;
            }
        },
    };
    app_state.client_wizard_state = Some(state);
    app_state.screen = AppScreen::ClientWizard;
}

async fn handle_login_screen(app_state: &mut AppState) -> Result<bool> {
    let Some(state) = app_state.login_state.as_mut() else {
        return Ok(false);
    };

    match login::handle_input(state)? {
        Some(LoginAction::Quit) => return Ok(true),
        Some(LoginAction::Submit(name)) => match app_state.workspace.login(&name) {
            Ok(()) => {
                app_state.login_state = None;
                app_state.clients_state = None;
                navigate(app_state, Route::Clients).await;
            }
            Err(err) => {
                if let Some(state) = app_state.login_state.as_mut() {
                    state.set_error(err.to_string());
                }
            }
        },
        None => {}
    }

    Ok(false)
}

async fn handle_home_screen(app_state: &mut AppState) -> Result<bool> {
    let Some(state) = app_state.home_state.as_mut() else {
        return Ok(false);
    };

    match home::handle_input(state)? {
        Some(HomeAction::Quit) => return Ok(true),
        Some(HomeAction::Clients) => {
            // Fresh data every time the list is opened from the dashboard
            app_state.clients_state = None;
            navigate(app_state, Route::Clients).await;
        }
        Some(HomeAction::SelectedClients) => {
            navigate(app_state, Route::SelectedClients).await;
        }
        Some(HomeAction::ClearSelection) => {
            app_state.workspace.selection.clear_selected_clients();
        }
        Some(HomeAction::Logout) => {
            app_state.workspace.logout();
            app_state.clients_state = None;
            navigate(app_state, Route::Login).await;
        }
        None => {}
    }

    Ok(false)
}

async fn handle_clients_screen(app_state: &mut AppState) -> Result<bool> {
    let Some(state) = app_state.clients_state.as_mut() else {
        return Ok(false);
    };

    let visible = app_state.workspace.clients.search(state.search());
    let pagination = app_state.workspace.clients.pagination();
    let action = clients::handle_input(state, &visible, pagination)?;

    match action {
        Some(ClientAction::Back) => {
            navigate(app_state, Route::Home).await;
        }
        Some(ClientAction::NewClient) => {
            open_client_wizard(app_state, None).await;
        }
        Some(ClientAction::EditClient(id)) => {
            open_client_wizard(app_state, Some(id)).await;
        }
        Some(ClientAction::ViewClient(id)) => {
            navigate(app_state, Route::ClientDetail(id)).await;
        }
        Some(ClientAction::SelectedClients) => {
            navigate(app_state, Route::SelectedClients).await;
        }
        Some(ClientAction::DeleteClient(id)) => {
            if let Err(err) = app_state.workspace.delete_client(id).await {
                if let Some(state) = app_state.clients_state.as_mut() {
                    state.set_notice(format!("Could not delete client: {err}"));
                }
            }
        }
        Some(ClientAction::ChangePage(page)) => {
            // A failed fetch keeps the current page and shows the store error.
            let _ = app_state.workspace.load_page(page).await;
        }
        Some(ClientAction::ToggleSelection(id)) => {
            let workspace = &mut app_state.workspace;
            if let Some(client) = workspace.clients.get_client_by_id(id).cloned() {
                workspace.selection.toggle(&client);
            }
        }
        Some(ClientAction::SelectAllVisible) => {
            let term = app_state
                .clients_state
                .as_ref()
                .map(|s| s.search().to_string())
                .unwrap_or_default();
            let workspace = &mut app_state.workspace;
            let visible: Vec<Client> =
                workspace.clients.search(&term).into_iter().cloned().collect();
            let visible: Vec<&Client> = visible.iter().collect();
            toggle_all_visible(&mut workspace.selection, &visible);
        }
        None => {}
    }

    Ok(false)
}

async fn handle_client_wizard_screen(app_state: &mut AppState) -> Result<bool> {
    let Some(state) = app_state.client_wizard_state.as_mut() else {
        return Ok(false);
    };

    match client_wizard::handle_input(state)? {
        Some(ClientWizardAction::Cancel) => {
            app_state.client_wizard_state = None;
            navigate(app_state, Route::Clients).await;
        }
        Some(ClientWizardAction::Save(client_id, draft)) => {
            let saved = match client_id {
                None => app_state.workspace.create_client(draft).await.map(|_| ()),
                Some(id) => app_state.workspace.update_client(id, draft).await,
            };

            match saved {
                Ok(()) => {
                    app_state.client_wizard_state = None;
                    navigate(app_state, Route::Clients).await;
                }
                Err(WorkspaceError::Validation(errors)) => {
                    if let Some(state) = app_state.client_wizard_state.as_mut() {
                        state.errors = errors;
                    }
                }
                Err(WorkspaceError::Api(message)) => {
                    if let Some(state) = app_state.client_wizard_state.as_mut() {
                        state.api_error = Some(message);
                    }
                }
            }
        }
        None => {}
    }

    Ok(false)
}

async fn handle_selected_clients_screen(app_state: &mut AppState) -> Result<bool> {
    let Some(state) = app_state.selected_clients_state.as_mut() else {
        return Ok(false);
    };

    let snapshots = app_state.workspace.selection.selected_clients();
    let action = selected_clients::handle_input(state, snapshots)?;

    match action {
        Some(SelectedClientsAction::Back) => {
            navigate(app_state, Route::Home).await;
        }
        Some(SelectedClientsAction::Remove(id)) => {
            app_state.workspace.selection.remove_selected_client(id);
        }
        Some(SelectedClientsAction::ClearAll) => {
            app_state.workspace.selection.clear_selected_clients();
        }
        Some(SelectedClientsAction::ViewClient(id)) => {
            navigate(app_state, Route::ClientDetail(id)).await;
        }
        Some(SelectedClientsAction::Edit(id)) => {
            open_client_wizard(app_state, Some(id)).await;
        }
        Some(SelectedClientsAction::Delete(id)) => {
            if let Err(err) = app_state.workspace.delete_client(id).await {
                if let Some(state) = app_state.selected_clients_state.as_mut() {
                    state.set_notice(format!("Could not delete client: {err}"));
                }
            }
        }
        None => {}
    }

    Ok(false)
}

async fn handle_client_detail_screen(app_state: &mut AppState) -> Result<bool> {
    let Some(state) = app_state.client_detail_state.as_ref() else {
        return Ok(false);
    };

    match client_detail::handle_input(state)? {
        Some(ClientDetailAction::Back) => {
            app_state.client_detail_state = None;
            navigate(app_state, Route::Clients).await;
        }
        Some(ClientDetailAction::Edit(id)) => {
            open_client_wizard(app_state, Some(id)).await;
        }
        Some(ClientDetailAction::ToggleSelection(id)) => {
            let selection = &mut app_state.workspace.selection;
            if !selection.remove_selected_client(id) {
                let shown = app_state.client_detail_state.as_ref().and_then(|s| s.client());
                if let Some(client) = shown {
                    selection.add_selected_client(client.clone());
                }
            }
        }
        None => {}
    }

    Ok(false)
}
