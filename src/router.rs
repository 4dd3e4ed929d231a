use crate::models::ClientId;
use crate::store::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
    Clients,
    SelectedClients,
    ClientDetail(ClientId),
}

impl Route {
    pub fn is_protected(self) -> bool {
        !matches!(self, Route::Login)
    }
}

/// Resolves where a navigation actually lands. Every screen change goes
/// through here before any screen state is built.
pub fn guard(route: Route, session: &SessionStore) -> Route {
    match (route, session.is_authenticated()) {
        (route, false) if route.is_protected() => {
            tracing::info!(?route, "no active session, redirecting to login");
            Route::Login
        }
        (Route::Login, true) => Route::Home,
        (route, _) => route,
    }
}
