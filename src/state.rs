use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::Config;
use crate::store::{SocialRepository, WorldRepository};
use crate::token::TokenIssuer;
use crate::ws::GatewayConnections;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<AuthService>,
    pub issuer: Arc<TokenIssuer>,
    pub worlds: Arc<WorldRepository>,
    pub social: Arc<SocialRepository>,
    pub gateway: Arc<GatewayConnections>,
}

impl AppState {
    pub fn new(
        config: Config,
        auth: AuthService,
        issuer: TokenIssuer,
        worlds: WorldRepository,
        social: SocialRepository,
    ) -> Self {
        Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            issuer: Arc::new(issuer),
            worlds: Arc::new(worlds),
            social: Arc::new(social),
            gateway: Arc::new(GatewayConnections::new()),
        }
    }
}
