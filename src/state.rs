use std::sync::Arc;

use crate::config::Config;
use crate::headers::AlertHeaders;
use crate::lookup::EntityLookup;
use crate::store::Stores;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub stores: Stores,
    pub lookup: EntityLookup,
    pub alerts: AlertHeaders,
}
