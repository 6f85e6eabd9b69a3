use p7mtopdf_core::Config;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub config: Config,
}
