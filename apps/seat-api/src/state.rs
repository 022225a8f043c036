use std::sync::Arc;

use seat_config::Config;
use seat_service::{Providers, SeatService};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SeatService>,
}
impl AppState {
	pub fn new(config: Config) -> Self {
		Self { service: Arc::new(SeatService::new(config)) }
	}

	pub fn with_providers(config: Config, providers: Providers) -> Self {
		Self { service: Arc::new(SeatService::with_providers(config, providers)) }
	}
}
