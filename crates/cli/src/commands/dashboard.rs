//! Staff dashboard command.

use vunjabei_client::DashboardStats;
use vunjabei_core::Route;

use super::{App, CliError};
use crate::render;

pub async fn show(app: &App) -> Result<(), CliError> {
    app.enter(Route::AdminDashboard)?;
    render::progress("Loading stats...");
    let stats = DashboardStats::load(&app.api).await;
    render::dashboard(&stats);
    Ok(())
}
