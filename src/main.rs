mod app;
mod logging;
mod net;
mod overpass;
mod tui;
mod types;
mod ui;

use clap::Parser;
use tracing::info;

use crate::net::http::ReqwestClient;
use crate::overpass::OverpassApi;

#[derive(Parser)]
#[command(name = "gravemap")]
#[command(about = "Browse OpenStreetMap cemeteries and graves from the terminal", long_about = None)]
struct Args {
    /// Initial search area
    #[arg(long, default_value = "London")]
    area: String,

    /// Overpass interpreter endpoint (falls back to GRAVEMAP_OVERPASS_URL)
    #[arg(long)]
    overpass_url: Option<String>,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let _logging_guard = logging::init_logging("logs", "gravemap.log")?;

    let url = args
        .overpass_url
        .or_else(|| std::env::var("GRAVEMAP_OVERPASS_URL").ok())
        .unwrap_or_else(|| overpass::DEFAULT_OVERPASS_URL.to_string());
    info!(%url, area = %args.area, "starting gravemap");

    let api = OverpassApi::with_url(ReqwestClient::new(), url);
    tui::run(api, args.area).await
}
