use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::sync::broadcast;
use weatherdesk::models::WeatherSnapshot;
use weatherdesk::{
    LocationResolver, Notice, NoticeSeverity, ResolutionState, ResolveError, WeatherDeskConfig,
    logging, web,
};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = WeatherDeskConfig::load_from_path(cli.config.clone())
        .context("Failed to load configuration")?;
    logging::init(&config.logging, cli.verbose)?;

    let resolver = LocationResolver::from_config(&config)?;
    tracing::debug!("WeatherDesk {} ready", weatherdesk::VERSION);

    match cli.command {
        Command::Serve { port } => web::run(resolver, port).await,
        Command::Here => {
            let mut notices = resolver.notices();
            resolver.use_current_location().await;
            finish(&resolver, &mut notices).await
        }
        ref command @ Command::Weather { .. } => {
            let query = command.query().unwrap_or_default();
            if query.trim().is_empty() {
                bail!(ResolveError::EmptyQuery);
            }
            let mut notices = resolver.notices();
            resolver.submit_query(&query).await;
            finish(&resolver, &mut notices).await
        }
    }
}

/// Wait for any suggestion retry, print notices and the final state
async fn finish(
    resolver: &LocationResolver,
    notices: &mut broadcast::Receiver<Notice>,
) -> Result<()> {
    resolver.settled().await;

    while let Ok(notice) = notices.try_recv() {
        print_notice(&notice);
    }

    let state = resolver.state();
    match state.resolution {
        ResolutionState::Ready(snapshot) => {
            render(&snapshot);
            Ok(())
        }
        ResolutionState::Failed(error) => {
            if let Some(suggestion) = state.suggestion {
                eprintln!("Did you mean {suggestion}?");
            }
            bail!(error)
        }
        ResolutionState::Idle | ResolutionState::Loading => Ok(()),
    }
}

fn print_notice(notice: &Notice) {
    match notice.severity {
        NoticeSeverity::Info => eprintln!("ℹ️  {}: {}", notice.title, notice.description),
        NoticeSeverity::Error => eprintln!("❌ {}: {}", notice.title, notice.description),
    }
}

fn render(snapshot: &WeatherSnapshot) {
    let location = &snapshot.location;
    let current = &snapshot.current;

    println!("📍 {}", location.display_name());
    if !location.region.is_empty() {
        println!("   {}", location.region);
    }
    println!(
        "   {} | local time {}",
        location.format_coordinates(),
        location.local_time.format("%a %H:%M")
    );
    println!();
    println!("🌡️  {}", current.format_temperature());
    println!("☁️  {}", current.condition.text);
    println!("💧 Humidity {}%", current.humidity);
    println!("💨 Wind {}", current.format_wind());
    println!("🌧️  Precipitation {:.1} mm", current.precipitation_mm);
    if let Some(air_quality) = &current.air_quality {
        let level = air_quality.level();
        println!(
            "🫁 Air quality: {} (PM2.5 {:.1} µg/m³)",
            level.label(),
            air_quality.pm2_5
        );
        println!("   {}", level.description());
    }

    println!();
    println!("7-day forecast:");
    for day in &snapshot.forecast {
        println!(
            "  {} {:<10} {:>14}  {:<24} {:>5.1} mm {:>3.0}% {:>5.1} km/h",
            day.weekday(),
            day.date.format("%Y-%m-%d"),
            day.format_temperature_range(),
            day.condition.text,
            day.total_precip_mm,
            day.avg_humidity,
            day.max_wind_kph,
        );
    }
}
