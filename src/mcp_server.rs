// src/mcp_server.rs

use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    model::{ServerCapabilities, ServerInfo},
    schemars, tool,
    transport::stdio,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trip_planner::{
    Budget, CabinClass, SectionOutcome, TravelerCounts, TripPlanner, TripRequest,
};

/// Trip-planning MCP server
#[derive(Default, Clone)]
pub struct PlannerServer;

impl PlannerServer {
    pub fn new() -> Self {
        Self
    }

    /// Initialize logging to file
    fn init_logging() -> Result<()> {
        // Create logs directory if it doesn't exist
        let log_dir = PathBuf::from("logs");
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = tracing_appender::rolling::daily(&log_dir, "trip-planner-mcp.log");

        tracing_subscriber::registry()
            .with(
                EnvFilter::new("debug")
                    .add_directive("trip_planner=debug".parse()?)
                    .add_directive("reqwest=trace".parse()?)
                    .add_directive("hyper=trace".parse()?)
                    .add_directive("h2=trace".parse()?),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json(),
            )
            .init();

        info!("Logging initialized - logs will be written to logs/trip-planner-mcp.log.*");
        Ok(())
    }
}

/// Trip-planning parameters
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct PlanTripParams {
    #[schemars(description = "Origin city name (e.g., Stockholm)")]
    pub origin: String,
    #[schemars(description = "Destination city name (e.g., Lisbon)")]
    pub destination: String,
    #[schemars(description = "Departure date in YYYY-MM-DD format")]
    pub start_date: String,
    #[schemars(description = "Trip length in days (default: 7)")]
    pub duration_days: Option<i64>,
    #[schemars(description = "Number of adult travelers (default: 1)")]
    pub adults: Option<i32>,
    #[schemars(description = "Number of child travelers (default: 0)")]
    pub children: Option<i32>,
    #[schemars(description = "Cabin class: economy, premium-economy, business, first")]
    pub cabin_class: Option<String>,
    #[schemars(description = "Vacation style (e.g., beach, city break, adventure)")]
    pub vacation_style: Option<String>,
    #[schemars(description = "Total trip budget (default: 2000)")]
    pub budget: Option<f64>,
    #[schemars(description = "Budget currency as ISO 4217 code (default: EUR)")]
    pub budget_currency: Option<String>,
}

#[tool(tool_box)]
impl PlannerServer {
    /// Plan a vacation end to end
    #[tool(description = "Plan a vacation: resolves both city names, searches flights, hotels, weather and attractions, and generates a day-by-day itinerary. Sections for failed data sources are labeled as gaps rather than dropped.")]
    async fn plan_trip(
        &self,
        #[tool(aggr)] params: PlanTripParams,
    ) -> String {
        info!(
            origin = %params.origin,
            destination = %params.destination,
            start_date = %params.start_date,
            duration_days = params.duration_days.unwrap_or(7),
            adults = params.adults.unwrap_or(1),
            children = params.children.unwrap_or(0),
            "Trip plan request received"
        );

        let cabin_class = match params.cabin_class.as_deref() {
            Some(raw) => match CabinClass::from_str(raw) {
                Ok(class) => class,
                Err(e) => {
                    error!("Invalid cabin class: {}", e);
                    return format!(r#"{{"error": "Invalid cabin class: {}"}}"#, e);
                }
            },
            None => CabinClass::default(),
        };

        let request = TripRequest {
            origin: params.origin,
            destination: params.destination,
            start_date: params.start_date,
            duration_days: params.duration_days.unwrap_or(7),
            travelers: TravelerCounts {
                adults: params.adults.unwrap_or(1),
                children: params.children.unwrap_or(0),
            },
            cabin_class,
            vacation_style: params
                .vacation_style
                .unwrap_or_else(|| "city break".to_string()),
            budget: Budget {
                amount: params.budget.unwrap_or(2000.0),
                currency: params
                    .budget_currency
                    .unwrap_or_else(|| "EUR".to_string()),
            },
        };

        let planner = match TripPlanner::from_env() {
            Ok(planner) => planner,
            Err(e) => {
                error!("Planner configuration failed: {}", e);
                return format!(r#"{{"error": "Planner configuration failed: {}"}}"#, e);
            }
        };

        match planner.plan(request).await {
            Ok(plan) => {
                info!(
                    flights = section_label(&plan.synthesis.flights),
                    hotels = section_label(&plan.synthesis.hotels),
                    weather = section_label(&plan.synthesis.weather),
                    attractions = section_label(&plan.synthesis.attractions),
                    "Trip plan completed"
                );
                serde_json::to_string_pretty(&plan).unwrap_or_else(|e| {
                    format!(r#"{{"error": "Failed to serialize plan: {}"}}"#, e)
                })
            }
            Err(e) => {
                error!("Trip planning failed: {}", e);
                format!(r#"{{"error": "Trip planning failed: {}"}}"#, e)
            }
        }
    }
}

fn section_label<T>(section: &SectionOutcome<Vec<T>>) -> &'static str {
    match section {
        SectionOutcome::Data(_) => "data",
        SectionOutcome::Empty => "empty",
        SectionOutcome::Unavailable { .. } => "unavailable",
    }
}

#[tool(tool_box)]
impl ServerHandler for PlannerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("A travel-planning server. Resolves free-text city names to location codes, aggregates flight, hotel, weather and attraction data, and returns a generated itinerary together with the structured data it was built from.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging before anything else
    if let Err(e) = PlannerServer::init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        // Continue without logging rather than failing
    }

    info!("Starting MCP Trip Planner Server");

    let server = PlannerServer::new();
    let transport = stdio();

    info!("MCP server initialized, starting service");
    debug!("About to start MCP service");

    // SDK handles initialization, tool discovery, and message routing
    let service = server.serve(transport).await?;

    info!("MCP service started, waiting for requests");

    // Wait for shutdown
    service.waiting().await?;

    info!("MCP service shutting down");
    Ok(())
}
