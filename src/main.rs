//! CLI interface for trip-planner

use clap::{Parser, Subcommand};
use trip_planner::{plan_trip, Budget, CabinClass, TravelerCounts, TripRequest};
use std::fs;

#[derive(Parser)]
#[command(name = "trip-planner")]
#[command(about = "Plan a vacation from flight, hotel, weather and attraction data")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan a trip
    Plan {
        /// Origin city name
        #[arg(short, long)]
        from: String,
        /// Destination city name
        #[arg(short, long)]
        to: String,
        /// Departure date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
        /// Trip length in days
        #[arg(long, default_value = "7")]
        days: i64,
        /// Number of adults
        #[arg(long, default_value = "1")]
        adults: i32,
        /// Number of children
        #[arg(long, default_value = "0")]
        children: i32,
        /// Cabin class (economy, premium-economy, business, first)
        #[arg(long, default_value = "economy")]
        class: String,
        /// Vacation style (e.g., beach, city break, adventure)
        #[arg(long, default_value = "city break")]
        style: String,
        /// Total trip budget
        #[arg(long, default_value = "2000")]
        budget: f64,
        /// Budget currency (ISO 4217)
        #[arg(long, default_value = "EUR")]
        currency: String,
        /// Output file for the full plan as JSON
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            from,
            to,
            date,
            days,
            adults,
            children,
            class,
            style,
            budget,
            currency,
            output,
        } => {
            let request = TripRequest {
                origin: from,
                destination: to,
                start_date: date,
                duration_days: days,
                travelers: TravelerCounts { adults, children },
                cabin_class: class.parse::<CabinClass>()?,
                vacation_style: style,
                budget: Budget {
                    amount: budget,
                    currency,
                },
            };

            println!("Planning your trip...");
            match plan_trip(request).await {
                Ok(plan) => {
                    if let Some(output_file) = output {
                        let json = serde_json::to_string_pretty(&plan)?;
                        fs::write(&output_file, &json)?;
                        println!("Full plan saved to {}", output_file);
                    }

                    println!("\n{}", plan.itinerary);

                    // Print data-source summary
                    println!("\nData sources:");
                    println!("  Flights: {}", section_status(&plan.synthesis.flights));
                    println!("  Hotels: {}", section_status(&plan.synthesis.hotels));
                    println!("  Weather: {}", section_status(&plan.synthesis.weather));
                    println!(
                        "  Attractions: {}",
                        section_status(&plan.synthesis.attractions)
                    );
                }
                Err(e) => {
                    eprintln!("Error planning trip: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn section_status<T>(section: &trip_planner::SectionOutcome<Vec<T>>) -> String {
    use trip_planner::SectionOutcome;
    match section {
        SectionOutcome::Data(items) => format!("{} result(s)", items.len()),
        SectionOutcome::Empty => "none found (confirmed)".to_string(),
        SectionOutcome::Unavailable { reason } => format!("unavailable ({})", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(&[
            "trip-planner",
            "plan",
            "--from", "Stockholm",
            "--to", "Lisbon",
            "--date", "2025-10-10",
        ]);

        assert!(cli.is_ok());

        if let Ok(Cli {
            command:
                Commands::Plan {
                    from, to, date, days, ..
                },
        }) = cli
        {
            assert_eq!(from, "Stockholm");
            assert_eq!(to, "Lisbon");
            assert_eq!(date, "2025-10-10");
            assert_eq!(days, 7);
        }
    }

    #[test]
    fn test_cli_rejects_missing_destination() {
        let cli = Cli::try_parse_from(&[
            "trip-planner",
            "plan",
            "--from", "Stockholm",
            "--date", "2025-10-10",
        ]);
        assert!(cli.is_err());
    }
}
