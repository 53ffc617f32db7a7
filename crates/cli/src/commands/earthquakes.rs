//! Recent earthquakes command

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, EarthquakeList};
use crate::output::{color_magnitude, print_json, print_table, print_warning, OutputFormat};

#[derive(Tabled)]
struct EarthquakeRow {
    #[tabled(rename = "Magnitude")]
    magnitude: String,
    #[tabled(rename = "Place")]
    place: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Depth (km)")]
    depth: String,
    #[tabled(rename = "Location")]
    location: String,
}

/// List recent earthquakes, largest first
pub async fn list_earthquakes(
    client: &ApiClient,
    days: u32,
    min_magnitude: f64,
    format: OutputFormat,
) -> Result<()> {
    let path = format!(
        "api/earthquakes?days={}&min_magnitude={}",
        days, min_magnitude
    );
    let result: EarthquakeList = client.get(&path).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if result.earthquakes.is_empty() {
                print_warning("No earthquakes found");
                return Ok(());
            }

            let rows: Vec<EarthquakeRow> = result
                .earthquakes
                .iter()
                .map(|e| EarthquakeRow {
                    magnitude: color_magnitude(e.magnitude),
                    place: e.place.clone(),
                    time: e.time.clone(),
                    depth: format!("{:.1}", e.depth),
                    location: format!("{:.3}, {:.3}", e.latitude, e.longitude),
                })
                .collect();

            print_table(rows);
            println!(
                "\nTotal: {} earthquakes (last {} days, M{:.1}+)",
                result.count, days, min_magnitude
            );
        }
    }

    Ok(())
}
