//! Service health command

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, HealthView};
use crate::output::{color_status, print_json, print_table, OutputFormat};

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Show service and component health
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: HealthView = client.get("api/health").await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            println!("Status:          {}", color_status(&health.status));
            println!("Regional models: {}", health.models_loaded);
            println!(
                "Global fallback: {}",
                if health.has_global_model { "yes" } else { "no" }
            );

            let mut components: Vec<_> = health.components.iter().collect();
            components.sort_by(|a, b| a.0.cmp(b.0));
            let rows: Vec<ComponentRow> = components
                .into_iter()
                .map(|(name, c)| ComponentRow {
                    name: name.clone(),
                    status: color_status(c.status.as_str()),
                    message: c.message.clone().unwrap_or_default(),
                })
                .collect();

            if !rows.is_empty() {
                println!();
                print_table(rows);
            }
        }
    }

    Ok(())
}
