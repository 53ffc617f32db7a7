//! Model coverage and inspection commands

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, CoverageResponse, ModelResponse};
use crate::output::{print_json, print_success, print_table, print_warning, OutputFormat};

#[derive(Tabled)]
struct RegionRow {
    #[tabled(rename = "Region")]
    region_id: String,
    #[tabled(rename = "Center")]
    center: String,
    #[tabled(rename = "Latitude")]
    lat: String,
    #[tabled(rename = "Longitude")]
    lon: String,
    #[tabled(rename = "Quality")]
    quality: String,
    #[tabled(rename = "Sequences")]
    sequences: u64,
    #[tabled(rename = "Aftershocks")]
    aftershocks: u64,
    #[tabled(rename = "Setting")]
    setting: String,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn range(bounds: [f64; 2]) -> String {
    format!("{:.1} .. {:.1}", bounds[0], bounds[1])
}

/// Show every regional model the service covers
pub async fn show_coverage(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: CoverageResponse = client.get("api/models/coverage").await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if result.coverage.is_empty() {
                print_warning("No regional models loaded");
            } else {
                let rows: Vec<RegionRow> = result
                    .coverage
                    .iter()
                    .map(|r| RegionRow {
                        region_id: r.region_id.clone(),
                        center: format!("{:.2}, {:.2}", r.center.lat, r.center.lon),
                        lat: range(r.bounds.lat),
                        lon: range(r.bounds.lon),
                        quality: r.quality.clone(),
                        sequences: r.sequences,
                        aftershocks: r.aftershocks,
                        setting: r.tectonic_setting.clone(),
                    })
                    .collect();
                print_table(rows);
                println!("\nTotal: {} regional models", result.total_models);
            }

            if result.has_global_fallback {
                print_success("Global fallback model loaded");
            } else {
                print_warning("No global fallback model; uncovered locations cannot be forecast");
            }
        }
    }

    Ok(())
}

/// Show the parameters of one regional model
pub async fn show_model(client: &ApiClient, region_id: &str, format: OutputFormat) -> Result<()> {
    let path = format!("api/models/{}", region_id);
    let result: ModelResponse = client.get(&path).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            let model = &result.model;
            let params = &model.params;
            let center = model.center();
            let rows = vec![
                FieldRow { field: "Region", value: params.region_id.clone() },
                FieldRow { field: "Center", value: format!("{:.3}, {:.3}", center.lat, center.lon) },
                FieldRow { field: "Latitude", value: range(model.bounds.lat) },
                FieldRow { field: "Longitude", value: range(model.bounds.lon) },
                FieldRow { field: "Omori K", value: format!("{:.4}", params.omori.k) },
                FieldRow { field: "Omori c", value: format!("{:.4}", params.omori.c) },
                FieldRow { field: "Omori p", value: format!("{:.4}", params.omori.p) },
                FieldRow { field: "GR a-value", value: format!("{:.3}", params.gr.a_value) },
                FieldRow { field: "GR b-value", value: format!("{:.3}", params.gr.b_value) },
                FieldRow { field: "Quality", value: params.metadata.quality().to_string() },
                FieldRow { field: "Setting", value: params.metadata.setting().to_string() },
                FieldRow { field: "Sequences", value: params.metadata.n_sequences.to_string() },
                FieldRow { field: "Omori R²", value: format!("{:.3}", params.metadata.omori_r_squared) },
                FieldRow { field: "GR R²", value: format!("{:.3}", params.metadata.gr_r_squared) },
            ];
            print_table(rows);
        }
    }

    Ok(())
}
