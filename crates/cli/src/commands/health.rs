//! Service status commands

use anyhow::Result;

use crate::client::ApiClient;
use crate::output::{color_status, print_health, print_modes, OutputFormat};

/// Show health and readiness of the classification server
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;
    print_health(&health, format);

    if let OutputFormat::Table = format {
        let readiness = client.readiness().await?;
        let status = if readiness.ready { "ready" } else { "not ready" };
        match readiness.reason {
            Some(reason) => println!("Readiness: {} ({})", color_status(status), reason),
            None => println!("Readiness: {}", color_status(status)),
        }
    }

    Ok(())
}

/// List the prediction modes the server offers
pub async fn show_modes(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let modes = client.modes().await?;
    print_modes(&modes, format);
    Ok(())
}
