//! Config command handler.

use geolog::config::GeologConfig;

/// Config command.
pub fn cmd_config(config: &GeologConfig, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !show {
        println!("Use --show to display configuration");
        return Ok(());
    }

    println!("Current Configuration");
    println!("=====================");
    println!();

    println!("Config Files Loaded:");
    if config.config_sources.is_empty() {
        println!("  (none - using defaults)");
    } else {
        for source in &config.config_sources {
            println!("  - {}", source.display());
        }
    }
    println!();

    println!("Server:");
    println!("  Host: {}", config.server.host);
    println!("  Port: {}", config.server.port);
    println!();

    println!("Database:");
    println!("  Path: {}", config.database.path.display());
    println!("  Busy Timeout: {}ms", config.database.busy_timeout_ms);
    println!();

    println!("HTTP:");
    println!("  Error Policy: {}", config.error_policy.as_str());
    println!();

    println!("Validation:");
    println!(
        "  Strict Coordinates: {}",
        config.validation.strict_coordinates
    );
    println!();

    println!("Observability:");
    display_logging_config(config);
    display_metrics_config(config);

    Ok(())
}

fn display_logging_config(config: &GeologConfig) {
    let Some(logging) = config.observability.logging.as_ref() else {
        println!("  Logging: (defaults)");
        return;
    };
    println!(
        "  Logging Format: {}",
        logging.format.as_deref().unwrap_or("pretty")
    );
    println!(
        "  Logging Level: {}",
        logging.level.as_deref().unwrap_or("info")
    );
    if let Some(ref file) = logging.file {
        println!("  Logging File: {}", file.display());
    }
}

fn display_metrics_config(config: &GeologConfig) {
    let Some(metrics) = config.observability.metrics.as_ref() else {
        println!("  Metrics: (defaults)");
        return;
    };
    println!(
        "  Metrics Enabled: {}",
        metrics.enabled.unwrap_or(false)
    );
    if let Some(port) = metrics.port {
        println!("  Metrics Port: {port}");
    }
}
