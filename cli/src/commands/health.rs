use anyhow::Result;
use colored::*;
use serde_json::json;

/// Execute the health check command
pub async fn execute(url: &str, format: &str) -> Result<()> {
    let health_status = check_server_health(url).await;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&health_status)?);
        }
        _ => {
            print_health_status_text(&health_status);
        }
    }

    Ok(())
}

fn health_endpoint(url: &str) -> String {
    format!("{}/health", url.trim_end_matches('/'))
}

/// Ask a running server for its health report
async fn check_server_health(url: &str) -> serde_json::Value {
    let endpoint = health_endpoint(url);

    let response = match reqwest::get(&endpoint).await {
        Ok(response) => response,
        Err(e) => {
            return json!({
                "status": "offline",
                "message": format!("Server is not running or not reachable: {}", e),
                "endpoint": endpoint,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            });
        }
    };

    if !response.status().is_success() {
        return json!({
            "status": "unhealthy",
            "message": format!("Server returned status: {}", response.status()),
            "endpoint": endpoint,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
    }

    match response.json::<serde_json::Value>().await {
        Ok(mut report) => {
            report["endpoint"] = json!(endpoint);
            report
        }
        Err(e) => json!({
            "status": "unhealthy",
            "message": format!("Server returned an unreadable health report: {}", e),
            "endpoint": endpoint,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }),
    }
}

/// Print health status in a formatted text output
fn print_health_status_text(status: &serde_json::Value) {
    println!("{}", "=== Auto Register Health Check ===".bold());
    println!();

    let overall_status = status["status"].as_str().unwrap_or("unknown");
    let status_display = match overall_status {
        "healthy" => "HEALTHY".green().bold(),
        "degraded" => "DEGRADED".yellow().bold(),
        "unhealthy" => "UNHEALTHY".red().bold(),
        "offline" => "OFFLINE".white().bold(),
        _ => "UNKNOWN".white().bold(),
    };

    println!("Overall Status: {}", status_display);
    println!("Endpoint: {}", status["endpoint"].as_str().unwrap_or(""));
    println!("Timestamp: {}", status["timestamp"].as_str().unwrap_or(""));

    if let Some(version) = status["version"].as_str() {
        println!("Version: {}", version);
    }
    if let Some(message) = status["message"].as_str() {
        println!("{}", message);
    }

    if let Some(database) = status["database"].as_object() {
        println!();
        let connected = database
            .get("connected")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let icon = if connected { "✓".green() } else { "✗".red() };
        println!(
            "{} {} {}",
            icon,
            "USER STORE".bold(),
            database
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_endpoint() {
        assert_eq!(
            health_endpoint("http://localhost:3030"),
            "http://localhost:3030/health"
        );
        assert_eq!(
            health_endpoint("http://localhost:3030/"),
            "http://localhost:3030/health"
        );
    }
}
