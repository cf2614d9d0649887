use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use std::time::Duration;

// Import shared types
use hakone_types::*;

#[derive(Parser)]
#[command(name = "hakone")]
#[command(about = "Manage guest links on a Hakone server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend server URL
    #[arg(long, default_value = "http://localhost:3000")]
    server: String,

    /// Timeout for requests in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a guest link
    #[command(group(ArgGroup::new("expiry").required(true).args(["expires_at", "expires_in_hours"])))]
    Create {
        /// Label shown to the link owner (optional)
        #[arg(long)]
        label: Option<String>,

        /// When the link stops accepting uploads (RFC 3339)
        #[arg(long)]
        expires_at: Option<DateTime<Utc>>,

        /// Hours from now until the link stops accepting uploads
        #[arg(long)]
        expires_in_hours: Option<u32>,

        /// Days each uploaded file is kept
        #[arg(long, conflicts_with = "file_lifetime_infinite")]
        file_lifetime_days: Option<u32>,

        /// Keep uploaded files forever (default)
        #[arg(long)]
        file_lifetime_infinite: bool,

        /// Maximum size of a single upload in bytes (optional)
        #[arg(long)]
        max_file_bytes: Option<u64>,

        /// Maximum number of uploads (optional)
        #[arg(long)]
        max_file_uploads: Option<u32>,

        /// Output format (json or text)
        #[arg(long, default_value = "text")]
        output: OutputFormat,
    },
    /// Show a single guest link
    Get {
        id: String,

        /// Output format (json or text)
        #[arg(long, default_value = "text")]
        output: OutputFormat,
    },
    /// List all guest links
    List {
        /// Output format (json or text)
        #[arg(long, default_value = "text")]
        output: OutputFormat,
    },
    /// Delete a guest link
    Delete { id: String },
}

#[derive(Clone, Debug, PartialEq)]
enum OutputFormat {
    Json,
    Text,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "text" => Ok(OutputFormat::Text),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .build()
        .context("Failed to create HTTP client")?;

    match cli.command {
        Commands::Create {
            label,
            expires_at,
            expires_in_hours,
            file_lifetime_days,
            file_lifetime_infinite: _,
            max_file_bytes,
            max_file_uploads,
            output,
        } => {
            let url_expiration_time = match (expires_at, expires_in_hours) {
                (Some(at), _) => at,
                (None, Some(hours)) => Utc::now() + chrono::Duration::hours(i64::from(hours)),
                (None, None) => anyhow::bail!("Either --expires-at or --expires-in-hours is required"),
            };

            let request = CreateGuestLinkRequest {
                label,
                url_expiration_time,
                file_lifetime: file_lifetime_wire(file_lifetime_days),
                max_file_bytes,
                max_file_uploads,
            };

            create_guest_link(&client, &cli.server, &request, &output).await?;
        }
        Commands::Get { id, output } => {
            let info = get_guest_link(&client, &cli.server, &id).await?;
            print_guest_link(&info, &output)?;
        }
        Commands::List { output } => {
            let links = list_guest_links(&client, &cli.server).await?;
            print_guest_links(&links, &output)?;
        }
        Commands::Delete { id } => {
            delete_guest_link(&client, &cli.server, &id).await?;
            println!("🗑️  Guest link {} deleted", id);
        }
    }

    Ok(())
}

/// Wire form of a file lifetime; no day count means files are kept forever
fn file_lifetime_wire(days: Option<u32>) -> String {
    match days {
        Some(days) => format!("{}h0m0s", u64::from(days) * 24),
        None => INFINITE_FILE_LIFETIME.to_string(),
    }
}

async fn create_guest_link(
    client: &reqwest::Client,
    server: &str,
    request: &CreateGuestLinkRequest,
    output_format: &OutputFormat,
) -> Result<()> {
    let url = format!("{}/api/guest-links", server);

    let response = client
        .post(&url)
        .json(request)
        .send()
        .await
        .context("Failed to send create request")?;

    let created: GuestLinkPostResponse = parse_response(response, "Create").await?;

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&created)?),
        OutputFormat::Text => {
            println!("✅ Guest link created!");
            println!("🔗 ID: {}", created.id);
        }
    }

    Ok(())
}

async fn get_guest_link(client: &reqwest::Client, server: &str, id: &str) -> Result<GuestLinkInfo> {
    let url = format!("{}/api/guest-links/{}", server, id);

    let response = client
        .get(&url)
        .send()
        .await
        .context("Failed to send guest link request")?;

    parse_response(response, "Lookup").await
}

async fn list_guest_links(client: &reqwest::Client, server: &str) -> Result<Vec<GuestLinkInfo>> {
    let url = format!("{}/api/guest-links", server);

    let response = client
        .get(&url)
        .send()
        .await
        .context("Failed to send list request")?;

    parse_response(response, "List").await
}

async fn delete_guest_link(client: &reqwest::Client, server: &str, id: &str) -> Result<()> {
    let url = format!("{}/api/guest-links/{}", server, id);

    let response = client
        .delete(&url)
        .send()
        .await
        .context("Failed to send delete request")?;

    let _: serde_json::Value = parse_response(response, "Delete").await?;
    Ok(())
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    action: &str,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<ErrorResponse>(&error_text)
            .map(|e| e.message)
            .unwrap_or(error_text);
        return Err(anyhow::anyhow!(
            "{} failed with status {}: {}",
            action,
            status,
            message
        ));
    }

    response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", action.to_lowercase()))
}

fn print_guest_link(link: &GuestLinkInfo, output_format: &OutputFormat) -> Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", render_json(link)?),
        OutputFormat::Text => println!("{}", describe(link)),
    }

    Ok(())
}

/// Always an array in JSON, whatever the number of links
fn print_guest_links(links: &[GuestLinkInfo], output_format: &OutputFormat) -> Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", render_json(links)?),
        OutputFormat::Text => {
            if links.is_empty() {
                println!("No guest links");
            }
            for link in links {
                println!("{}", describe(link));
            }
        }
    }

    Ok(())
}

fn render_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to render JSON output")
}

fn describe(link: &GuestLinkInfo) -> String {
    let label = if link.label.is_empty() {
        "(no label)"
    } else {
        link.label.as_str()
    };
    let state = if link.is_active { "active" } else { "expired" };
    let lifetime = if link.file_lifetime == INFINITE_FILE_LIFETIME {
        "forever".to_string()
    } else {
        link.file_lifetime.clone()
    };
    let bytes = link
        .max_file_bytes
        .map_or_else(|| "unlimited".to_string(), |b| format!("{} bytes", b));
    let uploads = link
        .max_file_uploads
        .map_or_else(|| "unlimited".to_string(), |n| n.to_string());

    format!(
        "🔗 {} [{}] {}\n   expires {} · files kept {} · max size {} · max uploads {}",
        link.id,
        state,
        label,
        link.url_expires.to_rfc3339(),
        lifetime,
        bytes,
        uploads
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_lifetime_wire() {
        assert_eq!(file_lifetime_wire(None), "876000h0m0s");
        assert_eq!(file_lifetime_wire(Some(1)), "24h0m0s");
        assert_eq!(file_lifetime_wire(Some(30)), "720h0m0s");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("TEXT".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("url".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_create_requires_expiry() {
        assert!(Cli::try_parse_from(["hakone", "create"]).is_err());
        assert!(Cli::try_parse_from([
            "hakone",
            "create",
            "--expires-at",
            "2030-01-02T03:04:25Z",
            "--expires-in-hours",
            "4"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["hakone", "create", "--expires-in-hours", "4"]).is_ok());
    }

    #[test]
    fn test_lifetime_flags_conflict() {
        let result = Cli::try_parse_from([
            "hakone",
            "create",
            "--expires-in-hours",
            "4",
            "--file-lifetime-days",
            "3",
            "--file-lifetime-infinite",
        ]);
        assert!(result.is_err());
    }

    fn sample_link() -> GuestLinkInfo {
        GuestLinkInfo {
            id: "abcdefgh23456789".to_string(),
            label: String::new(),
            created: "2024-06-01T12:00:00Z".parse().unwrap(),
            url_expires: "2030-01-02T03:04:25Z".parse().unwrap(),
            file_lifetime: INFINITE_FILE_LIFETIME.to_string(),
            max_file_bytes: None,
            max_file_uploads: None,
            is_active: true,
        }
    }

    #[test]
    fn test_list_json_is_always_an_array() {
        let one: serde_json::Value =
            serde_json::from_str(&render_json(&[sample_link()][..]).unwrap()).unwrap();
        assert!(one.is_array());
        assert_eq!(one.as_array().unwrap().len(), 1);

        let none: serde_json::Value =
            serde_json::from_str(&render_json(&Vec::<GuestLinkInfo>::new()[..]).unwrap()).unwrap();
        assert_eq!(none, serde_json::json!([]));

        let single: serde_json::Value =
            serde_json::from_str(&render_json(&sample_link()).unwrap()).unwrap();
        assert!(single.is_object());
        assert_eq!(single["id"], "abcdefgh23456789");
    }

    #[test]
    fn test_describe_unlimited_link() {
        let text = describe(&sample_link());
        assert!(text.contains("[active]"));
        assert!(text.contains("(no label)"));
        assert!(text.contains("files kept forever"));
        assert!(text.contains("max uploads unlimited"));
    }
}
