use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "qrmail-cli")]
#[command(about = "Client for the QR mail gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway health
    Health,
    /// Send the welcome email with a QR code
    SendEmail {
        /// Recipient address
        #[arg(long)]
        to: String,
        /// URL encoded in the QR code (server default when omitted)
        #[arg(long)]
        qr_url: Option<String>,
    },
    /// Submit an input proof to the contract and wait for confirmation
    SubmitProof {
        /// 0x-prefixed hex proof
        #[arg(long)]
        proof: String,
        /// Optional handle forwarded with the proof
        #[arg(long)]
        handle: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", cli.url)).send().await?,
        Commands::SendEmail { to, qr_url } => {
            let mut body = json!({ "to": to });
            if let Some(qr_url) = qr_url {
                body["qrUrl"] = Value::String(qr_url);
            }
            client
                .post(format!("{}/api/send-email", cli.url))
                .json(&body)
                .send()
                .await?
        }
        Commands::SubmitProof { proof, handle } => {
            let mut body = json!({ "inputProof": proof });
            if let Some(handle) = handle {
                body["handle"] = Value::String(handle);
            }
            client
                .post(format!("{}/contract/interact", cli.url))
                .json(&body)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
