use clap::{Parser, Subcommand};
use file_transfer_sdk::{FileListQuery, FileTransferClient};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "transfer-cli")]
#[command(about = "Query the file-transfer API, directly or through the relay", long_about = None)]
struct Cli {
    /// API root, e.g. http://localhost:8080/.netlify/functions/api-proxy
    #[arg(short, long, default_value = "http://localhost:8080/.netlify/functions/api-proxy")]
    url: String,

    #[arg(long, env = "TRANSFER_USERNAME")]
    username: String,

    #[arg(long, env = "TRANSFER_PASSWORD", hide_env_values = true)]
    password: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the signed-in user
    Whoami,
    /// Current status of a file
    Status { file_code: String },
    /// Transfer history of a file
    History { file_code: String },
    /// Files owned by a department
    Files {
        department_id: u64,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        size: Option<u32>,
    },
    /// Files waiting for a department to accept them
    Pending { department_id: u64 },
    /// Files requested from a department
    Requested {
        department_id: u64,
        #[arg(long)]
        details: bool,
    },
    /// List users
    Users,
    /// List departments
    Departments,
    /// List sections
    Sections,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = FileTransferClient::new(&cli.url);

    let (session, _) = client.login(&cli.username, &cli.password).await?;

    let value = match cli.command {
        Commands::Whoami => client.user_info(&session).await?,
        Commands::Status { file_code } => client.file_status(&session, file_code).await?,
        Commands::History { file_code } => client.transaction_history(&session, file_code).await?,
        Commands::Files {
            department_id,
            page,
            size,
        } => {
            let query = FileListQuery {
                page,
                size,
                ..Default::default()
            };
            let listing = client
                .files_by_department(&session, department_id, &query)
                .await?;
            serde_json::json!({ "files": listing.files, "totalPages": listing.total_pages })
        }
        Commands::Pending { department_id } => client.pending_files(&session, department_id).await?,
        Commands::Requested {
            department_id,
            details,
        } => {
            if details {
                client.requested_files_details(&session, department_id).await?
            } else {
                client.requested_files(&session, department_id).await?
            }
        }
        Commands::Users => client.all_users(&session).await?,
        Commands::Departments => client.all_departments(&session).await?,
        Commands::Sections => client.all_sections(&session).await?,
    };

    print_value(&value)?;
    session.logout();
    Ok(())
}

fn print_value(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
