use clap::{Args, Parser, Subcommand, builder::styling};
use clap_cargo::style;
use dws_core::{Credential, ServiceLocation};
use tracing_subscriber::EnvFilter;

mod call;
mod context;
mod describe;
mod stubgen;

#[derive(Parser)]
#[command(author, version, long_about = None)]
#[command(about = "Describe and call SOAP web services as flat schema objects")]
#[command(styles = CLAP_STYLING)]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    #[command(subcommand)]
    command: Commands,
}

pub const CLAP_STYLING: styling::Styles = styling::Styles::styled()
    .header(style::HEADER)
    .usage(style::USAGE)
    .literal(style::LITERAL)
    .placeholder(style::PLACEHOLDER)
    .error(style::ERROR)
    .valid(style::VALID)
    .invalid(style::INVALID);

/// Where the service is and how to authenticate
#[derive(Args)]
pub struct ServiceArgs {
    /// Location of the service description
    #[arg(long, global = true, env = "DWS_URL", value_name = "URL")]
    url: Option<ServiceLocation>,

    /// User name for HTTP basic authentication
    #[arg(long, global = true, env = "DWS_USERNAME")]
    username: Option<String>,

    /// Password for HTTP basic authentication
    #[arg(long, global = true, env = "DWS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Domain prefixed to the user name
    #[arg(long, global = true, env = "DWS_DOMAIN")]
    domain: Option<String>,

    /// Seconds to wait for the service description
    #[arg(long, global = true, default_value_t = 30, value_name = "SECS")]
    fetch_timeout: u64,
}

impl ServiceArgs {
    pub fn location(&self) -> miette::Result<&ServiceLocation> {
        self.url
            .as_ref()
            .ok_or_else(|| miette::miette!("No service location given; pass --url or set DWS_URL"))
    }

    pub fn credential(&self) -> Credential {
        match &self.username {
            Some(username) => {
                let credential =
                    Credential::basic(username.as_str(), self.password.clone().unwrap_or_default());
                match &self.domain {
                    Some(domain) => credential.with_domain(domain.as_str()),
                    None => credential,
                }
            }
            None => Credential::Default,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the schema object of a service
    Describe {
        /// Fail on operations that cannot be flattened instead of leaving them out
        #[arg(long)]
        no_skip: bool,

        /// Add the endpoint override input to every method
        #[arg(long)]
        dynamic_url: bool,

        /// Print the schema object as JSON
        #[arg(long)]
        json: bool,
    },
    /// Execute a method and print the rows it returns
    Call {
        /// Name of the method
        #[arg(value_name = "METHOD")]
        method: String,

        /// Input property value, repeatable
        #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = call::parse_param)]
        params: Vec<(String, String)>,

        /// Seconds to wait for the remote call
        #[arg(long, default_value_t = 30, value_name = "SECS")]
        timeout: u64,

        /// Print the rows as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a typed Rust client for a service
    Stubgen {
        /// File to write the client to, standard output when absent
        #[arg(long, value_name = "FILE")]
        out: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Describe {
            no_skip,
            dynamic_url,
            json,
        } => {
            describe::handle_describe_command(&cli.service, !no_skip, dynamic_url, json).await?;
        }
        Commands::Call {
            method,
            params,
            timeout,
            json,
        } => {
            call::handle_call_command(&cli.service, &method, params, timeout, json).await?;
        }
        Commands::Stubgen { out } => {
            stubgen::handle_stubgen_command(&cli.service, out).await?;
        }
    }

    Ok(())
}
