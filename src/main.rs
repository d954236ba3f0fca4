use clap::Parser;
use fpml_courier::application::engine::{Engine, ValidationEngine};
use fpml_courier::application::service::MessagingService;
use fpml_courier::config::Config;
use fpml_courier::domain::ports::DocumentValidatorBox;
use fpml_courier::infrastructure::user_context::UserRegistry;
use fpml_courier::infrastructure::xml::{XmlBuilder, XmlValidator};
use fpml_courier::interfaces::fs::document_reader::DocumentReader;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// FpML documents to submit, or directories of `*.xml` files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// JSON configuration file (optional). Built-in defaults are used otherwise.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Username the documents are submitted as
    #[arg(long, default_value = "demo")]
    user: String,

    /// Stop waiting for a reply after this many milliseconds
    #[arg(long)]
    wait_timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // A configuration that cannot be resolved is fatal.
    let config = match &cli.config {
        Some(path) => Config::load(path).into_diagnostic()?,
        None => Config::default(),
    };
    let settings = config.engine_settings().into_diagnostic()?;
    let wait_timeout = cli
        .wait_timeout_ms
        .map(Duration::from_millis)
        .or_else(|| config.wait_timeout());

    let validator: DocumentValidatorBox = Box::new(XmlValidator::new());
    let engine: Arc<dyn Engine> = Arc::new(ValidationEngine::new(
        settings,
        validator,
        XmlBuilder::factory(),
    ));
    let service = MessagingService::new(engine, Arc::new(UserRegistry::new()))
        .with_wait_timeout(wait_timeout);

    service.start_session(&cli.user).await;
    while let Some(notification) = service.retrieve_notification(&cli.user, false).await {
        println!("==> notification");
        print!("{notification}");
    }

    let reader = DocumentReader::new(cli.inputs);
    for document in reader.documents() {
        match document {
            Ok(document) => {
                let correlation_id = service.submit_message(&cli.user, document.text).await;
                match service
                    .retrieve_response_message(&cli.user, &correlation_id, true)
                    .await
                {
                    Some(reply) => {
                        println!("==> {} ({correlation_id})", document.path.display());
                        print!("{reply}");
                    }
                    None => warn!(
                        %correlation_id,
                        "No reply received for {}",
                        document.path.display()
                    ),
                }
            }
            Err(e) => {
                warn!("Error reading document: {e}");
            }
        }
    }

    service.end_session(&cli.user).await;
    Ok(())
}
