//! `qec`: operator CLI for QEC-SFT governance analysis.
//!
//! Runs the analysis pipeline in-process with the same environment
//! configuration as the daemon.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qec_core::{AnalysisRequest, AnalysisResponse, IntegrationMode};
use qec_runtime::{AnalysisEngine, QecMetrics, RuntimeConfig};

mod evidence;

#[derive(Parser)]
#[command(name = "qec")]
#[command(about = "QEC-SFT governance requirement analysis", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level
    #[arg(long, global = true, env = "QEC_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long = "json-logs", global = true, env = "QEC_LOG_JSON")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a governance requirement
    Analyze {
        /// Requirement text (the LSU)
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        lsu: Option<String>,

        /// Request or evidence-packet JSON file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Analysis type (full, security, compliance, ...)
        #[arg(short = 't', long)]
        analysis_type: Option<String>,

        /// Preferred AI provider (nvidia, groq)
        #[arg(short, long)]
        provider: Option<String>,

        /// Integration mode; anything but `opa` skips policy rendering
        #[arg(long)]
        integration_mode: Option<String>,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show provider configuration and service version
    Status,
    /// Print an illustrative governance evidence packet
    EvidencePacket,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays pipeable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match cli.command {
        Commands::Analyze {
            lsu,
            file,
            analysis_type,
            provider,
            integration_mode,
            json,
        } => {
            let request = build_request(
                lsu,
                file.as_deref(),
                analysis_type,
                provider,
                integration_mode,
            )?;

            let response = build_engine()?.analyze(&request).await?;
            tracing::debug!(
                analysis_id = %response.analysis_id,
                provider = %response.ai_provider_used,
                compliance_status = %response.compliance_status,
                "Analysis finished"
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_summary(&response);
            }
        }
        Commands::Status => {
            let status = build_engine()?.status();
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::EvidencePacket => {
            let packet = evidence::generate_evidence_packet();
            println!("{}", serde_json::to_string_pretty(&packet)?);
        }
    }

    Ok(())
}

fn build_engine() -> anyhow::Result<AnalysisEngine> {
    let config = RuntimeConfig::from_env().context("invalid runtime configuration")?;
    let metrics = Arc::new(QecMetrics::new()?);
    Ok(AnalysisEngine::from_config(config, metrics)?)
}

/// Request from positional text or a JSON file, with CLI overrides applied.
fn build_request(
    lsu: Option<String>,
    file: Option<&Path>,
    analysis_type: Option<String>,
    provider: Option<String>,
    integration_mode: Option<String>,
) -> anyhow::Result<AnalysisRequest> {
    let mut request = match (lsu, file) {
        (_, Some(path)) => read_request(path)?,
        (Some(lsu), None) => AnalysisRequest::new(lsu),
        (None, None) => bail!("either an LSU or --file is required"),
    };

    if let Some(analysis_type) = analysis_type {
        request = request.with_analysis_type(analysis_type);
    }
    if let Some(provider) = provider {
        request = request.with_provider_preference(provider);
    }
    if let Some(mode) = integration_mode {
        request = request.with_integration_mode(IntegrationMode::from(mode));
    }

    tracing::debug!(
        analysis_type = %request.analysis_type,
        provider_preference = ?request.ai_provider_preference,
        integration_mode = request.integration_mode.as_str(),
        "Running analysis"
    );
    Ok(request)
}

fn read_request(path: &Path) -> anyhow::Result<AnalysisRequest> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    AnalysisRequest::from_json(&body)
        .with_context(|| format!("invalid request in {}", path.display()))
}

fn print_summary(response: &AnalysisResponse) {
    let certificate = &response.qec_result.certificate;

    println!("Analysis:     {}", response.analysis_id);
    println!("Provider:     {}", response.ai_provider_used);
    println!(
        "Coherence:    {:?} ({:.3})",
        certificate.status, certificate.coherence_score
    );
    println!("Risk:         {:?}", certificate.risk_assessment.severity);
    println!("Compliance:   {}", response.compliance_status);
    println!("Audit trail:  {}", response.audit_trail_id);
    println!("Duration:     {} ms", response.processing_time_ms);

    let syndrome: Vec<String> = certificate
        .syndrome_vector
        .iter()
        .map(|o| o.value().to_string())
        .collect();
    println!("Syndrome:     [{}]", syndrome.join(", "));

    if !response.recommendations.is_empty() {
        println!("\nRecommendations:");
        for recommendation in &response.recommendations {
            println!("  - {}", recommendation);
        }
    }

    if let Some(policy) = &response.opa_policy {
        println!("\nOPA policy:\n{}", policy);
    }
}
