//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use polaudit_domain::{DocType, IdentityHash};
use std::path::PathBuf;

/// Polaudit - Audit legal documents of websites with a language model.
#[derive(Debug, Parser)]
#[command(name = "polaudit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Audit every pending link and append one record per document
    Audit(AuditArgs),

    /// Show how many links are still to audit
    Pending(PendingArgs),

    /// Print the response schema of a document type
    Schema(SchemaArgs),
}

/// Arguments for the audit command.
#[derive(Debug, Parser)]
pub struct AuditArgs {
    /// Link list (one JSON object per line)
    #[arg(long)]
    pub links: PathBuf,

    /// Output store (one JSON record per line, appended)
    #[arg(long)]
    pub output: PathBuf,

    /// Model provider
    #[arg(long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Model to start from (default: gemini-2.5-pro)
    #[arg(long)]
    pub model: Option<String>,

    /// Requests per minute, capped by the model's free-tier ceiling (default: 8)
    #[arg(long)]
    pub rate: Option<u32>,

    /// Documents audited concurrently (default: 1)
    #[arg(long)]
    pub parallel: Option<usize>,

    /// Hash deriving record identities from URLs
    #[arg(long, value_enum)]
    pub identity_hash: Option<HashArg>,
}

/// Arguments for the pending command.
#[derive(Debug, Parser)]
pub struct PendingArgs {
    /// Link list (one JSON object per line)
    #[arg(long)]
    pub links: PathBuf,

    /// Output store to compare against
    #[arg(long)]
    pub output: PathBuf,

    /// Hash deriving record identities from URLs
    #[arg(long, value_enum)]
    pub identity_hash: Option<HashArg>,

    /// Print the pending URLs too
    #[arg(short, long)]
    pub list: bool,
}

/// Arguments for the schema command.
#[derive(Debug, Parser)]
pub struct SchemaArgs {
    /// Document type
    #[arg(value_enum)]
    pub doc_type: DocTypeArg,

    /// Print only the details object schema, without the response envelope
    #[arg(long)]
    pub details_only: bool,
}

/// Model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderArg {
    /// Google Gemini (schema-constrained output, model cascade)
    Gemini,
    /// OpenAI chat completions (freeform output only)
    #[value(name = "openai")]
    OpenAi,
}

/// Identity hash options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum HashArg {
    /// SHA-1 (compatible with existing output stores)
    Sha1,
    /// SHA-256
    Sha256,
}

/// Document type options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum DocTypeArg {
    /// Privacy policy
    PrivacyPolicy,
    /// Cookie policy
    CookiePolicy,
    /// Legal notice
    LegalNotice,
    /// Data-protection notice
    DataProtection,
}

impl From<ProviderArg> for crate::config::ProviderKind {
    fn from(provider: ProviderArg) -> Self {
        match provider {
            ProviderArg::Gemini => crate::config::ProviderKind::Gemini,
            ProviderArg::OpenAi => crate::config::ProviderKind::OpenAi,
        }
    }
}

impl From<HashArg> for IdentityHash {
    fn from(hash: HashArg) -> Self {
        match hash {
            HashArg::Sha1 => IdentityHash::Sha1,
            HashArg::Sha256 => IdentityHash::Sha256,
        }
    }
}

impl From<DocTypeArg> for DocType {
    fn from(doc_type: DocTypeArg) -> Self {
        match doc_type {
            DocTypeArg::PrivacyPolicy => DocType::PrivacyPolicy,
            DocTypeArg::CookiePolicy => DocType::CookiePolicy,
            DocTypeArg::LegalNotice => DocType::LegalNotice,
            DocTypeArg::DataProtection => DocType::DataProtection,
        }
    }
}
