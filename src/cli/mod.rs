//! # Command Line Interface
//!
//! Validates model documents, prints resolved references, and evaluates
//! named predicates and SAN matchers against sample input.

pub mod output;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::AppConfig;
use crate::domain::RegexCache;
use crate::model::{ModelDocument, ResolvedReference, ValidatedModel};
use crate::observability::{init_logging, log_config_info};
use output::{print_output, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "meshcore")]
#[command(about = "Validate and evaluate service mesh routing configuration")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (YAML, TOML or JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format: json, yaml or table
    #[arg(short, long, global = true, default_value = "table")]
    pub output: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate every object in a model document
    Validate {
        /// Model document (YAML, or JSON with a .json extension)
        file: PathBuf,
    },

    /// Print the resolved identity of every reference in a document
    Resolve {
        file: PathBuf,

        /// Override the document's namespace
        #[arg(long)]
        namespace: Option<String>,
    },

    /// Evaluate a named match object against a value
    Eval {
        file: PathBuf,

        /// Name of the object to evaluate
        #[arg(long)]
        object: String,

        /// Value presented to the predicate
        #[arg(long)]
        value: String,
    },

    /// Evaluate a named SAN matcher against a peer's presented names
    San {
        file: PathBuf,

        #[arg(long)]
        object: String,

        /// A SAN presented by the peer; repeat for several
        #[arg(long = "peer")]
        peers: Vec<String>,
    },
}

/// Summary printed by `validate`
#[derive(Debug, Serialize)]
pub struct ValidationSummary {
    pub namespace: String,
    pub objects: usize,
    pub predicates: usize,
    pub query_parameters: usize,
    pub references: usize,
    pub san_matchers: usize,
}

/// Outcome of `eval` and `san`
#[derive(Debug, Serialize)]
pub struct Verdict {
    pub object: String,
    pub matched: bool,
}

/// Run CLI commands
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging);
    if cli.verbose {
        log_config_info(&config);
    }

    let cache = config.regex.build_cache();
    execute(cli.command, &config, &cache, cli.output)
}

/// Run one command against a loaded configuration
pub fn execute(
    command: Commands,
    config: &AppConfig,
    cache: &RegexCache,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        Commands::Validate { file } => {
            let document = load_document(&file, None)?;
            let model = validate_document(&document, config, cache)?;
            let summary = summarize(&document, &model);
            let rows = vec![
                ("namespace".to_string(), summary.namespace.clone()),
                ("objects".to_string(), summary.objects.to_string()),
                ("predicates".to_string(), summary.predicates.to_string()),
                ("query parameters".to_string(), summary.query_parameters.to_string()),
                ("references".to_string(), summary.references.to_string()),
                ("SAN matchers".to_string(), summary.san_matchers.to_string()),
            ];
            print_output(&summary, &rows, ("FIELD", "VALUE"), format)
        }
        Commands::Resolve { file, namespace } => {
            let document = load_document(&file, namespace)?;
            let model = validate_document(&document, config, cache)?;
            let rows = reference_rows(&model.references);
            print_output(&model.references, &rows, ("OBJECT", "RESOLVES TO"), format)
        }
        Commands::Eval { file, object, value } => {
            let document = load_document(&file, None)?;
            let model = validate_document(&document, config, cache)?;
            let verdict = evaluate_object(&model, &object, &value)?;
            let rows = vec![(verdict.object.clone(), verdict.matched.to_string())];
            print_output(&verdict, &rows, ("OBJECT", "MATCHED"), format)
        }
        Commands::San { file, object, peers } => {
            let document = load_document(&file, None)?;
            let model = validate_document(&document, config, cache)?;
            let verdict = evaluate_san(&model, &object, &peers)?;
            let rows = vec![(verdict.object.clone(), verdict.matched.to_string())];
            print_output(&verdict, &rows, ("OBJECT", "MATCHED"), format)
        }
    }
}

fn load_document(path: &Path, namespace: Option<String>) -> anyhow::Result<ModelDocument> {
    let mut document = ModelDocument::from_path(path)
        .with_context(|| format!("Failed to load model document {}", path.display()))?;
    if namespace.is_some() {
        document.namespace = namespace;
    }
    Ok(document)
}

/// Validate, printing every collected error before failing
pub fn validate_document(
    document: &ModelDocument,
    config: &AppConfig,
    cache: &RegexCache,
) -> anyhow::Result<ValidatedModel> {
    match document.validate(&config.resolver.default_namespace, cache) {
        Ok(model) => Ok(model),
        Err(errors) => {
            for error in &errors {
                eprintln!("  {}", error);
            }
            anyhow::bail!("{} validation error(s)", errors.len())
        }
    }
}

pub fn summarize(document: &ModelDocument, model: &ValidatedModel) -> ValidationSummary {
    ValidationSummary {
        namespace: model.namespace.clone(),
        objects: document.objects.len(),
        predicates: model.predicates.len(),
        query_parameters: model.query_parameters.len(),
        references: model.references.len(),
        san_matchers: model.san_matchers.len(),
    }
}

pub fn evaluate_object(
    model: &ValidatedModel,
    object: &str,
    value: &str,
) -> anyhow::Result<Verdict> {
    let matched = model
        .evaluate(object, value)
        .with_context(|| format!("No evaluable object named '{}'", object))?;
    Ok(Verdict { object: object.to_string(), matched })
}

pub fn evaluate_san(
    model: &ValidatedModel,
    object: &str,
    peers: &[String],
) -> anyhow::Result<Verdict> {
    let matched = model
        .evaluate_san(object, peers)
        .with_context(|| format!("No SubjectAlternativeNames object named '{}'", object))?;
    Ok(Verdict { object: object.to_string(), matched })
}

fn reference_rows(references: &BTreeMap<String, ResolvedReference>) -> Vec<(String, String)> {
    references
        .iter()
        .map(|(name, resolved)| {
            let target = match resolved {
                ResolvedReference::Named { kind, identity } => format!("{} {}", kind, identity),
                ResolvedReference::Mesh(bound) => {
                    format!("Mesh {} (uid {})", bound.identity, bound.uid)
                }
                ResolvedReference::Gateway(bound) => {
                    format!("VirtualGateway {} (uid {})", bound.identity, bound.uid)
                }
            };
            (name.clone(), target)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOCUMENT: &str = r#"
namespace: apps
objects:
  - name: api
    kind: HTTPPathMatch
    spec:
      regex: "^/api/"
  - name: backend
    kind: VirtualNodeReference
    spec:
      name: backend-v1
  - name: mesh
    kind: MeshReference
    spec:
      name: global
      uid: 3f2a
  - name: peers
    kind: SubjectAlternativeNames
    spec:
      match:
        exact: ["spiffe://apps/web"]
"#;

    fn write_document(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn model() -> (ModelDocument, ValidatedModel) {
        let document = ModelDocument::from_yaml_str(DOCUMENT).unwrap();
        let model =
            validate_document(&document, &AppConfig::default(), &RegexCache::default()).unwrap();
        (document, model)
    }

    #[test]
    fn parses_subcommands_and_global_flags() {
        let cli = Cli::try_parse_from([
            "meshcore", "eval", "doc.yaml", "--object", "api", "--value", "/api/x", "-o", "json",
        ])
        .unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Eval { ref object, .. } if object == "api"));

        let cli = Cli::try_parse_from([
            "meshcore", "san", "doc.yaml", "--object", "peers", "--peer", "a", "--peer", "b",
        ])
        .unwrap();
        match cli.command {
            Commands::San { peers, .. } => assert_eq!(peers, vec!["a", "b"]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn summary_counts_objects() {
        let (document, model) = model();
        let summary = summarize(&document, &model);
        assert_eq!(summary.namespace, "apps");
        assert_eq!(summary.objects, 4);
        assert_eq!(summary.predicates, 1);
        assert_eq!(summary.references, 2);
        assert_eq!(summary.san_matchers, 1);
    }

    #[test]
    fn eval_and_san_verdicts() {
        let (_, model) = model();
        assert!(evaluate_object(&model, "api", "/api/users").unwrap().matched);
        assert!(!evaluate_object(&model, "api", "/home").unwrap().matched);
        assert!(evaluate_object(&model, "nope", "x").is_err());

        let peers = vec!["spiffe://apps/web".to_string()];
        assert!(evaluate_san(&model, "peers", &peers).unwrap().matched);
        assert!(evaluate_san(&model, "api", &peers).is_err());
    }

    #[test]
    fn reference_rows_describe_targets() {
        let (_, model) = model();
        let rows = reference_rows(&model.references);
        assert_eq!(rows[0], ("backend".to_string(), "VirtualNode apps/backend-v1".to_string()));
        assert_eq!(rows[1], ("mesh".to_string(), "Mesh global (uid 3f2a)".to_string()));
    }

    #[test]
    fn execute_runs_against_files() {
        let file = write_document(DOCUMENT);
        let config = AppConfig::default();
        let cache = RegexCache::default();

        execute(
            Commands::Validate { file: file.path().to_path_buf() },
            &config,
            &cache,
            OutputFormat::Json,
        )
        .unwrap();
        execute(
            Commands::Resolve { file: file.path().to_path_buf(), namespace: Some("other".into()) },
            &config,
            &cache,
            OutputFormat::Table,
        )
        .unwrap();
    }

    #[test]
    fn execute_fails_on_invalid_document() {
        let file = write_document(
            "objects:\n  - name: p\n    kind: PortMapping\n    spec: { port: 0, protocol: tcp }\n",
        );
        let err = execute(
            Commands::Validate { file: file.path().to_path_buf() },
            &AppConfig::default(),
            &RegexCache::default(),
            OutputFormat::Table,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "1 validation error(s)");
    }
}
