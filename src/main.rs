/*!
 * Approval Policy CLI
 *
 * Evaluates one access request against a policy document and prints a JSON
 * report on stdout.
 *
 * Exit codes: 0 granted, 1 denied, 2 invalid request, 3 policy load error.
 *
 * Without `--unknown-labels` or `--strict`, APPROVAL_UNKNOWN_LABEL_POLICY and
 * APPROVAL_POLICY_STRICT are consulted; unusable values fall back to deny.
 *
 * ```bash
 * approval-policy check --policy policy.yaml --requester prod1 \
 *     --label prod_admin_approval --approver prod2 --approver prod3
 *
 * approval-policy validate --policy policy.yaml --strict
 * ```
 */

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;

use approval_policy::evaluator::{CaseInsensitive, ExactMatch, RequestDocument};
use approval_policy::monitoring::init_tracing_with_default;
use approval_policy::{
    DecisionReport, Evaluator, EvaluatorConfig, ExitStatus, FailureReport, IdentityResolver,
    LoadOptions, PolicyLoader, RequestError, UnknownLabelPolicy,
};

#[derive(Parser)]
#[command(name = "approval-policy")]
#[command(version)]
#[command(about = "Label-based multi-party approval policy engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide an access request
    Check(CheckArgs),

    /// Load and validate a policy document
    Validate(PolicyArgs),
}

#[derive(Args)]
struct PolicyArgs {
    /// Policy document (YAML)
    #[arg(short, long)]
    policy: PathBuf,

    /// Treat unknown record fields as errors (default from APPROVAL_POLICY_STRICT)
    #[arg(long)]
    strict: bool,

    /// Compare identities case-insensitively, ignoring surrounding whitespace
    #[arg(long)]
    case_insensitive: bool,
}

#[derive(Args)]
struct CheckArgs {
    #[command(flatten)]
    policy: PolicyArgs,

    /// Principal asking for access
    #[arg(short, long)]
    requester: Option<String>,

    /// Label attached to the target endpoint (repeatable)
    #[arg(short, long = "label")]
    labels: Vec<String>,

    /// Principal who approved the request (repeatable)
    #[arg(short, long = "approver")]
    approvers: Vec<String>,

    /// JSON request document with requester, labels, approvals
    #[arg(long, conflicts_with_all = ["requester", "labels", "approvers"])]
    request_file: Option<PathBuf>,

    /// Treatment of labels without a rule (default from
    /// APPROVAL_UNKNOWN_LABEL_POLICY, else deny)
    #[arg(long, value_enum, ignore_case = true)]
    unknown_labels: Option<UnknownLabels>,

    /// Include per-label diagnostics even when granted
    #[arg(long)]
    explain: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum UnknownLabels {
    Deny,
    Allow,
}

impl From<UnknownLabels> for UnknownLabelPolicy {
    fn from(value: UnknownLabels) -> Self {
        match value {
            UnknownLabels::Deny => UnknownLabelPolicy::Deny,
            UnknownLabels::Allow => UnknownLabelPolicy::Allow,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    init_tracing_with_default(filter);

    let result = match cli.command {
        Commands::Check(args) => cmd_check(args),
        Commands::Validate(args) => cmd_validate(args),
    };

    match result {
        Ok(status) => status.into(),
        Err(e) => {
            // Output failures are not policy outcomes
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn resolver(args: &PolicyArgs) -> Arc<dyn IdentityResolver> {
    if args.case_insensitive {
        Arc::new(CaseInsensitive)
    } else {
        Arc::new(ExactMatch)
    }
}

fn loader(args: &PolicyArgs) -> PolicyLoader {
    let options = if args.strict {
        LoadOptions::strict()
    } else {
        LoadOptions::from_env()
    };
    PolicyLoader::new(options).with_resolver(resolver(args))
}

fn cmd_check(args: CheckArgs) -> Result<ExitStatus> {
    let loaded = match loader(&args.policy).load_file(&args.policy.policy) {
        Ok(loaded) => loaded,
        Err(e) => return emit_failure(&FailureReport::from(&e)),
    };

    // An unusable environment value falls back to deny inside from_env
    let config = match args.unknown_labels {
        Some(policy) => EvaluatorConfig::default().with_unknown_label_policy(policy.into()),
        None => EvaluatorConfig::from_env(),
    };
    let evaluator = Evaluator::new(Arc::new(loaded.table))
        .with_config(config)
        .with_resolver(resolver(&args.policy));

    let request = match &args.request_file {
        Some(path) => match read_request(path) {
            Ok(document) => document.into_request(&*resolver(&args.policy)),
            Err(e) => Err(RequestError::invalid(format!("{:#}", e))),
        },
        None => evaluator.request(
            args.requester.as_deref().unwrap_or_default(),
            args.labels.iter().map(String::as_str),
            args.approvers.iter().map(String::as_str),
        ),
    };
    let request = match request {
        Ok(request) => request,
        Err(e) => return emit_failure(&FailureReport::from(&e)),
    };

    let decision = if args.explain {
        evaluator.explain(&request)
    } else {
        evaluator.evaluate(&request)
    };
    debug!(granted = decision.is_granted(), "Decision reached");

    emit_json(&DecisionReport::from(&decision))?;
    Ok(ExitStatus::from(&decision))
}

fn cmd_validate(args: PolicyArgs) -> Result<ExitStatus> {
    let loaded = match loader(&args).load_file(&args.policy) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e.clone()));
            return emit_failure(&FailureReport::from(&e));
        }
    };

    let mut out = std::io::stdout().lock();
    for warning in &loaded.warnings {
        writeln!(out, "warning: {}", warning)?;
    }
    for rule in loaded.table.rules() {
        writeln!(
            out,
            "{}\tquorum={}\trequester_must_be_authorized={}\tusers={}",
            rule.label(),
            rule.num_approvers_required(),
            rule.requester_must_be_authorized(),
            rule.sorted_users()
                .iter()
                .map(|u| u.as_str())
                .collect::<Vec<_>>()
                .join(",")
        )?;
    }
    writeln!(out, "{} rule(s) loaded", loaded.table.len())?;
    Ok(ExitStatus::Granted)
}

fn read_request(path: &Path) -> Result<RequestDocument> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading request file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing request file {}", path.display()))
}

fn emit_failure(report: &FailureReport) -> Result<ExitStatus> {
    emit_json(report)?;
    Ok(ExitStatus::from(report))
}

fn emit_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).context("writing report")?;
    writeln!(out)?;
    Ok(())
}
