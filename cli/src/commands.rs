use std::fmt::Write as _;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;

use repsq_config::{BackendKind, LimitsConfig, RepsqConfig, Settings};
use repsq_core::{
    Base, CarryTrace, ComputeOptions, ComputeResult, DeterminismInput, ExportPayload, Timing,
    TraceRequest, classify_repunit, compute_digest, decode, decode_with_radix, encode,
    export_payload, repunit::square_repunit,
};
use repsq_engine::{
    JobOutcome, JobRequest, JobScheduler, ProcessExecutor, SchedulerLimits, ThreadExecutor, worker,
};

use crate::SquareArgs;

/// Exit statuses for jobs that did not complete.
const EXIT_ERRORED: u8 = 1;
const EXIT_CANCELLED: u8 = 2;
const EXIT_TIMED_OUT: u8 = 3;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SquareReport<'a> {
    #[serde(flatten)]
    export: ExportPayload,
    digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    carry_trace: Option<&'a CarryTrace>,
    timing: Timing,
}

fn scheduler_limits(settings: &Settings) -> SchedulerLimits {
    SchedulerLimits {
        safe_digits_exact: settings.safe_digits_exact,
        hard_timeout: settings.hard_timeout,
        warning_threshold: settings.warning_threshold,
    }
}

fn build_scheduler(backend: BackendKind, settings: &Settings) -> Result<JobScheduler> {
    let limits = scheduler_limits(settings);
    Ok(match backend {
        BackendKind::Thread => JobScheduler::with_limits(ThreadExecutor, limits),
        BackendKind::Process => {
            let executor = ProcessExecutor::current_exe().context("locating the repsq executable")?;
            JobScheduler::with_limits(executor, limits)
        }
    })
}

pub(crate) async fn square(args: SquareArgs, settings: &Settings) -> Result<ExitCode> {
    let backend = args.backend.unwrap_or(settings.backend);
    let scheduler = build_scheduler(backend, settings)?;

    let options = ComputeOptions {
        collect_trace: args.trace,
        trace_max_bytes: settings.trace_max_bytes,
        preview_window: settings.preview_window,
        preview_samples: settings.preview_samples,
    };
    let mut request = JobRequest::new(args.digits.clone(), args.base)
        .with_mode(args.mode)
        .with_options(options);
    if let Some(ms) = args.timeout_ms {
        request = request.with_timeout(Duration::from_millis(ms));
    }

    let handle = scheduler.submit(request).context("invalid input")?;
    tracing::debug!(job_id = %handle.id(), backend = backend.as_str(), "Submitted");

    let signal = scheduler.abort_signal();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.trigger("interrupted by Ctrl-C");
        }
    });
    let outcome = handle.await;
    ctrl_c.abort();

    let result = match outcome {
        JobOutcome::Completed { result, .. } => result,
        other => {
            eprintln!("{other}");
            return Ok(ExitCode::from(exit_status(&other)));
        }
    };

    let root = decode_with_radix(&args.digits, args.base).context("invalid input")?;
    let report = SquareReport {
        export: export_payload(&root, &result),
        digest: DeterminismInput::from_result(&root, &result).map(|input| compute_digest(&input)),
        carry_trace: args.trace.then(|| result.carry_trace()),
        timing: result.timing(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_square(&report, &result));
    }
    Ok(ExitCode::SUCCESS)
}

fn exit_status(outcome: &JobOutcome) -> u8 {
    match outcome {
        JobOutcome::Completed { .. } => 0,
        JobOutcome::Cancelled { .. } => EXIT_CANCELLED,
        JobOutcome::TimedOut { .. } => EXIT_TIMED_OUT,
        JobOutcome::Errored { .. } => EXIT_ERRORED,
    }
}

fn render_square(report: &SquareReport<'_>, result: &ComputeResult) -> String {
    let export = &report.export;
    let mut out = String::new();
    let _ = writeln!(out, "base        {}", export.base);
    let _ = writeln!(out, "root        {}", export.root_digits);
    let _ = writeln!(out, "square      {}", export.normalized_square_digits);
    let _ = writeln!(out, "peak        {}", export.peak);
    let verdict = match export.is_palindrome.as_bool() {
        Some(value) => value.to_string(),
        None => "indeterminate".to_string(),
    };
    let _ = writeln!(out, "palindrome  {verdict}");
    let _ = writeln!(
        out,
        "mode        {}{}",
        export.mode.as_str(),
        if export.is_approximate { " (approximate)" } else { "" }
    );
    if let Some(digest) = &report.digest {
        let _ = writeln!(out, "digest      {digest}");
    }
    let _ = writeln!(out, "elapsed     {} us", report.timing.total_us);

    match report.carry_trace {
        None | Some(CarryTrace::NotRequested) => {}
        Some(CarryTrace::Omitted { reason }) => {
            let _ = writeln!(out, "carry trace omitted: {reason}");
        }
        Some(CarryTrace::Collected { entries }) => {
            let _ = writeln!(out, "carry trace ({} positions, base {})", entries.len(), result.normalized_digits().base());
            for entry in entries {
                let _ = writeln!(
                    out,
                    "  k={:<6} raw={} in={} digit={} out={}",
                    entry.position,
                    entry.raw_coefficient,
                    entry.incoming_carry,
                    entry.digit_out,
                    entry.outgoing_carry
                );
            }
        }
    }
    out
}

pub(crate) fn classify(base: u32, length: usize, materialize: bool, json: bool) -> Result<ExitCode> {
    let base = Base::new(base)?;
    if length == 0 {
        bail!("repunit length must be at least 1");
    }
    let classification = classify_repunit(base, length);

    let square = materialize
        .then(|| encode(square_repunit(base, length, TraceRequest::Skip).normalized_digits()));

    if json {
        let value = serde_json::json!({
            "base": base,
            "length": length,
            "isPalindrome": classification.is_palindrome,
            "peak": classification.peak.to_str_radix(10),
            "squareDigits": square,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("base        {base}");
        println!("length      {length}");
        println!("palindrome  {}", classification.is_palindrome);
        println!("peak        {}", classification.peak);
        if let Some(square) = square {
            println!("square      {square}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub(crate) fn digest(
    base: u32,
    root: &str,
    square: &str,
    peak: &str,
    palindrome: bool,
) -> Result<ExitCode> {
    let base = Base::new(base)?;
    let root = decode(root, base).context("invalid root digits")?;
    let square = decode(square, base).context("invalid square digits")?;
    let peak = repsq_types::decimal::parse(peak)
        .ok_or_else(|| anyhow!("peak must be a non-negative decimal integer, got {peak:?}"))?;

    let input = DeterminismInput::new(base, encode(&root), encode(&square), &peak, palindrome);
    println!("{}", compute_digest(&input));
    Ok(ExitCode::SUCCESS)
}

pub(crate) fn limits(
    safe_digits_exact: Option<usize>,
    timeout_ms: Option<u64>,
    warning_ms: Option<u64>,
) -> Result<ExitCode> {
    let update = LimitsConfig {
        safe_digits_exact,
        worker_hard_timeout_ms: timeout_ms,
        warning_threshold_ms: warning_ms,
    };

    if update != LimitsConfig::default() {
        let path = RepsqConfig::persist_limits(&update).context("persisting limits")?;
        println!("updated {}", path.display());
    }

    let settings = RepsqConfig::load()
        .context("loading config")?
        .unwrap_or_default()
        .resolve();
    println!("safe_digits_exact       {}", settings.safe_digits_exact);
    println!("worker_hard_timeout_ms  {}", settings.hard_timeout.as_millis());
    println!("warning_threshold_ms    {}", settings.warning_threshold.as_millis());
    println!("trace_max_bytes         {}", settings.trace_max_bytes);
    println!("preview_window          {}", settings.preview_window);
    println!("preview_samples         {}", settings.preview_samples);
    println!("backend                 {}", settings.backend.as_str());
    Ok(ExitCode::SUCCESS)
}

pub(crate) async fn worker() -> Result<ExitCode> {
    tokio::task::spawn_blocking(|| {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        worker::serve(stdin.lock(), stdout.lock())
    })
    .await
    .context("worker thread failed")??;
    Ok(ExitCode::SUCCESS)
}
