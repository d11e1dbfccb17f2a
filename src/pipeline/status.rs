use crate::cli::{ApiArgs, StatusArgs};
use crate::config::PipelineConfig;
use crate::pipeline::aggregate::RunAggregate;
use crate::pipeline::engine::{AggregationEngine, CancelToken};
use crate::source::HttpStatusSource;
use crate::structures::{RunDate, StageSnapshot, StatusClass};
use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use std::time::Duration;
use tracing::{info, warn};

pub struct StatusOutcome {
    pub failed_stages: usize,
}

pub fn run_status(args: StatusArgs, api: &ApiArgs, config: PipelineConfig) -> Result<StatusOutcome> {
    let run_date = args.date.unwrap_or_else(RunDate::today);
    let source = HttpStatusSource::new(api.settings()).context("Failed to set up status source")?;
    let engine = AggregationEngine::new(source, config).with_limit(args.limit);
    let run = engine.run(args.env, run_date)?;

    let cancel = CancelToken::new();
    if let Some(secs) = args.deadline_secs {
        let token = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(secs));
            token.cancel();
        });
    }

    if !args.json {
        println!(
            "{} {} for {}",
            "Stage status:".bold(),
            args.env,
            run_date
        );
    }

    let json = args.json;
    let report = run.with_cancel(cancel).collect_report_with(|snapshot| {
        if json {
            match serde_json::to_string(snapshot) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error=%e, stage=snapshot.stage_index, "failed to encode snapshot"),
            }
        } else {
            println!("{}", render_stage(snapshot));
        }
    });

    let stage_count = report.stages.first().map_or(0, |s| s.stage_count);
    if !json {
        println!("{}", render_summary(&report.summary, stage_count));
        if report.cancelled {
            println!("{}", "Run cancelled before all stages were checked.".yellow());
        }
    }

    info!(
        env=%report.environment,
        run_date=%report.run_date,
        total=report.summary.total,
        completed=report.summary.completed,
        running=report.summary.running,
        failed=report.summary.failed,
        pending=report.summary.pending,
        progress=report.summary.progress_percent,
        cancelled=report.cancelled,
        "pipeline status"
    );
    for f in report.stages_in(StatusClass::Failed) {
        warn!(stage=f.stage_index, job=%f.job_name, folder=%f.resolved.source_folder, "failed stage");
    }

    if let Some(path) = &args.output {
        report.save(path)?;
        info!(path=?path, "report written");
    }

    Ok(StatusOutcome {
        failed_stages: report.summary.failed,
    })
}

fn paint(class: StatusClass, text: &str) -> ColoredString {
    match class {
        StatusClass::Completed => text.green(),
        StatusClass::Running => text.yellow(),
        StatusClass::Failed => text.red(),
        StatusClass::Pending => text.bright_black(),
    }
}

fn render_stage(snapshot: &StageSnapshot) -> String {
    let status = if snapshot.cancelled {
        "Cancelled".to_string()
    } else {
        snapshot.resolved.status.clone()
    };
    format!(
        "{:>3}/{:<3} {:<20} {:<34} {} ({})",
        snapshot.stage_index,
        snapshot.stage_count,
        snapshot.label,
        snapshot.job_name,
        paint(snapshot.class, &status).bold(),
        snapshot.resolved.source_folder.dimmed()
    )
}

fn render_summary(agg: &RunAggregate, stage_count: usize) -> String {
    format!(
        "Overall progress {}% | {} {}/{} | {} {} | {} {} | {} {}",
        agg.progress_percent,
        paint(StatusClass::Completed, "Completed"),
        agg.completed,
        stage_count,
        paint(StatusClass::Running, "Running"),
        agg.running,
        paint(StatusClass::Failed, "Failed"),
        agg.failed,
        paint(StatusClass::Pending, "Pending"),
        agg.pending
    )
}
