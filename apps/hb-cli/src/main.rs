use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use hb_app::{
    AppError, AppResult, BatchOptions, BatchProgressEvent, BatchRequest, BatchStage,
    SingleRunRequest, batch_service, project_service, query, workspace_service,
};
use hb_core::ParamValue;
use hb_patch::{LineUpdate, PrintFrequency};
use hb_runner::{Backend, ParameterSet, ThreadExecutor};
use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(name = "hydrobatch")]
#[command(about = "Batch runner for SWAT+ style hydrology model workspaces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendChoice {
    /// Rayon pool in this process
    Local,
    /// Plain OS threads through the distributed executor interface
    Threads,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate batch file syntax and structure
    Validate {
        /// Path to the batch YAML file
        batch_path: PathBuf,
    },
    /// List the parameter sets of a batch
    Sets {
        /// Path to the batch YAML file
        batch_path: PathBuf,
    },
    /// Run every parameter set of a batch
    Run {
        /// Path to the batch YAML file
        batch_path: PathBuf,
        /// Worker count (defaults to the batch file's value)
        #[arg(short, long)]
        workers: Option<usize>,
        /// Parent directory of the run directories
        #[arg(short, long)]
        target: Option<PathBuf>,
        /// Do not apply the batch's setup section to the source workspace
        #[arg(long)]
        skip_setup: bool,
        /// Do not record a manifest
        #[arg(long)]
        no_save: bool,
        #[arg(long, value_enum, default_value = "local")]
        backend: BackendChoice,
    },
    /// Run one workspace as it is
    Single {
        /// Workspace directory
        workspace: PathBuf,
        /// Clone into this directory and run there
        #[arg(short, long)]
        target: Option<PathBuf>,
        /// Reuse the target directory instead of creating a subdirectory
        #[arg(long)]
        overwrite: bool,
        /// Hide the model's output
        #[arg(short, long)]
        quiet: bool,
        /// Executable file suffix
        #[arg(long)]
        suffix: Option<String>,
    },
    /// Copy a workspace's input files
    Clone {
        workspace: PathBuf,
        #[arg(short, long)]
        target: Option<PathBuf>,
        #[arg(long)]
        overwrite: bool,
    },
    /// Set the print frequencies of one object in print.prt
    PrintObject {
        workspace: PathBuf,
        /// Object name, or an output file name such as channel_sd_day.txt
        object: String,
        #[arg(long)]
        daily: bool,
        #[arg(long)]
        monthly: bool,
        #[arg(long)]
        yearly: bool,
        #[arg(long)]
        avann: bool,
    },
    /// Switch CSV output on or off
    Csv {
        workspace: PathBuf,
        /// Turn CSV output off
        #[arg(long)]
        off: bool,
    },
    /// Show or set the simulation window in time.sim
    SimWindow {
        workspace: PathBuf,
        /// Start date (YYYY-MM-DD)
        #[arg(long, requires = "end")]
        start: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long, requires = "start")]
        end: Option<String>,
        #[arg(long, default_value_t = 0)]
        step: u32,
    },
    /// Show or set the print window in print.prt
    PrintWindow {
        workspace: PathBuf,
        /// Print start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// Print end date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
        /// Warm-up years skipped from printing
        #[arg(long)]
        warmup: Option<u32>,
        #[arg(long, default_value_t = 1)]
        interval: u32,
    },
    /// Render a template with token=value pairs
    Template {
        workspace: PathBuf,
        /// Template file name inside the workspace
        template: String,
        /// Token assignment, e.g. --set awc=0.25
        #[arg(long = "set", value_name = "TOKEN=VALUE")]
        tokens: Vec<String>,
    },
    /// List recorded batches
    Batches {
        batch_path: PathBuf,
    },
    /// Show details of a recorded batch
    ShowBatch {
        batch_path: PathBuf,
        batch_id: String,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { batch_path } => cmd_validate(&batch_path),
        Commands::Sets { batch_path } => cmd_sets(&batch_path),
        Commands::Run {
            batch_path,
            workers,
            target,
            skip_setup,
            no_save,
            backend,
        } => cmd_run(
            &batch_path,
            BatchOptions {
                workers,
                target_dir: target,
                skip_setup,
                persist: !no_save,
            },
            backend,
        ),
        Commands::Single {
            workspace,
            target,
            overwrite,
            quiet,
            suffix,
        } => cmd_single(
            &workspace,
            target.as_deref(),
            overwrite,
            quiet,
            suffix.as_deref(),
        ),
        Commands::Clone {
            workspace,
            target,
            overwrite,
        } => cmd_clone(&workspace, target.as_deref(), overwrite),
        Commands::PrintObject {
            workspace,
            object,
            daily,
            monthly,
            yearly,
            avann,
        } => cmd_print_object(
            &workspace,
            &object,
            PrintFrequency::new(daily, monthly, yearly, avann),
        ),
        Commands::Csv { workspace, off } => cmd_csv(&workspace, !off),
        Commands::SimWindow {
            workspace,
            start,
            end,
            step,
        } => cmd_sim_window(&workspace, start.zip(end), step),
        Commands::PrintWindow {
            workspace,
            start,
            end,
            warmup,
            interval,
        } => cmd_print_window(&workspace, start, end, warmup, interval),
        Commands::Template {
            workspace,
            template,
            tokens,
        } => cmd_template(&workspace, &template, &tokens),
        Commands::Batches { batch_path } => cmd_batches(&batch_path),
        Commands::ShowBatch {
            batch_path,
            batch_id,
        } => cmd_show_batch(&batch_path, &batch_id),
    }
}

fn cmd_validate(batch_path: &Path) -> AppResult<()> {
    println!("Validating batch: {}", batch_path.display());
    let batch = project_service::load_batch(batch_path)?;
    project_service::validate_batch(&batch)?;
    let workspace = project_service::resolve_workspace(batch_path, &batch);
    workspace_service::open_workspace(&workspace, batch.executable_suffix.as_deref())?;
    println!("✓ Batch is valid ({} sets)", batch.sets.len());
    Ok(())
}

fn cmd_sets(batch_path: &Path) -> AppResult<()> {
    let batch = project_service::load_batch(batch_path)?;
    println!("Sets in batch '{}':", batch.name);
    for set in project_service::list_sets(&batch) {
        println!(
            "  {} - {} edits ({} files, {} templates)",
            set.name,
            set.edit_count,
            set.files.len(),
            set.templates.len()
        );
    }
    Ok(())
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░"),
    );
    pb
}

fn cmd_run(batch_path: &Path, options: BatchOptions, backend: BackendChoice) -> AppResult<()> {
    println!("Running batch: {}", batch_path.display());

    let executor = ThreadExecutor::new(options.workers.unwrap_or(1));
    let request = BatchRequest {
        batch_path,
        options,
        backend: match backend {
            BackendChoice::Local => Backend::Local,
            BackendChoice::Threads => Backend::Distributed(&executor),
        },
    };

    let mut bar: Option<ProgressBar> = None;
    let response = batch_service::execute_batch_with_progress(
        &request,
        Some(&mut |event: BatchProgressEvent| match event.stage {
            BatchStage::RunningSets => {
                let pb = bar.get_or_insert_with(|| progress_bar(event.total));
                pb.set_position(event.completed as u64);
                if let Some(message) = event.message {
                    pb.set_message(message);
                }
            }
            BatchStage::SavingManifest | BatchStage::Completed => {
                if let Some(pb) = bar.take() {
                    pb.finish_and_clear();
                }
            }
            _ => {
                if let Some(message) = event.message {
                    println!("  {}", message);
                }
            }
        }),
    )?;

    let summary = query::get_batch_summary(&response.manifest);
    println!(
        "✓ Batch {} finished: {}/{} succeeded",
        response.batch_id, summary.succeeded, summary.total
    );
    for run in query::failed_runs(&response.manifest) {
        println!(
            "  ✗ {} - {}",
            run.set_name,
            run.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!(
        "  Timing: setup {:.2}s, runs {:.2}s, total {:.2}s",
        response.timing.setup_time_s, response.timing.run_time_s, response.timing.total_time_s
    );
    if let Some(path) = &response.manifest_path {
        println!("  Manifest: {}", path.display());
    }
    Ok(())
}

fn cmd_single(
    workspace: &Path,
    target: Option<&Path>,
    overwrite: bool,
    quiet: bool,
    suffix: Option<&str>,
) -> AppResult<()> {
    let request = SingleRunRequest {
        workspace,
        executable_suffix: suffix,
        target,
        overwrite,
        set: ParameterSet::new(),
    };
    let mut echo = |line: &str| println!("{}", line);
    let sink: Option<&mut dyn FnMut(&str)> = if quiet { None } else { Some(&mut echo) };
    let ran_in = hb_app::run_single(&request, sink)?;
    println!("✓ Simulation completed in {}", ran_in.display());
    Ok(())
}

fn cmd_clone(workspace: &Path, target: Option<&Path>, overwrite: bool) -> AppResult<()> {
    let workspace = workspace_service::open_workspace(workspace, None)?;
    let cloned = workspace_service::clone_workspace(&workspace, target, overwrite)?;
    println!("✓ Cloned to {}", cloned.display());
    Ok(())
}

fn cmd_print_object(workspace: &Path, object: &str, frequency: PrintFrequency) -> AppResult<()> {
    let workspace = workspace_service::open_workspace(workspace, None)?;
    match workspace_service::set_print_object(&workspace, object, frequency)? {
        LineUpdate::Replaced { line } => println!("✓ Updated print.prt line {}", line),
        LineUpdate::Appended { line } => println!("✓ Appended print.prt line {}", line),
    }
    Ok(())
}

fn cmd_csv(workspace: &Path, enable: bool) -> AppResult<()> {
    let workspace = workspace_service::open_workspace(workspace, None)?;
    workspace_service::set_csv_output(&workspace, enable)?;
    println!("✓ CSV output {}", if enable { "enabled" } else { "disabled" });
    Ok(())
}

fn cmd_sim_window(workspace: &Path, range: Option<(String, String)>, step: u32) -> AppResult<()> {
    let workspace = workspace_service::open_workspace(workspace, None)?;
    let window = match range {
        Some((start, end)) => {
            workspace_service::set_simulation_window(&workspace, &start, &end, step)?
        }
        None => workspace_service::simulation_window(&workspace)?,
    };
    println!(
        "Simulation window: day {} of {} to day {} of {} (step {})",
        window.start.day, window.start.year, window.end.day, window.end.year, window.step
    );
    Ok(())
}

fn cmd_print_window(
    workspace: &Path,
    start: Option<String>,
    end: Option<String>,
    warmup: Option<u32>,
    interval: u32,
) -> AppResult<()> {
    let workspace = workspace_service::open_workspace(workspace, None)?;
    let window = if start.is_none() && end.is_none() && warmup.is_none() {
        workspace_service::print_window(&workspace)?
    } else {
        workspace_service::set_print_window(
            &workspace,
            start.as_deref(),
            end.as_deref(),
            warmup.unwrap_or(1),
            interval,
        )?
    };
    match window.window {
        Some((start, end)) => println!(
            "Print window: day {} of {} to day {} of {} (warm-up {}, interval {})",
            start.day, start.year, end.day, end.year, window.warmup, window.interval
        ),
        None => println!(
            "Print window: skip {} warm-up years (interval {})",
            window.warmup, window.interval
        ),
    }
    Ok(())
}

fn parse_tokens(tokens: &[String]) -> AppResult<IndexMap<String, ParamValue>> {
    tokens
        .iter()
        .map(|pair| {
            let (token, value) = pair.split_once('=').ok_or_else(|| {
                AppError::InvalidInput(format!("expected TOKEN=VALUE, got '{}'", pair))
            })?;
            Ok((token.trim().to_string(), ParamValue::parse_literal(value)))
        })
        .collect()
}

fn cmd_template(workspace: &Path, template: &str, tokens: &[String]) -> AppResult<()> {
    let workspace = workspace_service::open_workspace(workspace, None)?;
    let tokens = parse_tokens(tokens)?;
    let output = workspace_service::apply_template(&workspace, template, &tokens)?;
    println!("✓ Rendered {}", output.display());
    Ok(())
}

fn cmd_batches(batch_path: &Path) -> AppResult<()> {
    let batches = batch_service::list_batches(batch_path)?;
    if batches.is_empty() {
        println!("No recorded batches");
        return Ok(());
    }
    println!("Recorded batches:");
    for manifest in &batches {
        let summary = query::get_batch_summary(manifest);
        println!(
            "  {} - {} ({}/{} succeeded, {:.1}s)",
            summary.batch_id, summary.timestamp, summary.succeeded, summary.total, summary.elapsed_s
        );
    }
    Ok(())
}

fn cmd_show_batch(batch_path: &Path, batch_id: &str) -> AppResult<()> {
    let manifest = batch_service::load_batch_manifest(batch_path, batch_id)?;
    let summary = query::get_batch_summary(&manifest);

    println!("Batch: {}", manifest.batch_id);
    println!("  Name: {}", manifest.name);
    println!("  Timestamp: {}", manifest.timestamp);
    println!("  Source workspace: {}", manifest.workspace.display());
    println!("  Workers: {}", manifest.workers);
    println!(
        "  Runs: {} ({} succeeded, {} failed)",
        summary.total, summary.succeeded, summary.failed
    );
    if let Some(mean) = summary.mean_run_s {
        println!("  Mean run time: {:.2}s", mean);
    }
    for run in &manifest.runs {
        match (&run.workspace, &run.error) {
            (Some(path), _) => println!("  [{}] {} → {}", run.index, run.set_name, path.display()),
            (None, Some(err)) => println!("  [{}] {} ✗ {}", run.index, run.set_name, err),
            (None, None) => println!("  [{}] {}", run.index, run.set_name),
        }
    }
    Ok(())
}
