use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use bp_app::{
    AppError, AppResult, ComplianceReport, DischargeLimit, RunOptions, RunProgressEvent,
    RunRequest, RunStage, SeriesVariable, assess, extract_series, get_run_summary,
    minimum_compliant_srt, project_service, run_service, srt_range, srt_sweep, to_csv,
};
use bp_asm1::{Engine, EngineConfig, SimulationRequest};
use bp_sim::IntegratorType;
use tracing::info;

#[derive(Parser)]
#[command(name = "bp-cli")]
#[command(about = "Bardenpho CLI - ASM1 nitrogen removal under a winter temperature shock", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one SRT with the built-in plant and print the effluent outcome
    Simulate {
        /// Solids retention time in days
        #[arg(long, default_value_t = 20.0)]
        srt: f64,
        /// Influent ammonium (mg N/L)
        #[arg(long, default_value_t = 50.0)]
        nh4: f64,
        /// Influent readily biodegradable substrate (mg COD/L)
        #[arg(long)]
        substrate: Option<f64>,
        /// Share of influent fed to the secondary anoxic zone
        #[arg(long)]
        step_feed: Option<f64>,
        /// Integrator: rk4 or euler
        #[arg(long, default_value = "rk4")]
        integrator: String,
        /// Time step in days
        #[arg(long)]
        dt: Option<f64>,
        /// Discharge limit on total nitrogen (mg N/L)
        #[arg(long, default_value_t = 8.0)]
        limit: f64,
        /// Write the trajectory as CSV to this file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Sweep SRT in parallel and report the shortest compliant value
    Sweep {
        /// Influent ammonium (mg N/L)
        #[arg(long, default_value_t = 50.0)]
        nh4: f64,
        /// First SRT in days
        #[arg(long, default_value_t = 3.0)]
        from: f64,
        /// Last SRT in days
        #[arg(long, default_value_t = 30.0)]
        to: f64,
        /// SRT increment in days
        #[arg(long, default_value_t = 1.0)]
        step: f64,
        /// Discharge limit on total nitrogen (mg N/L)
        #[arg(long, default_value_t = 8.0)]
        limit: f64,
    },
    /// Validate plant file syntax and structure
    Validate {
        /// Path to the plant YAML file
        plant_path: PathBuf,
    },
    /// List scenarios in a plant file
    Scenarios {
        /// Path to the plant YAML file
        plant_path: PathBuf,
    },
    /// Run a scenario of a plant file and store the result
    Run {
        /// Path to the plant YAML file
        plant_path: PathBuf,
        /// Scenario ID to simulate
        scenario_id: String,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List stored runs for a plant
    Runs {
        /// Path to the plant YAML file
        plant_path: PathBuf,
        /// Only runs of this scenario
        #[arg(long)]
        scenario: Option<String>,
    },
    /// Show details of a stored run
    ShowRun {
        /// Path to the plant YAML file
        plant_path: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Export a stored run as CSV
    Export {
        /// Path to the plant YAML file
        plant_path: PathBuf,
        /// Run ID
        run_id: String,
        /// Single variable (temperature, nh4, no3, tn); all columns when omitted
        #[arg(long)]
        variable: Option<String>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            srt,
            nh4,
            substrate,
            step_feed,
            integrator,
            dt,
            limit,
            csv,
        } => {
            let mut request = SimulationRequest::new(srt, nh4);
            request.influent_substrate = substrate;
            request.step_feed_fraction = step_feed;
            cmd_simulate(&request, &integrator, dt, limit, csv.as_deref())
        }
        Commands::Sweep {
            nh4,
            from,
            to,
            step,
            limit,
        } => cmd_sweep(nh4, from, to, step, limit),
        Commands::Validate { plant_path } => cmd_validate(&plant_path),
        Commands::Scenarios { plant_path } => cmd_scenarios(&plant_path),
        Commands::Run {
            plant_path,
            scenario_id,
            no_cache,
        } => cmd_run(&plant_path, &scenario_id, !no_cache),
        Commands::Runs {
            plant_path,
            scenario,
        } => cmd_runs(&plant_path, scenario.as_deref()),
        Commands::ShowRun { plant_path, run_id } => cmd_show_run(&plant_path, &run_id),
        Commands::Export {
            plant_path,
            run_id,
            variable,
            output,
        } => cmd_export(&plant_path, &run_id, variable.as_deref(), output.as_deref()),
    }
}

fn discharge_limit(limit: f64) -> DischargeLimit {
    DischargeLimit {
        total_nitrogen_mg_l: limit,
        ..DischargeLimit::default()
    }
}

fn cmd_simulate(
    request: &SimulationRequest,
    integrator: &str,
    dt: Option<f64>,
    limit: f64,
    csv: Option<&Path>,
) -> AppResult<()> {
    let mut config = EngineConfig::default();
    config.numerics.integrator = integrator
        .parse::<IntegratorType>()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;
    if let Some(dt) = dt {
        config.numerics.dt = dt;
    }
    let engine = Engine::new(config)?;

    println!(
        "Simulating SRT = {:.1} d, influent NH4 = {:.1} mg/L ({})",
        request.srt_days,
        request.influent_ammonium,
        integrator
    );

    let started = Instant::now();
    let trajectory = engine.run(request)?;
    info!(
        records = trajectory.len(),
        elapsed_s = started.elapsed().as_secs_f64(),
        "simulation finished"
    );

    let report = assess(&trajectory.records, &discharge_limit(limit))?;
    print_report(&report);

    if let Some(path) = csv {
        let records = run_service::trajectory_records(&trajectory);
        std::fs::write(path, to_csv(&records))?;
        println!("✓ Wrote {} records to {}", records.len(), path.display());
    }
    Ok(())
}

fn print_report(report: &ComplianceReport) {
    println!("\nEffluent at day {:.1}:", report.final_day);
    println!("  NH4: {:.3} mg N/L", report.final_ammonium);
    println!("  NO3: {:.3} mg N/L", report.final_nitrate);
    println!("  TN:  {:.3} mg N/L", report.final_total_nitrogen);
    println!(
        "  Peak NH4: {:.3} mg N/L at day {:.1}",
        report.peak_ammonium, report.peak_ammonium_day
    );
    if let Some(pre) = report.pre_shock_peak_ammonium {
        println!("  Pre-shock peak NH4: {:.3} mg N/L", pre);
    }
    if report.compliant {
        println!(
            "✓ Meets TN limit of {:.1} mg/L (margin {:.3})",
            report.limit_mg_l, -report.margin_mg_l
        );
    } else {
        println!(
            "✗ Exceeds TN limit of {:.1} mg/L by {:.3}",
            report.limit_mg_l, report.margin_mg_l
        );
    }
    if let Some(rec) = &report.recommendation {
        println!("  {}", rec);
    }
}

fn cmd_sweep(nh4: f64, from: f64, to: f64, step: f64, limit: f64) -> AppResult<()> {
    let srts = srt_range(from, to, step)?;
    let engine = Engine::with_defaults()?;
    let base = SimulationRequest::new(from, nh4);

    println!(
        "Sweeping {} SRT values from {:.1} to {:.1} d (NH4 = {:.1} mg/L)",
        srts.len(),
        from,
        to,
        nh4
    );
    let points = srt_sweep(&engine, &base, &srts, &discharge_limit(limit));

    println!("\n  {:>7}  {:>9}  {:>9}  {:>9}  status", "SRT", "NH4", "NO3", "TN");
    for point in &points {
        match &point.report {
            Ok(r) => println!(
                "  {:>7.2}  {:>9.3}  {:>9.3}  {:>9.3}  {}",
                point.srt_days,
                r.final_ammonium,
                r.final_nitrate,
                r.final_total_nitrogen,
                if r.compliant {
                    "ok"
                } else if r.washout {
                    "washout"
                } else {
                    "exceeds"
                }
            ),
            Err(e) => println!("  {:>7.2}  failed: {}", point.srt_days, e),
        }
    }

    match minimum_compliant_srt(&points) {
        Some(srt) => println!("\n✓ Minimum compliant SRT: {:.2} d", srt),
        None => println!("\n✗ No compliant SRT tail in the swept range"),
    }
    Ok(())
}

fn cmd_validate(plant_path: &Path) -> AppResult<()> {
    println!("Validating plant: {}", plant_path.display());
    let plant = project_service::load_plant(plant_path)?;
    project_service::validate_plant(&plant)?;
    println!("✓ Plant is valid");
    Ok(())
}

fn cmd_scenarios(plant_path: &Path) -> AppResult<()> {
    let plant = project_service::load_plant(plant_path)?;
    let scenarios = project_service::list_scenarios(&plant);

    if scenarios.is_empty() {
        println!("No scenarios found in plant");
    } else {
        println!("Scenarios in plant:");
        for s in scenarios {
            println!(
                "  {} - {} (SRT {:.1} d, NH4 {:.1} mg/L)",
                s.id, s.name, s.srt_days, s.influent_ammonium
            );
        }
    }
    Ok(())
}

fn cmd_run(plant_path: &Path, scenario_id: &str, use_cache: bool) -> AppResult<()> {
    println!("Running scenario: {}", scenario_id);

    let request = RunRequest {
        plant_path,
        scenario_id,
        options: RunOptions {
            use_cache,
            ..RunOptions::default()
        },
    };

    let mut last_emit = Instant::now();
    let mut last_stage: Option<RunStage> = None;
    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event| {
            let emit_now =
                last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Simulation completed: {}", response.run_id);
    }

    print_timing_summary(&response.timing);

    let report = assess(&response.records, &DischargeLimit::default())?;
    print_report(&report);
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    if let Some(p) = &event.simulation {
        let width = 28usize;
        let filled = ((p.fraction_complete * width as f64).round() as usize).min(width);
        let bar = format!(
            "{}{}",
            "#".repeat(filled),
            "-".repeat(width.saturating_sub(filled))
        );
        print!(
            "\r[{}] {:>6.2}%  phase={}  day={:.2}/{:.2}  step={}  elapsed={:.1}s",
            bar,
            p.fraction_complete * 100.0,
            event.stage.label(),
            p.sim_day,
            p.end_day,
            p.step,
            event.elapsed_wall_s
        );
    } else {
        let spinner = ['|', '/', '-', '\\'];
        let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
        let mut line = format!(
            "\r{} {}  elapsed={:.2}s",
            spinner[spin_idx],
            event.stage.label(),
            event.elapsed_wall_s
        );
        if let Some(msg) = &event.message {
            line.push_str(&format!("  {}", msg));
        }
        print!("{}", line);
    }
    let _ = io::stdout().flush();
}

fn print_timing_summary(timing: &bp_app::RunTimingSummary) {
    let total = timing.total_time_s.max(1.0e-12);
    let simulate_pct = 100.0 * timing.simulate_time_s / total;
    let save_pct = 100.0 * timing.save_time_s / total;

    println!("\nTiming summary:");
    println!("  Load plant: {:.3}s", timing.load_plant_time_s);
    println!(
        "  Simulate:   {:.3}s ({:.1}%)",
        timing.simulate_time_s, simulate_pct
    );
    println!("  Save:       {:.3}s ({:.1}%)", timing.save_time_s, save_pct);
    if timing.load_cache_time_s > 0.0 {
        println!("  Cache load: {:.3}s", timing.load_cache_time_s);
    }
    println!("  Total:      {:.3}s", timing.total_time_s);
    println!("  Records:    {}", timing.record_count);
}

fn cmd_runs(plant_path: &Path, scenario_id: Option<&str>) -> AppResult<()> {
    let runs = run_service::list_runs(plant_path, scenario_id)?;

    if runs.is_empty() {
        println!("No stored runs found");
    } else {
        println!("Stored runs:");
        for manifest in runs {
            println!(
                "  {}  {}  SRT {:.1} d  ({})",
                manifest.run_id,
                manifest.scenario_id,
                manifest.parameters.srt_days,
                manifest.timestamp
            );
        }
    }
    Ok(())
}

fn cmd_show_run(plant_path: &Path, run_id: &str) -> AppResult<()> {
    println!("Loading run: {}", run_id);

    let (manifest, records) = run_service::load_run(plant_path, run_id)?;
    let summary = get_run_summary(&records)?;

    println!("\nRun Summary:");
    println!("  Plant: {}", manifest.plant_name);
    println!("  Scenario: {}", manifest.scenario_id);
    println!(
        "  SRT: {:.1} d, influent NH4: {:.1} mg/L",
        manifest.parameters.srt_days, manifest.parameters.influent_ammonium
    );
    println!("  Records: {}", summary.record_count);
    println!(
        "  Day range: {:.2} - {:.2}",
        summary.day_range.0, summary.day_range.1
    );
    println!(
        "  Temperature: {:.2} - {:.2} °C",
        summary.temperature_range_c.0, summary.temperature_range_c.1
    );
    println!("  Final TN: {:.3} mg/L", summary.final_total_nitrogen);

    Ok(())
}

fn cmd_export(
    plant_path: &Path,
    run_id: &str,
    variable: Option<&str>,
    output: Option<&Path>,
) -> AppResult<()> {
    let (_manifest, records) = run_service::load_run(plant_path, run_id)?;

    let csv = match variable {
        Some(name) => {
            let variable: SeriesVariable = name.parse()?;
            let mut csv = format!("day,{}\n", variable.column());
            for (day, val) in extract_series(&records, variable) {
                csv.push_str(&format!("{},{}\n", day, val));
            }
            csv
        }
        None => to_csv(&records),
    };

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!("✓ Exported {} records to {}", records.len(), path.display());
    } else {
        print!("{}", csv);
    }

    Ok(())
}
