//! Batch runner for the sediment valuation pipeline.
//!
//! Modes:
//!   (default)              full batch: read, aggregate, value, write tables
//!   --verify               schema verification of the input tables only
//!   --write-sample-inputs  materialize synthetic input tables, then exit

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;

use sedecon_pipeline::analysis::convert::convert_events;
use sedecon_pipeline::analysis::regional::aggregate_regional;
use sedecon_pipeline::analysis::state_yields::{
    state_annual_yields, state_average_yields, station_year_yields,
};
use sedecon_pipeline::analysis::station_year::{aggregate_station_years, filter_to_region};
use sedecon_pipeline::config::AnalysisConfig;
use sedecon_pipeline::dev_mode;
use sedecon_pipeline::economics::{annual_valuation, site_economics};
use sedecon_pipeline::ingest::{read_event_table, read_site_table};
use sedecon_pipeline::logging::{self, LogLevel, Stage};
use sedecon_pipeline::model::PipelineError;
use sedecon_pipeline::output::{self, RunSummary};
use sedecon_pipeline::reuse::{annual_reuse_potential, state_dose_sweep};
use sedecon_pipeline::stations::StationCatalog;
use sedecon_pipeline::verify;

struct CliArgs {
    config_path: Option<PathBuf>,
    input_dir: PathBuf,
    output_dir: PathBuf,
    verify: bool,
    quiet: bool,
    write_sample_inputs: bool,
}

fn parse_args() -> Result<CliArgs, String> {
    let mut args = CliArgs {
        config_path: None,
        input_dir: PathBuf::from("."),
        output_dir: PathBuf::from("output"),
        verify: false,
        quiet: false,
        write_sample_inputs: false,
    };
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter.next().ok_or("--config requires a file path")?;
                args.config_path = Some(PathBuf::from(value));
            }
            "--input-dir" => {
                let value = iter.next().ok_or("--input-dir requires a directory")?;
                args.input_dir = PathBuf::from(value);
            }
            "--output-dir" => {
                let value = iter.next().ok_or("--output-dir requires a directory")?;
                args.output_dir = PathBuf::from(value);
            }
            "--verify" => args.verify = true,
            "--quiet" => args.quiet = true,
            "--write-sample-inputs" => args.write_sample_inputs = true,
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unrecognized argument: {}", other)),
        }
    }
    Ok(args)
}

fn print_usage() {
    println!("Usage: sedecon_pipeline [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <file>          TOML configuration overlay");
    println!("  --input-dir <dir>        directory holding the input tables (default: .)");
    println!("  --output-dir <dir>       directory for the output tables (default: output)");
    println!("  --verify                 verify input table schemas and exit");
    println!("  --write-sample-inputs    write synthetic input tables and exit");
    println!("  --quiet                  log warnings and errors only");
    println!("  -h, --help               show this help");
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("Error: {}", message);
            println!();
            print_usage();
            return ExitCode::from(2);
        }
    };

    let config = match &args.config_path {
        Some(path) => match AnalysisConfig::load_from_file(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Error: {}", err);
                return ExitCode::FAILURE;
            }
        },
        None => AnalysisConfig::default(),
    };

    let site_path = args.input_dir.join(&config.site_table_file);
    let event_path = args.input_dir.join(&config.event_table_file);

    if args.write_sample_inputs {
        if let Err(err) = fs::create_dir_all(&args.input_dir)
            .map_err(PipelineError::from)
            .and_then(|_| dev_mode::write_sample_inputs(&site_path, &event_path))
        {
            eprintln!("Error: {}", err);
            return ExitCode::FAILURE;
        }
        println!("Sample inputs written:");
        println!("  {}", site_path.display());
        println!("  {}", event_path.display());
        return ExitCode::SUCCESS;
    }

    if args.verify {
        let report = verify::run_verification(&site_path, &event_path);
        verify::print_summary(&report);
        return if report.failed() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    let min_level = if args.quiet {
        LogLevel::Warning
    } else {
        LogLevel::Info
    };
    logging::init_logger(min_level, None, false);

    match run_batch(&config, &site_path, &event_path, &args.output_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            logging::error(Stage::System, None, &err.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run_batch(
    config: &AnalysisConfig,
    site_path: &Path,
    event_path: &Path,
    output_dir: &Path,
) -> Result<(), PipelineError> {
    let started_utc = Utc::now().to_rfc3339();
    fs::create_dir_all(output_dir)?;
    logging::info(Stage::System, None, "Starting sediment valuation batch");

    // Sites
    let site_rows = read_site_table(site_path)?;
    let catalog = StationCatalog::from_site_rows(&site_rows, config.area_factor)?;
    let with_area = catalog.iter().filter(|s| s.area_ha.is_some()).count();
    logging::info(
        Stage::Sites,
        None,
        &format!(
            "{} stations cataloged, {} with catchment area",
            catalog.len(),
            with_area
        ),
    );
    for (state, count) in catalog.state_counts() {
        logging::debug(Stage::Sites, None, &format!("{}: {} stations", state, count));
    }

    // Events
    let events = read_event_table(event_path)?;
    let conversion = convert_events(&events, config);
    logging::log_stage_summary(
        Stage::Events,
        events.len(),
        conversion.loads.len(),
        conversion.dropped_no_year,
    );

    // Region filter and aggregation
    let region = filter_to_region(&conversion.loads, &catalog, config);
    logging::log_stage_summary(
        Stage::Analysis,
        conversion.loads.len(),
        region.kept.len(),
        region.dropped_unknown_station + region.dropped_out_of_region,
    );
    if region.dropped_unknown_station > 0 {
        logging::warn(
            Stage::Analysis,
            None,
            &format!(
                "{} events at stations missing from the site table",
                region.dropped_unknown_station
            ),
        );
    }

    let station_years = aggregate_station_years(&region.kept, &catalog);
    let annuals = aggregate_regional(&station_years, config);
    let reuse = annual_reuse_potential(&annuals, config);
    let sweep = state_dose_sweep(&station_years, config);
    logging::info(
        Stage::Analysis,
        None,
        &format!(
            "{} station-years aggregated into {} region years",
            station_years.len(),
            annuals.len()
        ),
    );

    // Economics: the per-site ranking pools every station with a computable
    // year, not just the configured region.
    let valuations = annual_valuation(&annuals, &reuse, config);
    let ranked_sites = site_economics(&conversion.loads, config);
    logging::info(
        Stage::Economics,
        None,
        &format!(
            "{} years valued, {} sites ranked",
            valuations.len(),
            ranked_sites.len()
        ),
    );

    // Yield-basis state reports over the region's sites
    let yield_rows = station_year_yields(&region.kept, &catalog, config);
    let annual_yields = state_annual_yields(&yield_rows);
    let average_yields = state_average_yields(&yield_rows);

    // Outputs
    let mut outputs: Vec<String> = Vec::new();
    let mut record = |name: &str| outputs.push(name.to_string());

    output::write_station_year_loads(
        &output_dir.join(output::STATION_YEAR_LOADS_CSV),
        &station_years,
    )?;
    record(output::STATION_YEAR_LOADS_CSV);
    output::write_annual_region_yields(
        &output_dir.join(output::ANNUAL_REGION_YIELDS_CSV),
        &annuals,
    )?;
    record(output::ANNUAL_REGION_YIELDS_CSV);
    output::write_annual_region_reuse(
        &output_dir.join(output::ANNUAL_REGION_REUSE_CSV),
        &reuse,
    )?;
    record(output::ANNUAL_REGION_REUSE_CSV);
    output::write_state_dose_sweep(&output_dir.join(output::STATE_DOSE_SWEEP_CSV), &sweep)?;
    record(output::STATE_DOSE_SWEEP_CSV);
    output::write_annual_region_econ(
        &output_dir.join(output::ANNUAL_REGION_ECON_CSV),
        &valuations,
    )?;
    record(output::ANNUAL_REGION_ECON_CSV);
    output::write_state_annual_yields(
        &output_dir.join(output::STATE_ANNUAL_YIELDS_CSV),
        &annual_yields,
    )?;
    record(output::STATE_ANNUAL_YIELDS_CSV);
    output::write_state_average_yields(
        &output_dir.join(output::STATE_AVERAGE_YIELDS_CSV),
        &average_yields,
    )?;
    record(output::STATE_AVERAGE_YIELDS_CSV);
    output::write_site_economics(
        &output_dir.join(output::SITE_ECONOMICS_CSV),
        &ranked_sites,
    )?;
    record(output::SITE_ECONOMICS_CSV);

    let summary = RunSummary {
        started_utc,
        site_table_path: site_path.display().to_string(),
        event_table_path: event_path.display().to_string(),
        sites_read: site_rows.len(),
        events_read: events.len(),
        events_converted: conversion.loads.len(),
        events_dropped_no_year: conversion.dropped_no_year,
        events_in_region: region.kept.len(),
        events_dropped_unknown_station: region.dropped_unknown_station,
        events_dropped_out_of_region: region.dropped_out_of_region,
        station_year_count: station_years.len(),
        region_year_count: annuals.len(),
        ranked_site_count: ranked_sites.len(),
        outputs,
        config: config.clone(),
    };
    output::write_run_summary(&output_dir.join(output::RUN_SUMMARY_JSON), &summary)?;

    logging::info(
        Stage::Output,
        None,
        &format!(
            "{} tables and {} written to {}",
            summary.outputs.len(),
            output::RUN_SUMMARY_JSON,
            output_dir.display()
        ),
    );
    Ok(())
}
