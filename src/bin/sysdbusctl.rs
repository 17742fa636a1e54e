//! sysdbusctl - query and control systemd over D-Bus
//!
//! A small systemctl-like front end for the sysdbus library. Bus selection and
//! watch limits come from `SYSDBUS_*` environment variables and can be
//! overridden with flags.

use std::process::ExitCode;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use nix::sys::signal::Signal;
use sysdbus::{BusAddress, BusOptions, Manager, SystemBus, Unit, UnitFileChange};

#[derive(Parser)]
#[command(name = "sysdbusctl")]
#[command(about = "Query and control systemd over D-Bus", version)]
struct Args {
    /// Bus to use: "system", "session" or a D-Bus address
    #[arg(long, global = true)]
    address: Option<String>,

    /// Maximum number of units watched at once
    #[arg(long, global = true)]
    max_watches: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List loaded units
    ListUnits {
        /// Open only the first N units, one at a time
        #[arg(long)]
        limit: Option<usize>,
        /// Open and watch every unit (may hit the bus match limit)
        #[arg(long, conflicts_with = "limit")]
        watch: bool,
    },

    /// List queued jobs
    ListJobs,

    /// Show unit status
    Status {
        /// Unit name (e.g., "sshd.service")
        name: String,
    },

    /// Start a unit
    Start {
        name: String,
        /// Job mode: fail, replace, isolate, ...
        #[arg(long, default_value = "replace")]
        mode: String,
    },

    /// Stop a unit
    Stop {
        name: String,
        #[arg(long, default_value = "replace")]
        mode: String,
    },

    /// Restart a unit
    Restart {
        name: String,
        #[arg(long, default_value = "replace")]
        mode: String,
    },

    /// Restart a unit if it is running
    TryRestart {
        name: String,
        #[arg(long, default_value = "replace")]
        mode: String,
    },

    /// Reload a unit's configuration
    Reload {
        name: String,
        #[arg(long, default_value = "replace")]
        mode: String,
    },

    /// Send a signal to a unit's processes
    Kill {
        name: String,
        /// main, control or all
        #[arg(long, default_value = "all")]
        whom: String,
        /// Signal name or number
        #[arg(long, short = 's', default_value = "SIGTERM")]
        signal: String,
    },

    /// Reset the failed state of one unit, or all units
    ResetFailed { name: Option<String> },

    /// Enable unit files
    Enable {
        #[arg(required = true)]
        files: Vec<String>,
        #[arg(long)]
        runtime: bool,
        #[arg(long)]
        force: bool,
    },

    /// Disable unit files
    Disable {
        #[arg(required = true)]
        files: Vec<String>,
        #[arg(long)]
        runtime: bool,
    },

    /// Disable and re-enable unit files
    Reenable {
        #[arg(required = true)]
        files: Vec<String>,
        #[arg(long)]
        runtime: bool,
        #[arg(long)]
        force: bool,
    },

    /// Mask unit files
    Mask {
        #[arg(required = true)]
        files: Vec<String>,
        #[arg(long)]
        runtime: bool,
        #[arg(long)]
        force: bool,
    },

    /// Unmask unit files
    Unmask {
        #[arg(required = true)]
        files: Vec<String>,
        #[arg(long)]
        runtime: bool,
    },

    /// Check whether a unit file is enabled
    IsEnabled { file: String },

    /// List installed unit files
    ListUnitFiles,

    /// Show the default target
    GetDefault,

    /// Set the default target
    SetDefault {
        target: String,
        #[arg(long)]
        force: bool,
    },

    /// Cancel a job by id
    CancelJob { id: u32 },

    /// Reload all unit files
    DaemonReload,

    /// Follow a unit's state until interrupted
    Watch { name: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut opts = BusOptions::from_env().with_watch_by_default(false);
    if let Some(addr) = &args.address {
        opts.address = BusAddress::parse(addr);
    }
    if let Some(max) = args.max_watches {
        opts = opts.with_max_watches(max);
    }

    let bus = SystemBus::connect(&opts).await?;
    let manager = Manager::connect(&bus).await?;

    let result = run(&manager, args.command).await;
    let disconnected = manager.disconnect().await;

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("sysdbusctl: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    disconnected?;
    Ok(code)
}

async fn run(manager: &Manager, command: Command) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Command::ListUnits { limit: None, watch: true } => {
            let units = manager.list_units(true).await?;
            for unit in &units {
                print_unit_line(unit);
            }
            println!();
            println!("{} units opened, {} watches active", units.len(), manager.bus().active_watches());
        }
        Command::ListUnits { limit: None, watch: false } => {
            let entries = manager.list_unit_entries().await?;
            println!("{:<40} {:<10} {:<10} {:<10} DESCRIPTION", "UNIT", "LOAD", "ACTIVE", "SUB");
            for e in &entries {
                println!(
                    "{:<40} {:<10} {:<10} {:<10} {}",
                    e.name, e.load_state, e.active_state, e.sub_state, e.description
                );
            }
            println!();
            println!("{} units listed", entries.len());
        }
        Command::ListUnits { limit: Some(limit), .. } => {
            let mut units = manager.iter_units(false).await?;
            let mut shown = 0;
            while shown < limit {
                let Some(unit) = units.next().await else {
                    break;
                };
                print_unit_line(&unit?);
                shown += 1;
            }
            println!();
            println!("{} units shown, {} not opened", shown, units.remaining());
        }
        Command::ListJobs => {
            let jobs = manager.list_job_entries().await?;
            if jobs.is_empty() {
                println!("No jobs running.");
                return Ok(ExitCode::SUCCESS);
            }
            println!("{:>6} {:<40} {:<12} STATE", "JOB", "UNIT", "TYPE");
            for job in jobs {
                println!("{:>6} {:<40} {:<12} {}", job.id, job.unit, job.job_type, job.state);
            }
        }
        Command::Status { name } => {
            let unit = manager.get_unit(&name).await?;
            print_status(&unit).await;
        }
        Command::Start { name, mode } => report_job(manager.start_unit(&name, &mode).await?),
        Command::Stop { name, mode } => report_job(manager.stop_unit(&name, &mode).await?),
        Command::Restart { name, mode } => report_job(manager.restart_unit(&name, &mode).await?),
        Command::TryRestart { name, mode } => report_job(manager.try_restart_unit(&name, &mode).await?),
        Command::Reload { name, mode } => report_job(manager.reload_unit(&name, &mode).await?),
        Command::Kill { name, whom, signal } => {
            let signal = parse_signal(&signal)?;
            manager.kill_unit(&name, &whom, signal).await?;
        }
        Command::ResetFailed { name: Some(name) } => manager.reset_failed_unit(&name).await?,
        Command::ResetFailed { name: None } => manager.reset_failed().await?,
        Command::Enable { files, runtime, force } => {
            let (install_info, changes) = manager.enable_unit_files(&as_strs(&files), runtime, force).await?;
            print_changes(&changes);
            if !install_info {
                println!("The unit files have no installation config (WantedBy=, RequiredBy=, Alias=).");
            }
        }
        Command::Disable { files, runtime } => {
            print_changes(&manager.disable_unit_files(&as_strs(&files), runtime).await?);
        }
        Command::Reenable { files, runtime, force } => {
            let (_, changes) = manager.reenable_unit_files(&as_strs(&files), runtime, force).await?;
            print_changes(&changes);
        }
        Command::Mask { files, runtime, force } => {
            print_changes(&manager.mask_unit_files(&as_strs(&files), runtime, force).await?);
        }
        Command::Unmask { files, runtime } => {
            print_changes(&manager.unmask_unit_files(&as_strs(&files), runtime).await?);
        }
        Command::IsEnabled { file } => {
            let state = manager.get_unit_file_state(&file).await?;
            println!("{}", state);
            // Non-zero exit like systemctl
            if !is_enabled_state(&state) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::ListUnitFiles => {
            let files = manager.list_unit_files().await?;
            println!("{:<60} STATE", "UNIT FILE");
            for f in &files {
                println!("{:<60} {}", f.path, f.state);
            }
            println!();
            println!("{} unit files listed", files.len());
        }
        Command::GetDefault => println!("{}", manager.get_default_target().await?),
        Command::SetDefault { target, force } => {
            print_changes(&manager.set_default_target(&target, force).await?);
        }
        Command::CancelJob { id } => {
            let job = manager.get_job(id).await?;
            job.cancel().await?;
            job.close()?;
        }
        Command::DaemonReload => manager.reload().await?,
        Command::Watch { name } => watch(manager, &name).await?,
    }

    Ok(ExitCode::SUCCESS)
}

fn is_enabled_state(state: &str) -> bool {
    matches!(state, "enabled" | "enabled-runtime" | "static" | "alias")
}

async fn watch(manager: &Manager, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let unit = manager.get_unit(name).await?;
    unit.subscribe().await?;
    log::info!("Watching {} (Ctrl-C to stop)", unit);

    let mut updates = unit.updates();
    print_unit_line(&unit);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                print_unit_line(&unit);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    unit.close()?;
    Ok(())
}

fn print_unit_line(unit: &Unit) {
    let since = unit
        .active_enter_timestamp()
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:<40} {:<10} {:<10} {}",
        unit.to_string(),
        unit.active_state().unwrap_or_default(),
        unit.sub_state().unwrap_or_default(),
        since
    );
}

async fn print_status(unit: &Unit) {
    let symbol = match unit.active_state().as_deref() {
        Some("active") => "●",
        Some("failed") => "×",
        Some("inactive") => "○",
        _ => "◐",
    };

    println!("{} {} - {}", symbol, unit, unit.description().unwrap_or_default());
    println!(
        "     Loaded: {} ({})",
        unit.load_state().unwrap_or_default(),
        unit.fragment_path().unwrap_or_else(|| "-".into())
    );

    let since = unit
        .active_enter_timestamp()
        .map(|ts| format!(" since {}", ts.format("%Y-%m-%d %H:%M:%S UTC")))
        .unwrap_or_default();
    println!(
        "     Active: {} ({}){}",
        unit.active_state().unwrap_or_default(),
        unit.sub_state().unwrap_or_default(),
        since
    );

    if unit.to_string().ends_with(".service") {
        match unit.open_as::<sysdbus::kind::Service>(false).await {
            Ok(service) => {
                if let Some(pid) = service.main_pid() {
                    println!("   Main PID: {}", pid);
                }
                if let Some(result) = service.result() {
                    println!("     Result: {}", result);
                }
            }
            Err(e) => log::debug!("No service interface on {}: {}", unit, e),
        }
    }
}

fn report_job(job: Option<sysdbus::Job>) {
    match job {
        Some(job) => println!(
            "Queued job {} ({})",
            job.id().unwrap_or_default(),
            job.job_type().unwrap_or_default()
        ),
        None => println!("Done (no job queued)"),
    }
}

fn print_changes(changes: &[UnitFileChange]) {
    for change in changes {
        match change.change_type.as_str() {
            "symlink" => println!("Created symlink {} → {}.", change.file, change.destination),
            "unlink" => println!("Removed {}.", change.file),
            other => println!("{} {} {}", other, change.file, change.destination),
        }
    }
}

fn parse_signal(s: &str) -> Result<i32, String> {
    if let Ok(n) = s.parse::<i32>() {
        return Ok(n);
    }
    let name = if s.starts_with("SIG") {
        s.to_uppercase()
    } else {
        format!("SIG{}", s.to_uppercase())
    };
    Signal::from_str(&name)
        .map(|sig| sig as i32)
        .map_err(|_| format!("Unknown signal: {}", s))
}

fn as_strs(v: &[String]) -> Vec<&str> {
    v.iter().map(String::as_str).collect()
}
