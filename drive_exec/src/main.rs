//! Main drive executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Input acquisition:
//!             - Vehicle pose and speed
//!             - Camera image and light states (at the camera rate)
//!         - Traffic light detection (at the camera rate)
//!         - Waypoint updater processing (at the waypoint rate)
//!         - Path following
//!         - Yaw control processing
//!         - Vehicle stand-in update
//!
//! # Modules
//!
//! All modules (e.g. `yaw_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!     2. Implement `util::archive::Archived` to record their status reports.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use comms_if::msg::{LaneMsg, TwistCmd};
use log::{debug, info, warn};
use serde::Serialize;
use structopt::StructOpt;

// Internal
use drive_lib::{
    data_store::DataStore,
    params::DriveExecParams,
    route::{circular_route, load_csv, RouteMgr, Waypoint},
    sim::{self, KinematicVehicle, LightSchedule, PatchDetector},
    tl_detector::{ClassifierParams, DetectionClassifier, TlDetector},
    wp_updater::WpUpdater,
    yaw_ctrl::YawCtrl,
};
use util::{
    archive::Archived,
    logger::logger_init,
    module::State,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of consecutive overruns after which a warning is given for every
/// overrun rather than only the first.
const MAX_QUIET_OVERRUNS: u64 = 5;

// ---------------------------------------------------------------------------
// STRUCTURES
// ---------------------------------------------------------------------------

/// Drive stack planning and control executable.
#[derive(Debug, StructOpt)]
#[structopt(name = "drive_exec")]
struct Opt {
    /// Route CSV file with one `x,y,z,yaw` waypoint per line. If not given a
    /// circular route is generated.
    #[structopt(long, parse(from_os_str))]
    route: Option<PathBuf>,

    /// How long to run for.
    ///
    /// Units: seconds
    #[structopt(long = "duration-s", default_value = "60")]
    duration_s: f64,

    /// Use the simulated light states rather than the light classifier.
    #[structopt(long = "ground-truth")]
    ground_truth: bool,
}

/// Summary of the run, saved into the session at exit.
#[derive(Debug, Serialize)]
struct RunSummary {
    num_cycles: u128,
    num_cycle_overruns: u64,
    final_position_m: [f64; 3],
    final_heading_rad: f64,
    final_speed_ms: f64,
    final_stop_wp: i32,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("drive_exec", "sessions").wrap_err("Failed to create the session")?;

    let exec_params: DriveExecParams =
        util::params::load("drive_exec.toml").wrap_err("Could not load exec params")?;

    // Initialise logger
    logger_init(&exec_params.logger, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Drive Stack Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", opt);

    if !(exec_params.cycle_frequency_hz > 0.0) {
        return Err(eyre!(
            "Cycle frequency must be positive, found {}",
            exec_params.cycle_frequency_hz
        ));
    }
    let cycle_period_s = 1.0 / exec_params.cycle_frequency_hz;

    // ---- LOAD ROUTE ----

    let waypoints = match opt.route {
        Some(ref path) => {
            info!("Loading route from {:?}", path);
            load_csv(path, exec_params.route_speed_ms)
                .wrap_err_with(|| format!("Failed to load the route from {:?}", path))?
        }
        None => {
            info!(
                "No route given, generating a circular route of radius {} m",
                exec_params.generated_route_radius_m
            );
            circular_route(
                exec_params.generated_route_radius_m,
                exec_params.generated_route_num_wps,
                exec_params.route_speed_ms,
            )
        }
    };

    let route_msg = LaneMsg {
        timestamp: Utc::now(),
        waypoints: waypoints.iter().map(Waypoint::to_msg).collect(),
    };

    let mut route_mgr = RouteMgr::new();
    route_mgr
        .deliver_msg(&route_msg)
        .wrap_err("Failed to build the route")?;
    let route = route_mgr
        .route()
        .ok_or_else(|| eyre!("No route after delivery"))?;

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();
    ds.route = Some(route.clone());

    // ---- INITIALISE MODULES ----

    let epoch = *session::get_epoch();
    let schedule = LightSchedule::from_params(&exec_params.sim);

    let classifier_params: ClassifierParams =
        util::params::load("tl_classifier.toml").wrap_err("Could not load classifier params")?;
    let classifier = DetectionClassifier::from_params(
        PatchDetector::new(exec_params.sim.misdetect_period),
        &classifier_params,
    );

    let mut tl_detector = TlDetector::new(Box::new(classifier));
    tl_detector
        .init("tl_detector.toml", &session)
        .wrap_err_with(|| format!("Failed to initialise {}", TlDetector::NAME))?;
    if opt.ground_truth {
        tl_detector.set_ground_truth(true);
        info!("Using ground truth light states");
    }
    info!("{} init complete", TlDetector::NAME);

    let mut wp_updater = WpUpdater::default();
    wp_updater
        .init("wp_updater.toml", &session)
        .wrap_err_with(|| format!("Failed to initialise {}", WpUpdater::NAME))?;
    info!("{} init complete", WpUpdater::NAME);

    let mut yaw_ctrl = YawCtrl::default();
    yaw_ctrl
        .init("yaw_ctrl.toml", &session)
        .wrap_err_with(|| format!("Failed to initialise {}", YawCtrl::NAME))?;
    info!("{} init complete", YawCtrl::NAME);

    let start = route.waypoint(0);
    let mut vehicle = KinematicVehicle::new(exec_params.sim.clone(), start.position_m, start.yaw_rad);

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop, running for {} s\n", opt.duration_s);

    let run_duration = Duration::from_secs_f64(opt.duration_s.max(0.0));
    let run_start = Instant::now();

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        if cycle_start_instant - run_start >= run_duration {
            info!("Run duration reached, stopping");
            break;
        }

        ds.cycle_start(
            exec_params.cycle_frequency_hz,
            exec_params.tl_frequency_hz,
            exec_params.wp_frequency_hz,
        );

        // ---- DATA INPUT ----

        ds.set_pose_msg(&vehicle.pose_msg(Utc::now()));
        ds.current_speed_ms = vehicle.speed_ms();

        if ds.is_tl_cycle {
            let now = Utc::now();
            let light_time_s = util::time::duration_to_seconds(now - epoch).unwrap_or(0.0);

            let color = schedule.color_at(light_time_s);

            ds.front_image = Some(Arc::new(sim::capture(now, color)));
            ds.light_states = vec![color; tl_detector.num_stop_lines()];
        }

        // ---- TRAFFIC LIGHT DETECTION ----

        if ds.is_tl_cycle {
            match tl_detector.proc(&ds.tl_detector_input()) {
                Ok((o, r)) => {
                    ds.tl_detector_output = o;
                    ds.tl_detector_status_rpt = r;
                    ds.traffic_wp = o.to_msg();
                }
                Err(e) => warn!("Error during {} processing: {}", TlDetector::NAME, e),
            }
        }

        // ---- WAYPOINT UPDATER ----

        if ds.is_wp_cycle {
            match wp_updater.proc(&ds.wp_updater_input()) {
                Ok((w, r)) => {
                    ds.final_waypoints = w.map(|w| w.to_msg(Utc::now()));
                    ds.wp_updater_status_rpt = r;
                }
                Err(e) => warn!("Error during {} processing: {}", WpUpdater::NAME, e),
            }
        }

        // ---- PATH FOLLOWING ----

        ds.twist_cmd = match ds.final_waypoints {
            Some(ref lane) => vehicle.pursue(lane),
            None => TwistCmd::default(),
        };

        // ---- YAW CONTROL ----

        match yaw_ctrl.proc(&ds.yaw_ctrl_input()) {
            Ok((o, r)) => {
                ds.yaw_ctrl_output = o;
                ds.yaw_ctrl_status_rpt = r;
            }
            Err(e) => warn!("Error during {} processing: {}", YawCtrl::NAME, e),
        }

        // ---- VEHICLE ----

        vehicle.step(
            ds.twist_cmd.linear_ms,
            ds.yaw_ctrl_output.angle_rad,
            cycle_period_s,
        );

        // ---- WRITE ARCHIVES ----

        if ds.is_tl_cycle {
            if let Err(e) = tl_detector.write() {
                warn!("Could not write {} archives: {}", TlDetector::NAME, e);
            }
        }
        if ds.is_wp_cycle {
            if let Err(e) = wp_updater.write() {
                warn!("Could not write {} archives: {}", WpUpdater::NAME, e);
            }
        }
        if let Err(e) = yaw_ctrl.write() {
            warn!("Could not write {} archives: {}", YawCtrl::NAME, e);
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(cycle_period_s).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                ds.num_consec_cycle_overruns += 1;
                ds.num_cycle_overruns += 1;

                if ds.num_consec_cycle_overruns == 1
                    || ds.num_consec_cycle_overruns > MAX_QUIET_OVERRUNS
                {
                    warn!(
                        "Cycle overran by {:.06} s",
                        cycle_dur.as_secs_f64() - cycle_period_s
                    );
                }
            }
        }

        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    let final_pose = vehicle.pose();
    session.save(
        "run_summary.json",
        RunSummary {
            num_cycles: ds.num_cycles,
            num_cycle_overruns: ds.num_cycle_overruns,
            final_position_m: [
                final_pose.position_m[0],
                final_pose.position_m[1],
                final_pose.position_m[2],
            ],
            final_heading_rad: final_pose.heading(),
            final_speed_ms: vehicle.speed_ms(),
            final_stop_wp: ds.traffic_wp.0,
        },
    );

    info!(
        "Ran {} cycles, {} overruns",
        ds.num_cycles, ds.num_cycle_overruns
    );
    info!("End of execution");

    session.exit();

    Ok(())
}
