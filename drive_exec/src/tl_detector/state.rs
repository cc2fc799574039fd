//! TlDetector module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::Arc;

use comms_if::{
    eqpt::cam::CamImage,
    msg::{LightColor, TrafficWaypoint},
};
use log::{debug, info, trace};
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use super::{DebounceState, LightClassifier, Params, TlDetectorError};
use crate::{loc::Pose, route::Route};
use util::{
    archive::{Archived, Archiver},
    module::State,
    params,
    session::{get_elapsed_seconds, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Traffic light detector module state
pub struct TlDetector {
    pub(crate) params: Params,

    classifier: Box<dyn LightClassifier>,

    debounce: DebounceState,

    /// Stop line positions on the ground plane
    stop_lines: Vec<Vector2<f64>>,

    report: StatusReport,
    arch_report: Archiver,
}

/// Input data to traffic light detection.
#[derive(Default, Clone)]
pub struct InputData {
    /// The current route, or `None` if no route has been received.
    pub route: Option<Arc<Route>>,

    /// The current pose of the vehicle, or `None` if it is not known.
    pub pose: Option<Pose>,

    /// The latest image from the front camera, or `None` if no image has been
    /// received.
    pub image: Option<Arc<CamImage>>,

    /// The simulator's light states, one per stop line, only used in ground
    /// truth mode.
    pub light_states: Vec<LightColor>,
}

/// Output of traffic light detection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputData {
    /// Waypoint index at which the vehicle must stop, or `None` if there is no
    /// red light to stop for.
    pub stop_index: Option<usize>,
}

/// Status report for traffic light detection.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusReport {
    /// Elapsed session time
    pub time_s: f64,

    /// Waypoint nearest to the vehicle
    pub vehicle_wp: Option<usize>,

    /// Index of the nearest stop line ahead in the parameters
    pub light: Option<usize>,

    /// Waypoint nearest to the stop line of that light
    pub light_wp: Option<usize>,

    /// Color observed this cycle
    pub raw_color: LightColor,

    /// Color currently acted upon
    pub stabilised_color: LightColor,

    /// True if the stabilised color changed this cycle
    pub color_changed: bool,

    /// Stop index output this cycle
    pub stop_index: Option<usize>,
}

/// The nearest light ahead of the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightAhead {
    /// Index of the light in the stop line list
    pub light: usize,

    /// Waypoint nearest to the light's stop line
    pub stop_wp: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for StatusReport {
    fn default() -> Self {
        Self {
            time_s: 0.0,
            vehicle_wp: None,
            light: None,
            light_wp: None,
            raw_color: LightColor::Unknown,
            stabilised_color: LightColor::Unknown,
            color_changed: false,
            stop_index: None,
        }
    }
}

impl OutputData {
    pub fn to_msg(&self) -> TrafficWaypoint {
        TrafficWaypoint::from(self.stop_index)
    }
}

impl State for TlDetector {
    const NAME: &'static str = "TlDetector";

    type InitData = &'static str;
    type InitError = TlDetectorError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = TlDetectorError;

    /// Initialise the TlDetector module.
    ///
    /// Expected init data is the path to the parameter file.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        let params: Params = params::load(init_data).map_err(TlDetectorError::ParamLoadError)?;
        self.set_params(params);

        self.arch_report = Archiver::from_path(session, "tl_detector/status_report.csv")
            .map_err(|e| TlDetectorError::ArchiveInitError(e.to_string()))?;

        info!(
            "TlDetector initialised with {} stop lines{}",
            self.stop_lines.len(),
            if self.params.ground_truth {
                ", using ground truth light states"
            } else {
                ""
            }
        );

        Ok(())
    }

    /// Process one camera cycle.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.report = StatusReport {
            time_s: get_elapsed_seconds(),
            ..Default::default()
        };

        if self.params.ground_truth && input_data.light_states.len() != self.stop_lines.len() {
            return Err(TlDetectorError::LightStatesMismatch {
                expected: self.stop_lines.len(),
                found: input_data.light_states.len(),
            });
        }

        // Find the light ahead and its color
        let ahead = match (&input_data.route, &input_data.pose) {
            (Some(route), Some(pose)) => {
                let vehicle_wp = route.nearest(&pose.position_2d());
                self.report.vehicle_wp = Some(vehicle_wp);
                self.light_ahead(route, vehicle_wp)
            }
            _ => None,
        };

        let raw_color = match ahead {
            Some(a) => self.light_color(a, input_data),
            None => LightColor::Unknown,
        };

        let out = self
            .debounce
            .update(raw_color, ahead.map(|a| a.stop_wp));

        if out.changed {
            info!(
                "Light color now {}, stop index {:?}",
                self.debounce.stabilised(),
                out.stop_index
            );
        }

        self.report.light = ahead.map(|a| a.light);
        self.report.light_wp = ahead.map(|a| a.stop_wp);
        self.report.raw_color = raw_color;
        self.report.stabilised_color = self.debounce.stabilised();
        self.report.color_changed = out.changed;
        self.report.stop_index = out.stop_index;

        debug!(
            "TlDetector: light {:?} at wp {:?}, raw {}, stop {:?}",
            self.report.light, self.report.light_wp, raw_color, out.stop_index
        );

        Ok((
            OutputData {
                stop_index: out.stop_index,
            },
            self.report,
        ))
    }
}

impl Archived for TlDetector {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;

        Ok(())
    }
}

impl TlDetector {
    /// Create a new detector using the given classifier. The module must be
    /// initialised before use.
    pub fn new(classifier: Box<dyn LightClassifier>) -> Self {
        Self::with_params(Params::default(), classifier)
    }

    /// Create a detector with the given parameters, without a session.
    pub fn with_params(params: Params, classifier: Box<dyn LightClassifier>) -> Self {
        let mut tl = Self {
            params: Params::default(),
            classifier,
            debounce: DebounceState::default(),
            stop_lines: Vec::new(),
            report: StatusReport::default(),
            arch_report: Archiver::default(),
        };
        tl.set_params(params);

        tl
    }

    pub fn debounce(&self) -> &DebounceState {
        &self.debounce
    }

    pub fn num_stop_lines(&self) -> usize {
        self.stop_lines.len()
    }

    /// Switch between the classifier and the simulator's light states.
    pub fn set_ground_truth(&mut self, ground_truth: bool) {
        self.params.ground_truth = ground_truth;
    }

    fn set_params(&mut self, params: Params) {
        self.stop_lines = params
            .stop_line_positions_m
            .iter()
            .map(|p| Vector2::new(p[0], p[1]))
            .collect();
        self.debounce = DebounceState::new(params.state_count_threshold);
        self.params = params;
    }

    /// Find the nearest stop line at or ahead of `vehicle_wp`.
    ///
    /// Both are compared by route waypoint index, so a stop line behind the
    /// vehicle is never chosen even if it is close. The first listed stop line
    /// wins a tie.
    pub fn light_ahead(&self, route: &Route, vehicle_wp: usize) -> Option<LightAhead> {
        let mut best: Option<LightAhead> = None;
        let mut best_diff = route.len();

        for (light, line) in self.stop_lines.iter().enumerate() {
            let stop_wp = route.nearest(line);

            if stop_wp < vehicle_wp {
                continue;
            }

            let diff = stop_wp - vehicle_wp;
            if diff < best_diff {
                best_diff = diff;
                best = Some(LightAhead { light, stop_wp });
            }
        }

        best
    }

    fn light_color(&mut self, ahead: LightAhead, input_data: &InputData) -> LightColor {
        if self.params.ground_truth {
            return input_data
                .light_states
                .get(ahead.light)
                .copied()
                .unwrap_or(LightColor::Unknown);
        }

        match input_data.image {
            Some(ref image) => self.classifier.classify(image),
            None => {
                trace!("No camera image yet");
                LightColor::Unknown
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::route::Waypoint;
    use chrono::Utc;
    use comms_if::eqpt::cam::CamId;
    use nalgebra::Vector3;

    /// Classifier reporting a fixed sequence of colors, then unknown.
    struct SeqClassifier(Vec<LightColor>);

    impl LightClassifier for SeqClassifier {
        fn classify(&mut self, _image: &CamImage) -> LightColor {
            if self.0.is_empty() {
                LightColor::Unknown
            } else {
                self.0.remove(0)
            }
        }
    }

    fn line_route(num: usize) -> Arc<Route> {
        Arc::new(
            Route::new(
                (0..num)
                    .map(|i| Waypoint::new(Vector3::new(i as f64, 0.0, 0.0), 0.0, 10.0))
                    .collect(),
            )
            .unwrap(),
        )
    }

    fn params(stop_lines: Vec<[f64; 2]>) -> Params {
        Params {
            stop_line_positions_m: stop_lines,
            ..Default::default()
        }
    }

    fn input(x: f64, colors_image: bool) -> InputData {
        InputData {
            route: Some(line_route(100)),
            pose: Some(Pose::new(Vector3::new(x, 0.0, 0.0), 0.0)),
            image: if colors_image {
                Some(Arc::new(CamImage::blank(CamId::Front, 4, 4, Utc::now())))
            } else {
                None
            },
            light_states: Vec::new(),
        }
    }

    #[test]
    fn test_light_ahead() {
        let tl = TlDetector::with_params(
            params(vec![[80.0, 3.0], [30.0, 3.0], [60.2, -2.0], [60.0, 2.0]]),
            Box::new(SeqClassifier(vec![])),
        );
        let route = line_route(100);

        // Light behind at 30 is ignored, first listed of the two at 60 wins
        assert_eq!(
            tl.light_ahead(&route, 50),
            Some(LightAhead {
                light: 2,
                stop_wp: 60
            })
        );

        // At the stop line itself
        assert_eq!(tl.light_ahead(&route, 80).map(|a| a.light), Some(0));

        // Past every light, no wrap around
        assert_eq!(tl.light_ahead(&route, 90), None);
    }

    #[test]
    fn test_red_light_stop() {
        let mut tl = TlDetector::with_params(
            params(vec![[60.0, 2.0]]),
            Box::new(SeqClassifier(vec![LightColor::Red; 10])),
        );
        let input = input(50.0, true);

        let mut outputs = Vec::new();
        for _ in 0..5 {
            let (o, _) = tl.proc(&input).unwrap();
            outputs.push(o.stop_index);
        }

        assert_eq!(outputs, vec![None, None, None, Some(60), Some(60)]);
        assert_eq!(tl.debounce().stabilised(), LightColor::Red);
    }

    #[test]
    fn test_no_pose_or_image() {
        let mut tl = TlDetector::with_params(
            params(vec![[60.0, 2.0]]),
            Box::new(SeqClassifier(vec![LightColor::Red; 10])),
        );

        let mut no_pose = input(50.0, true);
        no_pose.pose = None;
        let (o, r) = tl.proc(&no_pose).unwrap();
        assert_eq!(o.stop_index, None);
        assert_eq!(r.raw_color, LightColor::Unknown);
        assert_eq!(r.light, None);

        let (o, r) = tl.proc(&input(50.0, false)).unwrap();
        assert_eq!(o.stop_index, None);
        assert_eq!(r.raw_color, LightColor::Unknown);
        assert_eq!(r.light_wp, Some(60));
        assert_eq!(o.to_msg(), TrafficWaypoint(-1));
    }

    #[test]
    fn test_ground_truth() {
        let mut p = params(vec![[20.0, 2.0], [60.0, 2.0]]);
        p.ground_truth = true;
        let mut tl = TlDetector::with_params(p, Box::new(SeqClassifier(vec![])));

        let mut input = input(50.0, false);
        input.light_states = vec![LightColor::Green, LightColor::Red];

        let mut last = None;
        for _ in 0..4 {
            last = tl.proc(&input).unwrap().0.stop_index;
        }
        assert_eq!(last, Some(60));

        input.light_states = vec![LightColor::Red];
        assert!(matches!(
            tl.proc(&input),
            Err(TlDetectorError::LightStatesMismatch {
                expected: 2,
                found: 1
            })
        ));
    }
}
