/*
This code is part of the HydroKit geospatial utilities.
Authors: HydroKit contributors
Created: 15/10/2026
Last Modified: 16/10/2026
License: MIT
*/

use super::toolkit::{HydroToolkit, ToolkitError};
use hydrokit_common::utils::get_formatted_elapsed_time;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Distance, in map units, pour points may be moved to reach a stream cell.
pub const SNAP_DISTANCE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    FillDepressions,
    FlowDirection,
    FlowAccumulation,
    ExtractStreams,
    StreamsToVector,
    SnapPourPoints,
    Watershed,
    WatershedToVector,
    Basins,
    BasinsToVector,
    LongestFlowpath,
}

impl StageKind {
    pub fn description(&self) -> &'static str {
        match self {
            StageKind::FillDepressions => "Filling depressions",
            StageKind::FlowDirection => "Calculating D8 flow directions",
            StageKind::FlowAccumulation => "Calculating flow accumulation",
            StageKind::ExtractStreams => "Extracting streams",
            StageKind::StreamsToVector => "Converting streams to vector",
            StageKind::SnapPourPoints => "Snapping pour points to streams",
            StageKind::Watershed => "Delineating the watershed",
            StageKind::WatershedToVector => "Converting the watershed to polygons",
            StageKind::Basins => "Delineating drainage basins",
            StageKind::BasinsToVector => "Converting basins to polygons",
            StageKind::LongestFlowpath => "Tracing the longest flowpath",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One external tool invocation. `inputs` are the files that must exist
/// before the tool runs and `output` the file it must leave behind.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStage {
    pub kind: StageKind,
    pub tool_name: &'static str,
    pub args: Vec<String>,
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage}: the required input {} does not exist.", .path.display())]
    MissingInput { stage: StageKind, path: PathBuf },

    #[error("{stage} stopped the pipeline: {source}")]
    Stage {
        stage: StageKind,
        #[source]
        source: ToolkitError,
    },

    #[error("{stage}: the expected output {} was not created.", .path.display())]
    MissingOutput { stage: StageKind, path: PathBuf },
}

impl From<PipelineError> for io::Error {
    fn from(err: PipelineError) -> io::Error {
        io::Error::new(io::ErrorKind::Other, err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletedStage {
    pub kind: StageKind,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub stages: Vec<CompletedStage>,
    pub elapsed_time: String,
}

impl PipelineReport {
    pub fn output_of(&self, kind: StageKind) -> Option<&Path> {
        self.stages
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.output.as_path())
    }
}

/// The terrain-analysis chain that turns a DEM into streams, basins,
/// an optional pour-point watershed and the longest flowpath.
#[derive(Debug, Clone, PartialEq)]
pub struct WatershedPipeline {
    dem: PathBuf,
    output_dir: PathBuf,
    threshold: u64,
    pour_points: Option<PathBuf>,
}

fn arg(flag: &str, path: &Path) -> String {
    format!("--{}={}", flag, path.display())
}

impl WatershedPipeline {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(
        dem: P,
        output_dir: Q,
        threshold: u64,
        pour_points: Option<PathBuf>,
    ) -> WatershedPipeline {
        WatershedPipeline {
            dem: dem.into(),
            output_dir: output_dir.into(),
            threshold,
            pour_points,
        }
    }

    pub fn dem(&self) -> &Path {
        &self.dem
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn pour_points(&self) -> Option<&Path> {
        self.pour_points.as_deref()
    }

    /// The stages in the order they run. Every output lands in the output directory
    /// under a fixed name.
    pub fn stages(&self) -> Vec<PipelineStage> {
        let out = |name: &str| self.output_dir.join(name);
        let filled = out("filled_dtm.tif");
        let d8 = out("d8pointer_dtm.tif");
        let accum = out("d8accum_dtm.tif");
        let streams = out(&format!("extract_streams_{}.tif", self.threshold));
        let streams_vec = out("streams_vector.shp");
        let basins = out("basins.tif");

        let mut stages = vec![
            PipelineStage {
                kind: StageKind::FillDepressions,
                tool_name: "FillDepressionsWangAndLiu",
                args: vec![arg("dem", &self.dem), arg("output", &filled), "--fix_flats".to_string()],
                inputs: vec![self.dem.clone()],
                output: filled.clone(),
            },
            PipelineStage {
                kind: StageKind::FlowDirection,
                tool_name: "D8Pointer",
                args: vec![arg("dem", &filled), arg("output", &d8)],
                inputs: vec![filled.clone()],
                output: d8.clone(),
            },
            PipelineStage {
                kind: StageKind::FlowAccumulation,
                tool_name: "D8FlowAccumulation",
                args: vec![arg("input", &filled), arg("output", &accum), "--out_type=cells".to_string()],
                inputs: vec![filled.clone()],
                output: accum.clone(),
            },
            PipelineStage {
                kind: StageKind::ExtractStreams,
                tool_name: "ExtractStreams",
                args: vec![
                    arg("flow_accum", &accum),
                    arg("output", &streams),
                    format!("--threshold={}", self.threshold),
                ],
                inputs: vec![accum],
                output: streams.clone(),
            },
            PipelineStage {
                kind: StageKind::StreamsToVector,
                tool_name: "RasterStreamsToVector",
                args: vec![arg("streams", &streams), arg("d8_pntr", &d8), arg("output", &streams_vec)],
                inputs: vec![streams.clone(), d8.clone()],
                output: streams_vec,
            },
        ];

        // the longest flowpath is traced within the watershed when there is one
        let flowpath_basins = match &self.pour_points {
            Some(pour_pts) => {
                let snapped = out("outlet_final.shp");
                let watershed = out("watershed.tif");
                let watershed_poly = out("watershed_poly.shp");
                stages.push(PipelineStage {
                    kind: StageKind::SnapPourPoints,
                    tool_name: "JensonSnapPourPoints",
                    args: vec![
                        arg("pour_pts", pour_pts),
                        arg("streams", &streams),
                        arg("output", &snapped),
                        format!("--snap_dist={}", SNAP_DISTANCE),
                    ],
                    inputs: vec![pour_pts.clone(), streams.clone()],
                    output: snapped.clone(),
                });
                stages.push(PipelineStage {
                    kind: StageKind::Watershed,
                    tool_name: "Watershed",
                    args: vec![arg("d8_pntr", &d8), arg("pour_pts", &snapped), arg("output", &watershed)],
                    inputs: vec![d8.clone(), snapped],
                    output: watershed.clone(),
                });
                stages.push(PipelineStage {
                    kind: StageKind::WatershedToVector,
                    tool_name: "RasterToVectorPolygons",
                    args: vec![arg("input", &watershed), arg("output", &watershed_poly)],
                    inputs: vec![watershed.clone()],
                    output: watershed_poly,
                });
                watershed
            }
            None => basins.clone(),
        };

        let basins_poly = out("basins_poly.shp");
        stages.push(PipelineStage {
            kind: StageKind::Basins,
            tool_name: "Basins",
            args: vec![arg("d8_pntr", &d8), arg("output", &basins)],
            inputs: vec![d8.clone()],
            output: basins.clone(),
        });
        stages.push(PipelineStage {
            kind: StageKind::BasinsToVector,
            tool_name: "RasterToVectorPolygons",
            args: vec![arg("input", &basins), arg("output", &basins_poly)],
            inputs: vec![basins],
            output: basins_poly,
        });
        let flowpath = out("longest_flowpath.shp");
        stages.push(PipelineStage {
            kind: StageKind::LongestFlowpath,
            tool_name: "LongestFlowpath",
            args: vec![arg("dem", &filled), arg("basins", &flowpath_basins), arg("output", &flowpath)],
            inputs: vec![filled, flowpath_basins],
            output: flowpath,
        });
        stages
    }

    /// Runs the stages one after another. The first failure stops the run;
    /// files written by earlier stages are left in place.
    pub fn run<T: HydroToolkit + ?Sized>(
        &self,
        toolkit: &T,
        verbose: bool,
    ) -> Result<PipelineReport, PipelineError> {
        let start = Instant::now();
        let stages = self.stages();
        let num_stages = stages.len();
        let mut completed = Vec::with_capacity(num_stages);
        let mut progress: usize;
        let mut old_progress: usize = 1;

        for (i, stage) in stages.into_iter().enumerate() {
            if let Some(missing) = stage.inputs.iter().find(|p| !p.exists()) {
                return Err(PipelineError::MissingInput {
                    stage: stage.kind,
                    path: missing.clone(),
                });
            }

            log::info!("Stage {}/{}: {} ({})", i + 1, num_stages, stage.kind, stage.tool_name);
            if verbose {
                println!("{}...", stage.kind.description());
            }
            toolkit
                .run_tool(stage.tool_name, &stage.args)
                .map_err(|source| PipelineError::Stage {
                    stage: stage.kind,
                    source,
                })?;

            if !stage.output.exists() {
                return Err(PipelineError::MissingOutput {
                    stage: stage.kind,
                    path: stage.output,
                });
            }
            completed.push(CompletedStage {
                kind: stage.kind,
                output: stage.output,
            });

            if verbose {
                progress = (100.0_f64 * (i + 1) as f64 / num_stages as f64) as usize;
                if progress != old_progress {
                    println!("Progress: {}%", progress);
                    old_progress = progress;
                }
            }
        }

        Ok(PipelineReport {
            stages: completed,
            elapsed_time: get_formatted_elapsed_time(start),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;

    /// Records each call and, unless told otherwise, creates the file named
    /// by the `--output` argument.
    struct RecordingToolkit {
        calls: RefCell<Vec<(String, Vec<String>)>>,
        fail_on: Option<&'static str>,
        write_outputs: bool,
    }

    impl RecordingToolkit {
        fn new() -> RecordingToolkit {
            RecordingToolkit {
                calls: RefCell::new(vec![]),
                fail_on: None,
                write_outputs: true,
            }
        }

        fn tools(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(t, _)| t.clone()).collect()
        }
    }

    impl HydroToolkit for RecordingToolkit {
        fn run_tool(&self, tool_name: &str, args: &[String]) -> Result<(), ToolkitError> {
            self.calls
                .borrow_mut()
                .push((tool_name.to_string(), args.to_vec()));
            if self.fail_on == Some(tool_name) {
                return Err(ToolkitError::Failed {
                    tool: tool_name.to_string(),
                    code: Some(101),
                    message: "simulated failure".to_string(),
                });
            }
            if self.write_outputs {
                for a in args {
                    if let Some(out) = a.strip_prefix("--output=") {
                        fs::write(out, b"").unwrap();
                    }
                }
            }
            Ok(())
        }
    }

    fn setup(pour_points: bool) -> (tempfile::TempDir, WatershedPipeline) {
        let dir = tempfile::tempdir().unwrap();
        let dem = dir.path().join("dem.tif");
        fs::write(&dem, b"").unwrap();
        let pts = if pour_points {
            let p = dir.path().join("outlet.shp");
            fs::write(&p, b"").unwrap();
            Some(p)
        } else {
            None
        };
        let out_dir = dir.path().join("out");
        fs::create_dir(&out_dir).unwrap();
        let pipeline = WatershedPipeline::new(dem, out_dir, 500, pts);
        (dir, pipeline)
    }

    fn kinds(stages: &[PipelineStage]) -> Vec<StageKind> {
        stages.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn plan_without_pour_points() {
        let (_dir, p) = setup(false);
        let stages = p.stages();
        assert_eq!(
            kinds(&stages),
            vec![
                StageKind::FillDepressions,
                StageKind::FlowDirection,
                StageKind::FlowAccumulation,
                StageKind::ExtractStreams,
                StageKind::StreamsToVector,
                StageKind::Basins,
                StageKind::BasinsToVector,
                StageKind::LongestFlowpath,
            ]
        );
        let out = p.output_dir();
        assert_eq!(stages[0].args[2], "--fix_flats");
        assert_eq!(stages[2].args[2], "--out_type=cells");
        assert_eq!(stages[3].output, out.join("extract_streams_500.tif"));
        assert_eq!(stages[3].args[2], "--threshold=500");
        let flowpath = &stages[7];
        assert_eq!(flowpath.args[1], arg("basins", &out.join("basins.tif")));
        assert_eq!(flowpath.output, out.join("longest_flowpath.shp"));
        assert!(stages.iter().all(|s| !s.args.iter().any(|a| a.contains("esri_pntr"))));
    }

    #[test]
    fn plan_with_pour_points() {
        let (_dir, p) = setup(true);
        let stages = p.stages();
        assert_eq!(stages.len(), 11);
        assert_eq!(
            kinds(&stages[5..8]),
            vec![
                StageKind::SnapPourPoints,
                StageKind::Watershed,
                StageKind::WatershedToVector,
            ]
        );
        let out = p.output_dir();
        let snap = &stages[5];
        assert_eq!(snap.tool_name, "JensonSnapPourPoints");
        assert_eq!(snap.args[3], "--snap_dist=50");
        assert_eq!(snap.output, out.join("outlet_final.shp"));
        assert!(stages[6].inputs.contains(&out.join("outlet_final.shp")));
        assert_eq!(stages[10].args[1], arg("basins", &out.join("watershed.tif")));
    }

    #[test]
    fn each_stage_reads_an_earlier_output() {
        let (_dir, p) = setup(true);
        let stages = p.stages();
        for (i, stage) in stages.iter().enumerate().skip(1) {
            for input in &stage.inputs {
                let external = input == p.dem() || Some(input.as_path()) == p.pour_points();
                let produced_earlier = stages[..i].iter().any(|s| &s.output == input);
                assert!(external || produced_earlier, "{} reads {}", stage.kind, input.display());
            }
        }
    }

    #[test]
    fn runs_every_stage_in_order() {
        let (_dir, p) = setup(true);
        let tk = RecordingToolkit::new();
        let report = p.run(&tk, false).unwrap();
        let expected: Vec<String> = p.stages().iter().map(|s| s.tool_name.to_string()).collect();
        assert_eq!(tk.tools(), expected);
        assert_eq!(report.stages.len(), 11);
        assert!(report.stages.iter().all(|s| s.output.exists()));
        assert_eq!(
            report.output_of(StageKind::Watershed),
            Some(p.output_dir().join("watershed.tif").as_path())
        );
    }

    #[test]
    fn a_failing_stage_stops_the_pipeline() {
        let (_dir, p) = setup(false);
        let mut tk = RecordingToolkit::new();
        tk.fail_on = Some("ExtractStreams");
        match p.run(&tk, false) {
            Err(PipelineError::Stage { stage, source }) => {
                assert_eq!(stage, StageKind::ExtractStreams);
                assert!(source.to_string().contains("simulated failure"));
            }
            other => panic!("unexpected {:?}", other.map(|r| r.stages.len())),
        }
        assert_eq!(tk.tools().last().map(|s| s.as_str()), Some("ExtractStreams"));
        assert_eq!(tk.tools().len(), 4);
        // earlier outputs are left behind
        assert!(p.output_dir().join("d8accum_dtm.tif").exists());
        assert!(!p.output_dir().join("streams_vector.shp").exists());
    }

    #[test]
    fn a_stage_that_writes_nothing_is_an_error() {
        let (_dir, p) = setup(false);
        let mut tk = RecordingToolkit::new();
        tk.write_outputs = false;
        match p.run(&tk, false) {
            Err(PipelineError::MissingOutput { stage, path }) => {
                assert_eq!(stage, StageKind::FillDepressions);
                assert_eq!(path, p.output_dir().join("filled_dtm.tif"));
            }
            other => panic!("unexpected {:?}", other.map(|r| r.stages.len())),
        }
        assert_eq!(tk.tools().len(), 1);
    }

    #[test]
    fn a_missing_dem_is_caught_before_any_tool_runs() {
        let (_dir, p) = setup(false);
        fs::remove_file(p.dem()).unwrap();
        let tk = RecordingToolkit::new();
        assert!(matches!(
            p.run(&tk, false),
            Err(PipelineError::MissingInput { stage: StageKind::FillDepressions, .. })
        ));
        assert!(tk.tools().is_empty());
    }
}
