use log::info;
use serde::Serialize;
use snake_tracker::config::load_config;
use snake_tracker::contour::Contour;
use snake_tracker::image::io::{load_frame_stack, write_json_file};
use snake_tracker::types::ObjectId;
use snake_tracker::{FrameSequencer, Identity, ObjectSet};
use std::env;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContourExport {
    objects: Vec<ObjectExport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ObjectExport {
    id: ObjectId,
    start_frame: usize,
    alive: bool,
    frames: Vec<FrameContour>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FrameContour {
    frame: usize,
    area: f64,
    finalized: Vec<[f64; 2]>,
    backup: Option<Vec<[f64; 2]>>,
}

fn points(contour: &Contour) -> Vec<[f64; 2]> {
    contour.positions().iter().map(|p| [p.x, p.y]).collect()
}

fn export(set: &ObjectSet) -> ContourExport {
    let objects = set
        .tracks()
        .iter()
        .map(|track| ObjectExport {
            id: track.id(),
            start_frame: track.start_frame(),
            alive: track.is_alive(),
            frames: track
                .finalized_frames()
                .map(|(frame, contour)| FrameContour {
                    frame,
                    area: contour.area(),
                    finalized: points(contour),
                    backup: track.backup(frame).map(points),
                })
                .collect(),
        })
        .collect();
    ContourExport { objects }
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let (start, end) = config.frame_range()?;
    let frames = load_frame_stack(&config.frames, config.first_frame)?;
    let mut set = config.build_object_set()?;
    info!(
        "segmenting {} object(s) over frames {start}..={end}",
        set.len()
    );

    let mut sequencer = FrameSequencer::new(config.params);
    let outcome = sequencer.run(&mut set, &frames, start, end, &Identity);

    // Completed frames are written even when the run aborts.
    write_json_file(&config.output.contours_json, &export(&set))?;
    println!(
        "Saved contours of {} object(s) to {}",
        set.len(),
        config.output.contours_json.display()
    );

    let report = outcome.map_err(|e| format!("Segmentation stopped: {e}"))?;
    if let Some(path) = &config.output.report_json {
        write_json_file(path, &report)?;
        println!("Saved run report to {}", path.display());
    }
    println!(
        "Processed {} frame(s) in {:.1} ms",
        report.frames.len(),
        report.total_ms
    );
    Ok(())
}

fn usage() -> String {
    "Usage: snake_tracker <config.json>".to_string()
}
