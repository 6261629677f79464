use std::path::PathBuf;
use std::process::ExitCode;
use clap::Parser;
use live_detect::common::{InferenceDevice, ModelConfig, ModelVersion};
use live_detect::data::{LoopConfig, DEFAULT_WINDOW_NAME};
use live_detect::display::open_display;
use live_detect::video::SourceId;

/// Real-time YOLO object detection on a camera feed.
#[derive(Debug, Parser)]
#[command(name = "live_detect", version, about)]
struct Args {
    /// ONNX model file
    #[arg(short, long)]
    model: PathBuf,

    /// Initial confidence threshold
    #[arg(long, default_value_t = 0.25)]
    conf: f32,

    /// IoU threshold for non-maximum suppression
    #[arg(long, default_value_t = 0.7)]
    iou: f32,

    /// Let boxes of one class suppress overlapping boxes of other classes
    #[arg(long)]
    agnostic_nms: bool,

    /// Camera index (`0`, `/dev/video2`), video file, URL, image or image folder
    #[arg(short, long, default_value = "0")]
    source: String,

    /// Requested capture width
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Requested capture height
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Keyboard controls: q quit, s save, +/- threshold
    #[arg(short, long)]
    interactive: bool,

    /// cpu, cuda[:id] or tensorrt[:id]
    #[arg(long, default_value = "cpu", value_parser = parse_device)]
    device: InferenceDevice,

    /// Build TensorRT engines in FP16
    #[arg(long)]
    trt_fp16: bool,

    /// YOLO generation the model was exported from (yolov5 .. yolov12)
    #[arg(long, default_value = "yolov11", value_parser = parse_version)]
    model_version: ModelVersion,

    /// Class labels (.txt one per line, or .json array). Defaults to the model metadata
    #[arg(long)]
    labels: Option<PathBuf>,

    /// ONNX Runtime shared library to load
    #[arg(long, env = "ORT_DYLIB_PATH")]
    ort_lib: Option<PathBuf>,

    /// Model input size
    #[arg(long, default_value_t = 640)]
    imgsz: u32,

    /// TrueType font for labels and overlay text
    #[arg(long)]
    font: Option<PathBuf>,

    /// Run without a window (until the source ends)
    #[arg(long)]
    headless: bool,

    /// Read frames on a separate thread
    #[arg(long)]
    threaded_capture: bool,

    /// Number of frames averaged into the FPS overlay
    #[arg(long, default_value_t = 1)]
    fps_window: usize,

    /// Window title
    #[arg(long, default_value = DEFAULT_WINDOW_NAME)]
    window: String,

    /// Directory saved frames are written to
    #[arg(long, default_value = ".")]
    save_dir: PathBuf,

    /// Log per-stage inference timings
    #[arg(long)]
    profile: bool,
}

fn parse_device(s: &str) -> Result<InferenceDevice, String> {
    InferenceDevice::parse(s).ok_or_else(|| {
        format!("unknown device `{s}`, expected one of {:?}", InferenceDevice::all_inference_devices())
    })
}

fn parse_version(s: &str) -> Result<ModelVersion, String> {
    ModelVersion::from_name(s).ok_or_else(|| format!("unknown model version `{s}`"))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let model = ModelConfig {
        weights_path: args.model,
        ort_lib_path: args.ort_lib,
        labels_path: args.labels,
        inference_device: args.device,
        model_version: args.model_version,
        conf_threshold: args.conf,
        iou_threshold: args.iou,
        agnostic_nms: args.agnostic_nms,
        trt_fp16: args.trt_fp16,
        width: args.imgsz,
        height: args.imgsz,
        profile: args.profile,
    };
    log::debug!("{model}");

    let config = LoopConfig {
        window_name: args.window,
        source: SourceId::parse(&args.source),
        target_width: args.width,
        target_height: args.height,
        interactive: args.interactive,
        fps_window: args.fps_window,
        threaded_capture: args.threaded_capture,
        save_dir: args.save_dir,
        font_path: args.font,
        ..Default::default()
    };

    let display = open_display(args.headless);
    let result = live_detect::init_loop(&model, config, display).and_then(|mut detection| detection.run());

    match result {
        Ok(summary) => {
            log::info!("Final confidence threshold: {:.2}", summary.final_threshold);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let code = err.exit_code() as u8;
            log::error!("{:#}", anyhow::Error::from(err));
            ExitCode::from(code)
        }
    }
}
