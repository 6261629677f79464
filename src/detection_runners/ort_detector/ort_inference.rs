//! YOLO runner on top of [`OrtEngine`].

use anyhow::Result;
use ndarray::{s, ArrayView, Axis, IxDyn};
use rayon::prelude::*;

use crate::common::{BBox, BoxType, Detection, Frame, ModelVersion, YoloPreds};
use crate::data::{ConfigOrt, X};
use crate::detection_runners::image_ops::{self, letterbox_ratio};
use crate::detection_runners::inference_process::InferenceProcess;
use crate::detection_runners::nms::nms;
use crate::detection_runners::ort_detector::OrtEngine;
use crate::detectors::Detector;
use crate::utils;

/// Turns raw YOLO output into frame-space detections.
#[derive(Debug, Clone)]
pub struct YoloDecoder {
    pub layout: YoloPreds,
    pub names: Vec<String>,
    pub model_width: u32,
    pub model_height: u32,
    pub iou: f32,
    pub agnostic_nms: bool,
}

impl YoloDecoder {
    /// Number of classes carried by an output of `shape` (`[N, F, A]` or `[N, A, F]`).
    pub fn num_classes(&self, shape: &[usize]) -> usize {
        let features = match (shape.len(), self.layout.is_anchors_first()) {
            (3, true) => shape[2],
            (3, false) => shape[1],
            (2, true) => shape[1],
            (2, false) => shape[0],
            _ => 0,
        };
        self.layout.num_classes(features)
    }

    /// Decodes one image's predictions for a `frame_w x frame_h` frame.
    pub fn decode(
        &self,
        preds: ArrayView<f32, IxDyn>,
        nc: usize,
        frame_w: u32,
        frame_h: u32,
        conf_threshold: f32,
    ) -> Vec<Detection> {
        let slices = self.layout.parse_preds(preds, nc);
        let ratio = letterbox_ratio(frame_w, frame_h, self.model_width, self.model_height);
        let (fw, fh) = (frame_w as f32, frame_h as f32);

        let mut detections: Vec<Detection> = slices.bboxes
            .axis_iter(Axis(0))
            .into_par_iter()
            .enumerate()
            .filter_map(|(i, bbox)| {
                // confidence & class_id
                let (class_id, confidence) = match &slices.ids {
                    Some(ids) => (ids[[i, 0]].max(0.) as usize, slices.clss[[i, 0]]),
                    None => {
                        let (class_id, &confidence) = slices.clss
                            .slice(s![i, ..])
                            .into_iter()
                            .enumerate()
                            .max_by(|a, b| a.1.total_cmp(b.1))?;

                        match &slices.confs {
                            None => (class_id, confidence),
                            Some(confs) => (class_id, confidence * confs[[i, 0]]),
                        }
                    }
                };

                if confidence < conf_threshold {
                    return None;
                }

                let bbox = bbox.mapv(|x| x / ratio);
                let bbox = match self.layout.bbox {
                    BoxType::Cxcywh => BBox::default().with_cxcy_wh(bbox[0], bbox[1], bbox[2], bbox[3]),
                    BoxType::Xyxy => BBox::new(bbox[0], bbox[1], bbox[2], bbox[3]),
                }
                .clip(fw, fh);

                if bbox.width() <= 0. || bbox.height() <= 0. {
                    return None;
                }

                let mut det = Detection::default()
                    .with_confidence(confidence)
                    .with_class_id(class_id);
                det.bbox = bbox;
                if let Some(name) = self.names.get(class_id) {
                    det = det.with_label(name);
                }
                Some(det)
            })
            .collect();

        if self.layout.apply_nms {
            nms(&mut detections, self.iou, self.agnostic_nms);
        } else {
            detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        }
        detections
    }
}

#[derive(Debug)]
pub struct OrtYOLO {
    engine: OrtEngine,
    decoder: YoloDecoder,
    version: ModelVersion,
    profile: bool,
}

impl InferenceProcess for OrtYOLO {
    fn new(options: ConfigOrt) -> Result<Self> {
        let engine = OrtEngine::new(&options)?;
        let version = options.yolo_version;
        let layout = version.layout();

        // Class names: user-defined, else model metadata
        let names = match options.names {
            Some(names) => names,
            None => match engine.try_fetch("names") {
                Some(raw) => utils::parse_names_metadata(&raw),
                None => {
                    log::warn!("No labels file and no `names` metadata in the model, using class ids");
                    vec![]
                }
            },
        };

        log::info!("YOLO Version: {} | Classes: {}", version.name(), names.len());

        Ok(Self {
            decoder: YoloDecoder {
                layout,
                names,
                model_width: engine.model_width(),
                model_height: engine.model_height(),
                iou: options.iou,
                agnostic_nms: options.agnostic_nms,
            },
            engine,
            version,
            profile: options.profile,
        })
    }

    fn preprocess(&self, frame: &Frame) -> Result<X> {
        image_ops::preprocess(frame, self.decoder.model_height, self.decoder.model_width)
    }

    fn inference(&mut self, x: X) -> Result<X> {
        self.engine.engine_run(x)
    }

    fn postprocess(&self, x: X, frame: &Frame, conf_threshold: f32) -> Result<Vec<Detection>> {
        let nc = self.decoder.num_classes(x.shape());
        let Some(preds) = x.axis_iter(Axis(0)).next() else {
            anyhow::bail!("Model returned an empty batch");
        };
        if preds.ndim() != 2 {
            anyhow::bail!("Unexpected model output shape {:?}", x.shape());
        }
        Ok(self.decoder.decode(preds, nc, frame.width(), frame.height(), conf_threshold))
    }
}

impl Detector for OrtYOLO {
    fn infer(&mut self, frame: &Frame, conf_threshold: f32) -> Result<Vec<Detection>> {
        let profile = self.profile;
        self.forward(frame, conf_threshold, profile)
    }
}

impl OrtYOLO {
    pub fn version(&self) -> ModelVersion {
        self.version
    }

    pub fn names(&self) -> &[String] {
        &self.decoder.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    fn decoder(version: ModelVersion) -> YoloDecoder {
        YoloDecoder {
            layout: version.layout(),
            names: vec!["person".into(), "car".into()],
            model_width: 640,
            model_height: 640,
            iou: 0.7,
            agnostic_nms: false,
        }
    }

    #[test]
    fn v8_output_is_scaled_back_to_frame() {
        // [1, 4 + 2, 3]: features on axis 1, anchors on axis 2
        let mut out = Array3::<f32>::zeros((1, 6, 3));
        // anchor 0: car at (100, 50) 40x20 in model space, score 0.9
        for (f, v) in [100., 50., 40., 20., 0.1, 0.9].iter().enumerate() {
            out[[0, f, 0]] = *v;
        }
        // anchor 1: below threshold
        for (f, v) in [300., 300., 10., 10., 0.2, 0.1].iter().enumerate() {
            out[[0, f, 1]] = *v;
        }
        // anchor 2: person, clear of anchor 0
        for (f, v) in [400., 200., 50., 50., 0.6, 0.0].iter().enumerate() {
            out[[0, f, 2]] = *v;
        }
        let out = out.into_dyn();
        let dec = decoder(ModelVersion::YoloV8);
        let nc = dec.num_classes(out.shape());
        assert_eq!(nc, 2);

        // 1280x720 frame -> ratio 0.5
        let preds = out.index_axis(Axis(0), 0);
        let dets = dec.decode(preds, nc, 1280, 720, 0.25);
        assert_eq!(dets.len(), 2);

        assert_eq!(dets[0].get_label(), "car");
        assert_eq!(dets[0].bbox, BBox::new(160., 80., 240., 120.));
        assert_eq!(dets[1].get_label(), "person");
        assert!((dets[1].confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn duplicates_are_suppressed() {
        let mut out = Array3::<f32>::zeros((1, 6, 2));
        for a in 0..2 {
            for (f, v) in [100., 100., 50., 50., 0.8 - a as f32 * 0.1, 0.].iter().enumerate() {
                out[[0, f, a]] = *v;
            }
        }
        let out = out.into_dyn();
        let dec = decoder(ModelVersion::YoloV11);
        let dets = dec.decode(out.index_axis(Axis(0), 0), 2, 640, 640, 0.25);
        assert_eq!(dets.len(), 1);
        assert!((dets[0].confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn overlapping_boxes_of_different_classes_both_survive() {
        // person at cx=100 and car at cx=101, both 50x50: IoU 0.96
        let mut out = Array3::<f32>::zeros((1, 6, 2));
        for (f, v) in [100., 100., 50., 50., 0.9, 0.].iter().enumerate() {
            out[[0, f, 0]] = *v;
        }
        for (f, v) in [101., 100., 50., 50., 0., 0.8].iter().enumerate() {
            out[[0, f, 1]] = *v;
        }
        let out = out.into_dyn();

        let mut dec = decoder(ModelVersion::YoloV8);
        let dets = dec.decode(out.index_axis(Axis(0), 0), 2, 640, 640, 0.25);
        let labels: Vec<String> = dets.iter().map(|d| d.get_label()).collect();
        assert_eq!(labels, vec!["person", "car"]);

        dec.agnostic_nms = true;
        let dets = dec.decode(out.index_axis(Axis(0), 0), 2, 640, 640, 0.25);
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].get_label(), "person");
    }

    #[test]
    fn v5_objectness_multiplies_class_score() {
        // anchors first: cx, cy, w, h, obj, cls0, cls1
        let out = Array2::from_shape_vec((1, 7), vec![320., 320., 64., 64., 0.5, 0.2, 0.8])
            .unwrap()
            .into_dyn();
        let dec = decoder(ModelVersion::YoloV5);
        let nc = dec.num_classes(out.shape());
        assert_eq!(nc, 2);

        let dets = dec.decode(out.view(), nc, 640, 640, 0.25);
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 1);
        assert!((dets[0].confidence - 0.4).abs() < 1e-6);
        assert!(dec.decode(out.view(), nc, 640, 640, 0.5).is_empty());
    }

    #[test]
    fn v10_boxes_are_clipped_and_unlabelled_ids_fall_back() {
        // x1, y1, x2, y2, score, class id
        let out = Array2::from_shape_vec((2, 6), vec![
            -10., 600., 100., 700., 0.9, 5.,
            10., 10., 20., 20., 0.3, 0.,
        ])
        .unwrap()
        .into_dyn();
        let dec = decoder(ModelVersion::YoloV10);
        let dets = dec.decode(out.view(), 0, 640, 640, 0.25);
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].bbox, BBox::new(0., 600., 100., 640.));
        assert_eq!(dets[0].caption(), "#5 0.90");
        assert_eq!(dets[1].get_label(), "person");
    }
}
