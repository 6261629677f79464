//! YOLO generations and the tensor layout each one emits.

use ndarray::{ArrayView, Axis, IxDyn};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ModelVersion {
    YoloV5,
    YoloV6,
    YoloV7,
    YoloV8,
    YoloV9,
    YoloV10,
    #[default] YoloV11,
    YoloV12,
}

impl ModelVersion {
    pub fn name(&self) -> &'static str {
        match self {
            Self::YoloV5 => "YoloV5",
            Self::YoloV6 => "YoloV6",
            Self::YoloV7 => "YoloV7",
            Self::YoloV8 => "YoloV8",
            Self::YoloV9 => "YoloV9",
            Self::YoloV10 => "YoloV10",
            Self::YoloV11 => "YoloV11",
            Self::YoloV12 => "YoloV12",
        }
    }

    /// Accepts `yolov8`, `v8` or `8`. Unknown names are `None`.
    pub fn from_name(version: &str) -> Option<ModelVersion> {
        let version = version.to_lowercase();
        let digits = version.trim_start_matches("yolo").trim_start_matches('v');
        match digits {
            "5" => Some(ModelVersion::YoloV5),
            "6" => Some(ModelVersion::YoloV6),
            "7" => Some(ModelVersion::YoloV7),
            "8" => Some(ModelVersion::YoloV8),
            "9" => Some(ModelVersion::YoloV9),
            "10" => Some(ModelVersion::YoloV10),
            "11" => Some(ModelVersion::YoloV11),
            "12" => Some(ModelVersion::YoloV12),
            _ => None,
        }
    }

    pub fn layout(&self) -> YoloPreds {
        match self {
            ModelVersion::YoloV5 | ModelVersion::YoloV6 | ModelVersion::YoloV7 => YoloPreds::n_a_cxcywh_confclss(),
            ModelVersion::YoloV8 | ModelVersion::YoloV9 | ModelVersion::YoloV11 | ModelVersion::YoloV12 => YoloPreds::n_cxcywh_clss_a(),
            ModelVersion::YoloV10 => YoloPreds::n_a_xyxy_confcls().apply_nms(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoxType {
    Cxcywh,
    Xyxy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClssType {
    /// Per-class scores only.
    Clss,
    /// Objectness followed by per-class scores.
    ConfClss,
    /// Final score followed by a class id.
    ConfCls,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnchorsPosition {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YoloPreds {
    pub clss: ClssType,
    pub bbox: BoxType,
    pub anchors: AnchorsPosition,
    pub apply_nms: bool,
}

/// Per-anchor slices of one image's predictions, anchors on axis 0.
pub struct PredSlices<'a> {
    pub bboxes: ArrayView<'a, f32, IxDyn>,
    pub ids: Option<ArrayView<'a, f32, IxDyn>>,
    pub clss: ArrayView<'a, f32, IxDyn>,
    pub confs: Option<ArrayView<'a, f32, IxDyn>>,
}

impl YoloPreds {
    pub fn apply_nms(mut self, x: bool) -> Self {
        self.apply_nms = x;
        self
    }

    pub fn n_a_cxcywh_confclss() -> Self {
        // YOLOv5 | YOLOv6 | YOLOv7 : NACxcywhConfClss
        Self {
            bbox: BoxType::Cxcywh,
            clss: ClssType::ConfClss,
            anchors: AnchorsPosition::Before,
            apply_nms: true,
        }
    }

    pub fn n_cxcywh_clss_a() -> Self {
        // YOLOv8 | YOLOv9 | YOLO11 | YOLO12 : NCxcywhClssA
        Self {
            bbox: BoxType::Cxcywh,
            clss: ClssType::Clss,
            anchors: AnchorsPosition::After,
            apply_nms: true,
        }
    }

    pub fn n_a_xyxy_confcls() -> Self {
        // YOLOv10 : NAXyxyConfCls
        Self {
            bbox: BoxType::Xyxy,
            clss: ClssType::ConfCls,
            anchors: AnchorsPosition::Before,
            apply_nms: true,
        }
    }

    pub fn is_anchors_first(&self) -> bool {
        matches!(self.anchors, AnchorsPosition::Before)
    }

    /// Number of classes encoded in a prediction row of `features` values.
    pub fn num_classes(&self, features: usize) -> usize {
        match self.clss {
            ClssType::Clss => features.saturating_sub(4),
            ClssType::ConfClss => features.saturating_sub(5),
            ClssType::ConfCls => 0,
        }
    }

    /// Splits a single image's 2-D prediction tensor into box, id, class and objectness slices.
    pub fn parse_preds<'a>(&self, x: ArrayView<'a, f32, IxDyn>, nc: usize) -> PredSlices<'a> {
        let x = if self.is_anchors_first() {
            x
        } else {
            x.reversed_axes()
        };

        let (bboxes, rest) = x.split_at(Axis(1), 4);

        match self.clss {
            ClssType::ConfClss => {
                let (confs, rest) = rest.split_at(Axis(1), 1);
                let (clss, _) = rest.split_at(Axis(1), nc);
                PredSlices { bboxes, ids: None, clss, confs: Some(confs) }
            }
            ClssType::ConfCls => {
                let (clss, rest) = rest.split_at(Axis(1), 1);
                let (ids, _) = rest.split_at(Axis(1), 1);
                PredSlices { bboxes, ids: Some(ids), clss, confs: None }
            }
            ClssType::Clss => {
                let (clss, _) = rest.split_at(Axis(1), nc);
                PredSlices { bboxes, ids: None, clss, confs: None }
            }
        }
    }
}
