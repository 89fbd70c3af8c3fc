//! Reshapes a merged detection payload into per-image groups for display.
//!
//! HerdNet answers with point detections and plot images, either at the top
//! level or nested under `data`. YOLO answers with annotated images. Both are
//! keyed by image name, which is what the groups are joined on.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::MergedResult;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Position {
    #[serde(deserialize_with = "number")]
    pub x: f64,
    #[serde(deserialize_with = "number")]
    pub y: f64,
}

/// One HerdNet point. Every field is optional and a value of an unexpected
/// type reads as absent, so a detection is never dropped over one column.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Detection {
    #[serde(deserialize_with = "lenient")]
    pub detection_id: Option<u64>,
    #[serde(deserialize_with = "lenient")]
    pub image_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub images: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub species: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub confidence: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub position: Option<Position>,
    #[serde(deserialize_with = "lenient")]
    pub x: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub y: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub scores: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub dscores: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub labels: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub thumbnail_base64: Option<String>,
}

/// Conversion from whatever JSON a service sent for a column.
trait FromLooseJson: Sized {
    fn from_loose(value: &Value) -> Option<Self>;
}

impl FromLooseJson for f64 {
    fn from_loose(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromLooseJson for i64 {
    fn from_loose(value: &Value) -> Option<Self> {
        value
            .as_i64()
            .or_else(|| f64::from_loose(value).filter(|f| f.fract() == 0.0).map(|f| f as i64))
    }
}

impl FromLooseJson for u64 {
    fn from_loose(value: &Value) -> Option<Self> {
        value
            .as_u64()
            .or_else(|| i64::from_loose(value).and_then(|i| u64::try_from(i).ok()))
    }
}

impl FromLooseJson for String {
    fn from_loose(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl FromLooseJson for Position {
    fn from_loose(value: &Value) -> Option<Self> {
        Position::deserialize(value).ok()
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromLooseJson,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::from_loose(&value))
}

fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    f64::from_loose(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("Expected a number, got {}", value)))
}

impl Detection {
    /// `image_name`, falling back to the older `images` column.
    pub fn source_image(&self) -> Option<&str> {
        non_empty(self.image_name.as_deref()).or_else(|| non_empty(self.images.as_deref()))
    }

    pub fn species_name(&self) -> Option<&str> {
        non_empty(self.species.as_deref())
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let x = self.position.map(|p| p.x).or(self.x)?;
        let y = self.position.map(|p| p.y).or(self.y)?;
        Some((x, y))
    }

    pub fn confidence_value(&self) -> Option<f64> {
        self.confidence.or(self.scores)
    }

    /// Identifier shown in tables; `index` is the detection's position within its image.
    pub fn display_id(&self, index: usize) -> u64 {
        match self.detection_id {
            Some(id) if id != 0 => id,
            _ => index as u64 + 1,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Plot {
    pub image_name: String,
    pub plot_base64: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnnotatedImage {
    pub image_name: String,
    #[serde(default)]
    pub detections_count: u64,
    #[serde(default)]
    pub annotated_image_base64: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageGroup {
    pub image_name: String,
    pub detections: Vec<Detection>,
    pub species_counts: BTreeMap<String, usize>,
    pub plot_base64: Option<String>,
    pub yolo: Option<AnnotatedImage>,
}

impl ImageGroup {
    pub fn total_detections(&self) -> usize {
        self.detections.len()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    pub total_images: usize,
    pub total_detections: usize,
    /// Most frequent species first; ties ordered by name.
    pub species: Vec<(String, usize)>,
}

impl Summary {
    pub fn average_per_image(&self) -> f64 {
        if self.total_images == 0 {
            return 0.0;
        }
        self.total_detections as f64 / self.total_images as f64
    }

    pub fn species_found(&self) -> usize {
        self.species.len()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub groups: Vec<ImageGroup>,
    pub summary: Summary,
}

impl Report {
    /// Accepts either a merged `{herdnet, yolo}` payload or a bare HerdNet response.
    pub fn from_payload(payload: &Value) -> Self {
        match payload.get("herdnet") {
            Some(herdnet) => Self::from_parts(herdnet, payload.get("yolo")),
            None => Self::from_parts(payload, payload.get("yolo")),
        }
    }

    pub fn from_merged(merged: &MergedResult) -> Self {
        Self::from_parts(&merged.herdnet, Some(&merged.yolo))
    }

    pub fn from_parts(herdnet: &Value, yolo: Option<&Value>) -> Self {
        let detections: Vec<Detection> = parse_list(herdnet_list(herdnet, "detections"));
        let plots: HashMap<String, String> = parse_list::<Plot>(herdnet_list(herdnet, "plots"))
            .into_iter()
            .map(|plot| (plot.image_name, plot.plot_base64))
            .collect();
        let annotated: HashMap<String, AnnotatedImage> =
            parse_list::<AnnotatedImage>(yolo.and_then(|y| y.get("annotated_images")))
                .into_iter()
                .map(|image| (image.image_name.clone(), image))
                .collect();

        let mut species_totals: HashMap<String, usize> = HashMap::new();
        let mut by_image: BTreeMap<String, ImageGroup> = BTreeMap::new();

        for detection in &detections {
            if let Some(species) = detection.species_name() {
                *species_totals.entry(species.to_string()).or_default() += 1;
            }
            let Some(image_name) = detection.source_image() else {
                continue;
            };
            let group = by_image
                .entry(image_name.to_string())
                .or_insert_with(|| ImageGroup {
                    image_name: image_name.to_string(),
                    detections: Vec::new(),
                    species_counts: BTreeMap::new(),
                    plot_base64: plots.get(image_name).cloned(),
                    yolo: annotated.get(image_name).cloned(),
                });
            if let Some(species) = detection.species_name() {
                *group.species_counts.entry(species.to_string()).or_default() += 1;
            }
            group.detections.push(detection.clone());
        }

        let mut species: Vec<(String, usize)> = species_totals.into_iter().collect();
        species.sort_by(|(a_name, a_count), (b_name, b_count)| {
            b_count.cmp(a_count).then_with(|| a_name.cmp(b_name))
        });

        let groups: Vec<ImageGroup> = by_image.into_values().collect();
        let summary = Summary {
            total_images: groups.len(),
            total_detections: detections.len(),
            species,
        };
        Report { groups, summary }
    }
}

fn herdnet_list<'a>(herdnet: &'a Value, key: &str) -> Option<&'a Value> {
    herdnet
        .get(key)
        .filter(|v| !v.is_null())
        .or_else(|| herdnet.get("data").and_then(|data| data.get(key)))
}

// Only objects are entries; those missing a required key are skipped.
fn parse_list<T: for<'de> Deserialize<'de>>(list: Option<&Value>) -> Vec<T> {
    list.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| item.is_object())
                .filter_map(|item| T::deserialize(item).ok())
                .collect()
        })
        .unwrap_or_default()
}
