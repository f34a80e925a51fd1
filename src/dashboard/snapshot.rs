use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Shared label sets the charts are keyed by.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Labels {
    pub months: Vec<String>,
    pub days_of_week: Vec<String>,
    pub time_slots: Vec<String>,
    pub regions: Vec<String>,
    pub room_names: Vec<String>,
    pub competitor_names: Vec<String>,
    pub age_groups: Vec<String>,
    pub genders: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Metrics,
    Members,
    Utilization,
    Competitors,
    Finance,
}

impl Area {
    pub const ALL: [Area; 5] = [
        Area::Metrics,
        Area::Members,
        Area::Utilization,
        Area::Competitors,
        Area::Finance,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Area::Metrics => "Key metrics",
            Area::Members => "Members",
            Area::Utilization => "Room utilization",
            Area::Competitors => "Competitors",
            Area::Finance => "Finance",
        }
    }
}

/// One complete dashboard payload. Never patched in place: a new fetch
/// replaces the whole value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSnapshot {
    pub labels: Labels,
    pub metrics: Map<String, Value>,
    pub members: Map<String, Value>,
    pub utilization: Map<String, Value>,
    pub competitors: Map<String, Value>,
    pub finance: Map<String, Value>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl DashboardSnapshot {
    /// Label sets filled in, every domain area empty.
    pub fn placeholder() -> Self {
        let months = (5..=12)
            .map(|m| format!("2023-{:02}", m))
            .chain((1..=5).map(|m| format!("2024-{:02}", m)))
            .collect();

        Self {
            labels: Labels {
                months,
                days_of_week: strings(&["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]),
                time_slots: strings(&["9-12", "12-15", "15-18", "18-21", "21-24"]),
                regions: strings(&[
                    "Osaka", "Hyogo", "Kyoto", "Nara", "Shiga", "Wakayama", "Other",
                ]),
                room_names: strings(&["Room1", "Room2", "Room3"]),
                competitor_names: strings(&[
                    "HAAAVE.sauna",
                    "KUDOCHI sauna",
                    "MENTE",
                    "M's Sauna",
                    "SAUNA Pod",
                    "SAUNA OOO OSAKA",
                    "Osaka Sauna DESSE",
                ]),
                age_groups: strings(&["-19", "20s", "30s", "40s", "50s", "60+"]),
                genders: strings(&["Male", "Female"]),
            },
            ..Self::default()
        }
    }

    pub fn area(&self, area: Area) -> &Map<String, Value> {
        match area {
            Area::Metrics => &self.metrics,
            Area::Members => &self.members,
            Area::Utilization => &self.utilization,
            Area::Competitors => &self.competitors,
            Area::Finance => &self.finance,
        }
    }

    /// True while no domain area carries data yet.
    pub fn has_no_data(&self) -> bool {
        Area::ALL.iter().all(|area| self.area(*area).is_empty())
    }

    pub fn number(&self, area: Area, key: &str) -> Option<f64> {
        self.area(area).get(key).and_then(Value::as_f64)
    }
}
