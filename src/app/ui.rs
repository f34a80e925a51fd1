use super::{ActionProgress, DashboardApp, Tab, UiAction};
use crate::dashboard::{Area, DashboardSnapshot};
use crate::upload::{DataType, UploadMode, UploadStatus};
use crate::utils::color::Palette;
use crate::utils::file_size::format_size;
use eframe::egui::{self, Align, Color32, RichText};
use rfd::FileDialog;
use serde_json::{Map, Value};

const OVERVIEW_CARDS: [(&str, &str); 4] = [
    ("total_members", "Total members"),
    ("active_members", "Active members"),
    ("join_rate", "Join rate (%)"),
    ("churn_rate", "Churn rate (%)"),
];

impl DashboardApp {
    pub(super) fn render(&mut self, ctx: &egui::Context) -> Vec<UiAction> {
        let mut actions = Vec::new();

        egui::CentralPanel::default().show(ctx, |ui| {
            let footer_height = 40.0;
            let content_height = ui.available_height() - footer_height;

            egui::ScrollArea::vertical()
                .max_height(content_height)
                .show(ui, |ui| {
                    self.render_header(ui, &mut actions);
                    ui.add_space(10.0);

                    if self.show_uploader {
                        self.render_uploader(ui, &mut actions);
                        ui.add_space(10.0);
                    }

                    ui.horizontal(|ui| {
                        for tab in Tab::ALL {
                            if ui.selectable_label(self.active_tab == tab, tab.label()).clicked() {
                                self.active_tab = tab;
                            }
                        }
                    });
                    ui.separator();

                    let snapshot = self.pipeline.store().snapshot();
                    match self.active_tab {
                        Tab::Overview => render_overview(ui, &snapshot, &self.palette),
                        Tab::Members => render_area(ui, &snapshot, Area::Members, &self.palette),
                        Tab::Utilization => {
                            render_labels(ui, "Rooms", &snapshot.labels.room_names);
                            render_labels(ui, "Time slots", &snapshot.labels.time_slots);
                            render_area(ui, &snapshot, Area::Utilization, &self.palette);
                        }
                        Tab::Competitors => {
                            render_labels(ui, "Competitors", &snapshot.labels.competitor_names);
                            render_area(ui, &snapshot, Area::Competitors, &self.palette);
                        }
                        Tab::Finance => render_area(ui, &snapshot, Area::Finance, &self.palette),
                    }
                });

            ui.with_layout(egui::Layout::bottom_up(Align::Center), |ui| {
                ui.add_space(10.0);
                self.render_footer(ui, &mut actions);
            });
        });

        actions
    }

    fn render_header(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.add_space(10.0);
        ui.horizontal(|ui| {
            ui.heading("Sauna Analytics Dashboard");
            ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                if ui.button("🔄 Refresh").clicked() {
                    actions.push(UiAction::Refresh);
                }
                let label = if self.show_uploader {
                    "Hide upload"
                } else {
                    "📤 CSV upload"
                };
                if ui.button(label).clicked() {
                    self.show_uploader = !self.show_uploader;
                }
            });
        });

        let refreshing = self.pipeline.is_refreshing();
        let state = self.pipeline.store().state();
        ui.horizontal(|ui| {
            if refreshing {
                ui.spinner();
                ui.label("Loading dashboard data...");
            }
            if let Some(error) = &state.error {
                ui.colored_label(self.palette.danger, error);
            }
        });
    }

    fn render_uploader(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let palette = self.palette;
        let upload = self.pipeline.upload_state_mut();

        ui.group(|ui| {
            ui.label(RichText::new("Upload CSV files").strong());
            ui.add_space(5.0);

            ui.horizontal(|ui| {
                if ui.button("📄 Select Files").clicked() {
                    let picked = FileDialog::new().add_filter("CSV", &["csv"]).pick_files();
                    if let Some(paths) = picked {
                        actions.push(UiAction::SelectFiles(paths));
                    }
                }
                if ui.button("📁 Select Folder").clicked() {
                    if let Some(folder) = FileDialog::new().pick_folder() {
                        actions.push(UiAction::SelectFolder(folder));
                    }
                }
                if ui.button("Cancel").clicked() {
                    actions.push(UiAction::ClearSelection);
                }
            });

            ui.label(format!("Selected: {}", upload.selection_label()));
            for file in &upload.selection {
                ui.label(
                    RichText::new(format!("  {} ({})", file.name, format_size(file.size())))
                        .color(palette.muted),
                );
            }

            ui.horizontal(|ui| {
                egui::ComboBox::from_label("Data type")
                    .selected_text(upload.data_type.as_str())
                    .show_ui(ui, |ui| {
                        for data_type in DataType::ALL {
                            let text = data_type.as_str();
                            ui.selectable_value(&mut upload.data_type, data_type, text);
                        }
                    });
                egui::ComboBox::from_label("Mode")
                    .selected_text(upload.mode.to_string())
                    .show_ui(ui, |ui| {
                        for mode in [UploadMode::Auto, UploadMode::Single, UploadMode::Multiple] {
                            ui.selectable_value(&mut upload.mode, mode, mode.to_string());
                        }
                    });
                ui.checkbox(&mut upload.infer_data_type, "Guess type from file name");
            });

            ui.add_space(5.0);
            let button_text = if upload.is_uploading {
                "⏳ Uploading..."
            } else {
                "📤 Upload"
            };
            let button = egui::Button::new(button_text).min_size(egui::vec2(160.0, 32.0));
            if ui.add_enabled(upload.can_upload(), button).clicked() {
                actions.push(UiAction::Upload);
            }

            if !matches!(upload.progress, ActionProgress::NotStarted) {
                ui.add_space(5.0);
                let bar = egui::ProgressBar::new(upload.get_progress_percentage())
                    .animate(upload.is_uploading)
                    .fill(palette.secondary);
                ui.add(bar);
                ui.label(upload.get_status_text());
            }

            if let Some(message) = &upload.message {
                let color = match upload.progress {
                    ActionProgress::Completed { failed, .. } if failed > 0 => palette.warning,
                    _ => palette.success,
                };
                ui.colored_label(color, message);
            }
            if let Some(error) = &upload.error_message {
                ui.colored_label(palette.danger, error);
            }

            if upload.pending_fallback.is_some() {
                ui.add_space(5.0);
                ui.label("The standard upload failed. Retry in simple mode?");
                ui.horizontal(|ui| {
                    if ui.button("Retry in simple mode").clicked() {
                        actions.push(UiAction::AcceptFallback);
                    }
                    if ui.button("Dismiss").clicked() {
                        actions.push(UiAction::DismissFallback);
                    }
                });
            }

            if !upload.file_statuses.is_empty() {
                ui.add_space(5.0);
                let toggle = if upload.show_details {
                    "Hide Details"
                } else {
                    "Show Details"
                };
                if ui.button(toggle).clicked() {
                    upload.show_details = !upload.show_details;
                }
                if upload.show_details {
                    for status in &upload.file_statuses {
                        let (icon, color, text) = match &status.status {
                            UploadStatus::Processing => {
                                ("⏳", palette.muted, format!("{} - Processing...", status.name))
                            }
                            UploadStatus::Success => ("✅", palette.success, status.name.clone()),
                            UploadStatus::Error(err) => {
                                ("❌", palette.danger, format!("{} - {}", status.name, err))
                            }
                            UploadStatus::Skipped(reason) => {
                                ("⏩", palette.muted, format!("{} - {}", status.name, reason))
                            }
                            UploadStatus::Unconfirmed => (
                                "❔",
                                palette.warning,
                                format!("{} - outcome not reported by the server", status.name),
                            ),
                        };
                        ui.horizontal(|ui| {
                            ui.label(icon);
                            ui.colored_label(color, text);
                        });
                    }
                }
            }
        });
    }

    fn render_footer(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.horizontal(|ui| {
            ui.label("Backend:");
            let text = RichText::new(&self.api_base_url).color(self.palette.primary);
            let link = egui::Label::new(text).sense(egui::Sense::click());
            if ui.add(link).clicked() {
                actions.push(UiAction::OpenBackend);
            }
        });
    }
}

fn render_overview(ui: &mut egui::Ui, snapshot: &DashboardSnapshot, palette: &Palette) {
    if snapshot.has_no_data() {
        ui.label("No data yet. Upload CSV files to populate the dashboard.");
        return;
    }

    ui.horizontal_wrapped(|ui| {
        for (key, title) in OVERVIEW_CARDS {
            let value = snapshot
                .number(Area::Metrics, key)
                .map(format_number)
                .unwrap_or_else(|| "-".to_string());
            card(ui, title, &value, palette.primary);
        }
    });

    ui.add_space(10.0);
    for area in [Area::Members, Area::Utilization, Area::Competitors, Area::Finance] {
        let fields = snapshot.area(area).len();
        ui.label(format!("{}: {} field(s)", area.title(), fields));
    }
}

fn card(ui: &mut egui::Ui, title: &str, value: &str, color: Color32) {
    ui.group(|ui| {
        ui.set_min_width(140.0);
        ui.vertical(|ui| {
            ui.label(RichText::new(title).small());
            ui.label(RichText::new(value).size(22.0).strong().color(color));
        });
    });
}

fn render_labels(ui: &mut egui::Ui, title: &str, labels: &[String]) {
    if !labels.is_empty() {
        ui.label(format!("{}: {}", title, labels.join(", ")));
    }
}

fn render_area(ui: &mut egui::Ui, snapshot: &DashboardSnapshot, area: Area, palette: &Palette) {
    ui.heading(area.title());
    let data = snapshot.area(area);
    if data.is_empty() {
        ui.label("No data for this section yet.");
        return;
    }

    for (key, value) in data {
        match value {
            Value::Object(map) if is_distribution(map) => {
                ui.add_space(5.0);
                ui.label(RichText::new(key).strong());
                render_distribution(ui, map, palette);
            }
            _ => {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(key).strong());
                    ui.label(display_value(value));
                });
            }
        }
    }
}

fn is_distribution(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.values().all(Value::is_number)
}

fn render_distribution(ui: &mut egui::Ui, map: &Map<String, Value>, palette: &Palette) {
    let max = map
        .values()
        .filter_map(Value::as_f64)
        .fold(0.0_f64, f64::max);

    egui::Grid::new(ui.next_auto_id()).striped(true).show(ui, |ui| {
        for (index, (label, value)) in map.iter().enumerate() {
            let amount = value.as_f64().unwrap_or_default();
            let fraction = if max > 0.0 { (amount / max) as f32 } else { 0.0 };
            ui.label(label);
            ui.add(
                egui::ProgressBar::new(fraction)
                    .desired_width(200.0)
                    .fill(palette.rooms[index % palette.rooms.len()])
                    .text(format_number(amount)),
            );
            ui.end_row();
        }
    });
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => {
            let text = other.to_string();
            if text.chars().count() > 120 {
                format!("{}...", text.chars().take(120).collect::<String>())
            } else {
                text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_drop_trailing_zero_fraction() {
        assert_eq!(format_number(420.0), "420");
        assert_eq!(format_number(3.456), "3.5");
    }

    #[test]
    fn numeric_maps_render_as_distributions() {
        let map = json!({"Male": 120, "Female": 98}).as_object().cloned().unwrap();
        assert!(is_distribution(&map));
        let mixed = json!({"name": "MENTE", "hourly_rate": 2500}).as_object().cloned().unwrap();
        assert!(!is_distribution(&mixed));
    }

    #[test]
    fn long_values_are_shortened() {
        let value = json!(vec!["x"; 100]);
        assert!(display_value(&value).ends_with("..."));
        assert_eq!(display_value(&json!(null)), "-");
    }
}
