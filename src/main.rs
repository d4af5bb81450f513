// PDF to JPG Converter - pick a PDF, pick a folder, get numbered JPEGs
use anyhow::Result;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

mod convert;
mod pages;

use convert::{ConvertEvent, ConvertRequest};
use pages::PageSelection;

struct ConverterApp {
    pdf_path: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    pages_spec: String,
    progress: f32,
    status: String,
    // SINGLE JOB SLOT: Some while a conversion run is in flight; the start
    // button stays disabled until the run's terminal event arrives
    job: Option<Receiver<ConvertEvent>>,
}

impl Default for ConverterApp {
    fn default() -> Self {
        Self {
            pdf_path: None,
            out_dir: None,
            pages_spec: String::new(),
            progress: 0.0,
            status: "Ready".to_owned(),
            job: None,
        }
    }
}

impl ConverterApp {
    fn start_conversion(&mut self) {
        let (Some(pdf_path), Some(out_dir)) = (self.pdf_path.clone(), self.out_dir.clone()) else {
            rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Warning)
                .set_title("Warning")
                .set_description("Please select a file and a save path.")
                .show();
            return;
        };

        let request = ConvertRequest {
            pdf_path,
            out_dir,
            selection: PageSelection::parse(&self.pages_spec),
        };
        self.progress = 0.0;
        self.status = "Converting...".to_owned();
        self.job = Some(spawn_conversion(request));
    }

    fn drain_events(&mut self) {
        let Some(rx) = self.job.take() else { return };
        loop {
            match rx.try_recv() {
                Ok(ConvertEvent::Progress(percent)) => self.progress = percent,
                Ok(ConvertEvent::Done) => {
                    self.status = "Conversion Completed Successfully!".to_owned();
                    return;
                }
                Ok(ConvertEvent::Failed(message)) => {
                    self.status = message;
                    return;
                }
                Err(TryRecvError::Empty) => {
                    self.job = Some(rx);
                    return;
                }
                Err(TryRecvError::Disconnected) => {
                    // Worker went away without a terminal event
                    self.status = "Error: conversion stopped unexpectedly".to_owned();
                    return;
                }
            }
        }
    }
}

impl eframe::App for ConverterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        if self.job.is_some() {
            // Keep the progress bar moving even when the user isn't
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered_justified(|ui| {
                if ui.button("Upload PDF").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("PDF files", &["pdf"])
                        .pick_file()
                    {
                        self.pdf_path = Some(path);
                    }
                }
                if let Some(path) = &self.pdf_path {
                    ui.small(path.display().to_string());
                }

                ui.add_space(5.0);
                if ui.button("Select Save Path").clicked() {
                    if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                        self.out_dir = Some(dir);
                    }
                }
                if let Some(dir) = &self.out_dir {
                    ui.small(dir.display().to_string());
                }

                ui.add_space(5.0);
                ui.label("Enter Pages (e.g., 1,3,5):");
                ui.text_edit_singleline(&mut self.pages_spec);

                ui.add_space(5.0);
                let start = ui.add_enabled(
                    self.job.is_none(),
                    egui::Button::new("Start Conversion"),
                );
                if start.clicked() {
                    self.start_conversion();
                }

                ui.add_space(5.0);
                ui.add(egui::ProgressBar::new(self.progress / 100.0).show_percentage());
                ui.label(&self.status);
            });
        });
    }
}

fn spawn_conversion(request: ConvertRequest) -> Receiver<ConvertEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let event = match convert::convert(&request, &tx) {
            Ok(written) => {
                log::info!("conversion finished, {written} file(s) written");
                ConvertEvent::Done
            }
            Err(e) => {
                log::error!("conversion failed: {e:#}");
                ConvertEvent::Failed(format!("Error: {e:#}"))
            }
        };
        let _ = tx.send(event);
    });
    rx
}

fn main() -> Result<()> {
    env_logger::init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([400.0, 300.0])
            .with_title("PDF to JPG Converter"),
        ..Default::default()
    };

    eframe::run_native(
        "PDF to JPG Converter",
        native_options,
        Box::new(|_cc| Ok(Box::new(ConverterApp::default()))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
