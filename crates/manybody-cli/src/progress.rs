use indicatif::{ProgressBar, ProgressStyle};
use manybody::engine::progress::{Progress, ProgressReporter};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Bridges core progress events onto an indicatif bar.
pub struct CliProgress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl CliProgress {
    pub fn new(quiet: bool) -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
            quiet,
        })
    }

    pub fn reporter(self: &Arc<Self>) -> ProgressReporter<'static> {
        let bridge = Arc::clone(self);
        ProgressReporter::with_callback(Box::new(move |event| bridge.handle(event)))
    }

    fn handle(&self, event: Progress) {
        match event {
            Progress::PhaseStart { name } => {
                info!("phase: {name}");
                if !self.quiet {
                    eprintln!("==> {name}");
                }
            }
            Progress::PhaseFinish => {}
            Progress::TaskStart { total_steps } => {
                if self.quiet {
                    return;
                }
                let bar = ProgressBar::new(total_steps);
                bar.set_style(
                    ProgressStyle::with_template(
                        "    [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
                );
                *self.bar.lock().unwrap() = Some(bar);
            }
            Progress::TaskIncrement => {
                if let Some(bar) = self.bar.lock().unwrap().as_ref() {
                    bar.inc(1);
                }
            }
            Progress::TaskFinish => {
                if let Some(bar) = self.bar.lock().unwrap().take() {
                    bar.finish_and_clear();
                }
            }
            Progress::Message(text) => {
                info!("{text}");
                if !self.quiet {
                    eprintln!("    {text}");
                }
            }
        }
    }
}
