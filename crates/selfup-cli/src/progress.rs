use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use selfup::ProgressSink;

const PB_STYLE: &str = "{spinner:.blue} [{elapsed_precise}] {wide_bar:.cyan/blue} {percent:>3}% {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

/// Resolution of the bar; progress fractions are scaled to this length.
const STEPS: u64 = 1000;

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(PB_STYLE)
        .ok()
        .map(|style| style.tick_chars(TICK).progress_chars(PB_CHARS))
});

/// Terminal progress bar fed by a [`ProgressSink`].
pub struct ProgressTracker {
    pb: ProgressBar,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let pb = ProgressBar::new(STEPS);
        if let Some(style) = PB_TEMPLATE.as_ref() {
            pb.set_style(style.clone());
        }
        Self { pb }
    }

    pub fn finish(&self, msg: Option<String>) {
        match msg {
            Some(msg) => self.pb.finish_with_message(msg),
            None => self.pb.finish(),
        }
    }

    pub fn abandon(&self) { self.pb.abandon(); }
}

impl ProgressSink for ProgressTracker {
    fn set_progress(&self, value: f32) {
        let position = (value.clamp(0.0, 1.0) * STEPS as f32).round() as u64;
        self.pb.set_position(position);
    }
}
