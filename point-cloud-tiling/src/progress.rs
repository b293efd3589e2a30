/// Progress bars shared by the long-running stages
use indicatif::{ProgressBar, ProgressStyle};

/// Bar styled like the rest of the tool, or a hidden one when disabled.
pub fn bar(len: u64, unit: &str, message: &'static str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    let template = format!("[{{bar:40.green/blue}}] {{pos}}/{{len}} {unit} ({{percent}}%) {{msg}}");
    if let Ok(style) = ProgressStyle::default_bar().template(&template) {
        pb.set_style(style.progress_chars("▉▊▋▌▍▎▏ "));
    }
    pb.set_message(message);
    pb
}

/// Spinner for streams of unknown length.
pub fn spinner(message: &'static str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb
}
