use crate::data::Dataset;
use crate::fitness::max_score;

/// `info!` that drops ANSI colour codes when colourful display is disabled
#[macro_export]
macro_rules! cinfo {
    ($colorful:expr, $($arg:tt)+) => {
        if $colorful {
            log::info!($($arg)+);
        } else {
            log::info!("{}", $crate::utils::strip_ansi(&format!($($arg)+)));
        }
    };
}

/// Remove `ESC [ ... m` sequences
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }

    out
}

pub fn display_epoch_legend(data: &Dataset) -> String {
    format!(
        "\x1b[2;97mTraining on {} (max score {}) | generation | best | mean ± std\x1b[0m",
        data.name,
        max_score(data)
    )
}

pub fn display_epoch(generation: usize, best: u32, mean: f64, std: f64, data: &Dataset) -> String {
    let max = max_score(data);
    let pct = if max > 0 { 100.0 * best as f64 / max as f64 } else { 0.0 };
    format!(
        "#{:>4} | \x1b[1;96mbest {:>4}/{} ({:>5.1}%)\x1b[0m | mean {:>7.2} ± {:.2}",
        generation, best, max, pct, mean, std
    )
}

/// Round to two decimals for display
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
