//! Stable model -> color mapping.
//!
//! Lookup order: curated table, colors already handed out this run, then a
//! hash of the name into a fixed palette. The table and palettes are
//! static, so a given name gets the same color in every run.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;

pub type ModelColorMap = BTreeMap<String, String>;

/// Palette for names of up to 10 characters.
const BASE_COLORS: [&str; 10] = [
    "#1664FF", "#1AC6FF", "#FF8A00", "#3CC780", "#7442D4", "#FFC400", "#304D77", "#B48DEB",
    "#009488", "#FF7DDA",
];

/// Palette for longer names.
const EXTENDED_COLORS: [&str; 20] = [
    "#1664FF", "#B2CFFF", "#1AC6FF", "#94EFFF", "#FF8A00", "#FFCE7A", "#3CC780", "#B9EDCD",
    "#7442D4", "#DDC5FA", "#FFC400", "#FAE878", "#304D77", "#8B959E", "#B48DEB", "#EFE3FF",
    "#009488", "#59BAA8", "#FF7DDA", "#FFCFEE",
];

const LONG_NAME_THRESHOLD: usize = 10;

static MODEL_COLOR_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("dall-e", "rgb(147,112,219)"),
        ("dall-e-3", "rgb(153,50,204)"),
        ("gpt-3.5-turbo", "rgb(184,227,167)"),
        ("gpt-3.5-turbo-0613", "rgb(60,179,113)"),
        ("gpt-3.5-turbo-1106", "rgb(32,178,170)"),
        ("gpt-3.5-turbo-16k", "rgb(149,252,206)"),
        ("gpt-3.5-turbo-16k-0613", "rgb(119,255,214)"),
        ("gpt-3.5-turbo-instruct", "rgb(175,238,238)"),
        ("gpt-4", "rgb(135,206,235)"),
        ("gpt-4-0613", "rgb(100,149,237)"),
        ("gpt-4-1106-preview", "rgb(30,144,255)"),
        ("gpt-4-0125-preview", "rgb(2,177,236)"),
        ("gpt-4-turbo-preview", "rgb(2,177,255)"),
        ("gpt-4-32k", "rgb(104,111,238)"),
        ("gpt-4-32k-0613", "rgb(61,71,139)"),
        ("gpt-4-all", "rgb(65,105,225)"),
        ("gpt-4-gizmo-*", "rgb(0,0,255)"),
        ("gpt-4-vision-preview", "rgb(25,25,112)"),
        ("text-ada-001", "rgb(255,192,203)"),
        ("text-babbage-001", "rgb(255,160,122)"),
        ("text-curie-001", "rgb(219,112,147)"),
        ("text-davinci-003", "rgb(219,112,147)"),
        ("text-davinci-edit-001", "rgb(255,105,180)"),
        ("text-embedding-ada-002", "rgb(255,182,193)"),
        ("text-embedding-v1", "rgb(255,174,185)"),
        ("text-moderation-latest", "rgb(255,130,171)"),
        ("text-moderation-stable", "rgb(255,160,122)"),
        ("tts-1", "rgb(255,140,0)"),
        ("tts-1-1106", "rgb(255,165,0)"),
        ("tts-1-hd", "rgb(255,215,0)"),
        ("tts-1-hd-1106", "rgb(255,223,0)"),
        ("whisper-1", "rgb(245,245,220)"),
        ("claude-3-opus-20240229", "rgb(255,132,31)"),
        ("claude-3-sonnet-20240229", "rgb(253,135,93)"),
        ("claude-3-haiku-20240307", "rgb(255,175,146)"),
        ("claude-2.1", "rgb(255,209,190)"),
    ])
});

/// Hand-picked color for a well-known model, if any.
pub fn curated_color(model: &str) -> Option<&'static str> {
    MODEL_COLOR_MAP.get(model).copied()
}

/// 32-bit rolling hash (`h * 31 + unit`) over the UTF-16 code units.
fn name_hash(model: &str) -> u32 {
    let hash = model
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(unit as i32));
    hash.unsigned_abs()
}

/// Palette color picked by hashing the name.
pub fn hash_color(model: &str) -> &'static str {
    let palette: &[&'static str] = if model.encode_utf16().count() > LONG_NAME_THRESHOLD {
        &EXTENDED_COLORS
    } else {
        &BASE_COLORS
    };
    palette[name_hash(model) as usize % palette.len()]
}

/// Per-run color assignment with a memo of colors already handed out.
#[derive(Debug, Clone, Default)]
pub struct ColorAssigner {
    assigned: HashMap<String, String>,
}

impl ColorAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from colors assigned earlier (e.g. the previous render) so
    /// series keep their color across refreshes.
    pub fn with_assigned(previous: &ModelColorMap) -> Self {
        Self {
            assigned: previous
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn color_for(&mut self, model: &str) -> String {
        if let Some(color) = curated_color(model) {
            return color.to_string();
        }
        if let Some(color) = self.assigned.get(model) {
            return color.clone();
        }
        let color = hash_color(model).to_string();
        self.assigned.insert(model.to_string(), color.clone());
        color
    }

    pub fn generate_model_colors<'a, I>(&mut self, models: I) -> ModelColorMap
    where
        I: IntoIterator<Item = &'a String>,
    {
        models
            .into_iter()
            .map(|model| (model.clone(), self.color_for(model)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curated_color_wins() {
        let mut assigner = ColorAssigner::new();
        assert_eq!(assigner.color_for("gpt-4"), "rgb(135,206,235)");
        assert_eq!(assigner.color_for("claude-2.1"), "rgb(255,209,190)");
    }

    #[test]
    fn test_hash_color_known_values() {
        // short names use the 10-color palette
        assert_eq!(hash_color("a"), "#B48DEB");
        assert_eq!(hash_color("my-model"), "#1664FF");
        assert_eq!(hash_color("gpt-4o"), "#B48DEB");
        // longer names use the 20-color palette
        assert_eq!(hash_color("deepseek-chat"), "#B2CFFF");
        assert_eq!(hash_color("claude-3-5-sonnet-20241022"), "#FF8A00");
    }

    #[test]
    fn test_color_is_deterministic_across_runs() {
        let first = ColorAssigner::new().color_for("mistral-large-latest");
        let second = ColorAssigner::new().color_for("mistral-large-latest");
        assert_eq!(first, second);
        assert_eq!(ColorAssigner::new().color_for("gpt-4"), ColorAssigner::new().color_for("gpt-4"));
    }

    #[test]
    fn test_previous_assignment_is_reused() {
        let mut previous = ModelColorMap::new();
        previous.insert("custom-model".to_string(), "#000000".to_string());
        previous.insert("gpt-4".to_string(), "#111111".to_string());

        let mut assigner = ColorAssigner::with_assigned(&previous);
        assert_eq!(assigner.color_for("custom-model"), "#000000");
        // the curated table still takes precedence
        assert_eq!(assigner.color_for("gpt-4"), "rgb(135,206,235)");
    }

    #[test]
    fn test_unknown_and_empty_names_get_a_color() {
        let mut assigner = ColorAssigner::new();
        assert!(!assigner.color_for("").is_empty());
        assert!(!assigner.color_for("无数据").is_empty());
        assert!(!assigner.color_for("🚀-model-with-emoji").is_empty());
    }

    #[test]
    fn test_generate_model_colors() {
        let models = vec!["gpt-4".to_string(), "a".to_string()];
        let colors = ColorAssigner::new().generate_model_colors(&models);
        assert_eq!(colors.len(), 2);
        assert_eq!(colors["gpt-4"], "rgb(135,206,235)");
        assert_eq!(colors["a"], "#B48DEB");
    }
}
