use std::collections::HashMap;

use crate::models::{CaptionEntry, CaptionTrack};

/// Seconds between backup caption starts; each line stays up 4.5s.
const BACKUP_SPACING_SECS: f64 = 5.0;
const BACKUP_DURATION_SECS: f64 = 4.5;

/// Source lines paired with their built-in Simplified Chinese rendering.
const BACKUP_LINES: [(&str, &str); 10] = [
    ("Welcome back to the channel.", "欢迎回到频道。"),
    (
        "Today we are looking at something a little different.",
        "今天我们来看一些不太一样的东西。",
    ),
    ("Let's start with the basics.", "我们先从基础开始。"),
    ("This part is easy to miss.", "这一部分很容易被忽略。"),
    (
        "Watch what happens when I change this value.",
        "看看我改变这个值时会发生什么。",
    ),
    ("That's the key idea.", "这就是关键思路。"),
    ("Now let's try a harder example.", "现在我们试一个更难的例子。"),
    (
        "Take a moment to think about why that works.",
        "花点时间想想为什么这样可行。",
    ),
    ("Thanks for watching.", "感谢观看。"),
    ("See you in the next video.", "下个视频见。"),
];

/// Ten-entry track spanning 0–50s, used when no transcript can be loaded.
pub fn backup_track() -> CaptionTrack {
    CaptionTrack::from_entries(
        BACKUP_LINES
            .iter()
            .enumerate()
            .map(|(index, (text, _))| {
                let start = index as f64 * BACKUP_SPACING_SECS;
                CaptionEntry::new(start, start + BACKUP_DURATION_SECS, *text)
            })
            .collect(),
    )
}

/// Built-in translations for the backup lines, when the target language has them.
pub fn backup_translations(target_language: &str) -> HashMap<String, String> {
    let language = target_language.to_ascii_lowercase();
    if language != "zh" && !language.starts_with("zh-") {
        return HashMap::new();
    }
    BACKUP_LINES
        .iter()
        .map(|(source, translated)| (source.to_string(), translated.to_string()))
        .collect()
}
