// ABOUTME: Timestamp normalization helpers for transcript segments
// ABOUTME: Collapses the API's mixed second/string offsets into HH:MM:SS

use crate::model::TimestampValue;

pub fn normalize_timestamp(ts: &TimestampValue) -> Option<String> {
    match ts {
        TimestampValue::Seconds(secs) => {
            let total_secs = *secs as u64;
            let hours = total_secs / 3600;
            let minutes = (total_secs % 3600) / 60;
            let seconds = total_secs % 60;
            Some(format!("{:02}:{:02}:{:02}", hours, minutes, seconds))
        }
        TimestampValue::String(s) => {
            // Normalize HH:MM:SS.sss -> HH:MM:SS
            if let Some(pos) = s.find('.') {
                Some(s[..pos].to_string())
            } else {
                Some(s.clone())
            }
        }
    }
}
