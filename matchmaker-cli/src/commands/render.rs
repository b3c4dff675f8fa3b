use matchmaker_client::TrialRecord;

/// Collapse whitespace and truncate to `max_chars` with an ellipsis
pub fn summary_preview(text: &str, max_chars: usize) -> String {
    let clean = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if clean.chars().count() <= max_chars {
        return clean;
    }
    let short: String = clean.chars().take(max_chars).collect();
    format!("{}...", short.trim_end())
}

/// Location line: the explicit location, else comma-joined city/state/country,
/// else "Not available"
pub fn location_line(trial: &TrialRecord) -> String {
    if let Some(location) = trial.location.as_deref().filter(|s| !s.is_empty()) {
        return location.to_string();
    }
    let parts: Vec<&str> = [&trial.city, &trial.state, &trial.country]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        "Not available".to_string()
    } else {
        parts.join(", ")
    }
}

pub fn distance_line(trial: &TrialRecord) -> String {
    match trial.distance_km {
        Some(km) => format!("{km:.1} km"),
        None => "Not available".to_string(),
    }
}

/// Confidence as a percentage with one decimal, when the server supplied one
pub fn confidence_percent(trial: &TrialRecord) -> Option<String> {
    trial.confidence_score.map(|s| format!("{:.1}", s * 100.0))
}

pub fn status_line(trial: &TrialRecord) -> String {
    trial
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchmaker_client::TrialStatus;

    #[test]
    fn preview_collapses_whitespace_and_truncates() {
        assert_eq!(summary_preview("a  b\n c", 250), "a b c");

        let long = "word ".repeat(100);
        let preview = summary_preview(&long, 250);
        assert!(preview.ends_with("..."));
        assert!(preview.chars().count() <= 253);
    }

    #[test]
    fn location_falls_back_to_city_state_country() {
        let mut trial = TrialRecord {
            city: Some("Boston".into()),
            country: Some("USA".into()),
            ..Default::default()
        };
        assert_eq!(location_line(&trial), "Boston, USA");

        trial.location = Some("Mass General, Boston".into());
        assert_eq!(location_line(&trial), "Mass General, Boston");

        assert_eq!(location_line(&TrialRecord::default()), "Not available");
    }

    #[test]
    fn distance_and_confidence_formatting() {
        let trial = TrialRecord {
            distance_km: Some(12.345),
            confidence_score: Some(0.876),
            status: Some(TrialStatus::Recruiting),
            ..Default::default()
        };
        assert_eq!(distance_line(&trial), "12.3 km");
        assert_eq!(confidence_percent(&trial).unwrap(), "87.6");
        assert_eq!(status_line(&trial), "RECRUITING");

        let bare = TrialRecord::default();
        assert_eq!(distance_line(&bare), "Not available");
        assert!(confidence_percent(&bare).is_none());
        assert_eq!(status_line(&bare), "N/A");
    }
}
