use std::collections::BTreeMap;

use crate::error::{ClientError, Result};
use crate::models::{EmergencyContact, Insurance, PatientProfile, Prescreening};

/// BMI = weight_kg / (height_m)², rounded to 2 decimals. `None` when either
/// input is non-positive.
pub fn compute_bmi(height_cm: f64, weight_kg: f64) -> Option<f64> {
    if height_cm > 0.0 && weight_kg > 0.0 {
        let meters = height_cm / 100.0;
        let bmi = weight_kg / (meters * meters);
        Some((bmi * 100.0).round() / 100.0)
    } else {
        None
    }
}

/// Ordered sequence of free-text entries, edited as a value: every operation
/// returns a new sequence and leaves the receiver untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryList(Vec<String>);

impl EntryList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<String>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn add(&self, entry: impl Into<String>) -> Self {
        let mut next = self.0.clone();
        next.push(entry.into());
        Self(next)
    }

    /// Out-of-range indices leave the sequence unchanged
    pub fn update(&self, index: usize, value: impl Into<String>) -> Self {
        let mut next = self.0.clone();
        if let Some(slot) = next.get_mut(index) {
            *slot = value.into();
        }
        Self(next)
    }

    /// Out-of-range indices leave the sequence unchanged
    pub fn remove_at(&self, index: usize) -> Self {
        let mut next = self.0.clone();
        if index < next.len() {
            next.remove(index);
        }
        Self(next)
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Convert an ordered entry list to the wire mapping.
///
/// Each non-blank trimmed entry becomes a map entry keyed by the text
/// truncated to 40 characters (or `item_<index>` if blank after truncation),
/// with `_1`, `_2`… suffixes resolving collisions. The transform loses entry
/// order; round-tripping reloads alphabetically by key.
pub fn list_to_map(entries: &[String]) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for (index, entry) in entries.iter().enumerate() {
        let text = entry.trim();
        if text.is_empty() {
            continue;
        }
        let base = {
            let truncated = truncate_chars(text, 40);
            if truncated.is_empty() {
                format!("item_{index}")
            } else {
                truncated
            }
        };
        let mut key = base.clone();
        let mut suffix = 1;
        while map.contains_key(&key) {
            key = format!("{base}_{suffix}");
            suffix += 1;
        }
        map.insert(key, text.to_string());
    }
    map
}

/// The inverse direction used when prefilling the edit form: values in
/// whatever order the wire mapping provides.
pub fn map_to_list(map: &BTreeMap<String, String>) -> EntryList {
    EntryList::from_entries(map.values().cloned().collect())
}

fn opt_string(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Mutable intake-form state mirroring the patient profile.
///
/// Height and weight are held as raw text the way the form receives them;
/// BMI is recomputed on every height/weight change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileForm {
    pub date_of_birth: String,
    pub gender: String,
    pub blood_group: String,
    pub height_cm: String,
    pub weight_kg: String,
    pub bmi: Option<f64>,

    pub diagnoses: EntryList,
    pub allergies: EntryList,
    pub medications: EntryList,
    pub vaccinations: EntryList,
    pub family_history: EntryList,

    pub smoking_status: String,
    pub alcohol_use: String,
    pub occupation: String,

    pub insurance_provider: String,
    pub insurance_policy_number: String,

    pub emergency_name: String,
    pub emergency_phone: String,
    pub emergency_relation: String,

    pub prescreening_chronic_illness: String,
    pub prescreening_previous_surgery: String,
    pub prescreening_on_medication: String,
    pub prescreening_notes: String,

    pub consent_to_share: bool,
    pub contact_preference: String,
}

impl ProfileForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefill from an existing profile (edit mode). Wire mappings come back
    /// as display lists via value extraction.
    pub fn from_profile(profile: &PatientProfile) -> Self {
        let number = |n: Option<f64>| n.map(|v| v.to_string()).unwrap_or_default();
        let text = |s: &Option<String>| s.clone().unwrap_or_default();

        Self {
            date_of_birth: text(&profile.date_of_birth),
            gender: text(&profile.gender),
            blood_group: text(&profile.blood_group),
            height_cm: number(profile.height_cm),
            weight_kg: number(profile.weight_kg),
            bmi: profile.bmi,
            diagnoses: map_to_list(&profile.diagnoses),
            allergies: map_to_list(&profile.allergies),
            medications: map_to_list(&profile.medications),
            vaccinations: map_to_list(&profile.vaccinations),
            family_history: map_to_list(&profile.family_history),
            smoking_status: text(&profile.smoking_status),
            alcohol_use: text(&profile.alcohol_use),
            occupation: text(&profile.occupation),
            insurance_provider: text(&profile.insurance.provider),
            insurance_policy_number: text(&profile.insurance.policy_number),
            emergency_name: text(&profile.emergency_contact.name),
            emergency_phone: text(&profile.emergency_contact.phone),
            emergency_relation: text(&profile.emergency_contact.relation),
            prescreening_chronic_illness: text(&profile.prescreening.chronic_illness),
            prescreening_previous_surgery: text(&profile.prescreening.previous_surgery),
            prescreening_on_medication: text(&profile.prescreening.on_medication),
            prescreening_notes: text(&profile.prescreening.notes),
            consent_to_share: profile.consent_to_share,
            contact_preference: text(&profile.contact_preference),
        }
    }

    pub fn set_height(&mut self, value: impl Into<String>) {
        self.height_cm = value.into();
        self.recompute_bmi();
    }

    pub fn set_weight(&mut self, value: impl Into<String>) {
        self.weight_kg = value.into();
        self.recompute_bmi();
    }

    fn recompute_bmi(&mut self) {
        let height = self.height_cm.trim().parse::<f64>().unwrap_or(0.0);
        let weight = self.weight_kg.trim().parse::<f64>().unwrap_or(0.0);
        self.bmi = compute_bmi(height, weight);
    }

    /// Required fields in create mode
    pub fn validate_create(&self) -> Result<()> {
        for (value, field) in [
            (&self.date_of_birth, "date_of_birth"),
            (&self.gender, "gender"),
            (&self.blood_group, "blood_group"),
        ] {
            if value.trim().is_empty() {
                return Err(ClientError::Validation(format!("{field} is required")));
            }
        }
        Ok(())
    }

    /// The full wire payload: blank fields as nulls, list fields converted to
    /// their keyed-mapping form.
    pub fn build_payload(&self) -> PatientProfile {
        let height = self.height_cm.trim().parse::<f64>().ok();
        let weight = self.weight_kg.trim().parse::<f64>().ok();
        let bmi = self.bmi.or_else(|| match (height, weight) {
            (Some(h), Some(w)) => compute_bmi(h, w),
            _ => None,
        });

        PatientProfile {
            date_of_birth: opt_string(&self.date_of_birth),
            gender: opt_string(&self.gender),
            blood_group: opt_string(&self.blood_group),
            height_cm: height,
            weight_kg: weight,
            bmi,
            diagnoses: list_to_map(self.diagnoses.entries()),
            allergies: list_to_map(self.allergies.entries()),
            medications: list_to_map(self.medications.entries()),
            vaccinations: list_to_map(self.vaccinations.entries()),
            family_history: list_to_map(self.family_history.entries()),
            smoking_status: opt_string(&self.smoking_status),
            alcohol_use: opt_string(&self.alcohol_use),
            occupation: opt_string(&self.occupation),
            insurance: Insurance {
                provider: opt_string(&self.insurance_provider),
                policy_number: opt_string(&self.insurance_policy_number),
            },
            emergency_contact: EmergencyContact {
                name: opt_string(&self.emergency_name),
                phone: opt_string(&self.emergency_phone),
                relation: opt_string(&self.emergency_relation),
            },
            prescreening: Prescreening {
                chronic_illness: opt_string(&self.prescreening_chronic_illness),
                previous_surgery: opt_string(&self.prescreening_previous_surgery),
                on_medication: opt_string(&self.prescreening_on_medication),
                notes: opt_string(&self.prescreening_notes),
            },
            consent_to_share: self.consent_to_share,
            contact_preference: opt_string(&self.contact_preference),
        }
    }
}

/// Shallow diff for partial updates: a top-level field is included only when
/// its JSON-serialized value differs from the snapshot taken at prefill time.
pub fn changed_fields(
    payload: &PatientProfile,
    snapshot: &PatientProfile,
) -> Result<serde_json::Map<String, serde_json::Value>> {
    let new_value = serde_json::to_value(payload)?;
    let old_value = serde_json::to_value(snapshot)?;
    let (serde_json::Value::Object(new_map), serde_json::Value::Object(old_map)) =
        (new_value, old_value)
    else {
        return Err(ClientError::Validation(
            "profile payload must be an object".to_string(),
        ));
    };

    let mut diff = serde_json::Map::new();
    for (key, value) in new_map {
        if old_map.get(&key) != Some(&value) {
            diff.insert(key, value);
        }
    }
    Ok(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn bmi_known_values() {
        assert_abs_diff_eq!(compute_bmi(170.0, 70.0).unwrap(), 24.22, epsilon = 1e-9);
        assert_abs_diff_eq!(compute_bmi(180.0, 81.0).unwrap(), 25.0, epsilon = 1e-9);
        assert!(compute_bmi(0.0, 70.0).is_none());
        assert!(compute_bmi(170.0, 0.0).is_none());
        assert!(compute_bmi(-170.0, 70.0).is_none());
    }

    #[test]
    fn bmi_tracks_height_and_weight_edits() {
        let mut form = ProfileForm::new();
        assert!(form.bmi.is_none());

        form.set_height("170");
        assert!(form.bmi.is_none());

        form.set_weight("70");
        assert_abs_diff_eq!(form.bmi.unwrap(), 24.22, epsilon = 1e-9);

        form.set_weight("not a number");
        assert!(form.bmi.is_none());
    }

    #[test]
    fn duplicate_entries_get_suffixed_keys() {
        let map = list_to_map(&["Asthma".to_string(), "Asthma".to_string()]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("Asthma").map(String::as_str), Some("Asthma"));
        assert_eq!(map.get("Asthma_1").map(String::as_str), Some("Asthma"));
    }

    #[test]
    fn blank_entries_are_dropped_and_long_entries_truncate_to_40_char_keys() {
        let long = "x".repeat(60);
        let map = list_to_map(&["  ".to_string(), long.clone()]);
        assert_eq!(map.len(), 1);
        let key = map.keys().next().unwrap();
        assert_eq!(key.chars().count(), 40);
        assert_eq!(map[key], long);
    }

    #[test]
    fn truncated_collisions_still_keep_both_values() {
        let a = format!("{}A", "x".repeat(40));
        let b = format!("{}B", "x".repeat(40));
        let map = list_to_map(&[a.clone(), b.clone()]);
        assert_eq!(map.len(), 2);
        let mut values: Vec<_> = map.values().cloned().collect();
        values.sort();
        assert_eq!(values, vec![a, b]);
    }

    #[test]
    fn entry_list_operations_return_new_sequences() {
        let base = EntryList::new().add("Asthma").add("Hay fever");
        let updated = base.update(1, "Allergic rhinitis");
        let removed = base.remove_at(0);

        assert_eq!(base.entries(), ["Asthma", "Hay fever"]);
        assert_eq!(updated.entries(), ["Asthma", "Allergic rhinitis"]);
        assert_eq!(removed.entries(), ["Hay fever"]);
        // out-of-range edits are no-ops
        assert_eq!(base.update(9, "x"), base);
        assert_eq!(base.remove_at(9), base);
    }

    #[test]
    fn round_trip_reorders_but_loses_nothing_distinct() {
        let entries = vec!["Zoster".to_string(), "Asthma".to_string()];
        let reloaded = map_to_list(&list_to_map(&entries));
        // alphabetical by key after the round trip
        assert_eq!(reloaded.entries(), ["Asthma", "Zoster"]);
    }

    #[test]
    fn create_mode_requires_demographics() {
        let mut form = ProfileForm::new();
        assert!(form.validate_create().is_err());

        form.date_of_birth = "1990-01-01".into();
        form.gender = "FEMALE".into();
        assert!(form.validate_create().is_err());

        form.blood_group = "O+".into();
        assert!(form.validate_create().is_ok());
    }

    #[test]
    fn changed_fields_sends_only_the_diff() {
        let mut form = ProfileForm::new();
        form.date_of_birth = "1990-01-01".into();
        form.gender = "OTHER".into();
        form.blood_group = "AB-".into();
        form.set_height("170");
        form.set_weight("70");
        form.diagnoses = form.diagnoses.add("Asthma");

        let snapshot = form.build_payload();

        form.set_weight("72");
        form.diagnoses = form.diagnoses.add("Eczema");
        let diff = changed_fields(&form.build_payload(), &snapshot).unwrap();

        let keys: Vec<_> = diff.keys().cloned().collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&"weight_kg".to_string()));
        assert!(keys.contains(&"bmi".to_string()));
        assert!(keys.contains(&"diagnoses".to_string()));
    }

    #[test]
    fn unchanged_payload_diffs_to_nothing() {
        let mut form = ProfileForm::new();
        form.set_height("160");
        form.set_weight("55");
        let snapshot = form.build_payload();
        let diff = changed_fields(&form.build_payload(), &snapshot).unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn prefill_extracts_mapping_values_in_key_order() {
        let profile = PatientProfile {
            allergies: [
                ("Pollen".to_string(), "Pollen".to_string()),
                ("Dust".to_string(), "Dust".to_string()),
            ]
            .into_iter()
            .collect(),
            height_cm: Some(170.0),
            weight_kg: Some(70.0),
            bmi: Some(24.22),
            ..Default::default()
        };
        let form = ProfileForm::from_profile(&profile);
        assert_eq!(form.allergies.entries(), ["Dust", "Pollen"]);
        assert_eq!(form.height_cm, "170");
        assert_abs_diff_eq!(form.bmi.unwrap(), 24.22, epsilon = 1e-9);
    }
}
