use matchmaker_client::{ClientError, EntryList, ProfileForm, changed_fields};
use serde_json::Value;
use std::io::{self, BufRead, Write};

use crate::{AppContext, AuthGate};

pub async fn show(ctx: &AppContext) -> anyhow::Result<()> {
    let AuthGate::Authenticated(_) = ctx.gate else {
        println!("You are not logged in. Run `matchmaker login` first.");
        return Ok(());
    };

    let envelope = match ctx.api.fetch_profile().await {
        Ok(envelope) => envelope,
        Err(ClientError::Api { message, .. }) => {
            println!("{message}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("Account");
    println!("  Name:  {}", envelope.user.full_name());
    println!("  Email: {}", envelope.user.email);

    let Some(profile) = envelope.patient_profile else {
        println!();
        println!("No patient profile yet. Run `matchmaker profile create` to add one.");
        return Ok(());
    };

    let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());

    println!();
    println!("Demographics");
    println!("  Date of birth: {}", or_dash(&profile.date_of_birth));
    println!("  Gender:        {}", or_dash(&profile.gender));
    println!("  Blood group:   {}", or_dash(&profile.blood_group));
    println!(
        "  Height/Weight: {} cm / {} kg",
        profile
            .height_cm
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".into()),
        profile
            .weight_kg
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".into()),
    );
    if let Some(bmi) = profile.bmi {
        println!("  BMI:           {bmi}");
    }

    println!();
    println!("Medical information");
    print_keys("Diagnoses", &profile.diagnoses);
    print_keys("Allergies", &profile.allergies);
    print_keys("Medications", &profile.medications);
    print_keys("Vaccinations", &profile.vaccinations);
    print_keys("Family history", &profile.family_history);

    println!();
    println!("Lifestyle");
    println!("  Smoking:     {}", or_dash(&profile.smoking_status));
    println!("  Alcohol use: {}", or_dash(&profile.alcohol_use));
    println!("  Occupation:  {}", or_dash(&profile.occupation));

    println!();
    println!("Pre-screening");
    println!(
        "  Chronic illness:  {}",
        or_dash(&profile.prescreening.chronic_illness)
    );
    println!(
        "  Previous surgery: {}",
        or_dash(&profile.prescreening.previous_surgery)
    );
    println!(
        "  On medication:    {}",
        or_dash(&profile.prescreening.on_medication)
    );
    if let Some(notes) = profile.prescreening.notes.as_deref() {
        println!("  Notes:            {notes}");
    }

    println!();
    println!(
        "Consent to share: {}",
        if profile.consent_to_share { "yes" } else { "no" }
    );
    println!(
        "Contact preference: {}",
        or_dash(&profile.contact_preference)
    );

    Ok(())
}

fn print_keys(label: &str, map: &std::collections::BTreeMap<String, String>) {
    if map.is_empty() {
        println!("  {label}: none recorded");
    } else {
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        println!("  {label}: {}", keys.join(", "));
    }
}

pub async fn create(ctx: &AppContext) -> anyhow::Result<()> {
    let AuthGate::Authenticated(_) = ctx.gate else {
        println!("You are not logged in. Run `matchmaker login` first.");
        return Ok(());
    };

    println!("Create your medical profile. Press Enter to leave a field blank.");
    let form = fill_form(ProfileForm::new())?;

    if let Err(ClientError::Validation(msg)) = form.validate_create() {
        println!("{msg}");
        return Ok(());
    }

    let payload = serde_json::to_value(form.build_payload())?;
    match ctx.api.create_profile(&payload).await {
        Ok(()) => println!("Profile created successfully."),
        Err(ClientError::Api { message, .. }) => println!("{message}"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

pub async fn edit(ctx: &AppContext) -> anyhow::Result<()> {
    let AuthGate::Authenticated(_) = ctx.gate else {
        println!("You are not logged in. Run `matchmaker login` first.");
        return Ok(());
    };

    let envelope = match ctx.api.fetch_profile().await {
        Ok(envelope) => envelope,
        Err(ClientError::Api { message, .. }) => {
            println!("{message}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let Some(existing) = envelope.patient_profile else {
        println!("No existing patient profile found. Run `matchmaker profile create` first.");
        return Ok(());
    };

    // Snapshot of the converted payload; the diff is computed against this,
    // not against the raw server response
    let prefilled = ProfileForm::from_profile(&existing);
    let snapshot = prefilled.build_payload();

    println!("Edit your medical profile. Press Enter to keep the shown value.");
    let form = fill_form(prefilled)?;

    let diff = changed_fields(&form.build_payload(), &snapshot)?;
    if diff.is_empty() {
        println!("No changes to submit.");
        return Ok(());
    }

    match ctx.api.update_profile(&Value::Object(diff)).await {
        Ok(()) => println!("Profile updated successfully."),
        Err(ClientError::Api { message, .. }) => println!("{message}"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Walk the intake form field by field on stdin. Empty input keeps the
/// current value, so the same walk serves create and edit.
fn fill_form(mut form: ProfileForm) -> anyhow::Result<ProfileForm> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!();
    println!("Personal information");
    form.date_of_birth = prompt(&mut lines, "Date of birth (YYYY-MM-DD)", &form.date_of_birth)?;
    form.gender = prompt(&mut lines, "Gender (MALE/FEMALE/OTHER)", &form.gender)?;
    form.blood_group = prompt(&mut lines, "Blood group (A+/A-/B+/B-/AB+/AB-/O+/O-)", &form.blood_group)?;

    let height = prompt(&mut lines, "Height (cm)", &form.height_cm)?;
    form.set_height(height);
    let weight = prompt(&mut lines, "Weight (kg)", &form.weight_kg)?;
    form.set_weight(weight);
    match form.bmi {
        Some(bmi) => println!("BMI: {bmi}"),
        None => println!("BMI: -"),
    }

    println!();
    println!("Medical history (one entry per line, blank line to finish)");
    form.diagnoses = prompt_list(&mut lines, "Diagnoses", &form.diagnoses)?;
    form.allergies = prompt_list(&mut lines, "Allergies", &form.allergies)?;
    form.medications = prompt_list(&mut lines, "Medications", &form.medications)?;
    form.vaccinations = prompt_list(&mut lines, "Vaccinations", &form.vaccinations)?;
    form.family_history = prompt_list(&mut lines, "Family history", &form.family_history)?;

    println!();
    println!("Lifestyle");
    form.smoking_status = prompt(&mut lines, "Smoking status (NEVER/FORMER/CURRENT)", &form.smoking_status)?;
    form.alcohol_use = prompt(&mut lines, "Alcohol use", &form.alcohol_use)?;
    form.occupation = prompt(&mut lines, "Occupation", &form.occupation)?;

    println!();
    println!("Insurance");
    form.insurance_provider = prompt(&mut lines, "Provider", &form.insurance_provider)?;
    form.insurance_policy_number = prompt(&mut lines, "Policy number", &form.insurance_policy_number)?;

    println!();
    println!("Emergency contact");
    form.emergency_name = prompt(&mut lines, "Name", &form.emergency_name)?;
    form.emergency_phone = prompt(&mut lines, "Phone", &form.emergency_phone)?;
    form.emergency_relation = prompt(&mut lines, "Relation", &form.emergency_relation)?;

    println!();
    println!("Pre-screening");
    form.prescreening_chronic_illness =
        prompt(&mut lines, "Chronic illness? (Yes/No)", &form.prescreening_chronic_illness)?;
    form.prescreening_previous_surgery =
        prompt(&mut lines, "Previous surgery? (Yes/No)", &form.prescreening_previous_surgery)?;
    form.prescreening_on_medication =
        prompt(&mut lines, "Currently on medication? (Yes/No)", &form.prescreening_on_medication)?;
    form.prescreening_notes = prompt(&mut lines, "Notes", &form.prescreening_notes)?;

    println!();
    let consent_default = if form.consent_to_share { "yes" } else { "no" };
    let consent = prompt(&mut lines, "Consent to share your profile? (yes/no)", consent_default)?;
    form.consent_to_share = consent.eq_ignore_ascii_case("yes");
    form.contact_preference =
        prompt(&mut lines, "Contact preference (EMAIL/PHONE/SMS)", &form.contact_preference)?;

    Ok(form)
}

fn prompt<B: BufRead>(
    lines: &mut io::Lines<B>,
    label: &str,
    current: &str,
) -> anyhow::Result<String> {
    if current.is_empty() {
        print!("{label}: ");
    } else {
        print!("{label} [{current}]: ");
    }
    io::stdout().flush()?;

    match lines.next() {
        Some(line) => {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                Ok(current.to_string())
            } else {
                Ok(trimmed.to_string())
            }
        }
        // EOF keeps the current value
        None => Ok(current.to_string()),
    }
}

/// An empty first line keeps the current entries; any input replaces the
/// whole list.
fn prompt_list<B: BufRead>(
    lines: &mut io::Lines<B>,
    label: &str,
    current: &EntryList,
) -> anyhow::Result<EntryList> {
    if current.is_empty() {
        println!("{label}:");
    } else {
        println!("{label} (currently: {}):", current.entries().join(", "));
    }

    let mut replacement = EntryList::new();
    loop {
        print!("  - ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let entry = line.trim();
        if entry.is_empty() {
            break;
        }
        replacement = replacement.add(entry);
    }

    if replacement.is_empty() {
        Ok(current.clone())
    } else {
        Ok(replacement)
    }
}
