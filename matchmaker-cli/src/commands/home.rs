use chrono::Local;
use matchmaker_client::models::derive_age;
use matchmaker_client::{ClientError, PatientProfile};

use crate::{AppContext, AuthGate};

/// Profile snapshot: name, age, headline diagnosis, allergies, medication
/// reminder, emergency contact
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

    println!("{}", envelope.user.full_name());
    println!("{}", envelope.user.email);

    let Some(profile) = envelope.patient_profile else {
        println!();
        println!("No patient profile yet. Run `matchmaker profile create` to add one.");
        return Ok(());
    };

    if let Some(age) = profile
        .date_of_birth
        .as_deref()
        .and_then(|dob| derive_age(dob, Local::now().date_naive()))
    {
        println!("Age: {age}");
    }

    println!("Condition: {}", headline_diagnosis(&profile));

    if profile.allergies.is_empty() {
        println!("Allergies: none recorded");
    } else {
        let allergies: Vec<&str> = profile.allergies.keys().map(String::as_str).collect();
        println!("Allergies: {}", allergies.join(", "));
    }

    println!("{}", primary_medication_sentence(&profile));

    if let Some(name) = profile.emergency_contact.name.as_deref() {
        println!("Emergency contact: {name}");
    }

    Ok(())
}

/// First diagnosis key, else a generic headline
fn headline_diagnosis(profile: &PatientProfile) -> String {
    profile
        .diagnoses
        .keys()
        .next()
        .cloned()
        .unwrap_or_else(|| "General Health".to_string())
}

fn primary_medication_sentence(profile: &PatientProfile) -> String {
    match profile.medications.keys().next() {
        Some(first) => format!("Take {first}."),
        None => {
            "No medications recorded. Update your profile if you take any medication.".to_string()
        }
    }
}
