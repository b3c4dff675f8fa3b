use crate::commands::render;
use crate::AppContext;

const SAVED_PREVIEW_CHARS: usize = 220;

pub fn list(ctx: &AppContext) -> anyhow::Result<()> {
    let trials = ctx.saved.list();
    if trials.is_empty() {
        println!(
            "You have not saved any trials yet. Run `matchmaker search` and use `save N` to bookmark."
        );
        return Ok(());
    }

    println!("Saved clinical trials");
    println!();
    for (i, trial) in trials.iter().enumerate() {
        let title = if trial.title.is_empty() {
            "Untitled trial"
        } else {
            trial.title.as_str()
        };
        println!("{}. {title}", i + 1);
        println!("   Status:   {}", render::status_line(trial));
        if let Some(sponsor) = trial.sponsor.as_deref() {
            println!("   Sponsor:  {sponsor}");
        }
        println!("   Location: {}", render::location_line(trial));
        if let Some(summary) = trial.summary.as_deref().filter(|s| !s.trim().is_empty()) {
            println!(
                "   Summary:  {}",
                render::summary_preview(summary, SAVED_PREVIEW_CHARS)
            );
        }
        println!();
    }
    Ok(())
}

pub fn remove(ctx: &AppContext, number: usize) -> anyhow::Result<()> {
    let trials = ctx.saved.list();
    if number == 0 || number > trials.len() {
        println!(
            "No saved trial number {number}; run `matchmaker saved list` to see the numbers."
        );
        return Ok(());
    }

    let trial = &trials[number - 1];
    if ctx.saved.remove(trial)? {
        println!("Removed \"{}\" from saved trials.", trial.title);
    }
    Ok(())
}
