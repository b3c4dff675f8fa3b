use matchmaker_client::{
    ClientError, SearchFilters, SearchOutcome, SortBy, TrialRecord, derived_key,
};
use std::io::{self, BufRead, Write};

use crate::commands::render;
use crate::{AppContext, AuthGate};

const LIST_PREVIEW_CHARS: usize = 250;
const DETAILS_PREVIEW_CHARS: usize = 600;

pub async fn run(ctx: &AppContext, query: &str, filters: SearchFilters) -> anyhow::Result<()> {
    let AuthGate::Authenticated(_) = ctx.gate else {
        println!("You are not logged in. Run `matchmaker login` first.");
        return Ok(());
    };

    if filters.sort_by == SortBy::Distance && ctx.config.coordinate.is_none() {
        println!("Location unavailable — distance sorting may be inaccurate.");
    }

    let outcome = match ctx.search.search(query, &filters, ctx.config.coordinate).await {
        Ok(outcome) => outcome,
        Err(ClientError::Validation(msg)) | Err(ClientError::Api { message: msg, .. }) => {
            println!("{msg}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let trials = match outcome {
        SearchOutcome::Fresh(trials) => trials,
        // a single CLI dispatch cannot be superseded
        SearchOutcome::Stale => return Ok(()),
    };

    if trials.is_empty() {
        println!("No trials matched your search.");
        return Ok(());
    }

    println!("Found {} trial(s) for \"{}\":", trials.len(), query.trim());
    println!();
    for (i, trial) in trials.iter().enumerate() {
        print_card(i + 1, trial, ctx);
    }

    results_loop(ctx, &trials)
}

fn print_card(number: usize, trial: &TrialRecord, ctx: &AppContext) {
    let saved_marker = if ctx.saved.is_saved(trial) { " [saved]" } else { "" };
    println!("{number}. {}{saved_marker}", trial.title);
    if let Some(pct) = render::confidence_percent(trial) {
        println!("   Match confidence: {pct}%");
    }
    println!("   Status:   {}", render::status_line(trial));
    println!("   Location: {}", render::location_line(trial));
    println!("   Distance: {}", render::distance_line(trial));
    if let Some(summary) = trial.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        println!(
            "   Summary:  {}",
            render::summary_preview(summary, LIST_PREVIEW_CHARS)
        );
    }
    println!();
}

/// Interactive follow-up on a result list: `save N`, `details N`, `q`
fn results_loop(ctx: &AppContext, trials: &[TrialRecord]) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("search> (save N / details N / q) ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if input == "q" || input == "quit" {
            break;
        }

        match parse_command(input, trials.len()) {
            Some(("save", index)) => {
                let trial = &trials[index];
                if ctx.saved.toggle(trial)? {
                    println!("Saved \"{}\" ({}).", trial.title, derived_key(trial));
                } else {
                    println!("Removed \"{}\" from saved trials.", trial.title);
                }
            }
            Some(("details", index)) => print_details(&trials[index]),
            _ => println!("Enter `save N`, `details N`, or `q`."),
        }
    }
    Ok(())
}

fn parse_command(input: &str, count: usize) -> Option<(&str, usize)> {
    let (verb, rest) = input.split_once(char::is_whitespace)?;
    let number: usize = rest.trim().parse().ok()?;
    if number == 0 || number > count {
        return None;
    }
    match verb {
        "save" | "details" => Some((verb, number - 1)),
        _ => None,
    }
}

fn print_details(trial: &TrialRecord) {
    println!();
    println!("{}", trial.title);
    if let Some(pct) = render::confidence_percent(trial) {
        println!("Match confidence: {pct}%");
    }
    println!("Status:   {}", render::status_line(trial));
    if let Some(sponsor) = trial.sponsor.as_deref() {
        println!("Sponsor:  {sponsor}");
    }
    println!("Location: {}", render::location_line(trial));
    println!("Distance: {}", render::distance_line(trial));
    if let Some(summary) = trial.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        println!();
        println!("Summary");
        println!("{}", render::summary_preview(summary, DETAILS_PREVIEW_CHARS));
    }
    if let Some(explanation) = trial.explanation.as_deref() {
        println!();
        println!("Why this matches you");
        println!("{explanation}");
    }
    if let Some(url) = trial.url.as_deref() {
        println!();
        println!("Trial page: {url}");
    }
    if let Some(maps) = trial.google_maps_url.as_deref() {
        println!("Map: {maps}");
    }
    println!();
}
