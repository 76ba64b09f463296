use super::CommandResult;
use crate::analysis::CandidateProfile;
use crate::service::AnalysisService;
use crate::source::ElectoralSource;
use colored::Colorize;
use itertools::Itertools;

/// Municipalities shown in the console ranking.
const RANKING_LINES: usize = 10;

pub async fn profile<S>(
    service: &AnalysisService<S>,
    slug: &str,
    json: bool,
    no_cache: bool,
) -> CommandResult
where
    S: ElectoralSource + Send + Sync + 'static,
{
    let (profile, cache_status) = if no_cache {
        service.refresh_profile(slug).await?
    } else {
        service.profile(slug).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        print_profile(&profile);
        println!("{}", format!("cache: {}", cache_status.as_str()).dimmed());
    }

    Ok(())
}

fn print_profile(profile: &CandidateProfile) {
    let stats = &profile.stats;

    println!(
        "👤 {} ({}, {})",
        profile.ballot_name.bright_white().bold(),
        profile.name,
        profile.state
    );
    println!(
        "{}: {}  {}: {}  {}: {}",
        "Votes".bright_white().bold(),
        stats.total_votes.to_string().bright_yellow(),
        "Won".bright_white().bold(),
        stats.wins.to_string().bright_green(),
        "Lost".bright_white().bold(),
        stats.losses.to_string().red()
    );
    println!(
        "Parties: {}  Offices: {}",
        stats.parties.iter().join(", "),
        stats.offices.iter().join(", ")
    );

    println!("{}", "-".repeat(60).bright_cyan());
    for election in &profile.elections {
        println!(
            "{} {:<24} {:<8} {:>9} votes  {}",
            election.year.to_string().bright_cyan(),
            election.office,
            election.party,
            election.total_votes,
            election.status
        );
    }

    if profile.municipality_ranking.is_empty() {
        return;
    }
    println!("{}", "-".repeat(60).bright_cyan());
    for municipality in profile.municipality_ranking.iter().take(RANKING_LINES) {
        println!(
            "  {:<30} {:>9} votes  {:>5.1}%",
            municipality.municipality, municipality.total_votes, municipality.share
        );
    }
}
