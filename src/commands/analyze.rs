use super::CommandResult;
use crate::analysis::pipeline::REAL_OPPORTUNITY_THRESHOLD;
use crate::analysis::{AnalysisResponse, ContestAnalysis, ExternalCompetitor};
use crate::service::AnalysisService;
use crate::source::ElectoralSource;
use colored::Colorize;

pub async fn analyze<S>(
    service: &AnalysisService<S>,
    slug: &str,
    json: bool,
    no_cache: bool,
) -> CommandResult
where
    S: ElectoralSource + Send + Sync + 'static,
{
    if !json {
        println!("🔍 Analyzing {}", slug.cyan());
    }

    let (response, cache_status) = if no_cache {
        service.refresh(slug).await?
    } else {
        service.analyze(slug).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_response(&response);
        println!("{}", format!("cache: {}", cache_status.as_str()).dimmed());
    }

    Ok(())
}

fn print_response(response: &AnalysisResponse) {
    if response.analyses.is_empty() {
        println!("{}", "No analyzable elections found".yellow());
        return;
    }

    for analysis in &response.analyses {
        print_contest(analysis);
    }

    let summary = &response.summary;
    println!("{}", "=".repeat(60).bright_cyan());
    println!(
        "{}: {}  {}: {}  {}: {}",
        "Elections".bright_white().bold(),
        summary.total_elections.to_string().bright_green().bold(),
        "In cutoff block".bright_white().bold(),
        summary.times_in_block.to_string().bright_green().bold(),
        "Real opportunities".bright_white().bold(),
        summary.real_opportunities.to_string().bright_green().bold()
    );
}

fn print_contest(analysis: &ContestAnalysis) {
    let candidate = &analysis.candidate;
    let metrics = &analysis.metrics;

    println!(
        "\n{} {} {} ({}, round {})",
        "📋".bright_cyan(),
        analysis.year.to_string().bright_cyan().bold(),
        analysis.office.bright_cyan().bold(),
        analysis.scope_name,
        analysis.round
    );
    println!("{}", "-".repeat(60).bright_cyan());

    let standing = if candidate.elected {
        "elected".bright_green()
    } else if candidate.in_cutoff_block {
        "in cutoff block".yellow()
    } else {
        "outside block".red()
    };
    println!(
        "{} ({}): {} votes, #{} of {}, {}",
        candidate.ballot_name.bright_white().bold(),
        candidate.party,
        candidate.votes.to_string().bright_yellow(),
        candidate.position,
        metrics.total_candidates,
        standing
    );
    println!(
        "Seats: {}  Block size: {}  Cutoff: {} votes  Block edge: {} votes",
        metrics.seats, metrics.block_size, metrics.votes_at_cutoff, metrics.votes_at_block_edge
    );

    if let Some(internal) = &analysis.internal_competitor {
        println!(
            "Same party above: {} ({}) +{} votes",
            internal.ballot_name, internal.party, internal.vote_difference
        );
    }
    if let Some(external) = &analysis.external_competitor {
        println!("Rival above: {}", describe_external(external));
    }
    if let Some(worst) = &analysis.worst_elected_external {
        println!("Weakest elected rival: {}", describe_external(worst));
    }

    for party in analysis.party_efficiency.iter().take(5) {
        println!(
            "  {:<10} {:>3} in block  {:>3} elected  {:>5.0}% efficiency",
            party.party,
            party.candidates_in_block,
            party.elected,
            party.efficiency * 100.0
        );
    }
}

fn describe_external(competitor: &ExternalCompetitor) -> String {
    let score = competitor.opportunity_score;
    let label = if score < REAL_OPPORTUNITY_THRESHOLD {
        format!("{} votes short", score).bright_green()
    } else {
        format!("{} votes short", score).normal()
    };

    format!(
        "{} ({}, #{}) {}",
        competitor.ballot_name, competitor.party, competitor.position, label
    )
}
