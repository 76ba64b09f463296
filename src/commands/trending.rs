use super::CommandResult;
use crate::service::AnalysisService;
use crate::source::ElectoralSource;
use colored::Colorize;

pub async fn trending<S>(service: &AnalysisService<S>, uf: &str) -> CommandResult
where
    S: ElectoralSource + Send + Sync + 'static,
{
    let trending = service.trending(uf).await?;

    if trending.is_empty() {
        println!("{}", format!("No views recorded for {}", uf.to_uppercase()).yellow());
        return Ok(());
    }

    println!("🔥 Trending in {}", uf.to_uppercase().bright_cyan().bold());
    for (rank, candidate) in trending.iter().enumerate() {
        println!(
            "{}. {} ({}) {} {}: {} views",
            rank + 1,
            candidate.nome.bright_white().bold(),
            candidate.partido,
            candidate.cargo,
            candidate.ano_eleicao,
            candidate.acessos.to_string().bright_green()
        );
    }

    Ok(())
}
